//! Document engine abstraction
//!
//! The worker thread drives any engine implementing these traits. Page
//! numbers are 1-based at this boundary.

use super::request::WorkerFault;
use super::types::{Surface, Viewport};

/// Opens documents by reference (a filesystem path for the MuPDF engine)
pub trait DocumentEngine {
    type Document: DocumentHandle;

    fn load(&self, reference: &str) -> Result<Self::Document, WorkerFault>;
}

/// A loaded multi-page document
pub trait DocumentHandle {
    type Page: PageHandle;

    fn page_count(&self) -> usize;

    fn title(&self) -> Option<String> {
        None
    }

    /// Fetch a page by 1-based number
    fn page(&self, number: usize) -> Result<Self::Page, WorkerFault>;
}

/// A single page that can report its geometry and rasterize itself
pub trait PageHandle {
    fn viewport(&self, scale: f32) -> Result<Viewport, WorkerFault>;

    /// Rasterize into `surface`, which the caller has already sized to `viewport`
    fn render_into(&self, surface: &mut Surface, viewport: &Viewport) -> Result<(), WorkerFault>;
}

/// Bounds-check a 1-based page number against a page count
pub fn check_page_number(number: usize, page_count: usize) -> Result<(), WorkerFault> {
    if number == 0 || number > page_count {
        return Err(WorkerFault::PageOutOfRange {
            page: number,
            page_count,
        });
    }
    Ok(())
}
