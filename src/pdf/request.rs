//! Render request and response types

use super::types::{Surface, Viewport};

/// Unique identifier for worker requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Request sent to the render worker
#[derive(Debug)]
pub enum RenderRequest {
    /// Open a document, replacing the current one
    Load { reference: String },

    /// Resolve a page's viewport at the given scale without rendering it
    Measure {
        id: RequestId,
        page: usize,
        scale: f32,
    },

    /// Rasterize a page (1-based) at the given scale
    Render {
        id: RequestId,
        page: usize,
        scale: f32,
    },

    /// Shutdown the worker
    Shutdown,
}

/// Errors from the render worker and engine
#[derive(Debug, thiserror::Error)]
pub enum WorkerFault {
    #[cfg(feature = "pdf")]
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),

    #[error("page {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("no document loaded")]
    NoDocument,

    #[error("{detail}")]
    Generic { detail: String },
}

impl WorkerFault {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Response from the render worker
#[derive(Debug)]
pub enum RenderResponse {
    /// Document opened
    Loaded {
        reference: String,
        page_count: usize,
        title: Option<String>,
    },

    /// Document failed to open
    LoadFailed {
        reference: String,
        error: WorkerFault,
    },

    /// Page viewport resolved
    Measured {
        id: RequestId,
        page: usize,
        viewport: Viewport,
    },

    /// Page rasterized into a surface sized to its viewport
    Rendered {
        id: RequestId,
        page: usize,
        surface: Surface,
    },

    /// Measure or render failed
    Error { id: RequestId, error: WorkerFault },
}
