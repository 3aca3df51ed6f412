//! MuPDF-backed document engine

use mupdf::{Colorspace, Document, Matrix, Page, Pixmap};

use super::engine::{DocumentEngine, DocumentHandle, PageHandle, check_page_number};
use super::request::WorkerFault;
use super::types::{Surface, Viewport};

/// Opens documents from filesystem paths with MuPDF
#[derive(Clone, Copy, Debug, Default)]
pub struct MupdfEngine;

impl DocumentEngine for MupdfEngine {
    type Document = MupdfDocument;

    fn load(&self, reference: &str) -> Result<MupdfDocument, WorkerFault> {
        let doc = Document::open(reference)?;
        let page_count = usize::try_from(doc.page_count()?).unwrap_or(0);
        if page_count == 0 {
            return Err(WorkerFault::generic(format!("{reference} has no pages")));
        }
        Ok(MupdfDocument { doc, page_count })
    }
}

pub struct MupdfDocument {
    doc: Document,
    page_count: usize,
}

impl DocumentHandle for MupdfDocument {
    type Page = MupdfPage;

    fn page_count(&self) -> usize {
        self.page_count
    }

    fn title(&self) -> Option<String> {
        self.doc
            .metadata(mupdf::MetadataName::Title)
            .ok()
            .filter(|t| !t.is_empty())
    }

    fn page(&self, number: usize) -> Result<MupdfPage, WorkerFault> {
        check_page_number(number, self.page_count)?;
        let page = self.doc.load_page((number - 1) as i32)?;
        Ok(MupdfPage { page })
    }
}

pub struct MupdfPage {
    page: Page,
}

impl PageHandle for MupdfPage {
    fn viewport(&self, scale: f32) -> Result<Viewport, WorkerFault> {
        let bounds = self.page.bounds()?;
        Ok(Viewport::scaled(
            bounds.x1 - bounds.x0,
            bounds.y1 - bounds.y0,
            scale,
        ))
    }

    fn render_into(&self, surface: &mut Surface, viewport: &Viewport) -> Result<(), WorkerFault> {
        let transform = Matrix::new_scale(viewport.scale, viewport.scale);
        let rgb = Colorspace::device_rgb();
        let pixmap = self.page.to_pixmap(&transform, &rgb, false, false)?;
        copy_pixmap(&pixmap, surface)
    }
}

/// Copy pixmap samples into the surface, dropping any alpha channel.
///
/// MuPDF may round the pixmap one pixel larger than the floored viewport;
/// only the overlapping region is copied.
fn copy_pixmap(pixmap: &Pixmap, surface: &mut Surface) -> Result<(), WorkerFault> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(WorkerFault::generic(format!(
            "Unsupported pixmap format: {n} channels"
        )));
    }

    let src_width = pixmap.width() as usize;
    let src_height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = src_width * n;
    if samples.len() < stride.saturating_mul(src_height) || row_bytes > stride {
        return Err(WorkerFault::generic("Pixmap buffer size mismatch"));
    }

    let width = src_width.min(surface.width as usize);
    let height = src_height.min(surface.height as usize);
    let dst_stride = surface.width as usize * Surface::BYTES_PER_PIXEL;

    for y in 0..height {
        let row = &samples[y * stride..y * stride + width * n];
        let dst = &mut surface.pixels[y * dst_stride..y * dst_stride + width * Surface::BYTES_PER_PIXEL];
        if n == Surface::BYTES_PER_PIXEL {
            dst.copy_from_slice(row);
        } else {
            for (out, px) in dst
                .chunks_exact_mut(Surface::BYTES_PER_PIXEL)
                .zip(row.chunks_exact(n))
            {
                out.copy_from_slice(&px[..Surface::BYTES_PER_PIXEL]);
            }
        }
    }

    Ok(())
}
