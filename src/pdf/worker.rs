//! Render worker - runs in a dedicated thread

use flume::{Receiver, Sender};
use log::{debug, error, info};

use super::engine::{DocumentEngine, DocumentHandle, PageHandle};
use super::request::{RenderRequest, RenderResponse, RequestId, WorkerFault};
use super::types::{Surface, Viewport};

/// Main worker function.
///
/// Requests are served strictly in arrival order. The loaded document is
/// owned here because engine documents are generally not `Send`.
pub fn render_worker<E: DocumentEngine>(
    engine: E,
    requests: Receiver<RenderRequest>,
    responses: Sender<RenderResponse>,
) {
    let mut document: Option<E::Document> = None;

    for request in requests {
        let response = match request {
            RenderRequest::Load { reference } => {
                // The previous document is released before the new one opens.
                document = None;
                match engine.load(&reference) {
                    Ok(doc) => {
                        info!("Loaded {reference} ({} pages)", doc.page_count());
                        let response = RenderResponse::Loaded {
                            reference,
                            page_count: doc.page_count(),
                            title: doc.title(),
                        };
                        document = Some(doc);
                        response
                    }
                    Err(error) => {
                        error!("Failed to load {reference}: {error}");
                        RenderResponse::LoadFailed { reference, error }
                    }
                }
            }

            RenderRequest::Measure { id, page, scale } => {
                match measure_page(document.as_ref(), page, scale) {
                    Ok(viewport) => RenderResponse::Measured { id, page, viewport },
                    Err(error) => RenderResponse::Error { id, error },
                }
            }

            RenderRequest::Render { id, page, scale } => {
                handle_render_request(document.as_ref(), id, page, scale)
            }

            RenderRequest::Shutdown => break,
        };

        if responses.send(response).is_err() {
            debug!("Response channel closed, stopping render worker");
            break;
        }
    }
}

fn measure_page<D: DocumentHandle>(
    document: Option<&D>,
    page_num: usize,
    scale: f32,
) -> Result<Viewport, WorkerFault> {
    let doc = document.ok_or(WorkerFault::NoDocument)?;
    doc.page(page_num)?.viewport(scale)
}

fn handle_render_request<D: DocumentHandle>(
    document: Option<&D>,
    id: RequestId,
    page_num: usize,
    scale: f32,
) -> RenderResponse {
    match render_page(document, page_num, scale) {
        Ok(surface) => RenderResponse::Rendered {
            id,
            page: page_num,
            surface,
        },
        Err(error) => {
            error!("Render of page {page_num} failed: {error}");
            RenderResponse::Error { id, error }
        }
    }
}

/// Fetch a page, size a surface to its viewport and rasterize into it
pub fn render_page<D: DocumentHandle>(
    document: Option<&D>,
    page_num: usize,
    scale: f32,
) -> Result<Surface, WorkerFault> {
    let doc = document.ok_or(WorkerFault::NoDocument)?;
    let page = doc.page(page_num)?;
    let viewport = page.viewport(scale)?;

    let mut surface = Surface::default();
    surface.fit_to(&viewport);
    page.render_into(&mut surface, &viewport)?;

    debug!(
        "Rendered page {page_num} at scale {scale:.3} into {}x{}",
        surface.width, surface.height
    );
    Ok(surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::engine::check_page_number;

    struct FlatEngine;

    struct FlatDocument {
        pages: usize,
    }

    struct FlatPage {
        shade: u8,
    }

    impl DocumentEngine for FlatEngine {
        type Document = FlatDocument;

        fn load(&self, reference: &str) -> Result<FlatDocument, WorkerFault> {
            reference
                .strip_suffix(".pdf")
                .and_then(|stem| stem.parse().ok())
                .map(|pages| FlatDocument { pages })
                .ok_or_else(|| WorkerFault::generic(format!("cannot open {reference}")))
        }
    }

    impl DocumentHandle for FlatDocument {
        type Page = FlatPage;

        fn page_count(&self) -> usize {
            self.pages
        }

        fn page(&self, number: usize) -> Result<FlatPage, WorkerFault> {
            check_page_number(number, self.pages)?;
            Ok(FlatPage {
                shade: number as u8,
            })
        }
    }

    impl PageHandle for FlatPage {
        fn viewport(&self, scale: f32) -> Result<Viewport, WorkerFault> {
            Ok(Viewport::scaled(100.0, 50.0, scale))
        }

        fn render_into(&self, surface: &mut Surface, _: &Viewport) -> Result<(), WorkerFault> {
            surface.pixels.fill(self.shade);
            Ok(())
        }
    }

    fn run(requests: Vec<RenderRequest>) -> Vec<RenderResponse> {
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();
        for request in requests {
            request_tx.send(request).unwrap();
        }
        request_tx.send(RenderRequest::Shutdown).unwrap();

        render_worker(FlatEngine, request_rx, response_tx);
        response_rx.drain().collect()
    }

    #[test]
    fn renders_page_into_surface_sized_to_viewport() {
        let responses = run(vec![
            RenderRequest::Load {
                reference: "3.pdf".to_string(),
            },
            RenderRequest::Render {
                id: RequestId::new(1),
                page: 2,
                scale: 1.5,
            },
        ]);

        assert!(matches!(
            &responses[0],
            RenderResponse::Loaded { page_count: 3, .. }
        ));
        match &responses[1] {
            RenderResponse::Rendered { id, page, surface } => {
                assert_eq!(*id, RequestId::new(1));
                assert_eq!(*page, 2);
                assert_eq!((surface.width, surface.height), (150, 75));
                assert_eq!(surface.pixel(0, 0), Some((2, 2, 2)));
            }
            other => panic!("expected rendered page, got {other:?}"),
        }
    }

    #[test]
    fn measure_reports_natural_viewport() {
        let responses = run(vec![
            RenderRequest::Load {
                reference: "1.pdf".to_string(),
            },
            RenderRequest::Measure {
                id: RequestId::new(7),
                page: 1,
                scale: 1.0,
            },
        ]);

        match &responses[1] {
            RenderResponse::Measured { viewport, .. } => {
                assert_eq!(viewport.width, 100.0);
                assert_eq!(viewport.height, 50.0);
            }
            other => panic!("expected measurement, got {other:?}"),
        }
    }

    #[test]
    fn failed_load_leaves_no_document() {
        let responses = run(vec![
            RenderRequest::Load {
                reference: "1.pdf".to_string(),
            },
            RenderRequest::Load {
                reference: "missing.txt".to_string(),
            },
            RenderRequest::Render {
                id: RequestId::new(2),
                page: 1,
                scale: 1.0,
            },
        ]);

        assert!(matches!(&responses[1], RenderResponse::LoadFailed { .. }));
        assert!(matches!(
            &responses[2],
            RenderResponse::Error {
                error: WorkerFault::NoDocument,
                ..
            }
        ));
    }

    #[test]
    fn out_of_range_page_is_an_error() {
        let responses = run(vec![
            RenderRequest::Load {
                reference: "2.pdf".to_string(),
            },
            RenderRequest::Render {
                id: RequestId::new(3),
                page: 3,
                scale: 1.0,
            },
        ]);

        assert!(matches!(
            &responses[1],
            RenderResponse::Error {
                error: WorkerFault::PageOutOfRange {
                    page: 3,
                    page_count: 2
                },
                ..
            }
        ));
    }
}
