//! Render service - owns the worker thread and its channels

use flume::{Receiver, Sender};
use log::warn;

use super::engine::DocumentEngine;
use super::request::{RenderRequest, RenderResponse, RequestId};
use super::worker::render_worker;

/// Non-blocking access to a document engine.
///
/// Every call returns immediately; completions come back through
/// [`RenderBackend::poll_responses`] in the order the requests were issued.
pub trait RenderBackend {
    /// Open a document, replacing any loaded one
    fn load(&mut self, reference: &str);

    /// Resolve the viewport of a page (1-based) at `scale`
    fn measure(&mut self, page: usize, scale: f32) -> RequestId;

    /// Rasterize a page (1-based) at `scale`
    fn render(&mut self, page: usize, scale: f32) -> RequestId;

    /// Drain completed responses without blocking
    fn poll_responses(&mut self) -> Vec<RenderResponse>;
}

/// Runs a document engine on a dedicated worker thread
pub struct RenderService {
    request_tx: Sender<RenderRequest>,
    response_rx: Receiver<RenderResponse>,
    next_request_id: u64,
}

impl RenderService {
    /// Spawn the worker thread.
    ///
    /// The engine is built on the worker because engine documents usually
    /// cannot cross threads.
    #[must_use]
    pub fn spawn<E, F>(make_engine: F) -> Self
    where
        E: DocumentEngine,
        F: FnOnce() -> E + Send + 'static,
    {
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        std::thread::spawn(move || {
            render_worker(make_engine(), request_rx, response_tx);
        });

        Self {
            request_tx,
            response_rx,
            next_request_id: 1,
        }
    }

    /// Get the response receiver for blocking waits
    #[must_use]
    pub fn response_receiver(&self) -> &Receiver<RenderResponse> {
        &self.response_rx
    }

    /// Shutdown the worker
    pub fn shutdown(&self) {
        let _ = self.request_tx.send(RenderRequest::Shutdown);
    }

    fn send(&self, request: RenderRequest) {
        if self.request_tx.send(request).is_err() {
            warn!("Render worker is gone, request dropped");
        }
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        id
    }
}

impl RenderBackend for RenderService {
    fn load(&mut self, reference: &str) {
        self.send(RenderRequest::Load {
            reference: reference.to_string(),
        });
    }

    fn measure(&mut self, page: usize, scale: f32) -> RequestId {
        let id = self.next_id();
        self.send(RenderRequest::Measure { id, page, scale });
        id
    }

    fn render(&mut self, page: usize, scale: f32) -> RequestId {
        let id = self.next_id();
        self.send(RenderRequest::Render { id, page, scale });
        id
    }

    fn poll_responses(&mut self) -> Vec<RenderResponse> {
        self.response_rx.try_iter().collect()
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
