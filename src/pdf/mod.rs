//! PDF rendering infrastructure

pub mod engine;
#[cfg(feature = "pdf")]
mod mupdf_engine;
mod request;
mod service;
mod types;
mod worker;

pub use engine::{DocumentEngine, DocumentHandle, PageHandle};
#[cfg(feature = "pdf")]
pub use mupdf_engine::MupdfEngine;
pub use request::{RenderRequest, RenderResponse, RequestId, WorkerFault};
pub use service::{RenderBackend, RenderService};
pub use types::*;
pub use worker::render_page;
