//! Viewer controller
//!
//! Mediates between user input and the render backend. All methods run on
//! the UI thread; backend completions are fed back through [`ViewerController::poll`].

use std::collections::HashSet;

use crossterm::event::MouseEvent;
use log::{debug, error, info, warn};

use crate::notification::NotificationManager;
use crate::pdf::{CellSize, DocumentInfo, RenderBackend, RenderResponse, RequestId, Surface};

use super::gesture::{
    GestureEnd, GestureTracker, PointerAdapter, SwipeDirection, SwipePolicy, TouchAdapter,
    TouchEvent,
};
use super::state::{Command, Effect, Readout, ViewState};
use super::zoom::{Zoom, fit_width_scale};

/// Tunables of the viewer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewerConfig {
    pub initial_scale: f32,
    /// Run fit-to-width once the document has loaded
    pub fit_width_on_load: bool,
    pub swipe: SwipePolicy,
    pub fit_padding: f32,
    pub cell_size: CellSize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            initial_scale: Zoom::DEFAULT_SCALE,
            fit_width_on_load: false,
            swipe: SwipePolicy::default(),
            fit_padding: Zoom::FIT_PADDING,
            cell_size: CellSize::default(),
        }
    }
}

/// Page view controller driving a [`RenderBackend`]
pub struct ViewerController<B: RenderBackend> {
    backend: B,
    config: ViewerConfig,
    document: Option<DocumentInfo>,
    /// Reference of the most recent open request
    reference: Option<String>,
    state: ViewState,
    readout: Readout,
    gesture: GestureTracker,
    pointer: PointerAdapter,
    in_flight: Option<RequestId>,
    fit_requests: HashSet<RequestId>,
    container_width: f32,
    surface: Option<Surface>,
    surface_page: Option<usize>,
    notifications: NotificationManager,
}

impl<B: RenderBackend> ViewerController<B> {
    #[must_use]
    pub fn new(backend: B, config: ViewerConfig) -> Self {
        Self {
            backend,
            config,
            document: None,
            reference: None,
            state: ViewState::new(config.initial_scale),
            readout: Readout::default(),
            gesture: GestureTracker::new(),
            pointer: PointerAdapter::new(config.cell_size),
            in_flight: None,
            fit_requests: HashSet::new(),
            container_width: 0.0,
            surface: None,
            surface_page: None,
            notifications: NotificationManager::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn readout(&self) -> &Readout {
        &self.readout
    }

    pub fn document(&self) -> Option<&DocumentInfo> {
        self.document.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    pub fn page_count(&self) -> usize {
        self.document.as_ref().map_or(0, |doc| doc.page_count)
    }

    pub fn current_page(&self) -> usize {
        self.state.current_page
    }

    pub fn scale(&self) -> f32 {
        self.state.scale()
    }

    /// Last completed render
    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    /// Page shown by [`ViewerController::surface`]
    pub fn surface_page(&self) -> Option<usize> {
        self.surface_page
    }

    pub fn notifications(&self) -> &NotificationManager {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationManager {
        &mut self.notifications
    }

    /// Width available to the page, in pixel units
    pub fn set_container_width(&mut self, width: f32) {
        self.container_width = width;
    }

    pub fn container_width(&self) -> f32 {
        self.container_width
    }

    /// Open a document, replacing the current one
    pub fn open(&mut self, reference: &str) {
        info!("Opening {reference}");
        let _ = self.state.apply(Command::Reset);
        self.document = None;
        self.reference = Some(reference.to_string());
        self.fit_requests.clear();
        self.surface = None;
        self.surface_page = None;
        self.gesture.cancel();
        self.backend.load(reference);
    }

    /// Open the last requested document again
    pub fn reload(&mut self) {
        if let Some(reference) = self.reference.clone() {
            self.open(&reference);
        }
    }

    /// Render `page`, or remember it as the next page if a render is running
    pub fn request_render(&mut self, page: usize) {
        if self.document.is_none() {
            return;
        }
        self.apply(Command::RequestRender(page));
    }

    pub fn show_next(&mut self) {
        let page_count = self.page_count();
        if page_count == 0 {
            return;
        }
        self.apply(Command::ShowNext { page_count });
    }

    pub fn show_prev(&mut self) {
        if self.document.is_none() {
            return;
        }
        self.apply(Command::ShowPrev);
    }

    pub fn go_to_page(&mut self, page: usize) {
        let page_count = self.page_count();
        if page_count == 0 {
            return;
        }
        self.apply(Command::GoToPage { page, page_count });
    }

    /// Jump to a page typed by the user; anything unparsable means page 1
    pub fn go_to_page_input(&mut self, input: &str) {
        self.go_to_page(parse_page_input(input));
    }

    pub fn go_to_first(&mut self) {
        self.go_to_page(1);
    }

    pub fn go_to_last(&mut self) {
        self.go_to_page(self.page_count());
    }

    pub fn zoom_in(&mut self) {
        if self.document.is_none() {
            return;
        }
        self.apply(Command::ZoomIn);
    }

    pub fn zoom_out(&mut self) {
        if self.document.is_none() {
            return;
        }
        self.apply(Command::ZoomOut);
    }

    /// Scale the current page to the container width.
    ///
    /// The page's natural width is resolved by the backend first; the scale is
    /// applied when that measurement comes back.
    pub fn fit_width(&mut self) {
        if self.document.is_none() {
            return;
        }
        let id = self.backend.measure(self.state.current_page, 1.0);
        debug!("Fit width requested for page {}", self.state.current_page);
        self.fit_requests.insert(id);
    }

    /// Apply a finished gesture to navigation.
    ///
    /// Returns the direction only if the page actually changed.
    pub fn handle_gesture(&mut self, end: GestureEnd) -> Option<SwipeDirection> {
        if self.document.is_none() {
            return None;
        }
        let direction = self.config.swipe.decide(end)?;
        debug!("Swipe {direction:?} (dx={}, dy={})", end.dx, end.dy);
        let before = self.state.current_page;
        match direction {
            SwipeDirection::Next => self.show_next(),
            SwipeDirection::Previous => self.show_prev(),
        }
        (self.state.current_page != before).then_some(direction)
    }

    pub fn handle_touch(&mut self, event: &TouchEvent) -> Option<SwipeDirection> {
        let end = TouchAdapter.handle(&mut self.gesture, event)?;
        self.handle_gesture(end)
    }

    pub fn handle_pointer(&mut self, event: &MouseEvent) -> Option<SwipeDirection> {
        let end = self.pointer.handle(&mut self.gesture, event)?;
        self.handle_gesture(end)
    }

    pub fn cancel_gesture(&mut self) {
        self.gesture.cancel();
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gesture.is_active()
    }

    /// Process completed backend work. Returns true if anything changed.
    pub fn poll(&mut self) -> bool {
        let responses = self.backend.poll_responses();
        let changed = !responses.is_empty();
        for response in responses {
            self.handle_response(response);
        }
        changed
    }

    pub fn handle_response(&mut self, response: RenderResponse) {
        match response {
            RenderResponse::Loaded {
                reference,
                page_count,
                title,
            } => {
                if self.reference.as_deref() != Some(reference.as_str()) {
                    debug!("Ignoring load of superseded document {reference}");
                    return;
                }
                self.document = Some(DocumentInfo {
                    reference,
                    page_count,
                    title,
                });
                self.readout.page_count = page_count.to_string();
                self.request_render(self.state.current_page);
                if self.config.fit_width_on_load {
                    self.fit_width();
                }
            }

            RenderResponse::LoadFailed { reference, error } => {
                if self.reference.as_deref() != Some(reference.as_str()) {
                    return;
                }
                error!("Could not load {reference}: {error}");
                self.notifications
                    .error_blocking(format!("Could not open {reference}: {error}"));
            }

            RenderResponse::Measured { id, page, viewport } => {
                if !self.fit_requests.remove(&id) || self.document.is_none() {
                    return;
                }
                let Some(scale) =
                    fit_width_scale(self.container_width, viewport.width, self.config.fit_padding)
                else {
                    warn!("Page {page} reported unusable width {}", viewport.width);
                    return;
                };
                debug!("Fit width: page {page} natural width {} -> scale {scale:.3}", viewport.width);
                self.apply(Command::SetScale(scale));
            }

            RenderResponse::Rendered { id, page, surface } => {
                if self.in_flight != Some(id) {
                    debug!("Ignoring render {id:?} that is not in flight");
                    return;
                }
                self.in_flight = None;
                if self.document.is_some() {
                    self.surface = Some(surface);
                    self.surface_page = Some(page);
                }
                self.apply(Command::RenderCompleted);
            }

            RenderResponse::Error { id, error } => {
                if self.in_flight == Some(id) {
                    self.in_flight = None;
                    warn!("Render failed: {error}");
                    self.notifications.warn(format!("Render failed: {error}"));
                    self.apply(Command::RenderCompleted);
                } else if self.fit_requests.remove(&id) {
                    warn!("Fit width failed: {error}");
                }
            }
        }
    }

    fn apply(&mut self, cmd: Command) {
        let effects = self.state.apply(cmd);
        self.execute_effects(effects);
    }

    fn execute_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartRender(page) => {
                    let scale = self.state.scale();
                    let page_count = self.page_count();
                    let id = self.backend.render(page, scale);
                    debug!("Render {id:?}: page {page} at scale {scale:.3}");
                    self.in_flight = Some(id);
                    self.readout.update(page, page_count, scale);
                }
            }
        }
    }
}

/// Parse a typed page number; invalid or non-positive input becomes 1
#[must_use]
pub fn parse_page_input(input: &str) -> usize {
    match input.trim().parse::<i64>() {
        Ok(page) if page >= 1 => usize::try_from(page).unwrap_or(usize::MAX),
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::Viewport;
    use crate::test_utils::ScriptedBackend;

    fn loaded(page_count: usize) -> ViewerController<ScriptedBackend> {
        let mut viewer = ViewerController::new(ScriptedBackend::new(), ViewerConfig::default());
        viewer.open("doc.pdf");
        viewer.handle_response(RenderResponse::Loaded {
            reference: "doc.pdf".to_string(),
            page_count,
            title: None,
        });
        viewer
    }

    fn finish_render(viewer: &mut ViewerController<ScriptedBackend>) {
        let (id, page, _) = viewer.backend().last_render().unwrap();
        viewer.handle_response(RenderResponse::Rendered {
            id,
            page,
            surface: Surface::new(4, 4),
        });
    }

    #[test]
    fn parse_page_input_clamps_garbage_to_first_page() {
        assert_eq!(parse_page_input("7"), 7);
        assert_eq!(parse_page_input(" 12 "), 12);
        assert_eq!(parse_page_input("-5"), 1);
        assert_eq!(parse_page_input("0"), 1);
        assert_eq!(parse_page_input("abc"), 1);
        assert_eq!(parse_page_input(""), 1);
    }

    #[test]
    fn load_renders_first_page_and_updates_readout() {
        let viewer = loaded(5);
        assert_eq!(viewer.backend().rendered_pages(), vec![1]);
        assert_eq!(viewer.readout().page, "1");
        assert_eq!(viewer.readout().page_count, "5");
        assert_eq!(viewer.readout().zoom, "120%");
        assert!(viewer.state().is_rendering);
    }

    #[test]
    fn navigation_before_load_is_ignored() {
        let mut viewer = ViewerController::new(ScriptedBackend::new(), ViewerConfig::default());
        viewer.show_next();
        viewer.zoom_in();
        viewer.fit_width();
        viewer.go_to_page_input("3");
        viewer.request_render(2);
        assert!(viewer.backend().rendered_pages().is_empty());
        assert_eq!(viewer.current_page(), 1);
    }

    #[test]
    fn completion_installs_surface() {
        let mut viewer = loaded(3);
        finish_render(&mut viewer);
        assert!(!viewer.state().is_rendering);
        assert_eq!(viewer.surface_page(), Some(1));
        assert_eq!(viewer.surface().map(|s| s.width), Some(4));
    }

    #[test]
    fn stale_completion_is_ignored() {
        let mut viewer = loaded(3);
        viewer.handle_response(RenderResponse::Rendered {
            id: RequestId::new(999),
            page: 2,
            surface: Surface::new(1, 1),
        });
        assert!(viewer.state().is_rendering);
        assert!(viewer.surface().is_none());
    }

    #[test]
    fn render_error_releases_in_flight_slot() {
        let mut viewer = loaded(3);
        viewer.show_next();
        let (id, _, _) = viewer.backend().last_render().unwrap();
        viewer.handle_response(RenderResponse::Error {
            id,
            error: crate::pdf::WorkerFault::generic("boom"),
        });

        assert_eq!(viewer.backend().rendered_pages(), vec![1, 2]);
        assert_eq!(viewer.state().pending_page, None);
        assert!(viewer.notifications().current().is_some());
    }

    #[test]
    fn load_failure_shows_blocking_error() {
        let mut viewer = ViewerController::new(ScriptedBackend::new(), ViewerConfig::default());
        viewer.open("missing.pdf");
        viewer.handle_response(RenderResponse::LoadFailed {
            reference: "missing.pdf".to_string(),
            error: crate::pdf::WorkerFault::generic("no such file"),
        });

        assert!(!viewer.is_loaded());
        assert!(viewer.notifications().blocking().is_some());
        viewer.show_next();
        assert!(viewer.backend().rendered_pages().is_empty());
    }

    #[test]
    fn superseded_load_is_ignored() {
        let mut viewer = ViewerController::new(ScriptedBackend::new(), ViewerConfig::default());
        viewer.open("a.pdf");
        viewer.open("b.pdf");
        viewer.handle_response(RenderResponse::Loaded {
            reference: "a.pdf".to_string(),
            page_count: 2,
            title: None,
        });
        assert!(!viewer.is_loaded());
    }

    #[test]
    fn fit_width_applies_scale_when_measured() {
        let mut viewer = loaded(4);
        finish_render(&mut viewer);
        viewer.set_container_width(636.0);
        viewer.fit_width();

        let (id, page, scale) = viewer.backend().last_measure().unwrap();
        assert_eq!(page, 1);
        assert_eq!(scale, 1.0);

        viewer.handle_response(RenderResponse::Measured {
            id,
            page,
            viewport: Viewport::scaled(306.0, 396.0, 1.0),
        });
        assert!((viewer.scale() - 2.0).abs() < 1e-6);
        assert_eq!(viewer.backend().rendered_pages(), vec![1, 1]);
        assert_eq!(viewer.readout().zoom, "200%");
    }

    #[test]
    fn fit_width_renders_page_current_at_resolution() {
        let mut viewer = loaded(4);
        finish_render(&mut viewer);
        viewer.set_container_width(10_000.0);
        viewer.fit_width();
        let (id, page, _) = viewer.backend().last_measure().unwrap();

        viewer.show_next();
        finish_render(&mut viewer);

        viewer.handle_response(RenderResponse::Measured {
            id,
            page,
            viewport: Viewport::scaled(612.0, 792.0, 1.0),
        });
        assert_eq!(viewer.scale(), Zoom::FIT_MAX_SCALE);
        assert_eq!(viewer.backend().rendered_pages(), vec![1, 2, 2]);
    }

    #[test]
    fn fit_width_on_load_requests_measurement() {
        let config = ViewerConfig {
            fit_width_on_load: true,
            ..ViewerConfig::default()
        };
        let mut viewer = ViewerController::new(ScriptedBackend::new(), config);
        viewer.open("doc.pdf");
        viewer.handle_response(RenderResponse::Loaded {
            reference: "doc.pdf".to_string(),
            page_count: 2,
            title: None,
        });
        assert!(viewer.backend().last_measure().is_some());
    }

    #[test]
    fn out_of_range_initial_scale_is_clamped_on_first_render() {
        for (initial_scale, expected) in [(100.0, Zoom::MAX_SCALE), (0.1, Zoom::MIN_SCALE)] {
            let config = ViewerConfig {
                initial_scale,
                ..ViewerConfig::default()
            };
            let mut viewer = ViewerController::new(ScriptedBackend::new(), config);
            viewer.open("doc.pdf");
            viewer.handle_response(RenderResponse::Loaded {
                reference: "doc.pdf".to_string(),
                page_count: 2,
                title: None,
            });

            let (_, _, scale) = viewer.backend().last_render().unwrap();
            assert_eq!(scale, expected);

            finish_render(&mut viewer);
            viewer.zoom_out();
            assert!(viewer.scale() <= Zoom::MAX_SCALE);
            assert!(viewer.scale() >= Zoom::MIN_SCALE);
        }
    }

    #[test]
    fn pointer_swipe_turns_page() {
        use crossterm::event::{KeyModifiers, MouseButton, MouseEventKind};

        let mut viewer = loaded(5);
        finish_render(&mut viewer);
        let mouse = |kind, column| MouseEvent {
            kind,
            column,
            row: 10,
            modifiers: KeyModifiers::empty(),
        };

        assert_eq!(
            viewer.handle_pointer(&mouse(MouseEventKind::Down(MouseButton::Left), 40)),
            None
        );
        assert_eq!(
            viewer.handle_pointer(&mouse(MouseEventKind::Up(MouseButton::Left), 20)),
            Some(SwipeDirection::Next)
        );
        assert_eq!(viewer.current_page(), 2);
    }

    #[test]
    fn reload_reopens_same_reference() {
        let mut viewer = loaded(5);
        viewer.reload();
        assert!(!viewer.is_loaded());
        assert_eq!(viewer.backend().loads(), vec!["doc.pdf", "doc.pdf"]);
    }
}
