//! View state management

use super::zoom::{Zoom, percent};

/// Interaction state of the viewer.
///
/// `pending_page` is only ever `Some` while `is_rendering` is true.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    /// Current page (1-based)
    pub current_page: usize,

    pub zoom: Zoom,

    /// A render is running against the surface
    pub is_rendering: bool,

    /// Latest page requested while a render was running
    pub pending_page: Option<usize>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(Zoom::DEFAULT_SCALE)
    }
}

impl ViewState {
    #[must_use]
    pub fn new(scale: f32) -> Self {
        Self {
            current_page: 1,
            zoom: Zoom::new(scale),
            is_rendering: false,
            pending_page: None,
        }
    }

    pub fn scale(&self) -> f32 {
        self.zoom.factor()
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::RequestRender(page) => {
                if self.is_rendering {
                    self.pending_page = Some(page);
                    vec![]
                } else {
                    self.is_rendering = true;
                    vec![Effect::StartRender(page)]
                }
            }

            Command::RenderCompleted => {
                self.is_rendering = false;
                match self.pending_page.take() {
                    Some(page) => {
                        self.is_rendering = true;
                        vec![Effect::StartRender(page)]
                    }
                    None => vec![],
                }
            }

            Command::ShowNext { page_count } => {
                if self.current_page >= page_count {
                    return vec![];
                }
                self.current_page += 1;
                self.apply(Command::RequestRender(self.current_page))
            }

            Command::ShowPrev => {
                if self.current_page <= 1 {
                    return vec![];
                }
                self.current_page -= 1;
                self.apply(Command::RequestRender(self.current_page))
            }

            Command::GoToPage { page, page_count } => {
                self.current_page = page.clamp(1, page_count.max(1));
                self.apply(Command::RequestRender(self.current_page))
            }

            Command::ZoomIn => {
                self.zoom.step_in();
                self.apply(Command::RequestRender(self.current_page))
            }

            Command::ZoomOut => {
                self.zoom.step_out();
                self.apply(Command::RequestRender(self.current_page))
            }

            Command::SetScale(scale) => {
                self.zoom.factor = scale;
                self.apply(Command::RequestRender(self.current_page))
            }

            Command::Reset => {
                self.current_page = 1;
                self.pending_page = None;
                vec![]
            }
        }
    }
}

/// Commands that modify view state
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Render a page now, or remember it if a render is running
    RequestRender(usize),
    /// The running render finished (successfully or not)
    RenderCompleted,
    ShowNext { page_count: usize },
    ShowPrev,
    /// Jump to a page, clamped to `1..=page_count`
    GoToPage { page: usize, page_count: usize },
    ZoomIn,
    ZoomOut,
    /// Apply an already clamped scale (fit-to-width)
    SetScale(f32),
    /// A new document is being opened
    Reset,
}

/// Effects produced by state changes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Dispatch a render of the page at the current scale
    StartRender(usize),
}

/// Text of the visible readouts
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Readout {
    /// Page number field
    pub page: String,
    /// Page count label
    pub page_count: String,
    /// Zoom percentage label
    pub zoom: String,
}

impl Readout {
    pub fn update(&mut self, page: usize, page_count: usize, scale: f32) {
        self.page = page.to_string();
        self.page_count = page_count.to_string();
        self.zoom = format!("{}%", percent(scale));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendering_state() -> ViewState {
        let mut state = ViewState::default();
        let effects = state.apply(Command::RequestRender(1));
        assert_eq!(effects, vec![Effect::StartRender(1)]);
        state
    }

    #[test]
    fn request_while_idle_starts_render() {
        let mut state = ViewState::default();
        let effects = state.apply(Command::RequestRender(3));
        assert!(state.is_rendering);
        assert_eq!(effects, vec![Effect::StartRender(3)]);
    }

    #[test]
    fn requests_while_rendering_coalesce_to_latest() {
        let mut state = rendering_state();
        for page in 2..=6 {
            assert!(state.apply(Command::RequestRender(page)).is_empty());
        }
        assert_eq!(state.pending_page, Some(6));

        let effects = state.apply(Command::RenderCompleted);
        assert_eq!(effects, vec![Effect::StartRender(6)]);
        assert!(state.is_rendering);
        assert_eq!(state.pending_page, None);

        assert!(state.apply(Command::RenderCompleted).is_empty());
        assert!(!state.is_rendering);
    }

    #[test]
    fn show_next_stops_at_last_page() {
        let mut state = ViewState::default();
        state.current_page = 3;
        assert!(state.apply(Command::ShowNext { page_count: 3 }).is_empty());
        assert_eq!(state.current_page, 3);
    }

    #[test]
    fn show_prev_stops_at_first_page() {
        let mut state = ViewState::default();
        assert!(state.apply(Command::ShowPrev).is_empty());
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn go_to_page_clamps_to_range() {
        let mut state = ViewState::default();
        let effects = state.apply(Command::GoToPage {
            page: 999,
            page_count: 10,
        });
        assert_eq!(state.current_page, 10);
        assert_eq!(effects, vec![Effect::StartRender(10)]);

        let _ = state.apply(Command::RenderCompleted);
        let _ = state.apply(Command::GoToPage {
            page: 0,
            page_count: 10,
        });
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn zoom_rerenders_current_page() {
        let mut state = ViewState::new(1.0);
        state.current_page = 4;
        let effects = state.apply(Command::ZoomIn);
        assert!((state.scale() - 1.15).abs() < 1e-6);
        assert_eq!(effects, vec![Effect::StartRender(4)]);
    }

    #[test]
    fn reset_clears_pending_but_not_in_flight() {
        let mut state = rendering_state();
        let _ = state.apply(Command::RequestRender(5));
        let _ = state.apply(Command::Reset);
        assert!(state.is_rendering);
        assert_eq!(state.pending_page, None);
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn readout_formats_zoom_percentage() {
        let mut readout = Readout::default();
        readout.update(2, 12, 1.2);
        assert_eq!(readout.page, "2");
        assert_eq!(readout.page_count, "12");
        assert_eq!(readout.zoom, "120%");
    }
}
