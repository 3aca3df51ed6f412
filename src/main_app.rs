use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use log::debug;
use ratatui::{Frame, Terminal, layout::Rect};

use crate::event_source::EventSource;
use crate::pdf::RenderBackend;
use crate::viewer::ViewerController;
use crate::widget::viewer_view::{ToolbarButton, ViewerLayout, ViewerOverlay, draw_viewer, max_scroll};

/// Rows moved by one mouse wheel notch
const WHEEL_SCROLL_ROWS: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputMode {
    Normal,
    /// The page field has focus and holds the typed text
    PageEntry(String),
}

pub struct App<B: RenderBackend> {
    viewer: ViewerController<B>,
    mode: InputMode,
    scroll_rows: u16,
    /// Page whose surface the scroll offset belongs to
    scrolled_page: Option<usize>,
    layout: ViewerLayout,
}

impl<B: RenderBackend> App<B> {
    pub fn new(viewer: ViewerController<B>) -> Self {
        Self {
            viewer,
            mode: InputMode::Normal,
            scroll_rows: 0,
            scrolled_page: None,
            layout: ViewerLayout::default(),
        }
    }

    pub fn viewer(&self) -> &ViewerController<B> {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut ViewerController<B> {
        &mut self.viewer
    }

    pub fn layout(&self) -> &ViewerLayout {
        &self.layout
    }

    pub fn scroll_rows(&self) -> u16 {
        self.scroll_rows
    }

    /// Text typed into the page field, while it has focus
    pub fn page_entry(&self) -> Option<&str> {
        match &self.mode {
            InputMode::PageEntry(text) => Some(text),
            InputMode::Normal => None,
        }
    }

    pub fn handle_event(&mut self, event: &Event) -> Option<AppAction> {
        match event {
            Event::Key(key) => self.handle_key_event(*key),
            Event::Mouse(mouse) => {
                self.handle_mouse_event(*mouse);
                None
            }
            Event::Resize(width, height) => {
                self.handle_resize(*width, *height);
                None
            }
            _ => None,
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<AppAction> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(AppAction::Quit);
        }

        if self.viewer.notifications().blocking().is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.viewer.notifications_mut().dismiss_blocking();
            }
            return None;
        }

        if let InputMode::PageEntry(text) = &mut self.mode {
            match key.code {
                KeyCode::Enter => {
                    let input = std::mem::take(text);
                    self.mode = InputMode::Normal;
                    self.viewer.go_to_page_input(&input);
                }
                KeyCode::Esc => self.mode = InputMode::Normal,
                KeyCode::Backspace => {
                    text.pop();
                }
                KeyCode::Char(c) => text.push(c),
                _ => {}
            }
            return None;
        }

        match key.code {
            KeyCode::Char('q') => return Some(AppAction::Quit),
            KeyCode::Left | KeyCode::Char('h') | KeyCode::PageUp => self.viewer.show_prev(),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::PageDown => self.viewer.show_next(),
            KeyCode::Home => self.viewer.go_to_first(),
            KeyCode::End => self.viewer.go_to_last(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.viewer.zoom_in(),
            KeyCode::Char('-') => self.viewer.zoom_out(),
            KeyCode::Char('w') => self.viewer.fit_width(),
            KeyCode::Char('g') | KeyCode::Char(':') => self.start_page_entry(),
            KeyCode::Char('j') | KeyCode::Down => self.scroll_by(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_by(-1),
            KeyCode::Char('r') => self.viewer.reload(),
            KeyCode::Esc => {
                self.viewer.notifications_mut().dismiss_current();
            }
            _ => {}
        }
        None
    }

    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        if self.viewer.notifications().blocking().is_some() {
            return;
        }

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(button) = self.layout.button_at(mouse.column, mouse.row) {
                    self.press_button(button);
                } else if self.layout.in_page_area(mouse.column, mouse.row) {
                    self.mode = InputMode::Normal;
                    self.viewer.handle_pointer(&mouse);
                }
            }
            // A drag may end anywhere on screen
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(direction) = self.viewer.handle_pointer(&mouse) {
                    debug!("Pointer swipe turned page {direction:?}");
                }
            }
            MouseEventKind::ScrollDown if self.layout.in_page_area(mouse.column, mouse.row) => {
                self.scroll_by(i32::from(WHEEL_SCROLL_ROWS));
            }
            MouseEventKind::ScrollUp if self.layout.in_page_area(mouse.column, mouse.row) => {
                self.scroll_by(-i32::from(WHEEL_SCROLL_ROWS));
            }
            _ => {}
        }
    }

    pub fn handle_resize(&mut self, width: u16, height: u16) {
        // Buttons keep their drawn positions until the next frame
        let buttons = std::mem::take(&mut self.layout.buttons);
        self.layout = ViewerLayout::new(Rect::new(0, 0, width, height));
        self.layout.buttons = buttons;
        let cell_size = self.viewer.config().cell_size;
        self.viewer
            .set_container_width(cell_size.width_px(self.layout.page.width));
        self.viewer.cancel_gesture();
        self.clamp_scroll();
    }

    /// Process worker responses and expire notifications. Returns true if
    /// the screen needs redrawing.
    pub fn tick(&mut self) -> bool {
        let responses = self.viewer.poll();
        let expired = self.viewer.notifications_mut().update();

        if self.viewer.surface_page() != self.scrolled_page {
            self.scrolled_page = self.viewer.surface_page();
            self.scroll_rows = 0;
        }
        self.clamp_scroll();

        responses || expired
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let visible_rows = ViewerLayout::new(f.area()).page.height;
        let limit = max_scroll(
            self.viewer.surface(),
            self.viewer.config().cell_size,
            visible_rows,
        );
        self.scroll_rows = self.scroll_rows.min(limit);

        let overlay = ViewerOverlay {
            page_entry: self.page_entry(),
            scroll_rows: self.scroll_rows,
        };
        self.layout = draw_viewer(f, &self.viewer, overlay);
    }

    fn press_button(&mut self, button: ToolbarButton) {
        debug!("Toolbar {button:?}");
        if button == ToolbarButton::PageField {
            self.start_page_entry();
            return;
        }

        self.mode = InputMode::Normal;
        match button {
            ToolbarButton::Prev => self.viewer.show_prev(),
            ToolbarButton::Next => self.viewer.show_next(),
            ToolbarButton::ZoomOut => self.viewer.zoom_out(),
            ToolbarButton::ZoomIn => self.viewer.zoom_in(),
            ToolbarButton::Fit => self.viewer.fit_width(),
            ToolbarButton::PageField => {}
        }
    }

    fn start_page_entry(&mut self) {
        if self.viewer.is_loaded() {
            self.mode = InputMode::PageEntry(String::new());
        }
    }

    fn scroll_by(&mut self, rows: i32) {
        let target = i32::from(self.scroll_rows) + rows;
        self.scroll_rows = u16::try_from(target.max(0)).unwrap_or(u16::MAX);
        self.clamp_scroll();
    }

    fn clamp_scroll(&mut self) {
        let limit = max_scroll(
            self.viewer.surface(),
            self.viewer.config().cell_size,
            self.layout.page.height,
        );
        self.scroll_rows = self.scroll_rows.min(limit);
    }
}

pub fn run_app_with_event_source<B, R>(
    terminal: &mut Terminal<B>,
    app: &mut App<R>,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B: ratatui::backend::Backend,
    B::Error: Send + Sync + 'static,
    R: RenderBackend,
{
    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();
    let mut first_render = true;

    let size = terminal.size()?;
    app.handle_resize(size.width, size.height);

    loop {
        let mut events_processed = 0;
        let mut should_quit = false;
        while event_source.poll(Duration::from_millis(0))? && events_processed < 50 {
            let event = event_source.read()?;
            events_processed += 1;

            if app.handle_event(&event) == Some(AppAction::Quit) {
                should_quit = true;
                break;
            }
        }

        let mut needs_redraw = events_processed > 0;

        if first_render {
            needs_redraw = true;
            first_render = false;
        }

        if last_tick.elapsed() >= tick_rate {
            if app.tick() {
                needs_redraw = true;
            }
            last_tick = Instant::now();
        }

        if needs_redraw {
            terminal.draw(|f| app.draw(f))?;
        }

        if should_quit {
            return Ok(());
        }

        // If no events were processed, wait a bit to avoid busy-waiting
        if events_processed == 0 {
            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));
            let _ = event_source.poll(timeout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_source::SimulatedEventSource;
    use crate::pdf::{RenderResponse, Surface};
    use crate::test_utils::ScriptedBackend;
    use crate::viewer::ViewerConfig;

    fn loaded_app(page_count: usize) -> App<ScriptedBackend> {
        let mut viewer = ViewerController::new(ScriptedBackend::new(), ViewerConfig::default());
        viewer.open("doc.pdf");
        viewer.handle_response(RenderResponse::Loaded {
            reference: "doc.pdf".to_string(),
            page_count,
            title: None,
        });
        let mut app = App::new(viewer);
        app.handle_resize(80, 24);
        app
    }

    fn key(c: char) -> Event {
        SimulatedEventSource::char_key(c)
    }

    fn complete_render(app: &mut App<ScriptedBackend>, surface: Surface) {
        let (id, page, _) = app.viewer().backend().last_render().unwrap();
        app.viewer_mut()
            .backend_mut()
            .push_response(RenderResponse::Rendered { id, page, surface });
        app.tick();
    }

    #[test]
    fn page_entry_jumps_on_enter() {
        let mut app = loaded_app(10);
        app.handle_event(&key('g'));
        assert_eq!(app.page_entry(), Some(""));
        for c in "999".chars() {
            app.handle_event(&key(c));
        }
        app.handle_event(&SimulatedEventSource::key_event(
            KeyCode::Enter,
            KeyModifiers::empty(),
        ));

        assert_eq!(app.page_entry(), None);
        assert_eq!(app.viewer().current_page(), 10);
    }

    #[test]
    fn escape_cancels_page_entry() {
        let mut app = loaded_app(10);
        app.handle_event(&key(':'));
        app.handle_event(&key('4'));
        app.handle_event(&SimulatedEventSource::key_event(
            KeyCode::Esc,
            KeyModifiers::empty(),
        ));
        assert_eq!(app.page_entry(), None);
        assert_eq!(app.viewer().current_page(), 1);
    }

    #[test]
    fn blocking_error_swallows_input_until_dismissed() {
        let mut viewer = ViewerController::new(ScriptedBackend::new(), ViewerConfig::default());
        viewer.open("missing.pdf");
        viewer.handle_response(RenderResponse::LoadFailed {
            reference: "missing.pdf".to_string(),
            error: crate::pdf::WorkerFault::generic("not found"),
        });
        let mut app = App::new(viewer);

        assert_eq!(app.handle_event(&key('q')), None);
        app.handle_event(&SimulatedEventSource::key_event(
            KeyCode::Enter,
            KeyModifiers::empty(),
        ));
        assert!(app.viewer().notifications().blocking().is_none());
        assert_eq!(app.handle_event(&key('q')), Some(AppAction::Quit));
    }

    #[test]
    fn resize_sets_container_width_in_pixels() {
        let mut app = loaded_app(3);
        app.handle_resize(100, 30);
        assert_eq!(app.viewer().container_width(), 800.0);
    }

    #[test]
    fn resize_cancels_gesture_in_progress() {
        let mut app = loaded_app(3);
        app.handle_event(&SimulatedEventSource::mouse_down(40, 10));
        assert!(app.viewer().is_gesture_active());
        app.handle_event(&Event::Resize(90, 30));
        assert!(!app.viewer().is_gesture_active());
    }

    #[test]
    fn wheel_scrolls_within_page() {
        let mut app = loaded_app(3);
        // 30 rows of 16 pixels in a 22 row page area
        complete_render(&mut app, Surface::new(80, 480));

        app.handle_event(&SimulatedEventSource::scroll_down(10, 10));
        assert_eq!(app.scroll_rows(), 3);
        for _ in 0..10 {
            app.handle_event(&SimulatedEventSource::scroll_down(10, 10));
        }
        assert_eq!(app.scroll_rows(), 8);
        app.handle_event(&key('k'));
        assert_eq!(app.scroll_rows(), 7);
    }

    #[test]
    fn scroll_resets_when_page_changes() {
        let mut app = loaded_app(3);
        complete_render(&mut app, Surface::new(80, 480));
        app.handle_event(&key('j'));
        assert_eq!(app.scroll_rows(), 1);

        app.handle_event(&key('l'));
        complete_render(&mut app, Surface::new(80, 480));
        assert_eq!(app.scroll_rows(), 0);
    }
}
