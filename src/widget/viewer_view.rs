//! Terminal presentation of the page viewer
//!
//! The screen is a one-line toolbar, the page area and a status line. Pages
//! are drawn with upper half blocks, so one cell shows two sampled pixels.

use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::notification::{Notification, NotificationLevel};
use crate::pdf::{CellSize, RenderBackend, Surface};
use crate::theme::{Base16Palette, OCEANIC_NEXT};
use crate::viewer::ViewerController;

/// Clickable toolbar controls
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolbarButton {
    Prev,
    PageField,
    Next,
    ZoomOut,
    ZoomIn,
    Fit,
}

/// Screen regions of the last drawn frame
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewerLayout {
    pub toolbar: Rect,
    pub page: Rect,
    pub status: Rect,
    pub buttons: Vec<(ToolbarButton, Rect)>,
}

impl ViewerLayout {
    pub fn new(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);

        Self {
            toolbar: chunks[0],
            page: chunks[1],
            status: chunks[2],
            buttons: Vec::new(),
        }
    }

    /// Toolbar control under a cell, if any
    pub fn button_at(&self, column: u16, row: u16) -> Option<ToolbarButton> {
        let position = Position::new(column, row);
        self.buttons
            .iter()
            .find(|(_, rect)| rect.contains(position))
            .map(|(button, _)| *button)
    }

    pub fn in_page_area(&self, column: u16, row: u16) -> bool {
        self.page.contains(Position::new(column, row))
    }
}

/// What the view needs beyond the controller
#[derive(Clone, Copy, Debug, Default)]
pub struct ViewerOverlay<'a> {
    /// Text typed into the page field while it has focus
    pub page_entry: Option<&'a str>,
    /// Rows of the page scrolled out above the page area
    pub scroll_rows: u16,
}

/// Number of cell rows a surface occupies
pub fn surface_rows(surface: &Surface, cell_size: CellSize) -> u16 {
    let cell_height = u32::from(cell_size.height.max(1));
    u16::try_from(surface.height.div_ceil(cell_height)).unwrap_or(u16::MAX)
}

/// Furthest the page can be scrolled within an area of `visible_rows`
pub fn max_scroll(surface: Option<&Surface>, cell_size: CellSize, visible_rows: u16) -> u16 {
    surface.map_or(0, |surface| {
        surface_rows(surface, cell_size).saturating_sub(visible_rows)
    })
}

pub fn draw_viewer<B: RenderBackend>(
    f: &mut Frame,
    viewer: &ViewerController<B>,
    overlay: ViewerOverlay<'_>,
) -> ViewerLayout {
    let palette = &OCEANIC_NEXT;
    let mut layout = ViewerLayout::new(f.area());

    let (toolbar, buttons) = toolbar_line(viewer, overlay.page_entry, layout.toolbar, palette);
    layout.buttons = buttons;
    f.render_widget(
        Paragraph::new(toolbar).style(Style::default().bg(palette.base_01)),
        layout.toolbar,
    );

    f.render_widget(
        Block::default().style(Style::default().bg(palette.base_00)),
        layout.page,
    );
    if let Some(surface) = viewer.surface() {
        f.render_widget(
            PageRaster {
                surface,
                cell_size: viewer.config().cell_size,
                scroll_rows: overlay.scroll_rows,
                background: palette.base_00,
            },
            layout.page,
        );
    }

    f.render_widget(
        Paragraph::new(status_line(viewer, palette)).style(Style::default().bg(palette.base_01)),
        layout.status,
    );

    if let Some(notification) = viewer.notifications().blocking() {
        draw_blocking_notification(f, notification, layout.page, palette);
    }

    layout
}

fn toolbar_line<B: RenderBackend>(
    viewer: &ViewerController<B>,
    page_entry: Option<&str>,
    area: Rect,
    palette: &Base16Palette,
) -> (Line<'static>, Vec<(ToolbarButton, Rect)>) {
    let button = Style::default().fg(palette.base_06).bg(palette.base_02);
    let label = Style::default().fg(palette.base_05);
    let readout = viewer.readout();

    let page_field = match page_entry {
        Some(text) => Span::styled(
            format!(" {text}_ "),
            Style::default()
                .fg(palette.base_00)
                .bg(palette.base_0a)
                .add_modifier(Modifier::BOLD),
        ),
        None => Span::styled(
            format!(" {:>3} ", readout.page),
            Style::default().fg(palette.base_07).bg(palette.base_02),
        ),
    };

    let segments: Vec<(Option<ToolbarButton>, Span<'static>)> = vec![
        (None, Span::raw(" ")),
        (Some(ToolbarButton::Prev), Span::styled(" ◀ ", button)),
        (None, Span::raw(" ")),
        (Some(ToolbarButton::PageField), page_field),
        (None, Span::styled(format!(" / {} ", readout.page_count), label)),
        (Some(ToolbarButton::Next), Span::styled(" ▶ ", button)),
        (None, Span::raw("   ")),
        (Some(ToolbarButton::ZoomOut), Span::styled(" − ", button)),
        (None, Span::raw(" ")),
        (Some(ToolbarButton::ZoomIn), Span::styled(" + ", button)),
        (None, Span::raw(" ")),
        (Some(ToolbarButton::Fit), Span::styled(" Fit ", button)),
        (
            None,
            Span::styled(
                format!(" {}", readout.zoom),
                label.fg(palette.base_0c).add_modifier(Modifier::BOLD),
            ),
        ),
    ];

    let mut x = area.x;
    let mut buttons = Vec::new();
    let mut spans = Vec::with_capacity(segments.len());
    for (target, span) in segments {
        let width = u16::try_from(span.width()).unwrap_or(u16::MAX);
        if let Some(target) = target {
            let rect = Rect::new(x, area.y, width, 1).intersection(area);
            if !rect.is_empty() {
                buttons.push((target, rect));
            }
        }
        x = x.saturating_add(width);
        spans.push(span);
    }

    (Line::from(spans), buttons)
}

fn status_line<B: RenderBackend>(
    viewer: &ViewerController<B>,
    palette: &Base16Palette,
) -> Line<'static> {
    let muted = Style::default().fg(palette.base_04);

    let transient = viewer
        .notifications()
        .current()
        .filter(|notification| !notification.is_blocking());
    if let Some(notification) = transient {
        return Line::from(Span::styled(
            format!(" {} ", notification.message),
            level_style(notification.level, palette),
        ));
    }

    let name = match viewer.document() {
        Some(document) => document
            .title
            .clone()
            .unwrap_or_else(|| document.reference.clone()),
        None => "No document".to_string(),
    };
    let mut spans = vec![Span::styled(format!(" {name}"), muted)];
    if viewer.state().is_rendering {
        spans.push(Span::styled(
            "  rendering…",
            Style::default().fg(palette.base_0d),
        ));
    }
    spans.push(Span::styled(
        "   ←/→ page  +/- zoom  w fit  g go to  q quit",
        Style::default().fg(palette.base_03),
    ));
    Line::from(spans)
}

fn level_style(level: NotificationLevel, palette: &Base16Palette) -> Style {
    match level {
        NotificationLevel::Info => Style::default().fg(palette.base_00).bg(palette.base_0b),
        NotificationLevel::Warning => Style::default().fg(palette.base_00).bg(palette.base_09),
        NotificationLevel::Error => Style::default()
            .fg(palette.base_07)
            .bg(palette.base_08)
            .add_modifier(Modifier::BOLD),
    }
}

fn draw_blocking_notification(
    f: &mut Frame,
    notification: &Notification,
    area: Rect,
    palette: &Base16Palette,
) {
    let width = u16::try_from(notification.message.chars().count() + 6)
        .unwrap_or(u16::MAX)
        .max(30)
        .min(area.width);
    let popup_area = centered_rect(width, 5, area);

    f.render_widget(Clear, popup_area);
    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(
            notification.message.clone(),
            Style::default().fg(palette.base_07),
        )),
        Line::from(Span::styled(
            "Enter/Esc to dismiss",
            Style::default().fg(palette.base_04),
        )),
    ])
    .block(
        Block::default()
            .title(" Error ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.base_08))
            .style(Style::default().bg(palette.base_00)),
    )
    .wrap(Wrap { trim: true });
    f.render_widget(paragraph, popup_area);
}

fn centered_rect(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    Rect::new(
        r.x + (r.width - width) / 2,
        r.y + (r.height - height) / 2,
        width,
        height,
    )
}

/// Half-block raster of a rendered page.
///
/// Each cell covers `cell_size` pixels of the surface; its top and bottom
/// halves are sampled at their centres. Narrow pages are centred, wide pages
/// are clipped on the right.
pub struct PageRaster<'a> {
    pub surface: &'a Surface,
    pub cell_size: CellSize,
    pub scroll_rows: u16,
    pub background: Color,
}

impl PageRaster<'_> {
    fn sample(&self, x: u32, y: u32) -> Color {
        self.surface
            .pixel(x, y)
            .map_or(self.background, |(r, g, b)| Color::Rgb(r, g, b))
    }
}

impl Widget for PageRaster<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        if area.is_empty() || self.surface.is_empty() {
            return;
        }

        let cell_width = u32::from(self.cell_size.width.max(1));
        let cell_height = u32::from(self.cell_size.height.max(1));
        let page_columns =
            u16::try_from(self.surface.width.div_ceil(cell_width)).unwrap_or(u16::MAX);
        let x_offset = area.width.saturating_sub(page_columns) / 2;
        let columns = page_columns.min(area.width - x_offset);

        let top_offset = cell_height / 4;
        let bottom_offset = cell_height * 3 / 4;

        for row in 0..area.height {
            let page_row = u32::from(row) + u32::from(self.scroll_rows);
            let y = page_row * cell_height;
            if y >= self.surface.height {
                break;
            }
            for column in 0..columns {
                let x = u32::from(column) * cell_width + cell_width / 2;
                let top = self.sample(x, y + top_offset);
                let bottom = self.sample(x, y + bottom_offset);
                buf[(area.x + x_offset + column, area.y + row)]
                    .set_char('▀')
                    .set_fg(top)
                    .set_bg(bottom);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::RenderResponse;
    use crate::test_utils::ScriptedBackend;
    use crate::test_utils::test_helpers::{capture_terminal_state, create_test_terminal};
    use crate::viewer::ViewerConfig;

    fn loaded_viewer(page_count: usize) -> ViewerController<ScriptedBackend> {
        let mut viewer = ViewerController::new(ScriptedBackend::new(), ViewerConfig::default());
        viewer.open("paper.pdf");
        viewer.handle_response(RenderResponse::Loaded {
            reference: "paper.pdf".to_string(),
            page_count,
            title: Some("A Paper".to_string()),
        });
        viewer
    }

    fn striped_surface() -> Surface {
        // 2 cells wide, 1 cell tall at the default 8x16 cell size
        let mut surface = Surface::new(16, 16);
        for y in 8..16 {
            for x in 0..16 {
                let offset = (y * 16 + x) * Surface::BYTES_PER_PIXEL;
                surface.pixels[offset..offset + 3].copy_from_slice(&[0, 0, 0]);
            }
        }
        surface
    }

    #[test]
    fn toolbar_shows_readouts() {
        let viewer = loaded_viewer(12);
        let mut terminal = create_test_terminal(80, 10);
        terminal
            .draw(|f| {
                draw_viewer(f, &viewer, ViewerOverlay::default());
            })
            .unwrap();

        let screen = capture_terminal_state(&terminal);
        let toolbar = screen.lines().next().unwrap();
        assert!(toolbar.contains("/ 12"));
        assert!(toolbar.contains("120%"));
        assert!(toolbar.contains("Fit"));
        assert!(screen.contains("A Paper"));
    }

    #[test]
    fn toolbar_buttons_are_hit_testable() {
        let viewer = loaded_viewer(3);
        let mut terminal = create_test_terminal(80, 10);
        let mut layout = ViewerLayout::default();
        terminal
            .draw(|f| layout = draw_viewer(f, &viewer, ViewerOverlay::default()))
            .unwrap();

        let (_, prev) = layout.buttons[0];
        assert_eq!(layout.button_at(prev.x, 0), Some(ToolbarButton::Prev));
        assert_eq!(layout.button_at(0, 0), None);

        let fit = layout
            .buttons
            .iter()
            .find(|(button, _)| *button == ToolbarButton::Fit)
            .map(|(_, rect)| *rect)
            .unwrap();
        assert_eq!(layout.button_at(fit.x + 1, 0), Some(ToolbarButton::Fit));
        assert!(layout.in_page_area(5, 3));
        assert!(!layout.in_page_area(5, 0));
    }

    #[test]
    fn page_entry_replaces_page_field() {
        let viewer = loaded_viewer(3);
        let mut terminal = create_test_terminal(80, 6);
        terminal
            .draw(|f| {
                draw_viewer(
                    f,
                    &viewer,
                    ViewerOverlay {
                        page_entry: Some("42"),
                        scroll_rows: 0,
                    },
                );
            })
            .unwrap();

        let screen = capture_terminal_state(&terminal);
        assert!(screen.lines().next().unwrap().contains("42_"));
    }

    #[test]
    fn blocking_notification_is_drawn_as_popup() {
        let mut viewer = ViewerController::new(ScriptedBackend::new(), ViewerConfig::default());
        viewer.open("missing.pdf");
        viewer.handle_response(RenderResponse::LoadFailed {
            reference: "missing.pdf".to_string(),
            error: crate::pdf::WorkerFault::generic("not found"),
        });

        let mut terminal = create_test_terminal(80, 12);
        terminal
            .draw(|f| {
                draw_viewer(f, &viewer, ViewerOverlay::default());
            })
            .unwrap();

        let screen = capture_terminal_state(&terminal);
        assert!(screen.contains("Error"));
        assert!(screen.contains("not found"));
    }

    #[test]
    fn raster_samples_top_and_bottom_halves() {
        let surface = striped_surface();
        let mut buf = Buffer::empty(Rect::new(0, 0, 6, 2));
        PageRaster {
            surface: &surface,
            cell_size: CellSize::default(),
            scroll_rows: 0,
            background: Color::Reset,
        }
        .render(Rect::new(0, 0, 6, 2), &mut buf);

        // Two page columns centred in six
        let cell = &buf[(2, 0)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 255, 255));
        assert_eq!(cell.bg, Color::Rgb(0, 0, 0));
        assert_eq!(buf[(0, 0)].symbol(), " ");
        assert_eq!(buf[(2, 1)].symbol(), " ");
    }

    #[test]
    fn scroll_limits_follow_page_height() {
        let surface = Surface::new(80, 160);
        let cells = CellSize::default();
        assert_eq!(surface_rows(&surface, cells), 10);
        assert_eq!(max_scroll(Some(&surface), cells, 4), 6);
        assert_eq!(max_scroll(Some(&surface), cells, 20), 0);
        assert_eq!(max_scroll(None, cells, 4), 0);
    }
}
