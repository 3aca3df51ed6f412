//! Swipe gesture recognition
//!
//! Touch and pointer-drag input are two thin adapters feeding the same
//! [`GestureTracker`]. A finished gesture is reduced to a [`GestureEnd`]
//! displacement and judged by one [`SwipePolicy`].

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use log::debug;

use crate::pdf::CellSize;

/// A contact position in pixel units
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Displacement between the start and end of a completed gesture
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureEnd {
    pub dx: f32,
    pub dy: f32,
}

/// Page turn requested by a swipe
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwipeDirection {
    Next,
    Previous,
}

/// Thresholds deciding whether a displacement is a page swipe
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwipePolicy {
    /// `|dx|` must exceed this to count as a swipe
    pub horizontal_threshold: f32,
    /// `|dy|` above this means the user was scrolling
    pub vertical_tolerance: f32,
}

impl Default for SwipePolicy {
    fn default() -> Self {
        Self {
            horizontal_threshold: 60.0,
            vertical_tolerance: 80.0,
        }
    }
}

impl SwipePolicy {
    #[must_use]
    pub fn decide(&self, end: GestureEnd) -> Option<SwipeDirection> {
        if end.dy.abs() > self.vertical_tolerance {
            debug!("Gesture dy={} treated as scroll", end.dy);
            return None;
        }
        if end.dx.abs() <= self.horizontal_threshold {
            return None;
        }
        if end.dx < 0.0 {
            Some(SwipeDirection::Next)
        } else {
            Some(SwipeDirection::Previous)
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum GesturePhase {
    #[default]
    Idle,
    Active {
        start: Point,
    },
}

/// Per-gesture state machine: Idle -> Active -> Idle
#[derive(Clone, Copy, Debug, Default)]
pub struct GestureTracker {
    phase: GesturePhase,
}

impl GestureTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, GesturePhase::Active { .. })
    }

    /// Start a gesture. Anything but exactly one contact aborts it.
    pub fn begin(&mut self, contacts: &[Point]) {
        self.phase = match contacts {
            [start] => GesturePhase::Active { start: *start },
            _ => GesturePhase::Idle,
        };
    }

    /// Finish the gesture at `end`, returning the displacement if one was active
    pub fn finish(&mut self, end: Point) -> Option<GestureEnd> {
        let phase = std::mem::take(&mut self.phase);
        match phase {
            GesturePhase::Active { start } => Some(GestureEnd {
                dx: end.x - start.x,
                dy: end.y - start.y,
            }),
            GesturePhase::Idle => None,
        }
    }

    pub fn cancel(&mut self) {
        self.phase = GesturePhase::Idle;
    }
}

/// Touch input as delivered by a touch-capable host
#[derive(Clone, Debug, PartialEq)]
pub enum TouchEvent {
    /// Contacts currently on the surface when a touch began
    Start { touches: Vec<Point> },
    /// The contact that was lifted
    End { changed: Point },
    /// The host took the touch over (e.g. for pinch zoom)
    Cancel,
}

/// Adapts touch events to the gesture tracker
#[derive(Clone, Copy, Debug, Default)]
pub struct TouchAdapter;

impl TouchAdapter {
    pub fn handle(&self, tracker: &mut GestureTracker, event: &TouchEvent) -> Option<GestureEnd> {
        match event {
            TouchEvent::Start { touches } => {
                tracker.begin(touches);
                None
            }
            TouchEvent::End { changed } => tracker.finish(*changed),
            TouchEvent::Cancel => {
                tracker.cancel();
                None
            }
        }
    }
}

/// Adapts left-button mouse drags to the gesture tracker.
///
/// Terminal mouse positions are cells; they are scaled to pixel units so the
/// same thresholds apply as for touch.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointerAdapter {
    pub cell_size: CellSize,
}

impl PointerAdapter {
    #[must_use]
    pub const fn new(cell_size: CellSize) -> Self {
        Self { cell_size }
    }

    pub fn handle(&self, tracker: &mut GestureTracker, mouse: &MouseEvent) -> Option<GestureEnd> {
        let (x, y) = self.cell_size.to_pixels(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                tracker.begin(&[Point::new(x, y)]);
                None
            }
            MouseEventKind::Up(MouseButton::Left) => tracker.finish(Point::new(x, y)),
            _ => None,
        }
    }
}
