//! Page view: render scheduling, navigation, zoom and swipe gestures

pub mod controller;
pub mod gesture;
pub mod state;
pub mod zoom;

pub use controller::{ViewerConfig, ViewerController, parse_page_input};
pub use gesture::{
    GestureEnd, GestureTracker, Point, PointerAdapter, SwipeDirection, SwipePolicy, TouchAdapter,
    TouchEvent,
};
pub use state::{Command, Effect, Readout, ViewState};
pub use zoom::Zoom;
