use std::collections::VecDeque;

use crate::pdf::{RenderBackend, RenderResponse, RequestId};

/// A request recorded by [`ScriptedBackend`]
#[derive(Clone, Debug, PartialEq)]
pub enum Issued {
    Load(String),
    Measure {
        id: RequestId,
        page: usize,
        scale: f32,
    },
    Render {
        id: RequestId,
        page: usize,
        scale: f32,
    },
}

/// Backend that records every request and replays queued responses.
///
/// Nothing completes on its own; tests decide when and in which order work
/// finishes by pushing responses.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    issued: Vec<Issued>,
    queued: VecDeque<RenderResponse>,
    next_id: u64,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next [`RenderBackend::poll_responses`]
    pub fn push_response(&mut self, response: RenderResponse) {
        self.queued.push_back(response);
    }

    pub fn issued(&self) -> &[Issued] {
        &self.issued
    }

    pub fn loads(&self) -> Vec<String> {
        self.issued
            .iter()
            .filter_map(|issued| match issued {
                Issued::Load(reference) => Some(reference.clone()),
                _ => None,
            })
            .collect()
    }

    /// Pages of every render request, in issue order
    pub fn rendered_pages(&self) -> Vec<usize> {
        self.renders().map(|(_, page, _)| page).collect()
    }

    pub fn last_render(&self) -> Option<(RequestId, usize, f32)> {
        self.renders().last()
    }

    pub fn last_measure(&self) -> Option<(RequestId, usize, f32)> {
        self.issued
            .iter()
            .filter_map(|issued| match issued {
                Issued::Measure { id, page, scale } => Some((*id, *page, *scale)),
                _ => None,
            })
            .last()
    }

    fn renders(&self) -> impl Iterator<Item = (RequestId, usize, f32)> + '_ {
        self.issued.iter().filter_map(|issued| match issued {
            Issued::Render { id, page, scale } => Some((*id, *page, *scale)),
            _ => None,
        })
    }

    fn next_id(&mut self) -> RequestId {
        self.next_id += 1;
        RequestId::new(self.next_id)
    }
}

impl RenderBackend for ScriptedBackend {
    fn load(&mut self, reference: &str) {
        self.issued.push(Issued::Load(reference.to_string()));
    }

    fn measure(&mut self, page: usize, scale: f32) -> RequestId {
        let id = self.next_id();
        self.issued.push(Issued::Measure { id, page, scale });
        id
    }

    fn render(&mut self, page: usize, scale: f32) -> RequestId {
        let id = self.next_id();
        self.issued.push(Issued::Render { id, page, scale });
        id
    }

    fn poll_responses(&mut self) -> Vec<RenderResponse> {
        self.queued.drain(..).collect()
    }
}

pub mod test_helpers {
    use crate::event_source::{Event, KeyCode, KeyModifiers, SimulatedEventSource};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    /// Builder for creating test scenarios with simulated user input
    #[derive(Default)]
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a character key press
        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        pub fn press_enter(mut self) -> Self {
            self.events.push(SimulatedEventSource::key_event(
                KeyCode::Enter,
                KeyModifiers::empty(),
            ));
            self
        }

        pub fn press_esc(mut self) -> Self {
            self.events.push(SimulatedEventSource::key_event(
                KeyCode::Esc,
                KeyModifiers::empty(),
            ));
            self
        }

        /// Type text into whatever field has focus
        pub fn type_text(mut self, text: &str) -> Self {
            for c in text.chars() {
                self.events.push(SimulatedEventSource::char_key(c));
            }
            self
        }

        /// Next page n times (press 'l' n times)
        pub fn next_page(mut self, times: usize) -> Self {
            for _ in 0..times {
                self.events.push(SimulatedEventSource::char_key('l'));
            }
            self
        }

        /// Previous page n times (press 'h' n times)
        pub fn prev_page(mut self, times: usize) -> Self {
            for _ in 0..times {
                self.events.push(SimulatedEventSource::char_key('h'));
            }
            self
        }

        /// Open the page field, type `page` and confirm
        pub fn go_to_page(self, page: &str) -> Self {
            self.press_char('g').type_text(page).press_enter()
        }

        /// Left-button drag from one cell to another
        pub fn drag(mut self, from: (u16, u16), to: (u16, u16)) -> Self {
            self.events
                .push(SimulatedEventSource::mouse_down(from.0, from.1));
            self.events.push(SimulatedEventSource::mouse_up(to.0, to.1));
            self
        }

        pub fn click(self, column: u16, row: u16) -> Self {
            self.drag((column, row), (column, row))
        }

        pub fn resize(mut self, width: u16, height: u16) -> Self {
            self.events.push(Event::Resize(width, height));
            self
        }

        /// Quit the application (press 'q')
        pub fn quit(mut self) -> Self {
            self.events.push(SimulatedEventSource::char_key('q'));
            self
        }

        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    /// Create a test terminal for snapshot testing
    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    /// Capture the current terminal buffer as a string
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            lines.push(line.trim_end().to_string());
        }

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        lines.join("\n")
    }
}
