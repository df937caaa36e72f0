pub mod test_helpers {
    use crate::document::{DocumentEngine, EngineError, OutlineItem, PageImage};
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

        /// Type every character of `text`
        pub fn type_text(mut self, text: &str) -> Self {
            for c in text.chars() {
                self.events.push(SimulatedEventSource::char_key(c));
            }
            self
        }

        pub fn press_key(mut self, code: KeyCode) -> Self {
            self.events
                .push(SimulatedEventSource::key_event(code, KeyModifiers::empty()));
            self
        }

        pub fn press_enter(self) -> Self {
            self.press_key(KeyCode::Enter)
        }

        /// Shift+Enter, a line break inside the comment input
        pub fn shift_enter(mut self) -> Self {
            self.events
                .push(SimulatedEventSource::key_event(KeyCode::Enter, KeyModifiers::SHIFT));
            self
        }

        pub fn press_esc(self) -> Self {
            self.press_key(KeyCode::Esc)
        }

        pub fn press_tab(self) -> Self {
            self.press_key(KeyCode::Tab)
        }

        /// Left click at a terminal cell
        pub fn click(mut self, column: u16, row: u16) -> Self {
            self.events.push(SimulatedEventSource::click(column, row));
            self
        }

        /// Quit the application (press 'q')
        pub fn quit(self) -> Self {
            self.press_char('q')
        }

        /// Build the simulated event source
        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    /// Engine rendering blank white pages of a fixed size
    pub struct BlankEngine {
        pages: usize,
        width: f64,
        height: f64,
        outline: Vec<OutlineItem>,
    }

    impl BlankEngine {
        pub fn new(pages: usize) -> Self {
            Self {
                pages,
                width: 400.0,
                height: 560.0,
                outline: Vec::new(),
            }
        }

        pub fn with_outline(mut self, outline: Vec<OutlineItem>) -> Self {
            self.outline = outline;
            self
        }
    }

    impl DocumentEngine for BlankEngine {
        fn page_count(&self) -> usize {
            self.pages
        }

        fn render_page(&self, page: u32, scale: f64) -> Result<PageImage, EngineError> {
            if page == 0 || page as usize > self.pages {
                return Err(EngineError::PageOutOfRange(page));
            }
            let width = (self.width * scale).round() as u32;
            let height = (self.height * scale).round() as u32;
            Ok(PageImage::filled(width, height, [255, 255, 255]))
        }

        fn outline(&self) -> Result<Vec<OutlineItem>, EngineError> {
            Ok(self.outline.clone())
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
            // Trim trailing whitespace from each line
            lines.push(line.trim_end().to_string());
        }

        // Remove trailing empty lines
        while lines.last().map(|l| l.is_empty()).unwrap_or(false) {
            lines.pop();
        }

        lines.join("\n")
    }
}
