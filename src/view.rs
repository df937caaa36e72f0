//! Viewer state management
//!
//! Navigation, zoom and display toggles are applied as [`Command`]s and
//! report the work left to do as [`Effect`]s. Nothing here touches the
//! engine, the network or the terminal.

use crate::document::Zoom;

/// Which comments the sidebar lists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayMode {
    /// Only comments of the current page
    #[default]
    PerPage,
    /// Every comment of the document
    All,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::PerPage => Self::All,
            Self::All => Self::PerPage,
        }
    }

    pub fn is_per_page(self) -> bool {
        self == Self::PerPage
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PerPage => "This page",
            Self::All => "All pages",
        }
    }
}

/// Current view state of a document session
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    /// Current page (1-based)
    pub page: u32,

    /// Total page count
    pub page_count: u32,

    pub zoom: Zoom,

    pub mode: DisplayMode,

    pub night_mode: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(0, false)
    }
}

impl ViewState {
    #[must_use]
    pub fn new(page_count: u32, night_mode: bool) -> Self {
        Self {
            page: 1,
            page_count,
            zoom: Zoom::default(),
            mode: DisplayMode::PerPage,
            night_mode,
        }
    }

    pub fn scale(&self) -> f64 {
        self.zoom.factor()
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::NextPage => {
                if self.page < self.page_count {
                    self.go_to(self.page + 1)
                } else {
                    vec![]
                }
            }

            Command::PrevPage => {
                if self.page > 1 {
                    self.go_to(self.page - 1)
                } else {
                    vec![]
                }
            }

            Command::GoToPage(page) => {
                if page == 0 || page > self.page_count || page == self.page {
                    vec![]
                } else {
                    self.go_to(page)
                }
            }

            Command::ZoomIn => self.zoom_changed(|zoom| zoom.step_in()),
            Command::ZoomOut => self.zoom_changed(|zoom| zoom.step_out()),
            Command::ResetZoom => self.zoom_changed(|zoom| zoom.reset()),

            Command::SetMode(mode) => {
                if self.mode == mode {
                    vec![]
                } else {
                    self.mode = mode;
                    vec![Effect::ReloadComments]
                }
            }

            Command::ToggleMode => {
                self.mode = self.mode.toggled();
                vec![Effect::ReloadComments]
            }

            Command::ToggleNightMode => {
                self.night_mode = !self.night_mode;
                vec![Effect::PersistNightMode(self.night_mode)]
            }

            Command::SetPageCount(count) => {
                self.page_count = count;
                let clamped = self.page.clamp(1, count.max(1));
                if clamped != self.page {
                    self.page = clamped;
                    vec![Effect::RenderPage(clamped), Effect::ReloadComments]
                } else {
                    vec![]
                }
            }
        }
    }

    fn go_to(&mut self, page: u32) -> Vec<Effect> {
        self.page = page;
        vec![Effect::RenderPage(page), Effect::ReloadComments]
    }

    fn zoom_changed(&mut self, change: impl FnOnce(&mut Zoom) -> bool) -> Vec<Effect> {
        if change(&mut self.zoom) {
            vec![Effect::RenderPage(self.page), Effect::ReloadComments]
        } else {
            vec![]
        }
    }
}

/// Commands that modify the view state
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    NextPage,
    PrevPage,
    /// Jump to a 1-based page
    GoToPage(u32),
    ZoomIn,
    ZoomOut,
    ResetZoom,
    SetMode(DisplayMode),
    ToggleMode,
    ToggleNightMode,
    SetPageCount(u32),
}

/// Work requested by a state change, in order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Render this page at the current scale
    RenderPage(u32),
    /// Rebuild markers and sidebar from a fresh fetch
    ReloadComments,
    /// Store the night mode flag in the settings
    PersistNightMode(bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ViewState {
        ViewState::new(3, false)
    }

    #[test]
    fn next_page_renders_then_reloads() {
        let mut state = state();
        let effects = state.apply(Command::NextPage);
        assert_eq!(effects, vec![Effect::RenderPage(2), Effect::ReloadComments]);
        assert_eq!(state.page, 2);
    }

    #[test]
    fn navigation_is_a_noop_at_boundaries() {
        let mut state = state();
        assert!(state.apply(Command::PrevPage).is_empty());
        assert_eq!(state.page, 1);

        state.page = 3;
        assert!(state.apply(Command::NextPage).is_empty());
        assert_eq!(state.page, 3);
    }

    #[test]
    fn go_to_page_ignores_out_of_range_and_current() {
        let mut state = state();
        assert!(state.apply(Command::GoToPage(0)).is_empty());
        assert!(state.apply(Command::GoToPage(4)).is_empty());
        assert!(state.apply(Command::GoToPage(1)).is_empty());
        assert_eq!(
            state.apply(Command::GoToPage(3)),
            vec![Effect::RenderPage(3), Effect::ReloadComments]
        );
    }

    #[test]
    fn zoom_in_ten_times_stops_at_max() {
        let mut state = state();
        for _ in 0..10 {
            let _ = state.apply(Command::ZoomIn);
        }
        assert_eq!(state.scale(), Zoom::MAX_SCALE);
        assert!(state.apply(Command::ZoomIn).is_empty());
    }

    #[test]
    fn zoom_rerenders_current_page() {
        let mut state = state();
        state.page = 2;
        assert_eq!(
            state.apply(Command::ZoomOut),
            vec![Effect::RenderPage(2), Effect::ReloadComments]
        );
        assert_eq!(
            state.apply(Command::ResetZoom),
            vec![Effect::RenderPage(2), Effect::ReloadComments]
        );
        assert!(state.apply(Command::ResetZoom).is_empty());
    }

    #[test]
    fn mode_change_only_reloads_comments() {
        let mut state = state();
        assert!(state.apply(Command::SetMode(DisplayMode::PerPage)).is_empty());
        assert_eq!(
            state.apply(Command::SetMode(DisplayMode::All)),
            vec![Effect::ReloadComments]
        );
        assert_eq!(state.apply(Command::ToggleMode), vec![Effect::ReloadComments]);
        assert_eq!(state.mode, DisplayMode::PerPage);
    }

    #[test]
    fn night_mode_is_persisted() {
        let mut state = state();
        assert_eq!(
            state.apply(Command::ToggleNightMode),
            vec![Effect::PersistNightMode(true)]
        );
        assert_eq!(
            state.apply(Command::ToggleNightMode),
            vec![Effect::PersistNightMode(false)]
        );
    }

    #[test]
    fn shrinking_page_count_clamps_current_page() {
        let mut state = state();
        state.page = 3;
        assert_eq!(
            state.apply(Command::SetPageCount(2)),
            vec![Effect::RenderPage(2), Effect::ReloadComments]
        );
        assert!(state.apply(Command::SetPageCount(5)).is_empty());
    }
}
