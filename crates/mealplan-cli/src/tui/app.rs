//! TUI application state.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use mealplan_core::{MealPlanOutcome, MealPlanRequester, RequestState};

/// Which view the TUI is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Main,
    Help,
}

/// Whether the screen shows the generated plan or only that a request ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    ShowResult,
    Discard,
}

/// Application state for the TUI.
///
/// The screen owns the requester, and with it the request state, for as
/// long as it is mounted.
pub struct App {
    pub requester: Arc<MealPlanRequester>,
    pub endpoint: String,
    pub display: DisplayMode,
    pub current_view: View,
    pub scroll: u16,
    pub tick_rate: Duration,
    pub should_quit: bool,
    pub status_message: Option<String>,
    pending: Vec<JoinHandle<MealPlanOutcome>>,
    result_viewport: Option<ResultViewport>,
}

/// Size of the result panel as last rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResultViewport {
    /// Rows the result text occupies once wrapped.
    rows: usize,
    /// Rows visible inside the panel.
    height: u16,
}

impl App {
    pub fn new(requester: Arc<MealPlanRequester>, endpoint: String, display: DisplayMode) -> Self {
        Self {
            requester,
            endpoint,
            display,
            current_view: View::Main,
            scroll: 0,
            tick_rate: Duration::from_millis(100),
            should_quit: false,
            status_message: None,
            pending: Vec::new(),
            result_viewport: None,
        }
    }

    /// Current request state, read fresh on every render.
    pub fn state(&self) -> RequestState {
        self.requester.state()
    }

    /// Number of requests started but not yet resolved.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Drop handles of requests that have resolved.
    pub fn reap(&mut self) {
        self.pending.retain(|handle| !handle.is_finished());
    }

    // -- Navigation --

    pub fn navigate_back(&mut self) {
        match self.current_view {
            View::Main => self.should_quit = true,
            View::Help => self.current_view = View::Main,
        }
    }

    pub fn show_help(&mut self) {
        self.current_view = View::Help;
    }

    pub fn scroll_down(&mut self) {
        if self.scroll < self.max_scroll() {
            self.scroll += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    /// Record the wrapped height of the result text and the panel it is
    /// drawn in. Clamps the scroll offset if the panel grew or the text shrank.
    pub fn set_result_viewport(&mut self, rows: usize, height: u16) {
        self.result_viewport = Some(ResultViewport { rows, height });
        self.scroll = self.scroll.min(self.max_scroll());
    }

    /// Highest scroll offset that still fills the result panel.
    ///
    /// Before the first render only logical lines are known, so each line
    /// may be scrolled to the top.
    fn max_scroll(&self) -> u16 {
        if self.display == DisplayMode::Discard {
            return 0;
        }
        let hidden = match self.result_viewport {
            Some(viewport) => viewport.rows.saturating_sub(usize::from(viewport.height)),
            None => self
                .state()
                .result_text()
                .map(|t| t.lines().count())
                .unwrap_or(0)
                .saturating_sub(1),
        };
        u16::try_from(hidden).unwrap_or(u16::MAX)
    }

    // -- Actions --

    /// Fire a generation request without blocking the event loop.
    ///
    /// A request already in flight is left running; whichever resolves last
    /// determines what the screen shows.
    pub fn generate(&mut self) {
        self.reap();
        self.pending.push(self.requester.trigger());
        self.scroll = 0;
        if self.pending.len() > 1 {
            self.status_message = Some(format!("{} requests in flight", self.pending.len()));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
