use std::time::Duration;

/// Coalescing window for parameter-driven refetches.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);
/// How long an issued request may go unanswered before the stream errors.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PAGE_SIZE: usize = 25;
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Tunables for one panel session. Hosts construct this once at attach time;
/// nothing here changes while the session runs.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub debounce_window: Duration,
    /// `None` disables the timeout watchdog entirely.
    pub request_timeout: Option<Duration>,
    pub page_size: usize,
    pub search_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            page_size: DEFAULT_PAGE_SIZE,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}
