use periscope_protocol::FilterCondition;
use periscope_protocol::FilterPatch;
use periscope_protocol::MatchMode;
use periscope_protocol::RequestId;
use periscope_protocol::SearchMode;
use periscope_protocol::StreamKind;
use serde_json::Value;

use crate::vector_search::SearchParamsPatch;

/// Everything that can drive the session, funneled through
/// [`PanelSession::handle_event`](crate::PanelSession::handle_event): host
/// channel traffic, the session's own timers, and user actions forwarded by
/// the presentation layer.
#[derive(Debug)]
pub enum SessionEvent {
    /// Raw value received from the host channel. Decoding and correlation
    /// checks happen inside the dispatcher.
    MessageReceived(Value),

    /// A stream's debounce window elapsed; a coalesced trailing request may
    /// be due.
    DebounceElapsed(StreamKind),

    /// The timeout watchdog fired for a request that was current when armed.
    RequestTimedOut { stream: StreamKind, id: RequestId },

    // Filter actions.
    AddActiveFilter(FilterCondition),
    UpdateActiveFilter { id: String, patch: FilterPatch },
    RemoveActiveFilter { id: String },
    OpenStaging,
    AddPendingFilter(FilterCondition),
    UpdatePendingFilter { id: String, patch: FilterPatch },
    RemovePendingFilter { id: String },
    ApplyPending,
    DiscardPending,
    SetMatchMode(MatchMode),
    SavePreset { name: String },
    LoadPreset { id: String },
    DeletePreset { id: String },

    // Vector-search actions.
    SetSearchMode(SearchMode),
    SetSearchParams(SearchParamsPatch),
    /// "More like this" from elsewhere in the UI: opens the panel in object
    /// mode seeded with the source record's id.
    FindSimilar { source_id: String },
    ExecuteSearch,
    ClearSearch,
    SetSearchPanelOpen(bool),

    // Pagination.
    SetPage(usize),
    SetPageSize(usize),
}
