//! The panel session: one state object, one dispatcher.
//!
//! Every input (user actions forwarded by the presentation layer, raw host
//! channel traffic, the coordinator's own timers) arrives as a
//! [`SessionEvent`] and is applied by [`PanelSession::handle_event`]. Store
//! transitions themselves are pure (see `filters` and `vector_search`); this
//! module is the only place they meet the channel and the timers.

use periscope_protocol::InitPayload;
use periscope_protocol::OutboundMessage;
use periscope_protocol::PropertySummary;
use periscope_protocol::RequestId;
use periscope_protocol::StreamKind;
use periscope_protocol::VectorHit;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use tracing::warn;

use crate::channel::ChannelSender;
use crate::channel::PanelChannel;
use crate::config::SessionConfig;
use crate::coordinator::PayloadBuilder;
use crate::coordinator::RequestCoordinator;
use crate::events::SessionEvent;
use crate::filters::FilterStore;
use crate::reconciler::InboundDisposition;
use crate::reconciler::classify;
use crate::vector_search::VectorSearchState;

/// The collection the backend announced via `init`, with enough schema for
/// filter path pickers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionInfo {
    pub name: String,
    pub properties: Vec<PropertySummary>,
}

/// Page-oriented view over the data-fetch stream.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordsState {
    pub rows: Vec<Value>,
    pub total_count: Option<u64>,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct PanelSession {
    coordinator: RequestCoordinator,
    filters: FilterStore,
    search: VectorSearchState,
    records: RecordsState,
    collection: Option<CollectionInfo>,
}

impl PanelSession {
    /// `events` is the dispatcher's own mailbox: the host forwards it raw
    /// channel traffic as [`SessionEvent::MessageReceived`], and the
    /// coordinator's timers post back into it.
    pub fn new(
        sender: Box<dyn ChannelSender + Send>,
        events: UnboundedSender<SessionEvent>,
        config: SessionConfig,
    ) -> Self {
        let channel = PanelChannel::new(sender);
        Self {
            coordinator: RequestCoordinator::new(channel, events, &config),
            filters: FilterStore::default(),
            search: VectorSearchState::new(config.search_limit),
            records: RecordsState {
                rows: Vec::new(),
                total_count: None,
                page: 1,
                page_size: config.page_size,
                loading: false,
                error: None,
            },
            collection: None,
        }
    }

    /// Announce a freshly attached panel so the host (re)sends `init`.
    pub fn announce_ready(&mut self) {
        self.coordinator.send_uncorrelated(OutboundMessage::Ready);
    }

    pub fn filters(&self) -> &FilterStore {
        &self.filters
    }

    pub fn search(&self) -> &VectorSearchState {
        &self.search
    }

    pub fn records(&self) -> &RecordsState {
        &self.records
    }

    pub fn collection(&self) -> Option<&CollectionInfo> {
        self.collection.as_ref()
    }

    pub fn channel_closed(&self) -> bool {
        self.coordinator.channel_closed()
    }

    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::MessageReceived(value) => self.on_message(value),
            SessionEvent::DebounceElapsed(stream) => {
                // The burst's leading response may have landed inside the
                // window; a trailing issue puts the stream back in flight.
                if self.coordinator.on_debounce_elapsed(stream) && stream == StreamKind::DataFetch {
                    self.records.loading = true;
                    self.records.error = None;
                }
            }
            SessionEvent::RequestTimedOut { stream, id } => self.on_timeout(stream, &id),

            SessionEvent::AddActiveFilter(condition) => {
                self.filters.add_active(condition);
                self.refetch_filters_changed();
            }
            SessionEvent::UpdateActiveFilter { id, patch } => {
                if self.filters.update_active(&id, patch) {
                    self.refetch_filters_changed();
                }
            }
            SessionEvent::RemoveActiveFilter { id } => {
                if self.filters.remove_active(&id) {
                    self.refetch_filters_changed();
                }
            }
            SessionEvent::OpenStaging => self.filters.open_staging(),
            SessionEvent::AddPendingFilter(condition) => self.filters.add_pending(condition),
            SessionEvent::UpdatePendingFilter { id, patch } => {
                self.filters.update_pending(&id, patch);
            }
            SessionEvent::RemovePendingFilter { id } => {
                self.filters.remove_pending(&id);
            }
            SessionEvent::ApplyPending => {
                self.filters.apply_pending();
                self.records.page = 1;
                self.refetch_now();
            }
            SessionEvent::DiscardPending => self.filters.discard_pending(),
            SessionEvent::SetMatchMode(mode) => {
                if self.filters.set_match_mode(mode) {
                    self.refetch_filters_changed();
                }
            }
            SessionEvent::SavePreset { name } => {
                self.filters.save_preset(&name);
            }
            SessionEvent::LoadPreset { id } => {
                if self.filters.load_preset(&id) {
                    self.records.page = 1;
                    self.refetch_now();
                }
            }
            SessionEvent::DeletePreset { id } => {
                self.filters.delete_preset(&id);
            }

            SessionEvent::SetSearchMode(mode) => self.search.set_mode(mode),
            SessionEvent::SetSearchParams(patch) => self.search.set_params(patch),
            SessionEvent::FindSimilar { source_id } => self.search.find_similar(source_id),
            SessionEvent::ExecuteSearch => self.execute_search(),
            SessionEvent::ClearSearch => {
                self.search.clear();
                self.coordinator.cancel(StreamKind::VectorSearch);
            }
            SessionEvent::SetSearchPanelOpen(open) => self.search.set_panel_open(open),

            SessionEvent::SetPage(page) => self.set_page(page),
            SessionEvent::SetPageSize(size) => self.set_page_size(size),
        }
    }

    fn on_message(&mut self, value: Value) {
        let disposition = classify(
            value,
            self.coordinator.current(StreamKind::DataFetch),
            self.coordinator.current(StreamKind::VectorSearch),
        );
        match disposition {
            InboundDisposition::ApplyRecords(payload) => {
                self.coordinator.complete(StreamKind::DataFetch);
                self.records.rows = payload.records;
                // Backends may omit the count on follow-up pages; keep the
                // last known value then.
                if payload.total_count.is_some() {
                    self.records.total_count = payload.total_count;
                }
                self.records.loading = false;
                self.records.error = None;
            }
            InboundDisposition::ApplySearch(payload) => {
                self.coordinator.complete(StreamKind::VectorSearch);
                let results = payload
                    .results
                    .into_iter()
                    .map(VectorHit::resolve)
                    .collect();
                self.search.apply_results(results);
            }
            InboundDisposition::FailStream { stream, message } => {
                self.coordinator.complete(stream);
                self.fail_stream(stream, message);
            }
            InboundDisposition::InitCollection(payload) => self.on_init(payload),
            InboundDisposition::ReissueDataFetch => {
                if self.coordinator.reissue(StreamKind::DataFetch) {
                    self.records.loading = true;
                    self.records.error = None;
                }
            }
            InboundDisposition::DropStale { stream, id } => {
                debug!(%stream, %id, "dropping stale response");
            }
            InboundDisposition::Ignore { kind } => {
                debug!(kind, "ignoring untracked message kind");
            }
            InboundDisposition::Malformed(error) => {
                warn!("failed to process message: {error}");
                self.records.error = Some("failed to process message".to_string());
            }
        }
    }

    /// Collection-change cascade. A duplicate `init` for the current
    /// collection is a complete no-op; a changed one resets filters, search,
    /// and pagination as one unit, keeping only the panel-open flag and the
    /// saved presets.
    fn on_init(&mut self, payload: InitPayload) {
        if self
            .collection
            .as_ref()
            .is_some_and(|current| current.name == payload.collection)
        {
            debug!(collection = %payload.collection, "duplicate init; cascade skipped");
            return;
        }
        self.coordinator.cancel(StreamKind::DataFetch);
        self.coordinator.cancel(StreamKind::VectorSearch);
        self.filters.reset();
        self.search.clear();
        self.records.rows.clear();
        self.records.total_count = None;
        self.records.page = 1;
        self.records.loading = false;
        self.records.error = None;
        self.collection = Some(CollectionInfo {
            name: payload.collection,
            properties: payload.properties,
        });
        self.refetch_now();
    }

    fn on_timeout(&mut self, stream: StreamKind, id: &RequestId) {
        if self.coordinator.on_timeout(stream, id) {
            self.fail_stream(stream, "request timed out".to_string());
        }
    }

    fn fail_stream(&mut self, stream: StreamKind, message: String) {
        match stream {
            StreamKind::DataFetch => {
                self.records.loading = false;
                self.records.error = Some(message);
            }
            StreamKind::VectorSearch => self.search.apply_error(message),
        }
    }

    fn execute_search(&mut self) {
        let Some(collection) = self.collection.as_ref().map(|info| info.name.clone()) else {
            self.search.apply_error("no collection selected".to_string());
            return;
        };
        match self.search.build_query() {
            Err(error) => self.search.set_validation_error(error),
            Ok(query) => {
                self.search.begin_search();
                self.coordinator
                    .issue(StreamKind::VectorSearch, move |id| {
                        OutboundMessage::VectorSearch {
                            correlation_id: id.clone(),
                            collection,
                            query,
                        }
                    });
            }
        }
    }

    fn set_page(&mut self, page: usize) {
        let page = page.max(1);
        if page == self.records.page {
            return;
        }
        self.records.page = page;
        self.refetch_now();
    }

    fn set_page_size(&mut self, size: usize) {
        let size = size.max(1);
        if size == self.records.page_size {
            return;
        }
        self.records.page_size = size;
        self.records.page = 1;
        self.refetch_now();
    }

    /// Any change to what the active filters mean restarts from page 1; the
    /// fetch itself is debounced to absorb editing bursts.
    fn refetch_filters_changed(&mut self) {
        self.records.page = 1;
        self.refetch_debounced();
    }

    fn refetch_now(&mut self) {
        let Some(build) = self.query_builder() else {
            debug!("no collection selected; skipping data fetch");
            return;
        };
        self.records.loading = true;
        self.records.error = None;
        self.coordinator.issue(StreamKind::DataFetch, build);
    }

    fn refetch_debounced(&mut self) {
        let Some(build) = self.query_builder() else {
            debug!("no collection selected; skipping data fetch");
            return;
        };
        self.records.loading = true;
        self.records.error = None;
        self.coordinator.debounced_issue(StreamKind::DataFetch, build);
    }

    fn query_builder(&self) -> Option<PayloadBuilder> {
        let collection = self.collection.as_ref()?.name.clone();
        let filters = self.filters.active().to_vec();
        let match_mode = self.filters.match_mode();
        let limit = self.records.page_size;
        let offset = self.records.page.saturating_sub(1) * limit;
        Some(Box::new(move |id: &RequestId| OutboundMessage::Query {
            correlation_id: id.clone(),
            collection,
            filters,
            match_mode,
            limit,
            offset,
        }))
    }
}
