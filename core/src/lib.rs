//! Client-side coordination engine for a record-browser panel talking to a
//! remote vector data store over an async, unordered, fire-and-forget
//! channel.
//!
//! The engine issues correlated requests, drops stale or out-of-order
//! responses, supersedes in-flight work when inputs change, debounces
//! parameter churn, runs the vector-search mode machine, and stages filter
//! edits in a two-phase pending/active protocol. All of it is driven through
//! a single dispatcher, [`PanelSession::handle_event`]; rendering and the
//! backend itself live with the host.

mod channel;
mod config;
mod coordinator;
mod events;
mod filters;
mod reconciler;
mod session;
mod vector_search;

pub use channel::ChannelClosed;
pub use channel::ChannelSender;
pub use channel::PanelChannel;
pub use config::DEFAULT_DEBOUNCE_WINDOW;
pub use config::DEFAULT_PAGE_SIZE;
pub use config::DEFAULT_REQUEST_TIMEOUT;
pub use config::DEFAULT_SEARCH_LIMIT;
pub use config::SessionConfig;
pub use coordinator::PayloadBuilder;
pub use coordinator::RequestCoordinator;
pub use events::SessionEvent;
pub use filters::FilterPreset;
pub use filters::FilterStore;
pub use reconciler::InboundDisposition;
pub use reconciler::Reconciliation;
pub use reconciler::classify;
pub use reconciler::reconcile;
pub use session::CollectionInfo;
pub use session::PanelSession;
pub use session::RecordsState;
pub use vector_search::SearchParamsPatch;
pub use vector_search::SearchValidationError;
pub use vector_search::VectorSearchParams;
pub use vector_search::VectorSearchState;
pub use vector_search::parse_vector;
