//! Wire-level types for the record-browser panel channel.
//!
//! The channel is async, unordered, and fire-and-forget: every tracked
//! request/response pair is matched by correlation id, and everything here is
//! plain data with no I/O. The session logic that drives these types lives in
//! the `periscope-core` crate.

mod explain;
mod filter;
mod message;
mod request_id;
mod search;

pub use explain::ExplainParse;
pub use explain::parse_explain_score;
pub use filter::FilterCondition;
pub use filter::FilterOperator;
pub use filter::FilterPatch;
pub use filter::MatchMode;
pub use filter::ValueType;
pub use message::DecodeError;
pub use message::InboundMessage;
pub use message::InitPayload;
pub use message::OutboundMessage;
pub use message::PropertySummary;
pub use message::QueryResultPayload;
pub use message::VectorSearchResultPayload;
pub use message::decode_inbound;
pub use request_id::RequestId;
pub use request_id::StreamKind;
pub use search::DistanceMetric;
pub use search::FusionType;
pub use search::ScoreBreakdown;
pub use search::SearchMode;
pub use search::SearchResult;
pub use search::VectorHit;
pub use search::VectorQuery;
