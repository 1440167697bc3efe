//! Pure classification of inbound channel traffic.
//!
//! [`classify`] turns one raw channel value plus the coordinator's current
//! request ids into an [`InboundDisposition`] describing exactly what the
//! dispatcher should do, without touching any state itself. Keeping this step
//! pure means every race (stale response, superseded error, duplicate init)
//! is testable with plain values.

use periscope_protocol::DecodeError;
use periscope_protocol::InboundMessage;
use periscope_protocol::InitPayload;
use periscope_protocol::QueryResultPayload;
use periscope_protocol::RequestId;
use periscope_protocol::StreamKind;
use periscope_protocol::VectorSearchResultPayload;
use periscope_protocol::decode_inbound;
use serde_json::Value;

/// Whether an incoming correlation id still names the stream's current
/// request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciliation {
    Current,
    Stale,
}

pub fn reconcile(current: Option<&RequestId>, incoming: &RequestId) -> Reconciliation {
    match current {
        Some(id) if id == incoming => Reconciliation::Current,
        _ => Reconciliation::Stale,
    }
}

/// What the dispatcher should do with one raw channel value.
#[derive(Debug)]
pub enum InboundDisposition {
    /// Current data-fetch response; apply to records state.
    ApplyRecords(QueryResultPayload),
    /// Current vector-search response; apply to search state.
    ApplySearch(VectorSearchResultPayload),
    /// Current request failed remotely; surface on that stream.
    FailStream {
        stream: StreamKind,
        message: String,
    },
    /// Schema/init push; may trigger the collection-change cascade.
    InitCollection(InitPayload),
    /// Refresh push; re-issue the last data fetch under a fresh id.
    ReissueDataFetch,
    /// Correlation id is not the stream's current one; drop without side
    /// effects.
    DropStale {
        stream: StreamKind,
        id: RequestId,
    },
    /// Untracked kind; other collaborators share the channel.
    Ignore {
        kind: String,
    },
    /// Undecodable message; becomes a recoverable error state upstream.
    Malformed(DecodeError),
}

pub fn classify(
    value: Value,
    current_data_fetch: Option<&RequestId>,
    current_vector_search: Option<&RequestId>,
) -> InboundDisposition {
    let message = match decode_inbound(value) {
        Ok(message) => message,
        Err(error) => return InboundDisposition::Malformed(error),
    };
    match message {
        InboundMessage::Init(payload) => InboundDisposition::InitCollection(payload),
        InboundMessage::Refresh => InboundDisposition::ReissueDataFetch,
        InboundMessage::Unknown { kind } => InboundDisposition::Ignore { kind },
        InboundMessage::QueryResult { id, payload } => {
            match reconcile(current_data_fetch, &id) {
                Reconciliation::Current => InboundDisposition::ApplyRecords(payload),
                Reconciliation::Stale => InboundDisposition::DropStale {
                    stream: StreamKind::DataFetch,
                    id,
                },
            }
        }
        InboundMessage::VectorSearchResult { id, payload } => {
            match reconcile(current_vector_search, &id) {
                Reconciliation::Current => InboundDisposition::ApplySearch(payload),
                Reconciliation::Stale => InboundDisposition::DropStale {
                    stream: StreamKind::VectorSearch,
                    id,
                },
            }
        }
        // Errors route by id prefix so a failure for a superseded request on
        // one stream can never clobber the other stream's state.
        InboundMessage::Error { id, message } => {
            let stream = id.stream();
            let current = match stream {
                StreamKind::DataFetch => current_data_fetch,
                StreamKind::VectorSearch => current_vector_search,
            };
            match reconcile(current, &id) {
                Reconciliation::Current => InboundDisposition::FailStream { stream, message },
                Reconciliation::Stale => InboundDisposition::DropStale { stream, id },
            }
        }
    }
}
