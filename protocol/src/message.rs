//! Channel message shapes for both directions.
//!
//! Inbound messages are decoded in two phases: a thin envelope
//! (`kind` / `correlationId` / `error`) first, then the kind-specific payload
//! from the remaining fields. Unknown kinds decode to
//! [`InboundMessage::Unknown`] so newer backends do not break the panel.

use crate::filter::FilterCondition;
use crate::filter::MatchMode;
use crate::request_id::RequestId;
use crate::search::VectorHit;
use crate::search::VectorQuery;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_with::skip_serializing_none;
use thiserror::Error;

/// Message sent core → backend over the panel channel.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OutboundMessage {
    /// Uncorrelated hello from a freshly attached panel.
    Ready,
    /// Paged record fetch with the active filters applied.
    Query {
        correlation_id: RequestId,
        collection: String,
        filters: Vec<FilterCondition>,
        match_mode: MatchMode,
        limit: usize,
        offset: usize,
    },
    /// Mode-specific vector search.
    VectorSearch {
        correlation_id: RequestId,
        collection: String,
        #[serde(flatten)]
        query: VectorQuery,
    },
}

impl OutboundMessage {
    /// The correlation id this message carries, if the command is correlated.
    pub fn correlation_id(&self) -> Option<&RequestId> {
        match self {
            OutboundMessage::Ready => None,
            OutboundMessage::Query { correlation_id, .. }
            | OutboundMessage::VectorSearch { correlation_id, .. } => Some(correlation_id),
        }
    }

    /// Restamp the message with a new correlation id, used when re-issuing a
    /// prior payload as a fresh request. `Ready` is returned unchanged.
    pub fn with_correlation_id(self, id: RequestId) -> Self {
        match self {
            OutboundMessage::Ready => OutboundMessage::Ready,
            OutboundMessage::Query {
                correlation_id: _,
                collection,
                filters,
                match_mode,
                limit,
                offset,
            } => OutboundMessage::Query {
                correlation_id: id,
                collection,
                filters,
                match_mode,
                limit,
                offset,
            },
            OutboundMessage::VectorSearch {
                correlation_id: _,
                collection,
                query,
            } => OutboundMessage::VectorSearch {
                correlation_id: id,
                collection,
                query,
            },
        }
    }
}

/// One property of the selected collection as announced by `init`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummary {
    pub name: String,
    pub data_type: String,
}

/// Payload of the `init` push: the selected collection and a schema summary.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InitPayload {
    pub collection: String,
    #[serde(default)]
    pub properties: Vec<PropertySummary>,
}

/// Payload of a correlated `queryResult` response.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryResultPayload {
    #[serde(default)]
    pub records: Vec<Value>,
    pub total_count: Option<u64>,
}

/// Payload of a correlated `vectorSearchResult` response.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VectorSearchResultPayload {
    #[serde(default)]
    pub results: Vec<VectorHit>,
}

/// Decoded message received backend → core.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundMessage {
    /// Push announcing the selected collection; no correlation id.
    Init(InitPayload),
    /// Correlated response on the data-fetch stream.
    QueryResult {
        id: RequestId,
        payload: QueryResultPayload,
    },
    /// Correlated response on the vector-search stream.
    VectorSearchResult {
        id: RequestId,
        payload: VectorSearchResultPayload,
    },
    /// Correlated failure for either stream.
    Error { id: RequestId, message: String },
    /// Push asking the panel to re-issue its last data fetch.
    Refresh,
    /// A kind this version does not track; callers log and ignore it.
    Unknown { kind: String },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed message envelope: {0}")]
    Envelope(#[source] serde_json::Error),
    #[error("`{kind}` message is missing its correlation id")]
    MissingCorrelationId { kind: String },
    #[error("malformed `{kind}` payload: {source}")]
    Payload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnvelope {
    kind: String,
    correlation_id: Option<String>,
    error: Option<String>,
    #[serde(flatten)]
    payload: Map<String, Value>,
}

impl RawEnvelope {
    fn correlation_id(&self) -> Result<RequestId, DecodeError> {
        match &self.correlation_id {
            Some(id) => Ok(RequestId::from(id.as_str())),
            None => Err(DecodeError::MissingCorrelationId {
                kind: self.kind.clone(),
            }),
        }
    }

    fn payload<T: for<'de> Deserialize<'de>>(self) -> Result<T, DecodeError> {
        let kind = self.kind;
        serde_json::from_value(Value::Object(self.payload))
            .map_err(|source| DecodeError::Payload { kind, source })
    }
}

/// Decode one raw channel value into a tracked message.
pub fn decode_inbound(value: Value) -> Result<InboundMessage, DecodeError> {
    let envelope: RawEnvelope = serde_json::from_value(value).map_err(DecodeError::Envelope)?;
    match envelope.kind.as_str() {
        "init" => Ok(InboundMessage::Init(envelope.payload()?)),
        "queryResult" => Ok(InboundMessage::QueryResult {
            id: envelope.correlation_id()?,
            payload: envelope.payload()?,
        }),
        "vectorSearchResult" => Ok(InboundMessage::VectorSearchResult {
            id: envelope.correlation_id()?,
            payload: envelope.payload()?,
        }),
        "error" => Ok(InboundMessage::Error {
            id: envelope.correlation_id()?,
            message: envelope
                .error
                .unwrap_or_else(|| "unknown backend error".to_string()),
        }),
        "refresh" => Ok(InboundMessage::Refresh),
        _ => Ok(InboundMessage::Unknown {
            kind: envelope.kind,
        }),
    }
}
