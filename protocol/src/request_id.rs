use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Prefix carried by vector-search correlation ids so the reconciler can
/// route a response to its stream without a separate lookup table.
/// Data-fetch ids are a bare UUID.
const VECTOR_SEARCH_PREFIX: &str = "vs-";

/// A logical channel of correlated request/response traffic. Each stream has
/// exactly one current request slot in the coordinator.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    DataFetch,
    VectorSearch,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::DataFetch => write!(f, "data-fetch"),
            StreamKind::VectorSearch => write!(f, "vector-search"),
        }
    }
}

/// Correlation id stamped on an outbound request and echoed on the matching
/// response. Opaque to the backend; the stream tag is encoded as a prefix.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Mint a fresh id for the given stream.
    pub fn fresh(stream: StreamKind) -> Self {
        let uuid = Uuid::new_v4();
        match stream {
            StreamKind::DataFetch => Self(uuid.to_string()),
            StreamKind::VectorSearch => Self(format!("{VECTOR_SEARCH_PREFIX}{uuid}")),
        }
    }

    /// Which stream this id belongs to, derived from the prefix convention.
    pub fn stream(&self) -> StreamKind {
        if self.0.starts_with(VECTOR_SEARCH_PREFIX) {
            StreamKind::VectorSearch
        } else {
            StreamKind::DataFetch
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RequestId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for RequestId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
