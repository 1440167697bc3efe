//! Vector-search wire types: the mode-specific query payloads the panel
//! sends and the hit shape the backend returns.

use crate::explain::ExplainParse;
use crate::explain::parse_explain_score;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_with::skip_serializing_none;

/// The active variant of vector search. Each mode requires a different
/// subset of [`VectorQuery`] parameters.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Text,
    Object,
    Vector,
    Hybrid,
}

/// Distance metric requested for nearest-neighbour comparison, in the data
/// store's vocabulary.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Dot,
    L2Squared,
    Hamming,
    Manhattan,
}

/// How hybrid search merges the keyword and vector result lists.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FusionType {
    #[serde(rename = "rankedFusion")]
    Ranked,
    #[default]
    #[serde(rename = "relativeScoreFusion")]
    RelativeScore,
}

/// Mode-specific search payload, tagged the way the backend dispatches it.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "searchType", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum VectorQuery {
    NearText {
        query: String,
        limit: usize,
        distance_metric: Option<DistanceMetric>,
        max_distance: Option<f64>,
        target_vector: Option<String>,
        query_rewriting: bool,
    },
    NearObject {
        object_id: String,
        limit: usize,
        distance_metric: Option<DistanceMetric>,
        max_distance: Option<f64>,
        target_vector: Option<String>,
    },
    NearVector {
        vector: Vec<f64>,
        limit: usize,
        distance_metric: Option<DistanceMetric>,
        max_distance: Option<f64>,
        target_vector: Option<String>,
    },
    Hybrid {
        query: String,
        limit: usize,
        alpha: f64,
        fusion_type: FusionType,
        /// Properties the keyword leg searches; empty means all text
        /// properties.
        properties: Vec<String>,
        target_vector: Option<String>,
        query_rewriting: bool,
    },
}

impl VectorQuery {
    pub fn mode(&self) -> SearchMode {
        match self {
            VectorQuery::NearText { .. } => SearchMode::Text,
            VectorQuery::NearObject { .. } => SearchMode::Object,
            VectorQuery::NearVector { .. } => SearchMode::Vector,
            VectorQuery::Hybrid { .. } => SearchMode::Hybrid,
        }
    }
}

/// Per-leg score explanation for a hybrid hit. `combined` is always the
/// backend's final score; `keyword`/`vector` are zero when the backend's
/// explanation could not be parsed.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub keyword: f64,
    pub vector: f64,
    pub combined: f64,
}

/// One raw hit as it arrives on the channel. `explain_score` is kept as a
/// loose value because its shape varies across backend versions; it is only
/// interpreted when resolving into a [`SearchResult`].
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VectorHit {
    #[serde(default)]
    pub record: Value,
    pub distance: Option<f64>,
    pub certainty: Option<f64>,
    pub score: Option<f64>,
    pub explain_score: Option<Value>,
}

/// A hit after best-effort score interpretation, ready for presentation.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    pub record: Value,
    pub distance: Option<f64>,
    pub certainty: Option<f64>,
    pub breakdown: Option<ScoreBreakdown>,
}

impl VectorHit {
    /// Interpret the raw score explanation. A malformed explanation
    /// downgrades to a combined-only breakdown; it never fails the hit.
    pub fn resolve(self) -> SearchResult {
        let breakdown = match parse_explain_score(self.explain_score.as_ref()) {
            ExplainParse::Detailed { keyword, vector } => Some(ScoreBreakdown {
                keyword,
                vector,
                combined: self.score.unwrap_or(keyword + vector),
            }),
            ExplainParse::Opaque => self.score.map(|combined| ScoreBreakdown {
                keyword: 0.0,
                vector: 0.0,
                combined,
            }),
        };
        SearchResult {
            record: self.record,
            distance: self.distance,
            certainty: self.certainty,
            breakdown,
        }
    }
}
