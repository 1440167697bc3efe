//! The vector-search mode machine.
//!
//! One parameter record backs all four modes so switching modes never loses
//! what the user already typed. Result invalidation is keyed to the inputs
//! that change what a search means (`query`, `object_id`, `vector`), not to
//! the mode itself.

use periscope_protocol::DistanceMetric;
use periscope_protocol::FusionType;
use periscope_protocol::SearchMode;
use periscope_protocol::SearchResult;
use periscope_protocol::VectorQuery;
use thiserror::Error;

use crate::config::DEFAULT_SEARCH_LIMIT;

/// Union of the fields needed by all modes. Only the fields relevant to
/// `mode` feed [`VectorSearchState::build_query`]; the rest are retained so
/// mode switches are lossless.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorSearchParams {
    pub mode: SearchMode,
    pub query: String,
    pub object_id: String,
    /// Raw textual encoding of a vector, exactly as typed. Parsed as a JSON
    /// numeric array only at execute time.
    pub vector: String,
    pub distance_metric: DistanceMetric,
    pub max_distance: Option<f64>,
    pub limit: usize,
    pub target_vector: Option<String>,
    pub alpha: f64,
    pub fusion_type: FusionType,
    pub properties: Vec<String>,
    pub query_rewriting: bool,
}

impl Default for VectorSearchParams {
    fn default() -> Self {
        Self {
            mode: SearchMode::Text,
            query: String::new(),
            object_id: String::new(),
            vector: String::new(),
            distance_metric: DistanceMetric::Cosine,
            max_distance: None,
            limit: DEFAULT_SEARCH_LIMIT,
            target_vector: None,
            alpha: 0.5,
            fusion_type: FusionType::default(),
            properties: Vec::new(),
            query_rewriting: false,
        }
    }
}

/// Partial update for [`VectorSearchParams`]; fields present replace, fields
/// absent are left alone. Mode changes go through
/// [`VectorSearchState::set_mode`] instead.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchParamsPatch {
    pub query: Option<String>,
    pub object_id: Option<String>,
    pub vector: Option<String>,
    pub distance_metric: Option<DistanceMetric>,
    pub max_distance: Option<f64>,
    pub limit: Option<usize>,
    pub target_vector: Option<String>,
    pub alpha: Option<f64>,
    pub fusion_type: Option<FusionType>,
    pub properties: Option<Vec<String>>,
    pub query_rewriting: Option<bool>,
}

impl SearchParamsPatch {
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    pub fn object_id(object_id: impl Into<String>) -> Self {
        Self {
            object_id: Some(object_id.into()),
            ..Self::default()
        }
    }

    pub fn vector(vector: impl Into<String>) -> Self {
        Self {
            vector: Some(vector.into()),
            ..Self::default()
        }
    }

    pub fn limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Whether this patch changes what a search would mean, requiring prior
    /// results to be invalidated.
    fn touches_query_inputs(&self) -> bool {
        self.query.is_some() || self.object_id.is_some() || self.vector.is_some()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchValidationError {
    #[error("search query must not be empty")]
    EmptyQuery,
    #[error("object id must not be empty")]
    EmptyObjectId,
    #[error("vector must be a JSON array of numbers, e.g. [0.1, -0.2]")]
    MalformedVector,
    #[error("vector must contain at least one number")]
    EmptyVector,
    #[error("vector entries must be finite numbers")]
    NonFiniteVector,
}

/// Parse the raw textual vector encoding entered by the user.
pub fn parse_vector(raw: &str) -> Result<Vec<f64>, SearchValidationError> {
    let values: Vec<f64> =
        serde_json::from_str(raw.trim()).map_err(|_| SearchValidationError::MalformedVector)?;
    if values.is_empty() {
        return Err(SearchValidationError::EmptyVector);
    }
    if values.iter().any(|value| !value.is_finite()) {
        return Err(SearchValidationError::NonFiniteVector);
    }
    Ok(values)
}

#[derive(Debug)]
pub struct VectorSearchState {
    params: VectorSearchParams,
    results: Vec<SearchResult>,
    searching: bool,
    has_searched: bool,
    error: Option<String>,
    panel_open: bool,
    default_limit: usize,
}

impl Default for VectorSearchState {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_LIMIT)
    }
}

impl VectorSearchState {
    pub fn new(default_limit: usize) -> Self {
        Self {
            params: VectorSearchParams {
                limit: default_limit,
                ..VectorSearchParams::default()
            },
            results: Vec::new(),
            searching: false,
            has_searched: false,
            error: None,
            panel_open: false,
            default_limit,
        }
    }

    pub fn params(&self) -> &VectorSearchParams {
        &self.params
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn searching(&self) -> bool {
        self.searching
    }

    pub fn has_searched(&self) -> bool {
        self.has_searched
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn panel_open(&self) -> bool {
        self.panel_open
    }

    /// Switch modes. Clears any prior error but keeps results: the user may
    /// flip between modes to compare without losing what is on screen.
    pub fn set_mode(&mut self, mode: SearchMode) {
        self.params.mode = mode;
        self.error = None;
    }

    pub fn set_params(&mut self, patch: SearchParamsPatch) {
        if patch.touches_query_inputs() {
            self.results.clear();
            self.has_searched = false;
        }
        self.error = None;

        let params = &mut self.params;
        if let Some(query) = patch.query {
            params.query = query;
        }
        if let Some(object_id) = patch.object_id {
            params.object_id = object_id;
        }
        if let Some(vector) = patch.vector {
            params.vector = vector;
        }
        if let Some(distance_metric) = patch.distance_metric {
            params.distance_metric = distance_metric;
        }
        if let Some(max_distance) = patch.max_distance {
            params.max_distance = Some(max_distance);
        }
        if let Some(limit) = patch.limit {
            params.limit = limit;
        }
        if let Some(target_vector) = patch.target_vector {
            params.target_vector = Some(target_vector);
        }
        if let Some(alpha) = patch.alpha {
            params.alpha = alpha;
        }
        if let Some(fusion_type) = patch.fusion_type {
            params.fusion_type = fusion_type;
        }
        if let Some(properties) = patch.properties {
            params.properties = properties;
        }
        if let Some(query_rewriting) = patch.query_rewriting {
            params.query_rewriting = query_rewriting;
        }
    }

    /// "More like this": open the panel in object mode seeded with the
    /// source record's id.
    pub fn find_similar(&mut self, source_id: String) {
        self.panel_open = true;
        self.params.mode = SearchMode::Object;
        self.params.object_id = source_id;
        self.results.clear();
        self.has_searched = false;
        self.error = None;
    }

    pub fn set_panel_open(&mut self, open: bool) {
        self.panel_open = open;
    }

    /// Validate the current mode's inputs and assemble its outbound query.
    /// Performs no I/O and mutates nothing.
    pub fn build_query(&self) -> Result<VectorQuery, SearchValidationError> {
        let params = &self.params;
        match params.mode {
            SearchMode::Text => {
                let query = params.query.trim();
                if query.is_empty() {
                    return Err(SearchValidationError::EmptyQuery);
                }
                Ok(VectorQuery::NearText {
                    query: query.to_string(),
                    limit: params.limit,
                    distance_metric: Some(params.distance_metric),
                    max_distance: params.max_distance,
                    target_vector: params.target_vector.clone(),
                    query_rewriting: params.query_rewriting,
                })
            }
            SearchMode::Object => {
                let object_id = params.object_id.trim();
                if object_id.is_empty() {
                    return Err(SearchValidationError::EmptyObjectId);
                }
                Ok(VectorQuery::NearObject {
                    object_id: object_id.to_string(),
                    limit: params.limit,
                    distance_metric: Some(params.distance_metric),
                    max_distance: params.max_distance,
                    target_vector: params.target_vector.clone(),
                })
            }
            SearchMode::Vector => Ok(VectorQuery::NearVector {
                vector: parse_vector(&params.vector)?,
                limit: params.limit,
                distance_metric: Some(params.distance_metric),
                max_distance: params.max_distance,
                target_vector: params.target_vector.clone(),
            }),
            SearchMode::Hybrid => {
                let query = params.query.trim();
                if query.is_empty() {
                    return Err(SearchValidationError::EmptyQuery);
                }
                Ok(VectorQuery::Hybrid {
                    query: query.to_string(),
                    limit: params.limit,
                    alpha: params.alpha,
                    fusion_type: params.fusion_type,
                    properties: params.properties.clone(),
                    target_vector: params.target_vector.clone(),
                    query_rewriting: params.query_rewriting,
                })
            }
        }
    }

    pub fn begin_search(&mut self) {
        self.searching = true;
        self.error = None;
    }

    pub fn apply_results(&mut self, results: Vec<SearchResult>) {
        self.results = results;
        self.searching = false;
        self.has_searched = true;
    }

    pub fn apply_error(&mut self, message: String) {
        self.error = Some(message);
        self.searching = false;
    }

    pub fn set_validation_error(&mut self, error: SearchValidationError) {
        self.error = Some(error.to_string());
    }

    /// Reset results, error, searching flag, and parameters to defaults.
    /// The panel stays open or closed as it was.
    pub fn clear(&mut self) {
        let panel_open = self.panel_open;
        *self = Self::new(self.default_limit);
        self.panel_open = panel_open;
    }
}
