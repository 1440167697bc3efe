//! Filter model shared between the panel and the backend.
//!
//! Conditions are structural only: the core never interprets `value` against
//! the collection schema, it just ships the shape the backend's query builder
//! expects.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_with::skip_serializing_none;
use uuid::Uuid;

/// Comparison operator for a single filter condition.
///
/// Serialized with the backend's PascalCase names (`Equal`, `ContainsAny`,
/// ...), so no rename attribute is applied.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    Like,
    ContainsAny,
    ContainsAll,
    IsNull,
    IsNotNull,
}

impl FilterOperator {
    /// Null checks carry no comparison value; everything else does.
    pub fn requires_value(self) -> bool {
        !matches!(self, FilterOperator::IsNull | FilterOperator::IsNotNull)
    }
}

/// Declared type of a condition's comparison value.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Text,
    Number,
    Boolean,
    Date,
}

/// Global combinator across all active conditions. There is no per-group
/// nesting; one mode applies to the whole set.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchMode {
    #[default]
    And,
    Or,
}

/// A single filter condition. Identity is `id`; the remaining fields are
/// mutable through [`FilterPatch`] without changing identity.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilterCondition {
    pub id: String,
    pub path: String,
    pub operator: FilterOperator,
    pub value: Value,
    pub value_type: Option<ValueType>,
}

impl FilterCondition {
    pub fn new(path: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            path: path.into(),
            operator,
            value,
            value_type: None,
        }
    }

    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    /// Merge a partial update into this condition. `None` fields are left
    /// untouched; `id` never changes.
    pub fn apply(&mut self, patch: FilterPatch) {
        if let Some(path) = patch.path {
            self.path = path;
        }
        if let Some(operator) = patch.operator {
            self.operator = operator;
        }
        if let Some(value) = patch.value {
            self.value = value;
        }
        if let Some(value_type) = patch.value_type {
            self.value_type = Some(value_type);
        }
    }
}

/// Partial update for a [`FilterCondition`].
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilterPatch {
    pub path: Option<String>,
    pub operator: Option<FilterOperator>,
    pub value: Option<Value>,
    pub value_type: Option<ValueType>,
}

impl FilterPatch {
    pub fn value(value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn operator(operator: FilterOperator) -> Self {
        Self {
            operator: Some(operator),
            ..Self::default()
        }
    }
}
