//! Best-effort parser for the backend's hybrid score explanation.
//!
//! The explanation is loosely structured: depending on backend version it
//! arrives as a native JSON object or as a JSON document encoded inside a
//! string, and the per-leg field names vary. This module normalizes the known
//! spellings and degrades to [`ExplainParse::Opaque`] instead of failing.

use serde_json::Map;
use serde_json::Value;

const KEYWORD_ALIASES: [&str; 3] = ["bm25", "keyword", "keywordScore"];
const VECTOR_ALIASES: [&str; 4] = ["vector", "nearText", "nearVector", "vectorScore"];

/// Outcome of interpreting a raw score explanation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExplainParse {
    /// At least one per-leg score was recognized; an absent leg reads 0.
    Detailed { keyword: f64, vector: f64 },
    /// Nothing recognizable; callers keep the combined score only.
    Opaque,
}

/// Interpret an `explainScore` value in either of its wire encodings.
/// Never panics and never rejects the surrounding result.
pub fn parse_explain_score(raw: Option<&Value>) -> ExplainParse {
    let Some(raw) = raw else {
        return ExplainParse::Opaque;
    };
    let decoded;
    let fields = match raw {
        Value::Object(map) => map,
        Value::String(text) => {
            match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => {
                    decoded = map;
                    &decoded
                }
                _ => return ExplainParse::Opaque,
            }
        }
        _ => return ExplainParse::Opaque,
    };

    let keyword = first_numeric(fields, &KEYWORD_ALIASES);
    let vector = first_numeric(fields, &VECTOR_ALIASES);
    match (keyword, vector) {
        (None, None) => ExplainParse::Opaque,
        (keyword, vector) => ExplainParse::Detailed {
            keyword: keyword.unwrap_or(0.0),
            vector: vector.unwrap_or(0.0),
        },
    }
}

fn first_numeric(fields: &Map<String, Value>, aliases: &[&str]) -> Option<f64> {
    aliases.iter().find_map(|alias| numeric(fields.get(*alias)?))
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
