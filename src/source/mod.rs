//! Project data sources.
//!
//! A source delivers the raw records of one portfolio. Any failure here
//! aborts the run; no partial portfolio is ever analyzed.

pub mod file;
pub mod http;

use crate::error::SourceError;
use crate::models::RawProjectRecord;
use async_trait::async_trait;
use serde_json::Value;

pub use file::FileSource;
pub use http::HttpSource;

/// A portfolio as delivered by a source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePortfolio {
    pub id: String,
    pub name: String,
    pub projects: Vec<RawProjectRecord>,
}

/// Delivers raw project records.
#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// Human-readable location, for logs.
    fn describe(&self) -> String;

    /// Fetch the portfolio with all its projects.
    async fn fetch_portfolio(&self, portfolio_id: &str) -> Result<SourcePortfolio, SourceError>;
}

/// Parse a list of project records from a JSON array or an envelope
/// object carrying the list under `projects` or `items`.
pub(crate) fn parse_projects(value: Value) -> Result<Vec<RawProjectRecord>, SourceError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("projects").or_else(|| map.remove("items")) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(SourceError::Malformed(
                    "expected a project list or a `projects`/`items` array".to_string(),
                ))
            }
        },
        other => {
            return Err(SourceError::Malformed(format!(
                "expected a project list, got {}",
                json_kind(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item)
                .map_err(|e| SourceError::Malformed(format!("project #{}: {}", index + 1, e)))
        })
        .collect()
}

/// Read an id that may be a string or a number.
pub(crate) fn json_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Fallback portfolio name when the source has none.
pub(crate) fn default_portfolio_name(portfolio_id: &str) -> String {
    format!("Portfolio {}", portfolio_id)
}
