//! JSON export files as a project source.

use super::{default_portfolio_name, json_id, parse_projects, ProjectSource, SourcePortfolio};
use crate::error::SourceError;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

/// Reads a portfolio from a JSON export.
///
/// Accepted shapes: an object with `id`, `name` and `projects`, or a bare
/// array of project records.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ProjectSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch_portfolio(&self, portfolio_id: &str) -> Result<SourcePortfolio, SourceError> {
        debug!("Reading portfolio export {}", self.path.display());

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Io {
                path: self.path.display().to_string(),
                source: e,
            })?;

        let value: Value = serde_json::from_str(&content)
            .map_err(|e| SourceError::Malformed(format!("{}: {}", self.path.display(), e)))?;

        let (id, name) = match &value {
            Value::Object(map) => (json_id(map.get("id")), map.get("name").and_then(Value::as_str)),
            _ => (None, None),
        };

        if let Some(ref id) = id {
            if id != portfolio_id {
                return Err(SourceError::NotFound(portfolio_id.to_string()));
            }
        }

        let name = name
            .map(String::from)
            .unwrap_or_else(|| default_portfolio_name(portfolio_id));

        Ok(SourcePortfolio {
            id: portfolio_id.to_string(),
            name,
            projects: parse_projects(value)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn export(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_reads_portfolio_object() {
        let file = export(
            r#"{"id": 7, "name": "IT 2026", "projects": [
                {"id": 1, "name": "ERP", "status": "Completed", "milestonesTotal": 4}
            ]}"#,
        );

        let source = FileSource::new(file.path());
        let portfolio = tokio_test::block_on(source.fetch_portfolio("7")).unwrap();
        assert_eq!(portfolio.name, "IT 2026");
        assert_eq!(portfolio.projects.len(), 1);
        assert_eq!(portfolio.projects[0].milestones_total, Some(4));
    }

    #[test]
    fn test_reads_bare_array() {
        let file = export(r#"[{"id": "a", "name": "A"}, {"id": "b", "name": "B"}]"#);
        let source = FileSource::new(file.path());

        let portfolio = tokio_test::block_on(source.fetch_portfolio("Q3")).unwrap();
        assert_eq!(portfolio.id, "Q3");
        assert_eq!(portfolio.name, "Portfolio Q3");
        assert_eq!(portfolio.projects.len(), 2);
    }

    #[test]
    fn test_wrong_portfolio_id() {
        let file = export(r#"{"id": "7", "projects": []}"#);
        let source = FileSource::new(file.path());

        let err = tokio_test::block_on(source.fetch_portfolio("8")).unwrap_err();
        assert!(matches!(err, SourceError::NotFound(ref id) if id == "8"));
    }

    #[test]
    fn test_reads_sample_export() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("fixtures")
            .join("sample_portfolio.json");
        let portfolio = tokio_test::block_on(FileSource::new(path).fetch_portfolio("7")).unwrap();

        assert_eq!(portfolio.projects.len(), 4);
        let erp = &portfolio.projects[0];
        assert_eq!(erp.id, "101");
        assert_eq!(erp.status.as_deref(), Some("Completed"));
        assert_eq!(erp.milestones_completed, Some(0));
        assert!(erp.end_date.is_some());
        assert!(portfolio.projects[3].lacks_progress_data());
    }

    #[test]
    fn test_missing_file_and_bad_json() {
        let source = FileSource::new("/nonexistent/portfolio.json");
        let err = tokio_test::block_on(source.fetch_portfolio("1")).unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));

        let file = export("{ not json");
        let err = tokio_test::block_on(FileSource::new(file.path()).fetch_portfolio("1"))
            .unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }
}
