//! Fixed-response provider for tests.

use super::provider::{
    PortfolioBrief, PortfolioNarrative, ProjectAssessment, ProjectBrief, ScoreProvider,
};
use crate::error::ProviderError;
use crate::scoring::normalizer::RawDimension;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Returns canned assessments keyed by project id.
#[derive(Default)]
pub struct FixedProvider {
    assessments: HashMap<String, ProjectAssessment>,
    failing: HashSet<String>,
    narrative: Option<PortfolioNarrative>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    seen: Mutex<Vec<ProjectBrief>>,
    summaries: Mutex<Vec<PortfolioBrief>>,
}

/// Build an assessment from plain values.
pub fn assessment(
    urgency: f64,
    importance: f64,
    complexity: f64,
    risk: f64,
    data_quality: f64,
    analysis: &str,
) -> ProjectAssessment {
    let dim = |v: f64| RawDimension {
        value: Some(v),
        justification: None,
    };
    let mut a = ProjectAssessment {
        summary: String::new(),
        analysis: analysis.to_string(),
        ..Default::default()
    };
    a.dimensions.urgency = dim(urgency);
    a.dimensions.importance = dim(importance);
    a.dimensions.complexity = dim(complexity);
    a.dimensions.risk = dim(risk);
    a.dimensions.data_quality = dim(data_quality);
    a
}

impl FixedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assessment(mut self, project_id: &str, assessment: ProjectAssessment) -> Self {
        self.assessments.insert(project_id.to_string(), assessment);
        self
    }

    pub fn failing_for(mut self, project_id: &str) -> Self {
        self.failing.insert(project_id.to_string());
        self
    }

    pub fn with_narrative(mut self, narrative: PortfolioNarrative) -> Self {
        self.narrative = Some(narrative);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `score_project` calls made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Briefs received by `score_project`.
    pub fn seen_briefs(&self) -> Vec<ProjectBrief> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Briefs received by `summarize`.
    pub fn summary_briefs(&self) -> Vec<PortfolioBrief> {
        self.summaries.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ScoreProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed-stub"
    }

    async fn score_project(&self, brief: &ProjectBrief) -> Result<ProjectAssessment, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(brief.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(brief.id()) {
            return Err(ProviderError::Connect("http://stub".to_string()));
        }
        self.assessments
            .get(brief.id())
            .cloned()
            .ok_or_else(|| ProviderError::InvalidResponse(format!("no canned reply for {}", brief.id())))
    }

    async fn summarize(&self, brief: &PortfolioBrief) -> Result<PortfolioNarrative, ProviderError> {
        if let Ok(mut summaries) = self.summaries.lock() {
            summaries.push(brief.clone());
        }
        self.narrative
            .clone()
            .ok_or_else(|| ProviderError::Timeout(1))
    }
}
