//! The two-pass analysis pipeline.
//!
//! Pass one scores every project independently on a bounded number of
//! concurrent model calls. Pass two runs single-threaded over the collected
//! results: duplicate detection, ranking, statistics and the portfolio
//! narrative. A cancelled run returns nothing.

use super::aggregator::{self, PlaceholderReason};
use crate::config::ScoringConfig;
use crate::error::AnalysisError;
use crate::llm::{PortfolioBrief, ProjectBrief, ScoreProvider, ScoredProjectLine};
use crate::models::{
    AnalysisOutcome, DataQualityFlag, PortfolioAnalysis, ProjectScore, QualityEvent,
    QualityEventKind, RawProjectRecord, RunTelemetry, StatusColor,
};
use crate::scoring::normalizer::{normalize_scores, RawDimensionValues};
use crate::scoring::{self, classifier, ranker, validator};
use crate::source::{ProjectSource, SourcePortfolio};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of the per-project pass for one record.
struct ScoredProject {
    index: usize,
    score: ProjectScore,
    events: Vec<QualityEvent>,
}

/// Drives scoring, aggregation and the narrative for one portfolio.
pub struct Pipeline {
    provider: Arc<dyn ScoreProvider>,
    scoring: ScoringConfig,
    concurrency: usize,
    show_progress: bool,
}

impl Pipeline {
    pub fn new(provider: Arc<dyn ScoreProvider>, scoring: ScoringConfig) -> Self {
        Self {
            provider,
            scoring,
            concurrency: 4,
            show_progress: false,
        }
    }

    /// Maximum number of concurrent model calls.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Fetch a portfolio from `source` and analyze it.
    pub async fn run(
        &self,
        source: &dyn ProjectSource,
        portfolio_id: &str,
        cancel: &CancellationToken,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        info!("Fetching portfolio {} from {}", portfolio_id, source.describe());

        let portfolio = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
            fetched = source.fetch_portfolio(portfolio_id) => fetched?,
        };

        self.analyze(portfolio, cancel).await
    }

    /// Analyze an already fetched portfolio.
    pub async fn analyze(
        &self,
        portfolio: SourcePortfolio,
        cancel: &CancellationToken,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        self.scoring
            .validate()
            .map_err(|e| AnalysisError::Config(e.to_string()))?;
        if self.concurrency == 0 {
            return Err(AnalysisError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }

        let start_time = Instant::now();
        info!(
            "Analyzing {} projects of portfolio {} with {}",
            portfolio.projects.len(),
            portfolio.name,
            self.provider.name()
        );

        // Pass one: fan out.
        let progress = self.progress_bar(portfolio.projects.len());
        let scoring_pass = stream::iter(portfolio.projects.iter().enumerate())
            .map(|(index, record)| {
                let progress = progress.clone();
                async move {
                    let scored = self.score_one(index, record).await;
                    progress.inc(1);
                    scored
                }
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>();

        let mut scored = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                progress.abandon();
                warn!("Analysis cancelled during project scoring");
                return Err(AnalysisError::Cancelled);
            }
            results = scoring_pass => results,
        };
        progress.finish_and_clear();

        // Pass two: deterministic finalization in input order.
        scored.sort_by_key(|s| s.index);

        let mut events: Vec<(usize, QualityEvent)> = Vec::new();
        let mut projects = Vec::with_capacity(scored.len());
        for s in scored {
            events.extend(s.events.into_iter().map(|e| (s.index, e)));
            projects.push(s.score);
        }

        events.extend(aggregator::flag_duplicate_analyses(
            &mut projects,
            &self.scoring,
        ));
        events.sort_by_key(|(index, _)| *index);

        let placeholder_projects: BTreeSet<usize> = events
            .iter()
            .filter(|(_, e)| {
                matches!(
                    e.kind,
                    QualityEventKind::ScoringDegraded { .. }
                        | QualityEventKind::DuplicateContent { .. }
                )
            })
            .map(|(index, _)| *index)
            .collect();

        ranker::rank(&mut projects);
        let statistics = aggregator::compute_statistics(&projects);

        let mut summary_fallback = false;
        let (executive_summary, recommendations, risk_clusters) = if projects.is_empty() {
            (
                aggregator::fallback_summary(&portfolio.name, &statistics, &projects),
                Vec::new(),
                Vec::new(),
            )
        } else {
            let brief = PortfolioBrief {
                portfolio_name: portfolio.name.clone(),
                projects: projects.iter().map(ScoredProjectLine::from).collect(),
                statistics: statistics.clone(),
            };

            let narrative = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("Analysis cancelled during portfolio summary");
                    return Err(AnalysisError::Cancelled);
                }
                narrative = self.provider.summarize(&brief) => narrative,
            };

            match narrative {
                Ok(n) => (
                    n.executive_summary,
                    aggregator::truncate_recommendations(n.recommendations),
                    n.risk_clusters,
                ),
                Err(e) => {
                    warn!("Portfolio summary failed, using generated summary: {}", e);
                    summary_fallback = true;
                    (
                        aggregator::fallback_summary(&portfolio.name, &statistics, &projects),
                        aggregator::fallback_recommendations(&statistics, &projects),
                        Vec::new(),
                    )
                }
            }
        };

        let data_warnings = aggregator::collect_data_warnings(&projects);

        let analysis = PortfolioAnalysis {
            portfolio_id: portfolio.id,
            portfolio_name: portfolio.name,
            generated_at: Utc::now(),
            model_used: self.provider.name().to_string(),
            projects,
            statistics,
            executive_summary,
            recommendations,
            risk_clusters,
            data_warnings,
        };

        let telemetry = RunTelemetry {
            events: events.into_iter().map(|(_, e)| e).collect(),
            fallback_projects: placeholder_projects.len(),
            summary_fallback,
            duration_seconds: start_time.elapsed().as_secs_f64(),
        };

        info!(
            "Analysis complete: {} projects, {} critical, {} with placeholder content",
            analysis.statistics.project_count,
            analysis.statistics.critical_count,
            telemetry.fallback_projects
        );

        Ok(AnalysisOutcome {
            analysis,
            telemetry,
        })
    }

    /// Per-project pass: model call, normalization, validation,
    /// classification, priority and color.
    async fn score_one(&self, index: usize, record: &RawProjectRecord) -> ScoredProject {
        let brief = ProjectBrief::from_record(record);
        let outcome = self.provider.score_project(&brief).await;

        let mut events = Vec::new();
        let mut degraded = |reason: String| {
            warn!("Scoring degraded for '{}': {}", record.name, reason);
            events.push(QualityEvent {
                project_id: record.id.clone(),
                kind: QualityEventKind::ScoringDegraded { reason },
            });
        };

        let (dimensions, model_critical, summary, analysis): (
            Option<RawDimensionValues>,
            Option<bool>,
            String,
            String,
        ) = match outcome {
            Ok(a) if !a.analysis.trim().is_empty() => {
                (Some(a.dimensions), a.is_critical, a.summary, a.analysis)
            }
            Ok(a) => {
                degraded("model returned an empty analysis".to_string());
                (
                    Some(a.dimensions),
                    a.is_critical,
                    a.summary,
                    aggregator::placeholder_analysis(
                        &record.name,
                        &record.id,
                        PlaceholderReason::EmptyAnalysis,
                    ),
                )
            }
            Err(e) => {
                degraded(e.to_string());
                (
                    None,
                    None,
                    String::new(),
                    aggregator::placeholder_analysis(
                        &record.name,
                        &record.id,
                        PlaceholderReason::ModelFailure,
                    ),
                )
            }
        };
        let is_placeholder = !events.is_empty();

        let scores = normalize_scores(dimensions.as_ref());
        let validation = validator::validate(record, &scores);

        if let Some(rule) = validation.rule {
            warn!("Inconsistent data in '{}': {}", record.name, rule);
            events.push(QualityEvent {
                project_id: record.id.clone(),
                kind: QualityEventKind::DataInconsistency {
                    rule: rule.to_string(),
                },
            });
        }

        // Criticality sees the record-level flag even when the text is a
        // placeholder, so a contradictory record stays critical.
        let classification = classifier::classify(
            &scores,
            validation.flag,
            record.progress_percent,
            model_critical,
            &self.scoring,
        );

        let data_quality_flag = if is_placeholder {
            DataQualityFlag::FallbackContent
        } else {
            validation.flag
        };

        let mut score = ProjectScore {
            project_id: record.id.clone(),
            project_name: record.name.clone(),
            owner: record.owner.clone(),
            status_label: record.status.clone(),
            scores,
            priority_score: 0,
            is_critical: classification.is_critical,
            criticality_reasons: classification.reasons,
            status_color: StatusColor::Gray,
            data_quality_flag,
            progress_percent: record.progress_percent,
            milestones_total: record.milestones_total,
            milestones_completed: record.milestones_completed,
            milestones_delayed: record.milestones_delayed,
            planned_effort_hours: record.planned_effort_hours,
            actual_effort_hours: record.actual_effort_hours,
            summary,
            analysis,
            warnings: validation.warnings,
        };
        scoring::refresh_derived(&mut score, &self.scoring);

        debug!(
            "Scored '{}': priority {}, critical {}, {}",
            score.project_name, score.priority_score, score.is_critical, score.status_color
        );

        ScoredProject {
            index,
            score,
            events,
        }
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} projects ({eta})")
                .map(|style| style.progress_chars("#>-"))
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    }
}
