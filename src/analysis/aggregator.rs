//! Portfolio aggregation and statistics.
//!
//! Everything in here runs in the deterministic, single-threaded batch pass
//! after all per-project results have been collected.

use crate::config::ScoringConfig;
use crate::models::{
    DataQualityFlag, Dimension, PortfolioStatistics, ProjectScore, QualityEvent,
    QualityEventKind, StatusColor,
};
use crate::scoring::{self, validator};
use tracing::warn;

/// Upper bound on recommendations in a finished analysis.
pub const MAX_RECOMMENDATIONS: usize = 3;

/// Why a project carries placeholder text instead of a model analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderReason {
    ModelFailure,
    EmptyAnalysis,
    DuplicateContent,
}

/// Labeled placeholder text, unique to the project it names.
pub fn placeholder_analysis(project_name: &str, project_id: &str, reason: PlaceholderReason) -> String {
    let cause = match reason {
        PlaceholderReason::ModelFailure => "the scoring model did not deliver an assessment",
        PlaceholderReason::EmptyAnalysis => "the scoring model returned an empty analysis",
        PlaceholderReason::DuplicateContent => {
            "the generated analysis repeated the text of another project"
        }
    };
    format!(
        "[Placeholder] No project-specific analysis is available for \"{}\" (ID {}): {}. \
         Scores shown for this project are neutral defaults or unverified; review the source data manually.",
        project_name, project_id, cause
    )
}

/// Re-flag projects whose analysis text repeats an earlier project's text.
///
/// `projects` must be in input order. Projects already carrying
/// `fallback-content` hold placeholders and are not compared. Each
/// duplicate gets its own placeholder; the first occurrence keeps its text.
pub fn flag_duplicate_analyses(
    projects: &mut [ProjectScore],
    config: &ScoringConfig,
) -> Vec<(usize, QualityEvent)> {
    let duplicates = validator::find_duplicates(projects.iter().map(|p| {
        if p.data_quality_flag == DataQualityFlag::FallbackContent {
            None
        } else {
            Some(p.analysis.as_str())
        }
    }));

    let mut events = Vec::with_capacity(duplicates.len());
    for dup in duplicates {
        let original_id = projects[dup.original].project_id.clone();
        let project = &mut projects[dup.index];

        warn!(
            "Analysis of '{}' duplicates the analysis of project {}",
            project.project_name, original_id
        );

        project.analysis = placeholder_analysis(
            &project.project_name,
            &project.project_id,
            PlaceholderReason::DuplicateContent,
        );
        if project.data_quality_flag == DataQualityFlag::None {
            project.data_quality_flag = DataQualityFlag::FallbackContent;
        }
        scoring::refresh_derived(project, config);

        events.push((
            dup.index,
            QualityEvent {
                project_id: project.project_id.clone(),
                kind: QualityEventKind::DuplicateContent {
                    duplicate_of: original_id,
                },
            },
        ));
    }

    events
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Compute portfolio statistics.
pub fn compute_statistics(projects: &[ProjectScore]) -> PortfolioStatistics {
    let avg = |dimension: Dimension| {
        mean(projects.iter().map(|p| f64::from(p.scores.value(dimension)))).unwrap_or(0.0)
    };
    let count_color = |color: StatusColor| projects.iter().filter(|p| p.status_color == color).count();
    let count_flag =
        |flag: DataQualityFlag| projects.iter().filter(|p| p.data_quality_flag == flag).count();

    PortfolioStatistics {
        project_count: projects.len(),
        critical_count: projects.iter().filter(|p| p.is_critical).count(),
        avg_urgency: avg(Dimension::Urgency),
        avg_importance: avg(Dimension::Importance),
        avg_complexity: avg(Dimension::Complexity),
        avg_risk: avg(Dimension::Risk),
        avg_data_quality: avg(Dimension::DataQuality),
        avg_progress: mean(projects.iter().filter_map(|p| p.progress_percent)),
        inconsistent_count: count_flag(DataQualityFlag::Inconsistent),
        fallback_count: count_flag(DataQualityFlag::FallbackContent),
        green_count: count_color(StatusColor::Green),
        yellow_count: count_color(StatusColor::Yellow),
        red_count: count_color(StatusColor::Red),
        gray_count: count_color(StatusColor::Gray),
    }
}

/// Keep the first [`MAX_RECOMMENDATIONS`] items in the order given.
pub fn truncate_recommendations(mut recommendations: Vec<String>) -> Vec<String> {
    recommendations.truncate(MAX_RECOMMENDATIONS);
    recommendations
}

/// All project warnings, prefixed with the project name, in ranking order.
pub fn collect_data_warnings(projects: &[ProjectScore]) -> Vec<String> {
    projects
        .iter()
        .flat_map(|p| {
            p.warnings
                .iter()
                .map(move |w| format!("[{}] {}", p.project_name, w))
        })
        .collect()
}

fn name_list(projects: &[&ProjectScore]) -> String {
    projects
        .iter()
        .map(|p| p.project_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Deterministic executive summary used when the model cannot write one.
///
/// `projects` must be in ranking order.
pub fn fallback_summary(
    portfolio_name: &str,
    stats: &PortfolioStatistics,
    projects: &[ProjectScore],
) -> String {
    if stats.project_count == 0 {
        return format!("Portfolio \"{}\" contains no projects.", portfolio_name);
    }

    let mut text = format!(
        "[Generated summary] Portfolio \"{}\" contains {} projects, {} of them critical \
         ({} red, {} yellow, {} green, {} not assessable).",
        portfolio_name,
        stats.project_count,
        stats.critical_count,
        stats.red_count,
        stats.yellow_count,
        stats.green_count,
        stats.gray_count
    );

    if let Some(progress) = stats.avg_progress {
        text.push_str(&format!(" Average progress is {:.0}%.", progress));
    }
    text.push_str(&format!(
        " Mean scores: urgency {:.1}, importance {:.1}, risk {:.1}.",
        stats.avg_urgency, stats.avg_importance, stats.avg_risk
    ));

    let critical: Vec<&ProjectScore> = projects.iter().filter(|p| p.is_critical).collect();
    if !critical.is_empty() {
        text.push_str(&format!(" Critical: {}.", name_list(&critical)));
    }
    if stats.inconsistent_count + stats.fallback_count > 0 {
        text.push_str(&format!(
            " {} projects have inconsistent source data and {} lack a model analysis.",
            stats.inconsistent_count, stats.fallback_count
        ));
    }

    text
}

/// Deterministic recommendations used together with [`fallback_summary`].
pub fn fallback_recommendations(stats: &PortfolioStatistics, projects: &[ProjectScore]) -> Vec<String> {
    let mut recommendations = Vec::new();

    let critical: Vec<&ProjectScore> = projects.iter().filter(|p| p.is_critical).collect();
    if !critical.is_empty() {
        recommendations.push(format!(
            "Review the critical projects first: {}.",
            name_list(&critical)
        ));
    }
    if stats.inconsistent_count > 0 {
        recommendations.push(format!(
            "Correct the contradictory source data of {} project(s) before relying on their scores.",
            stats.inconsistent_count
        ));
    }
    if stats.fallback_count > 0 {
        recommendations.push(format!(
            "Re-run the analysis for {} project(s) without a model assessment.",
            stats.fallback_count
        ));
    }

    truncate_recommendations(recommendations)
}
