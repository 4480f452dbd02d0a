//! Deterministic scoring stages.
//!
//! Normalizer, validator, classifier, ranker and colorizer. None of them
//! performs I/O; the pipeline in `analysis` drives them.

pub mod classifier;
pub mod colorizer;
pub mod normalizer;
pub mod ranker;
pub mod validator;

use crate::config::ScoringConfig;
use crate::models::ProjectScore;

/// Recompute the fields that depend on the data-quality flag.
pub fn refresh_derived(project: &mut ProjectScore, config: &ScoringConfig) {
    project.priority_score =
        ranker::priority_score(&project.scores, project.data_quality_flag, config);
    project.status_color = colorizer::status_color(project, config);
}
