//! Traffic-light status.

use crate::config::ScoringConfig;
use crate::models::{ProjectScore, StatusColor};

/// Map a classified project to its color.
///
/// Critical projects are always red, even when they cannot otherwise be
/// assessed.
pub fn status_color(project: &ProjectScore, config: &ScoringConfig) -> StatusColor {
    if project.is_critical {
        StatusColor::Red
    } else if project.lacks_progress_data() {
        StatusColor::Gray
    } else if project.scores.risk.value >= config.at_risk_threshold
        || project.data_quality_flag.is_flagged()
    {
        StatusColor::Yellow
    } else {
        StatusColor::Green
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DataQualityFlag, RawProjectRecord};
    use crate::scoring::normalizer::normalize_scores;

    fn project(risk: u8, critical: bool, flag: DataQualityFlag) -> ProjectScore {
        let mut scores = normalize_scores(None);
        scores.risk.value = risk;
        ProjectScore {
            project_id: "1".to_string(),
            project_name: "P".to_string(),
            owner: None,
            status_label: Some("In progress".to_string()),
            scores,
            priority_score: 0,
            is_critical: critical,
            criticality_reasons: Vec::new(),
            status_color: StatusColor::Gray,
            data_quality_flag: flag,
            progress_percent: Some(50.0),
            milestones_total: None,
            milestones_completed: None,
            milestones_delayed: None,
            planned_effort_hours: None,
            actual_effort_hours: None,
            summary: String::new(),
            analysis: String::new(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_color_tiers() {
        let cfg = ScoringConfig::default();
        assert_eq!(
            status_color(&project(2, false, DataQualityFlag::None), &cfg),
            StatusColor::Green
        );
        assert_eq!(
            status_color(&project(3, false, DataQualityFlag::None), &cfg),
            StatusColor::Yellow
        );
        assert_eq!(
            status_color(&project(1, false, DataQualityFlag::FallbackContent), &cfg),
            StatusColor::Yellow
        );
        assert_eq!(
            status_color(&project(1, true, DataQualityFlag::None), &cfg),
            StatusColor::Red
        );
    }

    #[test]
    fn test_gray_when_unassessable() {
        let cfg = ScoringConfig::default();
        let mut p = project(5, false, DataQualityFlag::None);
        p.status_label = None;
        p.progress_percent = None;
        assert!(p.lacks_progress_data());
        assert_eq!(status_color(&p, &cfg), StatusColor::Gray);

        // critical wins over gray
        p.is_critical = true;
        assert_eq!(status_color(&p, &cfg), StatusColor::Red);
    }

    #[test]
    fn test_gray_matches_record_check() {
        let cfg = ScoringConfig::default();
        let blank = RawProjectRecord {
            id: "1".to_string(),
            name: "P".to_string(),
            status: Some(" ".to_string()),
            ..Default::default()
        };
        let with_total = RawProjectRecord {
            milestones_total: Some(3),
            ..blank.clone()
        };
        let with_done = RawProjectRecord {
            milestones_completed: Some(0),
            ..blank.clone()
        };

        for record in [blank, with_total, with_done] {
            let mut p = project(1, false, DataQualityFlag::None);
            p.status_label = record.status.clone();
            p.progress_percent = record.progress_percent;
            p.milestones_total = record.milestones_total;
            p.milestones_completed = record.milestones_completed;

            assert_eq!(
                status_color(&p, &cfg) == StatusColor::Gray,
                record.lacks_progress_data()
            );
        }
    }
}
