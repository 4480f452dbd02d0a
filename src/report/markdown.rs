//! Markdown report generation.
//!
//! Builds a management-readable portfolio report from a finished analysis.
//! Section order: metadata, executive summary, statistics, ranking,
//! per-project details (full detail only), data warnings, recommendations.

use super::{DetailLevel, Language, RenderOptions, ReportRenderer};
use crate::models::{
    DataQualityFlag, Dimension, PortfolioAnalysis, PortfolioStatistics, ProjectScore, StatusColor,
};
use anyhow::Result;

/// Renders the analysis as a Markdown document.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl ReportRenderer for MarkdownRenderer {
    fn media_type(&self) -> &'static str {
        "text/markdown"
    }

    fn file_extension(&self) -> &'static str {
        "md"
    }

    fn render(&self, analysis: &PortfolioAnalysis, options: &RenderOptions) -> Result<Vec<u8>> {
        Ok(generate_markdown_report(analysis, options).into_bytes())
    }
}

/// Localized report labels.
struct Labels {
    title: &'static str,
    metadata: &'static str,
    portfolio: &'static str,
    generated: &'static str,
    model: &'static str,
    projects: &'static str,
    executive_summary: &'static str,
    statistics: &'static str,
    average: &'static str,
    critical_projects: &'static str,
    avg_progress: &'static str,
    status_distribution: &'static str,
    flagged_data: &'static str,
    ranking: &'static str,
    rank: &'static str,
    project: &'static str,
    priority: &'static str,
    status: &'static str,
    progress: &'static str,
    milestones: &'static str,
    details: &'static str,
    owner: &'static str,
    effort: &'static str,
    critical_because: &'static str,
    justification: &'static str,
    warnings: &'static str,
    data_warnings: &'static str,
    risk_clusters: &'static str,
    recommendations: &'static str,
    no_projects: &'static str,
    footer: &'static str,
}

const LABELS_EN: Labels = Labels {
    title: "Portfolio Triage Report",
    metadata: "Metadata",
    portfolio: "Portfolio",
    generated: "Generated",
    model: "Model Used",
    projects: "Projects",
    executive_summary: "Executive Summary",
    statistics: "Portfolio Statistics",
    average: "Average",
    critical_projects: "Critical projects",
    avg_progress: "Average progress",
    status_distribution: "Status distribution",
    flagged_data: "Flagged data",
    ranking: "Priority Ranking",
    rank: "#",
    project: "Project",
    priority: "Priority",
    status: "Status",
    progress: "Progress",
    milestones: "Milestones",
    details: "Project Details",
    owner: "Owner",
    effort: "Effort (actual / planned)",
    critical_because: "Critical because",
    justification: "Justification",
    warnings: "Warnings",
    data_warnings: "Data Warnings",
    risk_clusters: "Risk Clusters",
    recommendations: "Recommendations",
    no_projects: "The portfolio contains no projects.",
    footer: "Report generated by portfolio-triage",
};

const LABELS_DE: Labels = Labels {
    title: "Portfolio-Triage-Bericht",
    metadata: "Metadaten",
    portfolio: "Portfolio",
    generated: "Erstellt",
    model: "Modell",
    projects: "Projekte",
    executive_summary: "Management-Zusammenfassung",
    statistics: "Portfolio-Kennzahlen",
    average: "Durchschnitt",
    critical_projects: "Kritische Projekte",
    avg_progress: "Durchschnittlicher Fortschritt",
    status_distribution: "Statusverteilung",
    flagged_data: "Markierte Daten",
    ranking: "Prioritätenliste",
    rank: "#",
    project: "Projekt",
    priority: "Priorität",
    status: "Status",
    progress: "Fortschritt",
    milestones: "Meilensteine",
    details: "Projektdetails",
    owner: "Projektleitung",
    effort: "Aufwand (Ist / Plan)",
    critical_because: "Kritisch wegen",
    justification: "Begründung",
    warnings: "Hinweise",
    data_warnings: "Datenhinweise",
    risk_clusters: "Risikocluster",
    recommendations: "Handlungsempfehlungen",
    no_projects: "Das Portfolio enthält keine Projekte.",
    footer: "Bericht erstellt mit portfolio-triage",
};

fn labels(language: Language) -> &'static Labels {
    match language {
        Language::En => &LABELS_EN,
        Language::De => &LABELS_DE,
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(analysis: &PortfolioAnalysis, options: &RenderOptions) -> String {
    let l = labels(options.language);
    let mut output = String::new();

    output.push_str(&format!("# {}: {}\n\n", l.title, analysis.portfolio_name));

    output.push_str(&generate_metadata_section(analysis, l));
    output.push_str(&generate_text_section(l.executive_summary, &analysis.executive_summary));
    output.push_str(&generate_statistics_section(&analysis.statistics, l));
    output.push_str(&generate_ranking_section(&analysis.projects, l));

    if options.detail == DetailLevel::Full && !analysis.projects.is_empty() {
        output.push_str(&format!("## {}\n\n", l.details));
        for (index, project) in analysis.projects.iter().enumerate() {
            output.push_str(&generate_project_block(index + 1, project, l));
        }
    }

    output.push_str(&generate_list_section(l.risk_clusters, &analysis.risk_clusters, false));
    output.push_str(&generate_list_section(l.data_warnings, &analysis.data_warnings, false));
    output.push_str(&generate_list_section(
        l.recommendations,
        &analysis.recommendations,
        true,
    ));

    output.push_str(&format!("---\n\n*{}*\n", l.footer));

    output
}

fn generate_metadata_section(analysis: &PortfolioAnalysis, l: &Labels) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", l.metadata));
    section.push_str(&format!(
        "- **{}:** {} (ID {})\n",
        l.portfolio, analysis.portfolio_name, analysis.portfolio_id
    ));
    section.push_str(&format!(
        "- **{}:** {}\n",
        l.generated,
        analysis.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **{}:** `{}`\n", l.model, analysis.model_used));
    section.push_str(&format!(
        "- **{}:** {}\n\n",
        l.projects, analysis.statistics.project_count
    ));

    section
}

fn generate_text_section(heading: &str, text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    format!("## {}\n\n{}\n\n", heading, text.trim())
}

fn generate_statistics_section(stats: &PortfolioStatistics, l: &Labels) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", l.statistics));

    if stats.project_count == 0 {
        section.push_str(l.no_projects);
        section.push_str("\n\n");
        return section;
    }

    section.push_str(&format!(
        "- **{}:** {} / {}\n",
        l.critical_projects, stats.critical_count, stats.project_count
    ));
    if let Some(progress) = stats.avg_progress {
        section.push_str(&format!("- **{}:** {:.0}%\n", l.avg_progress, progress));
    }
    section.push_str(&format!(
        "- **{}:** {} {} | {} {} | {} {} | {} {}\n",
        l.status_distribution,
        StatusColor::Red.emoji(),
        stats.red_count,
        StatusColor::Yellow.emoji(),
        stats.yellow_count,
        StatusColor::Green.emoji(),
        stats.green_count,
        StatusColor::Gray.emoji(),
        stats.gray_count,
    ));
    if stats.inconsistent_count + stats.fallback_count > 0 {
        section.push_str(&format!(
            "- **{}:** {} {}, {} {}\n",
            l.flagged_data,
            stats.inconsistent_count,
            DataQualityFlag::Inconsistent,
            stats.fallback_count,
            DataQualityFlag::FallbackContent,
        ));
    }
    section.push('\n');

    let header: Vec<&str> = Dimension::ALL.iter().map(|d| d.code()).collect();
    section.push_str(&format!("| | {} |\n", header.join(" | ")));
    section.push_str(&format!("|:---|{}\n", ":---:|".repeat(Dimension::ALL.len())));
    let averages: Vec<String> = Dimension::ALL
        .iter()
        .map(|d| format!("{:.1}", stats.average(*d)))
        .collect();
    section.push_str(&format!("| {} | {} |\n\n", l.average, averages.join(" | ")));

    section
}

fn generate_ranking_section(projects: &[ProjectScore], l: &Labels) -> String {
    if projects.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", l.ranking));
    section.push_str(&format!(
        "| {} | {} | {} | U | I | C | R | DQ | {} | {} |\n",
        l.rank, l.project, l.status, l.priority, l.progress
    ));
    section.push_str("|---:|:---|:---:|:---:|:---:|:---:|:---:|:---:|---:|---:|\n");

    for (index, p) in projects.iter().enumerate() {
        let mut name = p.project_name.clone();
        if p.is_critical {
            name = format!("**{}**", name);
        }
        if p.data_quality_flag.is_flagged() {
            name = format!("{} `{}`", name, p.data_quality_flag);
        }

        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
            index + 1,
            name,
            p.status_color.emoji(),
            p.scores.urgency.value,
            p.scores.importance.value,
            p.scores.complexity.value,
            p.scores.risk.value,
            p.scores.data_quality.value,
            p.priority_score,
            format_progress(p.progress_percent),
        ));
    }
    section.push('\n');

    section
}

fn format_progress(progress: Option<f64>) -> String {
    progress
        .map(|p| format!("{:.0}%", p))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Generate the detail block of a single project.
fn generate_project_block(rank: usize, p: &ProjectScore, l: &Labels) -> String {
    let mut block = String::new();

    block.push_str(&format!(
        "### {}. {} {}\n\n",
        rank,
        p.status_color.emoji(),
        p.project_name
    ));

    let mut facts = Vec::new();
    if let Some(ref owner) = p.owner {
        facts.push(format!("**{}:** {}", l.owner, owner));
    }
    if let Some(ref status) = p.status_label {
        facts.push(format!("**{}:** {}", l.status, status));
    }
    facts.push(format!(
        "**{}:** {}",
        l.progress,
        format_progress(p.progress_percent)
    ));
    if let Some(ratio) = p.milestone_ratio() {
        facts.push(format!("**{}:** {}", l.milestones, ratio));
    }
    if let (Some(actual), Some(planned)) = (p.actual_effort_hours, p.planned_effort_hours) {
        facts.push(format!("**{}:** {:.0}h / {:.0}h", l.effort, actual, planned));
    }
    block.push_str(&format!("{}\n\n", facts.join(" | ")));

    if p.is_critical && !p.criticality_reasons.is_empty() {
        let reasons: Vec<String> = p.criticality_reasons.iter().map(|r| r.to_string()).collect();
        block.push_str(&format!(
            "> 🚨 **{}:** {}\n\n",
            l.critical_because,
            reasons.join(", ")
        ));
    }

    block.push_str(&format!(
        "| {} | U | I | C | R | DQ |\n|---:|:---:|:---:|:---:|:---:|:---:|\n",
        l.priority
    ));
    block.push_str(&format!(
        "| {} | {} | {} | {} | {} | {} |\n\n",
        p.priority_score,
        p.scores.urgency.value,
        p.scores.importance.value,
        p.scores.complexity.value,
        p.scores.risk.value,
        p.scores.data_quality.value,
    ));

    if !p.summary.trim().is_empty() {
        block.push_str(&format!("*{}*\n\n", p.summary.trim()));
    }
    block.push_str(&format!("{}\n\n", p.analysis.trim()));

    let justified: Vec<String> = Dimension::ALL
        .iter()
        .filter_map(|d| {
            p.scores
                .get(*d)
                .justification
                .as_ref()
                .map(|j| format!("- **{}** ({}): {}", d, p.scores.value(*d), j))
        })
        .collect();
    if !justified.is_empty() {
        block.push_str(&format!(
            "<details>\n<summary>{}</summary>\n\n{}\n</details>\n\n",
            l.justification,
            justified.join("\n")
        ));
    }

    if !p.warnings.is_empty() {
        block.push_str(&format!("**{}:**\n", l.warnings));
        for warning in &p.warnings {
            block.push_str(&format!("- ⚠️ {}\n", warning));
        }
        block.push('\n');
    }

    block.push_str("---\n\n");

    block
}

fn generate_list_section(heading: &str, items: &[String], numbered: bool) -> String {
    if items.is_empty() {
        return String::new();
    }

    let mut section = format!("## {}\n\n", heading);
    for (i, item) in items.iter().enumerate() {
        if numbered {
            section.push_str(&format!("{}. {}\n", i + 1, item));
        } else {
            section.push_str(&format!("- {}\n", item));
        }
    }
    section.push('\n');

    section
}
