//! Prompt templates and response parsing.

use super::provider::{PortfolioBrief, PortfolioNarrative, ProjectAssessment, ProjectBrief};
use crate::error::ProviderError;
use crate::models::Dimension;
use crate::report::Language;
use crate::scoring::normalizer::RawDimension;
use serde_json::Value;

/// System prompt shared by all scoring calls.
pub const SYSTEM_PROMPT: &str = r#"You are an experienced project portfolio analyst. You assess project data exported from a project-management tool and give well-founded, actionable judgments for management.

Score every project on five dimensions, each on a scale from 1 to 5:

- urgency (U): how time-critical the project is. 1 = no relevant time pressure, 5 = immediate action needed, critical consequences imminent.
- importance (I): strategic significance. 1 = nice-to-have, 5 = business-critical.
- complexity (C): technical and organizational complexity. 1 = simple and self-contained, 5 = large transformation with many dependencies.
- risk (R): likelihood and impact of problems. 1 = hardly any risk, 5 = critical risks with massive impact.
- data_quality (DQ): completeness and consistency of the data you were given. 1 = contradictory or largely missing, 5 = complete and consistent.

Rules:
- Base every judgment on the concrete facts provided. Quote numbers.
- Name contradictions in the data explicitly (e.g. "completed" with no milestone reached).
- Use the full scale, not only the extremes.
- Answer with a single valid JSON object and nothing else."#;

/// Build the prompt that scores one project.
pub fn project_prompt(brief: &ProjectBrief, language: Language) -> String {
    format!(
        r#"Analyze the following project and score it with the U/I/C/R/DQ model.

{facts}

Answer ONLY with a JSON object of this shape:

{{
  "urgency": {{"value": 1-5, "reasoning": "2-3 sentences referring to the data"}},
  "importance": {{"value": 1-5, "reasoning": "..."}},
  "complexity": {{"value": 1-5, "reasoning": "..."}},
  "risk": {{"value": 1-5, "reasoning": "..."}},
  "data_quality": {{"value": 1-5, "reasoning": "..."}},
  "is_critical": true or false,
  "summary": "overall verdict in 2-3 sentences",
  "detailed_analysis": "5-8 sentences of flowing text specific to this project: situation, problems and causes, consequences, next steps"
}}

Write all text values in {language}."#,
        facts = brief.fact_sheet(),
        language = language.name(),
    )
}

/// Build the prompt for the executive summary.
pub fn portfolio_prompt(brief: &PortfolioBrief, language: Language) -> String {
    let mut scores = String::new();
    for p in &brief.projects {
        scores.push_str(&format!(
            "### {} (ID: {}){}\n",
            p.name,
            p.id,
            if p.is_critical { " [CRITICAL]" } else { "" }
        ));
        let values: Vec<String> = Dimension::ALL
            .iter()
            .map(|d| format!("{}={}", d.code(), p.scores.value(*d)))
            .collect();
        scores.push_str(&format!(
            "Scores: {}, status: {}, data quality flag: {}\n",
            values.join(", "),
            p.status_color,
            p.data_quality_flag
        ));
        if !p.analysis.is_empty() {
            scores.push_str(&format!("Analysis: {}\n", p.analysis));
        }
        scores.push('\n');
    }

    let stats = &brief.statistics;
    format!(
        r#"Based on the project assessments below, write a strategic portfolio analysis.
The scores and the critical classification are final; your text must agree with them.

## Portfolio: {name}

{count} projects, {critical} critical, {inconsistent} with inconsistent data.

{scores}
Answer ONLY with a JSON object of this shape:

{{
  "executive_summary": "6-10 sentences: overall state, key findings, most urgent need for action",
  "risk_clusters": ["one sentence per cross-project risk pattern"],
  "recommendations": ["at most 3 prioritized recommendations, one sentence each"]
}}

Write all text values in {language}."#,
        name = brief.portfolio_name,
        count = stats.project_count,
        critical = stats.critical_count,
        inconsistent = stats.inconsistent_count,
        scores = scores,
        language = language.name(),
    )
}

/// Extract the JSON object from a model reply.
///
/// Handles Markdown code fences and chatter around the object.
pub fn extract_json(reply: &str) -> Option<Value> {
    let trimmed = reply.trim();
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    let unfenced = strip_code_fence(trimmed);
    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str::<Value>(&unfenced[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let after = &text[open + 3..];
    // skip the language tag line
    let body = after.find('\n').map(|i| &after[i + 1..]).unwrap_or(after);
    match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    }
}

/// Parse a per-project reply.
pub fn parse_assessment(reply: &str) -> Result<ProjectAssessment, ProviderError> {
    let json = extract_json(reply)
        .ok_or_else(|| ProviderError::InvalidResponse("no JSON object in reply".to_string()))?;

    // Some models wrap a single project in a "projects" array.
    let json = match json.get("projects").and_then(Value::as_array) {
        Some(projects) if !projects.is_empty() => projects[0].clone(),
        _ => json,
    };

    let mut assessment = ProjectAssessment::default();
    for dimension in Dimension::ALL {
        *assessment.dimensions.get_mut(dimension) = parse_dimension(json.get(dimension.key()));
    }

    assessment.is_critical = match json.get("is_critical") {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "ja" => Some(true),
            "false" | "no" | "nein" => Some(false),
            _ => None,
        },
        _ => None,
    };
    assessment.summary = text_field(&json, &["summary"]);
    assessment.analysis = text_field(&json, &["detailed_analysis", "analysis"]);

    Ok(assessment)
}

fn parse_dimension(value: Option<&Value>) -> RawDimension {
    match value {
        Some(Value::Object(map)) => RawDimension {
            value: map.get("value").and_then(number),
            justification: map
                .get("reasoning")
                .or_else(|| map.get("justification"))
                .and_then(Value::as_str)
                .map(String::from),
        },
        Some(v) => RawDimension {
            value: number(v),
            justification: None,
        },
        None => RawDimension::default(),
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_field(json: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| json.get(*k).and_then(Value::as_str))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn string_list(json: &Value, key: &str) -> Vec<String> {
    json.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Parse the portfolio-level reply.
pub fn parse_narrative(reply: &str) -> Result<PortfolioNarrative, ProviderError> {
    let json = extract_json(reply)
        .ok_or_else(|| ProviderError::InvalidResponse("no JSON object in reply".to_string()))?;

    let executive_summary = text_field(&json, &["executive_summary", "summary"]);
    if executive_summary.is_empty() {
        return Err(ProviderError::InvalidResponse(
            "reply has no executive_summary".to_string(),
        ));
    }

    Ok(PortfolioNarrative {
        executive_summary,
        recommendations: string_list(&json, "recommendations"),
        risk_clusters: string_list(&json, "risk_clusters"),
    })
}
