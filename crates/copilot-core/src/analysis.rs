//! Requirement extraction from free text and risk analysis over phase-1
//! requirements.
//!
//! Both run through the configured model when there is one and fall back to
//! keyword heuristics otherwise, the same way document drafting does.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CopilotError, Result};
use crate::llm::Completer;
use crate::phase::{Requirement, Risk, Scenario, Severity};
use crate::project::Project;

/// Texts shorter than this (trimmed) yield no requirements.
pub const MIN_EXTRACT_CHARS: usize = 20;

/// Only this much of the source text is sent to the model.
const PROMPT_TEXT_LIMIT: usize = 8000;

/// Result of an extraction or a risk analysis.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis<T> {
    pub items: Vec<T>,
    pub confidence_score: u8,
    /// Heuristics were used instead of a model.
    pub fallback: bool,
}

impl<T> Analysis<T> {
    fn model(items: Vec<T>) -> Self {
        Self {
            items,
            confidence_score: 85,
            fallback: false,
        }
    }

    fn heuristic(items: Vec<T>) -> Self {
        Self {
            items,
            confidence_score: 60,
            fallback: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Model replies
// ---------------------------------------------------------------------------

/// Strip a surrounding markdown code fence (optionally tagged `json`).
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.split("```").next().unwrap_or(rest).trim()
}

#[derive(Debug, Deserialize)]
struct ModelRequirement {
    feature: Option<String>,
    as_a: Option<String>,
    i_want: Option<String>,
    so_that: Option<String>,
    priority: Option<String>,
    #[serde(default)]
    scenarios: Vec<Scenario>,
}

#[derive(Debug, Deserialize)]
struct ModelRisk {
    risk: Option<String>,
    severity: Option<String>,
    priority: Option<String>,
    mitigation: Option<String>,
}

fn text_or(value: Option<String>, default: impl FnOnce() -> String) -> String {
    value.filter(|v| !v.trim().is_empty()).unwrap_or_else(default)
}

fn default_scenario() -> Scenario {
    Scenario {
        title: "Default scenario".into(),
        given: vec!["preconditions are met".into()],
        when: vec!["user performs action".into()],
        then: vec!["expected result occurs".into()],
    }
}

fn parse_requirements(reply: &str) -> Result<Vec<Requirement>> {
    let raw: Vec<ModelRequirement> = serde_json::from_str(strip_code_fence(reply))?;
    if raw.is_empty() {
        return Err(CopilotError::Json(serde::de::Error::custom(
            "model returned no requirements",
        )));
    }
    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            let mut scenarios = r.scenarios;
            if scenarios.is_empty() {
                scenarios.push(default_scenario());
            }
            Requirement {
                feature: text_or(r.feature, || format!("Requirement {}", i + 1)),
                as_a: text_or(r.as_a, || "user".into()),
                i_want: text_or(r.i_want, || "to use this feature".into()),
                so_that: text_or(r.so_that, || "I can achieve my goals".into()),
                priority: text_or(r.priority, || "Medium".into()),
                scenarios,
            }
        })
        .collect())
}

/// `Critical` is folded into `High`; anything unreadable is `Medium`.
fn severity_of(label: Option<&str>) -> Severity {
    match label.map(str::to_ascii_lowercase).as_deref() {
        Some("critical") | Some("severe") => Severity::High,
        Some(other) => other.parse().unwrap_or_default(),
        None => Severity::Medium,
    }
}

fn parse_risks(reply: &str) -> Result<Vec<Risk>> {
    let raw: Vec<ModelRisk> = serde_json::from_str(strip_code_fence(reply))?;
    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(i, r)| Risk {
            risk: text_or(r.risk, || format!("Risk {}", i + 1)),
            severity: severity_of(r.severity.as_deref().or(r.priority.as_deref())),
            mitigation: Some(text_or(r.mitigation, || "To be defined".into())),
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Requirement extraction
// ---------------------------------------------------------------------------

const EXTRACT_SYSTEM: &str = "You are an expert Business Analyst who extracts and converts \
     requirements into proper Gherkin format. Always respond with valid JSON.";

pub fn extraction_prompt(text: &str) -> String {
    let excerpt: String = text.chars().take(PROMPT_TEXT_LIMIT).collect();
    format!(
        "Analyze the following document and extract ALL functional and non-functional \
         requirements.\n\n**Content**:\n{excerpt}\n\n\
         For each requirement give a feature name, a user story (as_a, i_want, so_that), \
         a priority (Critical/High/Medium/Low) and Given-When-Then scenarios. Use actual \
         details from the document, not generic placeholders.\n\n\
         **Output Format** (JSON array):\n\
         [{{\"feature\": \"...\", \"as_a\": \"...\", \"i_want\": \"...\", \"so_that\": \"...\", \
         \"priority\": \"High\", \"scenarios\": [{{\"title\": \"...\", \"given\": [\"...\"], \
         \"when\": [\"...\"], \"then\": [\"...\"]}}]}}]\n\n\
         Return ONLY the JSON array."
    )
}

fn user_story_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^as an? (.+?),\s*i want (?:to )?(.+?)(?:,?\s*so that (.+))?$")
            .expect("valid regex")
    })
}

fn requirement_cue_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(must|shall|should|need(s)? to|required|will|can|could|may|want)\b")
            .expect("valid regex")
    })
}

fn priority_of(sentence: &str) -> &'static str {
    let lower = sentence.to_lowercase();
    if ["critical", "must", "shall", "required"].iter().any(|w| lower.contains(w)) {
        "High"
    } else if ["could", "may", "nice to have", "optional"].iter().any(|w| lower.contains(w)) {
        "Low"
    } else {
        "Medium"
    }
}

/// Split on line breaks and sentence ends, dropping bullets and numbering.
fn sentences(text: &str) -> Vec<String> {
    text.lines()
        .flat_map(|line| line.split_inclusive(['.', '!', '?']))
        .map(|s| {
            s.trim()
                .trim_start_matches(|c: char| c == '-' || c == '*' || c == '•' || c.is_ascii_digit())
                .trim_start_matches(['.', ')'])
                .trim()
                .trim_end_matches(['.', '!', '?'])
                .trim()
                .to_string()
        })
        .filter(|s| s.split_whitespace().count() >= 3)
        .collect()
}

/// A short title from the leading words of a sentence.
fn feature_title(sentence: &str) -> String {
    let words: Vec<&str> = sentence.split_whitespace().take(6).collect();
    let mut title = words.join(" ");
    if let Some(first) = title.get(..1) {
        title = first.to_uppercase() + &title[1..];
    }
    title.trim_end_matches([',', ';', ':']).to_string()
}

fn story_requirement(sentence: &str) -> Option<Requirement> {
    let caps = user_story_re().captures(sentence)?;
    let as_a = caps.get(1)?.as_str().trim().to_string();
    let i_want = caps.get(2)?.as_str().trim().to_string();
    let so_that = caps
        .get(3)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| "the documented need is met".into());
    Some(Requirement {
        feature: feature_title(&i_want),
        scenarios: vec![Scenario {
            title: format!("{as_a} can {i_want}"),
            given: vec![format!("a signed-in {as_a}")],
            when: vec![format!("they {i_want}")],
            then: vec![so_that.clone()],
        }],
        priority: priority_of(sentence).into(),
        as_a,
        i_want,
        so_that,
    })
}

fn statement_requirement(sentence: &str) -> Requirement {
    let feature = feature_title(sentence);
    Requirement {
        scenarios: vec![Scenario {
            title: format!("{feature} behaves as documented"),
            given: vec!["the system is available".into()],
            when: vec!["the user exercises the feature".into()],
            then: vec![sentence.to_string()],
        }],
        priority: priority_of(sentence).into(),
        as_a: "user".into(),
        i_want: sentence.to_string(),
        so_that: "the documented need is met".into(),
        feature,
    }
}

/// Deterministic extraction: one requirement per user story or per sentence
/// that states a need.
pub fn heuristic_requirements(text: &str) -> Vec<Requirement> {
    let found: Vec<Requirement> = sentences(text)
        .iter()
        .filter_map(|s| {
            story_requirement(s)
                .or_else(|| requirement_cue_re().is_match(s).then(|| statement_requirement(s)))
        })
        .collect();
    if !found.is_empty() {
        return found;
    }
    vec![Requirement {
        feature: "Requirements from submitted text".into(),
        as_a: "user".into(),
        i_want: "to implement the requirements from the submitted text".into(),
        so_that: "the system meets the documented needs".into(),
        priority: "Medium".into(),
        scenarios: vec![Scenario {
            title: "Review extracted content".into(),
            given: vec!["text has been submitted".into()],
            when: vec!["requirements are extracted".into()],
            then: vec!["requirements are available for review".into()],
        }],
    }]
}

/// Turn free text into user-story requirements with Gherkin scenarios.
pub async fn extract_requirements(
    text: &str,
    completer: Option<&dyn Completer>,
) -> Analysis<Requirement> {
    if text.trim().chars().count() < MIN_EXTRACT_CHARS {
        return Analysis::heuristic(Vec::new());
    }
    if let Some(completer) = completer {
        let reply = completer
            .complete(Some(EXTRACT_SYSTEM), &extraction_prompt(text))
            .await;
        match reply.and_then(|r| parse_requirements(&r)) {
            Ok(items) => {
                tracing::info!(requirements = items.len(), "requirements extracted");
                return Analysis::model(items);
            }
            Err(e) => tracing::warn!(error = %e, "requirement extraction failed; using heuristics"),
        }
    }
    Analysis::heuristic(heuristic_requirements(text))
}

// ---------------------------------------------------------------------------
// Risk analysis
// ---------------------------------------------------------------------------

const RISK_SYSTEM: &str = "You are an expert Risk Analyst who identifies and assesses project \
     risks. Always respond with valid JSON.";

pub fn risk_prompt(project: &Project, requirements: &[Requirement]) -> String {
    let mut summary = String::new();
    for (i, r) in requirements.iter().enumerate() {
        summary.push_str(&format!("\n{}. **{}**\n", i + 1, r.feature));
        summary.push_str(&format!("   - Priority: {}\n", r.priority));
        summary.push_str(&format!("   - User Story: As a {}, I want {}\n", r.as_a, r.i_want));
        if !r.scenarios.is_empty() {
            summary.push_str(&format!("   - Complexity: {} scenarios\n", r.scenarios.len()));
        }
    }
    format!(
        "Analyze the following requirements and identify potential risks for this project.\n\n\
         **Project**: {}\n\n**Requirements**:\n{summary}\n\n\
         Consider technical, business, resource, schedule and quality risks. For each risk \
         give a specific description, a severity (High/Medium/Low, from likelihood and \
         impact) and a mitigation strategy.\n\n\
         **Output Format** (JSON array):\n\
         [{{\"risk\": \"...\", \"severity\": \"High\", \"mitigation\": \"...\"}}]\n\n\
         Identify the 5-10 most significant risks. Return ONLY the JSON array.",
        project.name
    )
}

struct RiskRule {
    keywords: &'static [&'static str],
    risk: &'static str,
    severity: Severity,
    mitigation: &'static str,
}

const RISK_RULES: &[RiskRule] = &[
    RiskRule {
        keywords: &["integrat", "api", "third-party", "third party", "external", "sync"],
        risk: "Third-party integration failures or API changes",
        severity: Severity::High,
        mitigation: "Contract-test each integration and isolate it behind an adapter",
    },
    RiskRule {
        keywords: &["payment", "password", "login", "auth", "personal", "security", "privacy"],
        risk: "Security and data protection gaps",
        severity: Severity::High,
        mitigation: "Threat-model sensitive flows and schedule a security review",
    },
    RiskRule {
        keywords: &["real-time", "realtime", "performance", "scale", "concurrent", "latency"],
        risk: "Performance targets missed under load",
        severity: Severity::Medium,
        mitigation: "Define load targets early and run performance tests each sprint",
    },
    RiskRule {
        keywords: &["report", "export", "import", "migrat", "data"],
        risk: "Data quality or migration issues",
        severity: Severity::Medium,
        mitigation: "Profile source data and rehearse migrations on a copy",
    },
];

/// Risks present in every project.
const BASELINE_RISKS: &[(&str, Severity, &str)] = &[
    (
        "Technical complexity in implementation",
        Severity::High,
        "Conduct technical spike, use proven technologies",
    ),
    (
        "Resource availability constraints",
        Severity::Medium,
        "Ensure team allocation in advance",
    ),
    (
        "Scope creep and requirement changes",
        Severity::High,
        "Implement strict change control process",
    ),
];

/// Requirements beyond this count add a delivery-schedule risk.
const LARGE_SCOPE: usize = 10;

fn risk(name: &str, severity: Severity, mitigation: &str) -> Risk {
    Risk {
        risk: name.into(),
        severity,
        mitigation: Some(mitigation.into()),
    }
}

/// Deterministic analysis: baseline risks plus keyword-triggered ones.
pub fn heuristic_risks(requirements: &[Requirement]) -> Vec<Risk> {
    let corpus = requirements
        .iter()
        .map(|r| format!("{} {} {}", r.feature, r.i_want, r.so_that))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let mut risks: Vec<Risk> = BASELINE_RISKS
        .iter()
        .map(|(name, severity, mitigation)| risk(name, *severity, mitigation))
        .collect();
    for rule in RISK_RULES {
        if rule.keywords.iter().any(|k| corpus.contains(k)) {
            risks.push(risk(rule.risk, rule.severity, rule.mitigation));
        }
    }
    if requirements.len() > LARGE_SCOPE {
        risks.push(risk(
            "Delivery schedule pressure from a large scope",
            Severity::High,
            "Phase delivery and re-prioritize features each milestone",
        ));
    }
    risks
}

/// Identify risks from a project's requirements. No requirements, no risks.
pub async fn analyze_risks(
    project: &Project,
    requirements: &[Requirement],
    completer: Option<&dyn Completer>,
) -> Analysis<Risk> {
    if requirements.is_empty() {
        return Analysis::heuristic(Vec::new());
    }
    if let Some(completer) = completer {
        let reply = completer
            .complete(Some(RISK_SYSTEM), &risk_prompt(project, requirements))
            .await;
        match reply.and_then(|r| parse_risks(&r)) {
            Ok(items) => {
                tracing::info!(project_id = project.id, risks = items.len(), "risks analyzed");
                return Analysis::model(items);
            }
            Err(e) => tracing::warn!(error = %e, "risk analysis failed; using heuristics"),
        }
    }
    Analysis::heuristic(heuristic_risks(requirements))
}
