use crate::classifier::{Rule, Utterance};
use crate::types::{Intent, ScopeKind};
use regex::Regex;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Helper macro for concise rule definitions
// ---------------------------------------------------------------------------

macro_rules! rule {
    (
        id: $id:expr,
        intent: $intent:expr,
        keywords: $kw:expr
        $(, condition: $cond:expr)?
    ) => {
        Rule {
            id: $id,
            intent: $intent,
            keywords: $kw,
            condition: {
                #[allow(unused_mut, unused_assignments)]
                let mut c: fn(&Utterance, &Rule) -> bool = mentions_keyword;
                $(c = $cond;)?
                c
            },
        }
    };
}

// ---------------------------------------------------------------------------
// Keyword tables
// ---------------------------------------------------------------------------

pub const APPROVAL_WORDS: &[&str] = &["approval", "approve", "pending", "waiting"];
pub const COUNT_WORDS: &[&str] = &["how many", "count", "list", "all projects"];
pub const STATUS_WORDS: &[&str] = &["status", "progress"];
pub const CREATION_WORDS: &[&str] = &["create", "start", "new project"];

pub const GUIDANCE_WORDS: &[&str] = &["next step", "what should", "how to", "guide"];
pub const REQUIREMENT_WORDS: &[&str] = &["requirement", "feature", "user story"];
pub const RISK_WORDS: &[&str] = &["risk", "issue", "problem"];
pub const STAKEHOLDER_WORDS: &[&str] = &["stakeholder", "approval", "who"];
pub const PROGRESS_WORDS: &[&str] = &["status", "progress", "complete"];

/// Longest query still treated as a follow-up.
pub const FOLLOW_UP_MAX_TOKENS: usize = 5;

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

fn mentions_keyword(u: &Utterance, rule: &Rule) -> bool {
    u.mentions_any(rule.keywords)
}

fn status_without_phase(u: &Utterance, rule: &Rule) -> bool {
    u.mentions_any(rule.keywords) && !u.mentions("phase")
}

fn acknowledgement_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(yes|yeah|yep|sure|ok|okay|continue)\b|tell me more|go ahead")
            .expect("acknowledgement pattern is valid")
    })
}

fn phase_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bphase\s*([1-6])\b").expect("phase pattern is valid"))
}

/// Phase number named in `text` (`phase 1` through `phase 6`), if any.
pub fn mentioned_phase(text: &str) -> Option<u8> {
    phase_number_re()
        .captures(&text.to_lowercase())
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn is_acknowledgement(text: &str) -> bool {
    acknowledgement_re().is_match(&text.to_lowercase())
}

/// A follow-up is short and either acknowledges or names a phase. It takes
/// precedence over the scope rules, except that dashboard approval words
/// always classify as approval queries.
pub fn follow_up_detected(u: &Utterance, kind: ScopeKind) -> bool {
    if u.tokens > FOLLOW_UP_MAX_TOKENS {
        return false;
    }
    if kind == ScopeKind::Dashboard && u.mentions_any(APPROVAL_WORDS) {
        return false;
    }
    acknowledgement_re().is_match(&u.lower) || mentioned_phase(&u.lower).is_some()
}

// ---------------------------------------------------------------------------
// Rule tables
// ---------------------------------------------------------------------------

pub fn dashboard_rules() -> Vec<Rule> {
    vec![
        rule!(
            id: "dashboard_approvals",
            intent: Intent::ApprovalQuery,
            keywords: APPROVAL_WORDS
        ),
        rule!(
            id: "dashboard_count",
            intent: Intent::ProjectList,
            keywords: COUNT_WORDS
        ),
        rule!(
            id: "dashboard_status",
            intent: Intent::ProjectStatus,
            keywords: STATUS_WORDS,
            condition: status_without_phase
        ),
        rule!(
            id: "dashboard_creation",
            intent: Intent::ProjectCreationGuidance,
            keywords: CREATION_WORDS
        ),
    ]
}

pub fn project_rules() -> Vec<Rule> {
    vec![
        rule!(
            id: "project_guidance",
            intent: Intent::PhaseGuidance,
            keywords: GUIDANCE_WORDS
        ),
        rule!(
            id: "project_requirements",
            intent: Intent::RequirementInfo,
            keywords: REQUIREMENT_WORDS
        ),
        rule!(
            id: "project_risks",
            intent: Intent::RiskAnalysis,
            keywords: RISK_WORDS
        ),
        rule!(
            id: "project_stakeholders",
            intent: Intent::StakeholderInfo,
            keywords: STAKEHOLDER_WORDS
        ),
        rule!(
            id: "project_progress",
            intent: Intent::ProjectStatus,
            keywords: PROGRESS_WORDS
        ),
    ]
}
