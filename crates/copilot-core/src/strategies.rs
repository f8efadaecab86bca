//! Reply strategies: one pure function per `(scope kind, intent)` pair.
//!
//! Every strategy renders from the assembled context alone and always
//! produces text. Missing facts fall through to the "nothing here yet"
//! branch of the same template.

use serde::Serialize;

use crate::catalog::PHASE_COUNT;
use crate::context::{ContextPayload, DashboardFacts, ProjectFacts, Progress};
use crate::knowledge;
use crate::phase::{Risk, Severity, Stakeholder};
use crate::rules::{is_acknowledgement, mentioned_phase, APPROVAL_WORDS};
use crate::types::{ConversationTurn, Intent, Scope, ScopeKind, Source, TurnRole};

/// Projects listed by name before the rest are summarised as a count.
const LISTED_PROJECTS: usize = 5;
const REQUIREMENT_SNIPPETS: usize = 3;
const SNIPPET_PREVIEW_CHARS: usize = 200;
const LISTED_RISKS: usize = 5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub response: String,
    /// 0..=100.
    pub confidence_score: u8,
    pub sources: Vec<Source>,
}

impl Reply {
    fn new(response: impl Into<String>, confidence_score: u8, sources: &[Source]) -> Self {
        Self {
            response: response.into(),
            confidence_score,
            sources: sources.to_vec(),
        }
    }
}

/// What a strategy renders from.
pub struct StrategyInput<'a> {
    pub scope: &'a Scope,
    pub query: &'a str,
    pub history: &'a [ConversationTurn],
    pub context: &'a ContextPayload,
}

impl StrategyInput<'_> {
    fn dashboard(&self) -> Option<&DashboardFacts> {
        self.context.facts.dashboard()
    }

    fn project(&self) -> Option<&ProjectFacts> {
        self.context.facts.project()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Fixed template over facts.
    Templated,
    /// Catch-all menu; may be answered by a language model instead.
    General,
}

#[derive(Clone, Copy)]
pub struct Strategy {
    pub id: &'static str,
    pub kind: StrategyKind,
    pub generate: fn(&StrategyInput) -> Reply,
}

macro_rules! strategy {
    ($id:literal, $kind:ident, $f:path) => {
        Strategy {
            id: $id,
            kind: StrategyKind::$kind,
            generate: $f,
        }
    };
}

/// Every enumerated `(scope kind, intent)` pair and its strategy.
pub fn table() -> Vec<((ScopeKind, Intent), Strategy)> {
    use Intent::*;
    use ScopeKind::{Dashboard, Project};
    vec![
        ((Dashboard, ApprovalQuery), strategy!("pending_approvals", Templated, approvals)),
        ((Dashboard, ProjectList), strategy!("project_list", Templated, project_list)),
        ((Dashboard, ProjectStatus), strategy!("status_overview", Templated, status_overview)),
        (
            (Dashboard, ProjectCreationGuidance),
            strategy!("creation_guide", Templated, creation_guide),
        ),
        ((Dashboard, FollowUp), strategy!("follow_up", Templated, follow_up)),
        ((Dashboard, DashboardGeneral), general(Dashboard)),
        ((Project, PhaseGuidance), strategy!("phase_guidance", Templated, phase_guidance)),
        ((Project, RequirementInfo), strategy!("requirement_info", Templated, requirement_info)),
        ((Project, RiskAnalysis), strategy!("risk_analysis", Templated, risk_analysis)),
        ((Project, StakeholderInfo), strategy!("stakeholders", Templated, stakeholders)),
        ((Project, ProjectStatus), strategy!("project_progress", Templated, project_progress)),
        ((Project, FollowUp), strategy!("follow_up", Templated, follow_up)),
        ((Project, ProjectGeneral), general(Project)),
    ]
}

/// Catch-all strategy of a scope kind.
pub fn general(kind: ScopeKind) -> Strategy {
    match kind {
        ScopeKind::Dashboard => strategy!("dashboard_menu", General, dashboard_menu),
        ScopeKind::Project => strategy!("project_menu", General, project_menu),
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

fn approvals(input: &StrategyInput) -> Reply {
    let Some(facts) = input.dashboard() else {
        return Reply::new(knowledge::APPROVALS_UNAVAILABLE, 75, &[Source::Context]);
    };
    let pending = facts.statistics.pending_approvals;
    if pending == 0 {
        return Reply::new(knowledge::NO_PENDING_APPROVALS, 95, &[Source::SqlDatabase]);
    }

    let plural = if pending == 1 { "" } else { "s" };
    let mut out = format!(
        "📋 **Pending Approvals**\n\nYou have **{pending} approval{plural}** waiting for your review.\n\n"
    );
    let waiting: Vec<_> = facts
        .projects
        .iter()
        .filter(|p| p.pending_approval_phases > 0)
        .collect();
    if !waiting.is_empty() {
        out.push_str("**Pending submissions:**\n");
        for p in waiting {
            out.push_str(&format!(
                "- {} ({} phase{})\n",
                p.name,
                p.pending_approval_phases,
                if p.pending_approval_phases == 1 { "" } else { "s" }
            ));
        }
        out.push('\n');
    }
    out.push_str(knowledge::APPROVAL_STEPS);
    out.push_str("\n\nWould you like me to help you navigate to the Approval Center?");
    Reply::new(out, 95, &[Source::SqlDatabase])
}

fn project_list(input: &StrategyInput) -> Reply {
    let (total, projects) = match input.dashboard() {
        Some(f) => (f.total_projects, f.projects.as_slice()),
        None => (0, &[][..]),
    };
    let lower = input.query.to_lowercase();

    let out = if lower.contains("phase") && lower.contains("requirements") {
        let in_requirements: Vec<_> = projects
            .iter()
            .filter(|p| {
                p.current_phase
                    .as_deref()
                    .is_some_and(|name| name.contains("Requirements"))
            })
            .collect();
        let mut out = format!(
            "There are **{} projects** currently in the 'Requirements & Business Analysis' phase:\n\n",
            in_requirements.len()
        );
        for p in in_requirements {
            let description = if p.description.is_empty() {
                "No description"
            } else {
                p.description.as_str()
            };
            out.push_str(&format!("- **{}**: {description}\n", p.name));
        }
        out
    } else {
        let mut out = format!("You have **{total} total projects** in your SDLC platform:\n\n");
        for p in projects.iter().take(LISTED_PROJECTS) {
            let marker = match p.status {
                crate::types::ProjectStatus::Active => "🟢",
                crate::types::ProjectStatus::Completed => "🔵",
                _ => "⚪",
            };
            out.push_str(&format!(
                "{marker} **{}** - {}/{} phases completed\n",
                p.name, p.completed_phases, p.total_phases
            ));
        }
        if total > LISTED_PROJECTS {
            out.push_str(&format!("\n... and {} more projects.", total - LISTED_PROJECTS));
        }
        if total == 0 {
            out.push_str("Ask me how to create your first project!");
        }
        out
    };
    Reply::new(out, 95, &[Source::SqlDatabase])
}

fn status_overview(input: &StrategyInput) -> Reply {
    let stats = input
        .dashboard()
        .map(|f| f.statistics.clone())
        .unwrap_or_default();
    let mut out = format!(
        "📊 **Project Status Overview**\n\n\
         **Active Projects**: {}\n\
         **Completed Projects**: {}\n\
         **Pending Approvals**: {}\n\n",
        stats.active_projects, stats.completed_projects, stats.pending_approvals
    );
    if stats.pending_approvals > 0 {
        out.push_str(&format!(
            "You have {} approvals waiting for review.",
            stats.pending_approvals
        ));
    } else {
        out.push_str("Nothing is waiting on approval right now.");
    }
    Reply::new(out, 90, &[Source::SqlDatabase])
}

fn creation_guide(_input: &StrategyInput) -> Reply {
    Reply::new(knowledge::creation_guide(), 100, &[Source::KnowledgeBase])
}

fn dashboard_menu(input: &StrategyInput) -> Reply {
    let mut out = knowledge::DASHBOARD_MENU.to_string();
    append_related(&mut out, &input.context.snippets);
    Reply::new(out, 70, &[Source::GeneralAi])
}

// ---------------------------------------------------------------------------
// Follow-up (both scopes)
// ---------------------------------------------------------------------------

fn last_user_turn(history: &[ConversationTurn]) -> Option<String> {
    history
        .iter()
        .rev()
        .find(|t| t.role == TurnRole::User)
        .map(|t| t.content.to_lowercase())
}

fn follow_up(input: &StrategyInput) -> Reply {
    let sources = &[Source::KnowledgeBase, Source::Context];
    let Some(previous) = last_user_turn(input.history) else {
        return Reply::new(knowledge::CLARIFY, 50, &[Source::Context]);
    };
    let lower = input.query.to_lowercase();

    if previous.contains("create") || previous.contains("new project") {
        let named = mentioned_phase(&lower).or_else(|| {
            (lower.contains("planning") || lower.contains("backlog")).then_some(2)
        });
        if let Some(text) = named.and_then(knowledge::walkthrough) {
            return Reply::new(text, 95, sources);
        }
    }

    if APPROVAL_WORDS.iter().any(|w| previous.contains(w)) && is_acknowledgement(&lower) {
        return Reply::new(knowledge::approval_navigation(), 90, sources);
    }

    Reply::new(knowledge::CLARIFY, 50, &[Source::Context])
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

fn phase_guidance(input: &StrategyInput) -> Reply {
    let guide = input
        .project()
        .and_then(|f| f.focus_phase())
        .and_then(|p| knowledge::phase_guide(p.phase_number));
    match guide {
        Some(text) => Reply::new(text, 95, &[Source::KnowledgeBase, Source::ProjectData]),
        None => Reply::new(knowledge::NEED_PHASE, 50, &[]),
    }
}

fn preview(snippet: &str) -> String {
    let head: String = snippet.chars().take(SNIPPET_PREVIEW_CHARS).collect();
    format!("{head}...")
}

fn requirement_info(input: &StrategyInput) -> Reply {
    let snippets = &input.context.snippets;
    if snippets.is_empty() {
        return Reply::new(knowledge::NO_REQUIREMENTS, 70, &[Source::KnowledgeBase]);
    }
    let mut out = String::from("Based on your project requirements:\n\n");
    for (i, s) in snippets.iter().take(REQUIREMENT_SNIPPETS).enumerate() {
        out.push_str(&format!("{}. {}\n\n", i + 1, preview(s)));
    }
    out.push_str("Would you like more details about any specific requirement?");
    Reply::new(out, 85, &[Source::VectorDatabase, Source::ProjectData])
}

/// Risks of the focus phase, or of every phase when none is in focus.
fn risks_in_view(facts: &ProjectFacts) -> Vec<Risk> {
    match facts.focus_phase() {
        Some(phase) => phase.data.risks(),
        None => facts.phases.iter().flat_map(|p| p.data.risks()).collect(),
    }
}

fn risk_analysis(input: &StrategyInput) -> Reply {
    let risks = input.project().map(risks_in_view).unwrap_or_default();
    if risks.is_empty() {
        return Reply::new(knowledge::NO_RISKS, 75, &[Source::ProjectData]);
    }
    let mut out = String::from("🚨 **Identified Risks**:\n\n");
    for r in risks.iter().take(LISTED_RISKS) {
        let marker = match r.severity {
            Severity::High => "🔴",
            Severity::Medium => "🟡",
            Severity::Low => "🟢",
        };
        out.push_str(&format!(
            "{marker} **{}**\n   - Severity: {}\n   - Mitigation: {}\n\n",
            r.risk,
            r.severity,
            r.mitigation.as_deref().unwrap_or("TBD")
        ));
    }
    let mut sources = vec![Source::ProjectData];
    if !input.context.snippets.is_empty() {
        sources.push(Source::VectorDatabase);
    }
    Reply {
        response: out.trim_end().to_string(),
        confidence_score: 90,
        sources,
    }
}

fn stakeholders_in_view(facts: &ProjectFacts) -> Vec<Stakeholder> {
    match facts.focus_phase() {
        Some(phase) => phase.data.stakeholders(),
        None => facts.phases.iter().flat_map(|p| p.data.stakeholders()).collect(),
    }
}

fn stakeholders(input: &StrategyInput) -> Reply {
    let people = input.project().map(stakeholders_in_view).unwrap_or_default();
    if people.is_empty() {
        return Reply::new(knowledge::NO_STAKEHOLDERS, 80, &[Source::ProjectData]);
    }
    let mut out = String::from("👥 **Project Stakeholders**:\n\n");
    for s in &people {
        let marker = if s.status.as_deref() == Some("approved") {
            "✅"
        } else {
            "⏳"
        };
        out.push_str(&format!("{marker} **{}**: {}\n", s.role, s.name));
    }
    Reply::new(out.trim_end(), 95, &[Source::ProjectData])
}

fn project_progress(input: &StrategyInput) -> Reply {
    let (name, progress) = match input.project() {
        Some(f) => (f.project.name.as_str(), f.progress),
        None => (
            "Unknown",
            Progress {
                total_phases: usize::from(PHASE_COUNT),
                ..Progress::default()
            },
        ),
    };
    let percent = progress.percent();
    let mut out = format!(
        "📊 **Project Progress: {name}**\n\n\
         **Overall Progress**: {percent}% ({}/{} phases completed)\n\n\
         **Phase Status**:\n\
         - ✅ Completed: {}\n\
         - 🔄 In Progress: {}\n\
         - ⏳ Pending: {}\n\n",
        progress.completed,
        progress.total_phases,
        progress.completed,
        progress.in_progress,
        progress.pending
    );
    out.push_str(if percent < 30 {
        "🚀 You're just getting started! Focus on completing Phase 1 first."
    } else if percent < 70 {
        "💪 Good progress! Keep the momentum going."
    } else {
        "🎉 Almost there! You're in the final stretch."
    });
    Reply::new(out, 95, &[Source::ProjectData])
}

fn project_menu(input: &StrategyInput) -> Reply {
    let name = input
        .project()
        .map(|f| f.project.name.as_str())
        .unwrap_or("this project");
    let mut out = knowledge::project_menu(name);
    append_related(&mut out, &input.context.snippets);
    Reply::new(out, 75, &[Source::GeneralAi, Source::ProjectData])
}

fn append_related(out: &mut String, snippets: &[String]) {
    if snippets.is_empty() {
        return;
    }
    out.push_str("\n\n**Related notes**:\n");
    for s in snippets.iter().take(REQUIREMENT_SNIPPETS) {
        out.push_str(&format!("- {}\n", preview(s)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StructuredFacts;

    fn unavailable() -> ContextPayload {
        ContextPayload::new(
            StructuredFacts::Unavailable {
                error: "project not found: 7".into(),
            },
            Vec::new(),
        )
    }

    fn render(
        strategy: fn(&StrategyInput) -> Reply,
        scope: Scope,
        query: &str,
        history: &[ConversationTurn],
        context: &ContextPayload,
    ) -> Reply {
        strategy(&StrategyInput {
            scope: &scope,
            query,
            history,
            context,
        })
    }

    #[test]
    fn table_covers_every_enumerated_pair_once() {
        let table = table();
        for &kind in ScopeKind::all() {
            for &intent in Intent::for_scope(kind) {
                let hits = table.iter().filter(|(key, _)| *key == (kind, intent)).count();
                assert_eq!(hits, 1, "{kind}/{intent}");
            }
        }
        let expected: usize = ScopeKind::all().iter().map(|k| Intent::for_scope(*k).len()).sum();
        assert_eq!(table.len(), expected);
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "é".repeat(300);
        let p = preview(&long);
        assert_eq!(p.chars().count(), SNIPPET_PREVIEW_CHARS + 3);
        assert!(preview("short").ends_with("short..."));
    }

    #[test]
    fn follow_up_without_user_turn_asks_for_detail() {
        let ctx = unavailable();
        let history = vec![ConversationTurn::assistant("hello")];
        let reply = render(follow_up, Scope::Dashboard, "yes", &history, &ctx);
        assert_eq!(reply.confidence_score, 50);
        assert_eq!(reply.sources, vec![Source::Context]);
    }

    #[test]
    fn follow_up_after_approval_question_navigates() {
        let ctx = unavailable();
        let history = vec![
            ConversationTurn::user("what approvals are pending?"),
            ConversationTurn::assistant("You have 2 approvals..."),
        ];
        let reply = render(follow_up, Scope::Dashboard, "yes please", &history, &ctx);
        assert_eq!(reply.confidence_score, 90);
        assert!(reply.response.contains("Approval Center"));
    }

    #[test]
    fn follow_up_backlog_means_phase_two() {
        let ctx = unavailable();
        let history = vec![ConversationTurn::user("start a new project")];
        let reply = render(follow_up, Scope::Dashboard, "ok, the backlog", &history, &ctx);
        assert_eq!(reply.confidence_score, 95);
        assert!(reply.response.contains("Phase 2: Planning & Product Backlog"));
    }

    #[test]
    fn approvals_without_facts_do_not_claim_an_empty_queue() {
        let ctx = unavailable();
        let reply = render(approvals, Scope::Dashboard, "what approvals are pending?", &[], &ctx);
        assert_eq!(reply.response, knowledge::APPROVALS_UNAVAILABLE);
        assert_eq!(reply.confidence_score, 75);
        assert!(!reply.response.contains("No Pending Approvals"));
    }

    #[test]
    fn unavailable_project_degrades_to_no_data_texts() {
        let ctx = unavailable();
        let scope = Scope::Project { project_id: 7 };
        let progress = render(project_progress, scope, "status", &[], &ctx);
        assert!(progress.response.contains("0% (0/6 phases completed)"));
        let menu = render(project_menu, scope, "hi", &[], &ctx);
        assert!(menu.response.contains("**this project**"));
        let guide = render(phase_guidance, scope, "next step", &[], &ctx);
        assert_eq!(guide.confidence_score, 50);
    }
}
