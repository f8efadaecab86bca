use crate::rules::{dashboard_rules, follow_up_detected, project_rules};
use crate::types::{ConversationTurn, Intent, Scope, ScopeKind};

// ---------------------------------------------------------------------------
// Utterance
// ---------------------------------------------------------------------------

/// A query prepared for rule evaluation.
pub struct Utterance<'a> {
    pub lower: String,
    pub tokens: usize,
    pub history: &'a [ConversationTurn],
}

impl<'a> Utterance<'a> {
    pub fn new(query: &str, history: &'a [ConversationTurn]) -> Self {
        Self {
            lower: query.to_lowercase(),
            tokens: query.split_whitespace().count(),
            history,
        }
    }

    /// Case-insensitive substring membership of any of `words`.
    pub fn mentions_any(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.lower.contains(w))
    }

    pub fn mentions(&self, word: &str) -> bool {
        self.lower.contains(word)
    }
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// A fn-pointer keyword rule. `condition` receives the rule itself so shared
/// predicates can read its keyword set.
pub struct Rule {
    pub id: &'static str,
    pub intent: Intent,
    pub keywords: &'static [&'static str],
    pub condition: fn(&Utterance, &Rule) -> bool,
}

impl Rule {
    pub fn matches(&self, u: &Utterance) -> bool {
        (self.condition)(u, self)
    }
}

// ---------------------------------------------------------------------------
// IntentClassifier
// ---------------------------------------------------------------------------

/// Maps a query to one intent. Must be pure: no I/O, no hidden state.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, query: &str, scope: &Scope, history: &[ConversationTurn]) -> Intent;
}

/// Priority-ordered keyword classifier. First matching rule wins; no match
/// resolves to the scope's general intent.
pub struct KeywordClassifier {
    dashboard: Vec<Rule>,
    project: Vec<Rule>,
}

impl KeywordClassifier {
    pub fn new(dashboard: Vec<Rule>, project: Vec<Rule>) -> Self {
        Self { dashboard, project }
    }

    pub fn rules_for(&self, kind: ScopeKind) -> &[Rule] {
        match kind {
            ScopeKind::Dashboard => &self.dashboard,
            ScopeKind::Project => &self.project,
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(dashboard_rules(), project_rules())
    }
}

impl IntentClassifier for KeywordClassifier {
    fn classify(&self, query: &str, scope: &Scope, history: &[ConversationTurn]) -> Intent {
        let kind = scope.kind();
        let u = Utterance::new(query, history);
        let rules = self.rules_for(kind);

        if !history.is_empty() && follow_up_detected(&u, kind) {
            tracing::trace!(scope = %kind, "classified as follow-up");
            return Intent::FollowUp;
        }

        for rule in rules {
            if rule.matches(&u) {
                tracing::trace!(rule = rule.id, intent = %rule.intent, "rule matched");
                return rule.intent;
            }
        }
        Intent::general_for(kind)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
