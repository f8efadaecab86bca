//! PRD and BRD drafting from phase-1 requirements.

use std::fmt;

use serde::Serialize;

use crate::error::CopilotError;
use crate::llm::Completer;
use crate::phase::Requirement;
use crate::project::Project;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Prd,
    Brd,
}

impl DocumentKind {
    /// Field of phase-1 data the document is saved under.
    pub fn key(self) -> &'static str {
        match self {
            DocumentKind::Prd => "prd",
            DocumentKind::Brd => "brd",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DocumentKind::Prd => "Product Requirements Document (PRD)",
            DocumentKind::Brd => "Business Requirements Document (BRD)",
        }
    }

    fn system_prompt(self) -> &'static str {
        match self {
            DocumentKind::Prd => {
                "You are an expert Product Manager who creates comprehensive PRDs. \
                 Write in markdown format."
            }
            DocumentKind::Brd => {
                "You are an expert Business Analyst who creates comprehensive BRDs. \
                 Write in markdown format focusing on business value."
            }
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = CopilotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prd" => Ok(DocumentKind::Prd),
            "brd" => Ok(DocumentKind::Brd),
            _ => Err(CopilotError::InvalidDocumentKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDocument {
    pub kind: DocumentKind,
    pub content: String,
    pub confidence_score: u8,
    /// The deterministic template was used instead of a model.
    pub fallback: bool,
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

const PRD_SECTIONS: &[&str] = &[
    "**Executive Summary**: Overview and objectives",
    "**Product Overview**: What is being built and why",
    "**Target Users**: Who will use this product",
    "**User Personas**: 2-3 detailed personas based on requirements",
    "**Feature Requirements**: Each feature with user stories and acceptance criteria from scenarios",
    "**Functional Requirements**: System capabilities",
    "**Non-Functional Requirements**: Performance, security, scalability",
    "**User Experience**: UI/UX considerations",
    "**Technical Considerations**: Tech stack suggestions",
    "**Success Metrics**: KPIs and measurement criteria",
    "**Timeline & Phases**: Suggested development phases",
    "**Risks & Mitigations**: Potential challenges",
];

const BRD_SECTIONS: &[&str] = &[
    "**Executive Summary**: Business case and objectives",
    "**Business Context**: Industry, market, and competitive landscape",
    "**Business Objectives**: Clear, measurable goals (SMART)",
    "**Stakeholders**: Key stakeholders and their interests",
    "**Scope**: In-scope and out-of-scope items based on requirements",
    "**Business Requirements**: High-level needs grouped by capability and linked to business value",
    "**Functional Requirements**: Detailed functionality needed",
    "**Business Rules**: Rules and constraints",
    "**Assumptions & Dependencies**: What we're assuming, what we depend on",
    "**Success Criteria**: How we measure success",
    "**Timeline & Budget**: High-level estimates",
    "**Risk Analysis**: Business risks and mitigation strategies",
    "**Approval & Sign-off**: Stakeholder approval process",
];

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

/// Numbered requirement digest shared by prompts and fallbacks.
pub fn requirement_summary(kind: DocumentKind, requirements: &[Requirement]) -> String {
    let mut out = String::new();
    for (i, r) in requirements.iter().enumerate() {
        let feature = or_default(&r.feature, "Feature");
        let as_a = or_default(&r.as_a, "user");
        match kind {
            DocumentKind::Prd => {
                out.push_str(&format!("\n{}. **{feature}**\n", i + 1));
                out.push_str(&format!("   - As a {as_a}, I want {}\n", r.i_want));
                out.push_str(&format!("   - So that {}\n", r.so_that));
                out.push_str(&format!("   - Priority: {}\n", r.priority));
                if !r.scenarios.is_empty() {
                    out.push_str(&format!("   - Scenarios: {}\n", r.scenarios.len()));
                }
            }
            DocumentKind::Brd => {
                out.push_str(&format!("\n{}. **{feature}** (Priority: {})\n", i + 1, r.priority));
                out.push_str(&format!("   - User Story: As a {as_a}, I want {}\n", r.i_want));
                out.push_str(&format!("   - Business Value: {}\n", r.so_that));
            }
        }
    }
    out
}

pub fn prompt(kind: DocumentKind, project: &Project, requirements: &[Requirement]) -> String {
    let (role, sections, focus) = match kind {
        DocumentKind::Prd => (
            "Product Manager",
            PRD_SECTIONS,
            "Make it specific to the extracted requirements.",
        ),
        DocumentKind::Brd => (
            "Business Analyst",
            BRD_SECTIONS,
            "Focus on business value and strategic alignment.",
        ),
    };
    let mut out = format!(
        "You are an expert {role}. Generate a comprehensive {} based on the following \
         extracted requirements.\n\n**Project**: {}\n\n**Extracted Requirements**:\n{}\n\n\
         **Sections**:\n",
        kind.title(),
        project.name,
        requirement_summary(kind, requirements)
    );
    for (i, section) in sections.iter().enumerate() {
        out.push_str(&format!("{}. {section}\n", i + 1));
    }
    out.push_str(&format!(
        "\nUse the actual requirement details above, not generic placeholders. {focus}\n\
         Return the complete document in markdown."
    ));
    out
}

/// Deterministic document used when no model is available.
pub fn fallback(kind: DocumentKind, project: &Project, requirements: &[Requirement]) -> String {
    let mut out = format!("# {}\n\n## Project: {}\n\n", kind.title(), project.name);
    out.push_str(&format!(
        "**Note**: This is a template {}. Configure a language model and regenerate for a \
         complete document.\n\n",
        kind.key().to_uppercase()
    ));
    out.push_str(&format!(
        "## 1. Overview\n{}\n\n",
        or_default(&project.description, "Description to be added")
    ));
    out.push_str("## 2. Requirements\n");
    if requirements.is_empty() {
        out.push_str(
            "No requirements have been collected yet. Please complete Phase 1 \
             (Requirements & Business Analysis) first.\n",
        );
    } else {
        out.push_str(&requirement_summary(kind, requirements));
    }
    out
}

/// Draft a document. A model answer scores 85; the template scores 60.
pub async fn generate(
    kind: DocumentKind,
    project: &Project,
    requirements: &[Requirement],
    completer: Option<&dyn Completer>,
) -> GeneratedDocument {
    if let Some(completer) = completer {
        let text = prompt(kind, project, requirements);
        match completer.complete(Some(kind.system_prompt()), &text).await {
            Ok(content) => {
                tracing::info!(%kind, project_id = project.id, requirements = requirements.len(), "document generated");
                return GeneratedDocument {
                    kind,
                    content,
                    confidence_score: 85,
                    fallback: false,
                };
            }
            Err(e) => tracing::warn!(error = %e, %kind, "document generation failed; using template"),
        }
    }
    GeneratedDocument {
        kind,
        content: fallback(kind, project, requirements),
        confidence_score: 60,
        fallback: true,
    }
}
