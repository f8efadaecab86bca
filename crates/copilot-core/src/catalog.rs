//! The fixed table of SDLC phases every project moves through.

use crate::phase::PhaseReview;

pub const PHASE_COUNT: u8 = 6;

#[derive(Debug, Clone, Copy)]
pub struct PhaseDefinition {
    pub number: u8,
    pub name: &'static str,
    pub description: &'static str,
    pub key_activities: &'static [&'static str],
    pub deliverables: &'static [&'static str],
    pub approvers: &'static [&'static str],
}

impl PhaseDefinition {
    /// Review data a freshly created phase starts with.
    pub fn seed_review(&self) -> PhaseReview {
        PhaseReview {
            description: self.description.to_string(),
            key_activities: to_owned(self.key_activities),
            deliverables: to_owned(self.deliverables),
            approvers: to_owned(self.approvers),
            risks: Vec::new(),
            stakeholders: Vec::new(),
        }
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub const PHASES: [PhaseDefinition; PHASE_COUNT as usize] = [
    PhaseDefinition {
        number: 1,
        name: "Requirements & Business Analysis",
        description: "Define what to build",
        key_activities: &[
            "Requirements Collection",
            "PRD/BRD Creation",
            "Feasibility Analysis",
            "Risk Assessment",
        ],
        deliverables: &["PRD", "BRD", "Risk Assessment"],
        approvers: &["BR Owner", "Product Owner", "Business Stakeholders"],
    },
    PhaseDefinition {
        number: 2,
        name: "Planning & Product Backlog",
        description: "Plan how much and when",
        key_activities: &[
            "Effort Estimation",
            "Backlog Creation",
            "Sprint Planning",
            "Resource Allocation",
        ],
        deliverables: &["Product Backlog", "Sprint Plan", "Release Roadmap"],
        approvers: &["Project Manager", "Product Owner", "Technical Lead"],
    },
    PhaseDefinition {
        number: 3,
        name: "Architecture & High-Level Design",
        description: "Design the overall system",
        key_activities: &[
            "System Architecture",
            "Infrastructure Design",
            "Security Architecture",
            "API Architecture",
        ],
        deliverables: &[
            "Architecture Document",
            "Infrastructure Blueprint",
            "Security Plan",
        ],
        approvers: &[
            "Solution Architect",
            "Technical Architect",
            "Security Architect",
        ],
    },
    PhaseDefinition {
        number: 4,
        name: "Detailed Design & Specifications",
        description: "Create detailed specifications",
        key_activities: &["Database Design", "API Design", "UX/UI Design", "FSD Creation"],
        deliverables: &["DB Schema", "API Specs", "FSD", "UX/UI Designs"],
        approvers: &[
            "Technical Lead",
            "Backend Architect",
            "Frontend Architect",
            "UX Designer",
        ],
    },
    PhaseDefinition {
        number: 5,
        name: "Development, Testing & Code Review",
        description: "Build and test the software",
        key_activities: &[
            "Backend Development",
            "Frontend Development",
            "Unit Testing",
            "Integration Testing",
            "QA",
            "UAT",
        ],
        deliverables: &["Working Software", "Test Reports", "Code Coverage Reports"],
        approvers: &["Technical Lead", "Senior Dev", "QA Lead", "Security Team"],
    },
    PhaseDefinition {
        number: 6,
        name: "Deployment, Release & Operations",
        description: "Release to production and monitor",
        key_activities: &[
            "Staging Deployment",
            "Production Deployment",
            "Monitoring Setup",
            "Documentation",
        ],
        deliverables: &[
            "Deployed Application",
            "Monitoring Dashboard",
            "Documentation",
        ],
        approvers: &["DevOps Lead", "Technical Lead", "Product Owner"],
    },
];

pub fn definition(number: u8) -> Option<&'static PhaseDefinition> {
    PHASES.iter().find(|p| p.number == number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_are_numbered_in_order() {
        for (i, def) in PHASES.iter().enumerate() {
            assert_eq!(def.number as usize, i + 1);
        }
    }

    #[test]
    fn definition_lookup_is_bounded() {
        assert!(definition(0).is_none());
        assert_eq!(definition(2).unwrap().name, "Planning & Product Backlog");
        assert!(definition(7).is_none());
    }

    #[test]
    fn seed_review_copies_catalog_lists() {
        let review = definition(1).unwrap().seed_review();
        assert_eq!(review.deliverables, vec!["PRD", "BRD", "Risk Assessment"]);
        assert!(review.risks.is_empty());
    }
}
