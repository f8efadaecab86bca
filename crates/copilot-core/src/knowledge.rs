//! Fixed SDLC guidance texts served by the templated reply strategies.

use crate::catalog::{self, PHASES};

pub const CLARIFY: &str =
    "I'd be happy to help! Could you please provide more details about what you'd like to know?";

pub const NEED_PHASE: &str =
    "I need to know which phase you're in to provide guidance. Could you specify the phase?";

pub const NO_PENDING_APPROVALS: &str = "✅ **No Pending Approvals**

Great news! You don't have any approvals waiting for your review at the moment.

All project phases are either in progress or already approved.";

pub const APPROVALS_UNAVAILABLE: &str = "I don't have approval data yet.

I couldn't read the project records just now, so I can't tell whether anything is waiting for your review. Please try again in a moment, or open the **\"Approval Center\"** to check directly.";

pub const APPROVAL_STEPS: &str = "**To review and approve:**
1. Click on **\"Approval Center\"** in the sidebar
2. Review the phase submissions
3. Click **\"Approve\"** or **\"Reject\"** with comments

**What you can review:**
- Requirements & Business Analysis (Phase 1)
- Planning & Product Backlog (Phase 2)
- Architecture & High-Level Design (Phase 3)
- And other phase submissions";

pub const NO_REQUIREMENTS: &str = "I don't have specific requirement information yet.

To add requirements:
1. Go to Phase 1: Requirements & Business Analysis
2. Upload requirement documents or add manually
3. Use \"Extract with AI\" to convert to Gherkin format

Once requirements are added, I'll be able to search and answer questions about them!";

pub const NO_RISKS: &str = "No risks have been identified yet.

To analyze risks:
1. Go to Phase 1: Requirements & Business Analysis
2. Click \"Analyze Risks with AI\"
3. Review and approve identified risks

AI will analyze your requirements and suggest potential risks and mitigation strategies.";

pub const NO_STAKEHOLDERS: &str = "No stakeholders have been added yet.

To add stakeholders:
1. Go to Phase 1: Requirements & Business Analysis
2. Click \"Select from Database\" or \"Add Custom Stakeholder\"
3. Choose approvers for this phase

Stakeholders will be notified when you submit for approval.";

pub const DASHBOARD_MENU: &str = "I'm here to help you manage your SDLC projects!

**I can help you with**:
- 📊 Project status and progress
- 📋 Creating new projects
- ✅ Checking approvals
- 📈 Viewing statistics

**Try asking**:
- \"How many projects are there?\"
- \"Show me active projects\"
- \"How do I create a new project?\"
- \"What approvals are pending?\"

Or click on a project to get project-specific guidance!";

pub fn project_menu(project_name: &str) -> String {
    format!(
        "I'm here to help you with **{project_name}**!

**I can help you with**:
- 🎯 Phase guidance and next steps
- 📋 Requirements and features
- 🚨 Risk analysis
- 👥 Stakeholder information
- 📊 Project progress

**Try asking**:
- \"What should I do next?\"
- \"Show me the requirements\"
- \"What are the risks?\"
- \"Who are the stakeholders?\"
- \"What's the project status?\"

I'm learning about your project as you add more information!"
    )
}

/// Approval Center directions, offered after a confirmed approval question.
pub fn approval_navigation() -> String {
    format!("📋 **Opening the Approval Center**\n\n{APPROVAL_STEPS}")
}

/// Step-by-step project creation guide listing every catalog phase.
pub fn creation_guide() -> String {
    let mut out = String::from(
        "🚀 **Creating a New Project**

To create a new project, follow these steps:

1. Click the **\"+ New Project\"** button in the top right
2. Fill in the project details:
   - Project Name
   - Description
   - Select team members
3. Click **\"Create Project\"**

The system will automatically:
",
    );
    out.push_str(&format!("- Create all {} SDLC phases\n", catalog::PHASE_COUNT));
    out.push_str("- Set up approval workflows\n- Initialize AI assistance\n\n");
    out.push_str(&format!("**The {} phases are**:\n", catalog::PHASE_COUNT));
    for def in &PHASES {
        out.push_str(&format!("{}. {}\n", def.number, def.name));
    }
    out.push_str("\nWould you like me to guide you through any specific phase?");
    out
}

const PHASE_GUIDES: [&str; 6] = [
    "📋 **Phase 1: Requirements & Business Analysis**

**Next Steps**:
1. ✅ **Upload Documents**: Add requirement files (Excel, Word, Text)
2. ✅ **Extract with AI**: Convert documents to Gherkin format
3. ✅ **Review Requirements**: Expand each requirement to see scenarios
4. ✅ **Generate PRD**: Draft the product requirements document
5. ✅ **Generate BRD**: Draft the business requirements document
6. ✅ **Analyze Risks**: Record risks with severity and mitigation
7. ✅ **Add Stakeholders**: Select approvers for the phase
8. ✅ **Submit for Approval**: Once all documents are ready

**Tips**:
- Be detailed in requirements for better AI conversion
- Approve requirements before generating PRD/BRD
- Export requirements as .feature files for testing",
    "📊 **Phase 2: Planning & Product Backlog**

**Next Steps**:
1. Convert requirements to Epics
2. Break down Epics into User Stories
3. Estimate story points
4. Prioritize backlog
5. Plan sprints
6. Submit for approval

**Tips**:
- Use AI to generate user stories from requirements
- Follow INVEST criteria for user stories
- Consider dependencies between stories",
    "🏗️ **Phase 3: Architecture & High-Level Design**

**Next Steps**:
1. Define system architecture
2. Create component diagrams
3. Design data flow
4. Plan infrastructure
5. Document technical decisions
6. Submit for approval

**Tips**:
- Consider scalability and performance
- Document architectural decisions (ADRs)
- Review with technical leads",
    "📐 **Phase 4: Detailed Design & Specifications**

**Next Steps**:
1. Create detailed component designs
2. Design database schema
3. Define API contracts
4. Write technical specifications
5. Create sequence diagrams
6. Submit for approval

**Tips**:
- Be specific about interfaces
- Document edge cases
- Include error handling",
    "💻 **Phase 5: Development, Testing & Code Review**

**Next Steps**:
1. Implement features
2. Write unit tests
3. Conduct code reviews
4. Run integration tests
5. Fix bugs and issues
6. Submit for QA approval

**Tips**:
- Follow coding standards
- Write tests first (TDD)
- Review code thoroughly",
    "🚀 **Phase 6: Deployment, Release & Operations**

**Next Steps**:
1. Prepare deployment plan
2. Set up CI/CD pipeline
3. Deploy to staging
4. Run smoke tests
5. Deploy to production
6. Monitor and support

**Tips**:
- Have rollback plan ready
- Monitor metrics closely
- Document deployment process",
];

/// Next steps and tips for phase `number` (1..=6).
pub fn phase_guide(number: u8) -> Option<&'static str> {
    let idx = usize::from(number).checked_sub(1)?;
    PHASE_GUIDES.get(idx).copied()
}

const PLANNING_WALKTHROUGH: &str = "📊 **Phase 2: Planning & Product Backlog**

After creating your project, Phase 2 involves:

**Key Activities:**
1. **Generate Epics** - High-level business features
2. **Create User Stories** - Detailed requirements from user perspective
3. **Resource Planning** - Calculate team capacity and sprints
4. **Submit for Approval** - Send backlog for stakeholder review

**How to work in Phase 2:**
1. Go to your project page
2. Navigate to **\"Phase 2: Planning & Product Backlog\"**
3. Click **\"Generate Epics\"** (AI will create them)
4. Click **\"Generate User Stories\"** for each epic
5. Review and edit as needed
6. Click **\"Calculate Capacity\"** for resource planning
7. Click **\"Submit Phase 2 for Approval\"**

**AI Features:**
- Auto-generates epics from Phase 1 requirements
- Creates realistic user stories (2-10 per epic)
- Estimates story points and complexity
- Confidence scoring for quality assurance

Ready to start working on Phase 2?";

/// Walkthrough offered after a project-creation question names a phase.
/// Phase 2 has a dedicated walkthrough; the others reuse their guide.
pub fn walkthrough(number: u8) -> Option<String> {
    match number {
        2 => Some(PLANNING_WALKTHROUGH.to_string()),
        n => {
            let def = catalog::definition(n)?;
            let guide = phase_guide(n)?;
            Some(format!(
                "{guide}\n\n**Deliverables**: {}\n**Approvers**: {}",
                def.deliverables.join(", "),
                def.approvers.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_guide_lists_every_phase() {
        let guide = creation_guide();
        for def in &PHASES {
            assert!(guide.contains(def.name), "missing {}", def.name);
        }
        assert!(guide.ends_with("Would you like me to guide you through any specific phase?"));
    }

    #[test]
    fn phase_guides_cover_one_to_six() {
        assert!(phase_guide(0).is_none());
        assert!(phase_guide(7).is_none());
        for n in 1..=6u8 {
            assert!(phase_guide(n).unwrap().contains(&format!("Phase {n}:")));
        }
    }

    #[test]
    fn walkthrough_for_planning_is_detailed() {
        let text = walkthrough(2).unwrap();
        assert!(text.contains("Phase 2: Planning & Product Backlog"));
        assert!(text.contains("Generate Epics"));
        assert!(walkthrough(3).unwrap().contains("Security Plan"));
        assert!(walkthrough(9).is_none());
    }

    #[test]
    fn project_menu_names_project() {
        assert!(project_menu("Atlas").contains("**Atlas**"));
    }
}
