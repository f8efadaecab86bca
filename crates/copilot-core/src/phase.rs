//! Typed per-phase data.
//!
//! Each of the six phases stores a different shape. Every shape shares a
//! [`PhaseReview`] block and adds its own fields. A stored blob that does not
//! fit the shape of its phase number decodes as [`PhaseData::Legacy`] and is
//! written back untouched.

use crate::catalog;
use crate::error::{CopilotError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Severity {
    #[serde(alias = "high", alias = "HIGH")]
    High,
    #[default]
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "low", alias = "LOW")]
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        })
    }
}

impl std::str::FromStr for Severity {
    type Err = CopilotError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            _ => Err(CopilotError::InvalidSeverity(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub risk: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stakeholder {
    pub name: String,
    pub role: String,
    /// Approval state, e.g. `approved` or `pending`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub given: Vec<String>,
    #[serde(default)]
    pub when: Vec<String>,
    #[serde(default)]
    pub then: Vec<String>,
}

/// A requirement in user-story form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub feature: String,
    #[serde(default)]
    pub as_a: String,
    #[serde(default)]
    pub i_want: String,
    #[serde(default)]
    pub so_that: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

fn default_priority() -> String {
    "Medium".to_string()
}

impl Requirement {
    pub fn user_story(&self) -> String {
        format!(
            "As a {}, I want {}, so that {}",
            self.as_a, self.i_want, self.so_that
        )
    }
}

/// Review block present in every typed phase shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseReview {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub key_activities: Vec<String>,
    #[serde(default)]
    pub deliverables: Vec<String>,
    #[serde(default)]
    pub approvers: Vec<String>,
    #[serde(default)]
    pub risks: Vec<Risk>,
    #[serde(default)]
    pub stakeholders: Vec<Stakeholder>,
}

const REVIEW_KEYS: &[&str] = &[
    "description",
    "key_activities",
    "deliverables",
    "approvers",
    "risks",
    "stakeholders",
];

// ---------------------------------------------------------------------------
// Per-phase shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementsData {
    #[serde(flatten)]
    pub review: PhaseReview,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brd: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Epic {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStory {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningData {
    #[serde(flatten)]
    pub review: PhaseReview,
    #[serde(default)]
    pub epics: Vec<Epic>,
    #[serde(default)]
    pub user_stories: Vec<UserStory>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureData {
    #[serde(flatten)]
    pub review: PhaseReview,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(default)]
    pub decisions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailedDesignData {
    #[serde(flatten)]
    pub review: PhaseReview,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_specs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fsd: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentData {
    #[serde(flatten)]
    pub review: PhaseReview,
    #[serde(default)]
    pub test_reports: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_coverage: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentData {
    #[serde(flatten)]
    pub review: PhaseReview,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_plan: Option<String>,
    #[serde(default)]
    pub environments: Vec<String>,
}

fn shape_keys(phase_number: u8) -> Option<&'static [&'static str]> {
    match phase_number {
        1 => Some(&["requirements", "prd", "brd"]),
        2 => Some(&["epics", "user_stories"]),
        3 => Some(&["architecture", "decisions"]),
        4 => Some(&["api_specs", "db_schema", "fsd"]),
        5 => Some(&["test_reports", "code_coverage"]),
        6 => Some(&["deployment_plan", "environments"]),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// PhaseData
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PhaseData {
    Requirements(RequirementsData),
    Planning(PlanningData),
    Architecture(ArchitectureData),
    DetailedDesign(DetailedDesignData),
    Development(DevelopmentData),
    Deployment(DeploymentData),
    Legacy(Value),
}

impl PhaseData {
    /// Empty typed data for `phase_number`, or `Legacy(null)` outside 1..=6.
    pub fn empty(phase_number: u8) -> Self {
        Self::with_review(phase_number, PhaseReview::default())
    }

    /// Typed data seeded from the phase catalog.
    pub fn seeded(phase_number: u8) -> Self {
        match catalog::definition(phase_number) {
            Some(def) => Self::with_review(phase_number, def.seed_review()),
            None => PhaseData::Legacy(Value::Null),
        }
    }

    fn with_review(phase_number: u8, review: PhaseReview) -> Self {
        match phase_number {
            1 => PhaseData::Requirements(RequirementsData {
                review,
                ..Default::default()
            }),
            2 => PhaseData::Planning(PlanningData {
                review,
                ..Default::default()
            }),
            3 => PhaseData::Architecture(ArchitectureData {
                review,
                ..Default::default()
            }),
            4 => PhaseData::DetailedDesign(DetailedDesignData {
                review,
                ..Default::default()
            }),
            5 => PhaseData::Development(DevelopmentData {
                review,
                ..Default::default()
            }),
            6 => PhaseData::Deployment(DeploymentData {
                review,
                ..Default::default()
            }),
            _ => PhaseData::Legacy(Value::Null),
        }
    }

    /// Decode a stored blob against the shape of `phase_number`.
    ///
    /// Objects carrying keys outside the shape, or values that fail to
    /// deserialize, become `Legacy` so no stored field is dropped.
    pub fn decode(phase_number: u8, value: Value) -> Self {
        if value.is_null() {
            return Self::empty(phase_number);
        }
        match Self::decode_typed(phase_number, &value) {
            Some(data) => data,
            None => PhaseData::Legacy(value),
        }
    }

    fn decode_typed(phase_number: u8, value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let extra = shape_keys(phase_number)?;
        let fits = obj
            .keys()
            .all(|k| REVIEW_KEYS.contains(&k.as_str()) || extra.contains(&k.as_str()));
        if !fits {
            return None;
        }
        let v = value.clone();
        let data = match phase_number {
            1 => PhaseData::Requirements(serde_json::from_value(v).ok()?),
            2 => PhaseData::Planning(serde_json::from_value(v).ok()?),
            3 => PhaseData::Architecture(serde_json::from_value(v).ok()?),
            4 => PhaseData::DetailedDesign(serde_json::from_value(v).ok()?),
            5 => PhaseData::Development(serde_json::from_value(v).ok()?),
            6 => PhaseData::Deployment(serde_json::from_value(v).ok()?),
            _ => return None,
        };
        Some(data)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, PhaseData::Legacy(_))
    }

    pub fn review(&self) -> Option<&PhaseReview> {
        match self {
            PhaseData::Requirements(d) => Some(&d.review),
            PhaseData::Planning(d) => Some(&d.review),
            PhaseData::Architecture(d) => Some(&d.review),
            PhaseData::DetailedDesign(d) => Some(&d.review),
            PhaseData::Development(d) => Some(&d.review),
            PhaseData::Deployment(d) => Some(&d.review),
            PhaseData::Legacy(_) => None,
        }
    }

    fn review_mut(&mut self) -> Option<&mut PhaseReview> {
        match self {
            PhaseData::Requirements(d) => Some(&mut d.review),
            PhaseData::Planning(d) => Some(&mut d.review),
            PhaseData::Architecture(d) => Some(&mut d.review),
            PhaseData::DetailedDesign(d) => Some(&mut d.review),
            PhaseData::Development(d) => Some(&mut d.review),
            PhaseData::Deployment(d) => Some(&mut d.review),
            PhaseData::Legacy(_) => None,
        }
    }

    pub fn risks(&self) -> Vec<Risk> {
        match (self.review(), self) {
            (Some(review), _) => review.risks.clone(),
            (None, PhaseData::Legacy(v)) => legacy_list(v, "risks"),
            _ => Vec::new(),
        }
    }

    pub fn stakeholders(&self) -> Vec<Stakeholder> {
        match (self.review(), self) {
            (Some(review), _) => review.stakeholders.clone(),
            (None, PhaseData::Legacy(v)) => legacy_list(v, "stakeholders"),
            _ => Vec::new(),
        }
    }

    pub fn requirements(&self) -> Vec<Requirement> {
        match self {
            PhaseData::Requirements(d) => d.requirements.clone(),
            PhaseData::Legacy(v) => legacy_list(v, "requirements"),
            _ => Vec::new(),
        }
    }

    pub fn add_risk(&mut self, risk: Risk) -> Result<()> {
        match self.review_mut() {
            Some(review) => {
                review.risks.push(risk);
                Ok(())
            }
            None => self.legacy_push("risks", serde_json::to_value(risk)?),
        }
    }

    pub fn add_stakeholder(&mut self, stakeholder: Stakeholder) -> Result<()> {
        match self.review_mut() {
            Some(review) => {
                review.stakeholders.push(stakeholder);
                Ok(())
            }
            None => self.legacy_push("stakeholders", serde_json::to_value(stakeholder)?),
        }
    }

    /// Requirements only live in phase 1 (or a legacy object).
    pub fn add_requirement(&mut self, requirement: Requirement) -> Result<()> {
        match self {
            PhaseData::Requirements(d) => {
                d.requirements.push(requirement);
                Ok(())
            }
            PhaseData::Legacy(_) => {
                self.legacy_push("requirements", serde_json::to_value(requirement)?)
            }
            _ => Err(CopilotError::InvalidPhaseNumber(self.phase_number())),
        }
    }

    /// Set a top-level text field on phase-1 data (`prd`, `brd`).
    pub fn set_document(&mut self, key: &str, content: String) -> Result<()> {
        match self {
            PhaseData::Requirements(d) if key == "prd" => {
                d.prd = Some(content);
                Ok(())
            }
            PhaseData::Requirements(d) if key == "brd" => {
                d.brd = Some(content);
                Ok(())
            }
            PhaseData::Legacy(v) => {
                let obj = legacy_object(v)?;
                obj.insert(key.to_string(), Value::String(content));
                Ok(())
            }
            _ => Err(CopilotError::InvalidPhaseNumber(self.phase_number())),
        }
    }

    /// Phase number implied by the variant; 0 for `Legacy`.
    pub fn phase_number(&self) -> u8 {
        match self {
            PhaseData::Requirements(_) => 1,
            PhaseData::Planning(_) => 2,
            PhaseData::Architecture(_) => 3,
            PhaseData::DetailedDesign(_) => 4,
            PhaseData::Development(_) => 5,
            PhaseData::Deployment(_) => 6,
            PhaseData::Legacy(_) => 0,
        }
    }

    fn legacy_push(&mut self, key: &str, item: Value) -> Result<()> {
        let PhaseData::Legacy(v) = self else {
            return Ok(());
        };
        let obj = legacy_object(v)?;
        match obj.get_mut(key) {
            Some(Value::Array(items)) => items.push(item),
            _ => {
                obj.insert(key.to_string(), Value::Array(vec![item]));
            }
        }
        Ok(())
    }
}

/// Null legacy blobs are promoted to an empty object before editing.
fn legacy_object(v: &mut Value) -> Result<&mut serde_json::Map<String, Value>> {
    if v.is_null() {
        *v = Value::Object(serde_json::Map::new());
    }
    v.as_object_mut()
        .ok_or_else(|| CopilotError::Store("legacy phase data is not an object".to_string()))
}

fn legacy_list<T: serde::de::DeserializeOwned>(v: &Value, key: &str) -> Vec<T> {
    v.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
