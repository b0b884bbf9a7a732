use serde::{Deserialize, Serialize};

use super::{require_text, Editable, Entity, Family};

/// Reusable task checklist applied when starting a new project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: String,
    pub asset: String,
    pub chain: String,
    #[serde(default)]
    pub protocol: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_date: Option<String>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavedStrategy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<String>,
}

impl Entity for Template {
    const FAMILY: Family = Family::Templates;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Editable for Template {
    type Draft = NewTemplate;
    type Patch = TemplatePatch;

    fn validate_draft(draft: &NewTemplate) -> Result<(), String> {
        require_text("template name", &draft.name)
    }
}

impl Entity for Position {
    const FAMILY: Family = Family::Positions;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Editable for Position {
    type Draft = NewPosition;
    type Patch = PositionPatch;

    fn validate_draft(draft: &NewPosition) -> Result<(), String> {
        require_text("position asset", &draft.asset)?;
        if !draft.amount.is_finite() {
            return Err("position amount must be a finite number".to_string());
        }
        Ok(())
    }
}

impl Entity for SavedStrategy {
    const FAMILY: Family = Family::Strategies;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Editable for SavedStrategy {
    type Draft = NewStrategy;
    type Patch = StrategyPatch;

    fn validate_draft(draft: &NewStrategy) -> Result<(), String> {
        require_text("strategy name", &draft.name)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    pub name: String,
    pub description: String,
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewPosition {
    pub asset: String,
    pub chain: String,
    pub protocol: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_date: Option<String>,
    pub notes: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PositionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewStrategy {
    pub name: String,
    pub description: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StrategyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<String>>,
}
