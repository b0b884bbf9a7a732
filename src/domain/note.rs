use serde::{Deserialize, Serialize};

use super::{require_text, Editable, Entity, Family};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StrategyNote {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub last_modified: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Entity for StrategyNote {
    const FAMILY: Family = Family::Notes;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Editable for StrategyNote {
    type Draft = NewNote;
    type Patch = NotePatch;

    fn validate_draft(draft: &NewNote) -> Result<(), String> {
        require_text("note title", &draft.title)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}
