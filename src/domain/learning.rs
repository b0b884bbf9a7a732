use serde::{Deserialize, Serialize};

use super::{string_enum, Entity, Family};

string_enum!(ResourceKind, "resource kind", {
    Guide => "guide",
    Glossary => "glossary",
    NewsSummary => "news_summary",
});

/// Read-only reference content curated on the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LearningResource {
    pub id: String,
    pub kind: ResourceKind,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Entity for LearningResource {
    const FAMILY: Family = Family::Learning;

    fn id(&self) -> &str {
        &self.id
    }
}
