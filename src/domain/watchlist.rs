use serde::{Deserialize, Serialize};

use super::{require_text, string_enum, Editable, Entity, Family};

string_enum!(Confidence, "confidence", {
    Low => "low",
    Medium => "medium",
    High => "high",
});

/// A candidate project that has not been promoted to a tracked project yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub chain: String,
    pub confidence: Confidence,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl Entity for WatchlistItem {
    const FAMILY: Family = Family::Watchlist;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Editable for WatchlistItem {
    type Draft = NewWatchlistItem;
    type Patch = WatchlistPatch;

    fn validate_draft(draft: &NewWatchlistItem) -> Result<(), String> {
        require_text("watchlist name", &draft.name)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewWatchlistItem {
    pub name: String,
    pub chain: String,
    pub confidence: Confidence,
    pub notes: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}
