use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_chain: Option<String>,
    #[serde(default = "default_reminder_lead_days")]
    pub reminder_lead_days: u32,
    #[serde(default)]
    pub compact_lists: bool,
    #[serde(default = "default_theme")]
    pub theme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_chain: None,
            reminder_lead_days: default_reminder_lead_days(),
            compact_lists: false,
            theme: default_theme(),
        }
    }
}

fn default_reminder_lead_days() -> u32 {
    1
}

fn default_theme() -> String {
    "system".to_string()
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_chain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_lead_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compact_lists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}
