use serde::{Deserialize, Serialize};

use super::{require_text, string_enum, Editable, Entity, Family};

string_enum!(AlertType, "alert type", {
    TaskDue => "task_due",
    StatusChange => "status_change",
    NewAirdrop => "new_airdrop",
    Info => "info",
});

impl AlertType {
    pub fn label(self) -> &'static str {
        match self {
            AlertType::TaskDue => "Task due",
            AlertType::StatusChange => "Status change",
            AlertType::NewAirdrop => "New airdrop",
            AlertType::Info => "Info",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserAlert {
    pub id: String,
    pub alert_type: AlertType,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub date: String,
}

impl Entity for UserAlert {
    const FAMILY: Family = Family::Alerts;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Editable for UserAlert {
    type Draft = NewAlert;
    type Patch = AlertPatch;

    fn validate_draft(draft: &NewAlert) -> Result<(), String> {
        require_text("alert message", &draft.message)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub alert_type: AlertType,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub date: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AlertPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
