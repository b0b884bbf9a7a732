use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{require_text, string_enum, Editable, Entity, Family};

string_enum!(Cadence, "cadence", {
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
    EveryNDays => "every_n_days",
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTask {
    pub id: String,
    pub name: String,
    pub cadence: Cadence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence_days: Option<u32>,
    pub next_due: String,
    #[serde(default)]
    pub completion_history: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl RecurringTask {
    pub fn cadence_label(&self) -> String {
        match (self.cadence, self.cadence_days) {
            (Cadence::EveryNDays, Some(days)) => format!("every {days} days"),
            (cadence, _) => cadence.as_str().replace('_', " "),
        }
    }

    /// Unparseable due stamps are reported as due so they surface to the user.
    pub fn is_due(&self, now: OffsetDateTime) -> bool {
        match crate::progress::parse_due(&self.next_due) {
            Some(next_due) => next_due <= now,
            None => true,
        }
    }
}

impl Entity for RecurringTask {
    const FAMILY: Family = Family::RecurringTasks;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Editable for RecurringTask {
    type Draft = NewRecurringTask;
    type Patch = RecurringTaskPatch;

    fn validate_draft(draft: &NewRecurringTask) -> Result<(), String> {
        require_text("chore name", &draft.name)?;
        if draft.cadence == Cadence::EveryNDays && draft.cadence_days.unwrap_or(0) == 0 {
            return Err("every_n_days cadence requires a positive day count".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewRecurringTask {
    pub name: String,
    pub cadence: Cadence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadence_days: Option<u32>,
    pub next_due: String,
    pub notes: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadence: Option<Cadence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadence_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_due: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}
