use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::{require_text, string_enum, Editable, Entity, Family};

string_enum!(
    /// Public lifecycle stage of the airdrop itself.
    ProjectStatus, "project status", {
        Rumored => "rumored",
        Confirmed => "confirmed",
        Testnet => "testnet",
        Mainnet => "mainnet",
        Ended => "ended",
    }
);

string_enum!(
    /// The user's own participation stage, independent of `ProjectStatus`.
    MyStatus, "personal status", {
        NotStarted => "not_started",
        InProgress => "in_progress",
        Completed => "completed",
        Abandoned => "abandoned",
    }
);

string_enum!(Priority, "priority", {
    Low => "low",
    Medium => "medium",
    High => "high",
});

impl MyStatus {
    pub fn label(self) -> &'static str {
        match self {
            MyStatus::NotStarted => "not started",
            MyStatus::InProgress => "in progress",
            MyStatus::Completed => "completed",
            MyStatus::Abandoned => "abandoned",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub chain: String,
    pub status: ProjectStatus,
    pub my_status: MyStatus,
    pub priority: Priority,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_wallet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub sub_tasks: Vec<Task>,
}

impl Task {
    /// `completed` holds exactly when a non-empty completion date is present.
    pub fn has_consistent_completion(&self) -> bool {
        let dated = self
            .completion_date
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty());
        self.completed == dated
    }
}

impl Entity for Project {
    const FAMILY: Family = Family::Projects;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Editable for Project {
    type Draft = NewProject;
    type Patch = ProjectPatch;

    fn validate_draft(draft: &NewProject) -> Result<(), String> {
        require_text("project name", &draft.name)?;
        require_text("project chain", &draft.chain)?;
        for task in &draft.tasks {
            require_text("task description", &task.description)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub chain: String,
    pub status: ProjectStatus,
    pub my_status: MyStatus,
    pub priority: Priority,
    pub notes: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub tasks: Vec<NewTask>,
}

impl NewProject {
    pub fn named(name: &str, chain: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            chain: chain.trim().to_string(),
            status: ProjectStatus::Rumored,
            my_status: MyStatus::NotStarted,
            priority: Priority::Medium,
            notes: String::new(),
            tags: Vec::new(),
            website: None,
            tasks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_wallet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_status: Option<MyStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// Completion edit for a task. The flag and the date travel together, so a
/// patch can never mark a task done without a date or open with one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Done { at: String },
    Open,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub linked_wallet_id: Option<String>,
    pub notes: Option<String>,
    pub completion: Option<Completion>,
}

impl TaskPatch {
    pub fn completed(done: bool, now: &str) -> Self {
        let completion = if done {
            Completion::Done { at: now.to_string() }
        } else {
            Completion::Open
        };
        Self {
            completion: Some(completion),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.due_date.is_none()
            && self.linked_wallet_id.is_none()
            && self.notes.is_none()
            && self.completion.is_none()
    }
}

impl Serialize for TaskPatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(description) = &self.description {
            map.serialize_entry("description", description)?;
        }
        if let Some(due_date) = &self.due_date {
            map.serialize_entry("dueDate", due_date)?;
        }
        if let Some(wallet_id) = &self.linked_wallet_id {
            map.serialize_entry("linkedWalletId", wallet_id)?;
        }
        if let Some(notes) = &self.notes {
            map.serialize_entry("notes", notes)?;
        }
        match &self.completion {
            Some(Completion::Done { at }) => {
                map.serialize_entry("completed", &true)?;
                map.serialize_entry("completionDate", at)?;
            }
            Some(Completion::Open) => {
                map.serialize_entry("completed", &false)?;
                map.serialize_entry("completionDate", &Option::<String>::None)?;
            }
            None => {}
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Task, TaskPatch};

    #[test]
    fn completion_patch_always_pairs_flag_and_date() {
        let done = serde_json::to_value(TaskPatch::completed(true, "2026-10-01T09:00:00Z"))
            .expect("patch should serialize");
        assert_eq!(
            done,
            json!({ "completed": true, "completionDate": "2026-10-01T09:00:00Z" })
        );

        let open = serde_json::to_value(TaskPatch::completed(false, "2026-10-01T09:00:00Z"))
            .expect("patch should serialize");
        assert_eq!(open, json!({ "completed": false, "completionDate": null }));
    }

    #[test]
    fn task_patch_omits_untouched_fields() {
        let patch = TaskPatch {
            notes: Some("bridge first".to_string()),
            ..TaskPatch::default()
        };
        let value = serde_json::to_value(&patch).expect("patch should serialize");
        assert_eq!(value, json!({ "notes": "bridge first" }));
        assert!(!patch.is_empty());
        assert!(TaskPatch::default().is_empty());
    }

    #[test]
    fn consistency_check_rejects_unpaired_completion() {
        let task: Task = serde_json::from_value(json!({
            "id": "t-1",
            "description": "Swap on the DEX",
            "completed": true
        }))
        .expect("task should parse");
        assert!(!task.has_consistent_completion());

        let open: Task = serde_json::from_value(json!({
            "id": "t-2",
            "description": "Bridge",
        }))
        .expect("task should parse");
        assert!(open.has_consistent_completion());
        assert!(open.sub_tasks.is_empty());
    }
}
