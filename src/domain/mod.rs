use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub mod alert;
pub mod learning;
pub mod note;
pub mod portfolio;
pub mod project;
pub mod recurring;
pub mod settings;
pub mod wallet;
pub mod watchlist;

pub use alert::{AlertType, UserAlert};
pub use learning::{LearningResource, ResourceKind};
pub use note::{NewNote, NotePatch, StrategyNote};
pub use portfolio::{Position, SavedStrategy, Template};
pub use project::{
    Completion, MyStatus, NewProject, NewTask, Priority, Project, ProjectPatch, ProjectStatus,
    Task, TaskPatch,
};
pub use recurring::{Cadence, RecurringTask};
pub use settings::{Settings, SettingsPatch};
pub use wallet::{GasLog, NewGasLog, NewTransaction, Wallet, WalletPatch, WalletTransaction};
pub use watchlist::{Confidence, WatchlistItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    Projects,
    Wallets,
    RecurringTasks,
    Notes,
    Alerts,
    Watchlist,
    Templates,
    Positions,
    Strategies,
    Settings,
    Learning,
}

impl Family {
    pub const ALL: [Family; 11] = [
        Family::Projects,
        Family::Wallets,
        Family::RecurringTasks,
        Family::Notes,
        Family::Alerts,
        Family::Watchlist,
        Family::Templates,
        Family::Positions,
        Family::Strategies,
        Family::Settings,
        Family::Learning,
    ];

    /// Stable key used for the local cache and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Family::Projects => "projects",
            Family::Wallets => "wallets",
            Family::RecurringTasks => "recurring_tasks",
            Family::Notes => "notes",
            Family::Alerts => "alerts",
            Family::Watchlist => "watchlist",
            Family::Templates => "templates",
            Family::Positions => "positions",
            Family::Strategies => "strategies",
            Family::Settings => "settings",
            Family::Learning => "learning",
        }
    }

    /// Resource path segment on the remote API.
    pub fn path(self) -> &'static str {
        match self {
            Family::RecurringTasks => "recurring-tasks",
            other => other.as_str(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Family::Projects => "projects",
            Family::Wallets => "wallets",
            Family::RecurringTasks => "recurring tasks",
            Family::Notes => "strategy notes",
            Family::Alerts => "alerts",
            Family::Watchlist => "watchlist",
            Family::Templates => "templates",
            Family::Positions => "positions",
            Family::Strategies => "saved strategies",
            Family::Settings => "settings",
            Family::Learning => "learning resources",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Family {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Family::ALL
            .into_iter()
            .find(|family| family.as_str() == normalized)
            .ok_or_else(|| {
                ParseEnumError::new("family", value, Family::ALL.map(Family::as_str).to_vec())
            })
    }
}

/// A server-identified record belonging to exactly one family.
pub trait Entity: Clone + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    const FAMILY: Family;

    fn id(&self) -> &str;
}

/// An entity the client may create, patch, and delete through the remote.
pub trait Editable: Entity {
    type Draft: Serialize + Send + Sync;
    type Patch: Serialize + Send + Sync;

    fn validate_draft(_draft: &Self::Draft) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
    expected: Vec<&'static str>,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str, expected: Vec<&'static str>) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected,
        }
    }
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid {} '{}': expected one of {}",
            self.kind,
            self.value,
            self.expected.join(", ")
        )
    }
}

impl Error for ParseEnumError {}

pub fn now_utc_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .expect("RFC3339 formatting for UTC timestamp should never fail")
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{field} cannot be empty"))
    } else {
        Ok(())
    }
}

/// Declares a snake_case string enum with `as_str`, `ALL`, `Display` and `FromStr`.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::domain::ParseEnumError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
                $name::ALL
                    .iter()
                    .copied()
                    .find(|item| item.as_str() == normalized)
                    .ok_or_else(|| {
                        let expected = $name::ALL.iter().map(|item| item.as_str()).collect();
                        $crate::domain::ParseEnumError::new($kind, value, expected)
                    })
            }
        }
    };
}

pub(crate) use string_enum;

#[cfg(test)]
mod tests {
    use super::{Family, MyStatus};
    use std::str::FromStr;

    #[test]
    fn family_round_trips_through_cache_key() {
        for family in Family::ALL {
            assert_eq!(Family::from_str(family.as_str()), Ok(family));
        }
        assert_eq!(Family::from_str("recurring-tasks"), Ok(Family::RecurringTasks));
        assert_eq!(Family::RecurringTasks.path(), "recurring-tasks");
    }

    #[test]
    fn string_enums_accept_loose_spelling() {
        assert_eq!(MyStatus::from_str("In Progress"), Ok(MyStatus::InProgress));
        assert_eq!(MyStatus::from_str("not-started"), Ok(MyStatus::NotStarted));
        let err = MyStatus::from_str("paused").expect_err("unknown status should fail");
        assert!(err.to_string().contains("in_progress"));
    }
}
