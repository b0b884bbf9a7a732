use std::sync::Arc;

use super::{StoreError, StoreState, Synced};
use crate::domain::{Family, Settings, SettingsPatch};
use crate::gateway::SettingsRemote;

pub struct SettingsStore<R: ?Sized> {
    remote: Arc<R>,
    cell: Synced<Settings>,
}

impl<R: ?Sized> SettingsStore<R> {
    pub fn new(remote: Arc<R>) -> Self {
        Self {
            remote,
            cell: Synced::new(Family::Settings, Settings::default()),
        }
    }

    pub fn settings(&self) -> Settings {
        self.cell.read().items.clone()
    }

    pub fn state(&self) -> StoreState<Settings> {
        self.cell.snapshot()
    }

    pub fn restore(&self, settings: Settings) {
        self.cell.replace(settings);
    }

    pub fn clear(&self) {
        self.cell.replace(Settings::default());
    }
}

impl<R: SettingsRemote + ?Sized> SettingsStore<R> {
    pub async fn load(&self) -> Result<(), StoreError> {
        self.cell
            .run("load", self.remote.fetch_settings(), |_, settings: Settings| {
                Ok((settings, ()))
            })
            .await
    }

    pub async fn update(&self, patch: SettingsPatch) -> Result<Settings, StoreError> {
        if patch.reminder_lead_days.is_some_and(|days| days > 90) {
            return self.cell.reject(
                "update",
                StoreError::InvalidInput("reminder lead time cannot exceed 90 days".to_string()),
            );
        }
        self.cell
            .run("update", self.remote.update_settings(&patch), |_, settings: Settings| {
                Ok((settings.clone(), settings))
            })
            .await
    }
}
