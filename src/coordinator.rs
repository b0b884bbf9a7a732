use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

use crate::cache::{CacheError, LocalCache};
use crate::domain::{Entity, Family, Project};
use crate::gateway::Gateway;
use crate::search::CatalogSnapshot;
use crate::store::{
    AlertStore, EntityStore, LearningStore, NoteStore, PositionStore, ProjectStore,
    RecurringStore, SettingsStore, StoreError, StrategyStore, TemplateStore, WalletStore,
    WatchlistStore,
};


/// One user-facing message raised for a bulk load with failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub families: Vec<Family>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedLoad {
    pub family: Family,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub loaded: Vec<Family>,
    pub failed: Vec<FailedLoad>,
    pub notice: Option<Notice>,
    pub session_expired: bool,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn from_outcomes(outcomes: Vec<(Family, Result<(), StoreError>)>) -> Self {
        let mut report = LoadReport::default();
        for (family, outcome) in outcomes {
            match outcome {
                Ok(()) => report.loaded.push(family),
                Err(err) => {
                    report.session_expired |= err.is_session_expired();
                    report.failed.push(FailedLoad {
                        family,
                        error: err.to_string(),
                    });
                }
            }
        }
        if !report.failed.is_empty() {
            let families: Vec<Family> = report.failed.iter().map(|failed| failed.family).collect();
            let labels: Vec<&str> = families.iter().map(|family| family.label()).collect();
            report.notice = Some(Notice {
                message: format!(
                    "Could not load {}. Run `dropfarm sync` to try again.",
                    labels.join(", ")
                ),
                families,
            });
        }
        report
    }
}

/// Owns one store per family and drives bulk loads and the local cache.
pub struct Coordinator {
    pub projects: ProjectStore<dyn Gateway>,
    pub wallets: WalletStore<dyn Gateway>,
    pub recurring: RecurringStore<dyn Gateway>,
    pub notes: NoteStore<dyn Gateway>,
    pub alerts: AlertStore<dyn Gateway>,
    pub watchlist: WatchlistStore<dyn Gateway>,
    pub templates: TemplateStore<dyn Gateway>,
    pub positions: PositionStore<dyn Gateway>,
    pub strategies: StrategyStore<dyn Gateway>,
    pub learning: LearningStore<dyn Gateway>,
    pub settings: SettingsStore<dyn Gateway>,
    authenticated: AtomicBool,
    notices: Mutex<Vec<Notice>>,
}

impl Coordinator {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            projects: EntityStore::new(Arc::clone(&gateway)),
            wallets: EntityStore::new(Arc::clone(&gateway)),
            recurring: EntityStore::new(Arc::clone(&gateway)),
            notes: EntityStore::new(Arc::clone(&gateway)),
            alerts: EntityStore::new(Arc::clone(&gateway)),
            watchlist: EntityStore::new(Arc::clone(&gateway)),
            templates: EntityStore::new(Arc::clone(&gateway)),
            positions: EntityStore::new(Arc::clone(&gateway)),
            strategies: EntityStore::new(Arc::clone(&gateway)),
            learning: EntityStore::new(Arc::clone(&gateway)),
            settings: SettingsStore::new(gateway),
            authenticated: AtomicBool::new(false),
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    /// Loads every family only when the session turns authenticated.
    /// Setting the same value again is a no-op.
    pub async fn set_authenticated(&self, authenticated: bool) -> Option<LoadReport> {
        if !authenticated {
            self.sign_out();
            return None;
        }
        if self
            .authenticated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }
        Some(self.load_all().await)
    }

    pub fn sign_out(&self) {
        self.authenticated.store(false, Ordering::SeqCst);
    }

    pub async fn reload(&self) -> LoadReport {
        self.load_all().await
    }

    async fn load_all(&self) -> LoadReport {
        let (
            projects,
            wallets,
            recurring,
            notes,
            alerts,
            watchlist,
            templates,
            positions,
            strategies,
            settings,
            learning,
        ) = tokio::join!(
            self.projects.load(),
            self.wallets.load(),
            self.recurring.load(),
            self.notes.load(),
            self.alerts.load(),
            self.watchlist.load(),
            self.templates.load(),
            self.positions.load(),
            self.strategies.load(),
            self.settings.load(),
            self.learning.load(),
        );

        let report = LoadReport::from_outcomes(vec![
            (Family::Projects, projects.map(drop)),
            (Family::Wallets, wallets.map(drop)),
            (Family::RecurringTasks, recurring.map(drop)),
            (Family::Notes, notes.map(drop)),
            (Family::Alerts, alerts.map(drop)),
            (Family::Watchlist, watchlist.map(drop)),
            (Family::Templates, templates.map(drop)),
            (Family::Positions, positions.map(drop)),
            (Family::Strategies, strategies.map(drop)),
            (Family::Settings, settings),
            (Family::Learning, learning.map(drop)),
        ]);

        if report.session_expired {
            self.sign_out();
        }
        if let Some(notice) = &report.notice {
            self.push_notice(notice.clone());
        }
        info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            session_expired = report.session_expired,
            "bulk load settled"
        );
        report
    }

    fn push_notice(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }

    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            projects: self.projects.items(),
            wallets: self.wallets.items(),
            recurring: self.recurring.items(),
            watchlist: self.watchlist.items(),
            notes: self.notes.items(),
            learning: self.learning.items(),
            alerts: self.alerts.items(),
        }
    }

    /// Turns a watchlist item into a tracked project. The watchlist drops the
    /// item and the project store gains the server's project.
    pub async fn promote_watchlist_item(&self, id: &str) -> Result<Project, StoreError> {
        let project = self.watchlist.promote(id).await?;
        self.projects.adopt(project.clone());
        Ok(project)
    }

    pub fn clear_all(&self) {
        self.projects.clear();
        self.wallets.clear();
        self.recurring.clear();
        self.notes.clear();
        self.alerts.clear();
        self.watchlist.clear();
        self.templates.clear();
        self.positions.clear();
        self.strategies.clear();
        self.learning.clear();
        self.settings.clear();
        self.sign_out();
    }

    /// Writes every collection and the session flag to the cache.
    pub fn persist(&self, cache: &LocalCache) -> Result<(), CacheError> {
        cache.save(Family::Projects, &self.projects.items())?;
        cache.save(Family::Wallets, &self.wallets.items())?;
        cache.save(Family::RecurringTasks, &self.recurring.items())?;
        cache.save(Family::Notes, &self.notes.items())?;
        cache.save(Family::Alerts, &self.alerts.items())?;
        cache.save(Family::Watchlist, &self.watchlist.items())?;
        cache.save(Family::Templates, &self.templates.items())?;
        cache.save(Family::Positions, &self.positions.items())?;
        cache.save(Family::Strategies, &self.strategies.items())?;
        cache.save(Family::Learning, &self.learning.items())?;
        cache.save(Family::Settings, &self.settings.settings())?;
        cache.set_authenticated(self.is_authenticated())
    }

    /// Warm start. Families whose payload no longer decodes stay empty.
    /// The session flag is restored without triggering a load.
    pub fn restore(&self, cache: &LocalCache) -> Result<(), CacheError> {
        restore_family(cache, &self.projects)?;
        restore_family(cache, &self.wallets)?;
        restore_family(cache, &self.recurring)?;
        restore_family(cache, &self.notes)?;
        restore_family(cache, &self.alerts)?;
        restore_family(cache, &self.watchlist)?;
        restore_family(cache, &self.templates)?;
        restore_family(cache, &self.positions)?;
        restore_family(cache, &self.strategies)?;
        restore_family(cache, &self.learning)?;
        if let Some(settings) = skip_corrupt(cache.load(Family::Settings))? {
            self.settings.restore(settings);
        }
        let session = cache.session()?;
        self.authenticated
            .store(session.authenticated, Ordering::SeqCst);
        Ok(())
    }
}

fn restore_family<E: Entity>(
    cache: &LocalCache,
    store: &EntityStore<E, dyn Gateway>,
) -> Result<(), CacheError> {
    if let Some(items) = skip_corrupt::<Vec<E>>(cache.load(E::FAMILY))? {
        store.restore(items);
    }
    Ok(())
}

fn skip_corrupt<T>(loaded: Result<Option<T>, CacheError>) -> Result<Option<T>, CacheError> {
    match loaded {
        Err(err) if err.is_corrupt() => {
            warn!(error = %err, "ignoring unreadable cache entry");
            Ok(None)
        }
        other => other,
    }
}
