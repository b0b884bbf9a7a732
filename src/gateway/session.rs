use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

/// Bearer token shared between the gateway and the app. The gateway revokes it
/// on a 401; the app notices through `take_revoked` and clears the persisted copy.
#[derive(Debug, Default)]
pub struct Credentials {
    token: RwLock<Option<String>>,
    revoked: AtomicBool,
}

impl Credentials {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token.filter(|value| !value.trim().is_empty())),
            revoked: AtomicBool::new(false),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_present(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn set(&self, token: &str) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.trim().to_string());
        self.revoked.store(false, Ordering::SeqCst);
    }

    pub fn revoke(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.revoked.store(true, Ordering::SeqCst);
    }

    pub fn take_revoked(&self) -> bool {
        self.revoked.swap(false, Ordering::SeqCst)
    }
}
