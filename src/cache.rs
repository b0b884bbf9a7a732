use std::error::Error;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::{now_utc_rfc3339, Family};

#[cfg(test)]
mod tests;

pub const CURRENT_SCHEMA_VERSION: i64 = 1;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 1] = [Migration {
    version: 1,
    name: "family_cache_v1",
    sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS family_cache (
    family TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    saved_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS session (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    token TEXT,
    authenticated INTEGER NOT NULL DEFAULT 0
);

INSERT INTO session (id, token, authenticated) VALUES (1, NULL, 0)
ON CONFLICT(id) DO NOTHING;
"#,
}];

#[derive(Debug)]
pub enum CacheError {
    Sql(rusqlite::Error),
    Io(std::io::Error),
    Encode {
        family: Family,
        source: serde_json::Error,
    },
    Corrupt {
        family: Family,
        source: serde_json::Error,
    },
}

impl CacheError {
    /// A stored payload that no longer decodes. The cache is only a warm
    /// start, so callers may skip the family.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, CacheError::Corrupt { .. })
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Sql(err) => write!(f, "cache database error: {}", err),
            CacheError::Io(err) => write!(f, "cache I/O error: {}", err),
            CacheError::Encode { family, source } => {
                write!(f, "failed to encode cached {}: {}", family.label(), source)
            }
            CacheError::Corrupt { family, source } => {
                write!(f, "cached {} could not be read: {}", family.label(), source)
            }
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CacheError::Sql(err) => Some(err),
            CacheError::Io(err) => Some(err),
            CacheError::Encode { source, .. } => Some(source),
            CacheError::Corrupt { source, .. } => Some(source),
        }
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(value: rusqlite::Error) -> Self {
        CacheError::Sql(value)
    }
}

impl From<std::io::Error> for CacheError {
    fn from(value: std::io::Error) -> Self {
        CacheError::Io(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedSession {
    pub token: Option<String>,
    pub authenticated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFamily {
    pub family: Family,
    pub saved_at: String,
}

/// Warm-start copy of every family plus the session, one SQLite file.
pub struct LocalCache {
    conn: Connection,
}

impl LocalCache {
    pub fn open(path: &str) -> Result<Self, CacheError> {
        ensure_parent_dir(path)?;
        let mut conn = Connection::open(path)?;
        configure_for_speed(&conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn save<T: Serialize + ?Sized>(&self, family: Family, value: &T) -> Result<(), CacheError> {
        let payload = serde_json::to_string(value)
            .map_err(|source| CacheError::Encode { family, source })?;
        self.conn.execute(
            r#"
INSERT INTO family_cache (family, payload, saved_at)
VALUES (?1, ?2, ?3)
ON CONFLICT(family) DO UPDATE SET
    payload = excluded.payload,
    saved_at = excluded.saved_at
"#,
            params![family.as_str(), payload, now_utc_rfc3339()],
        )?;
        Ok(())
    }

    pub fn load<T: DeserializeOwned>(&self, family: Family) -> Result<Option<T>, CacheError> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM family_cache WHERE family = ?1",
                params![family.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        payload
            .map(|payload| {
                serde_json::from_str(&payload)
                    .map_err(|source| CacheError::Corrupt { family, source })
            })
            .transpose()
    }

    /// Families with a stored payload, in `Family::ALL` order.
    pub fn cached_families(&self) -> Result<Vec<CachedFamily>, CacheError> {
        let mut stmt = self
            .conn
            .prepare("SELECT family, saved_at FROM family_cache")?;
        let mut rows = stmt.query([])?;
        let mut stored = Vec::new();
        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            let saved_at: String = row.get(1)?;
            if let Ok(family) = key.parse::<Family>() {
                stored.push(CachedFamily { family, saved_at });
            }
        }
        stored.sort_by_key(|entry| entry.family);
        Ok(stored)
    }

    pub fn session(&self) -> Result<CachedSession, CacheError> {
        let session = self.conn.query_row(
            "SELECT token, authenticated FROM session WHERE id = 1",
            [],
            |row| {
                Ok(CachedSession {
                    token: row.get(0)?,
                    authenticated: row.get::<_, i64>(1)? != 0,
                })
            },
        )?;
        Ok(session)
    }

    pub fn set_token(&self, token: Option<&str>) -> Result<(), CacheError> {
        self.conn.execute(
            "UPDATE session SET token = ?1 WHERE id = 1",
            params![token],
        )?;
        Ok(())
    }

    pub fn set_authenticated(&self, authenticated: bool) -> Result<(), CacheError> {
        self.conn.execute(
            "UPDATE session SET authenticated = ?1 WHERE id = 1",
            params![i64::from(authenticated)],
        )?;
        Ok(())
    }

    pub fn mark_synced(&self) -> Result<(), CacheError> {
        self.set_meta("last_synced_at", &now_utc_rfc3339())
    }

    pub fn last_synced(&self) -> Result<Option<String>, CacheError> {
        self.get_meta("last_synced_at")
    }

    /// Drops every cached family and signs the session out.
    pub fn clear(&self) -> Result<(), CacheError> {
        self.conn.execute_batch(
            r#"
DELETE FROM family_cache;
DELETE FROM meta WHERE key = 'last_synced_at';
UPDATE session SET token = NULL, authenticated = 0 WHERE id = 1;
"#,
        )?;
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<String>, CacheError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_meta(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.conn.execute(
            r#"
INSERT INTO meta (key, value)
VALUES (?1, ?2)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
            params![key, value],
        )?;
        Ok(())
    }
}

fn ensure_parent_dir(path: &str) -> Result<(), std::io::Error> {
    let parent = Path::new(path).parent();
    if let Some(parent) = parent {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn configure_for_speed(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "temp_store", "MEMORY")?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;
        if already_applied.is_some() {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, now_utc_rfc3339()],
        )?;
    }

    tx.execute(
        r#"
INSERT INTO meta (key, value)
VALUES ('schema_version', ?1)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    tx.commit()
}
