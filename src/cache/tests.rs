use std::path::{Path, PathBuf};

use rusqlite::params;
use uuid::Uuid;

use super::{CachedSession, LocalCache, CURRENT_SCHEMA_VERSION};
use crate::domain::{Family, Settings, StrategyNote};

fn unique_workspace() -> PathBuf {
    let root = std::env::temp_dir().join(format!("dropfarm-cache-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&root).expect("temp workspace should be creatable");
    root
}

fn cache_path(root: &Path) -> String {
    root.join("state").join("cache.sqlite").display().to_string()
}

fn note(id: &str) -> StrategyNote {
    StrategyNote {
        id: id.to_string(),
        title: format!("note {id}"),
        content: "rotate bridges".to_string(),
        last_modified: "2026-10-01T00:00:00Z".to_string(),
        tags: Vec::new(),
    }
}

#[test]
fn open_creates_parent_dir_and_records_schema_version() {
    let root = unique_workspace();
    let path = cache_path(&root);
    let cache = LocalCache::open(&path).expect("cache should open");
    assert!(PathBuf::from(&path).exists());

    let version: String = cache
        .conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .expect("schema version should be recorded");
    assert_eq!(version, CURRENT_SCHEMA_VERSION.to_string());
    drop(cache);

    LocalCache::open(&path).expect("reopening should skip applied migrations");
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn families_round_trip_and_survive_reopen() {
    let root = unique_workspace();
    let path = cache_path(&root);
    {
        let cache = LocalCache::open(&path).expect("cache should open");
        cache
            .save(Family::Notes, &vec![note("n-1"), note("n-2")])
            .expect("notes should save");
        cache
            .save(Family::Settings, &Settings::default())
            .expect("settings should save");
    }

    let cache = LocalCache::open(&path).expect("cache should reopen");
    let notes: Vec<StrategyNote> = cache
        .load(Family::Notes)
        .expect("notes should load")
        .expect("notes should be present");
    assert_eq!(notes, vec![note("n-1"), note("n-2")]);
    let missing: Option<Vec<StrategyNote>> =
        cache.load(Family::Wallets).expect("missing family should load");
    assert!(missing.is_none());

    let families: Vec<Family> = cache
        .cached_families()
        .expect("cached families should list")
        .into_iter()
        .map(|entry| entry.family)
        .collect();
    assert_eq!(families, vec![Family::Notes, Family::Settings]);
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn corrupt_payload_is_reported_per_family() {
    let root = unique_workspace();
    let cache = LocalCache::open(&cache_path(&root)).expect("cache should open");
    cache
        .conn
        .execute(
            "INSERT INTO family_cache (family, payload, saved_at) VALUES (?1, ?2, ?3)",
            params!["projects", "{not json", "2026-10-14T00:00:00Z"],
        )
        .expect("raw insert should succeed");

    let err = cache
        .load::<Vec<StrategyNote>>(Family::Projects)
        .expect_err("corrupt payload should fail");
    assert!(err.is_corrupt());
    assert!(err.to_string().contains("cached projects could not be read"));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn session_and_clear() {
    let root = unique_workspace();
    let cache = LocalCache::open(&cache_path(&root)).expect("cache should open");
    assert_eq!(cache.session().expect("session should read"), CachedSession::default());

    cache.set_token(Some("tok-1")).expect("token should save");
    cache.set_authenticated(true).expect("flag should save");
    cache.save(Family::Notes, &vec![note("n-1")]).expect("notes should save");
    cache.mark_synced().expect("sync stamp should save");
    assert_eq!(
        cache.session().expect("session should read"),
        CachedSession {
            token: Some("tok-1".to_string()),
            authenticated: true,
        }
    );
    assert!(cache.last_synced().expect("stamp should read").is_some());

    cache.clear().expect("clear should succeed");
    assert_eq!(cache.session().expect("session should read"), CachedSession::default());
    assert!(cache.cached_families().expect("families should list").is_empty());
    assert!(cache.last_synced().expect("stamp should read").is_none());
    let _ = std::fs::remove_dir_all(root);
}
