use std::collections::{HashMap, HashSet};

use super::StoreError;
use crate::domain::Entity;

/// Replaces the record sharing `entity`'s id in place, or appends it.
pub(crate) fn upsert<E: Entity>(items: &[E], entity: E) -> Vec<E> {
    let mut next = items.to_vec();
    match next.iter().position(|item| item.id() == entity.id()) {
        Some(index) => next[index] = entity,
        None => next.push(entity),
    }
    next
}

pub(crate) fn remove<E: Entity>(items: &[E], id: &str) -> Vec<E> {
    items
        .iter()
        .filter(|item| item.id() != id)
        .cloned()
        .collect()
}

/// Swaps in every updated record, after checking the server answered for each
/// targeted id.
pub(crate) fn replace_many<E: Entity>(
    items: &[E],
    updated: &[E],
    targets: &[String],
) -> Result<Vec<E>, StoreError> {
    let answered: HashSet<&str> = updated.iter().map(|item| item.id()).collect();
    let missing: Vec<String> = targets
        .iter()
        .filter(|id| !answered.contains(id.as_str()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(StoreError::IncompleteBatch {
            family: E::FAMILY,
            missing,
        });
    }
    Ok(updated
        .iter()
        .cloned()
        .fold(items.to_vec(), |acc, entity| upsert(&acc, entity)))
}

/// Collapses duplicate ids. The record keeps the position of its first
/// occurrence and the value of its last.
pub(crate) fn dedupe<E: Entity>(items: Vec<E>) -> Vec<E> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<E> = Vec::with_capacity(items.len());
    for item in items {
        let existing = positions.get(item.id()).copied();
        match existing {
            Some(index) => unique[index] = item,
            None => {
                positions.insert(item.id().to_string(), unique.len());
                unique.push(item);
            }
        }
    }
    unique
}

pub(crate) fn unique_ids(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty() && seen.insert(*id))
        .map(str::to_string)
        .collect()
}
