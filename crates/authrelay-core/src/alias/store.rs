use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::template::{parse, referenced_names, render};
use crate::api::{ClientError, Result};

/// Named string values referenced by `{name}` placeholders.
///
/// Implementors provide the two primitives below; both must be atomic with
/// respect to each other, so a multi-key read never sees half of a multi-key
/// write. Everything else is derived from them.
pub trait AliasStore: Send + Sync {
    /// Read several aliases from one consistent snapshot, positionally.
    fn lookup_many(&self, names: &[&str]) -> Vec<Option<String>>;

    /// Store or overwrite several aliases in one step.
    fn set_aliases(&self, entries: &[(&str, &str)]);

    fn lookup(&self, name: &str) -> Option<String> {
        self.lookup_many(&[name]).pop().flatten()
    }

    fn has_alias(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// True only if every named alias is present in the same snapshot.
    fn has_aliases(&self, names: &[&str]) -> bool {
        self.lookup_many(names).iter().all(Option::is_some)
    }

    fn set_alias(&self, name: &str, value: &str) {
        self.set_aliases(&[(name, value)]);
    }

    fn get_alias(&self, name: &str) -> Result<String> {
        self.lookup(name)
            .ok_or_else(|| ClientError::UnknownAlias(name.to_string()))
    }

    /// Replace every `{name}` placeholder in `template`.
    ///
    /// All-or-nothing: a single unknown alias fails the whole call.
    fn resolve(&self, template: &str) -> Result<String> {
        let segments = parse(template);
        let names = referenced_names(&segments);
        if names.is_empty() {
            return Ok(template.to_string());
        }
        let values = self.lookup_many(&names);
        render(template, &segments, &names, &values).map(|s| s.into_owned())
    }

    /// Resolve several templates against one snapshot of the store.
    ///
    /// Each template is expanded exactly once, so a substituted value that
    /// itself looks like `{name}` is left alone.
    fn resolve_all(&self, templates: &[&str]) -> Result<Vec<String>> {
        let parsed: Vec<_> = templates.iter().map(|t| parse(*t)).collect();
        let mut names: Vec<&str> = Vec::new();
        for segments in &parsed {
            for name in referenced_names(segments) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        let values = self.lookup_many(&names);
        templates
            .iter()
            .zip(&parsed)
            .map(|(template, segments)| {
                render(*template, segments, &names, &values).map(|s| s.into_owned())
            })
            .collect()
    }
}

/// A stored alias value and when it was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasEntry {
    pub value: String,
    pub set_at: DateTime<Utc>,
}

impl AliasEntry {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            set_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, ttl: Option<Duration>) -> bool {
        match ttl {
            // A deadline past the end of time never arrives
            Some(ttl) => self
                .set_at
                .checked_add_signed(ttl)
                .map_or(false, |deadline| Utc::now() > deadline),
            None => false,
        }
    }
}

/// In-process alias store guarded by a single `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryAliasStore {
    entries: RwLock<HashMap<String, AliasEntry>>,
    ttl: Option<Duration>,
}

impl MemoryAliasStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries older than `ttl` read as absent.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::default(),
            ttl: Some(ttl),
        }
    }

    pub(crate) fn from_entries(entries: HashMap<String, AliasEntry>, ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(entries),
            ttl,
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Clone of every entry, expired ones included.
    pub fn entries(&self) -> HashMap<String, AliasEntry> {
        self.read().clone()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.write().clear();
    }

    // A panic while holding the lock cannot leave a half-written entry map,
    // so a poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, AliasEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, AliasEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl AliasStore for MemoryAliasStore {
    fn lookup_many(&self, names: &[&str]) -> Vec<Option<String>> {
        let entries = self.read();
        names
            .iter()
            .map(|name| {
                entries
                    .get(*name)
                    .filter(|entry| !entry.is_expired(self.ttl))
                    .map(|entry| entry.value.clone())
            })
            .collect()
    }

    fn set_aliases(&self, entries: &[(&str, &str)]) {
        let mut map = self.write();
        for (name, value) in entries {
            map.insert(name.to_string(), AliasEntry::new(*value));
        }
    }
}
