use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use ksys_api::IngestError;
use serde::{Deserialize, Serialize};

/// Prefix of the tag name given to identifiers missing from the table.
pub const FALLBACK_PREFIX: &str = "Unknown_";

/// Immutable `field_id → tag_name` mapping.
///
/// Serializes as a plain JSON/TOML table in key order, so a `BuildResult`
/// carrying it is byte-stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagTable {
    entries: BTreeMap<String, String>,
}

impl TagTable {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Known tag for `field_id`, if any.
    pub fn get(&self, field_id: &str) -> Option<&str> {
        self.entries.get(field_id).map(String::as_str)
    }

    /// Total lookup: known tag, or `Unknown_<field_id>`.
    pub fn lookup(&self, field_id: &str) -> Cow<'_, str> {
        match self.get(field_id) {
            Some(tag) => Cow::Borrowed(tag),
            None => Cow::Owned(format!("{FALLBACK_PREFIX}{field_id}")),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Missing ids are fine; an entry mapping to an empty tag is not.
    pub fn validate(&self) -> Result<(), IngestError> {
        for (id, tag) in &self.entries {
            if tag.trim().is_empty() {
                return Err(IngestError::config(format!("tags.{id}: tag name is empty")));
            }
        }
        Ok(())
    }
}

/// Shared slot holding the current `TagTable` snapshot.
///
/// Readers take an `Arc` once per batch; `install` swaps the whole table
/// atomically, so an in-flight build never sees a mix of versions.
pub struct TagTableHandle {
    current: ArcSwap<TagTable>,
    generation: AtomicU64,
}

impl TagTableHandle {
    pub fn new(table: TagTable) -> Self {
        Self {
            current: ArcSwap::from_pointee(table),
            generation: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> Arc<TagTable> {
        self.current.load_full()
    }

    /// Replace the table. Returns the new generation number.
    pub fn install(&self, table: TagTable) -> u64 {
        let entries = table.len();
        self.current.store(Arc::new(table));
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::info!(generation, entries, "installed tag table");
        generation
    }

    /// Number of installs since creation. Advisory only, not read under
    /// the same atomic step as the table.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
