//! Deletions (tombstones, §3): `(series_path, version, timestamp_upper_bound)`
//! records. A point is invisible once some modification's bound covers its
//! timestamp at a version at or above the chunk's own version.
//!
//! `ModificationStore` is named in §6 as a collaborator the core relies on
//! without specifying how it's implemented — the write path that produces
//! these records is out of scope (§1). `InMemoryModificationStore` is
//! enough to drive the CLI and the test suite.

use crate::chunk_meta::ChunkMetaData;
use crate::error::Result;
use crate::file::resource::FileResource;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Modification {
    pub series_path: String,
    pub version: u64,
    pub timestamp_upper_bound: i64,
}

pub trait ModificationStore: Send + Sync {
    fn modifications(&self, resource: &FileResource, path: &str) -> Result<Vec<Modification>>;
}

#[derive(Default)]
pub struct InMemoryModificationStore {
    by_resource: HashMap<PathBuf, HashMap<String, Vec<Modification>>>,
}

impl InMemoryModificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource_path: impl Into<PathBuf>, modification: Modification) {
        self.by_resource
            .entry(resource_path.into())
            .or_default()
            .entry(modification.series_path.clone())
            .or_default()
            .push(modification);
    }
}

impl ModificationStore for InMemoryModificationStore {
    fn modifications(&self, resource: &FileResource, path: &str) -> Result<Vec<Modification>> {
        Ok(self
            .by_resource
            .get(&resource.path)
            .and_then(|m| m.get(path))
            .cloned()
            .unwrap_or_default())
    }
}

/// Raises each chunk's `deleted_at` to the tightest bound that applies —
/// any modification whose version is at or above the chunk's own version
/// (§4.8 step 3, also used by the sequential path at metadata-load time
/// per §4.9).
pub fn apply_modifications(metas: &mut [ChunkMetaData], mods: &[Modification]) {
    for meta in metas.iter_mut() {
        for m in mods {
            if m.version >= meta.version {
                meta.apply_deletion_bound(m.timestamp_upper_bound);
            }
        }
    }
}
