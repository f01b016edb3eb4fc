//! Collaborator seams named without specifying an implementation:
//! `MetadataCatalogue` (chunk-metadata lookup) and `ResourceFilter`
//! (whole-resource pre-pruning ahead of any disk read). Modeled on a
//! narrow repository trait plus one concrete in-process implementation
//! reached through a factory — here, `InMemoryCatalogue` stands in for
//! the real schema/metadata service this crate treats as external.

use crate::chunk_meta::ChunkMetaData;
use crate::error::Result;
use crate::file::resource::FileResource;
use crate::filter::Filter;
use crate::stats::Statistics;
use crate::types::DataType;
use std::collections::HashMap;
use std::path::PathBuf;

pub trait MetadataCatalogue: Send + Sync {
    fn chunk_metas(&self, resource: &FileResource, path: &str) -> Result<Vec<ChunkMetaData>>;
}

pub trait ResourceFilter: Send + Sync {
    /// Returns `false` only when the resource can be proven to hold
    /// nothing the filter could accept, so the caller can skip it without
    /// reading its chunk metadata at all.
    fn satisfies(&self, resource: &FileResource, filter: Option<&dyn Filter>, path: &str) -> bool;
}

#[derive(Default)]
pub struct InMemoryCatalogue {
    by_resource: HashMap<PathBuf, HashMap<String, Vec<ChunkMetaData>>>,
}

impl InMemoryCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource_path: impl Into<PathBuf>, path: impl Into<String>, metas: Vec<ChunkMetaData>) {
        self.by_resource
            .entry(resource_path.into())
            .or_default()
            .insert(path.into(), metas);
    }
}

impl MetadataCatalogue for InMemoryCatalogue {
    fn chunk_metas(&self, resource: &FileResource, path: &str) -> Result<Vec<ChunkMetaData>> {
        Ok(self
            .by_resource
            .get(&resource.path)
            .and_then(|m| m.get(path))
            .cloned()
            .unwrap_or_default())
    }
}

/// Prunes a closed resource using only its end-time map: a filter that
/// rejects everything up to and including the series' last flushed
/// timestamp can skip the resource without opening it.
pub struct EndTimeResourceFilter;

impl ResourceFilter for EndTimeResourceFilter {
    fn satisfies(&self, resource: &FileResource, filter: Option<&dyn Filter>, path: &str) -> bool {
        if !resource.closed {
            return true;
        }
        let (Some(f), Some(&end_time)) = (filter, resource.end_times.get(path)) else {
            return true;
        };
        // No per-value stats available at this granularity; an empty
        // Statistics never prunes on value, so this only exercises the
        // filter's time-range pruning against the resource's known span.
        f.accepts_stats(&Statistics::empty(DataType::I64), i64::MIN, end_time)
    }
}
