//! `ChunkLoader` / `FileReaderCache` (C6): resolves a `LoaderHandle` to a
//! chunk's header + body bytes, through a cache of open file handles
//! bounded by `ReaderConfig::file_cache_capacity` with ref-counted LRU
//! eviction, so an in-flight query's borrow survives eviction pressure.
//! The cache shape (usage-counted map, evict only what's unborrowed) is
//! the same one a hand-rolled buffer pool uses; here the "usage count" is
//! simply `Arc::strong_count` on the shared file handle.

use crate::chunk::Chunk;
use crate::chunk_meta::{ChunkMetaData, LoaderHandle};
use crate::container::chunk_header::ChunkHeader;
use crate::error::{Result, TsReadError};
use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

#[derive(Clone, Eq, PartialEq, Hash)]
struct CacheKey {
    path: PathBuf,
    closed: bool,
}

struct CacheState {
    entries: HashMap<CacheKey, Arc<Mutex<File>>>,
    /// Least-recently-used at the front, most-recently-used at the back.
    order: VecDeque<CacheKey>,
}

/// Bounded, ref-counted cache of open file handles, keyed by
/// `(file_path, closed_flag)` as §4.6 specifies. Eviction only drops
/// handles nobody currently holds a clone of.
pub struct FileReaderCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

impl FileReaderCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn get(&self, path: &Path, closed: bool) -> Result<Arc<Mutex<File>>> {
        let key = CacheKey {
            path: path.to_path_buf(),
            closed,
        };
        let mut state = self.state.lock().expect("file cache mutex poisoned");
        if let Some(existing) = state.entries.get(&key) {
            let handle = existing.clone();
            state.touch(&key);
            return Ok(handle);
        }

        state.evict_to_fit(self.capacity);
        let file = Arc::new(Mutex::new(File::open(path)?));
        state.entries.insert(key.clone(), file.clone());
        state.order.push_back(key);
        Ok(file)
    }
}

impl CacheState {
    fn touch(&mut self, key: &CacheKey) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key.clone());
    }

    fn evict_to_fit(&mut self, capacity: usize) {
        if capacity == 0 {
            return;
        }
        while self.entries.len() >= capacity {
            let victim = self
                .order
                .iter()
                .position(|k| matches!(self.entries.get(k), Some(f) if Arc::strong_count(f) == 1));
            match victim {
                Some(idx) => {
                    let key = self.order.remove(idx).expect("index from position()");
                    self.entries.remove(&key);
                    tracing::debug!(path = %key.path.display(), closed = key.closed, "evicting file handle from cache");
                }
                // Every open handle is pinned by an in-flight borrow; grow
                // past capacity rather than break a live query.
                None => break,
            }
        }
    }
}

#[derive(Clone)]
struct FileEntry {
    path: PathBuf,
    closed: bool,
}

/// Materialises `ChunkMetaData` handles into `Chunk` bytes. `ChunkMetaData`
/// carries an opaque `LoaderHandle` rather than a back-pointer to its file
/// resource, so metadata and file resources never form a reference cycle
/// (§9's "chunk loader indirection" note) — this arena is what resolves
/// the handle back to a path.
pub struct ChunkLoader {
    cache: Arc<FileReaderCache>,
    files: RwLock<HashMap<u64, FileEntry>>,
    next_handle: AtomicU64,
}

impl ChunkLoader {
    pub fn new(cache: Arc<FileReaderCache>) -> Self {
        Self {
            cache,
            files: RwLock::new(HashMap::new()),
            next_handle: AtomicU64::new(0),
        }
    }

    /// Registers a file with the loader's arena, returning the handle
    /// subsequent `ChunkMetaData` for that file should carry.
    pub fn register_file(&self, path: impl Into<PathBuf>, closed: bool) -> LoaderHandle {
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.files
            .write()
            .expect("loader arena lock poisoned")
            .insert(id, FileEntry { path: path.into(), closed });
        LoaderHandle(id)
    }

    pub fn load(&self, meta: &ChunkMetaData) -> Result<Chunk> {
        let entry = {
            let files = self.files.read().expect("loader arena lock poisoned");
            files
                .get(&meta.loader.0)
                .cloned()
                .ok_or_else(|| TsReadError::CorruptChunk(format!("unknown loader handle {}", meta.loader.0)))?
        };

        let file_arc = self.cache.get(&entry.path, entry.closed)?;
        let mut file = file_arc.lock().expect("file mutex poisoned");
        file.seek(SeekFrom::Start(meta.offset))?;
        let header = ChunkHeader::read_from(&mut *file)?;
        if header.body_size < 0 {
            return Err(TsReadError::CorruptChunk("negative chunk body_size".into()));
        }
        let mut body = vec![0u8; header.body_size as usize];
        file.read_exact(&mut body)?;

        Ok(Chunk {
            header,
            body,
            deleted_at: meta.deleted_at,
        })
    }
}
