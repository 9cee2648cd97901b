//! In-memory cache for uploaded sources and generated documents.
//!
//! Records expire after a fixed time-to-live and the cache holds at most
//! `max_files` live records, evicting the oldest uploads first. The cache
//! is an explicit instance shared by reference; there is no global one.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::language::Language;

pub const DEFAULT_MAX_FILES: usize = 100;
pub const DEFAULT_TTL_HOURS: u64 = 24;

const MILLIS_PER_HOUR: u64 = 3_600_000;

/// Whether a record holds user input or generated output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Uploaded,
    Generated,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Uploaded => "uploaded",
            FileKind::Generated => "generated",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uploaded" => Ok(FileKind::Uploaded),
            "generated" => Ok(FileKind::Generated),
            _ => Err(format!("unknown file kind: {}", s)),
        }
    }
}

/// A stored file with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedFile {
    pub id: String,
    pub filename: String,
    pub content: String,
    /// `Python`, `Java`, `JavaScript` or `Unknown`.
    pub language: String,
    pub kind: FileKind,
    /// Unix time in milliseconds.
    pub uploaded_at: u64,
    pub size: usize,
    /// Hex SHA-256 of the content.
    pub hash: String,
    /// Unix time in milliseconds.
    pub expires_at: u64,
}

/// Metadata of a stored file, without its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub id: String,
    pub filename: String,
    pub language: String,
    pub kind: FileKind,
    pub uploaded_at: u64,
    pub size: usize,
    pub expires_at: u64,
}

impl From<&CachedFile> for FileSummary {
    fn from(file: &CachedFile) -> Self {
        Self {
            id: file.id.clone(),
            filename: file.filename.clone(),
            language: file.language.clone(),
            kind: file.kind,
            uploaded_at: file.uploaded_at,
            size: file.size,
            expires_at: file.expires_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_files: usize,
    pub max_files: usize,
    pub total_size_bytes: usize,
    pub ttl_hours: u64,
    pub languages: BTreeMap<String, usize>,
    pub kinds: BTreeMap<String, usize>,
}

struct Entry {
    file: CachedFile,
    /// Insertion order, breaking ties between equal upload times.
    seq: u64,
}

impl Entry {
    fn age_key(&self) -> (u64, u64) {
        (self.file.uploaded_at, self.seq)
    }
}

/// Bounded, expiring file store.
pub struct FileCache {
    entries: RwLock<HashMap<String, Entry>>,
    next_seq: AtomicU64,
    max_files: usize,
    ttl_hours: u64,
}

impl Default for FileCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILES, DEFAULT_TTL_HOURS)
    }
}

impl FileCache {
    pub fn new(max_files: usize, ttl_hours: u64) -> Self {
        tracing::info!(max_files, ttl_hours, "file cache initialized");
        Self {
            entries: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            max_files,
            ttl_hours,
        }
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    pub fn ttl_hours(&self) -> u64 {
        self.ttl_hours
    }

    /// Store `content` and return its id.
    pub fn store(&self, filename: &str, content: &str, kind: FileKind) -> String {
        self.store_at(filename, content, kind, now_millis())
    }

    pub(crate) fn store_at(&self, filename: &str, content: &str, kind: FileKind, now: u64) -> String {
        let mut entries = self.write();
        purge_expired(&mut entries, now);

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let hash = format!("{:x}", Sha256::digest(content.as_bytes()));
        let id = format!("{}_{}_{}_{}", filename, &hash[..8], now, seq);
        let language = Language::from_filename(filename)
            .map(|l| l.as_str())
            .unwrap_or("Unknown");

        let file = CachedFile {
            id: id.clone(),
            filename: filename.to_string(),
            content: content.to_string(),
            language: language.to_string(),
            kind,
            uploaded_at: now,
            size: content.len(),
            hash,
            expires_at: now.saturating_add(self.ttl_hours.saturating_mul(MILLIS_PER_HOUR)),
        };
        tracing::info!(
            id = %id,
            filename,
            kind = %kind,
            size = file.size,
            language,
            "file stored"
        );
        entries.insert(id.clone(), Entry { file, seq });

        self.enforce_limit(&mut entries);
        id
    }

    /// Fetch a live record.
    pub fn get(&self, id: &str) -> Option<CachedFile> {
        self.get_at(id, now_millis())
    }

    pub(crate) fn get_at(&self, id: &str, now: u64) -> Option<CachedFile> {
        let mut entries = self.write();
        purge_expired(&mut entries, now);
        let found = entries.get(id).map(|e| e.file.clone());
        if found.is_none() {
            tracing::warn!(id, "file not found in cache");
        }
        found
    }

    /// Metadata of up to `limit` live records, newest upload first.
    pub fn list_recent(&self, limit: usize) -> Vec<FileSummary> {
        self.list_recent_at(limit, now_millis())
    }

    pub(crate) fn list_recent_at(&self, limit: usize, now: u64) -> Vec<FileSummary> {
        let mut entries = self.write();
        purge_expired(&mut entries, now);
        newest_first(&entries)
            .into_iter()
            .take(limit)
            .map(|e| FileSummary::from(&e.file))
            .collect()
    }

    /// Live records matching every given filter, newest first.
    ///
    /// Language and kind compare case-insensitively; `filename` matches
    /// any case-insensitive substring.
    pub fn search(
        &self,
        language: Option<&str>,
        kind: Option<FileKind>,
        filename: Option<&str>,
    ) -> Vec<FileSummary> {
        self.search_at(language, kind, filename, now_millis())
    }

    pub(crate) fn search_at(
        &self,
        language: Option<&str>,
        kind: Option<FileKind>,
        filename: Option<&str>,
        now: u64,
    ) -> Vec<FileSummary> {
        let mut entries = self.write();
        purge_expired(&mut entries, now);
        let needle = filename.map(str::to_lowercase);
        let found: Vec<FileSummary> = newest_first(&entries)
            .into_iter()
            .map(|e| &e.file)
            .filter(|f| language.map_or(true, |l| f.language.eq_ignore_ascii_case(l)))
            .filter(|f| kind.map_or(true, |k| f.kind == k))
            .filter(|f| {
                needle
                    .as_deref()
                    .map_or(true, |n| f.filename.to_lowercase().contains(n))
            })
            .map(FileSummary::from)
            .collect();
        tracing::info!(
            language = language.unwrap_or("*"),
            kind = kind.map_or("*", |k| k.as_str()),
            filename = filename.unwrap_or("*"),
            found = found.len(),
            "cache search completed"
        );
        found
    }

    /// Counts by language and kind over live records.
    pub fn stats(&self) -> CacheStats {
        self.stats_at(now_millis())
    }

    pub(crate) fn stats_at(&self, now: u64) -> CacheStats {
        let mut entries = self.write();
        purge_expired(&mut entries, now);

        let mut stats = CacheStats {
            total_files: entries.len(),
            max_files: self.max_files,
            ttl_hours: self.ttl_hours,
            ..CacheStats::default()
        };
        for entry in entries.values() {
            let file = &entry.file;
            *stats.languages.entry(file.language.clone()).or_default() += 1;
            *stats.kinds.entry(file.kind.to_string()).or_default() += 1;
            stats.total_size_bytes += file.size;
        }
        tracing::debug!(
            files = stats.total_files,
            bytes = stats.total_size_bytes,
            "cache stats generated"
        );
        stats
    }

    /// Remove a record; `false` when no live record has this id.
    pub fn delete(&self, id: &str) -> bool {
        self.delete_at(id, now_millis())
    }

    pub(crate) fn delete_at(&self, id: &str, now: u64) -> bool {
        let mut entries = self.write();
        purge_expired(&mut entries, now);
        match entries.remove(id) {
            Some(entry) => {
                tracing::info!(id, filename = %entry.file.filename, "file deleted");
                true
            }
            None => {
                tracing::warn!(id, "file not found for deletion");
                false
            }
        }
    }

    /// Remove every record and return how many were live.
    pub fn clear(&self) -> usize {
        self.clear_at(now_millis())
    }

    pub(crate) fn clear_at(&self, now: u64) -> usize {
        let mut entries = self.write();
        purge_expired(&mut entries, now);
        let count = entries.len();
        entries.clear();
        tracing::info!(count, "cache cleared");
        count
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Evict the oldest uploads, one per record over the limit.
    fn enforce_limit(&self, entries: &mut HashMap<String, Entry>) {
        if entries.len() <= self.max_files {
            return;
        }
        let excess = entries.len() - self.max_files;
        tracing::info!(
            size = entries.len(),
            max = self.max_files,
            excess,
            "cache size limit exceeded"
        );

        let mut oldest: Vec<(u64, u64, String)> = entries
            .iter()
            .map(|(id, e)| {
                let (at, seq) = e.age_key();
                (at, seq, id.clone())
            })
            .collect();
        oldest.sort();
        for (_, _, id) in oldest.into_iter().take(excess) {
            tracing::debug!(id = %id, "evicting oldest file");
            entries.remove(&id);
        }
    }

    // A panic while holding the lock cannot leave the map half-updated,
    // so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Entry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn purge_expired(entries: &mut HashMap<String, Entry>, now: u64) {
    let before = entries.len();
    entries.retain(|_, e| e.file.expires_at >= now);
    let removed = before - entries.len();
    if removed > 0 {
        tracing::info!(removed, "expired files removed from cache");
    }
}

fn newest_first(entries: &HashMap<String, Entry>) -> Vec<&Entry> {
    let mut sorted: Vec<&Entry> = entries.values().collect();
    sorted.sort_by(|a, b| b.age_key().cmp(&a.age_key()));
    sorted
}

/// Current Unix time in milliseconds.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}
