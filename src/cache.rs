// On-disk cache of resolved lyrics, so re-runs don't hit the lyric sites
// again for songs that stay on the chart week after week.
use std::{
    collections::BTreeMap,
    fs,
    path::PathBuf,
};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::resolver::LyricsResult;

const CACHE_DIR_NAME: &str = "lyric_corpus";
const INDEX_FILE_NAME: &str = "index.json";
pub const DEFAULT_MAX_ENTRIES: usize = 500;

#[derive(Serialize, Deserialize, Debug, Clone)]
struct CacheEntry {
    filename: String,
    source_id: String,
    last_accessed: i64, // Unix timestamp (milliseconds)
    // Breaks ties between entries touched within the same millisecond.
    #[serde(default)]
    access_seq: u64,
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct CacheIndex {
    // Key: sha256 of "artist - title"
    entries: BTreeMap<String, CacheEntry>,
}

/// Directory of `<key>.txt` lyrics files plus a JSON index.
#[derive(Debug)]
pub struct LyricsCache {
    dir: PathBuf,
    max_entries: usize,
    index: CacheIndex,
    next_seq: u64,
}

/// The system cache directory, or the working directory when there is none.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CACHE_DIR_NAME)
}

fn generate_key(artist: &str, title: &str) -> String {
    let combined = format!("{artist} - {title}");
    let mut hasher = Sha256::new();
    hasher.update(combined.as_bytes());
    hex::encode(hasher.finalize())
}

fn now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl LyricsCache {
    /// Open (creating if needed) the cache in `dir`. A corrupt index is
    /// discarded and the cache starts empty.
    pub fn open(dir: impl Into<PathBuf>, max_entries: usize) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let index_path = dir.join(INDEX_FILE_NAME);
        let index = if index_path.exists() {
            let content = fs::read_to_string(&index_path)?;
            serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Discarding unreadable cache index {}: {}", index_path.display(), e);
                CacheIndex::default()
            })
        } else {
            CacheIndex::default()
        };
        info!("Loaded {} cache entries from {}", index.entries.len(), dir.display());

        let next_seq = index
            .entries
            .values()
            .map(|e| e.access_seq + 1)
            .max()
            .unwrap_or(0);
        Ok(Self {
            dir,
            max_entries: max_entries.max(1),
            index,
            next_seq,
        })
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    pub fn len(&self) -> usize {
        self.index.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.entries.is_empty()
    }

    /// Cached lyrics for the song. Any read problem counts as a miss.
    pub fn get(&mut self, artist: &str, title: &str) -> Option<LyricsResult> {
        let key = generate_key(artist, title);
        let seq = self.bump_seq();
        let Some(entry) = self.index.entries.get_mut(&key) else {
            debug!("Cache miss for: {} - {}", artist, title);
            return None;
        };

        entry.last_accessed = now();
        entry.access_seq = seq;
        let file_path = self.dir.join(&entry.filename);
        let source_id = entry.source_id.clone();

        match fs::read_to_string(&file_path) {
            Ok(lyrics) => {
                debug!("Cache hit for: {} - {}", artist, title);
                if let Err(e) = self.save_index() {
                    warn!("Error saving cache index after timestamp update: {}", e);
                }
                Some(LyricsResult { source_id, lyrics })
            }
            Err(e) => {
                warn!(
                    "Cache index points to '{}', but it could not be read: {}",
                    file_path.display(),
                    e
                );
                self.index.entries.remove(&key);
                None
            }
        }
    }

    /// Store lyrics for the song, evicting the least recently used entry
    /// when the cache is over capacity.
    pub fn put(&mut self, artist: &str, title: &str, result: &LyricsResult) -> Result<()> {
        let key = generate_key(artist, title);
        let filename = format!("{key}.txt");
        fs::write(self.dir.join(&filename), &result.lyrics)?;

        let access_seq = self.bump_seq();
        self.index.entries.insert(
            key.clone(),
            CacheEntry {
                filename,
                source_id: result.source_id.clone(),
                last_accessed: now(),
                access_seq,
            },
        );

        while self.index.entries.len() > self.max_entries {
            if !self.evict_oldest(&key) {
                break;
            }
        }
        self.save_index()
    }

    /// Remove the least recently used entry other than `keep`. False when
    /// there is nothing else to remove.
    fn evict_oldest(&mut self, keep: &str) -> bool {
        let Some(evict_key) = self
            .index
            .entries
            .iter()
            .filter(|(key, _)| key.as_str() != keep)
            .min_by_key(|(_, entry)| (entry.last_accessed, entry.access_seq))
            .map(|(key, _)| key.clone())
        else {
            return false;
        };

        debug!("Cache limit reached. Evicting oldest entry: {}", evict_key);
        if let Some(evicted) = self.index.entries.remove(&evict_key) {
            let path = self.dir.join(evicted.filename);
            if let Err(e) = fs::remove_file(&path) {
                warn!("Failed to delete evicted cache file '{}': {}", path.display(), e);
            }
        }
        true
    }

    fn save_index(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.index)?;
        fs::write(self.dir.join(INDEX_FILE_NAME), content)?;
        Ok(())
    }

    #[cfg(test)]
    fn backdate(&mut self, artist: &str, title: &str, timestamp: i64) {
        if let Some(entry) = self.index.entries.get_mut(&generate_key(artist, title)) {
            entry.last_accessed = timestamp;
        }
        let _ = self.save_index();
    }
}
