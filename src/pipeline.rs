//! Chart → lyrics → corpus batch driver.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::cache::LyricsCache;
use crate::chart::{ChartEntry, ChartFetcher};
use crate::clean::clean;
use crate::corpus::{self, Corpus, SongRecord};
use crate::error::Result;
use crate::resolver::{LyricsResolver, LyricsResult};

/// Outcome of one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub dir: PathBuf,
    pub songs: usize,
    /// Chart entries no source had lyrics for.
    pub missing: Vec<ChartEntry>,
}

impl BatchReport {
    pub fn resolved(&self) -> usize {
        self.songs - self.missing.len()
    }
}

pub struct Pipeline {
    resolver: LyricsResolver,
    cache: Option<LyricsCache>,
}

impl Pipeline {
    pub fn new(resolver: LyricsResolver, cache: Option<LyricsCache>) -> Self {
        Self { resolver, cache }
    }

    /// Cached lyrics if present, otherwise ask the sites and remember the
    /// answer. A cached answer from a site that is no longer configured is
    /// ignored.
    pub async fn lyrics_for(&mut self, artist: &str, title: &str) -> Option<LyricsResult> {
        if let Some(hit) = self.cache.as_mut().and_then(|c| c.get(artist, title)) {
            if self.resolver.source_ids().any(|id| id == hit.source_id) {
                info!("Using cached lyrics for {} - {} ({})", artist, title, hit.source_id);
                return Some(hit);
            }
            debug!(
                "Ignoring cached lyrics for {} - {} from unconfigured source {}",
                artist, title, hit.source_id
            );
        }

        let result = self.resolver.resolve_all_sources(artist, title).await?;
        if let Some(cache) = self.cache.as_mut() {
            if let Err(e) = cache.put(artist, title, &result) {
                warn!("Failed to cache lyrics for {} - {}: {}", artist, title, e);
            }
        }
        Some(result)
    }

    /// Fetch the chart and save every song's lyrics into a dated raw
    /// directory. Songs without lyrics are recorded with empty source and
    /// file columns; they never stop the batch.
    pub async fn download(
        &mut self,
        chart: &dyn ChartFetcher,
        corpus: &Corpus,
        date: NaiveDate,
        clean_lyrics: bool,
    ) -> Result<BatchReport> {
        let entries = chart.fetch_chart().await?;
        let dir = corpus.create_dated_raw_dir(date)?;

        let mut records = Vec::with_capacity(entries.len());
        let mut missing = Vec::new();
        for (i, entry) in entries.into_iter().enumerate() {
            info!("[{}] {} - {}", i + 1, entry.artist, entry.title);
            let record = match self.lyrics_for(&entry.artist, &entry.title).await {
                Some(found) => {
                    let lyrics = if clean_lyrics { clean(&found.lyrics) } else { found.lyrics };
                    let file = corpus::save_lyrics(&dir, &entry.artist, &entry.title, &lyrics)?;
                    SongRecord {
                        entry,
                        lyrics_source: Some(found.source_id),
                        lyrics_file: Some(file),
                    }
                }
                None => {
                    warn!("Unable to fetch lyrics for: {} - {}", entry.artist, entry.title);
                    missing.push(entry.clone());
                    SongRecord {
                        entry,
                        lyrics_source: None,
                        lyrics_file: None,
                    }
                }
            };
            records.push(record);
        }

        corpus::write_songs(&dir, &records)?;
        let report = BatchReport {
            dir,
            songs: records.len(),
            missing,
        };
        info!(
            "Saved {} of {} songs to {}",
            report.resolved(),
            report.songs,
            report.dir.display()
        );
        Ok(report)
    }
}

/// Write cleaned copies of a raw batch into `processed/<same name>/`.
pub fn clean_batch(corpus: &Corpus, raw_batch: &Path) -> Result<PathBuf> {
    let songs = corpus::load_songs(raw_batch)?;
    let out = corpus.processed_dir_for(raw_batch)?;
    fs::create_dir_all(&out)?;

    let mut records = Vec::with_capacity(songs.len());
    for song in songs {
        if let Some(file) = &song.record.lyrics_file {
            fs::write(out.join(file), clean(&song.lyrics))?;
        }
        records.push(song.record);
    }
    corpus::write_songs(&out, &records)?;
    info!("Cleaned {} songs into {}", records.len(), out.display());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::Error;
    use crate::sources::SourceAdapter;

    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl SourceAdapter for Fixed {
        fn id(&self) -> &str {
            "fixed.test"
        }

        async fn resolve(&self, _artist: &str, title: &str) -> Result<Option<String>> {
            match (self.0, title) {
                (_, "Missing") => Ok(None),
                (Some(text), _) => Ok(Some(text.to_string())),
                (None, _) => Err(Error::fetch("http://fixed.test", "down")),
            }
        }
    }

    struct StaticChart(Vec<ChartEntry>);

    #[async_trait]
    impl ChartFetcher for StaticChart {
        async fn fetch_chart(&self) -> Result<Vec<ChartEntry>> {
            Ok(self.0.clone())
        }
    }

    struct DownChart;

    #[async_trait]
    impl ChartFetcher for DownChart {
        async fn fetch_chart(&self) -> Result<Vec<ChartEntry>> {
            Err(Error::SourceUnavailable("chart feed: connection refused".into()))
        }
    }

    fn entry(artist: &str, title: &str, rank: u32) -> ChartEntry {
        ChartEntry {
            artist: artist.into(),
            title: title.into(),
            rank_this_week: rank,
            rank_last_week: rank + 1,
        }
    }

    fn pipeline(reply: Option<&'static str>, cache: Option<LyricsCache>) -> Pipeline {
        Pipeline::new(LyricsResolver::new(vec![Box::new(Fixed(reply))]), cache)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    }

    #[tokio::test]
    async fn download_records_missing_songs_and_continues() {
        let root = tempfile::tempdir().unwrap();
        let corpus = Corpus::new(root.path());
        let chart = StaticChart(vec![
            entry("Adele", "Missing", 1),
            entry("Adele", "Hello", 2),
        ]);

        let report = pipeline(Some("[Verse]\nHello\nProduced by Greg"), None)
            .download(&chart, &corpus, date(), true)
            .await
            .unwrap();

        assert_eq!(report.songs, 2);
        assert_eq!(report.resolved(), 1);
        assert_eq!(report.missing, vec![entry("Adele", "Missing", 1)]);

        let songs = corpus::load_songs(&report.dir).unwrap();
        assert_eq!(songs[0].record.lyrics_source, None);
        assert_eq!(songs[0].record.lyrics_file, None);
        assert_eq!(songs[1].record.lyrics_source.as_deref(), Some("fixed.test"));
        assert_eq!(songs[1].record.lyrics_file.as_deref(), Some("adele-hello.txt"));
        assert_eq!(songs[1].lyrics, "\nHello\n");
    }

    #[tokio::test]
    async fn raw_download_keeps_tags() {
        let root = tempfile::tempdir().unwrap();
        let corpus = Corpus::new(root.path());
        let chart = StaticChart(vec![entry("Adele", "Hello", 1)]);

        let report = pipeline(Some("[Verse]\nHello"), None)
            .download(&chart, &corpus, date(), false)
            .await
            .unwrap();
        let songs = corpus::load_songs(&report.dir).unwrap();
        assert_eq!(songs[0].lyrics, "[Verse]\nHello");
    }

    #[tokio::test]
    async fn chart_failure_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let corpus = Corpus::new(root.path());
        let err = pipeline(Some("x"), None)
            .download(&DownChart, &corpus, date(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn cache_answers_when_sources_are_down() {
        let cache_dir = tempfile::tempdir().unwrap();
        let cache = LyricsCache::open(cache_dir.path(), 10).unwrap();
        let found = pipeline(Some("la la"), Some(cache)).lyrics_for("A", "B").await;
        assert_eq!(found.map(|r| r.lyrics).as_deref(), Some("la la"));

        let cache = LyricsCache::open(cache_dir.path(), 10).unwrap();
        let mut offline = pipeline(None, Some(cache));
        let cached = offline.lyrics_for("A", "B").await.unwrap();
        assert_eq!(cached.source_id, "fixed.test");
        assert_eq!(cached.lyrics, "la la");
        assert_eq!(offline.lyrics_for("A", "C").await, None);
    }

    #[tokio::test]
    async fn cache_hit_from_unconfigured_source_is_ignored() {
        let cache_dir = tempfile::tempdir().unwrap();
        let mut cache = LyricsCache::open(cache_dir.path(), 10).unwrap();
        let stale = LyricsResult {
            source_id: "azlyrics.com".into(),
            lyrics: "old words".into(),
        };
        cache.put("A", "B", &stale).unwrap();

        let mut pipeline = pipeline(Some("new words"), Some(cache));
        let found = pipeline.lyrics_for("A", "B").await.unwrap();
        assert_eq!(found.source_id, "fixed.test");
        assert_eq!(found.lyrics, "new words");

        // The fresh answer replaced the stale entry.
        let mut cache = LyricsCache::open(cache_dir.path(), 10).unwrap();
        assert_eq!(cache.get("A", "B").map(|r| r.source_id).as_deref(), Some("fixed.test"));
    }

    #[test]
    fn clean_batch_rejects_paths_outside_the_batch() {
        let root = tempfile::tempdir().unwrap();
        let corpus = Corpus::new(root.path());
        let batch = corpus.create_dated_raw_dir(date()).unwrap();
        fs::write(root.path().join("raw").join("x.txt"), "outside").unwrap();
        let record = SongRecord {
            entry: entry("Adele", "Hello", 1),
            lyrics_source: Some("fixed.test".into()),
            lyrics_file: Some("../x.txt".into()),
        };
        corpus::write_songs(&batch, &[record]).unwrap();

        let err = clean_batch(&corpus, &batch).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert!(!root.path().join("processed").join("x.txt").exists());
    }

    #[tokio::test]
    async fn clean_batch_writes_processed_copy() {
        let root = tempfile::tempdir().unwrap();
        let corpus = Corpus::new(root.path());
        let chart = StaticChart(vec![entry("Adele", "Hello", 1), entry("Adele", "Missing", 2)]);
        let report = pipeline(Some("[Chorus]\nHello\nProduced by Greg"), None)
            .download(&chart, &corpus, date(), false)
            .await
            .unwrap();

        let out = clean_batch(&corpus, &report.dir).unwrap();
        assert_eq!(out, root.path().join("processed").join("31-01-2024"));

        let cleaned = corpus::load_songs(&out).unwrap();
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].lyrics, "\nHello\n");
        assert_eq!(cleaned[1].record.lyrics_file, None);
    }
}
