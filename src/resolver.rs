//! First-success lyric resolution across an ordered list of sites.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::sources::SourceAdapter;

/// Lyrics together with the site they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricsResult {
    pub source_id: String,
    pub lyrics: String,
}

/// Tries adapters strictly in the order given and keeps the first non-empty
/// answer. A failing site never stops the search; its error is logged and
/// the next site is asked.
pub struct LyricsResolver {
    adapters: Vec<Box<dyn SourceAdapter>>,
}

impl LyricsResolver {
    pub fn new(adapters: Vec<Box<dyn SourceAdapter>>) -> Self {
        Self { adapters }
    }

    pub fn source_ids(&self) -> impl Iterator<Item = &str> {
        self.adapters.iter().map(|a| a.id())
    }

    pub async fn resolve_all_sources(&self, artist: &str, title: &str) -> Option<LyricsResult> {
        for adapter in &self.adapters {
            match adapter.resolve(artist, title).await {
                Ok(Some(lyrics)) if !lyrics.trim().is_empty() => {
                    info!("Found lyrics for {} - {} on {}", artist, title, adapter.id());
                    return Some(LyricsResult {
                        source_id: adapter.id().to_string(),
                        lyrics,
                    });
                }
                Ok(_) => debug!("{} has no lyrics for {} - {}", adapter.id(), artist, title),
                Err(e) => warn!("{} failed for {} - {}: {}", adapter.id(), artist, title, e),
            }
        }

        info!("No source had lyrics for {} - {}", artist, title);
        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::{Error, Result};

    enum Reply {
        Fails,
        Absent,
        Lyrics(&'static str),
    }

    struct Scripted {
        id: &'static str,
        reply: Reply,
        calls: Arc<AtomicUsize>,
    }

    fn scripted(id: &'static str, reply: Reply) -> (Box<dyn SourceAdapter>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let adapter = Scripted {
            id,
            reply,
            calls: Arc::clone(&calls),
        };
        (Box::new(adapter), calls)
    }

    #[async_trait]
    impl SourceAdapter for Scripted {
        fn id(&self) -> &str {
            self.id
        }

        async fn resolve(&self, _artist: &str, _title: &str) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Reply::Fails => Err(Error::fetch("http://down.test", "connection refused")),
                Reply::Absent => Ok(None),
                Reply::Lyrics(text) => Ok(Some(text.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn failures_are_skipped() {
        let (a, _) = scripted("songlyrics.com", Reply::Fails);
        let (b, _) = scripted("azlyrics.com", Reply::Fails);
        let (c, _) = scripted("lyricsfreak.com", Reply::Lyrics("la la la"));
        let resolver = LyricsResolver::new(vec![a, b, c]);

        assert_eq!(
            resolver.resolve_all_sources("Artist", "Song").await,
            Some(LyricsResult {
                source_id: "lyricsfreak.com".into(),
                lyrics: "la la la".into(),
            })
        );
    }

    #[tokio::test]
    async fn all_absent_gives_nothing() {
        let (a, _) = scripted("a", Reply::Absent);
        let (b, _) = scripted("b", Reply::Absent);
        let resolver = LyricsResolver::new(vec![a, b]);
        assert_eq!(resolver.resolve_all_sources("Artist", "Song").await, None);
    }

    #[tokio::test]
    async fn earlier_source_wins_and_later_ones_are_not_asked() {
        let (a, a_calls) = scripted("first", Reply::Lyrics("one"));
        let (b, b_calls) = scripted("second", Reply::Lyrics("two"));
        let resolver = LyricsResolver::new(vec![a, b]);

        let result = resolver.resolve_all_sources("Artist", "Song").await.unwrap();
        assert_eq!(result.source_id, "first");
        assert_eq!(result.lyrics, "one");
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blank_lyrics_do_not_count() {
        let (a, _) = scripted("blank", Reply::Lyrics("  \n "));
        let (b, _) = scripted("real", Reply::Lyrics("words"));
        let resolver = LyricsResolver::new(vec![a, b]);

        let result = resolver.resolve_all_sources("Artist", "Song").await.unwrap();
        assert_eq!(result.source_id, "real");
    }

    #[tokio::test]
    async fn empty_resolver_gives_nothing() {
        let resolver = LyricsResolver::new(Vec::new());
        assert_eq!(resolver.source_ids().count(), 0);
        assert_eq!(resolver.resolve_all_sources("Artist", "Song").await, None);
    }
}
