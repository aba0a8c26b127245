// songlyrics.com: structured search results, first hit wins.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{SearchCandidate, SourceAdapter, element_text, parse_html, query_value, selector};
use crate::artist;
use crate::error::Result;
use crate::fetch::DocumentFetcher;

pub(super) const ID: &str = "songlyrics.com";
const BASE_URL: &str = "http://www.songlyrics.com";

const RESULT_LINK: &str = "div.serpresult > h3 > a";
const LYRICS_NODE: &str = "p#songLyricsDiv";

pub struct SongLyrics {
    fetcher: Arc<dyn DocumentFetcher>,
    base_url: String,
}

impl SongLyrics {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self::with_base_url(fetcher, BASE_URL)
    }

    pub fn with_base_url(fetcher: Arc<dyn DocumentFetcher>, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
        }
    }

    pub(crate) fn search_url(&self, artist: &str, title: &str) -> String {
        let terms = format!("{} {}", artist::normalize(artist), title);
        format!(
            "{}/index.php?section=search&searchW={}&submit=Search&searchIn1=artist&searchIn3=song",
            self.base_url.trim_end_matches('/'),
            query_value(&terms)
        )
    }

    fn pick_candidate(&self, body: &str, url: &str) -> Result<Option<SearchCandidate>> {
        let doc = parse_html(body, url)?;
        let links = selector(RESULT_LINK)?;
        Ok(doc
            .select(&links)
            .next()
            .and_then(|link| SearchCandidate::from_link(link, &self.base_url)))
    }
}

fn extract_lyrics(body: &str, url: &str) -> Result<Option<String>> {
    let doc = parse_html(body, url)?;
    let node = selector(LYRICS_NODE)?;
    Ok(doc.select(&node).next().map(element_text))
}

#[async_trait]
impl SourceAdapter for SongLyrics {
    fn id(&self) -> &str {
        ID
    }

    async fn resolve(&self, artist: &str, title: &str) -> Result<Option<String>> {
        let url = self.search_url(artist, title);
        let results = self.fetcher.fetch(&url).await?;
        let Some(candidate) = self.pick_candidate(&results, &url)? else {
            debug!("{}: no search results for {} - {}", ID, artist, title);
            return Ok(None);
        };

        let page = self.fetcher.fetch(&candidate.target_url).await?;
        extract_lyrics(&page, &candidate.target_url)
    }
}
