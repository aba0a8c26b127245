// azlyrics.com: top search hit, lyrics located by position.
//
// The lyrics div carries no id or class, so it is found as the Nth div in
// document order. Any change to the page chrome above it moves the index;
// when that happens this source silently returns the wrong div or nothing.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{SearchCandidate, SourceAdapter, element_text, parse_html, query_value, selector};
use crate::artist;
use crate::error::Result;
use crate::fetch::DocumentFetcher;

pub(super) const ID: &str = "azlyrics.com";
const SEARCH_BASE_URL: &str = "http://search.azlyrics.com";

const RESULT_LINK: &str = r#"td > a[target="_blank"]"#;
const LYRICS_DIV_POSITION: usize = 22;

pub struct AzLyrics {
    fetcher: Arc<dyn DocumentFetcher>,
    search_base_url: String,
}

impl AzLyrics {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self::with_base_url(fetcher, SEARCH_BASE_URL)
    }

    pub fn with_base_url(fetcher: Arc<dyn DocumentFetcher>, search_base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            search_base_url: search_base_url.into(),
        }
    }

    pub(crate) fn search_url(&self, artist: &str, title: &str) -> String {
        let terms = format!("{} {}", title, artist::normalize(artist));
        format!(
            "{}/search.php?q={}",
            self.search_base_url.trim_end_matches('/'),
            query_value(&terms)
        )
    }

    fn pick_candidate(&self, body: &str, url: &str) -> Result<Option<SearchCandidate>> {
        let doc = parse_html(body, url)?;
        let links = selector(RESULT_LINK)?;
        Ok(doc
            .select(&links)
            .next()
            .and_then(|link| SearchCandidate::from_link(link, &self.search_base_url)))
    }
}

fn extract_lyrics(body: &str, url: &str) -> Result<Option<String>> {
    let doc = parse_html(body, url)?;
    let divs = selector("div")?;
    Ok(doc.select(&divs).nth(LYRICS_DIV_POSITION).map(element_text))
}

#[async_trait]
impl SourceAdapter for AzLyrics {
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
