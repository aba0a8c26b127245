// lyricsfreak.com: title-only search whose result table lists the artist in
// the entry right before each song link.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{SearchCandidate, SourceAdapter, parse_html, query_value, selector, text_with_breaks};
use crate::artist;
use crate::error::Result;
use crate::fetch::DocumentFetcher;

pub(super) const ID: &str = "lyricsfreak.com";
const BASE_URL: &str = "http://www.lyricsfreak.com";

const RESULT_LINK: &str = "td > a";
const LYRICS_NODE: &str = "div#content_h";

pub struct LyricsFreak {
    fetcher: Arc<dyn DocumentFetcher>,
    base_url: String,
}

impl LyricsFreak {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self::with_base_url(fetcher, BASE_URL)
    }

    pub fn with_base_url(fetcher: Arc<dyn DocumentFetcher>, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
        }
    }

    pub(crate) fn search_url(&self, title: &str) -> String {
        format!(
            "{}/search.php?a=search&type=song&q={}",
            self.base_url.trim_end_matches('/'),
            query_value(title)
        )
    }

    /// The first link whose text holds the title while the link right before
    /// it holds the artist.
    fn pick_candidate(&self, body: &str, url: &str, artist: &str, title: &str) -> Result<Option<SearchCandidate>> {
        let doc = parse_html(body, url)?;
        let links = selector(RESULT_LINK)?;
        let title = artist::fold(title);

        let mut previous_is_artist = false;
        for link in doc.select(&links) {
            let text = artist::fold(&super::element_text(link));
            if previous_is_artist && text.contains(&title) {
                return Ok(SearchCandidate::from_link(link, &self.base_url));
            }
            previous_is_artist = text.contains(artist);
        }
        Ok(None)
    }
}

fn extract_lyrics(body: &str, url: &str) -> Result<Option<String>> {
    let doc = parse_html(body, url)?;
    let node = selector(LYRICS_NODE)?;
    Ok(doc.select(&node).next().map(text_with_breaks))
}

#[async_trait]
impl SourceAdapter for LyricsFreak {
    fn id(&self) -> &str {
        ID
    }

    async fn resolve(&self, artist: &str, title: &str) -> Result<Option<String>> {
        let primary = artist::normalize(artist);
        let url = self.search_url(title);
        let results = self.fetcher.fetch(&url).await?;
        let Some(candidate) = self.pick_candidate(&results, &url, &primary, title)? else {
            debug!("{}: no result pairs {} with {}", ID, primary, title);
            return Ok(None);
        };

        let page = self.fetcher.fetch(&candidate.target_url).await?;
        extract_lyrics(&page, &candidate.target_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::StaticFetcher;

    // Artist cell, then song cell, per row.
    const SEARCH: &str = r#"<html><body><table>
        <tr><td><a href="/a/adele/">Adele</a></td><td><a href="/a/adele/skyfall_20998.html">Skyfall</a></td></tr>
        <tr><td><a href="/s/some+band/">Some Band</a></td><td><a href="/s/some+band/hello_1.html">Hello</a></td></tr>
        <tr><td><a href="/a/adele/">Adele</a></td><td><a href="/a/adele/hello_21129580.html">Hello lyrics</a></td></tr>
    </table></body></html>"#;

    const PAGE: &str = r#"<html><body>
        <div id="content_h" class="dn">Hello, it's me<br>I was wondering<br />if after all these years</div>
    </body></html>"#;

    fn adapter(fetcher: StaticFetcher) -> LyricsFreak {
        LyricsFreak::with_base_url(Arc::new(fetcher), "http://lf.test")
    }

    #[test]
    fn searches_by_title_only() {
        assert_eq!(
            adapter(StaticFetcher::new()).search_url("Hello"),
            "http://lf.test/search.php?a=search&type=song&q=Hello"
        );
    }

    #[test]
    fn title_must_follow_matching_artist() {
        let a = adapter(StaticFetcher::new());
        let picked = a.pick_candidate(SEARCH, "u", "adele", "Hello").unwrap().unwrap();
        assert_eq!(picked.target_url, "http://lf.test/a/adele/hello_21129580.html");

        // "Hello" by Some Band is skipped: its preceding cell is not Adele.
        let none = a.pick_candidate(SEARCH, "u", "adele", "Rolling in the Deep").unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn matching_is_case_folded() {
        let body = r#"<table><tr>
            <td><a href="/r/rammstein/">RAMMSTEIN</a></td><td><a href="/r/rammstein/strasse.html">STRASSE</a></td>
        </tr></table>"#;
        let a = adapter(StaticFetcher::new());
        let picked = a
            .pick_candidate(body, "u", &artist::normalize("Rammstein"), "Straße")
            .unwrap()
            .unwrap();
        assert_eq!(picked.target_url, "http://lf.test/r/rammstein/strasse.html");
    }

    #[test]
    fn title_in_first_entry_is_not_selected() {
        let body = r#"<table><tr><td><a href="/x.html">Hello</a></td></tr></table>"#;
        let a = adapter(StaticFetcher::new());
        assert_eq!(a.pick_candidate(body, "u", "hello", "Hello").unwrap(), None);
    }

    #[tokio::test]
    async fn resolves_with_breaks_as_newlines() {
        let lookup = adapter(StaticFetcher::new());
        let fetcher = StaticFetcher::new()
            .with_page(lookup.search_url("Hello"), SEARCH)
            .with_page("http://lf.test/a/adele/hello_21129580.html", PAGE);

        let lyrics = adapter(fetcher).resolve("Adele featuring Nobody", "Hello").await.unwrap();
        assert_eq!(
            lyrics.as_deref(),
            Some("Hello, it's me\nI was wondering\nif after all these years")
        );
    }

    #[tokio::test]
    async fn missing_container_is_absent() {
        let lookup = adapter(StaticFetcher::new());
        let fetcher = StaticFetcher::new()
            .with_page(lookup.search_url("Hello"), SEARCH)
            .with_page("http://lf.test/a/adele/hello_21129580.html", "<html><body></body></html>");
        assert_eq!(adapter(fetcher).resolve("Adele", "Hello").await.unwrap(), None);
    }

    #[tokio::test]
    async fn garbage_search_page_is_a_parse_error() {
        let lookup = adapter(StaticFetcher::new());
        let fetcher = StaticFetcher::new().with_page(lookup.search_url("Hello"), "");
        let err = adapter(fetcher).resolve("Adele", "Hello").await.unwrap_err();
        assert!(matches!(err, crate::error::Error::Parse(_)));
    }
}
