//! Lyric site adapters.
//!
//! Every site gets one [`SourceAdapter`] implementation. Adapters search the
//! site, pick a candidate page, fetch it and turn the site's markup into
//! plain text. The selectors each one depends on are named constants in its
//! module, so a site redesign breaks exactly one constant.

mod azlyrics;
mod lyricsfreak;
mod songlyrics;

use std::sync::Arc;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Node, Selector};

use crate::error::{Error, Result};
use crate::fetch::DocumentFetcher;

pub use azlyrics::AzLyrics;
pub use lyricsfreak::LyricsFreak;
pub use songlyrics::SongLyrics;

/// One lyric website.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable identifier recorded as the lyrics' provenance.
    fn id(&self) -> &str;

    /// `Ok(None)` when the site has nothing usable for this song. Errors are
    /// reserved for transport failures and unreadable documents.
    async fn resolve(&self, artist: &str, title: &str) -> Result<Option<String>>;
}

/// A search-result link considered as the song's page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCandidate {
    pub display_text: String,
    pub target_url: String,
}

impl SearchCandidate {
    fn from_link(link: ElementRef<'_>, base_url: &str) -> Option<Self> {
        let href = link.value().attr("href")?.trim();
        if href.is_empty() {
            return None;
        }
        Some(Self {
            display_text: element_text(link),
            target_url: join_url(base_url, href),
        })
    }
}

/// Source ids in the default priority order.
pub const DEFAULT_ORDER: [&str; 3] = [songlyrics::ID, lyricsfreak::ID, azlyrics::ID];

/// Build the adapter for `id`, if it names a known site.
pub fn adapter_for(id: &str, fetcher: Arc<dyn DocumentFetcher>) -> Option<Box<dyn SourceAdapter>> {
    match id {
        songlyrics::ID => Some(Box::new(SongLyrics::new(fetcher))),
        lyricsfreak::ID => Some(Box::new(LyricsFreak::new(fetcher))),
        azlyrics::ID => Some(Box::new(AzLyrics::new(fetcher))),
        _ => None,
    }
}

/// Parse a fetched body as HTML. A body with no markup at all is treated as
/// unreadable rather than as an empty page.
pub(crate) fn parse_html(body: &str, url: &str) -> Result<Html> {
    if body.trim().is_empty() || !body.contains('<') {
        return Err(Error::Parse(format!("{url} did not return an HTML document")));
    }
    Ok(Html::parse_document(body))
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Parse(format!("Invalid CSS selector '{css}': {e:?}")))
}

/// All text below `element`, markup dropped.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Like [`element_text`], but every `<br>` becomes a newline and script or
/// style bodies are skipped.
pub(crate) fn text_with_breaks(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => {
                let in_code = node
                    .parent()
                    .and_then(|p| p.value().as_element().map(|e| matches!(e.name(), "script" | "style")))
                    .unwrap_or(false);
                if !in_code {
                    out.push_str(text);
                }
            }
            Node::Element(e) if e.name() == "br" => out.push('\n'),
            _ => {}
        }
    }
    out
}

pub(crate) fn join_url(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("http://{rest}")
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            href.trim_start_matches('/')
        )
    }
}

fn query_value(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::StaticFetcher;

    fn first<'a>(doc: &'a Html, css: &str) -> ElementRef<'a> {
        doc.select(&selector(css).unwrap()).next().unwrap()
    }

    #[test]
    fn breaks_become_newlines() {
        let doc = Html::parse_document(
            "<div id='x'>one<br>two<br/>three<BR />four<script>var a = 1;</script></div>",
        );
        assert_eq!(text_with_breaks(first(&doc, "#x")), "one\ntwo\nthree\nfour");
    }

    #[test]
    fn nested_markup_is_stripped() {
        let doc = Html::parse_document("<p id='x'>I <b>said</b> <a href='#'>hey</a> &amp; ho</p>");
        assert_eq!(element_text(first(&doc, "#x")), "I said hey & ho");
    }

    #[test]
    fn rejects_bodies_without_markup() {
        assert!(matches!(parse_html("", "u"), Err(Error::Parse(_))));
        assert!(matches!(parse_html("plain text", "u"), Err(Error::Parse(_))));
        assert!(parse_html("<html></html>", "u").is_ok());
    }

    #[test]
    fn joins_relative_links() {
        assert_eq!(join_url("http://a.com", "/x/y.html"), "http://a.com/x/y.html");
        assert_eq!(join_url("http://a.com/", "x.html"), "http://a.com/x.html");
        assert_eq!(join_url("http://a.com", "https://b.com/z"), "https://b.com/z");
        assert_eq!(join_url("http://a.com", "//b.com/z"), "http://b.com/z");
    }

    #[test]
    fn candidate_requires_href() {
        let doc = Html::parse_document("<a id='n'>no link</a><a id='y' href='/s'> Song </a>");
        assert!(SearchCandidate::from_link(first(&doc, "#n"), "http://a.com").is_none());
        assert_eq!(
            SearchCandidate::from_link(first(&doc, "#y"), "http://a.com"),
            Some(SearchCandidate {
                display_text: " Song ".into(),
                target_url: "http://a.com/s".into(),
            })
        );
    }

    #[test]
    fn every_default_source_has_an_adapter() {
        let fetcher: Arc<dyn DocumentFetcher> = Arc::new(StaticFetcher::new());
        let ids: Vec<String> = DEFAULT_ORDER
            .iter()
            .filter_map(|id| adapter_for(id, Arc::clone(&fetcher)))
            .map(|a| a.id().to_string())
            .collect();
        assert_eq!(ids, DEFAULT_ORDER);
        assert!(adapter_for("genius.com", Arc::new(StaticFetcher::new())).is_none());
    }
}
