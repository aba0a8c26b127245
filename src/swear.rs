// Swear-word list scraped from an online profanity dictionary, one page per
// initial letter.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::Result;
use crate::fetch::DocumentFetcher;
use crate::sources::{parse_html, selector};

const BASE_URL: &str = "http://www.noswearing.com";
const WORD_ANCHOR: &str = r#"td[valign="top"] > a[name]"#;

pub struct SwearWordScraper {
    fetcher: Arc<dyn DocumentFetcher>,
    base_url: String,
}

impl SwearWordScraper {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self::with_base_url(fetcher, BASE_URL)
    }

    pub fn with_base_url(fetcher: Arc<dyn DocumentFetcher>, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
        }
    }

    fn letter_urls(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once('1')
            .chain('a'..='z')
            .map(|letter| format!("{}/dictionary/{letter}", self.base_url.trim_end_matches('/')))
    }

    /// Every word in the dictionary, lowercased, sorted and deduplicated.
    /// Letter pages that fail to load or parse are skipped.
    pub async fn scrape(&self) -> Result<Vec<String>> {
        let mut words = BTreeSet::new();
        for url in self.letter_urls() {
            let page = match self.fetcher.fetch(&url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Skipping {}: {}", url, e);
                    continue;
                }
            };
            match extract_words(&page, &url) {
                Ok(found) => words.extend(found),
                Err(e) => warn!("Skipping {}: {}", url, e),
            }
        }
        info!("Collected {} swear words", words.len());
        Ok(words.into_iter().collect())
    }
}

fn extract_words(body: &str, url: &str) -> Result<Vec<String>> {
    let doc = parse_html(body, url)?;
    let anchors = selector(WORD_ANCHOR)?;
    Ok(doc
        .select(&anchors)
        .filter_map(|a| a.value().attr("name"))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_lowercase)
        .collect())
}
