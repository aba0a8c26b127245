//! Weekly chart feed.

use std::sync::Arc;

use async_trait::async_trait;
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::fetch::DocumentFetcher;

pub const BILLBOARD_HOT_100_URL: &str = "http://www.billboard.com/rss/charts/hot-100";

/// One song on the chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartEntry {
    pub artist: String,
    pub title: String,
    pub rank_this_week: u32,
    /// 0 when the song is new to the chart.
    pub rank_last_week: u32,
}

/// Produces the current chart listing.
#[async_trait]
pub trait ChartFetcher: Send + Sync {
    async fn fetch_chart(&self) -> Result<Vec<ChartEntry>>;
}

/// Billboard chart RSS feed.
pub struct BillboardChart {
    fetcher: Arc<dyn DocumentFetcher>,
    url: String,
}

impl BillboardChart {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, url: impl Into<String>) -> Self {
        Self {
            fetcher,
            url: url.into(),
        }
    }

    pub fn hot_100(fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self::new(fetcher, BILLBOARD_HOT_100_URL)
    }
}

#[async_trait]
impl ChartFetcher for BillboardChart {
    async fn fetch_chart(&self) -> Result<Vec<ChartEntry>> {
        let feed = self
            .fetcher
            .fetch(&self.url)
            .await
            .map_err(|e| Error::SourceUnavailable(format!("chart feed: {e}")))?;
        let entries = parse_chart_rss(&feed)
            .map_err(|e| Error::SourceUnavailable(format!("chart feed {}: {e}", self.url)))?;
        info!("Chart lists {} songs", entries.len());
        Ok(entries)
    }
}

#[derive(Default)]
struct RssItem {
    title: Option<String>,
    artist: Option<String>,
    rank_this_week: Option<String>,
    rank_last_week: Option<String>,
}

impl RssItem {
    fn field(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "chart_item_title" => Some(&mut self.title),
            "artist" => Some(&mut self.artist),
            "rank_this_week" => Some(&mut self.rank_this_week),
            "rank_last_week" => Some(&mut self.rank_last_week),
            _ => None,
        }
    }

    fn into_entry(self) -> Result<Option<ChartEntry>> {
        let (Some(title), Some(artist)) = (self.title, self.artist) else {
            return Ok(None);
        };
        let rank_this_week = parse_rank(self.rank_this_week.as_deref())?
            .ok_or_else(|| Error::Parse(format!("'{title}' has no rank_this_week")))?;
        let rank_last_week = parse_rank(self.rank_last_week.as_deref())?.unwrap_or(0);
        Ok(Some(ChartEntry {
            artist,
            title,
            rank_this_week,
            rank_last_week,
        }))
    }
}

fn parse_rank(raw: Option<&str>) -> Result<Option<u32>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| Error::Parse(format!("invalid rank '{s}'"))),
    }
}

/// Parse the `<item>` elements of a chart RSS document.
///
/// Items missing a title or an artist are skipped.
pub fn parse_chart_rss(xml: &str) -> Result<Vec<ChartEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut item: Option<RssItem> = None;
    let mut field: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "item" {
                    item = Some(RssItem::default());
                } else if item.is_some() {
                    field = Some(name);
                }
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::Parse(format!("bad text in chart feed: {e}")))?;
                push_text(&mut item, field.as_deref(), &text);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                push_text(&mut item, field.as_deref(), &text);
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"item" {
                    if let Some(done) = item.take() {
                        match done.into_entry()? {
                            Some(entry) => entries.push(entry),
                            None => warn!("Skipping chart item without title or artist"),
                        }
                    }
                }
                field = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Parse(format!(
                    "malformed chart feed at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
    }

    Ok(entries)
}

fn push_text(item: &mut Option<RssItem>, field: Option<&str>, text: &str) {
    if let (Some(item), Some(field)) = (item.as_mut(), field) {
        if let Some(slot) = item.field(field) {
            slot.get_or_insert_with(String::new).push_str(text);
        }
    }
}
