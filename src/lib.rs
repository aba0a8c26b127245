//! Builds a lyrics corpus from a weekly music chart.
//!
//! Lyrics are looked up on several lyric sites in priority order; the first
//! site with a usable answer wins. See [`resolver::LyricsResolver`].

pub mod artist;
pub mod cache;
pub mod chart;
pub mod clean;
pub mod config;
pub mod corpus;
mod csv;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod resolver;
pub mod sources;
pub mod swear;

pub use error::{Error, Result};
