use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

use lyric_corpus::cache::LyricsCache;
use lyric_corpus::chart::{BillboardChart, ChartFetcher};
use lyric_corpus::clean::clean;
use lyric_corpus::config::Config;
use lyric_corpus::corpus::{self, Corpus};
use lyric_corpus::fetch::{DocumentFetcher, HttpFetcher};
use lyric_corpus::pipeline::{self, Pipeline};
use lyric_corpus::resolver::LyricsResolver;
use lyric_corpus::sources;
use lyric_corpus::swear::SwearWordScraper;

#[derive(Debug, Parser)]
#[command(name = "lyric_corpus", version, about = "Chart lyrics corpus builder")]
struct Cli {
    /// Corpus root (overrides LYRICS_DATA_DIR).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Skip the lyrics cache.
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the current chart.
    Chart,
    /// Look up one song's lyrics and print them.
    Lyrics {
        artist: String,
        title: String,
        /// Print lyrics as scraped, without cleaning.
        #[arg(long)]
        raw: bool,
    },
    /// Save the whole chart with lyrics into data/raw/<date>.
    Download {
        /// Save lyrics as scraped, without cleaning.
        #[arg(long)]
        raw: bool,
    },
    /// Write cleaned copies of a raw batch into data/processed (latest batch by default).
    Clean { dir: Option<PathBuf> },
    /// Scrape the swear-word list into data/processed/swear-words.txt.
    SwearWords,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::from_env().context("load config")?;
    if let Some(dir) = cli.data_dir {
        cfg.data_dir = dir;
    }
    if cli.no_cache {
        cfg.cache_dir = None;
    }

    let fetcher: Arc<dyn DocumentFetcher> =
        Arc::new(HttpFetcher::new(cfg.timeout, cfg.proxy.as_deref()).context("build HTTP client")?);
    let corpus = Corpus::new(&cfg.data_dir);

    match cli.command {
        Command::Chart => {
            let chart = BillboardChart::new(fetcher, &cfg.chart_url);
            for entry in chart.fetch_chart().await? {
                println!(
                    "{:>3}. {} - {}  (last week: {})",
                    entry.rank_this_week, entry.artist, entry.title, entry.rank_last_week
                );
            }
        }
        Command::Lyrics { artist, title, raw } => {
            let mut pipeline = make_pipeline(&cfg, Arc::clone(&fetcher))?;
            match pipeline.lyrics_for(&artist, &title).await {
                Some(found) => {
                    println!("Source: {}\n", found.source_id);
                    if raw {
                        println!("{}", found.lyrics);
                    } else {
                        println!("{}", clean(&found.lyrics));
                    }
                }
                None => anyhow::bail!("no source has lyrics for {artist} - {title}"),
            }
        }
        Command::Download { raw } => {
            let chart = BillboardChart::new(Arc::clone(&fetcher), &cfg.chart_url);
            let mut pipeline = make_pipeline(&cfg, fetcher)?;
            let today = chrono::Local::now().date_naive();
            let report = pipeline
                .download(&chart, &corpus, today, !raw)
                .await
                .context("download chart lyrics")?;

            println!(
                "Saved {} of {} songs to {}",
                report.resolved(),
                report.songs,
                report.dir.display()
            );
            for entry in &report.missing {
                println!("  missing: {} - {}", entry.artist, entry.title);
            }
        }
        Command::Clean { dir } => {
            let dir = match dir {
                Some(dir) => dir,
                None => latest_raw_batch(&corpus)?,
            };
            let out = pipeline::clean_batch(&corpus, &dir)
                .with_context(|| format!("clean {}", dir.display()))?;
            println!("Wrote {}", out.display());
        }
        Command::SwearWords => {
            let words = SwearWordScraper::new(fetcher).scrape().await?;
            let path = corpus.processed_dir().join(corpus::SWEAR_WORDS_FILE);
            corpus::write_word_list(&path, &words)
                .with_context(|| format!("write {}", path.display()))?;
            println!("Wrote {} words to {}", words.len(), path.display());
        }
    }

    Ok(())
}

fn make_pipeline(cfg: &Config, fetcher: Arc<dyn DocumentFetcher>) -> anyhow::Result<Pipeline> {
    let mut adapters = Vec::with_capacity(cfg.sources.len());
    for id in &cfg.sources {
        let adapter = sources::adapter_for(id, Arc::clone(&fetcher))
            .with_context(|| format!("unknown lyrics source '{id}'"))?;
        adapters.push(adapter);
    }

    let cache = match &cfg.cache_dir {
        Some(dir) => Some(
            LyricsCache::open(dir, cfg.cache_max_entries)
                .with_context(|| format!("open cache {}", dir.display()))?,
        ),
        None => None,
    };

    Ok(Pipeline::new(LyricsResolver::new(adapters), cache))
}

fn latest_raw_batch(corpus: &Corpus) -> anyhow::Result<PathBuf> {
    corpus
        .raw_dirs()
        .with_context(|| format!("list {}", corpus.raw_dir().display()))?
        .into_iter()
        .max_by_key(|dir| {
            dir.file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| chrono::NaiveDate::parse_from_str(n, "%d-%m-%Y").ok())
        })
        .context("no raw batches to clean")
}
