//! On-disk corpus layout.
//!
//! ```text
//! <root>/raw/<dd-mm-YYYY>/songs.csv        one row per chart entry
//! <root>/raw/<dd-mm-YYYY>/<slug>.txt       lyrics, one file per song
//! <root>/processed/<dd-mm-YYYY>/...        cleaned copies
//! <root>/processed/swear-words.txt
//! <root>/processed/stopwords.txt
//! ```

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, warn};

use crate::chart::ChartEntry;
use crate::csv;
use crate::error::{Error, Result};

pub const SONGS_FILE: &str = "songs.csv";
pub const SWEAR_WORDS_FILE: &str = "swear-words.txt";
pub const STOP_WORDS_FILE: &str = "stopwords.txt";
const DATE_DIR_FORMAT: &str = "%d-%m-%Y";

const HEADER: [&str; 6] = [
    "artist",
    "title",
    "rank_this_week",
    "rank_last_week",
    "lyrics_source",
    "lyrics_file",
];

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern"));

/// A chart entry as persisted in `songs.csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongRecord {
    pub entry: ChartEntry,
    /// Source id, `None` when no site had lyrics.
    pub lyrics_source: Option<String>,
    /// File name inside the same directory, `None` when nothing was saved.
    pub lyrics_file: Option<String>,
}

/// A record read back together with its lyrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSong {
    pub record: SongRecord,
    /// Empty when the record has no lyrics file.
    pub lyrics: String,
    pub lyrics_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Corpus {
    root: PathBuf,
}

impl Corpus {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join("processed")
    }

    /// Dated batch directories under `raw/`, sorted by name.
    pub fn raw_dirs(&self) -> Result<Vec<PathBuf>> {
        subdirs(&self.raw_dir())
    }

    pub fn processed_dirs(&self) -> Result<Vec<PathBuf>> {
        subdirs(&self.processed_dir())
    }

    pub fn create_dated_raw_dir(&self, date: NaiveDate) -> Result<PathBuf> {
        let dir = self.raw_dir().join(date.format(DATE_DIR_FORMAT).to_string());
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// `processed/<name>` for a raw batch directory `raw/<name>`.
    pub fn processed_dir_for(&self, raw_batch: &Path) -> Result<PathBuf> {
        let name = raw_batch
            .file_name()
            .ok_or_else(|| Error::Config(format!("{} has no directory name", raw_batch.display())))?;
        Ok(self.processed_dir().join(name))
    }

    pub fn swear_words(&self) -> Result<Vec<String>> {
        load_word_list(&self.processed_dir().join(SWEAR_WORDS_FILE))
    }

    pub fn stop_words(&self) -> Result<Vec<String>> {
        load_word_list(&self.processed_dir().join(STOP_WORDS_FILE))
    }
}

fn subdirs(path: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(path)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Filename-safe ASCII slug of `"<artist> <title>"`.
pub fn slugify(artist: &str, title: &str) -> String {
    let lowered = format!("{artist} {title}").to_lowercase();
    let slug = NON_ALNUM.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}

/// Write lyrics to `<dir>/<slug>.txt` and return the file name.
pub fn save_lyrics(dir: &Path, artist: &str, title: &str, lyrics: &str) -> Result<String> {
    let filename = format!("{}.txt", slugify(artist, title));
    let path = dir.join(&filename);
    if path.exists() {
        warn!("Overwriting {} with lyrics for {} - {}", path.display(), artist, title);
    }
    fs::write(&path, lyrics)?;
    debug!("Saved lyrics to {}", path.display());
    Ok(filename)
}

pub fn write_songs(dir: &Path, records: &[SongRecord]) -> Result<PathBuf> {
    let mut buf = Vec::new();
    csv::write_row(&mut buf, &HEADER)?;
    for r in records {
        csv::write_row(
            &mut buf,
            &[
                r.entry.artist.clone(),
                r.entry.title.clone(),
                r.entry.rank_this_week.to_string(),
                r.entry.rank_last_week.to_string(),
                r.lyrics_source.clone().unwrap_or_default(),
                r.lyrics_file.clone().unwrap_or_default(),
            ],
        )?;
    }

    let path = dir.join(SONGS_FILE);
    fs::write(&path, buf)?;
    Ok(path)
}

/// Read `songs.csv` in `dir` and the lyrics file of every row.
pub fn load_songs(dir: &Path) -> Result<Vec<StoredSong>> {
    let songs_path = dir.join(SONGS_FILE);
    let text = fs::read_to_string(&songs_path)?;
    let mut rows = csv::parse_rows(&text).into_iter();

    let header = rows
        .next()
        .ok_or_else(|| Error::Parse(format!("{} is empty", songs_path.display())))?;
    let column = |name: &str| {
        header
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| Error::Parse(format!("{} has no '{name}' column", songs_path.display())))
    };
    let [artist, title, this_week, last_week, source, file] = [
        column(HEADER[0])?,
        column(HEADER[1])?,
        column(HEADER[2])?,
        column(HEADER[3])?,
        column(HEADER[4])?,
        column(HEADER[5])?,
    ];

    let mut songs = Vec::new();
    for row in rows {
        let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or_default();
        let rank = |i: usize| {
            cell(i)
                .trim()
                .parse::<u32>()
                .map_err(|_| Error::Parse(format!("invalid rank '{}' in {}", cell(i), songs_path.display())))
        };
        let non_empty = |i: usize| Some(cell(i).to_string()).filter(|s| !s.is_empty());

        let record = SongRecord {
            entry: ChartEntry {
                artist: cell(artist).to_string(),
                title: cell(title).to_string(),
                rank_this_week: rank(this_week)?,
                rank_last_week: rank(last_week)?,
            },
            lyrics_source: non_empty(source),
            lyrics_file: non_empty(file),
        };

        let (lyrics, lyrics_path) = match &record.lyrics_file {
            Some(name) => {
                let path = dir.join(checked_file_name(name, &songs_path)?);
                (fs::read_to_string(&path)?, Some(path))
            }
            None => (String::new(), None),
        };
        songs.push(StoredSong {
            record,
            lyrics,
            lyrics_path,
        });
    }

    Ok(songs)
}

// `songs.csv` may only name files inside its own directory.
fn checked_file_name<'a>(name: &'a str, songs_path: &Path) -> Result<&'a str> {
    let mut parts = Path::new(name).components();
    match (parts.next(), parts.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        _ => Err(Error::Parse(format!(
            "lyrics file '{name}' in {} is not a plain file name",
            songs_path.display()
        ))),
    }
}

/// One word per line, trimmed, blank lines skipped.
pub fn load_word_list(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect())
}

pub fn write_word_list(path: &Path, words: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut text = words.join("\n");
    text.push('\n');
    fs::write(path, text)?;
    Ok(())
}
