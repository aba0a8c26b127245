use std::sync::LazyLock;

use regex::Regex;

// Section headers like "[Chorus]" or "[Verse 2: Drake]". Never spans lines.
static SECTION_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]").expect("section tag pattern"));

// "Produced by ..." credits, through end of line.
static PRODUCER_CREDIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[Pp]roduced.*").expect("producer credit pattern"));

/// Strip bracketed section tags, then producer credit lines.
///
/// Tags go first because a credit can sit after a tag on the same line.
/// Line structure is kept; only the matched text is removed. Running this on
/// its own output changes nothing.
pub fn clean(lyrics: &str) -> String {
    let untagged = SECTION_TAG.replace_all(lyrics, "");
    PRODUCER_CREDIT.replace_all(&untagged, "").into_owned()
}
