// Artist canonicalization used only for matching search results.

const FEATURING: &str = "featuring";
const CO_ARTIST: &str = "/";
const COLLABORATION: &str = " x ";

/// Reduce an artist credit to its primary artist, Unicode case-folded.
///
/// "Tyler featuring Xyz" and "Tyler" both give "tyler"; "A/B" and "A x B"
/// give "a". Not for display.
pub fn normalize(artist: &str) -> String {
    let folded = fold(artist);
    let primary = before(&folded, FEATURING);
    let primary = before(primary, CO_ARTIST);
    before(primary, COLLABORATION).to_string()
}

/// Full Unicode case folding, so "Straße" and "STRASSE" compare equal.
pub(crate) fn fold(s: &str) -> String {
    caseless::default_case_fold_str(s)
}

// Segment before the first `sep`, trimmed. Whole input when `sep` is absent.
fn before<'a>(s: &'a str, sep: &str) -> &'a str {
    s.split(sep).next().unwrap_or(s).trim()
}
