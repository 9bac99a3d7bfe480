use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use common::Quality;

/// Rating token as embedded in feed summaries, e.g. `IMDB Rating: 7.5/10`.
static RATING_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"IMDB Rating: [0-9]\.[0-9]/10").unwrap());

/// One feed entry reduced to the fields extraction consumes.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub title: String,
    pub summary: String,
    pub links: Vec<String>,
}

/// Why a single entry could not be turned into a `MovieRecord`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("summary carries no IMDB rating token")]
    MissingRating,

    #[error("entry has {links} link(s), the download link is expected at index 1")]
    MissingDownloadLink { links: usize },
}

/// A movie release extracted from one feed entry.
///
/// Constructed once from exactly one `RawEntry` and never mutated afterwards.
/// `Serialize` so the email template can iterate the fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieRecord {
    /// Title verbatim as the feed published it
    pub title: String,
    /// Title with the bracketed quality tag and its separating whitespace removed
    pub clean_title: String,
    pub quality: Option<Quality>,
    /// The full rating token, e.g. `IMDB Rating: 7.5/10`
    pub imdb_rating: String,
    pub synopsis: String,
    pub download_link: String,
}

/// Turn one raw entry into a structured record. Pure and deterministic.
pub fn extract(entry: &RawEntry) -> Result<MovieRecord, ExtractError> {
    let quality = detect_quality(&entry.title);

    let imdb_rating = RATING_TOKEN
        .find(&entry.summary)
        .map(|m| m.as_str().to_string())
        .ok_or(ExtractError::MissingRating)?;

    let download_link = entry
        .links
        .get(1)
        .cloned()
        .ok_or(ExtractError::MissingDownloadLink {
            links: entry.links.len(),
        })?;

    Ok(MovieRecord {
        title: entry.title.clone(),
        clean_title: clean_title(&entry.title, quality),
        quality,
        imdb_rating,
        synopsis: synopsis_of(&entry.summary),
        download_link,
    })
}

/// Extract every entry, one result per entry. A malformed entry fails alone
/// and never aborts the rest of the batch; the caller decides what to do
/// with the failures.
pub fn extract_all(entries: &[RawEntry]) -> Vec<Result<MovieRecord, ExtractError>> {
    entries.iter().map(extract).collect()
}

/// Keep only the records whose quality matches, preserving input order.
/// An empty result is a normal outcome, not an error.
pub fn filter_by_quality(records: &[MovieRecord], quality: Quality) -> Vec<MovieRecord> {
    records
        .iter()
        .filter(|m| m.quality == Some(quality))
        .cloned()
        .collect()
}

/// Probe the title for each bracketed tag in the fixed order; first match wins.
fn detect_quality(title: &str) -> Option<Quality> {
    Quality::ALL
        .iter()
        .copied()
        .find(|q| title.contains(q.bracket_tag()))
}

/// Remove the matched tag substring and the whitespace joining it to the rest
/// of the title. Titles without a recognized tag come back unchanged.
fn clean_title(title: &str, quality: Option<Quality>) -> String {
    let Some(quality) = quality else {
        return title.to_string();
    };
    let tag = quality.bracket_tag();
    let Some(pos) = title.find(tag) else {
        return title.to_string();
    };

    let before = title[..pos].trim_end();
    let after = title[pos + tag.len()..].trim_start();
    if before.is_empty() || after.is_empty() {
        format!("{}{}", before, after)
    } else {
        format!("{} {}", before, after)
    }
}

/// Text tail of the summary after its final markup tag.
///
/// Summaries without any `>` come back whole. Closing tags at the very end
/// (`...synopsis</p>`) would leave an empty tail, so they are dropped before
/// taking the text after the last remaining `>`.
fn synopsis_of(summary: &str) -> String {
    if !summary.contains('>') {
        return summary.to_string();
    }

    let mut tail = summary.trim_end();
    while tail.ends_with('>') {
        match tail.rfind('<') {
            Some(idx) => tail = tail[..idx].trim_end(),
            None => break,
        }
    }

    match tail.rfind('>') {
        Some(idx) => tail[idx + 1..].to_string(),
        None => tail.to_string(),
    }
}
