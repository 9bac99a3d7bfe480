use anyhow::{Context, Result};
use feed_rs::model::Feed;
use feed_rs::parser;
use reqwest::Client;
use std::time::Duration;

use crate::processing::RawEntry;

/// Fetches the release feed from the given URL and parses it.
///
/// One shot per run: no retries, no backoff. A failure here is reported to
/// the caller, which decides whether the run proceeds with no entries.
pub async fn fetch_and_parse_feed(url: &str, timeout_secs: u64) -> Result<Feed> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent("Reelscope/0.1.0")
        .build()
        .context("failed to build reqwest client")?;

    let response = client
        .get(url)
        .send()
        .await
        .context("network error during feed fetch")?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow::anyhow!("feed fetch failed with status: {}", status));
    }

    let bytes = response.bytes().await.context("failed to read response body")?;
    let feed = parser::parse(bytes.as_ref()).context("failed to parse feed")?;
    Ok(feed)
}

/// Reduce parsed feed entries to the fields extraction consumes.
///
/// Entries missing a title or summary keep going with an empty string; the
/// extractor decides what is fatal for a single entry. Link order is
/// preserved because the download link is positional.
pub fn raw_entries(feed: &Feed) -> Vec<RawEntry> {
    feed.entries
        .iter()
        .map(|entry| RawEntry {
            title: entry
                .title
                .as_ref()
                .map(|t| t.content.clone())
                .unwrap_or_default(),
            summary: entry
                .summary
                .as_ref()
                .map(|s| s.content.clone())
                .unwrap_or_default(),
            links: entry.links.iter().map(|l| l.href.clone()).collect(),
        })
        .collect()
}
