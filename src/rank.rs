//! Deduplication and ranking of harvested candidates.
//!
//! Pure: normalizes raw counts into integers, drops exact-duplicate
//! candidate tuples, sorts descending by (views, pages) and truncates to
//! the configured cap. Malformed numeric input normalizes to 0 instead of
//! being rejected.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::RankConfig;
use crate::models::{RankedRecord, RawCandidate};

/// Thousands separators stripped before the digit run is taken.
const SEPARATORS: &[char] = &[',', ' ', '\u{00a0}', '\u{202f}'];

fn digit_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid digit pattern"))
}

/// Coerce a raw display count ("12,345 vues", "7 pages", "N/A") to a number.
///
/// Strips separators, takes the first run of digits, defaults to 0 when no
/// digits are present.
pub fn normalize_count(raw: &str) -> u64 {
    let stripped: String = raw.chars().filter(|c| !SEPARATORS.contains(c)).collect();
    digit_run()
        .find(&stripped)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Deduplicates, normalizes and orders candidates.
pub struct Ranker<'a> {
    config: &'a RankConfig,
}

impl<'a> Ranker<'a> {
    pub fn new(config: &'a RankConfig) -> Self {
        Self { config }
    }

    /// Produce the ranked list: exact-tuple dedup (first occurrence wins),
    /// stable descending (views, pages) order, truncated to the cap.
    ///
    /// Identity is the full candidate tuple, not the URL: two listings of
    /// one document observed with different view counts stay distinct.
    pub fn rank(&self, candidates: Vec<RawCandidate>) -> Vec<RankedRecord> {
        let mut seen = HashSet::new();
        let mut records: Vec<RankedRecord> = candidates
            .into_iter()
            .filter(|candidate| seen.insert(candidate.clone()))
            .map(|candidate| RankedRecord {
                views: normalize_count(&candidate.views_raw),
                pages: normalize_count(&candidate.pages_raw),
                title: candidate.title,
                url: candidate.url,
                upload_date: candidate.upload_date_raw,
            })
            .collect();

        // Stable: ties beyond (views, pages) keep harvest order
        records.sort_by(|a, b| (b.views, b.pages).cmp(&(a.views, a.pages)));
        records.truncate(self.config.max_results);
        records
    }
}
