//! The installer content cache (§6.3, SPEC_FULL.md §4): the
//! `Downloader` writes every fetched artifact into
//! `config.cache_dir`, keyed by filename, not by content hash.
//! Eviction is a sweep a caller invokes explicitly, grounded on the
//! teacher's own target-directory cleanup pass plus `temp-dir`'s
//! cleanup-on-drop convention for the shorter-lived ZIP scratch space.

use crate::errors::CoreResult;
use camino::Utf8Path;
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Remove every entry directly under `cache_dir` whose modified time
/// is older than `max_age`. Not recursive: per-URL ZIP-extraction
/// scratch directories clean themselves up on drop and are never
/// swept here.
pub fn evict_stale(cache_dir: &Utf8Path, max_age: Duration) -> CoreResult<usize> {
    if !cache_dir.exists() {
        return Ok(0);
    }

    let now = SystemTime::now();
    let mut removed = 0;
    for entry in std::fs::read_dir(cache_dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if metadata.is_dir() {
            continue;
        }
        let age = metadata
            .modified()
            .ok()
            .and_then(|m| now.duration_since(m).ok())
            .unwrap_or_default();
        if age > max_age {
            debug!(path = ?entry.path(), ?age, "evicting stale cache entry");
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}
