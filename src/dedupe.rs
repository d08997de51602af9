//! URL-keyed deduplication and record validation.
//!
//! Dedup runs before validation: the first record carrying a given canonical URL
//! owns that URL, even when it later turns out to be invalid. Records without a URL
//! have no key and always reach the validity filter.

use crate::ingest::{canonical_url, PostAdapter, RawRecord};
use crate::model::Post;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Accounting for one cleaning run.
///
/// `total_input == kept + duplicates_removed + invalid_removed` always holds, where
/// `kept` is the length of the returned post list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanStats {
    pub total_input: u64,
    pub duplicates_removed: u64,
    pub invalid_removed: u64,
    pub comments_cleaned: u64,
    pub comments_dropped: u64,
    pub values_defaulted: u64,
    /// Rejection reason -> count.
    pub rejections: BTreeMap<String, u64>,
}

impl CleanStats {
    pub fn kept(&self) -> u64 {
        self.total_input - self.duplicates_removed - self.invalid_removed
    }

    fn reject(&mut self, reason: String) {
        self.invalid_removed += 1;
        *self.rejections.entry(reason).or_insert(0) += 1;
    }
}

fn dedup_key(v: &Value) -> Option<String> {
    let obj = v.as_object()?;
    let raw = ["url", "link", "permalink"]
        .iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())?;
    let s = match raw {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let key = canonical_url(&s);
    if key.is_empty() { None } else { Some(key) }
}

/// Cleans an ordered batch of raw records into unique, valid posts.
#[derive(Clone, Debug, Default)]
pub struct Deduplicator {
    adapter: PostAdapter,
}

impl Deduplicator {
    pub fn new(adapter: PostAdapter) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &PostAdapter {
        &self.adapter
    }

    /// Never fails: every record ends up kept, counted as a duplicate, or counted
    /// as invalid with a reason.
    pub fn run(&self, records: Vec<RawRecord>) -> (Vec<Post>, CleanStats) {
        let mut stats = CleanStats { total_input: records.len() as u64, ..Default::default() };
        let mut seen: AHashSet<String> = AHashSet::with_capacity(records.len());
        let mut posts = Vec::with_capacity(records.len());

        for (idx, rec) in records.into_iter().enumerate() {
            if let Some(key) = dedup_key(&rec.value) {
                if !seen.insert(key) {
                    stats.duplicates_removed += 1;
                    continue;
                }
            }
            match self.adapter.adapt(&rec.value) {
                Ok(adapted) => {
                    stats.comments_cleaned += adapted.comments_kept;
                    stats.comments_dropped += adapted.comments_dropped;
                    stats.values_defaulted += adapted.values_defaulted;
                    posts.push(adapted.post);
                }
                Err(e) => {
                    tracing::debug!(
                        index = idx,
                        origin = rec.origin.as_deref().unwrap_or("-"),
                        field = e.field(),
                        error = %e,
                        "record rejected"
                    );
                    stats.reject(e.reason());
                }
            }
        }

        tracing::info!(
            input = stats.total_input,
            kept = posts.len(),
            duplicates = stats.duplicates_removed,
            invalid = stats.invalid_removed,
            comments_dropped = stats.comments_dropped,
            defaulted = stats.values_defaulted,
            "cleaning finished"
        );
        (posts, stats)
    }
}

/// Drop later posts whose URL repeats an earlier one. A no-op on the output of
/// [`Deduplicator::run`].
pub fn dedupe_posts(posts: Vec<Post>) -> Vec<Post> {
    let mut seen: AHashSet<String> = AHashSet::with_capacity(posts.len());
    posts.into_iter().filter(|p| seen.insert(canonical_url(&p.url))).collect()
}
