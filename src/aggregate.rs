//! Generic parallel aggregation. Implement `Aggregator` for your aggregation state and
//! call `aggregate_parallel`: items are folded per rayon split, then the partial states
//! are merged left to right, so integer-valued states come out identical every run.

use crate::date::{format_canonical, parse_canonical};
use crate::model::Post;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::Date;

pub trait Aggregator<T: ?Sized>: Send + Default {
    fn ingest(&mut self, item: &T);
    fn merge(&mut self, other: Self);
}

pub fn aggregate_parallel<T, A>(items: &[T]) -> A
where
    T: Sync,
    A: Aggregator<T>,
{
    items
        .par_iter()
        .fold(A::default, |mut acc, item| {
            acc.ingest(item);
            acc
        })
        .reduce(A::default, |mut a, b| {
            a.merge(b);
            a
        })
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCounts {
    pub posts: u64,
    pub comments: u64,
}

/// Corpus shape: volume per platform and per year, and the covered date range.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusOverview {
    pub total_posts: u64,
    pub total_comments: u64,
    pub platforms: BTreeMap<String, PlatformCounts>,
    pub posts_per_year: BTreeMap<i32, u64>,
    pub earliest_date: Option<String>,
    pub latest_date: Option<String>,
    /// Posts whose `created_at` is missing or not a canonical date.
    pub posts_without_date: u64,
    #[serde(skip)]
    range: Option<(Date, Date)>,
}

impl CorpusOverview {
    fn widen(&mut self, lo: Date, hi: Date) {
        let (lo, hi) = match self.range {
            Some((a, b)) => (a.min(lo), b.max(hi)),
            None => (lo, hi),
        };
        self.range = Some((lo, hi));
        self.earliest_date = Some(format_canonical(lo));
        self.latest_date = Some(format_canonical(hi));
    }
}

impl Aggregator<Post> for CorpusOverview {
    fn ingest(&mut self, post: &Post) {
        let comments = post.comments.len() as u64;
        self.total_posts += 1;
        self.total_comments += comments;
        let e = self.platforms.entry(post.platform.as_str().to_string()).or_default();
        e.posts += 1;
        e.comments += comments;
        match post.created_at.as_deref().and_then(parse_canonical) {
            Some(d) => {
                *self.posts_per_year.entry(d.year()).or_insert(0) += 1;
                self.widen(d, d);
            }
            None => self.posts_without_date += 1,
        }
    }

    fn merge(&mut self, other: Self) {
        self.total_posts += other.total_posts;
        self.total_comments += other.total_comments;
        for (k, v) in other.platforms {
            let e = self.platforms.entry(k).or_default();
            e.posts += v.posts;
            e.comments += v.comments;
        }
        for (y, n) in other.posts_per_year {
            *self.posts_per_year.entry(y).or_insert(0) += n;
        }
        self.posts_without_date += other.posts_without_date;
        if let Some((lo, hi)) = other.range {
            self.widen(lo, hi);
        }
    }
}
