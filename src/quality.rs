//! Corpus-level quality scoring: volume thresholds, metadata completeness, time
//! coverage and keyword coverage.
//!
//! The composite score is an additive rubric with fixed weights (30 + 30 + 20 + 20).
//! Threshold shortfalls are reported, never raised.

use crate::config::{KeywordSets, PipelineConfig};
use crate::date::{parse_canonical, TimePeriod};
use crate::model::Post;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const MIN_POSTS_WEIGHT: f64 = 30.0;
pub const MIN_COMMENTS_WEIGHT: f64 = 30.0;
pub const TIME_INFO_WEIGHT: f64 = 20.0;
pub const AUTHOR_INFO_WEIGHT: f64 = 20.0;

#[derive(Clone, Debug)]
pub struct QualityConfig {
    pub min_comments_per_post: u64,
    pub min_posts_required: u64,
    pub time_periods: Vec<TimePeriod>,
    pub keywords: KeywordSets,
    /// A comment is high quality above both of these (strictly greater).
    pub high_quality_upvotes: u64,
    pub high_quality_chars: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for QualityConfig {
    fn from(cfg: &PipelineConfig) -> Self {
        Self {
            min_comments_per_post: cfg.min_comments_per_post,
            min_posts_required: cfg.min_posts_required,
            time_periods: cfg.time_periods.clone(),
            keywords: cfg.keywords.clone(),
            high_quality_upvotes: 10,
            high_quality_chars: 50,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicStats {
    pub total_posts: u64,
    /// Posts with at least `min_comments_per_post` comments.
    pub valid_posts: u64,
    pub total_comments: u64,
    pub avg_comments_per_post: f64,
    pub min_comments: u64,
    pub max_comments: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformDistribution {
    pub counts: BTreeMap<String, u64>,
    pub percentages: BTreeMap<String, f64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodCount {
    pub name: String,
    pub count: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeDistribution {
    /// In configured order.
    pub periods: Vec<PeriodCount>,
    /// Posts falling in some configured period.
    pub with_time: u64,
    pub without_time: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentStats {
    pub total_comments: u64,
    pub avg_length: f64,
    pub min_length: u64,
    pub max_length: u64,
    pub high_quality_count: u64,
    pub high_quality_percentage: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityChecks {
    pub meets_min_posts: bool,
    pub meets_min_comments: bool,
    pub has_time_info_pct: f64,
    pub has_author_info_pct: f64,
    pub avg_content_length: f64,
    pub overall_quality_score: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordHits {
    pub keyword: String,
    pub posts: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCoverage {
    pub primary: Vec<KeywordHits>,
    pub secondary: Vec<KeywordHits>,
    pub primary_keywords_hit: u64,
    pub secondary_keywords_hit: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub min_comments_per_post: u64,
    pub min_posts_required: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityGrade {
    Good,
    Medium,
    Poor,
}

impl QualityGrade {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            QualityGrade::Good
        } else if score >= 60.0 {
            QualityGrade::Medium
        } else {
            QualityGrade::Poor
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QualityGrade::Good => "good",
            QualityGrade::Medium => "medium",
            QualityGrade::Poor => "poor",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub thresholds: Thresholds,
    pub basic: BasicStats,
    pub platforms: PlatformDistribution,
    pub time_periods: TimeDistribution,
    pub comments: CommentStats,
    pub checks: QualityChecks,
    pub keyword_coverage: KeywordCoverage,
}

fn pct(part: u64, total: u64) -> f64 {
    if total == 0 { 0.0 } else { part as f64 / total as f64 * 100.0 }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// 30·posts + 30·comments + min(time_pct/5, 20) + min(author_pct/5, 20), 2 decimals.
pub fn composite_score(meets_min_posts: bool, meets_min_comments: bool, time_pct: f64, author_pct: f64) -> f64 {
    let mut score = 0.0;
    if meets_min_posts {
        score += MIN_POSTS_WEIGHT;
    }
    if meets_min_comments {
        score += MIN_COMMENTS_WEIGHT;
    }
    let scaled = |p: f64, cap: f64| (p.clamp(0.0, 100.0) / 5.0).min(cap);
    score += scaled(time_pct, TIME_INFO_WEIGHT);
    score += scaled(author_pct, AUTHOR_INFO_WEIGHT);
    round2(score)
}

pub fn score_corpus(posts: &[Post], cfg: &QualityConfig) -> QualityReport {
    let total = posts.len() as u64;
    let counts: Vec<u64> = posts.iter().map(|p| p.comments.len() as u64).collect();
    let total_comments: u64 = counts.iter().sum();
    let valid_posts = counts.iter().filter(|&&c| c >= cfg.min_comments_per_post).count() as u64;

    let basic = BasicStats {
        total_posts: total,
        valid_posts,
        total_comments,
        avg_comments_per_post: if total == 0 { 0.0 } else { total_comments as f64 / total as f64 },
        min_comments: counts.iter().copied().min().unwrap_or(0),
        max_comments: counts.iter().copied().max().unwrap_or(0),
    };

    let mut platforms = PlatformDistribution::default();
    for p in posts {
        *platforms.counts.entry(p.platform.as_str().to_string()).or_insert(0) += 1;
    }
    platforms.percentages = platforms.counts.iter().map(|(k, &v)| (k.clone(), pct(v, total))).collect();

    let time_periods = time_distribution(posts, &cfg.time_periods);
    let comments = comment_stats(posts, cfg);

    let meets_min_posts = total >= cfg.min_posts_required;
    let meets_min_comments = valid_posts >= cfg.min_posts_required;
    let has_time_info_pct = pct(posts.iter().filter(|p| p.has_created_at()).count() as u64, total);
    let has_author_info_pct = pct(posts.iter().filter(|p| p.has_author()).count() as u64, total);
    let content_chars: u64 = posts.iter().map(|p| p.content.as_deref().map_or(0, |c| c.chars().count()) as u64).sum();
    let checks = QualityChecks {
        meets_min_posts,
        meets_min_comments,
        has_time_info_pct,
        has_author_info_pct,
        avg_content_length: if total == 0 { 0.0 } else { content_chars as f64 / total as f64 },
        overall_quality_score: composite_score(meets_min_posts, meets_min_comments, has_time_info_pct, has_author_info_pct),
    };

    QualityReport {
        thresholds: Thresholds {
            min_comments_per_post: cfg.min_comments_per_post,
            min_posts_required: cfg.min_posts_required,
        },
        basic,
        platforms,
        time_periods,
        comments,
        checks,
        keyword_coverage: keyword_coverage(posts, &cfg.keywords),
    }
}

fn time_distribution(posts: &[Post], periods: &[TimePeriod]) -> TimeDistribution {
    let mut counts = vec![0u64; periods.len()];
    for p in posts {
        let Some(d) = p.created_at.as_deref().and_then(parse_canonical) else { continue };
        if let Some(i) = periods.iter().position(|tp| tp.contains(d)) {
            counts[i] += 1;
        } else {
            tracing::trace!(url = %p.url, date = %d, "date outside configured periods");
        }
    }
    let with_time: u64 = counts.iter().sum();
    TimeDistribution {
        periods: periods
            .iter()
            .zip(counts)
            .map(|(tp, count)| PeriodCount { name: tp.name.clone(), count })
            .collect(),
        with_time,
        without_time: posts.len() as u64 - with_time,
    }
}

fn comment_stats(posts: &[Post], cfg: &QualityConfig) -> CommentStats {
    let lengths: Vec<u64> = posts
        .iter()
        .flat_map(|p| p.comments.iter())
        .map(|c| c.content.chars().count() as u64)
        .collect();
    if lengths.is_empty() {
        return CommentStats::default();
    }
    let high = posts
        .iter()
        .flat_map(|p| p.comments.iter())
        .filter(|c| c.is_high_quality(cfg.high_quality_upvotes, cfg.high_quality_chars))
        .count() as u64;
    let n = lengths.len() as u64;
    CommentStats {
        total_comments: n,
        avg_length: lengths.iter().sum::<u64>() as f64 / n as f64,
        min_length: lengths.iter().copied().min().unwrap_or(0),
        max_length: lengths.iter().copied().max().unwrap_or(0),
        high_quality_count: high,
        high_quality_percentage: pct(high, n),
    }
}

fn keyword_coverage(posts: &[Post], kw: &KeywordSets) -> KeywordCoverage {
    let texts: Vec<String> = posts.iter().map(|p| p.full_text().to_lowercase()).collect();
    let hits = |set: &[String]| -> Vec<KeywordHits> {
        set.iter()
            .map(|k| {
                let low = k.to_lowercase();
                let n = texts.iter().filter(|t| !low.is_empty() && t.contains(low.as_str())).count() as u64;
                KeywordHits { keyword: k.clone(), posts: n }
            })
            .collect()
    };
    let primary = hits(&kw.primary);
    let secondary = hits(&kw.secondary);
    KeywordCoverage {
        primary_keywords_hit: primary.iter().filter(|h| h.posts > 0).count() as u64,
        secondary_keywords_hit: secondary.iter().filter(|h| h.posts > 0).count() as u64,
        primary,
        secondary,
    }
}

impl QualityReport {
    pub fn grade(&self) -> QualityGrade {
        QualityGrade::from_score(self.checks.overall_quality_score)
    }

    /// Plain-language explanation of every shortfall, ending with the overall verdict.
    pub fn recommendations(&self) -> Vec<String> {
        let mut out = Vec::new();
        let t = &self.thresholds;
        if !self.checks.meets_min_posts {
            out.push(format!(
                "Not enough posts: have {}, need {}.",
                self.basic.total_posts, t.min_posts_required
            ));
        }
        if !self.checks.meets_min_comments {
            out.push(format!(
                "Not enough posts with at least {} comments: have {}, need {}.",
                t.min_comments_per_post, self.basic.valid_posts, t.min_posts_required
            ));
        }
        if self.checks.has_time_info_pct < 100.0 {
            out.push(format!(
                "{:.1}% of posts carry a creation date; backfill dates to improve time coverage.",
                self.checks.has_time_info_pct
            ));
        }
        if self.checks.has_author_info_pct < 100.0 {
            out.push(format!("{:.1}% of posts carry an author.", self.checks.has_author_info_pct));
        }
        out.push(
            match self.grade() {
                QualityGrade::Good => "Data quality is good; ready for analysis.",
                QualityGrade::Medium => "Data quality is medium; collecting more data is advised.",
                QualityGrade::Poor => "Data quality is poor; the corpus should be recollected.",
            }
            .to_string(),
        );
        out
    }
}
