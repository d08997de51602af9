//! The per-run statistics document written to `statistics.json` and rendered into
//! the report.

use crate::aggregate::{aggregate_parallel, CorpusOverview};
use crate::analyze::TextAnalysis;
use crate::dedupe::CleanStats;
use crate::model::Post;
use crate::quality::QualityReport;
use crate::relevance::RelevanceSummary;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub platform: String,
    pub title: String,
    pub url: String,
    pub comments: u64,
}

impl From<&Post> for SourceEntry {
    fn from(p: &Post) -> Self {
        Self {
            platform: p.platform.as_str().to_string(),
            title: p.title.clone(),
            url: p.url.clone(),
            comments: p.comments.len() as u64,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorpusStatistics {
    /// RFC 3339 time the run is stamped with.
    pub generated_at: String,
    pub overview: CorpusOverview,
    pub cleaning: CleanStats,
    pub quality: QualityReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<RelevanceSummary>,
    pub text: TextAnalysis,
    /// Cleaned posts in output order.
    pub sources: Vec<SourceEntry>,
}

impl CorpusStatistics {
    pub fn build(
        generated_at: impl Into<String>,
        posts: &[Post],
        cleaning: CleanStats,
        quality: QualityReport,
        relevance: Option<RelevanceSummary>,
        text: TextAnalysis,
    ) -> Self {
        Self {
            generated_at: generated_at.into(),
            overview: aggregate_parallel(posts),
            cleaning,
            quality,
            relevance,
            text,
            sources: posts.iter().map(SourceEntry::from).collect(),
        }
    }
}
