//! Per-document relevance: the built-in keyword method, and the boundary to an
//! external judgment collaborator whose payloads are accepted in the same shape.

use crate::config::KeywordSets;
use crate::model::Post;
use crate::progress::ProgressScope;
use crate::text::truncate_chars;
use crate::util::open_with_backoff;
use ahash::{AHashMap, AHashSet};
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

/// Fixed cut-off: `score >= RELEVANCE_THRESHOLD` is relevant.
pub const RELEVANCE_THRESHOLD: f64 = 0.5;
pub const KEYWORD_CONFIDENCE: f64 = 0.7;
pub const EXCLUDE_CONFIDENCE: f64 = 0.9;
/// Content prefix (chars) included in the external evaluation prompt.
pub const PROMPT_CONTENT_CHARS: usize = 500;
const MAX_SECONDARY_REASONS: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgmentMethod {
    Keyword,
    External,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelevanceScore {
    pub url: String,
    pub score: f64,
    pub is_relevant: bool,
    pub reasons: Vec<String>,
    pub confidence: f64,
    pub method: JudgmentMethod,
}

#[derive(Debug, Error, PartialEq)]
pub enum JudgmentError {
    #[error("judgment payload is not a JSON object")]
    NotAnObject,
    #[error("judgment payload has neither `score` nor `is_relevant`")]
    MissingVerdict,
    #[error("judgment text contains no JSON object")]
    NoJson,
}

fn lower_distinct(keywords: &[String]) -> Vec<(String, String)> {
    let mut seen = AHashSet::new();
    keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .filter_map(|k| {
            let low = k.to_lowercase();
            seen.insert(low.clone()).then(|| (k.to_string(), low))
        })
        .collect()
}

/// Keyword relevance of `text` (normally `title + " " + content`). `url` is left empty.
pub fn score_relevance(text: &str, keywords: &KeywordSets) -> RelevanceScore {
    let hay = text.to_lowercase();

    if let Some((kw, _)) = lower_distinct(&keywords.exclude).into_iter().find(|(_, low)| hay.contains(low.as_str())) {
        return RelevanceScore {
            url: String::new(),
            score: 0.0,
            is_relevant: false,
            reasons: vec![format!("exclude keyword: {kw}")],
            confidence: EXCLUDE_CONFIDENCE,
            method: JudgmentMethod::Keyword,
        };
    }

    let matched = |set: &[String]| -> Vec<String> {
        lower_distinct(set)
            .into_iter()
            .filter(|(_, low)| hay.contains(low.as_str()))
            .map(|(orig, _)| orig)
            .collect()
    };
    let primary = matched(&keywords.primary);
    let secondary = matched(&keywords.secondary);

    // tenths, so 0.4 and 0.1 steps stay exact
    let tenths = (4 * primary.len() + secondary.len()).min(10);
    let score = tenths as f64 / 10.0;

    let mut reasons = Vec::new();
    if !primary.is_empty() {
        reasons.push(format!("primary keywords: {}", primary.join(", ")));
    }
    if !secondary.is_empty() {
        let shown: Vec<&str> = secondary.iter().take(MAX_SECONDARY_REASONS).map(String::as_str).collect();
        reasons.push(format!("secondary keywords: {}", shown.join(", ")));
    }
    if reasons.is_empty() {
        reasons.push("no keywords found".to_string());
    }

    RelevanceScore {
        url: String::new(),
        score,
        is_relevant: score >= RELEVANCE_THRESHOLD,
        reasons,
        confidence: KEYWORD_CONFIDENCE,
        method: JudgmentMethod::Keyword,
    }
}

fn unit_f64(v: Option<&Value>) -> Option<f64> {
    let f = match v? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    f.is_finite().then(|| f.clamp(0.0, 1.0))
}

impl RelevanceScore {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Accept an external judgment `{is_relevant, score, reasons, confidence}`.
    ///
    /// `score` and `confidence` are clamped to [0, 1]. A missing `is_relevant` is
    /// derived from the score; a missing score is 1.0 or 0.0 from the verdict.
    /// Missing reasons become empty; missing confidence is 0.5.
    pub fn from_judgment(url: impl Into<String>, payload: &Value) -> Result<Self, JudgmentError> {
        let obj = payload.as_object().ok_or(JudgmentError::NotAnObject)?;
        let score = unit_f64(obj.get("score"));
        let verdict = obj.get("is_relevant").and_then(crate::coerce::coerce_opt_bool);
        let (score, is_relevant) = match (score, verdict) {
            (Some(s), Some(v)) => (s, v),
            (Some(s), None) => (s, s >= RELEVANCE_THRESHOLD),
            (None, Some(v)) => (if v { 1.0 } else { 0.0 }, v),
            (None, None) => return Err(JudgmentError::MissingVerdict),
        };
        let reasons = match obj.get("reasons") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|r| r.as_str().map(str::trim).filter(|s| !s.is_empty()).map(String::from))
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => Vec::new(),
        };
        Ok(Self {
            url: url.into(),
            score,
            is_relevant,
            reasons,
            confidence: unit_f64(obj.get("confidence")).unwrap_or(0.5),
            method: JudgmentMethod::External,
        })
    }

    /// Like [`RelevanceScore::from_judgment`], for a free-text reply that embeds the
    /// JSON object (e.g. inside a fenced code block).
    pub fn from_judgment_text(url: impl Into<String>, text: &str) -> Result<Self, JudgmentError> {
        let start = text.find('{').ok_or(JudgmentError::NoJson)?;
        let end = text.rfind('}').ok_or(JudgmentError::NoJson)?;
        if end < start {
            return Err(JudgmentError::NoJson);
        }
        let v: Value = serde_json::from_str(&text[start..=end]).map_err(|_| JudgmentError::NoJson)?;
        Self::from_judgment(url, &v)
    }

    pub fn note(&self) -> String {
        self.reasons.join("; ")
    }
}

/// Anything that can decide relevance for a post.
pub trait RelevanceJudge: Sync {
    fn judge(&self, post: &Post) -> RelevanceScore;
}

#[derive(Clone, Debug, Default)]
pub struct KeywordJudge {
    keywords: KeywordSets,
}

impl KeywordJudge {
    pub fn new(keywords: KeywordSets) -> Self {
        Self { keywords }
    }
}

impl RelevanceJudge for KeywordJudge {
    fn judge(&self, post: &Post) -> RelevanceScore {
        score_relevance(&post.full_text(), &self.keywords).with_url(post.url.clone())
    }
}

/// Judgments produced outside the pipeline, keyed by post URL. Posts without one
/// fall back to the keyword method.
#[derive(Clone, Debug, Default)]
pub struct ExternalJudgments {
    by_url: AHashMap<String, RelevanceScore>,
    fallback: KeywordJudge,
}

impl ExternalJudgments {
    pub fn new(fallback: KeywordJudge) -> Self {
        Self { by_url: AHashMap::new(), fallback }
    }

    pub fn insert(&mut self, score: RelevanceScore) {
        let key = crate::ingest::canonical_url(&score.url);
        self.by_url.insert(key, score);
    }

    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }

    /// Load a JSON file holding either an object `{url: payload}` or an array of
    /// payloads each carrying a `url`. Malformed entries are skipped with a warning.
    pub fn load(path: &Path, fallback: KeywordJudge) -> Result<Self> {
        let f = open_with_backoff(path, 16, 50).with_context(|| format!("open judgments {}", path.display()))?;
        let doc: Value = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse judgments {}", path.display()))?;

        let entries: Vec<(String, Value)> = match doc {
            Value::Object(map) => map.into_iter().collect(),
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| {
                    let url = v.get("url")?.as_str()?.to_string();
                    Some((url, v))
                })
                .collect(),
            _ => anyhow::bail!("judgments {} must be an object or an array", path.display()),
        };

        let mut out = Self::new(fallback);
        for (url, payload) in entries {
            match RelevanceScore::from_judgment(url.clone(), &payload) {
                Ok(s) => out.insert(s),
                Err(e) => tracing::warn!(url = %url, error = %e, "skipping judgment"),
            }
        }
        tracing::info!(path=%path.display(), judgments = out.len(), "loaded external judgments");
        Ok(out)
    }
}

impl RelevanceJudge for ExternalJudgments {
    fn judge(&self, post: &Post) -> RelevanceScore {
        match self.by_url.get(&crate::ingest::canonical_url(&post.url)) {
            Some(s) => s.clone().with_url(post.url.clone()),
            None => self.fallback.judge(post),
        }
    }
}

/// Prompt handed to an external evaluator for one post.
pub fn evaluation_prompt(post: &Post) -> String {
    let content = truncate_chars(post.content.as_deref().unwrap_or(""), PROMPT_CONTENT_CHARS, "");
    format!(
        "Assess whether the following post is relevant to the topic \
\"the impact of large language models on IT jobs and professional skills\".\n\
\n\
[Post]\n\
- Title: {title}\n\
- Content excerpt: {content}\n\
\n\
[Criteria]\n\
1. Does it explicitly discuss large language models / AI (ChatGPT, GPT, Claude, ...)?\n\
2. Does it involve IT practitioners (programmers, developers, engineers)?\n\
3. Does it discuss job changes, employment impact or skill requirements?\n\
\n\
[Output]\n\
Reply with a JSON object:\n\
{{\n  \"is_relevant\": true/false,\n  \"score\": 0.0-1.0,\n  \"reasons\": [\"reason 1\", \"reason 2\"],\n  \"confidence\": 0.0-1.0\n}}\n\
\n\
Posts that are only advertising, promotion or course sales are not relevant.\n",
        title = post.title,
        content = content,
    )
}

/// Score every post in parallel. Output order matches `posts`.
pub fn evaluate_batch<J: RelevanceJudge + ?Sized>(posts: &[Post], judge: &J, progress: Option<&ProgressScope>) -> Vec<RelevanceScore> {
    posts
        .par_iter()
        .map(|p| {
            let s = judge.judge(p);
            if let Some(pb) = progress {
                pb.inc_items(1);
            }
            s
        })
        .collect()
}

/// Write scores back onto posts, pairing by position. Returns how many posts changed.
///
/// Only external judgments set `is_relevant`; a post that already carries a verdict
/// keeps it unless `overwrite`. Keyword scores are advisory: they fill
/// `relevance_note` on posts without a verdict and never touch `is_relevant`.
pub fn apply_relevance(posts: &mut [Post], scores: &[RelevanceScore], overwrite: bool) -> usize {
    let mut updated = 0;
    for (post, score) in posts.iter_mut().zip(scores) {
        match score.method {
            JudgmentMethod::External => {
                if post.is_relevant.is_some() && !overwrite {
                    continue;
                }
                post.is_relevant = Some(score.is_relevant);
            }
            JudgmentMethod::Keyword => {
                if post.is_relevant.is_some() {
                    continue;
                }
            }
        }
        post.relevance_note = Some(score.note());
        updated += 1;
    }
    updated
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RelevanceSummary {
    pub total: u64,
    pub relevant: u64,
    pub average_score: f64,
    pub external_judgments: u64,
}

impl RelevanceSummary {
    pub fn from_scores(scores: &[RelevanceScore]) -> Self {
        let total = scores.len() as u64;
        let relevant = scores.iter().filter(|s| s.is_relevant).count() as u64;
        let external = scores.iter().filter(|s| s.method == JudgmentMethod::External).count() as u64;
        let average_score = if total == 0 {
            0.0
        } else {
            let sum: f64 = scores.iter().map(|s| s.score).sum();
            ((sum / total as f64) * 1000.0).round() / 1000.0
        };
        Self { total, relevant, average_score, external_judgments: external }
    }
}
