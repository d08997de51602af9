//! Text analysis over posts and a bounded prefix of their comments: language split,
//! keyword and word frequency, lexicon sentiment, topic tallies and a yearly trend.
//!
//! The language split is a script heuristic, not language identification: a document
//! is Chinese when CJK ideographs make up more than 30% of its word characters.
//! Per-document work runs on rayon; totals are reduced only after every document
//! has been evaluated.

use crate::aggregate::{aggregate_parallel, Aggregator};
use crate::date::parse_canonical;
use crate::lexicon::{Lang, Lexicon};
use crate::model::Post;
use ahash::{AHashMap, AHashSet};
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const DEFAULT_MAX_COMMENTS_PER_POST: usize = 100;
pub const DEFAULT_TOP_WORDS: usize = 50;
const CJK_SHARE: f64 = 0.3;
const LABEL_THRESHOLD: f64 = 0.2;

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

pub fn classify_language(text: &str) -> Lang {
    let (mut word, mut cjk) = (0usize, 0usize);
    for c in text.chars() {
        if c.is_alphanumeric() || c == '_' {
            word += 1;
            if is_cjk(c) {
                cjk += 1;
            }
        }
    }
    if word > 0 && cjk as f64 > word as f64 * CJK_SHARE { Lang::Zh } else { Lang::En }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DocSource {
    Post { post: usize },
    Comment { post: usize, comment: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub text: String,
    pub lang: Lang,
    pub year: Option<i32>,
    pub source: DocSource,
}

impl Document {
    pub fn is_post(&self) -> bool {
        matches!(self.source, DocSource::Post { .. })
    }
}

fn year_of(created_at: Option<&str>) -> Option<i32> {
    created_at.and_then(parse_canonical).map(|d| d.year())
}

/// Each post (title + content) followed by its first `max_comments` comments.
/// A post's language hint applies to the post and all of its comments.
pub fn collect_documents(posts: &[Post], max_comments: usize) -> Vec<Document> {
    let mut docs = Vec::new();
    for (i, p) in posts.iter().enumerate() {
        let hint = p.language.as_deref().and_then(Lang::from_hint);
        let text = p.full_text();
        docs.push(Document {
            lang: hint.unwrap_or_else(|| classify_language(&text)),
            text,
            year: year_of(p.created_at.as_deref()),
            source: DocSource::Post { post: i },
        });
        for (j, c) in p.comments.iter().take(max_comments).enumerate() {
            docs.push(Document {
                lang: hint.unwrap_or_else(|| classify_language(&c.content)),
                text: c.content.clone(),
                year: year_of(c.created_at.as_deref()),
                source: DocSource::Comment { post: i, comment: j },
            });
        }
    }
    docs
}

// ----------------------------- Sentiment -----------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// In [-1, 1], rounded to 3 decimals.
    pub score: f64,
    pub label: SentimentLabel,
    pub positive_hits: u32,
    pub negative_hits: u32,
}

impl Sentiment {
    fn milli(&self) -> i64 {
        (self.score * 1000.0).round() as i64
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

fn sentiment_of(hay: &str, positive: &[String], negative: &[String]) -> Sentiment {
    let pos = positive.iter().filter(|w| hay.contains(w.as_str())).count() as u32;
    let neg = negative.iter().filter(|w| hay.contains(w.as_str())).count() as u32;
    if pos + neg == 0 {
        return Sentiment { score: 0.0, label: SentimentLabel::Neutral, positive_hits: 0, negative_hits: 0 };
    }
    let raw = (pos as f64 - neg as f64) / (pos + neg) as f64;
    let label = if raw > LABEL_THRESHOLD {
        SentimentLabel::Positive
    } else if raw < -LABEL_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };
    Sentiment { score: round3(raw), label, positive_hits: pos, negative_hits: neg }
}

/// `(pos - neg) / (pos + neg)` over the distinct lexicon words present in `text`.
pub fn sentiment_score(text: &str, lex: &Lexicon) -> Sentiment {
    let p = Prepared::from(lex);
    sentiment_of(&text.to_lowercase(), &p.positive, &p.negative)
}

// ----------------------------- Lexicon prep ---------------------------------

fn distinct_lower(xs: &[String]) -> Vec<String> {
    let mut seen = AHashSet::new();
    xs.iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

/// Lowercased, de-duplicated view of a lexicon.
#[derive(Clone, Debug, Default)]
struct Prepared {
    categories: Vec<(String, Vec<(String, String)>)>,
    positive: Vec<String>,
    negative: Vec<String>,
    topics: Vec<(String, Vec<String>)>,
    stopwords: AHashSet<String>,
    phrases: Vec<String>,
}

impl From<&Lexicon> for Prepared {
    fn from(lex: &Lexicon) -> Self {
        Self {
            categories: lex
                .categories
                .iter()
                .map(|c| {
                    let mut seen = AHashSet::new();
                    let kws = c
                        .keywords
                        .iter()
                        .filter_map(|k| {
                            let low = k.trim().to_lowercase();
                            (!low.is_empty() && seen.insert(low.clone())).then(|| (k.trim().to_string(), low))
                        })
                        .collect();
                    (c.name.clone(), kws)
                })
                .collect(),
            positive: distinct_lower(&lex.positive),
            negative: distinct_lower(&lex.negative),
            topics: lex.topics.iter().map(|t| (t.name.clone(), distinct_lower(&t.keywords))).collect(),
            stopwords: lex.stopwords.iter().map(|s| s.trim().to_lowercase()).collect(),
            phrases: distinct_lower(&lex.common_phrases),
        }
    }
}

fn en_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-z]+").expect("static regex"))
}

fn cjk_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\x{4e00}-\x{9fff}]+").expect("static regex"))
}

/// Tokens of an already-lowercased text, stopwords and single characters removed.
fn tokenize(hay: &str, lang: Lang, p: &Prepared) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    match lang {
        Lang::En => out.extend(en_token_re().find_iter(hay).map(|m| m.as_str().to_string())),
        Lang::Zh => {
            out.extend(p.phrases.iter().filter(|ph| hay.contains(ph.as_str())).cloned());
            out.extend(
                cjk_run_re()
                    .find_iter(hay)
                    .map(|m| m.as_str())
                    .filter(|s| s.chars().count() >= 2)
                    .map(str::to_string),
            );
        }
    }
    out.retain(|w| w.chars().count() >= 2 && !p.stopwords.contains(w));
    out
}

// ----------------------------- Per-document results --------------------------

#[derive(Clone, Debug)]
pub struct DocResult {
    pub lang: Lang,
    pub is_post: bool,
    pub year: Option<i32>,
    pub sentiment: Sentiment,
    /// Parallel to the lexicon's topics.
    pub topics: Vec<bool>,
    /// Parallel to the lexicon's categories and their keywords.
    pub keyword_counts: Vec<Vec<u64>>,
    pub words: Vec<String>,
}

#[derive(Clone, Debug, Default)]
struct LangAccumulator {
    documents: u64,
    positive: u64,
    neutral: u64,
    negative: u64,
    score_milli: i64,
    topic_docs: Vec<u64>,
    keyword_counts: Vec<Vec<u64>>,
    words: AHashMap<String, u64>,
}

fn add_into(dst: &mut Vec<u64>, src: &[u64]) {
    if dst.len() < src.len() {
        dst.resize(src.len(), 0);
    }
    for (d, s) in dst.iter_mut().zip(src) {
        *d += s;
    }
}

impl LangAccumulator {
    fn ingest(&mut self, r: &DocResult) {
        self.documents += 1;
        match r.sentiment.label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Neutral => self.neutral += 1,
            SentimentLabel::Negative => self.negative += 1,
        }
        self.score_milli += r.sentiment.milli();
        let hits: Vec<u64> = r.topics.iter().map(|&b| u64::from(b)).collect();
        add_into(&mut self.topic_docs, &hits);
        if self.keyword_counts.len() < r.keyword_counts.len() {
            self.keyword_counts.resize(r.keyword_counts.len(), Vec::new());
        }
        for (dst, src) in self.keyword_counts.iter_mut().zip(&r.keyword_counts) {
            add_into(dst, src);
        }
        for w in &r.words {
            *self.words.entry(w.clone()).or_insert(0) += 1;
        }
    }

    fn merge(&mut self, other: Self) {
        self.documents += other.documents;
        self.positive += other.positive;
        self.neutral += other.neutral;
        self.negative += other.negative;
        self.score_milli += other.score_milli;
        add_into(&mut self.topic_docs, &other.topic_docs);
        if self.keyword_counts.len() < other.keyword_counts.len() {
            self.keyword_counts.resize(other.keyword_counts.len(), Vec::new());
        }
        for (dst, src) in self.keyword_counts.iter_mut().zip(&other.keyword_counts) {
            add_into(dst, src);
        }
        for (w, n) in other.words {
            *self.words.entry(w).or_insert(0) += n;
        }
    }
}

#[derive(Debug, Default)]
pub struct CorpusAccumulator {
    zh: LangAccumulator,
    en: LangAccumulator,
    /// year -> (post documents, sentiment sum in thousandths)
    trend: BTreeMap<i32, (u64, i64)>,
}

impl CorpusAccumulator {
    fn lang_mut(&mut self, lang: Lang) -> &mut LangAccumulator {
        match lang {
            Lang::Zh => &mut self.zh,
            Lang::En => &mut self.en,
        }
    }
}

impl Aggregator<DocResult> for CorpusAccumulator {
    fn ingest(&mut self, r: &DocResult) {
        self.lang_mut(r.lang).ingest(r);
        if let (true, Some(y)) = (r.is_post, r.year) {
            let e = self.trend.entry(y).or_insert((0, 0));
            e.0 += 1;
            e.1 += r.sentiment.milli();
        }
    }

    fn merge(&mut self, other: Self) {
        self.zh.merge(other.zh);
        self.en.merge(other.en);
        for (y, (n, s)) in other.trend {
            let e = self.trend.entry(y).or_insert((0, 0));
            e.0 += n;
            e.1 += s;
        }
    }
}

// ----------------------------- Output -----------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFrequency {
    pub category: String,
    /// Zero counts omitted; count desc, then keyword asc.
    pub keywords: Vec<KeywordCount>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
    pub average_score: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCount {
    pub topic: String,
    pub documents: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LanguageAnalysis {
    pub lang: Lang,
    pub documents: u64,
    pub keyword_frequency: Vec<CategoryFrequency>,
    pub top_words: Vec<WordCount>,
    pub sentiment: SentimentDistribution,
    pub topics: Vec<TopicCount>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YearTrend {
    pub year: i32,
    pub posts: u64,
    pub avg_sentiment: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextAnalysis {
    pub total_documents: u64,
    /// Chinese first, then English.
    pub languages: Vec<LanguageAnalysis>,
    pub time_trend: Vec<YearTrend>,
}

impl TextAnalysis {
    pub fn language(&self, lang: Lang) -> Option<&LanguageAnalysis> {
        self.languages.iter().find(|l| l.lang == lang)
    }
}

fn mean_milli(sum: i64, n: u64) -> f64 {
    if n == 0 { 0.0 } else { round3(sum as f64 / 1000.0 / n as f64) }
}

// ----------------------------- Analyzer ---------------------------------------

/// Text analyzer with one injected lexicon per language.
#[derive(Clone, Debug)]
pub struct Analyzer {
    zh: Prepared,
    en: Prepared,
    max_comments_per_post: usize,
    top_words: usize,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(Lexicon::default_for(Lang::Zh), Lexicon::default_for(Lang::En))
    }
}

impl Analyzer {
    pub fn new(zh: Lexicon, en: Lexicon) -> Self {
        Self {
            zh: Prepared::from(&zh),
            en: Prepared::from(&en),
            max_comments_per_post: DEFAULT_MAX_COMMENTS_PER_POST,
            top_words: DEFAULT_TOP_WORDS,
        }
    }

    pub fn with_lexicon(mut self, lang: Lang, lex: Lexicon) -> Self {
        match lang {
            Lang::Zh => self.zh = Prepared::from(&lex),
            Lang::En => self.en = Prepared::from(&lex),
        }
        self
    }

    pub fn with_max_comments_per_post(mut self, n: usize) -> Self {
        self.max_comments_per_post = n;
        self
    }

    pub fn with_top_words(mut self, n: usize) -> Self {
        self.top_words = n;
        self
    }

    fn prepared(&self, lang: Lang) -> &Prepared {
        match lang {
            Lang::Zh => &self.zh,
            Lang::En => &self.en,
        }
    }

    /// Sentiment of `text` under the lexicon for `lang`.
    pub fn sentiment(&self, text: &str, lang: Lang) -> Sentiment {
        let p = self.prepared(lang);
        sentiment_of(&text.to_lowercase(), &p.positive, &p.negative)
    }

    pub fn evaluate(&self, doc: &Document) -> DocResult {
        let p = self.prepared(doc.lang);
        let hay = doc.text.to_lowercase();
        DocResult {
            lang: doc.lang,
            is_post: doc.is_post(),
            year: doc.year,
            sentiment: sentiment_of(&hay, &p.positive, &p.negative),
            topics: p
                .topics
                .iter()
                .map(|(_, kws)| kws.iter().any(|k| hay.contains(k.as_str())))
                .collect(),
            keyword_counts: p
                .categories
                .iter()
                .map(|(_, kws)| kws.iter().map(|(_, low)| hay.matches(low.as_str()).count() as u64).collect())
                .collect(),
            words: tokenize(&hay, doc.lang, p),
        }
    }

    pub fn analyze(&self, posts: &[Post]) -> TextAnalysis {
        let docs = collect_documents(posts, self.max_comments_per_post);
        let results: Vec<DocResult> = docs.par_iter().map(|d| self.evaluate(d)).collect();
        let acc: CorpusAccumulator = aggregate_parallel(&results);

        tracing::info!(
            documents = docs.len(),
            zh = acc.zh.documents,
            en = acc.en.documents,
            "text analysis finished"
        );

        let time_trend = acc
            .trend
            .iter()
            .filter(|(_, (n, _))| *n > 0)
            .map(|(&year, &(n, s))| YearTrend { year, posts: n, avg_sentiment: mean_milli(s, n) })
            .collect();
        let languages = vec![
            self.finish_lang(Lang::Zh, &acc.zh),
            self.finish_lang(Lang::En, &acc.en),
        ];
        TextAnalysis { total_documents: docs.len() as u64, languages, time_trend }
    }

    fn finish_lang(&self, lang: Lang, acc: &LangAccumulator) -> LanguageAnalysis {
        let p = self.prepared(lang);
        let keyword_frequency = p
            .categories
            .iter()
            .enumerate()
            .map(|(ci, (name, kws))| {
                let counts = acc.keyword_counts.get(ci);
                let mut keywords: Vec<KeywordCount> = kws
                    .iter()
                    .enumerate()
                    .map(|(ki, (orig, _))| KeywordCount {
                        keyword: orig.clone(),
                        count: counts.and_then(|c| c.get(ki)).copied().unwrap_or(0),
                    })
                    .filter(|k| k.count > 0)
                    .collect();
                keywords.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.keyword.cmp(&b.keyword)));
                CategoryFrequency { category: name.clone(), keywords }
            })
            .collect();

        let mut top_words: Vec<WordCount> =
            acc.words.iter().map(|(w, &n)| WordCount { word: w.clone(), count: n }).collect();
        top_words.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
        top_words.truncate(self.top_words);

        let topics = p
            .topics
            .iter()
            .enumerate()
            .map(|(i, (name, _))| TopicCount {
                topic: name.clone(),
                documents: acc.topic_docs.get(i).copied().unwrap_or(0),
            })
            .collect();

        LanguageAnalysis {
            lang,
            documents: acc.documents,
            keyword_frequency,
            top_words,
            sentiment: SentimentDistribution {
                positive: acc.positive,
                neutral: acc.neutral,
                negative: acc.negative,
                average_score: mean_milli(acc.score_milli, acc.documents),
            },
            topics,
        }
    }

    /// Fill `sentiment_score` on every comment (not only the analyzed prefix).
    pub fn annotate_sentiment(&self, posts: &mut [Post]) {
        posts.par_iter_mut().for_each(|p| {
            let hint = p.language.as_deref().and_then(Lang::from_hint);
            for c in p.comments.iter_mut() {
                let lang = hint.unwrap_or_else(|| classify_language(&c.content));
                c.sentiment_score = Some(self.sentiment(&c.content, lang).score);
            }
        });
    }
}
