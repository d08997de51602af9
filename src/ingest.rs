//! Raw ingestion: read input snapshots into untyped records, and adapt one untyped
//! record into the canonical `Post`.
//!
//! All of the "field may be missing / renamed / mistyped" handling lives here, so the
//! rest of the pipeline only ever sees validated `Post`s.

use crate::coerce::{coerce_bool, coerce_int, coerce_opt_bool, coerce_opt_string, Coerced};
use crate::date::{date_from_epoch, format_canonical, DateParser, NormalizedDate};
use crate::model::{Comment, Platform, Post, PostMetadata, ValidationError};
use crate::text::{clean_text_with, TextCleaning};
use crate::util::open_with_backoff;
use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use walkdir::WalkDir;
use zstd::stream::read::Decoder;

/// One untrusted input record and where it came from.
#[derive(Clone, Debug)]
pub struct RawRecord {
    pub value: Value,
    pub origin: Option<String>,
}

impl RawRecord {
    pub fn new(value: Value) -> Self {
        Self { value, origin: None }
    }
    pub fn from_origin(value: Value, origin: &Path) -> Self {
        Self { value, origin: Some(origin.display().to_string()) }
    }
}

/// Layout of an input file, decided by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    /// One JSON document: an object, an array, or a wrapper object.
    Json,
    /// One JSON value per line.
    JsonLines,
}

const WRAPPER_KEYS: [&str; 4] = ["posts", "data", "items", "results"];

/// Returns `(format, zstd_compressed)` for a path, or None for unsupported files.
pub fn detect_format(path: &Path) -> Option<(InputFormat, bool)> {
    let name = path.file_name()?.to_str()?.to_lowercase();
    let (inner, compressed) = match name.strip_suffix(".zst") {
        Some(rest) => (rest.to_string(), true),
        None => (name, false),
    };
    if inner.ends_with(".jsonl") || inner.ends_with(".ndjson") {
        Some((InputFormat::JsonLines, compressed))
    } else if inner.ends_with(".json") {
        Some((InputFormat::Json, compressed))
    } else {
        None
    }
}

/// Expand the given paths into a sorted list of input files.
/// Directories are walked recursively; a missing path is a fatal error.
pub fn discover_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for p in paths {
        if !p.exists() {
            bail!("input not found: {}", p.display());
        }
        if p.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(p)
                .min_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && detect_format(e.path()).is_some())
                .map(|e| e.path().to_path_buf())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(p.clone());
        }
    }
    if files.is_empty() {
        bail!("no input files (.json, .jsonl, .ndjson, optionally .zst) found");
    }
    Ok(files)
}

fn open_reader(path: &Path, compressed: bool, read_buf_bytes: usize) -> Result<Box<dyn BufRead>> {
    let file = open_with_backoff(path, 16, 50).with_context(|| format!("open {}", path.display()))?;
    let cap = read_buf_bytes.max(8 * 1024);
    if compressed {
        let dec = Decoder::new(file).with_context(|| format!("zstd decoder for {}", path.display()))?;
        Ok(Box::new(BufReader::with_capacity(cap, dec)))
    } else {
        Ok(Box::new(BufReader::with_capacity(cap, file)))
    }
}

/// Read every record from one input file. Unreadable files and top-level JSON that
/// fails to parse are fatal; a bad line in a JSONL file becomes a non-object record.
pub fn read_records(path: &Path, read_buf_bytes: usize) -> Result<Vec<RawRecord>> {
    let (format, compressed) = detect_format(path).unwrap_or((InputFormat::Json, false));
    let mut reader = open_reader(path, compressed, read_buf_bytes)?;

    match format {
        InputFormat::Json => {
            let mut buf = String::new();
            reader
                .read_to_string(&mut buf)
                .with_context(|| format!("read {}", path.display()))?;
            let doc: Value = serde_json::from_str(&buf)
                .with_context(|| format!("parse JSON document {}", path.display()))?;
            Ok(records_from_document(doc)
                .into_iter()
                .map(|v| RawRecord::from_origin(v, path))
                .collect())
        }
        InputFormat::JsonLines => {
            let mut out = Vec::new();
            let mut line = String::new();
            let mut line_no = 0usize;
            loop {
                line.clear();
                let n = reader
                    .read_line(&mut line)
                    .with_context(|| format!("read {}", path.display()))?;
                if n == 0 {
                    break;
                }
                line_no += 1;
                let t = line.trim();
                if t.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Value>(t) {
                    Ok(v) => out.push(RawRecord::from_origin(v, path)),
                    Err(e) => {
                        tracing::warn!(path=%path.display(), line=line_no, error=%e, "malformed JSON line kept as invalid record");
                        out.push(RawRecord::from_origin(Value::String(t.to_string()), path));
                    }
                }
            }
            Ok(out)
        }
    }
}

/// Normalize a top-level document into a record sequence.
pub fn records_from_document(doc: Value) -> Vec<Value> {
    match doc {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            for key in WRAPPER_KEYS {
                if matches!(map.get(key), Some(Value::Array(_))) {
                    if let Some(Value::Array(items)) = map.remove(key) {
                        return items;
                    }
                }
            }
            vec![Value::Object(map)]
        }
        other => vec![other],
    }
}

/// Read all inputs in order. First-seen order is preserved across files.
pub fn load_inputs(paths: &[PathBuf], read_buf_bytes: usize) -> Result<Vec<RawRecord>> {
    let files = discover_inputs(paths)?;
    let mut all = Vec::new();
    for f in &files {
        let recs = read_records(f, read_buf_bytes)?;
        tracing::info!(path=%f.display(), records=recs.len(), "loaded input");
        all.extend(recs);
    }
    Ok(all)
}

// ----------------------------- URL identity ----------------------------------

/// Dedup identity: trimmed, with scheme and host lowercased. Path and query keep
/// their case.
pub fn canonical_url(raw: &str) -> String {
    let t = raw.trim();
    let Some(idx) = t.find("://") else {
        return t.to_string();
    };
    let (scheme, rest) = t.split_at(idx);
    let rest = &rest[3..];
    let host_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (host, tail) = rest.split_at(host_end);
    format!("{}://{}{}", scheme.to_lowercase(), host.to_lowercase(), tail)
}

/// Guess the platform from a URL host.
pub fn platform_from_url(url: &str) -> Option<Platform> {
    let low = canonical_url(url);
    let host = low.split("://").nth(1)?.split(['/', '?', '#']).next()?;
    let known = [
        ("zhihu.com", Platform::Zhihu),
        ("v2ex.com", Platform::V2ex),
        ("xiaohongshu.com", Platform::Xiaohongshu),
        ("bilibili.com", Platform::Bilibili),
        ("reddit.com", Platform::Reddit),
    ];
    known
        .iter()
        .find(|(suffix, _)| host == *suffix || host.ends_with(&format!(".{suffix}")))
        .map(|(_, p)| *p)
}

// ----------------------------- Record adapter ----------------------------------

fn first<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| obj.get(*k)).find(|v| !v.is_null())
}

/// Output of adapting one raw record.
#[derive(Clone, Debug)]
pub struct Adapted {
    pub post: Post,
    pub comments_kept: u64,
    pub comments_dropped: u64,
    pub values_defaulted: u64,
}

/// Converts untrusted JSON records into canonical posts.
#[derive(Clone, Debug)]
pub struct PostAdapter {
    reference: OffsetDateTime,
    dates: DateParser,
    cleaning: TextCleaning,
}

impl Default for PostAdapter {
    fn default() -> Self {
        Self::new(OffsetDateTime::now_utc())
    }
}

impl PostAdapter {
    /// `reference` resolves relative dates and stamps `scraped_at` when absent.
    pub fn new(reference: OffsetDateTime) -> Self {
        Self { reference, dates: DateParser::default(), cleaning: TextCleaning::default() }
    }
    pub fn with_date_parser(mut self, dates: DateParser) -> Self {
        self.dates = dates;
        self
    }
    pub fn with_text_cleaning(mut self, cleaning: TextCleaning) -> Self {
        self.cleaning = cleaning;
        self
    }
    pub fn reference(&self) -> OffsetDateTime {
        self.reference
    }

    fn clean(&self, v: Option<&Value>) -> Option<String> {
        let s = coerce_opt_string(v?)?;
        let c = clean_text_with(&s, self.cleaning);
        if c.is_empty() { None } else { Some(c) }
    }

    /// Returns `(canonical_or_raw, raw_text)`.
    fn date(&self, v: Option<&Value>) -> (Option<String>, Option<String>) {
        let Some(v) = v else { return (None, None) };
        match v {
            Value::Number(n) => {
                let raw = n.to_string();
                let d = n.as_i64().and_then(epoch_to_date);
                (Some(d.unwrap_or_else(|| raw.clone())), Some(raw))
            }
            Value::String(s) => {
                let raw = s.trim();
                if raw.is_empty() {
                    return (None, None);
                }
                if raw.len() >= 9 && raw.bytes().all(|b| b.is_ascii_digit()) {
                    if let Some(d) = raw.parse::<i64>().ok().and_then(epoch_to_date) {
                        return (Some(d), Some(raw.to_string()));
                    }
                }
                let normalized = match self.dates.parse(raw, self.reference) {
                    NormalizedDate::Canonical(d) => format_canonical(d),
                    NormalizedDate::Unparsed(_) => clean_text_with(raw, self.cleaning),
                };
                (Some(normalized), Some(raw.to_string()))
            }
            _ => (None, None),
        }
    }

    fn count(&self, v: Option<&Value>, defaulted: &mut u64) -> u64 {
        match v {
            None => 0,
            Some(v) => {
                let Coerced { value, defaulted: d } = coerce_int(v, 0);
                if d {
                    *defaulted += 1;
                }
                value
            }
        }
    }

    /// Adapt one comment. `None` means it is not an object or its content is empty.
    pub fn adapt_comment(&self, v: &Value, defaulted: &mut u64) -> Option<Comment> {
        let obj = v.as_object()?;
        let content = self.clean(first(obj, &["content", "body", "text"]))?;
        let author = first(obj, &["author", "username", "user"])
            .and_then(coerce_opt_string)
            .unwrap_or_else(|| "unknown".to_string());
        let mut c = Comment::new(content, author).ok()?;
        c.author_url = first(obj, &["author_url"]).and_then(coerce_opt_string);
        c.comment_url = first(obj, &["comment_url", "url", "permalink"]).and_then(coerce_opt_string);
        c.upvotes = self.count(first(obj, &["upvotes", "ups", "score", "likes", "thanks"]), defaulted);
        c.downvotes = self.count(first(obj, &["downvotes", "downs"]), defaulted);
        let (created, raw) = self.date(first(obj, &["created_at", "created_utc", "created", "time"]));
        c.created_at = created;
        c.created_at_text = first(obj, &["created_at_text"]).and_then(coerce_opt_string).or(raw);
        if let Some(b) = first(obj, &["is_author_reply", "is_op", "is_submitter"]) {
            let Coerced { value, defaulted: d } = coerce_bool(b, false);
            if d {
                *defaulted += 1;
            }
            c.is_author_reply = value;
        }
        c.reply_to = first(obj, &["reply_to"]).and_then(coerce_opt_string);
        // carried through so re-cleaning an analyzed snapshot keeps its scores
        c.sentiment_score = first(obj, &["sentiment_score"])
            .and_then(Value::as_f64)
            .filter(|f| f.is_finite())
            .map(|f| f.clamp(-1.0, 1.0));
        Some(c)
    }

    /// Adapt one raw record into a validated post.
    pub fn adapt(&self, v: &Value) -> Result<Adapted, ValidationError> {
        let obj = v.as_object().ok_or(ValidationError::NotAnObject)?;
        let mut defaulted = 0u64;

        let url = first(obj, &["url", "link", "permalink"])
            .and_then(coerce_opt_string)
            .map(|u| canonical_url(&u))
            .unwrap_or_default();
        let title = self.clean(first(obj, &["title"])).unwrap_or_default();
        let platform_raw = first(obj, &["platform", "source"]).and_then(coerce_opt_string);
        let platform = match platform_raw {
            Some(p) => p,
            None => platform_from_url(&url).map(|p| p.as_str().to_string()).unwrap_or_default(),
        };
        let post_type = first(obj, &["post_type", "type"]).and_then(coerce_opt_string);
        let scraped_at = first(obj, &["scraped_at"])
            .and_then(|v| v.as_str())
            .and_then(|s| OffsetDateTime::parse(s.trim(), &Rfc3339).ok())
            .unwrap_or(self.reference);
        let scraped_at = scraped_at.format(&Rfc3339).unwrap_or_default();

        let mut post = Post::new(&platform, post_type.as_deref(), url, title, scraped_at)?;

        post.content = self.clean(first(obj, &["content", "selftext", "body", "text"]));
        post.author = first(obj, &["author", "username"]).and_then(coerce_opt_string);
        post.author_url = first(obj, &["author_url"]).and_then(coerce_opt_string);
        post.created_at = self.date(first(obj, &["created_at", "created_utc", "created", "time", "date"])).0;
        post.is_relevant = first(obj, &["is_relevant"]).and_then(coerce_opt_bool);
        post.relevance_note = first(obj, &["relevance_note"]).and_then(coerce_opt_string);
        post.language = first(obj, &["language", "lang"]).and_then(coerce_opt_string).map(|s| s.to_lowercase());

        let meta = obj.get("metadata").and_then(|m| m.as_object());
        let pick = |keys: &[&str]| meta.and_then(|m| first(m, keys)).or_else(|| first(obj, keys));
        post.metadata = PostMetadata {
            view_count: self.count(pick(&["view_count", "views", "clicks"]), &mut defaulted),
            follow_count: self.count(pick(&["follow_count", "followers", "follows"]), &mut defaulted),
            upvote_count: self.count(pick(&["upvote_count", "upvotes", "score", "likes"]), &mut defaulted),
            comment_count: 0,
        };

        let mut kept = 0u64;
        let mut dropped = 0u64;
        if let Some(Value::Array(items)) = first(obj, &["comments", "answers", "replies"]) {
            for item in items {
                match self.adapt_comment(item, &mut defaulted) {
                    Some(c) => {
                        post.comments.push(c);
                        kept += 1;
                    }
                    None => dropped += 1,
                }
            }
        }
        post.recompute_comment_count();

        Ok(Adapted { post, comments_kept: kept, comments_dropped: dropped, values_defaulted: defaulted })
    }
}

// Seconds, or milliseconds when the value is too large to be seconds.
fn epoch_to_date(ts: i64) -> Option<String> {
    let secs = if ts.unsigned_abs() >= 100_000_000_000 { ts / 1000 } else { ts };
    date_from_epoch(secs).map(format_canonical)
}
