use crate::date::TimePeriod;
use crate::lexicon::{Lang, Lexicon};
use crate::util::{merge_extra_keywords, open_with_backoff};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

pub const ENV_MIN_COMMENTS: &str = "THREADETL_MIN_COMMENTS";
pub const ENV_MIN_POSTS: &str = "THREADETL_MIN_POSTS";
pub const ENV_EXCLUDE_KEYWORDS: &str = "THREADETL_EXCLUDE_KEYWORDS";

/// Topic vocabulary shared by relevance scoring and keyword coverage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordSets {
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
    /// Any hit marks a document irrelevant regardless of other matches.
    pub exclude: Vec<String>,
}

impl Default for KeywordSets {
    fn default() -> Self {
        let v = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            primary: v(&[
                "ChatGPT", "GPT", "大模型", "大语言模型", "AI", "人工智能",
                "文心一言", "通义千问", "讯飞星火", "Claude", "Gemini",
            ]),
            secondary: v(&[
                "程序员", "开发", "工程师", "IT", "技术", "编程",
                "就业", "失业", "岗位", "职位", "工作", "求职",
                "技能", "能力", "学习", "转型",
            ]),
            exclude: v(&["招聘广告", "售卖", "推广", "课程售卖"]),
        }
    }
}

impl KeywordSets {
    pub fn new(primary: &[&str], secondary: &[&str], exclude: &[&str]) -> Self {
        let v = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self { primary: v(primary), secondary: v(secondary), exclude: v(exclude) }
    }
}

fn default_time_periods() -> Vec<TimePeriod> {
    vec![
        TimePeriod::new("初期冲击", "2022-12-01", "2023-03-31"),
        TimePeriod::new("快速发展", "2023-04-01", "2023-09-30"),
        TimePeriod::new("技术普及", "2023-10-01", "2024-03-31"),
        TimePeriod::new("深度应用", "2024-04-01", "2024-09-30"),
        TimePeriod::new("成熟期", "2024-10-01", "2025-03-31"),
        TimePeriod::new("当前状态", "2025-04-01", "2025-11-30"),
    ]
}

/// Run configuration. Every field is optional in the JSON file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub min_comments_per_post: u64,
    pub min_posts_required: u64,
    pub keywords: KeywordSets,
    pub time_periods: Vec<TimePeriod>,
    /// Comment prefix per post fed to the text analyzer.
    pub max_comments_per_post_analyzed: usize,
    pub top_words: usize,
    /// Posts below this comment count are left out of text analysis.
    pub analysis_min_comments: u64,
    /// Replaces the built-in vocabulary for each language listed (`"zh"`, `"en"`).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub lexicons: BTreeMap<Lang, Lexicon>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_comments_per_post: 50,
            min_posts_required: 18,
            keywords: KeywordSets::default(),
            time_periods: default_time_periods(),
            max_comments_per_post_analyzed: 100,
            top_words: 50,
            analysis_min_comments: 0,
            lexicons: BTreeMap::new(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let f = open_with_backoff(path, 16, 50).with_context(|| format!("open config {}", path.display()))?;
        let cfg: PipelineConfig = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse config {}", path.display()))?;
        tracing::info!(path=%path.display(), "loaded pipeline config");
        Ok(cfg)
    }

    /// Apply `THREADETL_*` overrides. Unparseable numbers are ignored with a warning.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Some(n) = env_u64(ENV_MIN_COMMENTS) {
            self.min_comments_per_post = n;
        }
        if let Some(n) = env_u64(ENV_MIN_POSTS) {
            self.min_posts_required = n;
        }
        merge_extra_keywords(&mut self.keywords.exclude, ENV_EXCLUDE_KEYWORDS);
        self
    }
}

fn env_u64(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(n) => Some(n),
        Err(e) => {
            tracing::warn!(var = name, value = %raw, error = %e, "ignoring non-numeric override");
            None
        }
    }
}

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct PipelineOptions {
    pub inputs: Vec<PathBuf>,
    pub out_dir: PathBuf,
    pub config: PipelineConfig,
    /// Resolves relative dates; `None` means the wall clock at run time.
    pub reference_time: Option<OffsetDateTime>,
    pub parallelism: Option<usize>, // Some(N) to set rayon threads, None to use default
    pub progress: bool,
    pub progress_label: Option<String>,
    /// Replace relevance already present on input records.
    pub overwrite_relevance: bool,
    /// External judgment payloads keyed by URL.
    pub judgments_path: Option<PathBuf>,
    /// Also write `cleaned_posts.jsonl`.
    pub emit_jsonl: bool,

    // IO tuning
    pub read_buffer_bytes: usize,
    pub write_buffer_bytes: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            out_dir: PathBuf::from("./data/processed"),
            config: PipelineConfig::default(),
            reference_time: None,
            parallelism: None,
            progress: true,
            progress_label: None,
            overwrite_relevance: false,
            judgments_path: None,
            emit_jsonl: false,
            read_buffer_bytes: 256 * 1024,
            write_buffer_bytes: 256 * 1024,
        }
    }
}

impl PipelineOptions {
    pub fn with_input(mut self, path: impl AsRef<Path>) -> Self {
        self.inputs.push(path.as_ref().to_path_buf());
        self
    }
    pub fn with_inputs<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.inputs.extend(paths.into_iter().map(|p| p.as_ref().to_path_buf()));
        self
    }
    pub fn with_out_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.out_dir = dir.as_ref().to_path_buf();
        self
    }
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }
    pub fn with_reference_time(mut self, at: OffsetDateTime) -> Self {
        self.reference_time = Some(at);
        self
    }
    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }
    pub fn with_overwrite_relevance(mut self, yes: bool) -> Self {
        self.overwrite_relevance = yes;
        self
    }
    pub fn with_judgments(mut self, path: impl AsRef<Path>) -> Self {
        self.judgments_path = Some(path.as_ref().to_path_buf());
        self
    }
    pub fn with_jsonl_output(mut self, yes: bool) -> Self {
        self.emit_jsonl = yes;
        self
    }

    // IO buffers tuning
    pub fn with_io_read_buffer(mut self, bytes: usize) -> Self {
        self.read_buffer_bytes = bytes.max(8 * 1024);
        self
    }
    pub fn with_io_write_buffer(mut self, bytes: usize) -> Self {
        self.write_buffer_bytes = bytes.max(8 * 1024);
        self
    }
}
