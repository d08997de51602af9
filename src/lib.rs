mod config;
mod date;
mod coerce;
mod text;
mod model;

mod ingest;
mod dedupe;
mod relevance;
mod quality;

mod lexicon;
mod analyze;
mod aggregate;
mod stats;
mod report;

mod progress;
mod output;
mod util;
mod pipeline;

pub use crate::config::{KeywordSets, PipelineConfig, PipelineOptions, ENV_EXCLUDE_KEYWORDS, ENV_MIN_COMMENTS, ENV_MIN_POSTS};
pub use crate::pipeline::{PipelineOutput, RunSummary, ThreadEtl};

// record model and normalization
pub use crate::model::{Comment, Platform, Post, PostMetadata, PostType, ValidationError};
pub use crate::coerce::{coerce_bool, coerce_int, coerce_int_str, coerce_opt_bool, coerce_opt_string, Coerced};
pub use crate::text::{clean_text, clean_text_with, truncate_chars, TextCleaning};
pub use crate::date::{
    date_from_epoch, format_canonical, normalize_date, parse_canonical, DateParser, DateStrategy, NormalizedDate, TimePeriod,
};

// ingestion and cleaning
pub use crate::ingest::{
    canonical_url, detect_format, discover_inputs, load_inputs, platform_from_url, read_records, records_from_document,
    Adapted, InputFormat, PostAdapter, RawRecord,
};
pub use crate::dedupe::{dedupe_posts, CleanStats, Deduplicator};

// scoring
pub use crate::relevance::{
    apply_relevance, evaluate_batch, evaluation_prompt, score_relevance, ExternalJudgments, JudgmentError, JudgmentMethod,
    KeywordJudge, RelevanceJudge, RelevanceScore, RelevanceSummary, RELEVANCE_THRESHOLD,
};
pub use crate::quality::{composite_score, score_corpus, QualityConfig, QualityGrade, QualityReport};

// analysis
pub use crate::lexicon::{KeywordCategory, Lang, Lexicon, Topic, TOPICS};
pub use crate::analyze::{
    classify_language, collect_documents, sentiment_score, Analyzer, DocSource, Document, LanguageAnalysis, Sentiment,
    SentimentLabel, TextAnalysis, YearTrend,
};
pub use crate::aggregate::{aggregate_parallel, Aggregator, CorpusOverview, PlatformCounts};

// statistics and report
pub use crate::stats::{CorpusStatistics, SourceEntry};
pub use crate::report::render_report;

// progress helpers
pub use crate::progress::{make_count_progress, ProgressScope};

//export staged writers and robust file ops so binaries can import from crate root.
pub use crate::output::{stage_json, stage_jsonl, stage_text, tmp_path_for, Sealed, StagedFile, CLEANED_POSTS_FILE, CLEANED_POSTS_JSONL_FILE, REPORT_FILE, STATISTICS_FILE};
pub use crate::util::{init_tracing_once, merge_extra_keywords, open_with_backoff, create_with_backoff, remove_with_backoff, replace_file_atomic_backoff};
