use crate::analyze::Analyzer;
use crate::config::{PipelineConfig, PipelineOptions};
use crate::dedupe::{CleanStats, Deduplicator};
use crate::ingest::{discover_inputs, read_records, PostAdapter, RawRecord};
use crate::model::Post;
use crate::output::{
    stage_json, stage_jsonl, stage_text, Sealed, CLEANED_POSTS_FILE, CLEANED_POSTS_JSONL_FILE, REPORT_FILE,
    STATISTICS_FILE,
};
use crate::progress::ProgressScope;
use crate::quality::{score_corpus, QualityConfig, QualityGrade};
use crate::relevance::{apply_relevance, evaluate_batch, ExternalJudgments, KeywordJudge, RelevanceJudge, RelevanceSummary};
use crate::report::render_report;
use crate::stats::CorpusStatistics;
use crate::util::init_tracing_once;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// One-shot batch: ingest, clean, score, analyze, report.
#[derive(Clone, Debug, Default)]
pub struct ThreadEtl {
    pub(crate) opts: PipelineOptions,
}

/// In-memory result of a run, before anything is written.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    pub posts: Vec<Post>,
    pub statistics: CorpusStatistics,
}

/// What `run` wrote.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub out_dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub posts_kept: usize,
    pub cleaning: CleanStats,
    pub quality_score: f64,
    pub grade: QualityGrade,
}

impl ThreadEtl {
    pub fn new() -> Self {
        Self { opts: PipelineOptions::default() }
    }

    pub fn from_options(opts: PipelineOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.opts
    }

    // -------- Builder methods --------
    pub fn input(mut self, path: impl AsRef<Path>) -> Self { self.opts = self.opts.with_input(path); self }
    pub fn inputs<I, P>(mut self, paths: I) -> Self where I: IntoIterator<Item = P>, P: AsRef<Path> { self.opts = self.opts.with_inputs(paths); self }
    pub fn out_dir(mut self, dir: impl AsRef<Path>) -> Self { self.opts = self.opts.with_out_dir(dir); self }
    pub fn config(mut self, config: PipelineConfig) -> Self { self.opts = self.opts.with_config(config); self }
    pub fn reference_time(mut self, at: OffsetDateTime) -> Self { self.opts = self.opts.with_reference_time(at); self }
    pub fn parallelism(mut self, threads: usize) -> Self { self.opts = self.opts.with_parallelism(threads); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_label(mut self, label: impl Into<String>) -> Self { self.opts = self.opts.with_progress_label(label); self }
    pub fn overwrite_relevance(mut self, yes: bool) -> Self { self.opts = self.opts.with_overwrite_relevance(yes); self }
    pub fn judgments(mut self, path: impl AsRef<Path>) -> Self { self.opts = self.opts.with_judgments(path); self }
    pub fn jsonl_output(mut self, yes: bool) -> Self { self.opts = self.opts.with_jsonl_output(yes); self }
    pub fn io_read_buffer(mut self, bytes: usize) -> Self { self.opts = self.opts.with_io_read_buffer(bytes); self }
    pub fn io_write_buffer(mut self, bytes: usize) -> Self { self.opts = self.opts.with_io_write_buffer(bytes); self }

    fn label(&self, stage: &str) -> String {
        match self.opts.progress_label.as_deref() {
            Some(l) => format!("{l}: {stage}"),
            None => stage.to_string(),
        }
    }

    /// Read every input file, in discovery order.
    pub fn load(&self) -> Result<Vec<RawRecord>> {
        if self.opts.inputs.is_empty() {
            bail!("no inputs configured");
        }
        let files = discover_inputs(&self.opts.inputs)?;
        tracing::info!("Planned {} input files.", files.len());
        let pb = ProgressScope::count_if(self.opts.progress, self.label("Reading inputs"), files.len() as u64);
        let mut records = Vec::new();
        for f in &files {
            let recs = read_records(f, self.opts.read_buffer_bytes)?;
            tracing::debug!(path=%f.display(), records=recs.len(), "loaded input");
            records.extend(recs);
            if let Some(pb) = &pb {
                pb.inc_items(1);
            }
        }
        if let Some(pb) = &pb {
            pb.finish(format!("{} records", records.len()));
        }
        Ok(records)
    }

    /// Everything after ingestion. Writes nothing.
    pub fn process_records(&self, records: Vec<RawRecord>) -> Result<PipelineOutput> {
        let cfg = &self.opts.config;
        let reference = self.opts.reference_time.unwrap_or_else(OffsetDateTime::now_utc);

        let (mut posts, cleaning) = Deduplicator::new(PostAdapter::new(reference)).run(records);

        let keyword_judge = KeywordJudge::new(cfg.keywords.clone());
        let judge: Box<dyn RelevanceJudge> = match &self.opts.judgments_path {
            Some(path) => Box::new(ExternalJudgments::load(path, keyword_judge)?),
            None => Box::new(keyword_judge),
        };
        let pb = ProgressScope::count_if(self.opts.progress, self.label("Scoring relevance"), posts.len() as u64);
        let scores = evaluate_batch(&posts, judge.as_ref(), pb.as_ref());
        if let Some(pb) = &pb {
            pb.finish("relevance scored");
        }
        let updated = apply_relevance(&mut posts, &scores, self.opts.overwrite_relevance);
        let relevance = RelevanceSummary::from_scores(&scores);
        tracing::info!(
            judged = relevance.total,
            relevant = relevance.relevant,
            updated,
            external = relevance.external_judgments,
            "relevance applied"
        );

        let quality = score_corpus(&posts, &QualityConfig::from(cfg));
        tracing::info!(score = quality.checks.overall_quality_score, grade = %quality.grade(), "quality scored");

        let analyzer = cfg
            .lexicons
            .iter()
            .fold(Analyzer::default(), |a, (lang, lex)| a.with_lexicon(*lang, lex.clone()))
            .with_max_comments_per_post(cfg.max_comments_per_post_analyzed)
            .with_top_words(cfg.top_words);
        analyzer.annotate_sentiment(&mut posts);
        let eligible: Vec<Post> = posts
            .iter()
            .filter(|p| p.meets_analysis_threshold(cfg.analysis_min_comments))
            .cloned()
            .collect();
        if eligible.len() < posts.len() {
            tracing::info!(
                analyzed = eligible.len(),
                skipped = posts.len() - eligible.len(),
                "posts left out of text analysis"
            );
        }
        let text = analyzer.analyze(&eligible);

        let generated_at = reference.format(&Rfc3339).context("format run timestamp")?;
        let statistics = CorpusStatistics::build(generated_at, &posts, cleaning, quality, Some(relevance), text);
        Ok(PipelineOutput { posts, statistics })
    }

    /// Run end to end and write the outputs into `out_dir`. All files are staged
    /// first; nothing is moved into place unless every file was written.
    pub fn run(self) -> Result<RunSummary> {
        init_tracing_once();
        if let Some(n) = self.opts.parallelism { if n > 0 { rayon::ThreadPoolBuilder::new().num_threads(n).build_global().ok(); } }

        let records = self.load()?;
        let output = self.process_records(records)?;

        let out_dir = self.opts.out_dir.clone();
        fs::create_dir_all(&out_dir).with_context(|| format!("create output dir {}", out_dir.display()))?;

        let staged = self.stage_outputs(&output)?;
        let mut files = Vec::with_capacity(staged.len());
        for s in staged {
            files.push(s.promote()?);
        }

        let quality = &output.statistics.quality;
        let summary = RunSummary {
            out_dir,
            files,
            posts_kept: output.posts.len(),
            cleaning: output.statistics.cleaning.clone(),
            quality_score: quality.checks.overall_quality_score,
            grade: quality.grade(),
        };
        tracing::info!(
            out_dir=%summary.out_dir.display(),
            files = summary.files.len(),
            posts = summary.posts_kept,
            score = summary.quality_score,
            "run finished"
        );
        Ok(summary)
    }

    fn stage_outputs(&self, output: &PipelineOutput) -> Result<Vec<Sealed>> {
        let mut staged = Vec::with_capacity(4);
        if let Err(e) = self.stage_into(&mut staged, output) {
            for s in staged {
                let dest = s.dest().display().to_string();
                if let Err(d) = s.discard() {
                    tracing::warn!(dest = %dest, error = %d, "could not remove staged file");
                }
            }
            return Err(e);
        }
        Ok(staged)
    }

    fn stage_into(&self, staged: &mut Vec<Sealed>, output: &PipelineOutput) -> Result<()> {
        let dir = &self.opts.out_dir;
        let buf = self.opts.write_buffer_bytes;
        staged.push(stage_json(&dir.join(CLEANED_POSTS_FILE), &output.posts, true, buf)?);
        if self.opts.emit_jsonl {
            staged.push(stage_jsonl(&dir.join(CLEANED_POSTS_JSONL_FILE), &output.posts, buf)?);
        }
        staged.push(stage_json(&dir.join(STATISTICS_FILE), &output.statistics, true, buf)?);
        staged.push(stage_text(&dir.join(REPORT_FILE), &render_report(&output.statistics), buf)?);
        Ok(())
    }
}
