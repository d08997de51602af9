//! Markdown rendering of `CorpusStatistics`. Pure: the same statistics always
//! render to the same text.

use crate::analyze::LanguageAnalysis;
use crate::quality::QualityGrade;
use crate::stats::CorpusStatistics;
use crate::text::truncate_chars;
use std::fmt::{self, Write as _};

pub const SOURCE_TITLE_CHARS: usize = 50;
const TOP_WORDS_SHOWN: usize = 20;

fn mark(ok: bool) -> &'static str {
    if ok { "✓" } else { "✗" }
}

/// Render the full report.
pub fn render_report(s: &CorpusStatistics) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, s);
    out
}

fn write_report(out: &mut String, s: &CorpusStatistics) -> fmt::Result {
    writeln!(out, "# Discussion corpus analysis report")?;
    writeln!(out)?;
    writeln!(out, "Generated at: {}", s.generated_at)?;
    writeln!(out)?;
    overview(out, s)?;
    cleaning(out, s)?;
    quality(out, s)?;
    relevance(out, s)?;
    text_analysis(out, s)?;
    sources(out, s)?;
    conclusion(out, s)
}

fn overview(out: &mut String, s: &CorpusStatistics) -> fmt::Result {
    let o = &s.overview;
    writeln!(out, "## 1. Data overview")?;
    writeln!(out)?;
    writeln!(out, "- Posts: {}", o.total_posts)?;
    writeln!(out, "- Comments: {}", o.total_comments)?;
    match (&o.earliest_date, &o.latest_date) {
        (Some(a), Some(b)) => writeln!(out, "- Date range: {a} to {b}")?,
        _ => writeln!(out, "- Date range: unknown")?,
    }
    writeln!(out, "- Posts without a usable date: {}", o.posts_without_date)?;
    writeln!(out)?;
    writeln!(out, "| Platform | Posts | Comments |")?;
    writeln!(out, "|---|---:|---:|")?;
    for (name, c) in &o.platforms {
        writeln!(out, "| {name} | {} | {} |", c.posts, c.comments)?;
    }
    if !o.posts_per_year.is_empty() {
        writeln!(out)?;
        writeln!(out, "| Year | Posts |")?;
        writeln!(out, "|---|---:|")?;
        for (y, n) in &o.posts_per_year {
            writeln!(out, "| {y} | {n} |")?;
        }
    }
    writeln!(out)
}

fn cleaning(out: &mut String, s: &CorpusStatistics) -> fmt::Result {
    let c = &s.cleaning;
    writeln!(out, "## 2. Cleaning")?;
    writeln!(out)?;
    writeln!(out, "- Input records: {}", c.total_input)?;
    writeln!(out, "- Kept: {}", c.kept())?;
    writeln!(out, "- Duplicates removed: {}", c.duplicates_removed)?;
    writeln!(out, "- Invalid removed: {}", c.invalid_removed)?;
    for (reason, n) in &c.rejections {
        writeln!(out, "  - {reason}: {n}")?;
    }
    writeln!(out, "- Comments kept: {}", c.comments_cleaned)?;
    writeln!(out, "- Comments dropped: {}", c.comments_dropped)?;
    writeln!(out, "- Values defaulted during coercion: {}", c.values_defaulted)?;
    writeln!(out)
}

fn quality(out: &mut String, s: &CorpusStatistics) -> fmt::Result {
    let q = &s.quality;
    let ch = &q.checks;
    writeln!(out, "## 3. Data quality")?;
    writeln!(out)?;
    writeln!(out, "Overall quality score: **{:.2}/100** ({})", ch.overall_quality_score, q.grade())?;
    writeln!(out)?;
    writeln!(out, "| Check | Result |")?;
    writeln!(out, "|---|---|")?;
    writeln!(
        out,
        "| At least {} posts | {} ({}) |",
        q.thresholds.min_posts_required,
        mark(ch.meets_min_posts),
        q.basic.total_posts
    )?;
    writeln!(
        out,
        "| At least {} posts with {}+ comments | {} ({}) |",
        q.thresholds.min_posts_required,
        q.thresholds.min_comments_per_post,
        mark(ch.meets_min_comments),
        q.basic.valid_posts
    )?;
    writeln!(out, "| Posts with a date | {:.1}% |", ch.has_time_info_pct)?;
    writeln!(out, "| Posts with an author | {:.1}% |", ch.has_author_info_pct)?;
    writeln!(out, "| Average content length | {:.1} chars |", ch.avg_content_length)?;
    writeln!(out)?;

    let b = &q.basic;
    writeln!(
        out,
        "Comments per post: avg {:.1}, min {}, max {}.",
        b.avg_comments_per_post, b.min_comments, b.max_comments
    )?;
    writeln!(out)?;

    let t = &q.time_periods;
    writeln!(out, "| Period | Posts |")?;
    writeln!(out, "|---|---:|")?;
    for p in &t.periods {
        writeln!(out, "| {} | {} |", p.name, p.count)?;
    }
    writeln!(out, "| (outside all periods or undated) | {} |", t.without_time)?;
    writeln!(out)?;

    let c = &q.comments;
    writeln!(out, "Comment quality:")?;
    writeln!(out)?;
    writeln!(out, "- Comments: {}", c.total_comments)?;
    writeln!(out, "- Length: avg {:.1}, min {}, max {}", c.avg_length, c.min_length, c.max_length)?;
    writeln!(
        out,
        "- High quality: {} ({:.1}%)",
        c.high_quality_count, c.high_quality_percentage
    )?;
    writeln!(out)?;

    let kc = &q.keyword_coverage;
    writeln!(
        out,
        "Keyword coverage: {}/{} primary and {}/{} secondary keywords appear in at least one post.",
        kc.primary_keywords_hit,
        kc.primary.len(),
        kc.secondary_keywords_hit,
        kc.secondary.len()
    )?;
    writeln!(out)?;

    writeln!(out, "Recommendations:")?;
    writeln!(out)?;
    for r in q.recommendations() {
        writeln!(out, "- {r}")?;
    }
    writeln!(out)
}

fn relevance(out: &mut String, s: &CorpusStatistics) -> fmt::Result {
    let Some(r) = &s.relevance else { return Ok(()) };
    writeln!(out, "## 4. Relevance")?;
    writeln!(out)?;
    writeln!(out, "- Posts judged: {}", r.total)?;
    writeln!(out, "- Relevant: {}", r.relevant)?;
    writeln!(out, "- Average score: {:.3}", r.average_score)?;
    writeln!(out, "- External judgments used: {}", r.external_judgments)?;
    writeln!(out)
}

fn language_section(out: &mut String, l: &LanguageAnalysis) -> fmt::Result {
    writeln!(out, "### {} ({} documents)", l.lang.label(), l.documents)?;
    writeln!(out)?;
    if l.documents == 0 {
        writeln!(out, "No documents.")?;
        return writeln!(out);
    }

    for cat in l.keyword_frequency.iter().filter(|c| !c.keywords.is_empty()) {
        writeln!(out, "**{}**", cat.category)?;
        writeln!(out)?;
        writeln!(out, "| Keyword | Count |")?;
        writeln!(out, "|---|---:|")?;
        for k in &cat.keywords {
            writeln!(out, "| {} | {} |", k.keyword, k.count)?;
        }
        writeln!(out)?;
    }

    if !l.top_words.is_empty() {
        let words: Vec<String> = l
            .top_words
            .iter()
            .take(TOP_WORDS_SHOWN)
            .map(|w| format!("{} ({})", w.word, w.count))
            .collect();
        writeln!(out, "Top words: {}", words.join(", "))?;
        writeln!(out)?;
    }

    let st = &l.sentiment;
    let pct = |n: u64| if l.documents == 0 { 0.0 } else { n as f64 / l.documents as f64 * 100.0 };
    writeln!(
        out,
        "Sentiment: positive {} ({:.1}%), neutral {} ({:.1}%), negative {} ({:.1}%), average {:.3}",
        st.positive,
        pct(st.positive),
        st.neutral,
        pct(st.neutral),
        st.negative,
        pct(st.negative),
        st.average_score
    )?;
    writeln!(out)?;

    writeln!(out, "| Topic | Documents |")?;
    writeln!(out, "|---|---:|")?;
    for t in &l.topics {
        writeln!(out, "| {} | {} |", t.topic, t.documents)?;
    }
    writeln!(out)
}

fn text_analysis(out: &mut String, s: &CorpusStatistics) -> fmt::Result {
    writeln!(out, "## 5. Text analysis")?;
    writeln!(out)?;
    writeln!(out, "Documents analyzed: {}", s.text.total_documents)?;
    writeln!(out)?;
    for l in &s.text.languages {
        language_section(out, l)?;
    }
    if !s.text.time_trend.is_empty() {
        writeln!(out, "### Trend by year")?;
        writeln!(out)?;
        writeln!(out, "| Year | Posts | Average sentiment |")?;
        writeln!(out, "|---|---:|---:|")?;
        for y in &s.text.time_trend {
            writeln!(out, "| {} | {} | {:.3} |", y.year, y.posts, y.avg_sentiment)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn sources(out: &mut String, s: &CorpusStatistics) -> fmt::Result {
    writeln!(out, "## 6. Sources")?;
    writeln!(out)?;
    for (i, src) in s.sources.iter().enumerate() {
        writeln!(
            out,
            "{}. [{}] {} ({} comments) <{}>",
            i + 1,
            src.platform,
            truncate_chars(&src.title, SOURCE_TITLE_CHARS, "..."),
            src.comments,
            src.url
        )?;
    }
    writeln!(out)
}

fn conclusion(out: &mut String, s: &CorpusStatistics) -> fmt::Result {
    writeln!(out, "## 7. Conclusion")?;
    writeln!(out)?;
    let text = match s.quality.grade() {
        QualityGrade::Good => "The corpus meets the quality bar and supports the analysis above.",
        QualityGrade::Medium => {
            "The corpus is usable, but the findings should be read with care; more data would strengthen them."
        }
        QualityGrade::Poor => "The corpus falls short of the quality bar; the findings above are indicative only.",
    };
    writeln!(out, "{text}")
}
