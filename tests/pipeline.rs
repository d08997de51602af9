#[path = "common/mod.rs"]
mod common;

use common::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use threadetl::{
    detect_format, read_records, render_report, CorpusStatistics, InputFormat, Platform, Post, ThreadEtl, CLEANED_POSTS_FILE,
    CLEANED_POSTS_JSONL_FILE, REPORT_FILE, STATISTICS_FILE,
};

fn etl() -> ThreadEtl {
    ThreadEtl::new().progress(false).reference_time(reference())
}

fn read_posts(path: &Path) -> Vec<Post> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn run_writes_cleaned_posts_statistics_and_report() {
    let (dir, raw_dir) = make_snapshot();
    let out = dir.path().join("processed");

    let summary = etl().input(&raw_dir).out_dir(&out).run().unwrap();
    assert_eq!(summary.files.len(), 3);
    assert_eq!(summary.posts_kept, 2);
    assert_eq!(summary.cleaning.total_input, 5);
    assert_eq!(summary.cleaning.duplicates_removed, 1);
    assert_eq!(summary.cleaning.invalid_removed, 2);
    assert_eq!(summary.cleaning.rejections.get("empty_title"), Some(&1));
    assert_eq!(summary.cleaning.rejections.get("not_an_object"), Some(&1));
    assert_eq!(summary.cleaning.comments_cleaned, 4);
    assert_eq!(summary.cleaning.comments_dropped, 1);

    let posts = read_posts(&out.join(CLEANED_POSTS_FILE));
    assert_eq!(posts.len(), 2);
    // inputs are read in sorted path order: lines.jsonl, single.json, wrapper.json
    assert_eq!(posts[0].platform, Platform::Reddit);
    assert_eq!(posts[0].created_at.as_deref(), Some("2025-01-07"));
    assert_eq!(posts[0].comments[0].upvotes, 12);
    assert_eq!(posts[1].title, "AI 会取代程序员吗");
    for p in &posts {
        // keyword scores annotate but never decide
        assert_eq!(p.is_relevant, None);
        assert!(p.relevance_note.is_some());
        assert_eq!(p.metadata.comment_count, p.comments.len() as u64);
        assert!(p.comments.iter().all(|c| c.sentiment_score.is_some()));
    }

    let stats: CorpusStatistics = serde_json::from_str(&fs::read_to_string(out.join(STATISTICS_FILE)).unwrap()).unwrap();
    assert_eq!(stats.generated_at, "2025-01-10T00:00:00Z");
    assert_eq!(stats.overview.total_posts, 2);
    assert_eq!(stats.sources.len(), 2);
    assert_eq!(stats.cleaning, summary.cleaning);

    let report = fs::read_to_string(out.join(REPORT_FILE)).unwrap();
    assert!(report.starts_with("# Discussion corpus analysis report"));
    assert!(report.contains("Generated at: 2025-01-10T00:00:00Z"));
    assert!(report.contains("  - empty_title: 1"));
    assert!(report.contains("1. [reddit] Is ChatGPT going to take junior developer jobs? (1 comments)"));
    assert_eq!(report, render_report(&stats));

    // nothing staged is left behind
    for e in fs::read_dir(&out).unwrap() {
        let name = e.unwrap().file_name().to_string_lossy().to_string();
        assert!(!name.ends_with(".tmp"), "leftover {name}");
    }
}

#[test]
fn jsonl_output_is_optional() {
    let (dir, raw_dir) = make_snapshot();
    let out = dir.path().join("processed");
    let summary = etl().input(&raw_dir).out_dir(&out).jsonl_output(true).run().unwrap();
    assert_eq!(summary.files.len(), 4);
    let lines = fs::read_to_string(out.join(CLEANED_POSTS_JSONL_FILE)).unwrap();
    let posts: Vec<Post> = lines.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(posts, read_posts(&out.join(CLEANED_POSTS_FILE)));
}

#[test]
fn external_judgments_drive_relevance_and_analysis_scope() {
    let (dir, raw_dir) = make_snapshot();
    let out = dir.path().join("processed");
    let judgments = dir.path().join("judgments.json");
    write_json(
        &judgments,
        &json!({"https://www.zhihu.com/question/1": {"is_relevant": false, "score": 0.2, "reasons": ["too general"]}}),
    );

    etl().input(&raw_dir).out_dir(&out).judgments(&judgments).run().unwrap();

    let posts = read_posts(&out.join(CLEANED_POSTS_FILE));
    assert_eq!(posts[1].is_relevant, Some(false));
    assert_eq!(posts[1].relevance_note.as_deref(), Some("too general"));

    let stats: CorpusStatistics = serde_json::from_str(&fs::read_to_string(out.join(STATISTICS_FILE)).unwrap()).unwrap();
    let rel = stats.relevance.unwrap();
    assert_eq!(rel.total, 2);
    assert_eq!(rel.external_judgments, 1);
    // the zhihu post is explicitly irrelevant: only the reddit post and its comment are analyzed
    assert_eq!(stats.text.total_documents, 2);
    // quality still covers every cleaned post
    assert_eq!(stats.quality.basic.total_posts, 2);
}

#[test]
fn low_keyword_score_does_not_remove_a_post_from_analysis() {
    let records = raw(vec![json!({
        "url": "https://www.reddit.com/r/programming/comments/xyz",
        "title": "Will LLMs replace software developers?",
        "content": "It keeps getting better at writing code.",
        "author": "erin",
        "created_at": "2024年5月1日",
        "comments": [{"body": "Learn to review its output.", "author": "frank"}],
    })]);

    let out = etl().process_records(records).unwrap();
    let post = &out.posts[0];
    assert_eq!(post.is_relevant, None);
    assert_eq!(post.relevance_note.as_deref(), Some("secondary keywords: IT"));

    let rel = out.statistics.relevance.as_ref().unwrap();
    assert_eq!((rel.total, rel.relevant), (1, 0));

    let text = &out.statistics.text;
    assert_eq!(text.total_documents, 2);
    assert_eq!(text.language(threadetl::Lang::En).unwrap().documents, 2);
    let years: Vec<(i32, u64)> = text.time_trend.iter().map(|y| (y.year, y.posts)).collect();
    assert_eq!(years, vec![(2024, 1)]);
}

#[test]
fn same_input_renders_the_same_report() {
    let (_dir, raw_dir) = make_snapshot();
    let e = etl().input(&raw_dir);
    let records = e.load().unwrap();
    let a = e.process_records(records.clone()).unwrap();
    let b = e.process_records(records).unwrap();
    assert_eq!(a.posts, b.posts);
    assert_eq!(a.statistics, b.statistics);
    assert_eq!(render_report(&a.statistics), render_report(&b.statistics));
}

#[test]
fn missing_input_is_fatal_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("processed");
    let err = etl().input(dir.path().join("nope")).out_dir(&out).run().unwrap_err();
    assert!(format!("{err:#}").contains("input not found"));
    assert!(!out.exists());

    assert!(etl().out_dir(&out).run().is_err());
}

#[test]
fn unparsable_document_is_fatal_and_names_the_file() {
    let (dir, raw_dir) = make_snapshot();
    fs::write(raw_dir.join("broken.json"), "{oops").unwrap();
    let out = dir.path().join("processed");
    let err = etl().input(&raw_dir).out_dir(&out).run().unwrap_err();
    assert!(format!("{err:#}").contains("broken.json"));
    assert!(!out.join(CLEANED_POSTS_FILE).exists());
}

#[test]
fn input_formats_are_detected_by_extension() {
    assert_eq!(detect_format(Path::new("a.json")), Some((InputFormat::Json, false)));
    assert_eq!(detect_format(Path::new("a.JSONL")), Some((InputFormat::JsonLines, false)));
    assert_eq!(detect_format(Path::new("a.ndjson.zst")), Some((InputFormat::JsonLines, true)));
    assert_eq!(detect_format(Path::new("a.json.zst")), Some((InputFormat::Json, true)));
    assert_eq!(detect_format(Path::new("a.txt")), None);
    assert_eq!(detect_format(Path::new("a.zst")), None);
}

#[test]
fn every_document_shape_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let d = dir.path();
    let p = |i: usize| post_json(&format!("https://www.zhihu.com/question/{i}"), "t", 0);

    write_json(&d.join("object.json"), &p(1));
    write_json(&d.join("array.json"), &json!([p(2), p(3)]));
    write_json(&d.join("wrapped.json"), &json!({"meta": {"page": 1}, "data": [p(4), p(5), p(6)]}));
    write_json(&d.join("unwrapped.json"), &json!({"items": "not an array", "title": "x"}));
    write_lines(&d.join("lines.ndjson"), &[p(7).to_string(), String::new(), "{broken".into(), p(8).to_string()]);
    write_zst_lines(&d.join("lines.jsonl.zst"), &[p(9).to_string(), p(10).to_string()]);
    write_zst_lines(&d.join("doc.json.zst"), &[json!([p(11)]).to_string()]);
    fs::write(d.join("notes.txt"), "ignored").unwrap();

    let n = |name: &str| read_records(&d.join(name), 8 * 1024).unwrap().len();
    assert_eq!(n("object.json"), 1);
    assert_eq!(n("array.json"), 2);
    assert_eq!(n("wrapped.json"), 3);
    assert_eq!(n("unwrapped.json"), 1);
    assert_eq!(n("lines.ndjson"), 3);
    assert_eq!(n("lines.jsonl.zst"), 2);
    assert_eq!(n("doc.json.zst"), 1);

    let recs = read_records(&d.join("lines.ndjson"), 8 * 1024).unwrap();
    assert!(recs[1].value.is_string());
    assert!(recs[0].origin.as_deref().unwrap().ends_with("lines.ndjson"));

    let all = threadetl::load_inputs(&[d.to_path_buf()], 8 * 1024).unwrap();
    assert_eq!(all.len(), 13);
}

#[test]
fn corrupt_zstd_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.jsonl.zst");
    fs::write(&path, b"definitely not zstd").unwrap();
    assert!(read_records(&path, 8 * 1024).is_err());
}
