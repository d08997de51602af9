#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use threadetl::{Comment, Post, RawRecord};
use time::macros::datetime;
use time::OffsetDateTime;

/// Fixed "now" for every test that resolves relative dates.
pub fn reference() -> OffsetDateTime {
    datetime!(2025-01-10 00:00 UTC)
}

pub fn raw(values: Vec<Value>) -> Vec<RawRecord> {
    values.into_iter().map(RawRecord::new).collect()
}

/// A raw comment object with a distinct body.
pub fn comment_json(i: usize) -> Value {
    json!({
        "content": format!("comment number {i} about AI and programmers"),
        "author": format!("user{i}"),
        "upvotes": i,
    })
}

/// A raw zhihu post with `n` comments.
pub fn post_json(url: &str, title: &str, n: usize) -> Value {
    json!({
        "platform": "zhihu",
        "url": url,
        "title": title,
        "content": "程序员会被大模型取代吗？",
        "author": "alice",
        "created_at": "2024-05-01",
        "scraped_at": "2025-01-10T00:00:00Z",
        "comments": (0..n).map(comment_json).collect::<Vec<_>>(),
    })
}

/// A validated post built directly through the model constructors.
pub fn make_post(url: &str, title: &str, comments: usize) -> Post {
    let mut p = Post::new("reddit", None, url, title, "2025-01-10T00:00:00Z").unwrap();
    for i in 0..comments {
        p.push_comment(Comment::new(format!("reply {i}"), format!("user{i}")).unwrap());
    }
    p
}

pub fn write_json(path: &Path, v: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(v).unwrap()).unwrap();
}

pub fn write_lines(path: &Path, lines: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut f = File::create(path).unwrap();
    for l in lines {
        writeln!(f, "{}", l).unwrap();
    }
}

/// Write a compressed `.zst` file containing the provided lines.
pub fn write_zst_lines(path: &Path, lines: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let f = File::create(path).unwrap();
    let mut enc = zstd::stream::write::Encoder::new(f, 3).unwrap();
    for l in lines {
        writeln!(&mut enc, "{}", l).unwrap();
    }
    enc.finish().unwrap();
}

/// A small raw snapshot spread over three input shapes:
/// - `raw/wrapper.json`: wrapper object with two posts (same URL up to host case)
/// - `raw/single.json`: a single post object with an empty title (invalid)
/// - `raw/lines.jsonl`: one valid post, one malformed line
///
/// Returns `(tempdir, raw_dir)`.
pub fn make_snapshot() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let raw_dir = dir.path().join("raw");

    write_json(
        &raw_dir.join("wrapper.json"),
        &json!({
            "posts": [
                post_json("https://www.zhihu.com/question/1", "AI 会取代程序员吗", 3),
                post_json("https://WWW.ZHIHU.COM/question/1", "duplicate copy", 1),
            ]
        }),
    );
    write_json(&raw_dir.join("single.json"), &post_json("https://www.zhihu.com/question/2", "   ", 2));
    write_lines(
        &raw_dir.join("lines.jsonl"),
        &[
            json!({
                "url": "https://www.reddit.com/r/cscareerquestions/comments/abc",
                "title": "Is ChatGPT going to take junior developer jobs?",
                "content": "I worry about layoffs but the tools are helpful.",
                "author": "bob",
                "created_at": "3 days ago",
                "comments": [
                    {"body": "Learning to use the tools is a great opportunity", "author": "carol", "ups": "12"},
                    {"body": "   ", "author": "dave"},
                ]
            })
            .to_string(),
            "{not json".to_string(),
        ],
    );
    (dir, raw_dir)
}
