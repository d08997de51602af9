#[path = "common/mod.rs"]
mod common;

use common::*;
use serde_json::json;
use threadetl::{dedupe_posts, Deduplicator, Platform, PostAdapter, PostType, RawRecord};

fn dedup() -> Deduplicator {
    Deduplicator::new(PostAdapter::new(reference()))
}

/// Two records with the same URL: the first one in list order survives.
#[test]
fn first_occurrence_wins_on_duplicate_url() {
    let records = raw(vec![
        post_json("https://www.zhihu.com/question/7", "A", 0),
        post_json("https://www.zhihu.com/question/7", "B", 0),
    ]);
    let (posts, stats) = dedup().run(records);
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "A");
    assert_eq!(stats.duplicates_removed, 1);
    assert_eq!(stats.invalid_removed, 0);
}

#[test]
fn url_identity_ignores_scheme_and_host_case_only() {
    let records = raw(vec![
        post_json("https://www.zhihu.com/question/7", "A", 0),
        post_json("  HTTPS://WWW.ZHIHU.COM/question/7 ", "B", 0),
        post_json("https://www.zhihu.com/Question/7", "C", 0),
    ]);
    let (posts, stats) = dedup().run(records);
    let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "C"]);
    assert_eq!(stats.duplicates_removed, 1);
}

/// A title that is empty after cleaning makes the record invalid.
#[test]
fn empty_title_is_dropped() {
    let records = raw(vec![post_json("https://www.zhihu.com/question/8", " <p> </p> ", 2)]);
    let (posts, stats) = dedup().run(records);
    assert!(posts.is_empty());
    assert_eq!(stats.invalid_removed, 1);
    assert_eq!(stats.rejections.get("empty_title"), Some(&1));
}

#[test]
fn rejections_are_tallied_by_reason() {
    let records = raw(vec![
        json!("just a string"),
        json!({"title": "no url here", "platform": "zhihu"}),
        json!({"url": "https://example.com/1", "title": "unknown host", "platform": "myspace"}),
        json!({"url": "https://www.v2ex.com/t/1", "title": "bad type", "platform": "V2EX", "post_type": "podcast"}),
        json!({"url": "https://example.com/2", "title": "no platform at all"}),
        json!({"url": "https://www.v2ex.com/t/2", "title": "fine", "platform": "V2EX"}),
    ]);
    let (posts, stats) = dedup().run(records);
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].platform, Platform::V2ex);
    assert_eq!(posts[0].post_type, PostType::Topic);
    assert_eq!(stats.invalid_removed, 5);
    assert_eq!(stats.rejections.get("not_an_object"), Some(&1));
    assert_eq!(stats.rejections.get("missing_url"), Some(&1));
    assert_eq!(stats.rejections.get("bad_platform"), Some(&2));
    assert_eq!(stats.rejections.get("bad_post_type"), Some(&1));
}

/// Records without a URL have no dedup key, so repeats of them are never
/// counted as duplicates; they fall through to validation instead.
#[test]
fn keyless_records_are_invalid_not_duplicates() {
    let records = raw(vec![json!({"title": "x"}), json!({"title": "x"}), json!({"url": "", "title": "x"})]);
    let (posts, stats) = dedup().run(records);
    assert!(posts.is_empty());
    assert_eq!(stats.duplicates_removed, 0);
    assert_eq!(stats.invalid_removed, 3);
    assert_eq!(stats.rejections.get("missing_url"), Some(&3));
}

#[test]
fn conservation_holds_over_a_mixed_batch() {
    let mut values = Vec::new();
    for i in 0..30 {
        let url = format!("https://www.zhihu.com/question/{}", i % 12);
        let title = if i % 7 == 0 { String::new() } else { format!("title {i}") };
        values.push(post_json(&url, &title, i % 4));
    }
    values.push(json!(42));
    values.push(json!(null));
    let records = raw(values);
    let total = records.len() as u64;

    let (posts, stats) = dedup().run(records);
    assert_eq!(stats.total_input, total);
    assert_eq!(stats.total_input, posts.len() as u64 + stats.duplicates_removed + stats.invalid_removed);
    assert_eq!(stats.kept(), posts.len() as u64);
    assert_eq!(stats.invalid_removed, stats.rejections.values().sum::<u64>());
}

#[test]
fn comment_cascade_cleans_coerces_and_counts() {
    let records = raw(vec![json!({
        "platform": "bilibili",
        "url": "https://www.bilibili.com/video/BV1",
        "title": "<b>AI</b> 与程序员",
        "metadata": {"view_count": "1.2万", "comment_count": 999},
        "comments": [
            {"content": "  说得  <i>好</i> ", "author": "u1", "upvotes": "3k", "downvotes": -2},
            {"content": "", "author": "u2"},
            {"content": "<br/>", "author": "u3"},
            {"content": "没有作者", "is_author_reply": "maybe"},
            "not an object",
        ],
    })]);
    let (posts, stats) = dedup().run(records);
    assert_eq!(posts.len(), 1);
    let p = &posts[0];
    assert_eq!(p.title, "AI 与程序员");
    assert_eq!(p.post_type, PostType::Video);
    assert_eq!(p.metadata.view_count, 12_000);

    assert_eq!(p.comments.len(), 2);
    assert_eq!(p.comments[0].content, "说得 好");
    assert_eq!(p.comments[0].upvotes, 3_000);
    assert_eq!(p.comments[0].downvotes, 0);
    assert_eq!(p.comments[1].author, "unknown");
    assert!(!p.comments[1].is_author_reply);

    assert_eq!(stats.comments_cleaned, 2);
    assert_eq!(stats.comments_dropped, 3);
    // negative downvotes and the unreadable bool
    assert_eq!(stats.values_defaulted, 2);
}

#[test]
fn comment_count_always_matches_comment_list() {
    let records = raw(vec![
        json!({"url": "https://www.zhihu.com/question/1", "title": "a", "platform": "zhihu",
               "metadata": {"comment_count": 500}, "comments": [{"content": "x", "author": "y"}]}),
        json!({"url": "https://www.zhihu.com/question/2", "title": "b", "platform": "zhihu", "comment_count": "12"}),
        post_json("https://www.zhihu.com/question/3", "c", 4),
    ]);
    let (mut posts, _) = dedup().run(records);
    for p in &posts {
        assert_eq!(p.metadata.comment_count, p.comments.len() as u64);
    }
    posts[2].comments.pop();
    posts[2].recompute_comment_count();
    posts[2].recompute_comment_count();
    assert_eq!(posts[2].metadata.comment_count, 3);
}

#[test]
fn platform_is_inferred_from_url_and_deleted_author_is_kept() {
    let records = raw(vec![json!({
        "url": "https://old.reddit.com/r/programming/comments/xyz",
        "title": "Copilot wrote my tests",
        "comments": [{"body": "removed by moderator? no", "author": "[deleted]"}],
    })]);
    let (posts, _) = dedup().run(records);
    assert_eq!(posts[0].platform, Platform::Reddit);
    assert_eq!(posts[0].post_type, PostType::Topic);
    assert_eq!(posts[0].comments[0].author, "[deleted]");
}

#[test]
fn dates_are_normalized_or_kept_raw() {
    let records = raw(vec![
        json!({"url": "https://www.v2ex.com/t/1", "title": "a", "platform": "v2ex", "created_at": "3 days ago"}),
        json!({"url": "https://www.v2ex.com/t/2", "title": "b", "platform": "v2ex", "created_at": 1_704_067_200}),
        json!({"url": "https://www.v2ex.com/t/3", "title": "c", "platform": "v2ex", "created_at": "sometime last spring"}),
        json!({"url": "https://www.v2ex.com/t/4", "title": "d", "platform": "v2ex", "created_at": "2023年03月05日"}),
    ]);
    let (posts, _) = dedup().run(records);
    let dates: Vec<Option<&str>> = posts.iter().map(|p| p.created_at.as_deref()).collect();
    assert_eq!(
        dates,
        vec![Some("2025-01-07"), Some("2024-01-01"), Some("sometime last spring"), Some("2023-03-05")]
    );
}

/// Deduplicating already-clean posts changes nothing.
#[test]
fn dedupe_posts_is_a_no_op_on_clean_output() {
    let (_dir, raw_dir) = make_snapshot();
    let records = threadetl::load_inputs(&[raw_dir], 64 * 1024).unwrap();
    let (posts, _) = dedup().run(records);
    assert_eq!(dedupe_posts(posts.clone()), posts);
}

/// Cleaning the serialized output of a cleaning run yields the same posts.
#[test]
fn cleaning_serialized_output_is_idempotent() {
    let (_dir, raw_dir) = make_snapshot();
    let records = threadetl::load_inputs(&[raw_dir], 64 * 1024).unwrap();
    let (first, _) = dedup().run(records);

    let round: Vec<RawRecord> = first.iter().map(|p| RawRecord::new(serde_json::to_value(p).unwrap())).collect();
    let (second, stats) = dedup().run(round);
    assert_eq!(second, first);
    assert_eq!(stats.duplicates_removed, 0);
    assert_eq!(stats.invalid_removed, 0);
}
