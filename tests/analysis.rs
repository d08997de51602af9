#[path = "common/mod.rs"]
mod common;

use common::*;
use threadetl::{
    classify_language, collect_documents, sentiment_score, Analyzer, Comment, DocSource, KeywordCategory, Lang, Lexicon, Post,
    SentimentLabel, Topic, TOPICS,
};

fn strings(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

/// Small, overlap-free vocabulary so expected counts are easy to reason about.
fn lex() -> Lexicon {
    Lexicon {
        categories: vec![KeywordCategory { name: "tools".into(), keywords: strings(&["gpt", "chatgpt", "copilot"]) }],
        positive: strings(&["great", "fine", "nice"]),
        negative: strings(&["awful", "bad"]),
        topics: vec![
            Topic { name: "ai_tools".into(), keywords: strings(&["gpt"]) },
            Topic { name: "jobs".into(), keywords: strings(&["job"]) },
        ],
        stopwords: strings(&["and", "the"]),
        common_phrases: Vec::new(),
    }
}

fn en_post(url: &str, title: &str, comments: &[&str]) -> Post {
    let mut p = make_post(url, title, 0);
    p.language = Some("en".into());
    for (i, c) in comments.iter().enumerate() {
        p.push_comment(Comment::new(*c, format!("u{i}")).unwrap());
    }
    p
}

#[test]
fn language_split_follows_cjk_share() {
    assert_eq!(classify_language("大模型会取代程序员吗"), Lang::Zh);
    assert_eq!(classify_language("Will AI replace programmers?"), Lang::En);
    // 3 of 7 word characters are CJK
    assert_eq!(classify_language("GPT-4 太强了"), Lang::Zh);
    // 1 of 11
    assert_eq!(classify_language("hello world 好"), Lang::En);
    assert_eq!(classify_language(""), Lang::En);
    assert_eq!(classify_language("!!! ???"), Lang::En);
}

#[test]
fn sentiment_without_lexicon_hits_is_neutral_zero() {
    let l = lex();
    for text in ["", "nothing to see", "great and awful", "great great great awful"] {
        let s = sentiment_score(text, &l);
        assert_eq!(s.score, 0.0, "{text}");
        assert_eq!(s.label, SentimentLabel::Neutral, "{text}");
    }
    let s = sentiment_score("", &l);
    assert_eq!((s.positive_hits, s.negative_hits), (0, 0));
}

#[test]
fn sentiment_thresholds_are_strict() {
    let l = lex();
    let s = sentiment_score("great fine nice awful bad", &l);
    assert_eq!(s.score, 0.2);
    assert_eq!(s.label, SentimentLabel::Neutral);

    let s = sentiment_score("great fine awful", &l);
    assert_eq!(s.score, 0.333);
    assert_eq!(s.label, SentimentLabel::Positive);

    let s = sentiment_score("AWFUL!", &l);
    assert_eq!(s.score, -1.0);
    assert_eq!(s.label, SentimentLabel::Negative);
}

#[test]
fn english_corpus_statistics() {
    let posts = vec![en_post(
        "https://www.reddit.com/r/a/1",
        "ChatGPT and GPT-4 and gpt",
        &["a job for everyone", "great fine awful"],
    )];
    let analyzer = Analyzer::new(Lexicon::empty(), lex()).with_top_words(2);
    let a = analyzer.analyze(&posts);
    assert_eq!(a.total_documents, 3);
    assert_eq!(a.language(Lang::Zh).unwrap().documents, 0);

    let en = a.language(Lang::En).unwrap();
    assert_eq!(en.documents, 3);

    let tools = &en.keyword_frequency[0];
    assert_eq!(tools.category, "tools");
    let kws: Vec<(&str, u64)> = tools.keywords.iter().map(|k| (k.keyword.as_str(), k.count)).collect();
    assert_eq!(kws, vec![("gpt", 3), ("chatgpt", 1)]);

    let words: Vec<(&str, u64)> = en.top_words.iter().map(|w| (w.word.as_str(), w.count)).collect();
    assert_eq!(words, vec![("gpt", 2), ("awful", 1)]);

    assert_eq!((en.sentiment.positive, en.sentiment.neutral, en.sentiment.negative), (1, 2, 0));
    assert_eq!(en.sentiment.average_score, 0.111);

    let topics: Vec<(&str, u64)> = en.topics.iter().map(|t| (t.topic.as_str(), t.documents)).collect();
    assert_eq!(topics, vec![("ai_tools", 1), ("jobs", 1)]);
}

#[test]
fn chinese_words_use_phrases_and_cjk_runs() {
    let zh = Lexicon {
        stopwords: strings(&["我们"]),
        common_phrases: strings(&["程序员"]),
        ..Lexicon::empty()
    };
    let posts = vec![make_post("https://www.zhihu.com/question/1", "我们 程序员", 0)];
    let a = Analyzer::new(zh, Lexicon::empty()).analyze(&posts);
    let l = a.language(Lang::Zh).unwrap();
    assert_eq!(l.documents, 1);
    let words: Vec<(&str, u64)> = l.top_words.iter().map(|w| (w.word.as_str(), w.count)).collect();
    assert_eq!(words, vec![("程序员", 2)]);
}

#[test]
fn post_language_hint_overrides_script() {
    let mut p = make_post("https://www.zhihu.com/question/1", "great stuff", 0);
    p.language = Some("zh-CN".into());
    p.push_comment(Comment::new("nice", "u").unwrap());
    let a = Analyzer::new(lex(), Lexicon::empty()).analyze(&[p]);
    let zh = a.language(Lang::Zh).unwrap();
    assert_eq!(zh.documents, 2);
    assert_eq!(zh.sentiment.positive, 2);
    assert_eq!(a.language(Lang::En).unwrap().documents, 0);
}

#[test]
fn empty_lexicons_give_empty_results() {
    let posts = vec![en_post("https://www.reddit.com/r/a/1", "GPT will take every job", &["awful"])];
    let a = Analyzer::new(Lexicon::empty(), Lexicon::empty()).analyze(&posts);
    let en = a.language(Lang::En).unwrap();
    assert!(en.keyword_frequency.is_empty());
    assert!(en.topics.is_empty());
    assert_eq!(en.sentiment.neutral, 2);
    assert_eq!(en.sentiment.average_score, 0.0);
}

#[test]
fn only_a_prefix_of_comments_is_analyzed_but_all_are_annotated() {
    let mut posts = vec![en_post("https://www.reddit.com/r/a/1", "t", &["great", "bad", "fine", "nice", "awful"])];
    let analyzer = Analyzer::new(Lexicon::empty(), lex()).with_max_comments_per_post(2);

    let docs = collect_documents(&posts, 2);
    assert_eq!(docs.len(), 3);
    assert_eq!(docs[0].source, DocSource::Post { post: 0 });
    assert_eq!(docs[2].source, DocSource::Comment { post: 0, comment: 1 });
    assert_eq!(analyzer.analyze(&posts).total_documents, 3);

    analyzer.annotate_sentiment(&mut posts);
    let scores: Vec<Option<f64>> = posts[0].comments.iter().map(|c| c.sentiment_score).collect();
    assert_eq!(scores, vec![Some(1.0), Some(-1.0), Some(1.0), Some(1.0), Some(-1.0)]);
}

#[test]
fn time_trend_groups_post_documents_by_year() {
    let mk = |i: usize, date: Option<&str>| {
        let mut p = en_post(&format!("https://www.reddit.com/r/a/{i}"), "great", &[]);
        p.created_at = date.map(String::from);
        p
    };
    let mut posts = vec![
        mk(1, Some("2023-05-01")),
        mk(2, Some("2024-01-01")),
        mk(3, Some("2024-02-02")),
        mk(4, Some("last week")),
        mk(5, None),
    ];
    let mut c = Comment::new("awful", "u").unwrap();
    c.created_at = Some("2022-03-03".into());
    posts[0].push_comment(c);

    let a = Analyzer::new(Lexicon::empty(), lex()).analyze(&posts);
    let trend: Vec<(i32, u64, f64)> = a.time_trend.iter().map(|y| (y.year, y.posts, y.avg_sentiment)).collect();
    assert_eq!(trend, vec![(2023, 1, 1.0), (2024, 2, 1.0)]);
}

#[test]
fn default_lexicons_cover_both_languages() {
    for lang in Lang::ALL {
        let l = Lexicon::default_for(lang);
        let names: Vec<&str> = l.topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, TOPICS.to_vec());
        assert!(!l.positive.is_empty() && !l.negative.is_empty());
    }

    let posts = vec![make_post("https://www.zhihu.com/question/1", "大模型会取代程序员吗", 0)];
    let a = Analyzer::default().analyze(&posts);
    let zh = a.language(Lang::Zh).unwrap();
    assert_eq!(zh.documents, 1);
    assert_eq!(zh.sentiment.negative, 1);
    let replacement = zh.topics.iter().find(|t| t.topic == "job_replacement").unwrap();
    assert_eq!(replacement.documents, 1);
}

#[test]
fn analysis_is_repeatable() {
    let posts: Vec<Post> = (0..40)
        .map(|i| {
            en_post(
                &format!("https://www.reddit.com/r/a/{i}"),
                if i % 2 == 0 { "great GPT tools" } else { "awful job market" },
                &["fine", "bad job", "chatgpt and copilot"],
            )
        })
        .collect();
    let analyzer = Analyzer::new(Lexicon::empty(), lex());
    assert_eq!(analyzer.analyze(&posts), analyzer.analyze(&posts));
}
