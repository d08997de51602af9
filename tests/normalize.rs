#[path = "common/mod.rs"]
mod common;

use common::*;
use serde_json::json;
use threadetl::{
    clean_text, clean_text_with, coerce_bool, coerce_int, coerce_opt_bool, normalize_date, Coerced, DateParser, DateStrategy,
    truncate_chars, NormalizedDate, TextCleaning,
};
use time::macros::{date, datetime};
use time::OffsetDateTime;

fn norm(s: &str) -> String {
    normalize_date(s, reference()).into_string()
}

#[test]
fn relative_date_resolves_against_reference() {
    assert_eq!(norm("3 days ago"), "2025-01-07");
    assert_eq!(norm("3天前"), "2025-01-07");
    assert_eq!(norm("2 weeks ago"), "2024-12-27");
    assert_eq!(norm("1 month ago"), "2024-12-11");
    assert_eq!(norm("1 year ago"), "2024-01-11");
    assert_eq!(norm("5 hours ago"), "2025-01-09");
    assert_eq!(norm("just now"), "2025-01-10");
    assert_eq!(norm("刚刚"), "2025-01-10");
    assert_eq!(norm("yesterday"), "2025-01-09");
    assert_eq!(norm("昨天"), "2025-01-09");
}

#[test]
fn absolute_layouts_are_recognised() {
    assert_eq!(norm("2024-03-05T10:20:30Z"), "2024-03-05");
    assert_eq!(norm("2024-03-05T10:20:30.123Z"), "2024-03-05");
    assert_eq!(norm("2024-03-05T23:20:30+08:00"), "2024-03-05");
    assert_eq!(norm("2024-03-05T10:20:30"), "2024-03-05");
    assert_eq!(norm("2024-03-05 10:20:30"), "2024-03-05");
    assert_eq!(norm("2024-03-05 10:20"), "2024-03-05");
    assert_eq!(norm(" 2024-03-05 "), "2024-03-05");
    assert_eq!(norm("2024/03/05"), "2024-03-05");
    assert_eq!(norm("2024年03月05日"), "2024-03-05");
    assert_eq!(norm("2024年3月5日"), "2024-03-05");
    assert_eq!(norm("2024年5月1日"), "2024-05-01");
    assert_eq!(norm("发布于 2024年5月1日 12:30"), "2024-05-01");
    assert_eq!(norm("posted on 2024.3.5 by someone"), "2024-03-05");
}

#[test]
fn unparseable_dates_come_back_untouched() {
    assert_eq!(normalize_date("last spring", reference()), NormalizedDate::Unparsed("last spring".to_string()));
    // shaped like a date, but not a real calendar day
    assert!(!normalize_date("2024-02-30", reference()).is_canonical());
    assert_eq!(normalize_date("", reference()), NormalizedDate::Unparsed(String::new()));
}

#[test]
fn strategy_chain_is_configurable() {
    let only_loose = DateParser::with_strategies(vec![DateStrategy::LooseYmd]);
    assert_eq!(only_loose.strategies().len(), 1);
    assert!(!only_loose.parse("3 days ago", reference()).is_canonical());
    assert_eq!(only_loose.parse("x 2023-7-9 y", reference()).date(), Some(date!(2023 - 07 - 09)));
}

/// Without an injected reference the pipeline uses the wall clock, so relative
/// dates in the same raw file move with the day the run happens.
#[test]
fn relative_dates_depend_on_the_reference_time() {
    let now = OffsetDateTime::now_utc();
    let today = normalize_date("1 day ago", now);
    assert_eq!(today.date(), now.date().previous_day());

    let earlier = normalize_date("1 day ago", datetime!(2020-06-01 12:00 UTC));
    assert_eq!(earlier.date(), Some(date!(2020 - 05 - 31)));
    assert_ne!(today, earlier);
}

#[test]
fn clean_text_strips_markup_controls_and_whitespace() {
    assert_eq!(clean_text("<p>Hello</p>\n\n  world\t!"), "Hello world !");
    assert_eq!(clean_text("a\u{0007}b\u{007f}c"), "abc");
    assert_eq!(clean_text("   "), "");
    assert_eq!(clean_text("<br/><br/>"), "");

    let keep = TextCleaning { keep_newlines: true, strip_html: true };
    assert_eq!(clean_text_with("a\n\n\nb  c", keep), "a\nb c");
    assert_eq!(clean_text_with("a \r\n b", keep), "a\nb");

    let raw_markup = TextCleaning { keep_newlines: false, strip_html: false };
    assert_eq!(clean_text_with("<b>x</b>", raw_markup), "<b>x</b>");
}

#[test]
fn coerce_int_parses_loose_numbers() {
    assert_eq!(coerce_int(&json!(12), 0), Coerced::parsed(12));
    assert_eq!(coerce_int(&json!(12.9), 0), Coerced::parsed(12));
    assert_eq!(coerce_int(&json!("1,234"), 0), Coerced::parsed(1234));
    assert_eq!(coerce_int(&json!("1_000"), 0), Coerced::parsed(1000));
    assert_eq!(coerce_int(&json!(" 2.5w "), 0), Coerced::parsed(25_000));
    assert_eq!(coerce_int(&json!("1.2万"), 0), Coerced::parsed(12_000));
    assert_eq!(coerce_int(&json!("12千"), 0), Coerced::parsed(12_000));
    assert_eq!(coerce_int(&json!("1.5k"), 0), Coerced::parsed(1_500));
    assert_eq!(coerce_int(&json!("3M"), 0), Coerced::parsed(3_000_000));
    assert_eq!(coerce_int(&json!("about 42 likes"), 0), Coerced::parsed(42));
}

#[test]
fn coerce_int_defaults_and_says_so() {
    for v in [json!(null), json!(true), json!([1]), json!({"n": 1}), json!(-3), json!(-0.5), json!("-5"), json!(""), json!("abc")] {
        let c = coerce_int(&v, 7);
        assert_eq!(c, Coerced::fallback(7), "value {v}");
    }
}

#[test]
fn coercion_never_panics() {
    let values = vec![
        json!(u64::MAX),
        json!(i64::MIN),
        json!(f64::MAX),
        json!(f64::MIN_POSITIVE),
        json!("99999999999999999999999999"),
        json!("1e400"),
        json!("9999999999999999999999w"),
        json!("万"),
        json!("k"),
        json!(".5k"),
        json!("１２３"),
        json!("\u{0}"),
        json!([null, {}, []]),
    ];
    for v in &values {
        let _ = coerce_int(v, 0);
        let _ = coerce_bool(v, false);
        let _ = coerce_opt_bool(v);
    }
}

#[test]
fn booleans_are_tri_state() {
    assert_eq!(coerce_opt_bool(&json!("yes")), Some(true));
    assert_eq!(coerce_opt_bool(&json!(" FALSE ")), Some(false));
    assert_eq!(coerce_opt_bool(&json!("0")), Some(false));
    assert_eq!(coerce_opt_bool(&json!(2)), Some(true));
    assert_eq!(coerce_opt_bool(&json!("maybe")), None);
    assert_eq!(coerce_bool(&json!(null), true), Coerced::fallback(true));
}

#[test]
fn truncation_counts_characters_not_bytes() {
    assert_eq!(truncate_chars("程序员会被取代吗", 3, "..."), "程序员...");
    assert_eq!(truncate_chars("short", 5, "..."), "short");
    assert_eq!(truncate_chars("exactly", 0, ""), "");
    assert_eq!(truncate_chars("", 3, "..."), "");
}
