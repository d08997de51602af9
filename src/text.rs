//! Free-text cleanup applied to every text field before validation.

use regex::Regex;
use std::sync::OnceLock;

/// Caller options for [`clean_text_with`].
#[derive(Clone, Copy, Debug)]
pub struct TextCleaning {
    /// Keep line structure: runs of line breaks collapse to one `\n`.
    pub keep_newlines: bool,
    /// Drop `<...>` markup left over from HTML scraping.
    pub strip_html: bool,
}

impl Default for TextCleaning {
    fn default() -> Self {
        Self { keep_newlines: false, strip_html: true }
    }
}

fn html_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("static regex"))
}

/// Strip markup and control characters, collapse whitespace, trim.
pub fn clean_text(s: &str) -> String {
    clean_text_with(s, TextCleaning::default())
}

pub fn clean_text_with(s: &str, opts: TextCleaning) -> String {
    if s.is_empty() {
        return String::new();
    }
    let stripped = if opts.strip_html { html_tag_re().replace_all(s, "") } else { s.into() };

    let mut out = String::with_capacity(stripped.len());
    // pending separator: None, Some(' ') or Some('\n')
    let mut pending: Option<char> = None;
    for c in stripped.chars() {
        if c == '\n' || c == '\r' {
            pending = Some(if opts.keep_newlines { '\n' } else { pending.unwrap_or(' ') });
            continue;
        }
        if c.is_whitespace() {
            if pending.is_none() {
                pending = Some(' ');
            }
            continue;
        }
        if c.is_control() {
            continue;
        }
        if let Some(sep) = pending.take() {
            if !out.is_empty() {
                out.push(sep);
            }
        }
        out.push(c);
    }
    out
}

/// First `max_chars` characters (not bytes), with `suffix` appended when cut.
pub fn truncate_chars(s: &str, max_chars: usize, suffix: &str) -> String {
    match s.char_indices().nth(max_chars) {
        Some((at, _)) => format!("{}{suffix}", &s[..at]),
        None => s.to_string(),
    }
}
