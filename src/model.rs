//! Canonical record model: Post, Comment and their metadata.
//!
//! Construction through `Post::new` / `Comment::new` enforces the allow-lists and the
//! non-empty text rules. Raw, untrusted input goes through `crate::ingest` first,
//! which coerces loose values before reaching these constructors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Record-level validation failure. Always names the offending field.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: unsupported value {value:?} (allowed: {allowed})")]
    NotAllowed {
        field: &'static str,
        value: String,
        allowed: &'static str,
    },
    #[error("{field}: empty after cleaning")]
    Empty { field: &'static str },
    #[error("record is not a JSON object")]
    NotAnObject,
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::NotAllowed { field, .. } => field,
            ValidationError::Empty { field } => field,
            ValidationError::NotAnObject => "record",
        }
    }

    /// Stable tally key used in the cleaning statistics.
    pub fn reason(&self) -> String {
        match self {
            ValidationError::NotAllowed { field, .. } => format!("bad_{field}"),
            ValidationError::Empty { field: "url" } => "missing_url".to_string(),
            ValidationError::Empty { field } => format!("empty_{field}"),
            ValidationError::NotAnObject => "not_an_object".to_string(),
        }
    }
}

/// Source platform allow-list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Zhihu,
    V2ex,
    Xiaohongshu,
    Bilibili,
    Reddit,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Zhihu,
        Platform::V2ex,
        Platform::Xiaohongshu,
        Platform::Bilibili,
        Platform::Reddit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Zhihu => "zhihu",
            Platform::V2ex => "v2ex",
            Platform::Xiaohongshu => "xiaohongshu",
            Platform::Bilibili => "bilibili",
            Platform::Reddit => "reddit",
        }
    }

    /// Post type assumed when a raw record does not carry one.
    pub fn default_post_type(self) -> PostType {
        match self {
            Platform::Zhihu => PostType::Question,
            Platform::V2ex | Platform::Reddit => PostType::Topic,
            Platform::Xiaohongshu => PostType::Article,
            Platform::Bilibili => PostType::Video,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let low = s.trim().to_lowercase();
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == low)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "platform",
                value: s.to_string(),
                allowed: "zhihu, v2ex, xiaohongshu, bilibili, reddit",
            })
    }
}

/// Kind of thread on its platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Question,
    Article,
    Topic,
    Video,
}

impl PostType {
    pub fn as_str(self) -> &'static str {
        match self {
            PostType::Question => "question",
            PostType::Article => "article",
            PostType::Topic => "topic",
            PostType::Video => "video",
        }
    }
}

impl FromStr for PostType {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "question" => Ok(PostType::Question),
            "article" => Ok(PostType::Article),
            "topic" => Ok(PostType::Topic),
            "video" => Ok(PostType::Video),
            _ => Err(ValidationError::NotAllowed {
                field: "post_type",
                value: s.to_string(),
                allowed: "question, article, topic, video",
            }),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostMetadata {
    pub view_count: u64,
    pub follow_count: u64,
    pub upvote_count: u64,
    pub comment_count: u64,
}

/// A reply or answer attached to a post.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub content: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_url: Option<String>,
    #[serde(default)]
    pub upvotes: u64,
    #[serde(default)]
    pub downvotes: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub created_at_text: Option<String>,
    #[serde(default)]
    pub is_author_reply: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// Filled by the analyzer only.
    #[serde(default)]
    pub sentiment_score: Option<f64>,
}

impl Comment {
    pub fn new(content: impl Into<String>, author: impl Into<String>) -> Result<Self, ValidationError> {
        let content = content.into().trim().to_string();
        if content.is_empty() {
            return Err(ValidationError::Empty { field: "content" });
        }
        let author = author.into().trim().to_string();
        if author.is_empty() {
            return Err(ValidationError::Empty { field: "author" });
        }
        Ok(Self {
            content,
            author,
            author_url: None,
            comment_url: None,
            upvotes: 0,
            downvotes: 0,
            created_at: None,
            created_at_text: None,
            is_author_reply: false,
            reply_to: None,
            sentiment_score: None,
        })
    }

    /// Upvotes minus downvotes, saturating at the `i64` bounds.
    pub fn net_votes(&self) -> i64 {
        let net = i128::from(self.upvotes) - i128::from(self.downvotes);
        net.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    /// Strictly more than `upvotes` votes and strictly longer than `chars` characters.
    pub fn is_high_quality(&self, upvotes: u64, chars: usize) -> bool {
        self.upvotes > upvotes && self.content.chars().count() > chars
    }
}

/// A discussion thread, question or article.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub platform: Platform,
    pub post_type: PostType,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub author_url: Option<String>,
    /// Canonical `YYYY-MM-DD` when parseable, otherwise the raw text.
    #[serde(default)]
    pub created_at: Option<String>,
    pub scraped_at: String,
    #[serde(default)]
    pub metadata: PostMetadata,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub is_relevant: Option<bool>,
    #[serde(default)]
    pub relevance_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Post {
    pub fn new(
        platform: &str,
        post_type: Option<&str>,
        url: impl Into<String>,
        title: impl Into<String>,
        scraped_at: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let url = url.into().trim().to_string();
        if url.is_empty() {
            return Err(ValidationError::Empty { field: "url" });
        }
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::Empty { field: "title" });
        }
        let platform: Platform = platform.parse()?;
        let post_type = match post_type {
            Some(pt) => pt.parse()?,
            None => platform.default_post_type(),
        };
        Ok(Self {
            platform,
            post_type,
            url,
            title,
            content: None,
            author: None,
            author_url: None,
            created_at: None,
            scraped_at: scraped_at.into(),
            metadata: PostMetadata::default(),
            comments: Vec::new(),
            is_relevant: None,
            relevance_note: None,
            language: None,
        })
    }

    /// Sets `metadata.comment_count` from the actual comment list.
    pub fn recompute_comment_count(&mut self) {
        self.metadata.comment_count = self.comments.len() as u64;
    }

    pub fn push_comment(&mut self, c: Comment) {
        self.comments.push(c);
        self.recompute_comment_count();
    }

    /// Unknown relevance counts as eligible; only an explicit `false` excludes.
    pub fn meets_analysis_threshold(&self, min_comments: u64) -> bool {
        self.metadata.comment_count >= min_comments && self.is_relevant != Some(false)
    }

    /// `title + " " + content`, the text all keyword matching runs against.
    pub fn full_text(&self) -> String {
        match self.content.as_deref() {
            Some(c) if !c.is_empty() => format!("{} {}", self.title, c),
            _ => self.title.clone(),
        }
    }

    pub fn has_author(&self) -> bool {
        self.author.as_deref().map(|a| !a.trim().is_empty()).unwrap_or(false)
    }

    pub fn has_created_at(&self) -> bool {
        self.created_at.as_deref().map(|d| !d.trim().is_empty()).unwrap_or(false)
    }
}
