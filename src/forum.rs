// Forum dump flattening
// Turns already-fetched forum post objects into `@@@` post records

use scraper::Html;
use serde::Deserialize;
use tracing::{debug, info};

use crate::schema::FIELD_DELIMITER;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRevision {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawChild {
    #[serde(default)]
    pub history: Vec<RawRevision>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPost {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Oldest revision first.
    #[serde(default)]
    pub history: Vec<RawRevision>,
    #[serde(default)]
    pub children: Vec<RawChild>,
}

impl RawPost {
    pub fn is_question(&self) -> bool {
        self.kind.as_deref().map(html_to_text).as_deref() == Some("question")
    }

    /// One record line, or `None` for anything that is not a question.
    pub fn to_record(&self) -> Option<String> {
        if !self.is_question() {
            return None;
        }
        let first = self.history.first();
        let title = first.and_then(|r| r.subject.as_deref()).map(html_to_text).unwrap_or_default();
        let question = first.and_then(|r| r.content.as_deref()).map(html_to_text).unwrap_or_default();
        let answer = self
            .children
            .first()
            .and_then(|c| c.history.first())
            .and_then(|r| r.content.as_deref())
            .map(html_to_text)
            .unwrap_or_default();

        Some(
            [
                title,
                question,
                answer,
                html_to_text(&self.created),
                self.tags.join(" "),
            ]
            .join(FIELD_DELIMITER),
        )
    }
}

/// Text nodes of an HTML fragment, trimmed and joined by single spaces.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment
        .root_element()
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    // Records are one line each and `@@@`-delimited.
    text.replace(['\r', '\n'], " ").replace(FIELD_DELIMITER, " ")
}

/// Header date line followed by one record per question post.
pub fn flatten(posts: &[RawPost], header_date: &str) -> Vec<String> {
    let mut lines = vec![header_date.to_string()];
    for post in posts {
        match post.to_record() {
            Some(line) => lines.push(line),
            None => debug!(kind = ?post.kind, "Skipping non-question post"),
        }
    }
    info!(posts = posts.len(), records = lines.len() - 1, "Flattened forum dump");
    lines
}
