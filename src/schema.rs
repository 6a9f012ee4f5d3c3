use chrono::{DateTime, Utc};

use crate::config::Config;

/// Timestamp format of the `@@@` post records.
pub const POST_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Rendering of a centroid timestamp on line 1 of an event file.
pub const CENTROID_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const FIELD_DELIMITER: &str = "@@@";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub question: String,
    pub answer: String,
    pub tags: Vec<String>,
}

impl Post {
    /// Title, question and answer joined by spaces; the text the topic model sees.
    pub fn document(&self) -> String {
        [self.title.as_str(), self.question.as_str(), self.answer.as_str()].join(" ")
    }

    /// Ground-truth tag: the first homework tag verbatim, else the canonical exam tag.
    pub fn label(&self, markers: &TagMarkers) -> Option<String> {
        if let Some(tag) = self.tags.iter().find(|t| t.contains(&markers.homework)) {
            return Some(tag.clone());
        }
        self.tags
            .iter()
            .any(|t| t.contains(&markers.exam))
            .then(|| markers.exam.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMarkers {
    pub homework: String,
    pub exam: String,
}

impl Default for TagMarkers {
    fn default() -> Self {
        Self {
            homework: "hw".into(),
            exam: "exam".into(),
        }
    }
}

impl From<&Config> for TagMarkers {
    fn from(cfg: &Config) -> Self {
        Self {
            homework: cfg.homework_marker.clone(),
            exam: cfg.exam_marker.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventCluster {
    pub id: usize,
    /// Whole seconds; the event file keeps no finer resolution.
    pub centroid: DateTime<Utc>,
    /// Input order, not time-sorted.
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventLabel {
    Exam,
    /// 1-based, in chronological order among non-exam events.
    Assignment(usize),
}

impl EventLabel {
    pub fn is_exam(&self) -> bool {
        matches!(self, EventLabel::Exam)
    }

    pub fn tag(&self, markers: &TagMarkers) -> String {
        match self {
            EventLabel::Exam => markers.exam.clone(),
            EventLabel::Assignment(n) => format!("{}{}", markers.homework, n),
        }
    }
}
