// Post store
// Parses the flat `@@@`-delimited post dump into structured posts

use std::fs;
use std::path::Path;

use chrono::{NaiveDateTime, TimeZone, Utc};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::metrics::{POSTS_PARSED, RECORDS_SKIPPED};
use crate::schema::{Post, FIELD_DELIMITER, POST_TIMESTAMP_FORMAT};

/// Fields before the tag list: title, question, answer, timestamp.
const REQUIRED_FIELDS: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct ParsedPosts {
    /// Standalone date line that opens every dump; unrelated to any post.
    pub header_date: Option<String>,
    pub posts: Vec<Post>,
    pub skipped: usize,
}

pub struct PostStore;

impl PostStore {
    pub fn read_file(path: &Path) -> Result<ParsedPosts> {
        let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let parsed = Self::parse(raw.lines());
        info!(
            path = %path.display(),
            posts = parsed.posts.len(),
            skipped = parsed.skipped,
            "Parsed post dump"
        );
        Ok(parsed)
    }

    /// Never aborts on a bad line: malformed records are logged and counted.
    pub fn parse<'a, I>(lines: I) -> ParsedPosts
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut lines = lines.into_iter();
        let mut parsed = ParsedPosts {
            header_date: lines.next().map(|l| l.trim().to_string()),
            ..Default::default()
        };

        // Line numbers are 1-based and count the header.
        for (idx, line) in lines.enumerate() {
            match parse_record(line, idx + 2) {
                Ok(post) => {
                    POSTS_PARSED.inc();
                    parsed.posts.push(post);
                }
                Err(err) => {
                    RECORDS_SKIPPED.inc();
                    warn!(error = %err, "Skipping record");
                    parsed.skipped += 1;
                }
            }
        }
        parsed
    }
}

/// Parses one `title@@@question@@@answer@@@timestamp@@@tags` record.
pub fn parse_record(line: &str, line_no: usize) -> Result<Post> {
    let line = line.trim_end_matches(['\r', '\n']);
    let parts: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    if parts.len() < REQUIRED_FIELDS {
        return Err(Error::MalformedRecord {
            line: line_no,
            reason: format!("expected at least {REQUIRED_FIELDS} fields, found {}", parts.len()),
        });
    }

    let raw_ts = parts[3].trim();
    let naive = NaiveDateTime::parse_from_str(raw_ts, POST_TIMESTAMP_FORMAT).map_err(|e| {
        Error::MalformedRecord {
            line: line_no,
            reason: format!("bad timestamp {raw_ts:?}: {e}"),
        }
    })?;

    // The tag list is always the trailing field.
    let tags = match parts.last() {
        Some(t) if parts.len() > REQUIRED_FIELDS => {
            t.split_whitespace().map(str::to_string).collect()
        }
        _ => Vec::new(),
    };

    Ok(Post {
        timestamp: Utc.from_utc_datetime(&naive),
        title: parts[0].to_string(),
        question: parts[1].to_string(),
        answer: parts[2].to_string(),
        tags,
    })
}

/// Renders a post back into its one-line record form.
pub fn format_record(post: &Post) -> String {
    [
        one_line(&post.title),
        one_line(&post.question),
        one_line(&post.answer),
        post.timestamp.format(POST_TIMESTAMP_FORMAT).to_string(),
        post.tags.join(" "),
    ]
    .join(FIELD_DELIMITER)
}

fn one_line(field: &str) -> String {
    field.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const DUMP: &str = "2017-12-20\n\
        Loss function@@@Why is it convex?@@@See lecture 4@@@2017-09-14T10:00:00Z@@@hw1 student\n\
        broken line without fields\n\
        Midterm room@@@Where is it?@@@DMP 110@@@2017-10-20T08:30:00Z@@@midterm_exam\n\
        Bad time@@@q@@@a@@@yesterday@@@hw2\n\
        Logistics@@@Office hours?@@@Fridays@@@2017-09-15T16:45:10Z";

    #[test]
    fn header_is_returned_separately() {
        let parsed = PostStore::parse(DUMP.lines());
        assert_eq!(parsed.header_date.as_deref(), Some("2017-12-20"));
    }

    #[test]
    fn parsed_plus_skipped_equals_lines_minus_header() {
        let parsed = PostStore::parse(DUMP.lines());
        assert_eq!(parsed.posts.len(), 3);
        assert_eq!(parsed.skipped, 2);
        assert_eq!(parsed.posts.len() + parsed.skipped, DUMP.lines().count() - 1);
    }

    #[test]
    fn fields_and_tags_are_split() {
        let parsed = PostStore::parse(DUMP.lines());
        let first = &parsed.posts[0];
        assert_eq!(first.title, "Loss function");
        assert_eq!(first.answer, "See lecture 4");
        assert_eq!(first.tags, vec!["hw1".to_string(), "student".to_string()]);
        assert_eq!(
            first.timestamp,
            Utc.with_ymd_and_hms(2017, 9, 14, 10, 0, 0).unwrap()
        );
        // Four fields are enough; the tag list is then empty.
        assert!(parsed.posts[2].tags.is_empty());
    }

    #[test]
    fn tags_come_from_the_trailing_field() {
        let line = "t@@@q@@@a@@@2017-09-14T10:00:00Z@@@stray text@@@hw2 exam";
        let post = parse_record(line, 3).unwrap();
        assert_eq!(post.tags, vec!["hw2".to_string(), "exam".to_string()]);
    }

    #[test]
    fn bad_timestamp_is_malformed() {
        let err = parse_record("t@@@q@@@a@@@not-a-date@@@hw1", 9).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { line: 9, .. }));
    }

    #[test]
    fn empty_input_has_no_header() {
        let parsed = PostStore::parse(std::iter::empty());
        assert!(parsed.header_date.is_none());
        assert!(parsed.posts.is_empty());
    }

    #[test]
    fn formatted_record_parses_back() {
        let post = parse_record("A\nB@@@q@@@a@@@2017-09-14T10:00:00Z@@@hw1 exam", 2).unwrap();
        let line = format_record(&post);
        assert!(!line.contains('\n'));
        let back = parse_record(&line, 2).unwrap();
        assert_eq!(back.title, "A B");
        assert_eq!(back.tags, post.tags);
        assert_eq!(back.timestamp, post.timestamp);
    }
}
