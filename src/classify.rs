// Event classification
// Two global rankings: lowest confidence events become exams, the rest are
// numbered as assignments in chronological order.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::schema::EventLabel;

/// Labels events by position. Ties on confidence or centroid fall back to the lower index.
pub fn classify(
    confidences: &[f64],
    centroids: &[DateTime<Utc>],
    expected_exams: usize,
) -> Result<Vec<EventLabel>> {
    if confidences.len() != centroids.len() {
        return Err(Error::InvalidArgument(format!(
            "{} confidences for {} centroids",
            confidences.len(),
            centroids.len()
        )));
    }
    let n = confidences.len();
    if expected_exams > n {
        warn!(expected_exams, events = n, "More exams expected than events found");
    }

    let mut by_confidence: Vec<usize> = (0..n).collect();
    by_confidence.sort_by(|&a, &b| confidences[a].total_cmp(&confidences[b]).then(a.cmp(&b)));

    let mut labels: Vec<Option<EventLabel>> = vec![None; n];
    for &idx in by_confidence.iter().take(expected_exams) {
        labels[idx] = Some(EventLabel::Exam);
    }

    let mut remaining: Vec<usize> = (0..n).filter(|&i| labels[i].is_none()).collect();
    remaining.sort_by(|&a, &b| centroids[a].cmp(&centroids[b]).then(a.cmp(&b)));
    for (rank, &idx) in remaining.iter().enumerate() {
        labels[idx] = Some(EventLabel::Assignment(rank + 1));
    }

    let labels: Vec<EventLabel> = labels.into_iter().flatten().collect();
    info!(
        events = n,
        exams = labels.iter().filter(|l| l.is_exam()).count(),
        "Classified events"
    );
    Ok(labels)
}
