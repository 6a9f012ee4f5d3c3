// Evaluation
// Per-event accuracy, post-count weighted accuracy and V-measure over all labels

use std::collections::{BTreeMap, HashMap};

use crate::schema::{EventCluster, EventLabel, TagMarkers};

/// Ground-truth and predicted tags of one event. Unlabeled posts are left out of both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLabels {
    pub event: usize,
    pub truth: Vec<String>,
    pub predicted: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LabelSet {
    pub events: Vec<EventLabels>,
}

impl LabelSet {
    /// `labels[i]` is the prediction for `events[i]`, repeated for each labeled post.
    pub fn build(events: &[EventCluster], labels: &[EventLabel], markers: &TagMarkers) -> Self {
        let events = events
            .iter()
            .zip(labels)
            .map(|(event, label)| {
                let truth: Vec<String> =
                    event.posts.iter().filter_map(|p| p.label(markers)).collect();
                EventLabels {
                    event: event.id,
                    predicted: vec![label.tag(markers); truth.len()],
                    truth,
                }
            })
            .collect();
        Self { events }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventScore {
    pub event: usize,
    pub labeled_posts: usize,
    pub accuracy: f64,
    pub most_common_truth: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub events: Vec<EventScore>,
    pub weighted_accuracy: f64,
    pub v_measure: f64,
}

pub fn evaluate(labels: &LabelSet) -> Evaluation {
    let events: Vec<EventScore> = labels
        .events
        .iter()
        .map(|e| EventScore {
            event: e.event,
            labeled_posts: e.truth.len(),
            accuracy: accuracy(&e.truth, &e.predicted),
            most_common_truth: most_common(&e.truth),
        })
        .collect();

    let all_truth: Vec<&str> =
        labels.events.iter().flat_map(|e| &e.truth).map(String::as_str).collect();
    let all_pred: Vec<&str> =
        labels.events.iter().flat_map(|e| &e.predicted).map(String::as_str).collect();

    let scores: Vec<(usize, f64)> = events.iter().map(|e| (e.labeled_posts, e.accuracy)).collect();
    Evaluation {
        weighted_accuracy: weighted_accuracy(&scores),
        v_measure: v_measure(&all_truth, &all_pred),
        events,
    }
}

/// Accuracy averaged over `(labeled post count, accuracy)` pairs, weighted by count.
pub fn weighted_accuracy(scores: &[(usize, f64)]) -> f64 {
    let total: usize = scores.iter().map(|(n, _)| n).sum();
    if total == 0 {
        return 0.0;
    }
    // Divide once so that all-correct events give exactly 1.0.
    let hits: f64 = scores.iter().map(|&(n, acc)| n as f64 * acc).sum();
    hits / total as f64
}

/// Fraction of positions where the labels agree; 0.0 for an empty event.
pub fn accuracy<T: PartialEq>(truth: &[T], predicted: &[T]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let hits = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    hits as f64 / truth.len() as f64
}

/// Ties go to the lexicographically smallest label.
pub fn most_common(labels: &[String]) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for l in labels {
        *counts.entry(l.as_str()).or_insert(0) += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for (label, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((label, count));
        }
    }
    best.map(|(l, _)| l.to_string())
}

/// Harmonic mean of homogeneity and completeness (beta = 1).
pub fn v_measure(truth: &[&str], predicted: &[&str]) -> f64 {
    let n = truth.len().min(predicted.len());
    if n == 0 {
        return 1.0;
    }

    let mut contingency: HashMap<(&str, &str), usize> = HashMap::new();
    let mut class_sizes: HashMap<&str, usize> = HashMap::new();
    let mut cluster_sizes: HashMap<&str, usize> = HashMap::new();
    for (&c, &k) in truth.iter().zip(predicted) {
        *contingency.entry((c, k)).or_insert(0) += 1;
        *class_sizes.entry(c).or_insert(0) += 1;
        *cluster_sizes.entry(k).or_insert(0) += 1;
    }

    let n = n as f64;
    let entropy = |sizes: &HashMap<&str, usize>| -> f64 {
        sizes
            .values()
            .map(|&s| {
                let p = s as f64 / n;
                -p * p.ln()
            })
            .sum()
    };
    let h_class = entropy(&class_sizes);
    let h_cluster = entropy(&cluster_sizes);

    let mut h_class_given_cluster = 0.0;
    let mut h_cluster_given_class = 0.0;
    for (&(c, k), &count) in &contingency {
        let joint = count as f64 / n;
        h_class_given_cluster -= joint * (count as f64 / cluster_sizes[k] as f64).ln();
        h_cluster_given_class -= joint * (count as f64 / class_sizes[c] as f64).ln();
    }

    let homogeneity = if h_class == 0.0 {
        1.0
    } else {
        1.0 - h_class_given_cluster / h_class
    };
    let completeness = if h_cluster == 0.0 {
        1.0
    } else {
        1.0 - h_cluster_given_class / h_cluster
    };

    if homogeneity + completeness == 0.0 {
        0.0
    } else {
        2.0 * homogeneity * completeness / (homogeneity + completeness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(counts: &[(&str, usize)]) -> Vec<String> {
        counts.iter()
            .flat_map(|(t, n)| std::iter::repeat(t.to_string()).take(*n))
            .collect()
    }

    /// Event ids follow position.
    fn label_set(events: Vec<(Vec<String>, Vec<String>)>) -> LabelSet {
        LabelSet {
            events: events
                .into_iter()
                .enumerate()
                .map(|(event, (truth, predicted))| EventLabels { event, truth, predicted })
                .collect(),
        }
    }

    #[test]
    fn weighted_accuracy_of_three_events() {
        // Post counts [10, 5, 5] with accuracies [1.0, 0.5, 0.0].
        let w = weighted_accuracy(&[(10, 1.0), (5, 0.5), (5, 0.0)]);
        assert!((w - 0.625).abs() < 1e-12);
    }

    #[test]
    fn weighted_accuracy_uses_post_counts() {
        let labels = label_set(vec![
            (tags(&[("hw1", 10)]), tags(&[("hw1", 10)])),
            (tags(&[("hw2", 2), ("hw3", 2)]), tags(&[("hw2", 4)])),
            (tags(&[("exam", 6)]), tags(&[("hw3", 6)])),
        ]);
        let eval = evaluate(&labels);
        let accs: Vec<f64> = eval.events.iter().map(|e| e.accuracy).collect();
        assert_eq!(accs, vec![1.0, 0.5, 0.0]);
        // (10 * 1.0 + 4 * 0.5 + 6 * 0.0) / 20
        assert!((eval.weighted_accuracy - 0.6).abs() < 1e-12);
        assert_eq!(eval.events[2].most_common_truth.as_deref(), Some("exam"));
    }

    #[test]
    fn perfect_prediction_scores_one() {
        let truth = vec![tags(&[("hw1", 4)]), tags(&[("exam", 3)]), tags(&[("hw2", 2)])];
        let labels = label_set(truth.into_iter().map(|t| (t.clone(), t)).collect());
        let eval = evaluate(&labels);
        assert!((eval.weighted_accuracy - 1.0).abs() < 1e-12);
        assert!((eval.v_measure - 1.0).abs() < 1e-12);
    }

    #[test]
    fn many_small_correct_events_score_exactly_one() {
        let labels = label_set(
            (1..=10)
                .map(|i| {
                    let tag = vec![format!("hw{i}")];
                    (tag.clone(), tag)
                })
                .collect(),
        );
        let eval = evaluate(&labels);
        assert_eq!(eval.weighted_accuracy, 1.0);
        assert_eq!(eval.events[9].event, 9);
    }

    #[test]
    fn unlabeled_events_carry_no_weight() {
        let labels = label_set(vec![
            (tags(&[("hw1", 2)]), tags(&[("hw1", 2)])),
            (Vec::new(), Vec::new()),
        ]);
        let eval = evaluate(&labels);
        assert_eq!(eval.events[1].accuracy, 0.0);
        assert_eq!(eval.events[1].most_common_truth, None);
        assert_eq!(eval.weighted_accuracy, 1.0);
    }

    #[test]
    fn nothing_labeled_scores_zero_accuracy() {
        let labels = label_set(vec![(Vec::new(), Vec::new())]);
        let eval = evaluate(&labels);
        assert_eq!(eval.weighted_accuracy, 0.0);
        assert_eq!(eval.v_measure, 1.0);
    }

    #[test]
    fn v_measure_ignores_label_names() {
        let truth = ["a", "a", "b", "b"];
        let renamed = ["x", "x", "y", "y"];
        assert!((v_measure(&truth, &renamed) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn v_measure_of_single_cluster_is_zero() {
        let truth = ["a", "a", "b", "b"];
        let lumped = ["x", "x", "x", "x"];
        assert_eq!(v_measure(&truth, &lumped), 0.0);
    }

    #[test]
    fn v_measure_partial_agreement() {
        // Split clusters are homogeneous but incomplete.
        let truth = ["a", "a", "b", "b"];
        let split = ["x", "y", "z", "w"];
        let v = v_measure(&truth, &split);
        // h = 1, c = 1 - ln2 / ln4 = 0.5, v = 2 * 0.5 / 1.5
        assert!((v - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn most_common_breaks_ties_alphabetically() {
        let labels = tags(&[("hw2", 2), ("exam", 2), ("hw1", 1)]);
        assert_eq!(most_common(&labels).as_deref(), Some("exam"));
    }

    #[test]
    fn weighted_accuracy_stays_in_unit_interval() {
        let labels = label_set(vec![
            (tags(&[("hw1", 3), ("exam", 4)]), tags(&[("exam", 7)])),
            (tags(&[("hw2", 5)]), tags(&[("hw1", 5)])),
        ]);
        let eval = evaluate(&labels);
        assert!((0.0..=1.0).contains(&eval.weighted_accuracy));
    }
}
