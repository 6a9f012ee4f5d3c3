// Batch pipeline
// segment: post dump -> temporal clusters -> event files
// classify: event files -> topic confidence per event -> labels -> evaluation

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use tracing::info;

use crate::classify::classify;
use crate::clustering::{LloydKMeans, TemporalClusterer};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::evaluate::{evaluate, Evaluation, LabelSet};
use crate::event_file::{event_file_name, EventReader, EventWriter};
use crate::schema::{EventCluster, EventLabel, TagMarkers};
use crate::store::PostStore;
use crate::topic::{TopicScorer, TopicSummary};

#[derive(Debug, Clone)]
pub struct Segmentation {
    pub header_date: Option<String>,
    pub skipped: usize,
    pub events: Vec<EventCluster>,
    pub files: Vec<PathBuf>,
}

impl Segmentation {
    pub fn write_summary(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "Cluster size date, number of posts:")?;
        for event in &self.events {
            writeln!(
                out,
                "\tevent_{}: {}, {}",
                event.id,
                event.centroid.format("%Y-%m-%d"),
                event.posts.len()
            )?;
        }
        writeln!(out)
    }
}

/// Parses `input`, clusters it into `events` groups and writes one file per group.
pub fn segment(input: &Path, events: usize, cfg: &Config) -> Result<Segmentation> {
    let parsed = PostStore::read_file(input)?;
    let clusterer = TemporalClusterer::new(LloydKMeans::new(cfg.cluster_max_iter, cfg.cluster_seed));
    let clusters = clusterer.cluster(&parsed.posts, events)?;
    let files = EventWriter::new(&cfg.event_dir).write_all(&clusters)?;

    info!(events = clusters.len(), dir = %cfg.event_dir.display(), "Wrote event files");
    Ok(Segmentation {
        header_date: parsed.header_date,
        skipped: parsed.skipped,
        events: clusters,
        files,
    })
}

/// Reads every `event_<N>.txt` under the configured directory, ordered by N.
pub fn load_events(cfg: &Config) -> Result<Vec<EventCluster>> {
    let found = EventReader::discover(&cfg.event_dir)?;
    if found.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "no event files like {} in {}",
            event_file_name(0),
            cfg.event_dir.display()
        )));
    }
    found
        .iter()
        .map(|(id, path)| EventReader::read(path, *id))
        .collect()
}

/// One blocking task per event; results come back in input order.
pub async fn score_events(events: &[EventCluster], cfg: &Config) -> Result<Vec<TopicSummary>> {
    let tasks = events.iter().map(|event| {
        let scorer = TopicScorer::for_event(cfg, event.id);
        let id = event.id;
        let documents: Vec<String> = event.posts.iter().map(|p| p.document()).collect();
        async move { tokio::task::spawn_blocking(move || scorer.score(id, &documents)).await? }
    });
    try_join_all(tasks).await
}

#[derive(Debug, Clone)]
pub struct EventReport {
    pub id: usize,
    pub centroid: DateTime<Utc>,
    pub posts: usize,
    pub topics: TopicSummary,
    pub label: EventLabel,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub markers: TagMarkers,
    pub events: Vec<EventReport>,
    pub evaluation: Evaluation,
}

impl Report {
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "Top LDA keywords:")?;
        for event in &self.events {
            let words: Vec<&str> = event.topics.keywords.iter().map(|(w, _)| w.as_str()).collect();
            writeln!(out, "\tevent_{}: {}", event.id, words.join(" "))?;
        }

        writeln!(out, "\nPredicted label, (most likely true label), accuracy:")?;
        for (event, score) in self.events.iter().zip(&self.evaluation.events) {
            writeln!(
                out,
                "\tevent_{}: {}, ({}), {:.4}",
                event.id,
                event.label.tag(&self.markers),
                score.most_common_truth.as_deref().unwrap_or("-"),
                score.accuracy
            )?;
        }

        writeln!(out, "\nOverall accuracy: {:.4}", self.evaluation.weighted_accuracy)?;
        writeln!(out, "\nV-measure score: {:.4}", self.evaluation.v_measure)
    }
}

/// Scores, labels and evaluates already-loaded events.
pub async fn classify_loaded(events: Vec<EventCluster>, cfg: &Config) -> Result<Report> {
    let summaries = score_events(&events, cfg).await?;

    let confidences: Vec<f64> = summaries.iter().map(|s| s.confidence).collect();
    let centroids: Vec<DateTime<Utc>> = events.iter().map(|e| e.centroid).collect();
    let labels = classify(&confidences, &centroids, cfg.num_exams)?;

    let markers = TagMarkers::from(cfg);
    let evaluation = evaluate(&LabelSet::build(&events, &labels, &markers));
    info!(
        weighted_accuracy = evaluation.weighted_accuracy,
        v_measure = evaluation.v_measure,
        "Evaluated events"
    );

    let events = events
        .into_iter()
        .zip(summaries)
        .zip(labels)
        .map(|((event, topics), label)| EventReport {
            id: event.id,
            centroid: event.centroid,
            posts: event.posts.len(),
            topics,
            label,
        })
        .collect();

    Ok(Report {
        markers,
        events,
        evaluation,
    })
}

pub async fn classify_events(cfg: &Config) -> Result<Report> {
    let events = load_events(cfg)?;
    classify_loaded(events, cfg).await
}
