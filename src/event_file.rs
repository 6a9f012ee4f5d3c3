// Per-event files
// `event_<N>.txt`: centroid timestamp on line 1, then one `@@@` post record per line.
// This is the only artifact shared between the segment and classify stages.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use regex::Regex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::metrics::EVENTS_WRITTEN;
use crate::schema::{EventCluster, CENTROID_FORMAT};
use crate::store::{format_record, PostStore};

lazy_static::lazy_static! {
    static ref EVENT_FILE_RE: Regex = Regex::new(r"^event_(\d+)\.txt$").unwrap();
}

pub fn event_file_name(id: usize) -> String {
    format!("event_{id}.txt")
}

pub struct EventWriter {
    dir: PathBuf,
}

impl EventWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Writes (truncating) `event_<id>.txt` and returns its path.
    pub fn write(&self, cluster: &EventCluster) -> Result<PathBuf> {
        let path = self.dir.join(event_file_name(cluster.id));
        let file = File::create(&path).map_err(|e| Error::io(&path, e))?;
        let mut out = BufWriter::new(file);

        let write_lines = |out: &mut BufWriter<File>| -> std::io::Result<()> {
            writeln!(out, "{}", cluster.centroid.format(CENTROID_FORMAT))?;
            for post in &cluster.posts {
                writeln!(out, "{}", format_record(post))?;
            }
            out.flush()
        };
        write_lines(&mut out).map_err(|e| Error::io(&path, e))?;

        EVENTS_WRITTEN.inc();
        debug!(event = cluster.id, path = %path.display(), posts = cluster.posts.len(), "Wrote event file");
        Ok(path)
    }

    pub fn write_all(&self, clusters: &[EventCluster]) -> Result<Vec<PathBuf>> {
        clusters.iter().map(|c| self.write(c)).collect()
    }
}

pub struct EventReader;

impl EventReader {
    /// `event_*.txt` files in `dir`, ordered by their numeric suffix.
    pub fn discover(dir: &Path) -> Result<Vec<(usize, PathBuf)>> {
        let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(dir, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(caps) = EVENT_FILE_RE.captures(name) {
                if let Ok(id) = caps[1].parse::<usize>() {
                    found.push((id, entry.path()));
                }
            }
        }
        found.sort_by_key(|(id, _)| *id);
        info!(dir = %dir.display(), events = found.len(), "Discovered event files");
        Ok(found)
    }

    pub fn read(path: &Path, id: usize) -> Result<EventCluster> {
        let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&raw, id)
    }

    /// Post lines that fail to parse are skipped; a bad centroid line is fatal.
    pub fn parse(raw: &str, id: usize) -> Result<EventCluster> {
        let parsed = PostStore::parse(raw.lines());
        let header = parsed.header_date.unwrap_or_default();
        let centroid = NaiveDateTime::parse_from_str(&header, CENTROID_FORMAT)
            .map_err(|e| Error::MalformedRecord {
                line: 1,
                reason: format!("bad centroid timestamp {header:?}: {e}"),
            })?
            .and_utc();

        Ok(EventCluster {
            id,
            centroid,
            posts: parsed.posts,
        })
    }
}
