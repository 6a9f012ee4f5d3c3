use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub event_dir: PathBuf,
    pub num_exams: usize,
    pub homework_marker: String,
    pub exam_marker: String,
    pub cluster_seed: u64,
    pub cluster_max_iter: usize,
    pub topic_passes: usize,
    pub topic_seed: u64,
    pub topic_keywords: usize,
    pub dict_no_below: f64,
    pub dict_no_above: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            event_dir: PathBuf::from("."),
            num_exams: 2,
            homework_marker: "hw".into(),
            exam_marker: "exam".into(),
            cluster_seed: 42,
            cluster_max_iter: 300,
            topic_passes: 20,
            topic_seed: 42,
            topic_keywords: 10,
            dict_no_below: 0.2,
            dict_no_above: 0.75,
        }
    }
}

impl Config {
    /// Reads overrides from the environment; unset keys keep their defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            event_dir: env::var("EVENT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.event_dir),
            num_exams: parse_var("NUM_EXAMS", defaults.num_exams)?,
            homework_marker: env::var("HOMEWORK_MARKER").unwrap_or(defaults.homework_marker),
            exam_marker: env::var("EXAM_MARKER").unwrap_or(defaults.exam_marker),
            cluster_seed: parse_var("CLUSTER_SEED", defaults.cluster_seed)?,
            cluster_max_iter: parse_var("CLUSTER_MAX_ITER", defaults.cluster_max_iter)?,
            topic_passes: parse_var("TOPIC_PASSES", defaults.topic_passes)?,
            topic_seed: parse_var("TOPIC_SEED", defaults.topic_seed)?,
            topic_keywords: parse_var("TOPIC_KEYWORDS", defaults.topic_keywords)?,
            dict_no_below: parse_var("DICT_NO_BELOW", defaults.dict_no_below)?,
            dict_no_above: parse_var("DICT_NO_ABOVE", defaults.dict_no_above)?,
        })
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| Error::Config { key, value }),
        Err(_) => Ok(default),
    }
}
