use prometheus::{Counter, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use tracing::error;

lazy_static::lazy_static! {
    // Parsing metrics
    pub static ref POSTS_PARSED: Counter = Counter::with_opts(
        Opts::new("forum_events_posts_parsed_total", "Total number of post records parsed")
    ).unwrap();

    pub static ref RECORDS_SKIPPED: Counter = Counter::with_opts(
        Opts::new("forum_events_records_skipped_total", "Total number of malformed records skipped")
    ).unwrap();

    // Segmentation metrics
    pub static ref EVENTS_WRITTEN: Counter = Counter::with_opts(
        Opts::new("forum_events_events_written_total", "Total number of event files written")
    ).unwrap();

    pub static ref CLUSTER_ITERATIONS: Counter = Counter::with_opts(
        Opts::new("forum_events_cluster_iterations_total", "Lloyd iterations run by the temporal clusterer")
    ).unwrap();

    // Topic scoring latency
    pub static ref TOPIC_FIT_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new("forum_events_topic_fit_duration_seconds", "Time spent fitting one event's topic model")
    ).unwrap();
}

pub struct MetricsRegistry {
    registry: Registry,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let registry = Registry::new();

        let collectors: [Box<dyn prometheus::core::Collector>; 5] = [
            Box::new(POSTS_PARSED.clone()),
            Box::new(RECORDS_SKIPPED.clone()),
            Box::new(EVENTS_WRITTEN.clone()),
            Box::new(CLUSTER_ITERATIONS.clone()),
            Box::new(TOPIC_FIT_DURATION.clone()),
        ];
        for collector in collectors {
            if let Err(e) = registry.register(collector) {
                error!("Failed to register metric: {}", e);
            }
        }

        Self { registry }
    }

    pub fn gather_metrics(&self) -> String {
        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        encoder.encode_to_string(&metric_families).unwrap_or_else(|e| {
            error!("Failed to encode metrics: {}", e);
            String::new()
        })
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_exposes_counters() {
        POSTS_PARSED.inc();
        let text = MetricsRegistry::new().gather_metrics();
        assert!(text.contains("forum_events_posts_parsed_total"));
        assert!(text.contains("forum_events_topic_fit_duration_seconds"));
    }
}
