// Temporal segmentation
// Splits a post dump into event_<N>.txt files, one per expected assignment or exam
// Run with: cargo run --bin segment -- <input_filename> <num_events>

use std::path::PathBuf;

use clap::Parser;
use dotenv::dotenv;
use forum_events::{config::Config, metrics::MetricsRegistry, pipeline, Error};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Parser)]
#[command(about = "Cluster forum posts into events by timestamp")]
struct Args {
    /// `@@@`-delimited post dump; the first line is a date header
    input_filename: PathBuf,
    /// Total number of assignments plus exams in the course
    num_events: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    forum_events::init_logging();

    let args = Args::parse();
    if args.num_events == 0 {
        return Err(Error::Usage("num_events must be at least 1".into()).into());
    }
    let cfg = Config::from_env()?;
    let metrics = MetricsRegistry::new();

    let run_id = Uuid::new_v4();
    info!(%run_id, input = %args.input_filename.display(), events = args.num_events, "Starting segmentation");

    let segmentation = pipeline::segment(&args.input_filename, args.num_events, &cfg)?;
    info!(
        %run_id,
        header = segmentation.header_date.as_deref().unwrap_or(""),
        skipped = segmentation.skipped,
        files = segmentation.files.len(),
        "Segmentation finished"
    );

    segmentation.write_summary(&mut std::io::stdout().lock())?;
    debug!("{}", metrics.gather_metrics());
    Ok(())
}
