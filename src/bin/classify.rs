// Event classification
// Labels every event_<N>.txt as exam or numbered assignment and scores the result
// Run with: cargo run --bin classify

use clap::Parser;
use dotenv::dotenv;
use forum_events::{config::Config, metrics::MetricsRegistry, pipeline};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Parser)]
#[command(about = "Classify event files as exams or assignments and evaluate against tags")]
struct Args {}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    forum_events::init_logging();

    Args::parse();
    let cfg = Config::from_env()?;
    let metrics = MetricsRegistry::new();

    let run_id = Uuid::new_v4();
    info!(%run_id, dir = %cfg.event_dir.display(), exams = cfg.num_exams, "Starting classification");

    let report = pipeline::classify_events(&cfg).await?;
    report.write_to(&mut std::io::stdout().lock())?;

    info!(%run_id, events = report.events.len(), "Classification finished");
    debug!("{}", metrics.gather_metrics());
    Ok(())
}
