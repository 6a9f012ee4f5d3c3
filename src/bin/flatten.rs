// Forum dump flattening
// Converts a JSON array of fetched forum posts into the `@@@` record file segment reads
// Run with: cargo run --bin flatten -- <dump.json> <output_filename>

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use dotenv::dotenv;
use forum_events::{forum, Error};
use tracing::info;

#[derive(Parser)]
#[command(about = "Flatten a forum JSON dump into one post record per line")]
struct Args {
    /// JSON array of raw forum posts
    dump: PathBuf,
    output_filename: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    forum_events::init_logging();

    let args = Args::parse();
    let raw = fs::read_to_string(&args.dump).map_err(|e| Error::io(&args.dump, e))?;
    let posts: Vec<forum::RawPost> = serde_json::from_str(&raw).map_err(Error::from)?;

    let header = Utc::now().format("%Y-%m-%d").to_string();
    let mut lines = forum::flatten(&posts, &header);
    lines.push(String::new());
    fs::write(&args.output_filename, lines.join("\n"))
        .map_err(|e| Error::io(&args.output_filename, e))?;

    info!(output = %args.output_filename.display(), records = lines.len() - 2, "Scraped posts written");
    Ok(())
}
