use anyhow::{Context, Result};
use clap::Parser;
use marginalia::client::IngestClient;
use marginalia::model::Highlight;
use std::path::Path;

#[derive(Parser)]
#[command(name = "import_highlights")]
#[command(about = "Push a JSON file of highlight records into a running marginalia service")]
struct Cli {
    /// Path to a JSON array of highlight records.
    json_path: String,
    /// Create endpoint of the service. Falls back to $API_ENTRYPOINT.
    #[arg(short, long)]
    endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = Path::new(&cli.json_path);

    if !path.exists() {
        anyhow::bail!("File does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("Path is not a file: {}", path.display());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let highlights: Vec<Highlight> =
        serde_json::from_str(&raw).context("Expected a JSON array of highlight records")?;

    if highlights.is_empty() {
        println!("nothing to import");
        return Ok(());
    }

    let client = match cli.endpoint {
        Some(endpoint) => IngestClient::new(endpoint),
        None => IngestClient::from_env()?,
    };

    let summary = client.create_highlights(highlights).await?;
    println!("{}", serde_json::to_string(&summary)?);

    Ok(())
}
