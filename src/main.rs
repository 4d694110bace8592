use anyhow::{Context, Result};
use euscraper::{
    config::{self, ScraperConfig},
    decode::RowDecoder,
    fetch,
    pipeline::Pipeline,
};
use reqwest::Client;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) load run configuration ───────────────────────────────────
    let config = ScraperConfig::load(config::DEFAULT_CONFIG_PATH)?;
    info!(target_url = %config.target_url, output_file = %config.output_file, "configured");

    // ─── 3) fetch the source CSV ─────────────────────────────────────
    let client = Client::new();
    let body = fetch::fetch_text(&client, &config.target_url).await?;

    // ─── 4) decode → validate → accumulate ───────────────────────────
    let mut pipeline = Pipeline::open(&config)?;
    let decoder = RowDecoder::new(&body).context("decoding CSV payload")?;
    for row in decoder {
        let row = row.context("decoding CSV payload")?;
        if let Err(e) = pipeline.process(&row) {
            warn!(error = %e, "skipping row");
        }
    }

    // ─── 5) persist the artifact ─────────────────────────────────────
    pipeline.close()?;

    Ok(())
}
