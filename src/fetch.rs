// src/fetch.rs

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};
use url::Url;

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

/// Fetch the target URL once and return the response body as text.
/// Transient failures are retried with exponential backoff before giving up.
pub async fn fetch_text(client: &Client, url_str: &str) -> Result<String> {
    let url = Url::parse(url_str).with_context(|| format!("invalid target URL `{}`", url_str))?;
    get_text_with_retry(client, &url, MAX_RETRIES, INITIAL_BACKOFF_MS).await
}

async fn get_text_core(client: &Client, url: &Url) -> Result<String> {
    debug!("Fetching text from {}", url);
    Ok(client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))?
        .text()
        .await
        .with_context(|| format!("Reading text from {}", url))?)
}

async fn get_text_with_retry(
    client: &Client,
    url: &Url,
    max_retries: u32,
    initial_backoff_ms: u64,
) -> Result<String> {
    let mut attempts = 0;
    loop {
        match get_text_core(client, url).await {
            Ok(t) => return Ok(t),
            Err(e) if attempts < max_retries => {
                attempts += 1;
                let backoff = initial_backoff_ms * 2u64.pow(attempts - 1);
                warn!(%url, attempt = attempts, delay_ms = backoff, error = %e, "Retrying");
                sleep(Duration::from_millis(backoff)).await;
            }
            Err(e) => {
                error!(%url, error = %e, "Exhausted retries");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_unparseable_url() {
        let client = Client::new();
        let err = fetch_text(&client, "not a url").await.unwrap_err();
        assert!(err.to_string().contains("invalid target URL"));
    }
}
