//! Thin wrapper around the one `reqwest::Client` shared by every provider.

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::config::HttpConfig;

const USER_AGENT: &str = concat!("weather-aggregator/", env!("CARGO_PKG_VERSION"));

/// Build the pooled client. The timeout covers each call, not a whole request.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.timeout())
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

/// GET `url` with `query`, require a 2xx status and decode the JSON body.
pub async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
    label: &str,
) -> Result<T> {
    let res = client
        .get(url)
        .query(query)
        .send()
        .await
        .with_context(|| format!("Failed to send request to {label}"))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .with_context(|| format!("Failed to read {label} response body"))?;

    if !status.is_success() {
        return Err(anyhow!(
            "{label} request failed with status {}: {}",
            status,
            truncate_body(&body),
        ));
    }

    serde_json::from_str(&body).with_context(|| format!("Failed to parse {label} JSON"))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
