// src/crawler/fetch.rs
// =============================================================================
// The per-URL work: GET the page, pull out its references, emit the asset.
//
// Steps for one address:
// 1. Note the UTC start time
// 2. Validate the URL and send a GET (client default redirects, no timeout)
// 3. Read the whole body
// 4. Parse + extract references, build the Asset, encode it
// 5. Hand the record to each sink in registration order
//
// A failure anywhere is logged and ends this task only. Nothing is retried.
//
// Rust concepts:
// - async/await: the task parks during connect, body read and sink writes
// - Result + map_err: attach the failing stage to each error
// =============================================================================

use super::asset::Asset;
use super::error::FetchError;
use super::extract::{extract_references, parse_body};
use super::Crawler;
use crate::sink;
use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, FROM};
use reqwest::Client;
use tracing::{debug, error, info};
use url::Url;

/// Sent on every outbound request, fetches and sink posts alike.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "; ", env!("CARGO_PKG_VERSION"));

/// How a single task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Asset built and taken by every registered sink
    Delivered { sinks: usize },
    /// No asset: the URL, the request or the body failed
    FetchFailed,
    /// Asset built, but a sink refused it and later sinks were skipped
    SinkFailed,
}

/// Builds the client shared by fetches and HTTP sinks.
///
/// `from` may be empty; it is still sent.
pub fn build_client(from: &str) -> Result<Client> {
    let mut headers = HeaderMap::new();
    let from_value = HeaderValue::from_str(from)
        .with_context(|| format!("'{}' is not a valid From header value", from))?;
    headers.insert(FROM, from_value);

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
        .context("failed to create HTTP client")?;

    Ok(client)
}

/// Fetches `address` and builds its asset. Does not touch any sink.
pub async fn fetch_asset(
    client: &Client,
    address: &str,
    cache_body: bool,
) -> Result<Asset, FetchError> {
    let accessed = Utc::now();

    let url = Url::parse(address).map_err(|source| FetchError::InvalidUrl {
        address: address.to_string(),
        source,
    })?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Request {
            address: address.to_string(),
            source,
        })?;

    let body = response.bytes().await.map_err(|source| FetchError::Body {
        address: address.to_string(),
        source,
    })?;

    // The parsed tree is not Send, keep it out of any await
    let references = {
        let document = parse_body(&body);
        if !document.errors.is_empty() {
            debug!(address, parse_errors = document.errors.len(), "page parsed with errors");
        }
        extract_references(&document)
    };

    Ok(Asset::new(accessed, address.to_string(), &body, cache_body, references))
}

impl Crawler {
    /// Runs the whole pipeline for one input line. Never panics on bad
    /// input and never fails the caller: every problem is logged here.
    pub async fn crawl(&self, address: String) -> Outcome {
        info!(address = %address, "fetching");

        let asset = match fetch_asset(&self.client, &address, self.cache_bodies).await {
            Ok(asset) => asset,
            Err(e) => {
                log_fetch_error(&e);
                return Outcome::FetchFailed;
            }
        };

        let record = match asset.to_record() {
            Ok(record) => record,
            Err(source) => {
                log_fetch_error(&FetchError::Encode { address, source });
                return Outcome::FetchFailed;
            }
        };

        match sink::deliver(&self.sinks, &record).await {
            Ok(sinks) => {
                info!(
                    address = %address,
                    references = asset.references.len(),
                    sinks,
                    "fetched"
                );
                Outcome::Delivered { sinks }
            }
            Err(e) => {
                error!(
                    address = %address,
                    error = %e,
                    "output failed, skipping remaining outputs for this asset"
                );
                Outcome::SinkFailed
            }
        }
    }
}

fn log_fetch_error(e: &FetchError) {
    error!(address = %e.address(), stage = e.stage(), error = %e, "fetch failed");
}
