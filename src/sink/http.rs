// src/sink/http.rs
// =============================================================================
// Sends each record to a remote collector with an HTTP POST.
//
// Every write is its own request through the shared client, which already
// carries the From and User-Agent headers. Only transport failures count as
// errors; whatever status the collector answers with is accepted.
// =============================================================================

use super::{Sink, SinkError};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

pub struct HttpSink {
    client: Client,
    url: String,
}

impl HttpSink {
    pub fn new(client: Client, url: String) -> Self {
        HttpSink { client, url }
    }
}

#[async_trait]
impl Sink for HttpSink {
    async fn write(&self, record: &[u8]) -> Result<usize, SinkError> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(record.to_vec())
            .send()
            .await
            .map_err(|source| SinkError::Http {
                target: self.url.clone(),
                source,
            })?;

        tracing::debug!(sink = %self.url, status = response.status().as_u16(), "record posted");

        Ok(record.len())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
