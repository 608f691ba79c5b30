// src/sink/mod.rs
// =============================================================================
// Output destinations for encoded assets.
//
// Submodules:
// - file: appends records to a local file
// - http: POSTs each record to a collector URL
//
// Every sink is shared by all in-flight fetch tasks at once, so each
// implementation is responsible for being safe under concurrent writes.
//
// Rust concepts:
// - Traits + trait objects: Vec<Box<dyn Sink>> holds both kinds side by side
// - async-trait: lets a trait object expose an async method
// =============================================================================

mod file;
mod http;

pub use file::FileSink;
pub use http::HttpSink;

use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info};

/// Something that accepts encoded asset records.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Writes one whole record. Returns the number of bytes accepted.
    async fn write(&self, record: &[u8]) -> Result<usize, SinkError>;

    /// Human readable target, for logs.
    fn describe(&self) -> String;
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("writing to file {target} failed: {source}")]
    Io {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("posting to {target} failed: {source}")]
    Http {
        target: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A sink requested on the command line, before it is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    File(PathBuf),
    Url(String),
}

/// Opens every requested sink, keeping command-line order.
///
/// A file that cannot be opened is logged and left out; the run carries on
/// with whatever sinks remain (possibly none).
pub fn register(targets: &[SinkTarget], client: &Client) -> Vec<Box<dyn Sink>> {
    let mut sinks: Vec<Box<dyn Sink>> = Vec::with_capacity(targets.len());

    for target in targets {
        match target {
            SinkTarget::File(path) => match FileSink::open(path) {
                Ok(sink) => sinks.push(Box::new(sink)),
                Err(e) => {
                    error!(
                        path = %path.display(),
                        error = %e,
                        "cannot open output file, skipping it"
                    );
                }
            },
            SinkTarget::Url(url) => {
                sinks.push(Box::new(HttpSink::new(client.clone(), url.clone())));
            }
        }
    }

    for sink in &sinks {
        info!(sink = %sink.describe(), "output registered");
    }

    sinks
}

/// Hands `record` to each sink in order.
///
/// Stops at the first failing sink: later sinks do not see this record.
/// Returns how many sinks took it.
pub async fn deliver(sinks: &[Box<dyn Sink>], record: &[u8]) -> Result<usize, SinkError> {
    for sink in sinks {
        sink.write(record).await?;
    }
    Ok(sinks.len())
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is Box<dyn Sink>?
//    - A heap pointer to some type implementing Sink, type decided at runtime
//    - Lets FileSink and HttpSink live in the same Vec
//
// 2. Why #[async_trait]?
//    - Trait objects can't expose plain `async fn` methods
//    - The macro rewrites them to return Pin<Box<dyn Future + Send>>
//
// 3. Why Send + Sync on the trait?
//    - Many tokio tasks call write() on the same sink at the same time,
//      from different threads
// -----------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::testing::{FailingSink, RecordingSink};
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_deliver_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sinks: Vec<Box<dyn Sink>> = vec![
            Box::new(RecordingSink { label: "first", log: log.clone() }),
            Box::new(RecordingSink { label: "second", log: log.clone() }),
            Box::new(RecordingSink { label: "third", log: log.clone() }),
        ];

        let delivered = deliver(&sinks, b"record\n").await.unwrap();
        assert_eq!(delivered, 3);

        let log = log.lock().unwrap();
        let labels: Vec<_> = log.iter().map(|(label, _)| *label).collect();
        assert_eq!(labels, vec!["first", "second", "third"]);
        assert!(log.iter().all(|(_, bytes)| bytes == b"record\n"));
    }

    #[tokio::test]
    async fn test_deliver_stops_at_first_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sinks: Vec<Box<dyn Sink>> = vec![
            Box::new(FailingSink { log: log.clone() }),
            Box::new(RecordingSink { label: "second", log: log.clone() }),
            Box::new(RecordingSink { label: "third", log: log.clone() }),
        ];

        let result = deliver(&sinks, b"record\n").await;
        assert!(matches!(result, Err(SinkError::Io { .. })));

        let labels: Vec<_> = log.lock().unwrap().iter().map(|(label, _)| *label).collect();
        assert_eq!(labels, vec!["failing"]);
    }

    #[tokio::test]
    async fn test_deliver_with_no_sinks() {
        let sinks: Vec<Box<dyn Sink>> = Vec::new();
        assert_eq!(deliver(&sinks, b"x").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_register_skips_unopenable_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("out.jsonl");
        let bad = dir.path().join("missing-dir").join("out.jsonl");

        let targets = vec![
            SinkTarget::File(bad),
            SinkTarget::Url("http://127.0.0.1:9/collect".to_string()),
            SinkTarget::File(good.clone()),
        ];
        let sinks = register(&targets, &Client::new());

        let described: Vec<_> = sinks.iter().map(|s| s.describe()).collect();
        assert_eq!(
            described,
            vec![
                "http://127.0.0.1:9/collect".to_string(),
                good.display().to_string(),
            ]
        );
    }
}
