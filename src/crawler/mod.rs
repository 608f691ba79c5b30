// src/crawler/mod.rs
// =============================================================================
// This module turns one input URL into one delivered asset record.
//
// Submodules:
// - asset: the record type and its JSON encoding
// - extract: walks the parsed HTML tree collecting href values
// - fetch: the HTTP side (client setup, GET, hand-off to the sinks)
// - error: what can go wrong before an asset exists
//
// The Crawler struct is the run-wide context every task shares. It is built
// once before the first line is read and never mutated afterwards.
// =============================================================================

mod asset;
mod error;
mod extract;
mod fetch;

pub use fetch::{build_client, Outcome, USER_AGENT};

use crate::sink::Sink;
use reqwest::Client;

/// Everything a fetch task needs, shared read-only between tasks.
pub struct Crawler {
    client: Client,
    cache_bodies: bool,
    sinks: Vec<Box<dyn Sink>>,
}

impl Crawler {
    pub fn new(client: Client, cache_bodies: bool, sinks: Vec<Box<dyn Sink>>) -> Self {
        Crawler {
            client,
            cache_bodies,
            sinks,
        }
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}
