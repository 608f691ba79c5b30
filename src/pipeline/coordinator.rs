// src/pipeline/coordinator.rs
// =============================================================================
// Reads URLs line by line and starts one fetch task per line.
//
// How it works:
// 1. Read a line (raw bytes up to '\n', line ending stripped)
// 2. "quit" or end of input: stop reading
// 3. A line that can't be read or decoded is logged and skipped
// 4. Anything else gets its own tokio task right away; we don't wait for it
// 5. Once reading stops, wait for every task that was started
//
// There is no cap on tasks in flight and no way to cancel one once started.
//
// Rust concepts:
// - Generics with trait bounds: any AsyncBufRead works as input (stdin, &[u8])
// - Arc: shares the crawler between tasks without copying it
// - JoinSet: owns the spawned tasks; finished ones are reaped as we go so
//   only fetches still running stay in memory
// =============================================================================

use crate::crawler::{Crawler, Outcome};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};

/// Input line that stops reading.
pub const SENTINEL: &str = "quit";

// A broken input stream fails every read; stop instead of spinning on it
const MAX_CONSECUTIVE_READ_ERRORS: usize = 16;

/// Counts gathered over one run, logged when the run drains.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Tasks started, one per accepted line
    pub dispatched: usize,
    /// Lines that could not be read or decoded
    pub skipped: usize,
    pub delivered: usize,
    /// Sum of sinks reached over all delivered assets
    pub writes: usize,
    pub fetch_failed: usize,
    pub sink_failed: usize,
    /// Tasks that panicked instead of returning
    pub aborted: usize,
}

impl RunSummary {
    fn record(&mut self, joined: Result<Outcome, JoinError>) {
        match joined {
            Ok(Outcome::Delivered { sinks }) => {
                self.delivered += 1;
                self.writes += sinks;
            }
            Ok(Outcome::FetchFailed) => self.fetch_failed += 1,
            Ok(Outcome::SinkFailed) => self.sink_failed += 1,
            Err(e) => {
                error!(error = %e, "fetch task ended abnormally");
                self.aborted += 1;
            }
        }
    }
}

// Spawns fetch tasks and keeps only the unfinished ones around
struct Dispatcher {
    crawler: Arc<Crawler>,
    tasks: JoinSet<Outcome>,
    summary: RunSummary,
}

impl Dispatcher {
    fn new(crawler: Arc<Crawler>) -> Self {
        Dispatcher {
            crawler,
            tasks: JoinSet::new(),
            summary: RunSummary::default(),
        }
    }

    fn spawn(&mut self, line: String) {
        let crawler = self.crawler.clone();
        self.tasks.spawn(async move { crawler.crawl(line).await });
        self.summary.dispatched += 1;
        self.reap();
    }

    // Collects tasks that already finished, without waiting
    fn reap(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            self.summary.record(joined);
        }
    }

    fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    async fn drain(mut self) -> RunSummary {
        info!(in_flight = self.in_flight(), "waiting for fetches to finish");

        while let Some(joined) = self.tasks.join_next().await {
            self.summary.record(joined);
        }
        self.summary
    }
}

/// Reads `input` until the sentinel or end of input, crawling every line on
/// its own task, then waits for all of them.
pub async fn run<R>(mut input: R, crawler: Arc<Crawler>) -> RunSummary
where
    R: AsyncBufRead + Unpin,
{
    let mut dispatcher = Dispatcher::new(crawler);
    let mut buf = Vec::new();
    let mut read_errors = 0;

    loop {
        buf.clear();
        match input.read_until(b'\n', &mut buf).await {
            // End of input
            Ok(0) => break,
            Ok(_) => read_errors = 0,
            Err(e) => {
                warn!(error = %e, "failed to read input line, skipping it");
                dispatcher.summary.skipped += 1;
                read_errors += 1;
                if read_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                    error!(read_errors, "input keeps failing, treating it as closed");
                    break;
                }
                continue;
            }
        }

        let line = match std::str::from_utf8(strip_line_ending(&buf)) {
            Ok(line) => line.to_string(),
            Err(e) => {
                warn!(error = %e, "input line is not valid UTF-8, skipping it");
                dispatcher.summary.skipped += 1;
                continue;
            }
        };

        if line == SENTINEL {
            info!("quit received, no more input will be read");
            break;
        }

        dispatcher.spawn(line);
    }

    let summary = dispatcher.drain().await;

    info!(
        dispatched = summary.dispatched,
        delivered = summary.delivered,
        writes = summary.writes,
        fetch_failed = summary.fetch_failed,
        sink_failed = summary.sink_failed,
        skipped = summary.skipped,
        aborted = summary.aborted,
        "all fetches finished"
    );

    summary
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why spawn instead of just awaiting crawl()?
//    - Awaiting would finish one URL before reading the next line
//    - JoinSet::spawn hands the future to the runtime's worker threads and
//      returns immediately
//
// 2. What does `async move` do?
//    - Moves `crawler` (an Arc clone) and `line` into the task
//    - The task may outlive this loop iteration, so it must own its data
//
// 3. What is a JoinError?
//    - What joining a task gives back if the task panicked
//    - A panic inside one task doesn't take down the others or this loop
// -----------------------------------------------------------------------------

// Drops a trailing "\n" or "\r\n"
fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::build_client;
    use crate::sink::testing::RecordingSink;
    use crate::sink::{FileSink, Sink};
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn crawler_with(sinks: Vec<Box<dyn Sink>>) -> Arc<Crawler> {
        Arc::new(Crawler::new(build_client("").unwrap(), false, sinks))
    }

    #[test]
    fn test_strip_line_ending() {
        assert_eq!(strip_line_ending(b"http://a\n"), b"http://a");
        assert_eq!(strip_line_ending(b"http://a\r\n"), b"http://a");
        assert_eq!(strip_line_ending(b"http://a"), b"http://a");
        assert_eq!(strip_line_ending(b"\n"), b"");
    }

    #[tokio::test]
    async fn test_nothing_after_quit_is_dispatched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/one"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<a href=\"1\">"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/two"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<a href=\"2\">"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/three"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let input = format!(
            "{uri}/one\n{uri}/two\nquit\n{uri}/three\n",
            uri = server.uri()
        );
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = RecordingSink { label: "r", log: log.clone() };
        let crawler = crawler_with(vec![Box::new(sink)]);

        let summary = run(input.as_bytes(), crawler).await;

        assert_eq!(summary.dispatched, 2);
        assert_eq!(summary.delivered, 2);
        assert_eq!(summary.writes, 2);
        // Both tasks finished before run returned
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_end_of_input_drains() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>"))
            .expect(3)
            .mount(&server)
            .await;

        // Last line has no newline
        let input = format!("{uri}/a\r\n{uri}/b\n{uri}/c", uri = server.uri());
        let summary = run(input.as_bytes(), crawler_with(Vec::new())).await;

        assert_eq!(summary.dispatched, 3);
        assert_eq!(summary.delivered, 3);
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>"))
            .expect(1)
            .mount(&server)
            .await;

        let mut input = Vec::new();
        input.extend_from_slice(b"not a url\n");
        input.extend_from_slice(&[0xff, 0xfe, b'\n']);
        input.extend_from_slice(b"http://127.0.0.1:9/\n");
        input.extend_from_slice(format!("{}/ok\n", server.uri()).as_bytes());

        let summary = run(input.as_slice(), crawler_with(Vec::new())).await;

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.dispatched, 3);
        assert_eq!(summary.fetch_failed, 2);
        assert_eq!(summary.delivered, 1);
    }

    #[tokio::test]
    async fn test_finished_tasks_are_reaped_while_reading() {
        let mut dispatcher = Dispatcher::new(crawler_with(Vec::new()));
        let mut peak = 0;

        for _ in 0..200 {
            // Fails at URL validation without touching the network
            dispatcher.spawn("not a url".to_string());
            peak = peak.max(dispatcher.in_flight());
            // Lets the current-thread runtime run the task just spawned
            tokio::task::yield_now().await;
        }

        assert!(peak <= 2, "{} tasks held at once", peak);

        let summary = dispatcher.drain().await;
        assert_eq!(summary.dispatched, 200);
        assert_eq!(summary.fetch_failed, 200);
    }

    #[tokio::test]
    async fn test_quit_only_dispatches_nothing() {
        let summary = run(&b"quit\nhttp://127.0.0.1:9/\n"[..], crawler_with(Vec::new())).await;
        assert_eq!(summary, RunSummary::default());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_hundred_lines_into_one_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body><a href="/x">x</a><a href="/y">y</a></body></html>"#,
            ))
            .expect(100)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("assets.jsonl");
        let sink = FileSink::open(&out).unwrap();
        let client = build_client("").unwrap();
        let crawler = Arc::new(Crawler::new(client, true, vec![Box::new(sink)]));

        let mut input = String::new();
        for i in 0..100 {
            input.push_str(&format!("{}/page/{}\n", server.uri(), i));
        }
        input.push_str("quit\n");

        let summary = run(input.as_bytes(), crawler).await;
        assert_eq!(summary.dispatched, 100);
        assert_eq!(summary.delivered, 100);

        let content = std::fs::read_to_string(&out).unwrap();
        let mut addresses: Vec<String> = content
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                assert_eq!(value["references"], serde_json::json!(["/x", "/y"]));
                value["address"].as_str().unwrap().to_string()
            })
            .collect();
        addresses.sort();
        addresses.dedup();
        assert_eq!(addresses.len(), 100);
    }
}
