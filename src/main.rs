// src/main.rs
// =============================================================================
// This is the entry point of pagecrawl.
//
// What happens here:
// 1. Parse command-line arguments (outputs, cache flag, info flags)
// 2. Load the settings file and start logging to this run's log file
// 3. Build the shared HTTP client and open every output
// 4. Hand stdin to the pipeline and wait until every fetch has finished
// 5. Exit 0; only startup failures exit non-zero
//
// Individual fetch or output failures end up in the log, never in the exit
// code.
// =============================================================================

mod cli;
mod config;
mod crawler;
mod logging;
mod pipeline;
mod sink;

use anyhow::Result;
use config::Settings;
use crawler::Crawler;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // Startup failed before the pipeline could start
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli::Invocation { cli, sinks: targets } = match cli::parse_from(std::env::args_os()) {
        Ok(invocation) => invocation,
        Err(e) => e.exit(),
    };

    for text in cli.info_texts() {
        println!("{}", text);
    }

    let settings = Settings::load(&cli.config)?;
    logging::init_logging(&settings.log)?;

    let client = crawler::build_client(&settings.network.from)?;
    let sinks = sink::register(&targets, &client);
    let crawler = Arc::new(Crawler::new(client, cli.cache, sinks));

    info!(
        cache = cli.cache,
        outputs = crawler.sink_count(),
        user_agent = crawler::USER_AGENT,
        "reading URLs from stdin"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    pipeline::run(stdin, crawler).await;

    Ok(0)
}
