// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
//   pagecrawl [-c] [-h] [-l] [-v] [--out-file=a.jsonl,b.jsonl]
//             [--out-url=http://collector/a,...] [--config=path]
//
// Flag names are case-insensitive (-C works like -c); values are left alone.
// -h, -l and -v only print something, the crawl still runs afterwards.
//
// Rust concepts:
// - Derive macros: clap generates the parser from the struct
// - ArgMatches: the lower-level parse result, used here to recover the
//   command-line position of every output so sinks keep that order
// =============================================================================

use crate::config::DEFAULT_CONFIG_FILE;
use crate::sink::SinkTarget;
use clap::{CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

const LICENSE_INFO: &str = "\
pagecrawl  Copyright (C) 2023  Luna
Permission is hereby granted, free of charge, to any person obtaining a copy
of this software, to deal in the software without restriction, subject to the
conditions of the MIT license. The software is provided \"as is\", without
warranty of any kind.";

#[derive(Parser, Debug)]
#[command(
    name = "pagecrawl",
    version,
    about = "Fetches URLs read from stdin and records the links each page references",
    long_about = "pagecrawl reads one URL per line from standard input until it sees \"quit\" \
                  or the input ends. Every URL is fetched on its own task; the href values \
                  found in the page are written as one JSON line per page to every output.",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// Keep the raw page body in each record (base64 "data" field)
    #[arg(short = 'c', long = "cache")]
    pub cache: bool,

    /// Print this help, then keep running
    #[arg(short = 'h', long = "help")]
    pub help: bool,

    /// Print the license, then keep running
    #[arg(short = 'l', long = "license")]
    pub license: bool,

    /// Print the version, then keep running
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Append records to these files (comma separated, repeatable)
    #[arg(long = "out-file", value_name = "PATHS", value_delimiter = ',')]
    pub out_file: Vec<PathBuf>,

    /// POST records to these URLs (comma separated, repeatable)
    #[arg(long = "out-url", value_name = "URLS", value_delimiter = ',')]
    pub out_url: Vec<String>,

    /// Settings file to read (created with defaults if missing)
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

/// Parsed command line plus the outputs in the order they were given.
#[derive(Debug)]
pub struct Invocation {
    pub cli: Cli,
    pub sinks: Vec<SinkTarget>,
}

/// Parses `args` (program name first, like std::env::args_os).
pub fn parse_from<I, T>(args: I) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(|arg| normalize_flag(arg.into())).collect();

    let matches = Cli::command().try_get_matches_from(args)?;
    let cli = Cli::from_arg_matches(&matches)?;

    // Every delimited value gets its own index, so interleaved
    // --out-file/--out-url flags sort back into command-line order
    let mut positioned: Vec<(usize, SinkTarget)> = Vec::new();
    if let Some(indices) = matches.indices_of("out_file") {
        positioned.extend(
            indices
                .zip(&cli.out_file)
                .map(|(index, path)| (index, SinkTarget::File(path.clone()))),
        );
    }
    if let Some(indices) = matches.indices_of("out_url") {
        positioned.extend(
            indices
                .zip(&cli.out_url)
                .map(|(index, url)| (index, SinkTarget::Url(url.clone()))),
        );
    }
    positioned.sort_by_key(|(index, _)| *index);

    Ok(Invocation {
        sinks: positioned.into_iter().map(|(_, target)| target).collect(),
        cli,
    })
}

impl Cli {
    /// Texts requested with -h, -l and -v, in that order.
    pub fn info_texts(&self) -> Vec<String> {
        let mut texts = Vec::new();
        if self.help {
            texts.push(Cli::command().render_long_help().to_string());
        }
        if self.license {
            texts.push(LICENSE_INFO.to_string());
        }
        if self.version {
            texts.push(format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));
        }
        texts
    }
}

// Lowercases the flag name of "-X" / "--NAME=value" arguments.
// Anything else (values, the program name) passes through untouched.
fn normalize_flag(arg: OsString) -> OsString {
    let Some(text) = arg.to_str() else {
        return arg;
    };
    if !text.starts_with('-') {
        return arg;
    }

    match text.split_once('=') {
        Some((name, value)) => format!("{}={}", name.to_lowercase(), value).into(),
        None => text.to_lowercase().into(),
    }
}
