// src/pipeline/mod.rs
// =============================================================================
// This module drives a whole run: input lines in, one fetch task per line,
// then a single wait for every task before the process exits.
// =============================================================================

mod coordinator;

pub use coordinator::run;
