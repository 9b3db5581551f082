//! Error taxonomy for an analysis run

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Every failure that aborts an analysis run.
///
/// Zero supports during scoring are not errors; see [`crate::rules::undefined_ratio`].
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Missing columns, null cells, or non-integer values in the input table.
    #[error("input format error: {0}")]
    InputFormat(String),
    #[error("failed to read input table: {0}")]
    Table(#[from] polars::prelude::PolarsError),
    #[error("malformed sequence database line {line}: {reason}")]
    SequenceFormat { line: usize, reason: String },
    /// Missing binary, non-zero exit, or rejected arguments.
    #[error("pattern miner invocation failed: {0}")]
    MinerInvocation(String),
    #[error("pattern miner did not finish within {0:?}")]
    MinerTimeout(Duration),
    #[error("malformed pattern miner output at line {line}: {content:?}")]
    MinerOutput { line: usize, content: String },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}
