//! TrendForge: sequential-pattern association rules for daily sales trends
//!
//! This library turns a day-segmented transaction log into a SPADE sequence
//! database, mines frequent sequential patterns, and scores directional
//! item-pair rules by confidence and lift.

pub mod cli;
pub mod config;
pub mod data;
pub mod encode;
pub mod error;
pub mod miner;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod segment;
pub mod spade;

// Re-export public items for easier access
pub use cli::Args;
pub use config::{AnalysisConfig, ItemCatalog, Thresholds};
pub use data::{load_records, RawRecord};
pub use encode::{count_sequences, decode_sequence_line, encode_transaction, write_sequence_database};
pub use error::AnalysisError;
pub use miner::{parse_pattern_line, parse_patterns, Pattern, PatternMiner, SpmfMiner};
pub use pipeline::{run_analysis, AnalysisReport};
pub use report::{conclusion_for, write_report_csv, RuleRow};
pub use rules::{undefined_ratio, Rule, RuleScorer};
pub use segment::{segment_transactions, Transaction};
pub use spade::SpadeMiner;

/// Numeric item identifier as it appears in the `Items` column
pub type ItemId = i64;

/// Common result type used throughout the library
pub type Result<T> = std::result::Result<T, AnalysisError>;
