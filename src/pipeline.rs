//! End-to-end analysis run: load, segment, encode, mine, score

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::data::{load_records, RawRecord};
use crate::encode::{count_sequences, write_sequence_database};
use crate::miner::{Pattern, PatternMiner};
use crate::report::RuleRow;
use crate::rules::{Rule, RuleScorer};
use crate::segment::{segment_transactions, Transaction};

/// Name of the encoded sequence database inside the run work directory
pub const DATABASE_FILE_NAME: &str = "data_spmf.txt";

/// Everything one run produced
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub record_count: usize,
    pub transactions: Vec<Transaction>,
    /// Sequences counted back from the encoded database
    pub total_transactions: usize,
    pub patterns: Vec<Pattern>,
    pub rules: Vec<Rule>,
    pub rows: Vec<RuleRow>,
    pub conclusions: Vec<String>,
}

/// Run the full analysis on a transaction log CSV
///
/// # Arguments
/// * `input` - Transaction log CSV
/// * `config` - Support, thresholds and item catalog
/// * `miner` - Pattern miner backend
/// * `work_dir` - Directory for intermediate files; a temporary directory
///   removed at the end of the run when `None`
pub fn run_analysis(
    input: &Path,
    config: &AnalysisConfig,
    miner: &dyn PatternMiner,
    work_dir: Option<&Path>,
) -> crate::Result<AnalysisReport> {
    config.validate()?;
    let records = load_records(input)?;
    analyze_records(&records, config, miner, work_dir)
}

/// Run the analysis on records already sorted by (transaction id, sequence id)
pub fn analyze_records(
    records: &[RawRecord],
    config: &AnalysisConfig,
    miner: &dyn PatternMiner,
    work_dir: Option<&Path>,
) -> crate::Result<AnalysisReport> {
    config.validate()?;

    // dropped at the end of the run, removing the scratch files
    let scratch;
    let dir = match work_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            dir
        }
        None => {
            scratch = tempfile::Builder::new().prefix("trendforge-").tempdir()?;
            scratch.path()
        }
    };

    let transactions = segment_transactions(records);

    let database = dir.join(DATABASE_FILE_NAME);
    write_sequence_database(&transactions, &database)?;
    let total_transactions = count_sequences(&database)?;
    if total_transactions != transactions.len() {
        warn!(
            encoded = total_transactions,
            segmented = transactions.len(),
            "sequence count differs from segmented transactions"
        );
    }

    let patterns = if total_transactions == 0 {
        Vec::new()
    } else {
        miner.mine(&database, config.min_support)?
    };
    info!(
        miner = miner.name(),
        patterns = patterns.len(),
        total_transactions,
        "mined frequent patterns"
    );

    let scorer = RuleScorer::new(config.thresholds, config.catalog.clone());
    let rules = scorer.score(&patterns, total_transactions);
    let (rows, conclusions) = scorer.render(&rules);
    info!(rules = rules.len(), "derived association rules");

    Ok(AnalysisReport {
        record_count: records.len(),
        transactions,
        total_transactions,
        patterns,
        rules,
        rows,
        conclusions,
    })
}
