//! Command-line interface definitions and argument parsing

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::{
    AnalysisConfig, ItemCatalog, Thresholds, DEFAULT_MIN_CONFIDENCE, DEFAULT_MIN_LIFT,
    DEFAULT_MIN_SUPPORT,
};
use crate::miner::{PatternMiner, SpmfMiner};
use crate::spade::SpadeMiner;

/// Longest pattern the rules need; the built-in miner stops there
const RULE_PATTERN_LEN: usize = 2;

/// Pattern miner backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MinerKind {
    /// In-process SPADE implementation
    Builtin,
    /// SPMF's SPADE through `java -jar`
    Spmf,
}

/// Daily sales trend analysis with SPADE sequential patterns
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the transaction log CSV
    /// (columns: Transactional_Id, Sequence_Id, Event_Id, Items)
    #[arg(short, long, default_value = "data.csv")]
    pub input: PathBuf,

    /// Output path for the CSV rule report
    #[arg(short, long, default_value = "hasil_analisis.csv")]
    pub output: PathBuf,

    /// Minimum support as a fraction of all transactions
    #[arg(long, default_value_t = DEFAULT_MIN_SUPPORT)]
    pub min_support: f64,

    /// Minimum confidence for a rule to be reported
    #[arg(long, default_value_t = DEFAULT_MIN_CONFIDENCE)]
    pub min_confidence: f64,

    /// Minimum lift for a rule to be reported
    #[arg(long, default_value_t = DEFAULT_MIN_LIFT)]
    pub min_lift: f64,

    /// TOML item catalog replacing the built-in perfume names
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Pattern miner backend
    #[arg(long, value_enum, default_value_t = MinerKind::Builtin)]
    pub miner: MinerKind,

    /// SPMF jar used by the spmf miner
    #[arg(long, default_value = "spmf/spmf.jar")]
    pub spmf_jar: PathBuf,

    /// Java executable used by the spmf miner
    #[arg(long, default_value = "java")]
    pub java: String,

    /// Seconds the spmf miner may run before the analysis fails
    #[arg(long, default_value = "300")]
    pub timeout_secs: u64,

    /// Keep the encoded database and miner output in this directory
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Assemble the analysis configuration from flags and the optional catalog file
    pub fn analysis_config(&self) -> crate::Result<AnalysisConfig> {
        let catalog = match &self.catalog {
            Some(path) => ItemCatalog::from_toml_file(path)?,
            None => ItemCatalog::perfumes(),
        };

        let config = AnalysisConfig {
            min_support: self.min_support,
            thresholds: Thresholds {
                min_confidence: self.min_confidence,
                min_lift: self.min_lift,
            },
            catalog,
        };
        config.validate()?;
        Ok(config)
    }

    /// Build the selected miner backend
    pub fn build_miner(&self) -> crate::Result<Box<dyn PatternMiner>> {
        match self.miner {
            MinerKind::Builtin => Ok(Box::new(
                SpadeMiner::new().with_max_pattern_len(RULE_PATTERN_LEN),
            )),
            MinerKind::Spmf => Ok(Box::new(
                SpmfMiner::new(&self.java, &self.spmf_jar)?
                    .with_timeout(Duration::from_secs(self.timeout_secs)),
            )),
        }
    }
}
