//! Frequent sequential pattern miner boundary
//!
//! A miner takes the encoded sequence database and a minimum support fraction
//! and reports every frequent pattern with its support count. Output follows
//! the SPMF text convention, one pattern per line:
//!
//! ```text
//! 1 -1 #SUP: 2
//! 1 -1 2 -1 #SUP: 2
//! ```

use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::{AnalysisError, ItemId};

/// File the external miner writes its patterns to, next to the database
pub const OUTPUT_FILE_NAME: &str = "output_spade.txt";
/// File capturing the external miner's stderr
pub const STDERR_FILE_NAME: &str = "miner_stderr.log";
/// Default limit for one external miner run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const SUPPORT_MARKER: &str = "#SUP:";
const ITEMSET_TOKEN: &str = "-1";
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A frequent sequential pattern and the number of sequences containing it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    /// Items in temporal order
    pub items: Vec<ItemId>,
    pub support: u64,
}

impl Pattern {
    pub fn new(items: Vec<ItemId>, support: u64) -> Self {
        Self { items, support }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Render in SPMF output form, e.g. `1 -1 2 -1 #SUP: 2`
    pub fn to_spmf_line(&self) -> String {
        let mut line = String::new();
        for item in &self.items {
            line.push_str(&item.to_string());
            line.push_str(" -1 ");
        }
        line.push_str(SUPPORT_MARKER);
        line.push(' ');
        line.push_str(&self.support.to_string());
        line
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_spmf_line())
    }
}

/// Anything that can mine frequent sequential patterns from a sequence database
pub trait PatternMiner {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Mine `database` with `min_support` given as a fraction of all sequences
    fn mine(&self, database: &Path, min_support: f64) -> crate::Result<Vec<Pattern>>;
}

/// Parse one miner output line; `line_no` is 1-based
///
/// Every itemset must hold exactly one item, since the database never puts
/// two items in the same time slot.
pub fn parse_pattern_line(line: &str, line_no: usize) -> crate::Result<Pattern> {
    let malformed = || AnalysisError::MinerOutput {
        line: line_no,
        content: line.to_string(),
    };

    let (sequence, support) = line.split_once(SUPPORT_MARKER).ok_or_else(malformed)?;
    let support: u64 = support.trim().parse().map_err(|_| malformed())?;

    let mut items = Vec::new();
    let mut pending: Option<ItemId> = None;
    for token in sequence.split_whitespace() {
        if token == ITEMSET_TOKEN {
            items.push(pending.take().ok_or_else(malformed)?);
        } else if pending.is_some() {
            return Err(malformed());
        } else {
            pending = Some(token.parse().map_err(|_| malformed())?);
        }
    }

    if pending.is_some() || items.is_empty() {
        return Err(malformed());
    }

    Ok(Pattern::new(items, support))
}

/// Parse full miner output, skipping blank lines
pub fn parse_patterns(output: &str) -> crate::Result<Vec<Pattern>> {
    output
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| parse_pattern_line(line, idx + 1))
        .collect()
}

/// Runs an SPMF algorithm (SPADE by default) as a subprocess
#[derive(Debug, Clone)]
pub struct SpmfMiner {
    program: OsString,
    launcher_args: Vec<OsString>,
    algorithm: String,
    timeout: Duration,
}

impl SpmfMiner {
    /// Launch SPMF as `<java> -jar <jar>`
    pub fn new(java: impl Into<OsString>, jar: impl AsRef<Path>) -> crate::Result<Self> {
        let jar = jar.as_ref();
        if !jar.is_file() {
            return Err(AnalysisError::MinerInvocation(format!(
                "SPMF jar not found at {}",
                jar.display()
            )));
        }
        Ok(Self::with_launcher(
            java,
            [OsString::from("-jar"), jar.as_os_str().to_os_string()],
        ))
    }

    /// Launch SPMF through an arbitrary program and leading arguments.
    ///
    /// The miner appends `run <algorithm> <input> <output> <min_support>`.
    pub fn with_launcher<I, S>(program: impl Into<OsString>, launcher_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            launcher_args: launcher_args.into_iter().map(Into::into).collect(),
            algorithm: "SPADE".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = algorithm.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait for the child, killing it once the timeout expires
    fn wait_with_timeout(&self, child: &mut std::process::Child) -> crate::Result<ExitStatus> {
        // a timeout too large to represent means no deadline
        let deadline = Instant::now().checked_add(self.timeout);
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                // the child may exit between try_wait and kill
                let _ = child.kill();
                let _ = child.wait();
                return Err(AnalysisError::MinerTimeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl PatternMiner for SpmfMiner {
    fn name(&self) -> &str {
        "spmf"
    }

    fn mine(&self, database: &Path, min_support: f64) -> crate::Result<Vec<Pattern>> {
        let output_path = database.with_file_name(OUTPUT_FILE_NAME);
        let stderr_path = database.with_file_name(STDERR_FILE_NAME);
        if output_path.exists() {
            fs::remove_file(&output_path)?;
        }

        let mut command = Command::new(&self.program);
        command
            .args(&self.launcher_args)
            .arg("run")
            .arg(&self.algorithm)
            .arg(database)
            .arg(&output_path)
            .arg(min_support.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(File::create(&stderr_path)?));

        info!(algorithm = %self.algorithm, min_support, "running SPMF");
        debug!(command = ?command, "spawning miner");

        let mut child = command.spawn().map_err(|e| {
            let program = self.program.to_string_lossy();
            if e.kind() == io::ErrorKind::NotFound {
                AnalysisError::MinerInvocation(format!("miner program '{program}' not found"))
            } else {
                AnalysisError::MinerInvocation(format!("failed to start '{program}': {e}"))
            }
        })?;

        let status = self.wait_with_timeout(&mut child)?;
        let stderr = fs::read_to_string(&stderr_path).unwrap_or_default();

        if !status.success() {
            return Err(AnalysisError::MinerInvocation(format!(
                "{} exited with {}: {}",
                self.algorithm,
                status,
                stderr.trim()
            )));
        }

        let output = match fs::read_to_string(&output_path) {
            Ok(output) => output,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(AnalysisError::MinerInvocation(format!(
                    "{} produced no output file: {}",
                    self.algorithm,
                    stderr.trim()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let patterns = parse_patterns(&output)?;
        debug!(patterns = patterns.len(), "parsed miner output");
        Ok(patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_single_and_pair_patterns() {
        assert_eq!(
            parse_pattern_line("1 -1 #SUP: 2", 1).unwrap(),
            Pattern::new(vec![1], 2)
        );
        assert_eq!(
            parse_pattern_line("3 -1 12 -1 #SUP: 17", 1).unwrap(),
            Pattern::new(vec![3, 12], 17)
        );
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        let bad = [
            "1 -1 2 -1",
            "1 -1 #SUP: two",
            "#SUP: 3",
            "1 2 -1 #SUP: 3",
            "1 -1 2 #SUP: 3",
            "a -1 #SUP: 1",
        ];
        for line in bad {
            let err = parse_pattern_line(line, 4).unwrap_err();
            assert!(
                matches!(err, AnalysisError::MinerOutput { line: 4, .. }),
                "line {line:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_patterns_aborts_on_first_bad_line() {
        let output = "1 -1 #SUP: 2\n\n2 -1 #SUP: 2\n1 -1 2 -1\n";
        let err = parse_patterns(output).unwrap_err();
        assert!(matches!(err, AnalysisError::MinerOutput { line: 4, .. }));

        let ok = parse_patterns("1 -1 #SUP: 2\n\n1 -1 2 -1 #SUP: 2\n").unwrap();
        assert_eq!(ok.len(), 2);
    }

    #[test]
    fn test_spmf_line_parses_back() {
        let pattern = Pattern::new(vec![5, 6], 9);
        assert_eq!(pattern.to_spmf_line(), "5 -1 6 -1 #SUP: 9");
        assert_eq!(parse_pattern_line(&pattern.to_spmf_line(), 1).unwrap(), pattern);
    }

    #[test]
    fn test_missing_jar_is_invocation_error() {
        let dir = TempDir::new().unwrap();
        let result = SpmfMiner::new("java", dir.path().join("spmf.jar"));
        assert!(matches!(result, Err(AnalysisError::MinerInvocation(_))));
    }

    #[test]
    fn test_missing_program_is_invocation_error() {
        let dir = TempDir::new().unwrap();
        let database = dir.path().join("data_spmf.txt");
        fs::write(&database, "1 -1 -2\n").unwrap();

        let miner = SpmfMiner::with_launcher("trendforge-no-such-miner", Vec::<OsString>::new());
        let err = miner.mine(&database, 0.5).unwrap_err();
        assert!(matches!(err, AnalysisError::MinerInvocation(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_subprocess_output_is_parsed() {
        let dir = TempDir::new().unwrap();
        let database = dir.path().join("data_spmf.txt");
        fs::write(&database, "1 -1 2 -1 -2\n1 -1 2 -1 -2\n").unwrap();

        // $0=run $1=SPADE $2=input $3=output $4=minsup
        let script = r#"test "$1" = SPADE && test "$4" = 0.5 && printf '1 -1 #SUP: 2\n2 -1 #SUP: 2\n1 -1 2 -1 #SUP: 2\n' > "$3""#;
        let miner = SpmfMiner::with_launcher("sh", ["-c", script]);

        let patterns = miner.mine(&database, 0.5).unwrap();
        assert_eq!(
            patterns,
            vec![
                Pattern::new(vec![1], 2),
                Pattern::new(vec![2], 2),
                Pattern::new(vec![1, 2], 2),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_invocation_error() {
        let dir = TempDir::new().unwrap();
        let database = dir.path().join("data_spmf.txt");
        fs::write(&database, "1 -1 -2\n").unwrap();

        let miner = SpmfMiner::with_launcher("sh", ["-c", "echo 'bad minsup' >&2; exit 3"]);
        match miner.mine(&database, 0.5).unwrap_err() {
            AnalysisError::MinerInvocation(msg) => assert!(msg.contains("bad minsup")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_malformed_subprocess_output_aborts() {
        let dir = TempDir::new().unwrap();
        let database = dir.path().join("data_spmf.txt");
        fs::write(&database, "1 -1 -2\n").unwrap();

        let miner = SpmfMiner::with_launcher("sh", ["-c", r#"printf '1 -1 #SUP: 1\n1 -1 2 -1\n' > "$3""#]);
        let err = miner.mine(&database, 0.5).unwrap_err();
        assert!(matches!(err, AnalysisError::MinerOutput { line: 2, .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_miner() {
        let dir = TempDir::new().unwrap();
        let database = dir.path().join("data_spmf.txt");
        fs::write(&database, "1 -1 -2\n").unwrap();

        let miner = SpmfMiner::with_launcher("sh", ["-c", "sleep 5"])
            .with_timeout(Duration::from_millis(200));
        let started = Instant::now();
        let err = miner.mine(&database, 0.5).unwrap_err();

        assert!(matches!(err, AnalysisError::MinerTimeout(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn test_huge_timeout_waits_for_miner() {
        let dir = TempDir::new().unwrap();
        let database = dir.path().join("data_spmf.txt");
        fs::write(&database, "1 -1 -2\n").unwrap();

        let miner = SpmfMiner::with_launcher("sh", ["-c", r#"printf '1 -1 #SUP: 1\n' > "$3""#])
            .with_timeout(Duration::from_secs(u64::MAX));

        let patterns = miner.mine(&database, 0.5).unwrap();
        assert_eq!(patterns, vec![Pattern::new(vec![1], 1)]);
    }
}
