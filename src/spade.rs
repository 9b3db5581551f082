//! In-process SPADE miner
//!
//! Vertical id-list mining over the encoded sequence database: every item keeps
//! the itemset positions where it occurs in each sequence, and a pattern is
//! grown one item at a time with a temporal join on those lists. Only sequence
//! extensions are explored; the database holds one item per itemset, so
//! itemset extensions never reach support.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info};

use crate::encode::decode_sequence_line;
use crate::miner::{Pattern, PatternMiner};
use crate::ItemId;

/// Tolerance applied before rounding the support fraction up to a count
const SUPPORT_EPSILON: f64 = 1e-9;

/// Occurrences of a pattern: per sequence, the itemset positions where it can end
type IdList = Vec<(usize, Vec<usize>)>;

/// SPADE-compatible frequent sequential pattern miner
#[derive(Debug, Clone, Default)]
pub struct SpadeMiner {
    max_pattern_len: Option<usize>,
}

impl SpadeMiner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop growing patterns beyond `len` items
    pub fn with_max_pattern_len(mut self, len: usize) -> Self {
        self.max_pattern_len = Some(len);
        self
    }

    pub fn max_pattern_len(&self) -> Option<usize> {
        self.max_pattern_len
    }

    /// Mine already decoded sequences of itemsets
    pub fn mine_sequences(&self, sequences: &[Vec<Vec<ItemId>>], min_support: f64) -> Vec<Pattern> {
        if sequences.is_empty() {
            return Vec::new();
        }
        let min_count = min_support_count(min_support, sequences.len());

        let mut vertical: BTreeMap<ItemId, IdList> = BTreeMap::new();
        for (sid, sequence) in sequences.iter().enumerate() {
            for (position, itemset) in sequence.iter().enumerate() {
                for &item in itemset {
                    let idlist = vertical.entry(item).or_default();
                    match idlist.last_mut() {
                        Some((last_sid, positions)) if *last_sid == sid => {
                            if positions.last() != Some(&position) {
                                positions.push(position);
                            }
                        }
                        _ => idlist.push((sid, vec![position])),
                    }
                }
            }
        }

        let frequent: Vec<(ItemId, IdList)> = vertical
            .into_iter()
            .filter(|(_, idlist)| idlist.len() as u64 >= min_count)
            .collect();

        let mut patterns = Vec::new();
        for (item, idlist) in &frequent {
            let mut prefix = vec![*item];
            patterns.push(Pattern::new(prefix.clone(), idlist.len() as u64));
            self.extend(&mut prefix, idlist, &frequent, min_count, &mut patterns);
        }

        debug!(
            sequences = sequences.len(),
            min_count,
            patterns = patterns.len(),
            "spade mining finished"
        );
        patterns
    }

    fn extend(
        &self,
        prefix: &mut Vec<ItemId>,
        prefix_idlist: &IdList,
        frequent: &[(ItemId, IdList)],
        min_count: u64,
        patterns: &mut Vec<Pattern>,
    ) {
        if self
            .max_pattern_len
            .is_some_and(|max| prefix.len() >= max)
        {
            return;
        }

        for (item, item_idlist) in frequent {
            let joined = temporal_join(prefix_idlist, item_idlist);
            if (joined.len() as u64) < min_count {
                continue;
            }
            prefix.push(*item);
            patterns.push(Pattern::new(prefix.clone(), joined.len() as u64));
            self.extend(prefix, &joined, frequent, min_count, patterns);
            prefix.pop();
        }
    }
}

impl PatternMiner for SpadeMiner {
    fn name(&self) -> &str {
        "spade"
    }

    fn mine(&self, database: &Path, min_support: f64) -> crate::Result<Vec<Pattern>> {
        let reader = BufReader::new(File::open(database)?);
        let mut sequences = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            sequences.push(decode_sequence_line(&line, idx + 1)?);
        }

        info!(
            sequences = sequences.len(),
            min_support,
            max_pattern_len = ?self.max_pattern_len,
            "running in-process SPADE"
        );
        Ok(self.mine_sequences(&sequences, min_support))
    }
}

/// Smallest sequence count that satisfies a relative support, never below 1
pub fn min_support_count(min_support: f64, sequence_count: usize) -> u64 {
    let count = (min_support * sequence_count as f64 - SUPPORT_EPSILON).ceil();
    (count.max(1.0)) as u64
}

/// Sequences where `item` occurs strictly after the earliest end of the prefix
fn temporal_join(prefix: &IdList, item: &IdList) -> IdList {
    let mut joined = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < prefix.len() && j < item.len() {
        let (prefix_sid, prefix_positions) = &prefix[i];
        let (item_sid, item_positions) = &item[j];

        if prefix_sid < item_sid {
            i += 1;
        } else if item_sid < prefix_sid {
            j += 1;
        } else {
            let earliest = prefix_positions[0];
            let later: Vec<usize> = item_positions
                .iter()
                .copied()
                .filter(|&p| p > earliest)
                .collect();
            if !later.is_empty() {
                joined.push((*prefix_sid, later));
            }
            i += 1;
            j += 1;
        }
    }

    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn singletons(days: &[&[ItemId]]) -> Vec<Vec<Vec<ItemId>>> {
        days.iter()
            .map(|day| day.iter().map(|&item| vec![item]).collect())
            .collect()
    }

    fn supports(patterns: &[Pattern]) -> HashMap<Vec<ItemId>, u64> {
        patterns
            .iter()
            .map(|p| (p.items.clone(), p.support))
            .collect()
    }

    #[test]
    fn test_two_day_example() {
        let sequences = singletons(&[&[1, 2, 3], &[1, 2]]);
        let patterns = SpadeMiner::new().mine_sequences(&sequences, 0.5);
        let supports = supports(&patterns);

        assert_eq!(supports[&vec![1]], 2);
        assert_eq!(supports[&vec![2]], 2);
        assert_eq!(supports[&vec![3]], 1);
        assert_eq!(supports[&vec![1, 2]], 2);
        assert_eq!(supports[&vec![1, 3]], 1);
        assert_eq!(supports[&vec![2, 3]], 1);
        assert_eq!(supports[&vec![1, 2, 3]], 1);
        assert!(!supports.contains_key(&vec![2, 1]));
        assert_eq!(patterns.len(), 7);
    }

    #[test]
    fn test_order_matters() {
        let sequences = singletons(&[&[1, 2], &[2, 1], &[2, 1]]);
        let supports = supports(&SpadeMiner::new().mine_sequences(&sequences, 0.5));

        assert_eq!(supports.get(&vec![2, 1]), Some(&2));
        assert_eq!(supports.get(&vec![1, 2]), None);
    }

    #[test]
    fn test_repeated_item_within_a_day() {
        let sequences = singletons(&[&[4, 4], &[4]]);
        let supports = supports(&SpadeMiner::new().mine_sequences(&sequences, 0.5));

        assert_eq!(supports[&vec![4]], 2);
        assert_eq!(supports[&vec![4, 4]], 1);
    }

    #[test]
    fn test_max_pattern_len_caps_growth() {
        let sequences = singletons(&[&[1, 2, 3], &[1, 2, 3]]);
        let patterns = SpadeMiner::new()
            .with_max_pattern_len(2)
            .mine_sequences(&sequences, 1.0);

        assert!(patterns.iter().all(|p| p.len() <= 2));
        assert_eq!(patterns.len(), 6);
    }

    #[test]
    fn test_min_support_count_rounds_up() {
        assert_eq!(min_support_count(0.5, 2), 1);
        assert_eq!(min_support_count(0.5, 3), 2);
        assert_eq!(min_support_count(0.7, 10), 7);
        assert_eq!(min_support_count(1.0, 4), 4);
        assert_eq!(min_support_count(0.01, 5), 1);
    }

    #[test]
    fn test_support_is_anti_monotone() {
        let sequences = singletons(&[&[1, 2, 3, 1], &[3, 1, 2], &[2, 2, 1, 3], &[1, 3]]);
        let patterns = SpadeMiner::new().mine_sequences(&sequences, 0.25);
        let supports = supports(&patterns);

        for pattern in patterns.iter().filter(|p| p.len() > 1) {
            let prefix = &pattern.items[..pattern.len() - 1];
            assert!(supports[prefix] >= pattern.support);
            let last = &pattern.items[pattern.len() - 1..];
            assert!(supports[last] >= pattern.support);
        }
    }

    #[test]
    fn test_mine_reads_encoded_database() {
        let dir = TempDir::new().unwrap();
        let database = dir.path().join("data_spmf.txt");
        std::fs::write(&database, "1 -1 2 -1 3 -1 -2\n1 -1 2 -1 -2\n").unwrap();

        let miner = SpadeMiner::new().with_max_pattern_len(2);
        let patterns = miner.mine(&database, 0.5).unwrap();
        let supports = supports(&patterns);

        assert_eq!(supports[&vec![1, 2]], 2);
        assert_eq!(supports[&vec![3]], 1);
    }

    #[test]
    fn test_empty_database() {
        assert!(SpadeMiner::new().mine_sequences(&[], 0.5).is_empty());
    }
}
