//! Directional association rules scored from mined sequential patterns

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::{ItemCatalog, Thresholds};
use crate::miner::Pattern;
use crate::report::{conclusion_for, RuleRow};
use crate::ItemId;

/// An item pair rule `antecedent -> consequent` with its measures
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub antecedent: ItemId,
    pub consequent: ItemId,
    /// Support of the antecedent alone
    pub support_a: u64,
    /// Support of the consequent alone
    pub support_b: u64,
    /// Support of the ordered pair
    pub support_ab: u64,
    pub confidence: f64,
    pub lift: f64,
}

/// Undefined ratios count as zero.
///
/// A pair can be reported without one of its items ever being frequent alone,
/// and an empty population has no baseline; both score 0 instead of failing.
pub fn undefined_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Scores two-item patterns against their single-item baselines
#[derive(Debug, Clone)]
pub struct RuleScorer {
    thresholds: Thresholds,
    catalog: ItemCatalog,
}

impl RuleScorer {
    pub fn new(thresholds: Thresholds, catalog: ItemCatalog) -> Self {
        Self {
            thresholds,
            catalog,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    /// Every two-item pattern as a rule, in miner order, before filtering
    pub fn candidates(&self, patterns: &[Pattern], total_transactions: usize) -> Vec<Rule> {
        let mut single_supports: HashMap<ItemId, u64> = HashMap::new();
        for pattern in patterns.iter().filter(|p| p.len() == 1) {
            // first report wins
            single_supports
                .entry(pattern.items[0])
                .or_insert(pattern.support);
        }

        patterns
            .iter()
            .filter(|p| p.len() == 2)
            .map(|pattern| {
                let (antecedent, consequent) = (pattern.items[0], pattern.items[1]);
                let support_a = single_supports.get(&antecedent).copied().unwrap_or(0);
                let support_b = single_supports.get(&consequent).copied().unwrap_or(0);
                let support_ab = pattern.support;

                if support_ab > support_a && support_a > 0 {
                    warn!(
                        antecedent,
                        consequent, support_a, support_ab, "pair support exceeds antecedent support"
                    );
                }

                let confidence = undefined_ratio(support_ab as f64, support_a as f64);
                let baseline = undefined_ratio(support_b as f64, total_transactions as f64);
                let lift = undefined_ratio(confidence, baseline);

                Rule {
                    antecedent,
                    consequent,
                    support_a,
                    support_b,
                    support_ab,
                    confidence,
                    lift,
                }
            })
            .collect()
    }

    /// Rules passing both thresholds, in miner order
    pub fn score(&self, patterns: &[Pattern], total_transactions: usize) -> Vec<Rule> {
        let candidates = self.candidates(patterns, total_transactions);
        let considered = candidates.len();

        let rules: Vec<Rule> = candidates
            .into_iter()
            .filter(|rule| self.thresholds.accepts(rule.confidence, rule.lift))
            .collect();

        debug!(
            candidates = considered,
            accepted = rules.len(),
            total_transactions,
            "scored rules"
        );
        rules
    }

    /// Table rows and conclusion sentences for accepted rules
    pub fn render(&self, rules: &[Rule]) -> (Vec<RuleRow>, Vec<String>) {
        let rows = rules
            .iter()
            .map(|rule| RuleRow::from_rule(rule, &self.catalog))
            .collect();
        let conclusions = rules
            .iter()
            .map(|rule| conclusion_for(rule, &self.catalog))
            .collect();
        (rows, conclusions)
    }
}
