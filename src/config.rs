//! Analysis configuration: mining thresholds and the item catalog

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{AnalysisError, ItemId};

/// Default minimum support, as a fraction of all transactions
pub const DEFAULT_MIN_SUPPORT: f64 = 0.5;
/// Default minimum confidence for an emitted rule
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.8;
/// Default minimum lift for an emitted rule
pub const DEFAULT_MIN_LIFT: f64 = 0.95;

/// Rule acceptance thresholds, compared at full precision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub min_confidence: f64,
    pub min_lift: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            min_lift: DEFAULT_MIN_LIFT,
        }
    }
}

impl Thresholds {
    /// Whether a rule with these ratios passes both thresholds
    pub fn accepts(&self, confidence: f64, lift: f64) -> bool {
        confidence >= self.min_confidence && lift >= self.min_lift
    }
}

/// Static mapping from item id to display name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemCatalog {
    names: BTreeMap<ItemId, String>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    items: BTreeMap<String, String>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The perfume catalog the analysis ships with
    pub fn perfumes() -> Self {
        [
            (1, "Bacaros"),
            (2, "Je Premium"),
            (3, "Armor"),
            (4, "Oel Steel"),
            (5, "Boss Ar"),
            (6, "Fortune"),
            (7, "Haizelia"),
        ]
        .into_iter()
        .collect()
    }

    /// Load a catalog from a TOML file of the form:
    ///
    /// ```toml
    /// [items]
    /// 1 = "Bacaros"
    /// 2 = "Je Premium"
    /// ```
    pub fn from_toml_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text).map_err(|err| match err {
            AnalysisError::Configuration(msg) => {
                AnalysisError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn from_toml_str(text: &str) -> crate::Result<Self> {
        let file: CatalogFile = toml::from_str(text)
            .map_err(|e| AnalysisError::Configuration(format!("invalid item catalog: {e}")))?;

        let mut catalog = Self::new();
        for (key, name) in file.items {
            let id: ItemId = key.trim().parse().map_err(|_| {
                AnalysisError::Configuration(format!("item catalog key '{key}' is not an integer id"))
            })?;
            catalog.insert(id, name);
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, id: ItemId, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    /// Display name for an id, if the catalog knows it
    pub fn name(&self, id: ItemId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(ItemId, S)> for ItemCatalog {
    fn from_iter<I: IntoIterator<Item = (ItemId, S)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(|(id, name)| (id, name.into())).collect(),
        }
    }
}

/// Everything a run needs besides its input file and miner
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Minimum support as a fraction of total transactions, in (0, 1]
    pub min_support: f64,
    pub thresholds: Thresholds,
    pub catalog: ItemCatalog,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_support: DEFAULT_MIN_SUPPORT,
            thresholds: Thresholds::default(),
            catalog: ItemCatalog::perfumes(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.min_support > 0.0 && self.min_support <= 1.0) {
            return Err(AnalysisError::Configuration(format!(
                "minimum support must be in (0, 1], got {}",
                self.min_support
            )));
        }
        for (label, value) in [
            ("minimum confidence", self.thresholds.min_confidence),
            ("minimum lift", self.thresholds.min_lift),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalysisError::Configuration(format!(
                    "{label} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
