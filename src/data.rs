//! Transaction log loading using Polars

use std::path::Path;

use polars::prelude::*;
use tracing::debug;

use crate::{AnalysisError, ItemId};

/// Column holding the transaction (day group) identifier
pub const TRANSACTION_ID_COLUMN: &str = "Transactional_Id";
/// Column holding the event order within a day
pub const SEQUENCE_ID_COLUMN: &str = "Sequence_Id";
/// Column holding the position marker; 1 opens a new day
pub const EVENT_ID_COLUMN: &str = "Event_Id";
/// Column holding the sold item id
pub const ITEMS_COLUMN: &str = "Items";

const REQUIRED_COLUMNS: [&str; 4] = [
    TRANSACTION_ID_COLUMN,
    SEQUENCE_ID_COLUMN,
    EVENT_ID_COLUMN,
    ITEMS_COLUMN,
];

/// One row of the transaction log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord {
    pub transaction_id: i64,
    /// Event order within a day
    pub sequence_id: i64,
    /// Position marker; 1 signals the first event of a new day
    pub event_id: i64,
    pub item_id: ItemId,
}

impl RawRecord {
    pub fn new(transaction_id: i64, sequence_id: i64, event_id: i64, item_id: ItemId) -> Self {
        Self {
            transaction_id,
            sequence_id,
            event_id,
            item_id,
        }
    }

    /// Whether this record opens a new day
    pub fn starts_transaction(&self) -> bool {
        self.event_id == 1
    }
}

/// Load the transaction log CSV and sort it for segmentation
///
/// # Arguments
/// * `file_path` - CSV file with `Transactional_Id`, `Sequence_Id`, `Event_Id`
///   and `Items` columns; other columns are ignored
///
/// # Returns
/// * Records stably sorted by (transaction id, sequence id)
pub fn load_records(file_path: impl AsRef<Path>) -> crate::Result<Vec<RawRecord>> {
    let file_path = file_path.as_ref();

    let df = LazyCsvReader::new(file_path)
        .with_has_header(true)
        .finish()?
        .collect()?;

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|name| df.column(name).is_err())
        .collect();
    if !missing.is_empty() {
        return Err(AnalysisError::InputFormat(format!(
            "{} is missing required column(s): {}",
            file_path.display(),
            missing.join(", ")
        )));
    }

    // the Int64 cast below truncates fractions
    for name in REQUIRED_COLUMNS {
        let column = df.column(name)?;
        if !column.dtype().is_float() {
            continue;
        }
        let values = column.cast(&DataType::Float64)?;
        let fractional = values
            .f64()?
            .into_iter()
            .position(|value| value.is_some_and(|v| v.fract() != 0.0));
        if let Some(row) = fractional {
            return Err(AnalysisError::InputFormat(format!(
                "column '{name}' has a non-integer value in row {}",
                row + 1
            )));
        }
    }

    let sorted = df
        .lazy()
        .select(
            REQUIRED_COLUMNS
                .iter()
                .map(|name| col(name).cast(DataType::Int64))
                .collect::<Vec<_>>(),
        )
        .sort(
            [TRANSACTION_ID_COLUMN, SEQUENCE_ID_COLUMN],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;

    let transaction_ids = integer_column(&sorted, TRANSACTION_ID_COLUMN)?;
    let sequence_ids = integer_column(&sorted, SEQUENCE_ID_COLUMN)?;
    let event_ids = integer_column(&sorted, EVENT_ID_COLUMN)?;
    let item_ids = integer_column(&sorted, ITEMS_COLUMN)?;

    let records: Vec<RawRecord> = (0..sorted.height())
        .map(|i| RawRecord::new(transaction_ids[i], sequence_ids[i], event_ids[i], item_ids[i]))
        .collect();

    // -1 and -2 are SPMF delimiters, so item ids must be positive
    if let Some(record) = records.iter().find(|r| r.item_id <= 0) {
        return Err(AnalysisError::InputFormat(format!(
            "column '{ITEMS_COLUMN}' has non-positive item id {} (transaction {}, sequence {})",
            record.item_id, record.transaction_id, record.sequence_id
        )));
    }

    debug!(
        path = %file_path.display(),
        records = records.len(),
        "loaded transaction log"
    );

    Ok(records)
}

/// Extract a fully populated integer column; nulls mean the cell was empty or
/// could not be read as an integer
fn integer_column(df: &DataFrame, name: &str) -> crate::Result<Vec<i64>> {
    let values = df.column(name)?.i64()?;

    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| {
                AnalysisError::InputFormat(format!(
                    "column '{name}' has an empty or non-integer value in sorted row {}",
                    row + 1
                ))
            })
        })
        .collect()
}
