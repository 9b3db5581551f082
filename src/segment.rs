//! Day segmentation of the sorted transaction log

use tracing::{debug, warn};

use crate::data::RawRecord;
use crate::ItemId;

/// Items sold between two day boundaries, in record order
///
/// Never empty when produced by [`segment_transactions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    items: Vec<ItemId>,
}

impl Transaction {
    /// Build a transaction from an item list; `None` if the list is empty
    pub fn new(items: Vec<ItemId>) -> Option<Self> {
        (!items.is_empty()).then_some(Self { items })
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Group records into transactions using `event_id == 1` as the day boundary.
///
/// Records must already be sorted by (transaction id, sequence id). A boundary
/// on the very first record opens the first transaction instead of closing an
/// empty one. Input without any boundary collapses into a single transaction.
pub fn segment_transactions(records: &[RawRecord]) -> Vec<Transaction> {
    let mut transactions = Vec::new();
    let mut current: Vec<ItemId> = Vec::new();
    let mut boundaries = 0usize;

    for record in records {
        if record.starts_transaction() {
            boundaries += 1;
            if !current.is_empty() {
                transactions.push(Transaction {
                    items: std::mem::take(&mut current),
                });
            }
        }
        current.push(record.item_id);
    }

    if !current.is_empty() {
        transactions.push(Transaction { items: current });
    }

    if boundaries == 0 && !records.is_empty() {
        warn!(
            records = records.len(),
            "no Event_Id == 1 markers found; the whole log is treated as a single transaction"
        );
    }

    debug!(
        records = records.len(),
        transactions = transactions.len(),
        "segmented transaction log"
    );

    transactions
}
