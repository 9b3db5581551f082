//! SPMF sequence database encoding
//!
//! Each transaction becomes one line. Every item is terminated as its own
//! itemset with `-1`, and the sequence ends with `-2`:
//!
//! ```text
//! 1 -1 2 -1 3 -1 -2
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::segment::Transaction;
use crate::{AnalysisError, ItemId};

/// Separator written between items
pub const ITEMSET_SEPARATOR: &str = " -1 ";
/// Token closing the sequence
pub const END_OF_SEQUENCE: &str = " -2";

const ITEMSET_TOKEN: &str = "-1";
const SEQUENCE_TOKEN: &str = "-2";

/// Encode one transaction as a database line, without the trailing newline
pub fn encode_transaction(transaction: &Transaction) -> String {
    let items: Vec<String> = transaction.items().iter().map(ItemId::to_string).collect();
    // the last item is terminated too, so the line ends "-1 -2"
    format!(
        "{}{}{}",
        items.join(ITEMSET_SEPARATOR),
        ITEMSET_SEPARATOR.trim_end(),
        END_OF_SEQUENCE
    )
}

/// Write all transactions to `writer`, one newline-terminated line each
pub fn encode_transactions<W: Write>(transactions: &[Transaction], mut writer: W) -> crate::Result<()> {
    for transaction in transactions {
        writeln!(writer, "{}", encode_transaction(transaction))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the sequence database file consumed by the pattern miner
pub fn write_sequence_database(transactions: &[Transaction], path: impl AsRef<Path>) -> crate::Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    encode_transactions(transactions, BufWriter::new(file))?;

    debug!(
        path = %path.display(),
        sequences = transactions.len(),
        "wrote sequence database"
    );
    Ok(())
}

/// Decode one database line into its itemsets
///
/// `line_no` is 1-based and only used for error reporting.
pub fn decode_sequence_line(line: &str, line_no: usize) -> crate::Result<Vec<Vec<ItemId>>> {
    let malformed = |reason: String| AnalysisError::SequenceFormat {
        line: line_no,
        reason,
    };

    let mut itemsets = Vec::new();
    let mut current = Vec::new();
    let mut tokens = line.split_whitespace();

    loop {
        match tokens.next() {
            Some(ITEMSET_TOKEN) => {
                if current.is_empty() {
                    return Err(malformed("empty itemset".to_string()));
                }
                itemsets.push(std::mem::take(&mut current));
            }
            Some(SEQUENCE_TOKEN) => break,
            Some(token) => {
                let item: ItemId = token
                    .parse()
                    .map_err(|_| malformed(format!("'{token}' is not an item id")))?;
                current.push(item);
            }
            None => return Err(malformed("missing end-of-sequence marker -2".to_string())),
        }
    }

    if !current.is_empty() {
        return Err(malformed("itemset not terminated by -1".to_string()));
    }
    if let Some(extra) = tokens.next() {
        return Err(malformed(format!("unexpected '{extra}' after -2")));
    }

    Ok(itemsets)
}

/// Count the sequences in a database file: non-blank lines carrying `-2`
pub fn count_sequences(path: impl AsRef<Path>) -> crate::Result<usize> {
    let reader = BufReader::new(File::open(path)?);
    let mut count = 0;
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() && line.contains(SEQUENCE_TOKEN) {
            count += 1;
        }
    }
    Ok(count)
}
