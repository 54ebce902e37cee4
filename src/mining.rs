//! Block assembly from the pending pool

use crate::error::{LedgerError, Result};
use crate::transaction::is_coinbase;
use crate::types::*;
use crate::utxo::UtxoSet;
use crate::validator::TxValidator;
use log::debug;

/// CreateNewBlock: 𝒰𝒮 × 𝒯𝒳* → ℬ
///
/// For a parent with UTXO set us and pending transactions txs:
/// 1. Let (accepted, _) = validator(us, txs)
/// 2. Build a block on `parent_hash` with `coinbase` followed by accepted, in the
///    order the validator applied them
/// 3. Finalize and return it
///
/// Pending transactions the validator rejects are simply left out, so the result
/// always connects to `parent_utxo_set` with the same validator.
pub fn create_new_block<V: TxValidator>(
    validator: &V,
    parent_hash: Hash,
    parent_utxo_set: &UtxoSet,
    pending: &[Transaction],
    coinbase: Transaction,
) -> Result<Block> {
    if !is_coinbase(&coinbase) {
        return Err(LedgerError::InvalidCoinbase(
            "coinbase must have no inputs and exactly one output".to_string(),
        ));
    }

    let handled = validator.handle_txs(parent_utxo_set, pending)?;
    debug!(
        "assembling block on {}: {} of {} pending transactions selected",
        hex::encode(parent_hash),
        handled.accepted.len(),
        pending.len()
    );

    let mut block = Block::with_coinbase(Some(parent_hash), coinbase);
    for tx in handled.accepted {
        block.add_transaction(tx);
    }
    block.finalize();
    Ok(block)
}
