//! Transaction validator: the collaborator that vets a block's transactions
//!
//! The ledger only depends on the `TxValidator` trait. `TxHandler` is the default
//! implementation; tests substitute deterministic stubs.

use crate::block::apply_transaction;
use crate::error::Result;
use crate::transaction::{check_transaction, check_tx_inputs, verify_input_signatures};
use crate::types::*;
use crate::utxo::UtxoSet;
use log::trace;

/// Outcome of vetting a batch of transactions against a UTXO set
#[derive(Debug, Clone)]
pub struct HandledTransactions {
    /// Accepted transactions, in the order they were applied
    pub accepted: Vec<Transaction>,
    /// The input set with exactly the accepted transactions applied
    pub utxo_set: UtxoSet,
}

pub trait TxValidator {
    /// Return a maximal mutually valid subset of `txs` together with the set that
    /// results from applying it to `utxo_set`. `utxo_set` itself is left untouched.
    fn handle_txs(&self, utxo_set: &UtxoSet, txs: &[Transaction]) -> Result<HandledTransactions>;
}

/// Default validator: structure, existence, signatures, no double claims, value
/// conservation
#[derive(Debug, Clone, Copy, Default)]
pub struct TxHandler;

impl TxHandler {
    pub fn new() -> Self {
        Self
    }

    /// IsValidTx: 𝒯𝒳 × 𝒰𝒮 → {true, false}
    ///
    /// 1. tx.id = Hash(tx)
    /// 2. tx is structurally valid (`check_transaction`)
    /// 3. every prevout is in us and claimed once, Σ inputs ≥ Σ outputs (`check_tx_inputs`)
    /// 4. every input signature verifies for the recipient of the output it spends
    pub fn is_valid_tx(&self, tx: &Transaction, utxo_set: &UtxoSet) -> Result<bool> {
        // Signatures do not cover the identity, so it is recomputed here
        if tx.hash != tx.calculate_hash() {
            trace!("tx {} rejected: hash does not match contents", hex::encode(tx.hash));
            return Ok(false);
        }

        if let ValidationResult::Invalid(reason) = check_transaction(tx)? {
            trace!("tx {} rejected: {}", hex::encode(tx.hash), reason);
            return Ok(false);
        }

        let (inputs_result, _fee) = check_tx_inputs(tx, utxo_set)?;
        if let ValidationResult::Invalid(reason) = inputs_result {
            trace!("tx {} rejected: {}", hex::encode(tx.hash), reason);
            return Ok(false);
        }

        if !verify_input_signatures(tx, utxo_set)? {
            trace!("tx {} rejected: bad signature", hex::encode(tx.hash));
            return Ok(false);
        }

        Ok(true)
    }
}

impl TxValidator for TxHandler {
    /// Passes over the remaining transactions in batch order until a pass accepts
    /// nothing, so a transaction spending an output created later in the same
    /// batch is still accepted.
    fn handle_txs(&self, utxo_set: &UtxoSet, txs: &[Transaction]) -> Result<HandledTransactions> {
        let mut utxo_set = utxo_set.clone();
        let mut accepted = Vec::with_capacity(txs.len());
        let mut pending: Vec<&Transaction> = txs.iter().collect();

        while !pending.is_empty() {
            let accepted_before = accepted.len();
            let mut remaining = Vec::with_capacity(pending.len());
            for tx in pending {
                if self.is_valid_tx(tx, &utxo_set)? {
                    apply_transaction(tx, &mut utxo_set);
                    accepted.push(tx.clone());
                } else {
                    remaining.push(tx);
                }
            }
            pending = remaining;

            if accepted.len() == accepted_before {
                break;
            }
        }

        Ok(HandledTransactions { accepted, utxo_set })
    }
}
