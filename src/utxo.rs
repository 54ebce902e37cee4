//! Unspent-output set
//!
//! A `UtxoSet` belongs to exactly one block. Branches never share one: every
//! snapshot handed to another block or to a caller is a `clone()`, so spending an
//! output on one fork leaves the sibling's set untouched.

use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// UTXO Set: OutPoint → TransactionOutput
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoSet {
    utxos: HashMap<OutPoint, TransactionOutput>,
}

impl UtxoSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the payload of an unspent output
    pub fn lookup(&self, outpoint: &OutPoint) -> Option<&TransactionOutput> {
        self.utxos.get(outpoint)
    }

    pub fn contains(&self, outpoint: &OutPoint) -> bool {
        self.utxos.contains_key(outpoint)
    }

    /// Insert an output, replacing any previous payload under the same identifier
    pub fn add(&mut self, outpoint: OutPoint, output: TransactionOutput) {
        self.utxos.insert(outpoint, output);
    }

    /// Remove an output, returning it if it was unspent
    pub fn remove(&mut self, outpoint: &OutPoint) -> Option<TransactionOutput> {
        self.utxos.remove(outpoint)
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OutPoint, &TransactionOutput)> {
        self.utxos.iter()
    }

    /// All outpoints, sorted
    pub fn outpoints(&self) -> Vec<OutPoint> {
        let mut outpoints: Vec<OutPoint> = self.utxos.keys().copied().collect();
        outpoints.sort();
        outpoints
    }

    /// Sum of all unspent values, `None` on overflow
    pub fn total_value(&self) -> Option<Integer> {
        self.utxos
            .values()
            .try_fold(0i64, |acc, output| acc.checked_add(output.value))
    }
}

impl FromIterator<(OutPoint, TransactionOutput)> for UtxoSet {
    fn from_iter<I: IntoIterator<Item = (OutPoint, TransactionOutput)>>(iter: I) -> Self {
        Self {
            utxos: iter.into_iter().collect(),
        }
    }
}
