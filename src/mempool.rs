//! Pending transaction pool
//!
//! Transactions waiting to be included in the next block. Nothing is validated on
//! insertion; validity is decided when a block carrying the transaction is
//! connected. Entries stay in the pool until removed explicitly.

use crate::types::*;
use log::debug;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct TransactionPool {
    transactions: HashMap<Hash, Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `tx` under its hash, returning the entry it replaced
    pub fn add_transaction(&mut self, tx: Transaction) -> Option<Transaction> {
        debug!("pool: add tx {}", hex::encode(tx.hash));
        self.transactions.insert(tx.hash, tx)
    }

    pub fn remove_transaction(&mut self, hash: &Hash) -> Option<Transaction> {
        self.transactions.remove(hash)
    }

    pub fn get_transaction(&self, hash: &Hash) -> Option<&Transaction> {
        self.transactions.get(hash)
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.transactions.contains_key(hash)
    }

    /// All pending transactions, ordered by hash
    pub fn transactions(&self) -> Vec<Transaction> {
        let mut transactions: Vec<Transaction> = self.transactions.values().cloned().collect();
        transactions.sort_by(|a, b| a.hash.cmp(&b.hash));
        transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Drop every transaction carried by `block`. Returns how many were removed.
    pub fn remove_confirmed(&mut self, block: &Block) -> usize {
        let removed = block
            .transactions
            .iter()
            .filter(|tx| self.transactions.remove(&tx.hash).is_some())
            .count();
        if removed > 0 {
            debug!("pool: removed {} confirmed transactions", removed);
        }
        removed
    }
}
