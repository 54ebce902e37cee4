//! Thread-safe handle over a `Blockchain`
//!
//! Every call holds the lock for its full duration, so block additions and pool
//! insertions from different threads are serialized. Snapshot reads clone under
//! the lock and are independent of the ledger afterwards.

use crate::blockchain::Blockchain;
use crate::error::Result;
use crate::mempool::TransactionPool;
use crate::types::*;
use crate::utxo::UtxoSet;
use crate::validator::{TxHandler, TxValidator};
use parking_lot::Mutex;
use std::sync::Arc;

pub struct SharedBlockchain<V: TxValidator = TxHandler> {
    inner: Arc<Mutex<Blockchain<V>>>,
}

// Derived Clone would require V: Clone
impl<V: TxValidator> Clone for SharedBlockchain<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: TxValidator> From<Blockchain<V>> for SharedBlockchain<V> {
    fn from(chain: Blockchain<V>) -> Self {
        Self::new(chain)
    }
}

impl<V: TxValidator> SharedBlockchain<V> {
    pub fn new(chain: Blockchain<V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(chain)),
        }
    }

    pub fn add_block(&self, block: Block) -> bool {
        self.inner.lock().add_block(block)
    }

    pub fn process_block(&self, block: Block) -> Result<Hash> {
        self.inner.lock().process_block(block)
    }

    pub fn add_transaction(&self, tx: Transaction) {
        self.inner.lock().add_transaction(tx);
    }

    pub fn produce_block(&self, recipient: ByteString) -> Result<Block> {
        self.inner.lock().produce_block(recipient)
    }

    pub fn best_block(&self) -> Block {
        self.inner.lock().best_block().clone()
    }

    pub fn best_height(&self) -> Natural {
        self.inner.lock().best_height()
    }

    pub fn best_utxo_set(&self) -> UtxoSet {
        self.inner.lock().best_utxo_set()
    }

    /// Run `f` against the pending pool while holding the lock
    pub fn with_pending_pool<R>(&self, f: impl FnOnce(&mut TransactionPool) -> R) -> R {
        f(self.inner.lock().pending_pool_mut())
    }

    /// Run `f` against the whole ledger while holding the lock
    pub fn with_chain<R>(&self, f: impl FnOnce(&mut Blockchain<V>) -> R) -> R {
        let mut chain = self.inner.lock();
        f(&mut *chain)
    }
}
