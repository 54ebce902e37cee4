//! # Fork-Ledger
//!
//! In-memory block ledger that tracks every fork within a bounded window behind
//! the best tip.
//!
//! Each retained block owns the unspent-output set produced by connecting it to
//! its parent, so a new block is always validated against the state of the branch
//! it extends. Blocks whose parent lags more than `cut_off_age` blocks behind the
//! best height are refused.
//!
//! ## Architecture
//!
//! - `types`, `transaction`, `block`: data model, identities and signing data
//! - `utxo`: the unspent-output set
//! - `validator`: the `TxValidator` seam and its default `TxHandler`
//! - `mempool`: the shared pending pool
//! - `blockchain`: the fork tree, best tip bookkeeping and pruning
//! - `mining`: block assembly from the pending pool
//! - `sync`: a lock-guarded handle for concurrent hosts
//!
//! ## Usage
//!
//! ```rust
//! use fork_ledger::{Block, Blockchain, Transaction};
//!
//! let mut genesis = Block::with_coinbase(None, Transaction::coinbase(25, vec![0x02; 33]));
//! let genesis_hash = genesis.finalize();
//!
//! let mut chain = Blockchain::new(genesis).unwrap();
//! assert_eq!(chain.best_height(), 1);
//! assert_eq!(chain.best_utxo_set().len(), 1);
//!
//! let mut block = Block::with_coinbase(
//!     Some(genesis_hash),
//!     Transaction::coinbase_at(2, 25, vec![0x03; 33]),
//! );
//! block.finalize();
//! assert!(chain.add_block(block));
//! assert_eq!(chain.best_height(), 2);
//! ```

pub mod types;
pub mod constants;
pub mod error;
pub mod utxo;
pub mod transaction;
pub mod block;
pub mod validator;
pub mod mempool;
pub mod config;
pub mod blockchain;
pub mod mining;
pub mod sync;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use error::{LedgerError, Result};
pub use utxo::UtxoSet;
pub use validator::{HandledTransactions, TxHandler, TxValidator};
pub use mempool::TransactionPool;
pub use config::ChainConfig;
pub use blockchain::Blockchain;
pub use sync::SharedBlockchain;
