//! Fork tree: retained blocks, per-block UTXO snapshots and the best tip
//!
//! Every retained block owns the UTXO set that results from connecting it to its
//! parent. A candidate is validated against its parent's set, never against the
//! best tip's, so competing forks evolve independently. A candidate is only
//! admitted while its parent is within `cut_off_age` blocks of the best height.

use crate::block::connect_block;
use crate::config::ChainConfig;
use crate::constants::{COINBASE_REWARD, GENESIS_HEIGHT};
use crate::error::{LedgerError, Result};
use crate::mempool::TransactionPool;
use crate::mining::create_new_block;
use crate::types::*;
use crate::utxo::UtxoSet;
use crate::validator::{TxHandler, TxValidator};
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap, HashSet};

struct BlockEntry {
    block: Block,
    height: Natural,
    utxo_set: UtxoSet,
}

pub struct Blockchain<V: TxValidator = TxHandler> {
    blocks: HashMap<Hash, BlockEntry>,
    // Retained block hashes by height
    heights: BTreeMap<Natural, Vec<Hash>>,
    // Floor of the last pruning pass. Below it, at most one block per height is
    // left and those blocks form a single chain.
    pruned_floor: Natural,
    genesis_hash: Hash,
    // First block accepted at `best_height`
    best_hash: Hash,
    best_height: Natural,
    tx_pool: TransactionPool,
    validator: V,
    config: ChainConfig,
}

impl Blockchain<TxHandler> {
    /// Create a ledger holding only `genesis`, with the default configuration
    pub fn new(genesis: Block) -> Result<Self> {
        Self::with_config(genesis, ChainConfig::default())
    }

    pub fn with_config(genesis: Block, config: ChainConfig) -> Result<Self> {
        Self::with_validator(genesis, config, TxHandler::new())
    }
}

impl<V: TxValidator> Blockchain<V> {
    /// Create a ledger holding only `genesis`. Genesis is trusted: its ordinary
    /// transactions are not validated and only its coinbase output is spendable.
    pub fn with_validator(genesis: Block, config: ChainConfig, validator: V) -> Result<Self> {
        let genesis_hash = genesis.hash.ok_or(LedgerError::MissingBlockHash)?;
        let (outpoint, output) = genesis.coinbase_utxo()?;

        let mut utxo_set = UtxoSet::new();
        utxo_set.add(outpoint, output);

        let mut blocks = HashMap::new();
        blocks.insert(
            genesis_hash,
            BlockEntry {
                block: genesis,
                height: GENESIS_HEIGHT,
                utxo_set,
            },
        );

        let mut heights = BTreeMap::new();
        heights.insert(GENESIS_HEIGHT, vec![genesis_hash]);

        info!(
            "ledger initialized at genesis {} (cut_off_age {}, pruning {})",
            hex::encode(genesis_hash),
            config.cut_off_age,
            config.prune_stale_forks
        );

        Ok(Self {
            blocks,
            heights,
            pruned_floor: GENESIS_HEIGHT,
            genesis_hash,
            best_hash: genesis_hash,
            best_height: GENESIS_HEIGHT,
            tx_pool: TransactionPool::new(),
            validator,
            config,
        })
    }

    /// A block at the best height. Among equal-height blocks, the first accepted.
    pub fn best_block(&self) -> &Block {
        &self.best_entry().block
    }

    pub fn best_block_hash(&self) -> Hash {
        self.best_hash
    }

    pub fn best_height(&self) -> Natural {
        self.best_height
    }

    /// An independent copy of the best block's UTXO set, safe to mutate
    pub fn best_utxo_set(&self) -> UtxoSet {
        self.best_entry().utxo_set.clone()
    }

    /// The shared pending pool
    pub fn pending_pool(&self) -> &TransactionPool {
        &self.tx_pool
    }

    pub fn pending_pool_mut(&mut self) -> &mut TransactionPool {
        &mut self.tx_pool
    }

    pub fn genesis_hash(&self) -> Hash {
        self.genesis_hash
    }

    pub fn get_block(&self, hash: &Hash) -> Option<&Block> {
        self.blocks.get(hash).map(|entry| &entry.block)
    }

    pub fn height_of(&self, hash: &Hash) -> Option<Natural> {
        self.blocks.get(hash).map(|entry| entry.height)
    }

    /// An independent copy of the UTXO set recorded for `hash`
    pub fn utxo_set_of(&self, hash: &Hash) -> Option<UtxoSet> {
        self.blocks.get(hash).map(|entry| entry.utxo_set.clone())
    }

    pub fn contains_block(&self, hash: &Hash) -> bool {
        self.blocks.contains_key(hash)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    /// Whether `hash` is the best block or one of its retained ancestors
    pub fn is_on_best_chain(&self, hash: &Hash) -> bool {
        self.best_chain().contains(hash)
    }

    /// Add `block` if it is valid. Returns false, leaving the ledger untouched,
    /// on any rejection.
    pub fn add_block(&mut self, block: Block) -> bool {
        let hash = block.hash;
        match self.process_block(block) {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    "block {} rejected: {}",
                    hash.map(hex::encode).unwrap_or_else(|| "<unfinalized>".to_string()),
                    e
                );
                false
            }
        }
    }

    /// Add `block`, reporting why it was rejected.
    ///
    /// 1. The block has an identity hash not already retained
    /// 2. Its parent is retained
    /// 3. best_height − parent_height ≤ cut_off_age
    /// 4. Its coinbase commits to parent_height + 1 in `lock_time`
    /// 5. All its transactions are valid against the parent's UTXO set and its
    ///    coinbase is well formed
    /// 6. It is stored at parent_height + 1 with its own UTXO set; the best tip
    ///    moves only if the parent was the best height
    pub fn process_block(&mut self, block: Block) -> Result<Hash> {
        let hash = block.hash.ok_or(LedgerError::MissingBlockHash)?;
        if self.blocks.contains_key(&hash) {
            return Err(LedgerError::DuplicateBlock(hex::encode(hash)));
        }

        let parent_hash = block
            .prev_block_hash
            .ok_or_else(|| LedgerError::UnknownParent("<none>".to_string()))?;
        let parent = self
            .blocks
            .get(&parent_hash)
            .ok_or_else(|| LedgerError::UnknownParent(hex::encode(parent_hash)))?;

        let parent_height = parent.height;
        if self.best_height.saturating_sub(parent_height) > self.config.cut_off_age {
            return Err(LedgerError::ForkTooDeep {
                parent_height,
                best_height: self.best_height,
                cut_off_age: self.config.cut_off_age,
            });
        }

        // Distinct heights keep coinbase identities unique along a branch
        let height = parent_height + 1;
        if block.coinbase.lock_time != height {
            return Err(LedgerError::InvalidCoinbase(format!(
                "coinbase commits to height {} but the block is at height {}",
                block.coinbase.lock_time, height
            )));
        }

        let utxo_set = connect_block(&block, &parent.utxo_set, &self.validator)?;

        let tx_count = block.transactions.len();
        self.blocks.insert(
            hash,
            BlockEntry {
                block,
                height,
                utxo_set,
            },
        );
        self.heights.entry(height).or_default().push(hash);

        if parent_height == self.best_height {
            self.best_height = height;
            self.best_hash = hash;
            info!(
                "new best block {} at height {} ({} txs)",
                hex::encode(hash),
                height,
                tx_count
            );
        } else {
            debug!(
                "block {} stored on a fork at height {} (best {})",
                hex::encode(hash),
                height,
                self.best_height
            );
        }

        if self.config.prune_stale_forks {
            self.prune_stale_forks();
        }

        Ok(hash)
    }

    /// Add `tx` to the pending pool, replacing any transaction with the same hash.
    /// No validation happens here.
    pub fn add_transaction(&mut self, tx: Transaction) {
        self.tx_pool.add_transaction(tx);
    }

    /// Assemble a block on the best tip from the pending pool, paying the coinbase
    /// reward to `recipient`, and add it. Pool entries are left in place.
    pub fn produce_block(&mut self, recipient: ByteString) -> Result<Block> {
        let coinbase = Transaction::coinbase_at(self.best_height + 1, COINBASE_REWARD, recipient);
        let block = create_new_block(
            &self.validator,
            self.best_hash,
            &self.best_entry().utxo_set,
            &self.tx_pool.transactions(),
            coinbase,
        )?;
        self.process_block(block.clone())?;
        Ok(block)
    }

    /// Drop blocks that can never be extended again: below
    /// `best_height − cut_off_age` and not on the best chain. Genesis is kept.
    /// Returns the number of blocks dropped.
    ///
    /// Only the heights between the previous and the current floor are scanned,
    /// plus whatever an abandoned best chain left below them.
    pub fn prune_stale_forks(&mut self) -> usize {
        let floor = match self.best_height.checked_sub(self.config.cut_off_age) {
            Some(floor) if floor > GENESIS_HEIGHT => floor,
            _ => return 0,
        };

        // Best-chain block just below the floor
        let mut expected = None;
        let mut cursor = Some(self.best_hash);
        while let Some(hash) = cursor {
            let entry = match self.blocks.get(&hash) {
                Some(entry) => entry,
                None => break,
            };
            if entry.height < floor {
                expected = Some(hash);
                break;
            }
            cursor = entry.block.prev_block_hash;
        }

        let mut stale = Vec::new();
        for (&height, hashes) in self.heights.range(GENESIS_HEIGHT + 1..floor).rev() {
            // Joined the chain left by an earlier pass: everything below is its ancestry
            if height < self.pruned_floor && hashes.len() == 1 && expected == Some(hashes[0]) {
                break;
            }

            let mut on_chain = false;
            for hash in hashes {
                if expected == Some(*hash) {
                    on_chain = true;
                } else {
                    stale.push(*hash);
                }
            }
            if on_chain {
                expected = expected
                    .and_then(|hash| self.blocks.get(&hash))
                    .and_then(|entry| entry.block.prev_block_hash);
            }
        }
        self.pruned_floor = self.pruned_floor.max(floor);

        for hash in &stale {
            if let Some(entry) = self.blocks.remove(hash) {
                if let Some(hashes) = self.heights.get_mut(&entry.height) {
                    hashes.retain(|h| h != hash);
                    if hashes.is_empty() {
                        self.heights.remove(&entry.height);
                    }
                }
            }
        }

        if !stale.is_empty() {
            info!(
                "pruned {} stale fork blocks below height {}",
                stale.len(),
                floor
            );
        }
        stale.len()
    }

    // Best block and its retained ancestors. The walk stops at the first ancestor
    // that is no longer retained.
    fn best_chain(&self) -> HashSet<Hash> {
        let mut chain = HashSet::new();
        let mut cursor = Some(self.best_hash);
        while let Some(hash) = cursor {
            match self.blocks.get(&hash) {
                Some(entry) => {
                    chain.insert(hash);
                    cursor = entry.block.prev_block_hash;
                }
                None => break,
            }
        }
        chain
    }

    fn best_entry(&self) -> &BlockEntry {
        // The best block is on the best chain and is never pruned
        &self.blocks[&self.best_hash]
    }
}
