//! Ledger constants

/// Maximum number of blocks a fork point may lag behind the best height
pub const CUT_OFF_AGE: u64 = 10;

/// Height of the genesis block
pub const GENESIS_HEIGHT: u64 = 1;

/// Value credited by the coinbase of blocks assembled by this crate
pub const COINBASE_REWARD: i64 = 25;

/// Maximum value of a single output and of the sum of a transaction's outputs
pub const MAX_MONEY: i64 = 21_000_000 * 100_000_000;

/// Maximum number of inputs per transaction
pub const MAX_INPUTS: usize = 1000;

/// Maximum number of outputs per transaction
pub const MAX_OUTPUTS: usize = 1000;

/// Length of a compact ECDSA signature
pub const SIGNATURE_SIZE: usize = 64;
