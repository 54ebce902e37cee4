//! Shared fixtures for the integration tests

#![allow(dead_code)]

use fork_ledger::*;
use secp256k1::{PublicKey, Secp256k1, SecretKey};

pub const MINER: [u8; 33] = [0x03; 33];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn keypair(seed: u8) -> (SecretKey, ByteString) {
    let secp = Secp256k1::new();
    let secret_key = SecretKey::from_slice(&[seed; 32]).unwrap();
    let public_key = PublicKey::from_secret_key(&secp, &secret_key);
    (secret_key, public_key.serialize().to_vec())
}

/// Finalized genesis whose coinbase pays `value` to `owner`
pub fn genesis_paying(owner: &ByteString, value: Integer) -> Block {
    let mut block = Block::with_coinbase(None, Transaction::coinbase(value, owner.clone()));
    block.finalize();
    block
}

/// Finalized block on `parent` whose coinbase commits to `height`. `tag` goes
/// into the coinbase recipient so that siblings carrying the same transactions
/// still get distinct identities.
pub fn block_at(parent: Hash, height: Natural, tag: Natural, txs: Vec<Transaction>) -> Block {
    let mut recipient = MINER.to_vec();
    recipient.extend_from_slice(&tag.to_le_bytes());
    let mut block = Block::with_coinbase(
        Some(parent),
        Transaction::coinbase_at(height, COINBASE_REWARD, recipient),
    );
    for tx in txs {
        block.add_transaction(tx);
    }
    block.finalize();
    block
}

/// Finalized block on `parent` at the height `chain` would give it
pub fn block_on<V: TxValidator>(
    chain: &Blockchain<V>,
    parent: Hash,
    tag: Natural,
    txs: Vec<Transaction>,
) -> Block {
    let height = chain.height_of(&parent).map_or(0, |h| h + 1);
    block_at(parent, height, tag, txs)
}

/// Signed, finalized transaction spending `prevouts`, all owned by `key`
pub fn pay(prevouts: &[OutPoint], key: &SecretKey, outputs: &[(Integer, &ByteString)]) -> Transaction {
    let mut tx = Transaction::new();
    for prevout in prevouts {
        tx.add_input(*prevout);
    }
    for (value, recipient) in outputs {
        tx.add_output(*value, (*recipient).clone());
    }
    for i in 0..prevouts.len() {
        tx.sign_input(i, key).unwrap();
    }
    tx.finalize();
    tx
}

/// Append `count` empty blocks starting at `parent`, returning the last hash
pub fn extend<V: TxValidator>(chain: &mut Blockchain<V>, parent: Hash, count: usize, tag: Natural) -> Hash {
    let mut tip = parent;
    for i in 0..count {
        tip = chain
            .process_block(block_on(&*chain, tip, tag * 1000 + i as Natural, vec![]))
            .unwrap();
    }
    tip
}
