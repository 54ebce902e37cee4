//! Blocks: construction, identity and connection to a parent's UTXO set

use crate::constants::COINBASE_REWARD;
use crate::error::{LedgerError, Result};
use crate::transaction::{double_sha256_hash, is_coinbase};
use crate::types::*;
use crate::utxo::UtxoSet;
use crate::validator::TxValidator;

impl Block {
    /// Create an unfinalized block at `height` on `prev_block_hash` whose coinbase
    /// pays the standard reward to `coinbase_recipient`
    pub fn new(prev_block_hash: Option<Hash>, height: Natural, coinbase_recipient: ByteString) -> Self {
        Self::with_coinbase(
            prev_block_hash,
            Transaction::coinbase_at(height, COINBASE_REWARD, coinbase_recipient),
        )
    }

    pub fn with_coinbase(prev_block_hash: Option<Hash>, coinbase: Transaction) -> Self {
        Self {
            prev_block_hash,
            coinbase,
            transactions: Vec::new(),
            hash: None,
        }
    }

    pub fn add_transaction(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    pub fn is_genesis(&self) -> bool {
        self.prev_block_hash.is_none()
    }

    /// Hash over the parent reference, the coinbase and every transaction identity
    pub fn calculate_hash(&self) -> Hash {
        let mut data = Vec::new();
        match &self.prev_block_hash {
            Some(prev) => {
                data.push(1);
                data.extend_from_slice(prev);
            }
            None => data.push(0),
        }
        data.extend_from_slice(&self.coinbase.hash);
        data.extend_from_slice(&(self.transactions.len() as u64).to_le_bytes());
        for tx in &self.transactions {
            data.extend_from_slice(&tx.hash);
        }
        double_sha256_hash(&data)
    }

    /// Compute and store the identity hash
    pub fn finalize(&mut self) -> Hash {
        let hash = self.calculate_hash();
        self.hash = Some(hash);
        hash
    }

    /// The outpoint and payload credited by this block's coinbase
    pub fn coinbase_utxo(&self) -> Result<(OutPoint, TransactionOutput)> {
        if !is_coinbase(&self.coinbase) {
            return Err(LedgerError::InvalidCoinbase(format!(
                "expected no inputs and one output, found {} inputs and {} outputs",
                self.coinbase.inputs.len(),
                self.coinbase.outputs.len()
            )));
        }
        if self.coinbase.hash != self.coinbase.calculate_hash() {
            return Err(LedgerError::InvalidCoinbase(format!(
                "stored hash {} does not match its contents",
                hex::encode(self.coinbase.hash)
            )));
        }
        Ok((self.coinbase.outpoint(0), self.coinbase.outputs[0].clone()))
    }
}

/// ConnectBlock: ℬ × 𝒰𝒮 → 𝒰𝒮
///
/// For block b = (coinbase, txs) extending a parent with UTXO set us:
/// 1. Let (accepted, us') = validator(us, txs)
/// 2. If |accepted| < |txs|: the whole block is invalid
/// 3. If (coinbase.id, 0) ∈ us ∪ us': the block is invalid
/// 4. Credit the coinbase output: us'' = us' ∪ {(coinbase.id, 0) ↦ coinbase.outputs[0]}
/// 5. Return us''
///
/// `parent_utxo_set` is never modified; the result is a fresh set owned by the caller.
pub fn connect_block<V: TxValidator>(
    block: &Block,
    parent_utxo_set: &UtxoSet,
    validator: &V,
) -> Result<UtxoSet> {
    let (coinbase_outpoint, coinbase_output) = block.coinbase_utxo()?;

    let handled = validator.handle_txs(parent_utxo_set, &block.transactions)?;
    if handled.accepted.len() != block.transactions.len() {
        return Err(LedgerError::TransactionValidation(format!(
            "only {} of {} transactions are valid",
            handled.accepted.len(),
            block.transactions.len()
        )));
    }

    let mut utxo_set = handled.utxo_set;
    if parent_utxo_set.contains(&coinbase_outpoint) || utxo_set.contains(&coinbase_outpoint) {
        return Err(LedgerError::InvalidCoinbase(format!(
            "coinbase output {} already exists",
            hex::encode(coinbase_outpoint.hash)
        )));
    }
    utxo_set.add(coinbase_outpoint, coinbase_output);
    Ok(utxo_set)
}

/// ApplyTransaction: 𝒯𝒳 × 𝒰𝒮 → 𝒰𝒮
///
/// 1. Remove every spent input: us \ {i.prevout : i ∈ tx.inputs}
/// 2. Add new outputs: ∪ {(tx.id, i) ↦ tx.outputs[i] : i ∈ [0, |tx.outputs|)}
///
/// No validity check happens here.
pub fn apply_transaction(tx: &Transaction, utxo_set: &mut UtxoSet) {
    for input in &tx.inputs {
        utxo_set.remove(&input.prevout);
    }

    for (i, output) in tx.outputs.iter().enumerate() {
        utxo_set.add(tx.outpoint(i as Natural), output.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::HandledTransactions;

    /// Accepts the first `accept` transactions, applying them blindly
    struct PrefixValidator {
        accept: usize,
    }

    impl TxValidator for PrefixValidator {
        fn handle_txs(&self, utxo_set: &UtxoSet, txs: &[Transaction]) -> Result<HandledTransactions> {
            let mut utxo_set = utxo_set.clone();
            let accepted: Vec<Transaction> = txs.iter().take(self.accept).cloned().collect();
            for tx in &accepted {
                apply_transaction(tx, &mut utxo_set);
            }
            Ok(HandledTransactions { accepted, utxo_set })
        }
    }

    fn spend(prevout: OutPoint, value: Integer) -> Transaction {
        let mut tx = Transaction::new();
        tx.add_input(prevout);
        tx.add_output(value, vec![0x02; 33]);
        tx.finalize();
        tx
    }

    #[test]
    fn test_finalize_sets_hash() {
        let mut block = Block::new(Some([7; 32]), 2, vec![0x02; 33]);
        assert!(block.hash.is_none());
        let hash = block.finalize();
        assert_eq!(block.hash, Some(hash));
        assert_eq!(hash, block.calculate_hash());
    }

    #[test]
    fn test_hash_depends_on_parent_and_transactions() {
        let base = Block::new(Some([7; 32]), 2, vec![0x02; 33]);
        let mut other_parent = base.clone();
        other_parent.prev_block_hash = Some([8; 32]);
        let mut genesis = base.clone();
        genesis.prev_block_hash = None;
        let mut with_tx = base.clone();
        with_tx.add_transaction(spend(OutPoint::new([1; 32], 0), 1));

        let hashes = [
            base.calculate_hash(),
            other_parent.calculate_hash(),
            genesis.calculate_hash(),
            with_tx.calculate_hash(),
        ];
        for i in 0..hashes.len() {
            for j in (i + 1)..hashes.len() {
                assert_ne!(hashes[i], hashes[j]);
            }
        }
    }

    #[test]
    fn test_apply_transaction() {
        let prevout = OutPoint::new([1; 32], 0);
        let mut utxo_set = UtxoSet::new();
        utxo_set.add(
            prevout,
            TransactionOutput {
                value: 5,
                recipient: vec![],
            },
        );

        let tx = spend(prevout, 5);
        apply_transaction(&tx, &mut utxo_set);

        assert!(!utxo_set.contains(&prevout));
        assert_eq!(utxo_set.lookup(&tx.outpoint(0)).map(|o| o.value), Some(5));
    }

    #[test]
    fn test_connect_block_credits_coinbase() {
        let block = Block::new(Some([7; 32]), 2, vec![0x02; 33]);
        let parent = UtxoSet::new();

        let utxo_set = connect_block(&block, &parent, &PrefixValidator { accept: 0 }).unwrap();
        assert_eq!(utxo_set.len(), 1);
        assert_eq!(
            utxo_set.lookup(&block.coinbase.outpoint(0)).map(|o| o.value),
            Some(COINBASE_REWARD)
        );
        assert!(parent.is_empty());
    }

    #[test]
    fn test_connect_block_rejects_partial_acceptance() {
        let mut block = Block::new(Some([7; 32]), 2, vec![0x02; 33]);
        block.add_transaction(spend(OutPoint::new([1; 32], 0), 1));
        block.add_transaction(spend(OutPoint::new([2; 32], 0), 1));

        let result = connect_block(&block, &UtxoSet::new(), &PrefixValidator { accept: 1 });
        assert!(matches!(result, Err(LedgerError::TransactionValidation(_))));
    }

    #[test]
    fn test_connect_block_rejects_reused_coinbase() {
        let previous = Block::new(Some([7; 32]), 2, vec![0x02; 33]);
        let mut parent = UtxoSet::new();
        parent.add(previous.coinbase.outpoint(0), previous.coinbase.outputs[0].clone());

        // same coinbase again, while its first output is still unspent
        let block = Block::with_coinbase(Some([8; 32]), previous.coinbase.clone());
        let result = connect_block(&block, &parent, &PrefixValidator { accept: 0 });
        assert!(matches!(result, Err(LedgerError::InvalidCoinbase(_))));

        // same coinbase again, spending the first one in the same block
        let mut block = Block::with_coinbase(Some([8; 32]), previous.coinbase.clone());
        block.add_transaction(spend(previous.coinbase.outpoint(0), COINBASE_REWARD));
        let result = connect_block(&block, &parent, &PrefixValidator { accept: 1 });
        assert!(matches!(result, Err(LedgerError::InvalidCoinbase(_))));
    }

    #[test]
    fn test_connect_block_rejects_rehashed_coinbase() {
        let mut block = Block::new(Some([7; 32]), 2, vec![0x02; 33]);
        block.coinbase.hash = [0x55; 32];

        let result = connect_block(&block, &UtxoSet::new(), &PrefixValidator { accept: 0 });
        assert!(matches!(result, Err(LedgerError::InvalidCoinbase(_))));
    }

    #[test]
    fn test_connect_block_rejects_malformed_coinbase() {
        let mut block = Block::new(Some([7; 32]), 2, vec![0x02; 33]);
        block.coinbase.outputs.clear();

        let result = connect_block(&block, &UtxoSet::new(), &PrefixValidator { accept: 0 });
        assert!(matches!(result, Err(LedgerError::InvalidCoinbase(_))));
    }
}
