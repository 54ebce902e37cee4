//! Transactions: construction, identity, signing data and validity checks

use crate::constants::*;
use crate::error::{LedgerError, Result};
use crate::types::*;
use crate::utxo::UtxoSet;
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, Signing, Verification};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

impl Transaction {
    /// Create an empty, unfinalized transaction
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a finalized coinbase paying `value` to `recipient`
    pub fn coinbase(value: Integer, recipient: ByteString) -> Self {
        Self::coinbase_at(0, value, recipient)
    }

    /// Create a finalized coinbase for a block at `height`
    pub fn coinbase_at(height: Natural, value: Integer, recipient: ByteString) -> Self {
        let mut tx = Self::new();
        tx.add_output(value, recipient);
        tx.lock_time = height;
        tx.finalize();
        tx
    }

    pub fn add_input(&mut self, prevout: OutPoint) {
        self.inputs.push(TransactionInput {
            prevout,
            signature: Vec::new(),
        });
    }

    pub fn add_output(&mut self, value: Integer, recipient: ByteString) {
        self.outputs.push(TransactionOutput { value, recipient });
    }

    /// Replace the unlocking proof of input `index`
    pub fn set_signature(&mut self, index: usize, signature: ByteString) -> Result<()> {
        let input = self.inputs.get_mut(index).ok_or_else(|| {
            LedgerError::TransactionValidation(format!("No input at index {}", index))
        })?;
        input.signature = signature;
        Ok(())
    }

    /// Sign input `index` with `secret_key`. Outputs must be final before signing.
    pub fn sign_input(&mut self, index: usize, secret_key: &SecretKey) -> Result<()> {
        let secp = Secp256k1::signing_only();
        let signature = sign_data(&secp, &self.signing_data(index)?, secret_key)?;
        self.set_signature(index, signature)
    }

    /// Data committed to by the signature of input `index`: the outpoint it spends
    /// followed by every output of the transaction
    pub fn raw_data_to_sign(&self, index: usize) -> Option<Vec<u8>> {
        let input = self.inputs.get(index)?;
        let mut data = Vec::new();
        data.extend_from_slice(&input.prevout.hash);
        data.extend_from_slice(&input.prevout.index.to_le_bytes());
        for output in &self.outputs {
            encode_output(&mut data, output);
        }
        Some(data)
    }

    /// Canonical encoding of the full transaction, signatures included
    pub fn raw_tx(&self) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&(self.inputs.len() as u64).to_le_bytes());
        for input in &self.inputs {
            data.extend_from_slice(&input.prevout.hash);
            data.extend_from_slice(&input.prevout.index.to_le_bytes());
            data.extend_from_slice(&(input.signature.len() as u64).to_le_bytes());
            data.extend_from_slice(&input.signature);
        }
        data.extend_from_slice(&(self.outputs.len() as u64).to_le_bytes());
        for output in &self.outputs {
            encode_output(&mut data, output);
        }
        data.extend_from_slice(&self.lock_time.to_le_bytes());
        data
    }

    pub fn calculate_hash(&self) -> Hash {
        double_sha256_hash(&self.raw_tx())
    }

    /// Compute and store the identity hash
    pub fn finalize(&mut self) -> Hash {
        self.hash = self.calculate_hash();
        self.hash
    }

    pub fn is_coinbase(&self) -> bool {
        is_coinbase(self)
    }

    /// The outpoint of output `index` of this transaction
    pub fn outpoint(&self, index: Natural) -> OutPoint {
        OutPoint::new(self.hash, index)
    }

    fn signing_data(&self, index: usize) -> Result<Vec<u8>> {
        self.raw_data_to_sign(index).ok_or_else(|| {
            LedgerError::TransactionValidation(format!("No input at index {}", index))
        })
    }
}

/// CheckTransaction: structural validity, independent of any UTXO set
///
/// 1. |ins| > 0 ∧ |outs| > 0
/// 2. ∀o ∈ outs: 0 ≤ o.value ≤ MAX_MONEY
/// 3. Σₒ o.value ≤ MAX_MONEY
/// 4. |ins| ≤ MAX_INPUTS
/// 5. |outs| ≤ MAX_OUTPUTS
pub fn check_transaction(tx: &Transaction) -> Result<ValidationResult> {
    if tx.inputs.is_empty() || tx.outputs.is_empty() {
        return Ok(ValidationResult::Invalid("Empty inputs or outputs".to_string()));
    }

    for (i, output) in tx.outputs.iter().enumerate() {
        if output.value < 0 || output.value > MAX_MONEY {
            return Ok(ValidationResult::Invalid(format!(
                "Invalid output value {} at index {}",
                output.value, i
            )));
        }
    }

    let total = tx
        .outputs
        .iter()
        .try_fold(0i64, |acc, o| acc.checked_add(o.value));
    match total {
        Some(total) if total <= MAX_MONEY => {}
        _ => {
            return Ok(ValidationResult::Invalid(
                "Total output value exceeds MAX_MONEY".to_string(),
            ))
        }
    }

    if tx.inputs.len() > MAX_INPUTS {
        return Ok(ValidationResult::Invalid(format!(
            "Too many inputs: {}",
            tx.inputs.len()
        )));
    }

    if tx.outputs.len() > MAX_OUTPUTS {
        return Ok(ValidationResult::Invalid(format!(
            "Too many outputs: {}",
            tx.outputs.len()
        )));
    }

    Ok(ValidationResult::Valid)
}

/// CheckTxInputs: validity against a UTXO set, returning the fee
///
/// 1. If tx is coinbase: return (valid, 0)
/// 2. Every prevout is in the set and claimed at most once
/// 3. Let total_in = Σᵢ us(i.prevout).value, total_out = Σₒ o.value
/// 4. If total_in < total_out: return (invalid, 0)
/// 5. Return (valid, total_in - total_out)
pub fn check_tx_inputs(tx: &Transaction, utxo_set: &UtxoSet) -> Result<(ValidationResult, Integer)> {
    if is_coinbase(tx) {
        return Ok((ValidationResult::Valid, 0));
    }

    let mut claimed = HashSet::new();
    let mut total_input_value = 0i64;

    for (i, input) in tx.inputs.iter().enumerate() {
        if !claimed.insert(input.prevout) {
            return Ok((
                ValidationResult::Invalid(format!("Input {} claims an output twice", i)),
                0,
            ));
        }

        let utxo = match utxo_set.lookup(&input.prevout) {
            Some(utxo) => utxo,
            None => {
                return Ok((
                    ValidationResult::Invalid(format!("Input {} not found in UTXO set", i)),
                    0,
                ))
            }
        };

        total_input_value = match total_input_value.checked_add(utxo.value) {
            Some(total) => total,
            None => {
                return Ok((
                    ValidationResult::Invalid("Input value overflow".to_string()),
                    0,
                ))
            }
        };
    }

    let total_output_value = match tx
        .outputs
        .iter()
        .try_fold(0i64, |acc, o| acc.checked_add(o.value))
    {
        Some(total) => total,
        None => {
            return Ok((
                ValidationResult::Invalid("Output value overflow".to_string()),
                0,
            ))
        }
    };

    if total_input_value < total_output_value {
        return Ok((
            ValidationResult::Invalid("Insufficient input value".to_string()),
            0,
        ));
    }

    Ok((ValidationResult::Valid, total_input_value - total_output_value))
}

/// Verify every input's signature against the recipient of the output it spends.
/// Returns `false` if any input is unknown to `utxo_set`.
pub fn verify_input_signatures(tx: &Transaction, utxo_set: &UtxoSet) -> Result<bool> {
    let secp = Secp256k1::verification_only();

    for (i, input) in tx.inputs.iter().enumerate() {
        let utxo = match utxo_set.lookup(&input.prevout) {
            Some(utxo) => utxo,
            None => return Ok(false),
        };
        let data = tx.signing_data(i)?;
        if !verify_signature(&secp, &utxo.recipient, &data, &input.signature)? {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Check if transaction is coinbase: no inputs and exactly one output
pub fn is_coinbase(tx: &Transaction) -> bool {
    tx.inputs.is_empty() && tx.outputs.len() == 1
}

fn verify_signature<C: Verification>(
    secp: &Secp256k1<C>,
    pubkey_bytes: &[u8],
    data: &[u8],
    signature_bytes: &[u8],
) -> Result<bool> {
    let pubkey = match PublicKey::from_slice(pubkey_bytes) {
        Ok(pk) => pk,
        Err(_) => return Ok(false),
    };

    if signature_bytes.len() != SIGNATURE_SIZE {
        return Ok(false);
    }
    let signature = match Signature::from_compact(signature_bytes) {
        Ok(sig) => sig,
        Err(_) => return Ok(false),
    };

    let message = Message::from_digest_slice(&sha256_hash(data))
        .map_err(|e| LedgerError::InvalidSignature(e.to_string()))?;

    Ok(secp.verify_ecdsa(&message, &signature, &pubkey).is_ok())
}

fn sign_data<C: Signing>(secp: &Secp256k1<C>, data: &[u8], secret_key: &SecretKey) -> Result<ByteString> {
    let message = Message::from_digest_slice(&sha256_hash(data))
        .map_err(|e| LedgerError::InvalidSignature(e.to_string()))?;
    Ok(secp.sign_ecdsa(&message, secret_key).serialize_compact().to_vec())
}

fn encode_output(data: &mut Vec<u8>, output: &TransactionOutput) {
    data.extend_from_slice(&output.value.to_le_bytes());
    data.extend_from_slice(&(output.recipient.len() as u64).to_le_bytes());
    data.extend_from_slice(&output.recipient);
}

/// Simple SHA256 hash function
pub(crate) fn sha256_hash(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// SHA256(SHA256(data)), used for transaction and block identities
pub(crate) fn double_sha256_hash(data: &[u8]) -> Hash {
    sha256_hash(&sha256_hash(data))
}
