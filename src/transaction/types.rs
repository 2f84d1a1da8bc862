/// Transaction types for the ledger
use crate::crypto::{KeyPair, PublicKeyBytes};
use crate::error::ChainError;
use fixed::types::I64F64;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Deterministic fixed-point coin amount. Signed so malformed outputs stay representable.
pub type Amount = I64F64;

pub type TxHash = [u8; 32];

/// Reference to one spendable output: the creating transaction and the output position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Utxo {
    #[serde(with = "hex::serde")]
    pub tx_hash: TxHash,
    pub index: u32,
}

impl Utxo {
    pub const fn new(tx_hash: TxHash, index: u32) -> Self {
        Self { tx_hash, index }
    }
}

impl fmt::Display for Utxo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", hex::encode(self.tx_hash), self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: Amount,
    #[serde(with = "hex::serde")]
    pub owner: PublicKeyBytes,
}

impl TxOutput {
    pub fn new(value: Amount, owner: PublicKeyBytes) -> Self {
        Self { value, owner }
    }
}

/// A claim on a prior output. An empty signature means the input is unsigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    #[serde(with = "hex::serde")]
    pub prev_tx_hash: TxHash,
    pub output_index: u32,
    #[serde(with = "hex::serde", default)]
    pub signature: Vec<u8>,
}

impl TxInput {
    pub fn new(prev_tx_hash: TxHash, output_index: u32) -> Self {
        Self {
            prev_tx_hash,
            output_index,
            signature: Vec::new(),
        }
    }

    /// The pool key this input claims.
    pub fn utxo(&self) -> Utxo {
        Utxo::new(self.prev_tx_hash, self.output_index)
    }

    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub inputs: Vec<TxInput>,
    #[serde(default)]
    pub outputs: Vec<TxOutput>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_input(&mut self, prev_tx_hash: TxHash, output_index: u32) -> &mut Self {
        self.inputs.push(TxInput::new(prev_tx_hash, output_index));
        self
    }

    pub fn add_output(&mut self, value: Amount, owner: PublicKeyBytes) -> &mut Self {
        self.outputs.push(TxOutput::new(value, owner));
        self
    }

    pub fn remove_input(&mut self, index: usize) -> Option<TxInput> {
        if index < self.inputs.len() {
            Some(self.inputs.remove(index))
        } else {
            None
        }
    }

    /// Removes the first input claiming `utxo`.
    pub fn remove_input_utxo(&mut self, utxo: &Utxo) -> Option<TxInput> {
        let position = self.inputs.iter().position(|input| input.utxo() == *utxo)?;
        Some(self.inputs.remove(position))
    }

    pub fn add_signature(&mut self, signature: Vec<u8>, index: usize) -> Result<(), ChainError> {
        let input = self
            .inputs
            .get_mut(index)
            .ok_or(ChainError::InputIndexOutOfRange(index))?;
        input.signature = signature;
        Ok(())
    }

    /// Signs input `index` with `keypair` over that input's signable bytes.
    pub fn sign_input(&mut self, keypair: &KeyPair, index: usize) -> Result<(), ChainError> {
        let message = self
            .signable_bytes(index)
            .ok_or(ChainError::InputIndexOutOfRange(index))?;
        self.add_signature(keypair.sign(&message).to_vec(), index)
    }

    pub fn input(&self, index: usize) -> Option<&TxInput> {
        self.inputs.get(index)
    }

    pub fn output(&self, index: usize) -> Option<&TxOutput> {
        self.outputs.get(index)
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// The message input `index` must be signed over: that input's claim followed by
    /// every output. Signatures are excluded, so signing one input never invalidates another.
    pub fn signable_bytes(&self, index: usize) -> Option<Vec<u8>> {
        let input = self.inputs.get(index)?;
        let mut message = Vec::with_capacity(36 + self.outputs.len() * 56);
        message.extend_from_slice(&input.prev_tx_hash);
        message.extend_from_slice(&input.output_index.to_le_bytes());
        for output in &self.outputs {
            message.extend_from_slice(&output.value.to_le_bytes());
            message.extend_from_slice(&(output.owner.len() as u32).to_le_bytes());
            message.extend_from_slice(&output.owner);
        }
        Some(message)
    }

    /// Content hash over every input (signatures included) and output.
    pub fn hash(&self) -> TxHash {
        let mut hasher = Sha256::new();
        hasher.update((self.inputs.len() as u32).to_le_bytes());
        for input in &self.inputs {
            hasher.update(input.prev_tx_hash);
            hasher.update(input.output_index.to_le_bytes());
            hasher.update((input.signature.len() as u32).to_le_bytes());
            hasher.update(&input.signature);
        }
        hasher.update((self.outputs.len() as u32).to_le_bytes());
        for output in &self.outputs {
            hasher.update(output.value.to_le_bytes());
            hasher.update((output.owner.len() as u32).to_le_bytes());
            hasher.update(&output.owner);
        }
        hasher.finalize().into()
    }

    pub fn hash_str(&self) -> String {
        hex::encode(self.hash())
    }

    /// Keys of the outputs this transaction creates once applied.
    pub fn created_utxos(&self) -> impl Iterator<Item = (Utxo, &TxOutput)> + '_ {
        let tx_hash = self.hash();
        self.outputs
            .iter()
            .enumerate()
            .map(move |(index, output)| (Utxo::new(tx_hash, index as u32), output))
    }
}
