//! Unspent-output pool keyed by `(tx_hash, index)`

use crate::error::ChainError;
use crate::transaction::{Amount, Transaction, TxOutput, Utxo};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The set of currently spendable outputs.
///
/// Cloning yields an independent pool; there is no shared state between copies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PoolEntry>", into = "Vec<PoolEntry>")]
pub struct UtxoPool {
    utxos: HashMap<Utxo, TxOutput>,
}

/// Serialized form of one pool entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolEntry {
    pub utxo: Utxo,
    pub output: TxOutput,
}

impl UtxoPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, utxo: &Utxo) -> bool {
        self.utxos.contains_key(utxo)
    }

    pub fn get(&self, utxo: &Utxo) -> Option<&TxOutput> {
        self.utxos.get(utxo)
    }

    pub fn output(&self, utxo: &Utxo) -> Result<&TxOutput, ChainError> {
        self.utxos
            .get(utxo)
            .ok_or(ChainError::UtxoNotFound(*utxo))
    }

    /// Inserts or overwrites, returning the previous entry.
    pub fn add(&mut self, utxo: Utxo, output: TxOutput) -> Option<TxOutput> {
        self.utxos.insert(utxo, output)
    }

    pub fn remove(&mut self, utxo: &Utxo) -> Option<TxOutput> {
        self.utxos.remove(utxo)
    }

    /// Every unspent key, sorted.
    pub fn snapshot(&self) -> Vec<Utxo> {
        let mut keys: Vec<Utxo> = self.utxos.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Utxo, &TxOutput)> {
        self.utxos.iter()
    }

    pub fn total_value(&self) -> Amount {
        self.utxos
            .values()
            .fold(Amount::ZERO, |acc, output| acc.saturating_add(output.value))
    }

    pub fn balance_of(&self, owner: &[u8]) -> Amount {
        self.utxos
            .values()
            .filter(|output| output.owner == owner)
            .fold(Amount::ZERO, |acc, output| acc.saturating_add(output.value))
    }

    /// Consumes every input of `tx` and records each of its outputs under `(tx.hash(), position)`.
    ///
    /// Does not check signatures or values; callers validate first. Fails without
    /// touching the pool if any input is missing.
    pub fn apply(&mut self, tx: &Transaction) -> Result<(), ChainError> {
        if let Some(missing) = tx
            .inputs
            .iter()
            .map(|input| input.utxo())
            .find(|utxo| !self.contains(utxo))
        {
            return Err(ChainError::UtxoNotFound(missing));
        }

        for input in &tx.inputs {
            self.utxos.remove(&input.utxo());
        }
        for (utxo, output) in tx.created_utxos() {
            self.utxos.insert(utxo, output.clone());
        }
        Ok(())
    }
}

/// Rejects entry lists that name the same UTXO twice.
impl TryFrom<Vec<PoolEntry>> for UtxoPool {
    type Error = ChainError;

    fn try_from(entries: Vec<PoolEntry>) -> Result<Self, Self::Error> {
        let mut utxos = HashMap::with_capacity(entries.len());
        for PoolEntry { utxo, output } in entries {
            if utxos.insert(utxo, output).is_some() {
                return Err(ChainError::SerializationError(format!(
                    "duplicate pool entry {}",
                    utxo
                )));
            }
        }
        Ok(Self { utxos })
    }
}

impl From<UtxoPool> for Vec<PoolEntry> {
    fn from(pool: UtxoPool) -> Self {
        let mut entries: Vec<PoolEntry> = pool
            .utxos
            .into_iter()
            .map(|(utxo, output)| PoolEntry { utxo, output })
            .collect();
        entries.sort_unstable_by_key(|entry| entry.utxo);
        entries
    }
}
