/// Validation logic for transactions separated from type definitions
use std::collections::HashSet;

use crate::crypto::SignatureVerifier;
use crate::error::ChainError;
use crate::ledger::UtxoPool;
use crate::transaction::types::{Amount, Transaction, Utxo};

/// Value totals of a transaction that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxSummary {
    pub total_input: Amount,
    pub total_output: Amount,
    /// Implicit fee: surplus of inputs over outputs.
    pub fee: Amount,
}

impl Transaction {
    /// Full validation against `pool`.
    ///
    /// Inputs are checked in one pass: the claimed UTXO must exist, its owner must
    /// have signed this input, and no UTXO may be claimed twice. A failing input
    /// rejects immediately, before its value is counted. Outputs must be
    /// non-negative and must not exceed the inputs in total.
    pub fn validate_with_pool(
        &self,
        pool: &UtxoPool,
        verifier: &dyn SignatureVerifier,
    ) -> Result<TxSummary, ChainError> {
        let mut claimed: HashSet<Utxo> = HashSet::with_capacity(self.inputs.len());
        let mut total_input = Amount::ZERO;

        for (input_index, input) in self.inputs.iter().enumerate() {
            let utxo = input.utxo();
            let spent = pool.output(&utxo)?;

            let message = self
                .signable_bytes(input_index)
                .ok_or(ChainError::InputIndexOutOfRange(input_index))?;
            if !verifier.verify(&spent.owner, &message, &input.signature) {
                return Err(ChainError::InvalidSignature { input_index });
            }

            if !claimed.insert(utxo) {
                return Err(ChainError::DoubleSpendDetected(utxo));
            }

            // Saturating: a capped input total still dominates any non-overflowing output total.
            total_input = total_input.saturating_add(spent.value);
        }

        let mut total_output = Amount::ZERO;
        for (output_index, output) in self.outputs.iter().enumerate() {
            if output.value < Amount::ZERO {
                return Err(ChainError::NegativeOutput {
                    output_index,
                    value: output.value,
                });
            }
            total_output = total_output
                .checked_add(output.value)
                .ok_or(ChainError::Overflow)?;
        }

        if total_input < total_output {
            return Err(ChainError::InsufficientInput {
                have: total_input,
                need: total_output,
            });
        }

        Ok(TxSummary {
            total_input,
            total_output,
            fee: total_input - total_output,
        })
    }

    /// Surplus of inputs over outputs, looked up in `pool` without checking signatures.
    ///
    /// `None` when an input is missing from the pool or the output sum overflows.
    pub fn fee_against(&self, pool: &UtxoPool) -> Option<Amount> {
        let total_input = self.inputs.iter().try_fold(Amount::ZERO, |acc, input| {
            Some(acc.saturating_add(pool.get(&input.utxo())?.value))
        })?;
        let total_output = self
            .outputs
            .iter()
            .try_fold(Amount::ZERO, |acc, output| acc.checked_add(output.value))?;
        total_input.checked_sub(total_output)
    }
}
