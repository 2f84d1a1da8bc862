//! Validation and greedy epoch application over a private copy of the pool

use crate::crypto::{Secp256k1Verifier, SignatureVerifier};
use crate::error::ChainError;
use crate::ledger::policy::{BatchPolicy, FirstSeen};
use crate::ledger::pool::UtxoPool;
use crate::transaction::{Transaction, TxSummary};
use tracing::{debug, info, trace};

/// Result of one epoch.
#[derive(Debug, Clone, Default)]
pub struct EpochOutcome {
    /// Accepted transactions in acceptance order.
    pub accepted: Vec<Transaction>,
    /// Candidate index and reason for every dropped transaction.
    pub rejected: Vec<(usize, ChainError)>,
}

/// Owns the ledger's unspent outputs and admits transactions against them.
pub struct TxHandler<V = Secp256k1Verifier, P = FirstSeen> {
    pool: UtxoPool,
    verifier: V,
    policy: P,
}

impl TxHandler {
    /// Secp256k1 verification, first-seen batch order. `pool` is copied.
    pub fn new(pool: &UtxoPool) -> Self {
        Self::with_parts(pool, Secp256k1Verifier, FirstSeen)
    }
}

impl<V: SignatureVerifier, P: BatchPolicy> TxHandler<V, P> {
    pub fn with_parts(pool: &UtxoPool, verifier: V, policy: P) -> Self {
        Self {
            pool: pool.clone(),
            verifier,
            policy,
        }
    }

    pub fn pool(&self) -> &UtxoPool {
        &self.pool
    }

    pub fn into_pool(self) -> UtxoPool {
        self.pool
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Validates `tx` against the current pool, naming the first failed check.
    pub fn check_tx(&self, tx: &Transaction) -> Result<TxSummary, ChainError> {
        tx.validate_with_pool(&self.pool, &self.verifier)
    }

    pub fn is_valid_tx(&self, tx: &Transaction) -> bool {
        self.check_tx(tx).is_ok()
    }

    /// Runs one epoch and returns the accepted transactions.
    pub fn handle_txs(&mut self, candidates: &[Transaction]) -> Vec<Transaction> {
        self.process_epoch(candidates).accepted
    }

    /// Tries every candidate once, in policy order, each against the pool as left by
    /// the candidates accepted before it. Rejected candidates are not retried.
    pub fn process_epoch(&mut self, candidates: &[Transaction]) -> EpochOutcome {
        let schedule = self.policy.schedule(candidates, &self.pool);
        let mut tried = vec![false; candidates.len()];
        let mut outcome = EpochOutcome::default();

        for index in schedule {
            match tried.get_mut(index) {
                Some(seen) if !*seen => *seen = true,
                _ => continue,
            }
            let tx = &candidates[index];

            let applied = self
                .check_tx(tx)
                .and_then(|summary| self.pool.apply(tx).map(|()| summary));
            match applied {
                Ok(summary) => {
                    trace!(
                        "Accepted tx {} (fee {}, {} inputs, {} outputs)",
                        tx.hash_str(),
                        summary.fee,
                        tx.num_inputs(),
                        tx.num_outputs()
                    );
                    outcome.accepted.push(tx.clone());
                }
                Err(reason) => {
                    debug!("Rejected tx {}: {}", tx.hash_str(), reason);
                    outcome.rejected.push((index, reason));
                }
            }
        }

        info!(
            "Epoch processed with {} policy: {} accepted, {} rejected, {} unspent outputs",
            self.policy.name(),
            outcome.accepted.len(),
            outcome.rejected.len(),
            self.pool.len()
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::policy::FeePriority;
    use crate::transaction::{Amount, TxOutput, Utxo};

    // Oracle that accepts a signature equal to the owner key, so tests can forge at will.
    fn owner_signed(public_key: &[u8], _message: &[u8], signature: &[u8]) -> bool {
        public_key == signature
    }

    fn key(id: u8) -> Vec<u8> {
        vec![id; 33]
    }

    fn seeded_pool() -> UtxoPool {
        let mut pool = UtxoPool::new();
        pool.add(
            Utxo::new([1u8; 32], 0),
            TxOutput::new(Amount::from_num(10), key(1)),
        );
        pool
    }

    fn transfer(prev: [u8; 32], index: u32, signer: u8, outs: &[(i64, u8)]) -> Transaction {
        let mut tx = Transaction::new();
        tx.add_input(prev, index);
        for (value, owner) in outs {
            tx.add_output(Amount::from_num(*value), key(*owner));
        }
        tx.add_signature(key(signer), 0).unwrap();
        tx
    }

    #[test]
    fn test_rejection_does_not_mutate_pool() {
        let handler = TxHandler::with_parts(&seeded_pool(), owner_signed, FirstSeen);
        let forged = transfer([1u8; 32], 0, 9, &[(10, 9)]);

        for _ in 0..3 {
            assert!(!handler.is_valid_tx(&forged));
        }
        assert_eq!(handler.pool(), &seeded_pool());
    }

    #[test]
    fn test_conflicting_spend_loses_to_first() {
        let mut handler = TxHandler::with_parts(&seeded_pool(), owner_signed, FirstSeen);
        let tx_a = transfer([1u8; 32], 0, 1, &[(6, 2), (4, 1)]);
        let tx_b = transfer([1u8; 32], 0, 1, &[(10, 3)]);

        let outcome = handler.process_epoch(&[tx_a.clone(), tx_b.clone()]);
        assert_eq!(outcome.accepted, vec![tx_a.clone()]);
        assert_eq!(
            outcome.rejected,
            vec![(1, ChainError::UtxoNotFound(Utxo::new([1u8; 32], 0)))]
        );
        assert!(!handler.pool().contains(&Utxo::new([1u8; 32], 0)));
        assert!(handler.pool().contains(&Utxo::new(tx_a.hash(), 0)));
        assert!(handler.pool().contains(&Utxo::new(tx_a.hash(), 1)));
        assert!(!handler.pool().contains(&Utxo::new(tx_b.hash(), 0)));
    }

    #[test]
    fn test_fee_priority_changes_winner() {
        let mut handler = TxHandler::with_parts(&seeded_pool(), owner_signed, FeePriority);
        let low_fee = transfer([1u8; 32], 0, 1, &[(9, 2)]);
        let high_fee = transfer([1u8; 32], 0, 1, &[(5, 3)]);

        let accepted = handler.handle_txs(&[low_fee, high_fee.clone()]);
        assert_eq!(accepted, vec![high_fee]);
    }

    #[test]
    fn test_empty_batch() {
        let mut handler = TxHandler::with_parts(&seeded_pool(), owner_signed, FirstSeen);
        assert!(handler.handle_txs(&[]).is_empty());
        assert_eq!(handler.into_pool(), seeded_pool());
    }

    struct Repeating;

    impl BatchPolicy for Repeating {
        fn schedule(&self, candidates: &[Transaction], _pool: &UtxoPool) -> Vec<usize> {
            let mut order: Vec<usize> = (0..candidates.len()).collect();
            order.extend(0..candidates.len() + 2);
            order
        }

        fn name(&self) -> &'static str {
            "repeating"
        }
    }

    #[test]
    fn test_schedule_repeats_and_out_of_range_are_ignored() {
        let mut handler = TxHandler::with_parts(&seeded_pool(), owner_signed, Repeating);
        let tx_a = transfer([1u8; 32], 0, 1, &[(10, 2)]);

        let outcome = handler.process_epoch(&[tx_a.clone()]);
        assert_eq!(outcome.accepted, vec![tx_a]);
        assert!(outcome.rejected.is_empty());
    }
}
