//! Processing order for one epoch of candidate transactions.
//!
//! The handler walks candidates greedily in the order a policy schedules them, so
//! among conflicting candidates the one scheduled first wins.

use crate::ledger::UtxoPool;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

pub trait BatchPolicy {
    /// Returns candidate indices in the order they should be tried.
    ///
    /// `pool` is the state at the start of the epoch.
    fn schedule(&self, candidates: &[Transaction], pool: &UtxoPool) -> Vec<usize>;

    fn name(&self) -> &'static str;
}

/// Candidates are tried in the order given.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstSeen;

impl BatchPolicy for FirstSeen {
    fn schedule(&self, candidates: &[Transaction], _pool: &UtxoPool) -> Vec<usize> {
        (0..candidates.len()).collect()
    }

    fn name(&self) -> &'static str {
        "first-seen"
    }
}

/// Highest implicit fee first; ties keep input order.
///
/// Candidates whose fee cannot be computed at epoch start (for example because they
/// spend an output created in the same batch) follow in input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeePriority;

impl BatchPolicy for FeePriority {
    fn schedule(&self, candidates: &[Transaction], pool: &UtxoPool) -> Vec<usize> {
        let mut priced = Vec::with_capacity(candidates.len());
        let mut unpriced = Vec::new();
        for (index, tx) in candidates.iter().enumerate() {
            match tx.fee_against(pool) {
                Some(fee) => priced.push((index, fee)),
                None => unpriced.push(index),
            }
        }
        priced.sort_by_key(|&(_, fee)| Reverse(fee));
        priced
            .into_iter()
            .map(|(index, _)| index)
            .chain(unpriced)
            .collect()
    }

    fn name(&self) -> &'static str {
        "fee-priority"
    }
}

/// Ascending transaction hash, independent of arrival order.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashOrder;

impl BatchPolicy for HashOrder {
    fn schedule(&self, candidates: &[Transaction], _pool: &UtxoPool) -> Vec<usize> {
        let mut keyed: Vec<(usize, [u8; 32])> = candidates
            .iter()
            .enumerate()
            .map(|(index, tx)| (index, tx.hash()))
            .collect();
        keyed.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        keyed.into_iter().map(|(index, _)| index).collect()
    }

    fn name(&self) -> &'static str {
        "hash-order"
    }
}

/// Policy selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    #[default]
    FirstSeen,
    FeePriority,
    HashOrder,
}

impl BatchPolicy for PolicyKind {
    fn schedule(&self, candidates: &[Transaction], pool: &UtxoPool) -> Vec<usize> {
        match self {
            PolicyKind::FirstSeen => FirstSeen.schedule(candidates, pool),
            PolicyKind::FeePriority => FeePriority.schedule(candidates, pool),
            PolicyKind::HashOrder => HashOrder.schedule(candidates, pool),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PolicyKind::FirstSeen => FirstSeen.name(),
            PolicyKind::FeePriority => FeePriority.name(),
            PolicyKind::HashOrder => HashOrder.name(),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first-seen" => Ok(PolicyKind::FirstSeen),
            "fee-priority" => Ok(PolicyKind::FeePriority),
            "hash-order" => Ok(PolicyKind::HashOrder),
            other => Err(format!(
                "unknown policy '{}' (expected first-seen, fee-priority or hash-order)",
                other
            )),
        }
    }
}
