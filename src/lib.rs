//! utxo-ledger - a single-node UTXO transaction validator and epoch batch applier
//!
//! # Architecture
//!
//! ## Ledger
//! - [`ledger`] - Unspent output pool, epoch handler and batch ordering policies
//! - [`transaction`] - Transaction types, signable encoding and validation
//!
//! ## Cryptography
//! - [`crypto`] - Signature verification oracle and secp256k1 key pairs
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Ledger
// ============================================================================
pub mod ledger;
pub mod transaction;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use crypto::{KeyPair, Secp256k1Verifier, SignatureVerifier};
pub use error::{ChainError, Result};
pub use ledger::{BatchPolicy, EpochOutcome, PolicyKind, TxHandler, UtxoPool};
pub use transaction::{Amount, Transaction, TxInput, TxOutput, TxSummary, Utxo};
