//! Error types for the ledger

use thiserror::Error;

use crate::transaction::{Amount, Utxo};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChainError {
    #[error("UTXO not found: {0}")]
    UtxoNotFound(Utxo),

    #[error("Invalid signature on input {input_index}")]
    InvalidSignature { input_index: usize },

    #[error("Double spend detected: {0} is claimed more than once")]
    DoubleSpendDetected(Utxo),

    #[error("Output {output_index} has negative value {value}")]
    NegativeOutput { output_index: usize, value: Amount },

    #[error("Insufficient input value: have {have}, need {need}")]
    InsufficientInput { have: Amount, need: Amount },

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Input index {0} out of range")]
    InputIndexOutOfRange(usize),

    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
