#![forbid(unsafe_code)]
//! Command-line host for the ledger: key generation, signing, single checks and epoch replay.

use clap::{Parser, Subcommand};
use colored::*;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use utxo_ledger::config::{load_config, load_config_from, Config};
use utxo_ledger::{KeyPair, PolicyKind, Secp256k1Verifier, Transaction, TxHandler, UtxoPool};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file (defaults to ./ledger.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level regardless of config
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generates a secp256k1 key pair
    Keygen,
    /// Signs one input of a transaction file in place
    Sign {
        /// Transaction JSON file
        tx: PathBuf,
        /// Index of the input to sign
        #[arg(long)]
        input: usize,
        /// Secret key as hex
        #[arg(long)]
        secret: String,
    },
    /// Checks a single transaction against a pool, exiting non-zero when it is invalid
    Check {
        /// Pool JSON file (list of {utxo, output} entries)
        #[arg(long)]
        pool: PathBuf,
        /// Transaction JSON file
        tx: PathBuf,
    },
    /// Applies a batch of transactions to a pool as one epoch
    Replay {
        /// Pool JSON file (list of {utxo, output} entries)
        #[arg(long)]
        pool: PathBuf,
        /// JSON file holding an array of transactions
        #[arg(long)]
        batch: PathBuf,
        /// Overrides the configured batch policy
        #[arg(long)]
        policy: Option<PolicyKind>,
        /// Where to write the resulting pool (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    init_logging(&config, cli.verbose)?;

    match cli.command {
        Commands::Keygen => keygen(),
        Commands::Sign { tx, input, secret } => sign(&tx, input, &secret)?,
        Commands::Check { pool, tx } => check(&pool, &tx)?,
        Commands::Replay {
            pool,
            batch,
            policy,
            out,
        } => replay(
            &pool,
            &batch,
            policy.unwrap_or(config.ledger.policy),
            out.as_deref(),
        )?,
    }

    Ok(())
}

fn init_logging(config: &Config, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        config.logging.max_level()?
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let value = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;
    Ok(value)
}

fn keygen() {
    let keypair = KeyPair::generate();
    println!("{}", "🔑 New key pair".bright_cyan().bold());
    println!(
        "public key: {}",
        hex::encode(keypair.public_key_bytes()).bright_green()
    );
    println!("secret key: {}", keypair.secret_key_hex().yellow());
}

fn sign(tx_path: &Path, input: usize, secret: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut tx: Transaction = read_json(tx_path)?;
    let keypair = KeyPair::from_secret_bytes(&hex::decode(secret)?)?;

    tx.sign_input(&keypair, input)?;
    std::fs::write(tx_path, serde_json::to_string_pretty(&tx)?)?;

    println!(
        "{} input {} of {} (tx hash now {})",
        "Signed".bright_green(),
        input,
        tx_path.display(),
        tx.hash_str()
    );
    Ok(())
}

fn check(pool_path: &Path, tx_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let pool: UtxoPool = read_json(pool_path)?;
    let tx: Transaction = read_json(tx_path)?;
    let handler = TxHandler::new(&pool);

    match handler.check_tx(&tx) {
        Ok(summary) => println!(
            "{} {} (in {}, out {}, fee {})",
            "✅ valid".bright_green().bold(),
            tx.hash_str(),
            summary.total_input,
            summary.total_output,
            summary.fee
        ),
        Err(reason) => {
            println!(
                "{} {}: {}",
                "❌ invalid".red().bold(),
                tx.hash_str(),
                reason
            );
            return Err(reason.into());
        }
    }
    Ok(())
}

fn replay(
    pool_path: &Path,
    batch_path: &Path,
    policy: PolicyKind,
    out: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let pool: UtxoPool = read_json(pool_path)?;
    let batch: Vec<Transaction> = read_json(batch_path)?;

    let mut handler = TxHandler::with_parts(&pool, Secp256k1Verifier, policy);
    let outcome = handler.process_epoch(&batch);

    eprintln!(
        "{}",
        format!("📦 Epoch replayed with {} policy", policy).bright_cyan()
    );
    for tx in &outcome.accepted {
        eprintln!("  {} {}", "accepted".bright_green(), tx.hash_str());
    }
    for (index, reason) in &outcome.rejected {
        eprintln!(
            "  {} #{} {}: {}",
            "rejected".red(),
            index,
            batch[*index].hash_str(),
            reason
        );
    }

    let new_pool = serde_json::to_string_pretty(handler.pool())?;
    match out {
        Some(path) => std::fs::write(path, new_pool)?,
        None => println!("{}", new_pool),
    }
    Ok(())
}
