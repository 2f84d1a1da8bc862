//! Integration tests for single-transaction checks and epoch processing with real keys

use utxo_ledger::transaction::TxHash;
use utxo_ledger::{Amount, ChainError, KeyPair, Transaction, TxHandler, TxOutput, Utxo, UtxoPool};

const GENESIS: TxHash = [0xAB; 32];

fn coins(n: i64) -> Amount {
    Amount::from_num(n)
}

/// Pool holding U1 = 10 coins owned by `owner`.
fn genesis_pool(owner: &KeyPair) -> UtxoPool {
    let mut pool = UtxoPool::new();
    pool.add(
        Utxo::new(GENESIS, 0),
        TxOutput::new(coins(10), owner.public_key_bytes()),
    );
    pool
}

fn signed_spend(
    prev: TxHash,
    index: u32,
    signer: &KeyPair,
    outputs: &[(i64, &KeyPair)],
) -> Result<Transaction, ChainError> {
    let mut tx = Transaction::new();
    tx.add_input(prev, index);
    for (value, owner) in outputs {
        tx.add_output(coins(*value), owner.public_key_bytes());
    }
    tx.sign_input(signer, 0)?;
    Ok(tx)
}

#[test]
fn test_double_spend_in_batch() -> Result<(), Box<dyn std::error::Error>> {
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let carol = KeyPair::generate();
    let mut handler = TxHandler::new(&genesis_pool(&alice));

    let tx_a = signed_spend(GENESIS, 0, &alice, &[(6, &bob), (4, &alice)])?;
    let tx_b = signed_spend(GENESIS, 0, &alice, &[(10, &carol)])?;

    // Each is valid on its own.
    assert!(handler.is_valid_tx(&tx_a));
    assert!(handler.is_valid_tx(&tx_b));

    let accepted = handler.handle_txs(&[tx_a.clone(), tx_b.clone()]);
    assert_eq!(accepted, vec![tx_a.clone()]);

    let pool = handler.pool();
    assert!(!pool.contains(&Utxo::new(GENESIS, 0)));
    assert_eq!(pool.len(), 2);
    assert_eq!(pool.get(&Utxo::new(tx_a.hash(), 0)).map(|o| o.value), Some(coins(6)));
    assert_eq!(pool.get(&Utxo::new(tx_a.hash(), 1)).map(|o| o.value), Some(coins(4)));
    assert_eq!(pool.balance_of(&bob.public_key_bytes()), coins(6));
    assert_eq!(pool.balance_of(&carol.public_key_bytes()), Amount::ZERO);

    // The loser stays invalid afterwards.
    assert!(!handler.is_valid_tx(&tx_b));
    Ok(())
}

#[test]
fn test_chained_spend_accepted_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let carol = KeyPair::generate();
    let mut handler = TxHandler::new(&genesis_pool(&alice));

    let tx_a = signed_spend(GENESIS, 0, &alice, &[(6, &bob), (4, &alice)])?;
    let tx_c = signed_spend(tx_a.hash(), 0, &bob, &[(5, &carol)])?;

    assert!(!handler.is_valid_tx(&tx_c));

    let accepted = handler.handle_txs(&[tx_a.clone(), tx_c.clone()]);
    assert_eq!(accepted, vec![tx_a.clone(), tx_c.clone()]);

    let pool = handler.pool();
    assert!(!pool.contains(&Utxo::new(tx_a.hash(), 0)));
    assert!(pool.contains(&Utxo::new(tx_a.hash(), 1)));
    assert!(pool.contains(&Utxo::new(tx_c.hash(), 0)));
    assert_eq!(pool.total_value(), coins(9));
    Ok(())
}

#[test]
fn test_chained_spend_dropped_when_out_of_order() -> Result<(), Box<dyn std::error::Error>> {
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let carol = KeyPair::generate();
    let mut handler = TxHandler::new(&genesis_pool(&alice));

    let tx_a = signed_spend(GENESIS, 0, &alice, &[(6, &bob), (4, &alice)])?;
    let tx_c = signed_spend(tx_a.hash(), 0, &bob, &[(5, &carol)])?;

    let outcome = handler.process_epoch(&[tx_c.clone(), tx_a.clone()]);
    assert_eq!(outcome.accepted, vec![tx_a.clone()]);
    assert_eq!(
        outcome.rejected,
        vec![(0, ChainError::UtxoNotFound(Utxo::new(tx_a.hash(), 0)))]
    );

    // Dropped for the epoch, but valid in the next one.
    assert!(handler.pool().contains(&Utxo::new(tx_a.hash(), 0)));
    assert_eq!(handler.handle_txs(&[tx_c.clone()]), vec![tx_c]);
    Ok(())
}

#[test]
fn test_construction_copies_pool() -> Result<(), Box<dyn std::error::Error>> {
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let mut original = genesis_pool(&alice);
    let handler = TxHandler::new(&original);

    original.remove(&Utxo::new(GENESIS, 0));
    original.add(
        Utxo::new([0x01; 32], 0),
        TxOutput::new(coins(100), bob.public_key_bytes()),
    );

    assert!(handler.pool().contains(&Utxo::new(GENESIS, 0)));
    assert!(!handler.pool().contains(&Utxo::new([0x01; 32], 0)));

    let tx = signed_spend(GENESIS, 0, &alice, &[(10, &bob)])?;
    assert!(handler.is_valid_tx(&tx));
    Ok(())
}

#[test]
fn test_handler_does_not_leak_into_source_pool() -> Result<(), Box<dyn std::error::Error>> {
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let original = genesis_pool(&alice);
    let mut handler = TxHandler::new(&original);

    let tx = signed_spend(GENESIS, 0, &alice, &[(10, &bob)])?;
    assert_eq!(handler.handle_txs(&[tx]).len(), 1);

    assert!(original.contains(&Utxo::new(GENESIS, 0)));
    assert_eq!(original.len(), 1);
    Ok(())
}

#[test]
fn test_invalid_candidates_are_skipped() -> Result<(), Box<dyn std::error::Error>> {
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let mallory = KeyPair::generate();
    let mut handler = TxHandler::new(&genesis_pool(&alice));

    let forged = signed_spend(GENESIS, 0, &mallory, &[(10, &mallory)])?;
    let inflated = signed_spend(GENESIS, 0, &alice, &[(11, &bob)])?;
    let negative = signed_spend(GENESIS, 0, &alice, &[(-5, &bob), (15, &alice)])?;
    let missing = signed_spend([0x02; 32], 0, &alice, &[(1, &bob)])?;
    let honest = signed_spend(GENESIS, 0, &alice, &[(7, &bob)])?;

    let outcome = handler.process_epoch(&[forged, inflated, negative, missing, honest.clone()]);
    assert_eq!(outcome.accepted, vec![honest]);

    let reasons: Vec<ChainError> = outcome.rejected.into_iter().map(|(_, r)| r).collect();
    assert_eq!(reasons[0], ChainError::InvalidSignature { input_index: 0 });
    assert!(matches!(reasons[1], ChainError::InsufficientInput { .. }));
    assert!(matches!(reasons[2], ChainError::NegativeOutput { output_index: 0, .. }));
    assert_eq!(reasons[3], ChainError::UtxoNotFound(Utxo::new([0x02; 32], 0)));
    Ok(())
}

#[test]
fn test_multi_input_spend_needs_every_owner() -> Result<(), Box<dyn std::error::Error>> {
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let mut pool = genesis_pool(&alice);
    pool.add(
        Utxo::new(GENESIS, 1),
        TxOutput::new(coins(5), bob.public_key_bytes()),
    );
    let handler = TxHandler::new(&pool);

    let mut tx = Transaction::new();
    tx.add_input(GENESIS, 0)
        .add_input(GENESIS, 1)
        .add_output(coins(15), bob.public_key_bytes());
    tx.sign_input(&alice, 0)?;
    tx.sign_input(&alice, 1)?;
    assert_eq!(
        handler.check_tx(&tx),
        Err(ChainError::InvalidSignature { input_index: 1 })
    );

    tx.sign_input(&bob, 1)?;
    let summary = handler.check_tx(&tx)?;
    assert_eq!(summary.total_input, coins(15));
    assert_eq!(summary.fee, Amount::ZERO);
    Ok(())
}
