//! Wallet commands backed by the configured pool.

use anyhow::{Context, Result, bail};
use log::info;
use num_bigint::BigUint;
use std::path::Path;
use vortex_config::VortexConfig;
use vortex_core::{
    EventScanner, GraphQlEventSource, InboxState, PreparedTransaction, ScanBudget,
    TransactionPipeline,
};
use vortex_privacy::{Fr, Keypair, field_to_decimal, parse_field};

pub enum Spend {
    Deposit { amount: BigUint },
    Transfer { recipient_public_key: Fr, recipient_encryption_key: Fr, amount: BigUint },
    Withdraw { amount: BigUint },
}

fn pool_config() -> Result<&'static VortexConfig> {
    let config = VortexConfig::global();
    if !config.pool.is_configured() {
        bail!("pool is not configured: set [pool] package_id and vortex_id, or VX_PACKAGE_ID / VX_VORTEX_ID");
    }
    Ok(config)
}

/// Scan from the inbox cursor and persist what was found.
pub async fn scan(keypair: &Keypair) -> Result<()> {
    let config = pool_config()?;
    let source = GraphQlEventSource::from_config(&config.network)?;
    let scanner = EventScanner::from_config(source, config);

    let inbox_path = Path::new(&config.wallet.inbox_path);
    let mut inbox = InboxState::load(inbox_path)?;

    let budget = ScanBudget {
        max_pages: Some(config.scan.page_budget),
        stop_on_owned: config.scan.stop_on_owned,
    };
    let result = scanner
        .scan_with_budget(inbox.cursor.clone(), &budget, keypair)
        .await?;

    let added = inbox.absorb(&result, keypair);
    inbox.save(inbox_path)?;

    println!("Scanned {} events over {} pages", result.events.len(), result.pages);
    println!("New notes:  {}", added);
    println!("Balance:    {}", inbox.balance()?);
    if inbox.has_next {
        println!("More events pending, run scan again to continue");
    }
    Ok(())
}

pub fn balance(keypair: &Keypair) -> Result<()> {
    let config = VortexConfig::global();
    let inbox = InboxState::load(Path::new(&config.wallet.inbox_path))?;

    for utxo in inbox.to_utxos(keypair)? {
        println!("  #{:<10} {}", utxo.index(), utxo.amount());
    }
    println!("Balance: {}", inbox.balance()?);
    Ok(())
}

/// Build a proof input and print it as JSON.
pub async fn prepare(keypair: Keypair, spend: Spend) -> Result<()> {
    let config = pool_config()?;
    let source = GraphQlEventSource::from_config(&config.network)?;
    let pipeline = TransactionPipeline::from_config(source, keypair, config)?;

    let snapshot = pipeline.snapshot().await?;
    info!("root {}", field_to_decimal(&snapshot.root()));

    let mut rng = rand::thread_rng();
    let tx = match &spend {
        Spend::Deposit { amount } => pipeline.prepare_deposit(&snapshot, amount, &mut rng)?,
        Spend::Transfer {
            recipient_public_key,
            recipient_encryption_key,
            amount,
        } => pipeline.prepare_transfer(
            &snapshot,
            *recipient_public_key,
            recipient_encryption_key,
            amount,
            &mut rng,
        )?,
        Spend::Withdraw { amount } => pipeline.prepare_withdraw(&snapshot, amount, &mut rng)?,
    };

    report(&tx);
    println!("{}", serde_json::to_string_pretty(&tx.proof_input)?);
    Ok(())
}

fn report(tx: &PreparedTransaction) {
    eprintln!("Change:            {}", tx.change);
    for (i, nullifier) in tx.input_nullifiers.iter().enumerate() {
        eprintln!("Nullifier {}:       {}", i, field_to_decimal(nullifier));
    }
    for (i, (commitment, ciphertext)) in tx
        .output_commitments
        .iter()
        .zip(&tx.encrypted_outputs)
        .enumerate()
    {
        eprintln!("Commitment {}:      {}", i, field_to_decimal(commitment));
        eprintln!("Encrypted output {}: {}", i, hex::encode(ciphertext));
    }
}

pub fn parse_amount(value: &str) -> Result<BigUint> {
    BigUint::parse_bytes(value.as_bytes(), 10)
        .with_context(|| format!("'{value}' is not a valid amount"))
}

pub fn parse_key(label: &str, value: &str) -> Result<Fr> {
    parse_field(value).with_context(|| format!("invalid {label}"))
}
