mod wallet;

use anyhow::{Context, Result};
use std::env;
use vortex_config::VortexConfig;
use vortex_privacy::{Keypair, field_to_decimal, hash_decimal, vortex_id_field};

use wallet::{Spend, parse_amount, parse_key};

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let cmd = args[1].as_str();
    let rest = &args[2..];

    let result = match cmd {
        "keygen" => keygen(),
        "hash" => hash(rest),
        "vortex-id" => vortex_id(rest),
        "config" => {
            print!("{}", VortexConfig::generate_sample());
            Ok(())
        }
        "scan" => match keypair_arg(cmd, rest) {
            Ok(kp) => wallet::scan(&kp).await,
            Err(e) => Err(e),
        },
        "balance" => keypair_arg(cmd, rest).and_then(|kp| wallet::balance(&kp)),
        "deposit" | "transfer" | "withdraw" => match parse_spend(cmd, rest) {
            Ok((kp, spend)) => wallet::prepare(kp, spend).await,
            Err(e) => Err(e),
        },
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        _ => {
            println!("❌ Unknown command: {}", cmd);
            println!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn print_usage() {
    println!("Vortex CLI - shielded pool client");
    println!();
    println!("USAGE:");
    println!("  vortex <command> [args]");
    println!();
    println!("KEY COMMANDS:");
    println!("  keygen                                  Generate a new keypair");
    println!("  hash <a> [b] [c] [d]                    Poseidon hash of 1-4 field elements");
    println!("  vortex-id <hex>                         Field element for a pool object id");
    println!("  config                                  Print a sample vortex.toml");
    println!();
    println!("WALLET COMMANDS:");
    println!("  scan <sk>                               Scan new events into the inbox");
    println!("  balance <sk>                            Show notes held in the inbox");
    println!("  deposit <sk> <amount>                   Prepare a deposit proof input");
    println!("  transfer <sk> <pk> <enc-key> <amount>   Prepare a private transfer");
    println!("  withdraw <sk> <amount>                  Prepare a withdrawal");
    println!();
    println!("ENVIRONMENT VARIABLES:");
    println!("  VX_CONFIG            Path to vortex.toml");
    println!("  VX_GRAPHQL_URL       Event source endpoint");
    println!("  VX_PACKAGE_ID        Pool package id");
    println!("  VX_VORTEX_ID         Pool object id");
    println!("  VX_FULL_SCAN         Scan all history before spending (default: true)");
    println!("  RUST_LOG             Log level (debug/info/warn/error)");
}

fn keygen() -> Result<()> {
    let keypair = Keypair::random(&mut rand::thread_rng())?;
    println!("🔐 New Vortex keypair");
    println!("Private key:    {}", keypair.private_key_decimal());
    println!("Public key:     {}", keypair.public_key_decimal());
    println!("Encryption key: {}", keypair.encryption_key_decimal());
    println!();
    println!("⚠️  Keep the private key secret. Share the public and encryption keys to receive notes.");
    Ok(())
}

fn hash(args: &[String]) -> Result<()> {
    if args.is_empty() {
        println!("Usage: hash <a> [b] [c] [d]");
        return Ok(());
    }
    let inputs: Vec<&str> = args.iter().map(String::as_str).collect();
    println!("{}", hash_decimal(&inputs)?);
    Ok(())
}

fn vortex_id(args: &[String]) -> Result<()> {
    let Some(hex) = args.first() else {
        println!("Usage: vortex-id <hex object id>");
        return Ok(());
    };
    let id = vortex_id_field(hex).with_context(|| format!("invalid object id '{hex}'"))?;
    println!("{}", field_to_decimal(&id));
    Ok(())
}

fn keypair_arg(cmd: &str, args: &[String]) -> Result<Keypair> {
    let sk = args
        .first()
        .with_context(|| format!("Usage: {cmd} <private key> ..."))?;
    Keypair::from_private_key(sk).context("invalid private key")
}

fn parse_spend(cmd: &str, args: &[String]) -> Result<(Keypair, Spend)> {
    let keypair = keypair_arg(cmd, args)?;
    let arg = |i: usize, usage: &str| {
        args.get(i)
            .map(String::as_str)
            .with_context(|| format!("Usage: {cmd} {usage}"))
    };

    let spend = match cmd {
        "deposit" => Spend::Deposit {
            amount: parse_amount(arg(1, "<sk> <amount>")?)?,
        },
        "transfer" => {
            let usage = "<sk> <recipient-pk> <recipient-enc-key> <amount>";
            Spend::Transfer {
                recipient_public_key: parse_key("recipient public key", arg(1, usage)?)?,
                recipient_encryption_key: parse_key("recipient encryption key", arg(2, usage)?)?,
                amount: parse_amount(arg(3, usage)?)?,
            }
        }
        _ => Spend::Withdraw {
            amount: parse_amount(arg(1, "<sk> <amount>")?)?,
        },
    };
    Ok((keypair, spend))
}
