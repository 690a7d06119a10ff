//! Command execution.

use crate::{Commands, StampAction};
use bloocoin_client::hash::HashedString;
use bloocoin_client::{Bloostamp, Client, Connector, StampStore};
use bloocoin_protocol::{commands, ReplyEnvelope};
use colored::Colorize;
use serde_json::Value;

/// Executes a command and returns the formatted output.
pub async fn execute<C: Connector>(
    client: &Client<C>,
    store: &StampStore,
    cmd: Commands,
) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Online => {
            if client.is_online().await {
                Ok(format!("{} {}", client.endpoint(), "is online".green()))
            } else {
                Ok(format!("{} {}", client.endpoint(), "is offline".red()))
            }
        }

        Commands::Register {
            generate: true, ..
        } => {
            if store.exists() {
                return Err(format!(
                    "a bloostamp already exists at {}",
                    store.path().display()
                )
                .into());
            }
            let stamp = Bloostamp::generate(&mut rand::thread_rng());
            if !client.register(&stamp.addr, &stamp.pwd).await? {
                return Ok(format!("{} address {}", "Rejected".red(), stamp.addr.cyan()));
            }
            store.write(&stamp)?;
            Ok(format!(
                "{} address {} (saved to {})",
                "Registered".green(),
                stamp.addr.cyan(),
                store.path().display()
            ))
        }

        Commands::Register { addr, pwd, .. } => {
            let (addr, pwd) = match (addr, pwd) {
                (Some(addr), Some(pwd)) => (addr, pwd),
                _ => {
                    let creds = client
                        .credentials()
                        .ok_or("no address given and no bloostamp stored")?;
                    (creds.addr.clone(), creds.pwd.clone())
                }
            };
            if client.register(&addr, &pwd).await? {
                Ok(format!("{} address {}", "Registered".green(), addr.cyan()))
            } else {
                Ok(format!("{} address {}", "Rejected".red(), addr.cyan()))
            }
        }

        Commands::Stamp { action } => stamp(store, action),

        Commands::Difficulty => {
            let difficulty = client.difficulty().await?;
            Ok(format!("Difficulty: {}", difficulty.to_string().yellow()))
        }

        Commands::Balance => {
            let amount = client.my_coins().await?;
            Ok(format!("Balance: {} BLC", amount.to_string().yellow()))
        }

        Commands::Send { to, amount } => {
            let tx = client.send_coin(&to, amount).await?;
            Ok(format!(
                "{} {} BLC from {} to {}",
                "Sent".green(),
                tx.amount,
                tx.from.cyan(),
                tx.to.cyan()
            ))
        }

        Commands::Check {
            winning_string,
            hash,
        } => {
            let hash = match hash {
                Some(h) => h,
                None => HashedString::sha512_of(winning_string.as_str()).hash,
            };
            let recorded = client.check(&winning_string, &hash).await?;
            Ok(format!("{} hash {}", "Accepted".green(), recorded))
        }

        Commands::Transactions => {
            let txs = client.transactions().await?;
            if txs.is_empty() {
                return Ok("No transactions".yellow().to_string());
            }
            let lines: Vec<String> = txs
                .iter()
                .map(|tx| format!("{} -> {}  {}", tx.from, tx.to, tx.amount))
                .collect();
            Ok(lines.join("\n"))
        }

        Commands::Total => {
            let amount = client.total_coins().await?;
            Ok(format!("Coins in circulation: {}", amount.to_string().yellow()))
        }

        Commands::CheckAddr { addr } => {
            let balance = client.check_addr(&addr).await?;
            Ok(format!(
                "{}: {} BLC",
                balance.addr.cyan(),
                balance.amount.to_string().yellow()
            ))
        }

        Commands::ListCommands => {
            let lines: Vec<String> = commands()
                .iter()
                .map(|d| {
                    if d.args.is_empty() {
                        d.name.to_string()
                    } else {
                        format!("{} ({})", d.name, d.args.join(", "))
                    }
                })
                .collect();
            Ok(lines.join("\n"))
        }

        Commands::Raw { command, args } => {
            let args = parse_json_arg(&args)?;
            let envelope: ReplyEnvelope<Value> = client.execute(&command, args, None).await?;
            Ok(serde_json::to_string_pretty(&envelope)?)
        }
    }
}

fn stamp(store: &StampStore, action: StampAction) -> Result<String, Box<dyn std::error::Error>> {
    match action {
        StampAction::Show => {
            if !store.exists() {
                return Ok(format!("No bloostamp at {}", store.path().display())
                    .yellow()
                    .to_string());
            }
            Ok(store.read()?.to_string())
        }

        StampAction::Generate { force } => {
            if store.exists() && !force {
                return Err(format!(
                    "a bloostamp already exists at {} (use --force to replace it)",
                    store.path().display()
                )
                .into());
            }
            let stamp = Bloostamp::generate(&mut rand::thread_rng());
            store.write(&stamp)?;
            Ok(format!(
                "{} {} (saved to {})",
                "Generated".green(),
                stamp,
                store.path().display()
            ))
        }
    }
}

/// Parses a JSON argument, or reads it from a file when prefixed with `@`.
fn parse_json_arg(arg: &str) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = arg.strip_prefix('@') {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(arg)?)
    }
}
