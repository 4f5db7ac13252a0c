// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # xchain
//!
//! Entry point for the `xchain` binary. Parses CLI arguments, initializes
//! logging, loads the client configuration and runs one command against
//! the configured signing oracle and ledger node.
//!
//! Results are printed to stdout as JSON; logs go to stderr.

mod cli;
mod logging;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;

use xchain_sdk::{
    Client, ClientConfig, ContractArgs, ContractModule, Identity, RequestOptions,
    SigningOracle, Transaction,
};

use cli::{AccountCommand, Commands, ContractCallArgs, SenderArgs, XchainCli};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = XchainCli::parse();
    logging::init_logging(
        "xchain=info,xchain_sdk=info",
        LogFormat::from_str_lossy(&cli.log_format),
    );

    let config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    let client = Client::connect(config).context("failed to set up ledger client")?;
    let oracle = client
        .http_oracle()
        .context("failed to set up signing oracle client")?;

    match cli.command {
        Commands::Ping => {
            oracle.ping().await.context("signing oracle ping failed")?;
            print_json(&json!({ "oracle": "ok" }))
        }
        Commands::Account(command) => account(&client, oracle, command).await,
        Commands::Balance { address } => {
            let balance = client
                .query_balance(&address)
                .await
                .with_context(|| format!("failed to query balance of {}", address))?;
            print_json(&json!({ "address": address, "balance": balance }))
        }
        Commands::Transfer(args) => {
            let from = sender(oracle, &args.sender).await?;
            let mut options = options(&args.sender);
            if let Some(desc) = args.desc {
                options = options.desc(desc);
            }
            let tx = client
                .transfer(&from, &args.to, args.amount, options)
                .await
                .context("transfer failed")?;
            print_tx(&tx)
        }
        Commands::Invoke(call) => {
            let from = sender(oracle, &call.sender).await?;
            let module: ContractModule = call.module.parse()?;
            let tx = client
                .invoke_contract(
                    &from,
                    module,
                    &call.contract,
                    &call.method,
                    contract_args(&call),
                    call.amount,
                    options(&call.sender),
                )
                .await
                .with_context(|| format!("invoking {}.{} failed", call.contract, call.method))?;
            print_tx(&tx)
        }
        Commands::Query(call) => {
            let from = sender(oracle, &call.sender).await?;
            let module: ContractModule = call.module.parse()?;
            let result = client
                .query_contract(
                    &from,
                    module,
                    &call.contract,
                    &call.method,
                    contract_args(&call),
                    options(&call.sender),
                )
                .await
                .with_context(|| format!("querying {}.{} failed", call.contract, call.method))?;
            let response = result.contract_response.unwrap_or_default();
            print_json(&json!({
                "status": response.status,
                "message": response.message,
                "body": String::from_utf8_lossy(&response.body),
                "gas_used": result.gas_used,
            }))
        }
        Commands::Tx { txid } => {
            let id = hex::decode(&txid).context("transaction id must be hex")?;
            let record = client
                .query_tx(&id)
                .await
                .with_context(|| format!("failed to query transaction {}", txid))?;
            print_json(&serde_json::to_value(record)?)
        }
        Commands::Block { height } => {
            let block = client
                .query_block_by_height(height)
                .await
                .with_context(|| format!("failed to query block at height {}", height))?;
            print_json(&serde_json::to_value(block)?)
        }
        Commands::Status => {
            let status = client
                .query_system_status()
                .await
                .context("failed to query node status")?;
            print_json(&serde_json::to_value(status)?)
        }
        Commands::Contracts { account } => {
            let contracts = client
                .query_account_contracts(&account)
                .await
                .with_context(|| format!("failed to list contracts of {}", account))?;
            print_json(&serde_json::to_value(contracts)?)
        }
    }
}

async fn account(
    client: &Client,
    oracle: Arc<dyn SigningOracle>,
    command: AccountCommand,
) -> Result<()> {
    match command {
        AccountCommand::Create => {
            let identity = Identity::create(oracle)
                .await
                .context("oracle failed to create an address")?;
            tracing::info!(address = identity.address(), "created oracle-held address");
            print_json(&json!({ "address": identity.address() }))
        }
        AccountCommand::Check { address } => {
            let exists = oracle
                .exists(&address)
                .await
                .with_context(|| format!("failed to check {}", address))?;
            print_json(&json!({ "address": address, "exists": exists }))
        }
        AccountCommand::NewContractAccount { from, name, fee } => {
            let from = Identity::recover(oracle, &from)
                .await
                .with_context(|| format!("oracle holds no key for {}", from))?;
            let mut options = RequestOptions::new();
            if let Some(fee) = fee {
                options = options.fee(fee);
            }
            let tx = client
                .create_contract_account(&from, &name, options)
                .await
                .with_context(|| format!("creating contract account {} failed", name))?;
            print_tx(&tx)
        }
        AccountCommand::List { address } => {
            let accounts = client
                .query_accounts_by_address(&address)
                .await
                .with_context(|| format!("failed to list accounts of {}", address))?;
            print_json(&json!({ "address": address, "accounts": accounts }))
        }
    }
}

/// Recovers the initiator and binds it to `--account` when given.
async fn sender(oracle: Arc<dyn SigningOracle>, args: &SenderArgs) -> Result<Identity> {
    let identity = Identity::recover(oracle, &args.from)
        .await
        .with_context(|| format!("oracle holds no key for {}", args.from))?;
    match &args.account {
        Some(account) => Ok(identity.with_contract_account(account)?),
        None => Ok(identity),
    }
}

fn options(args: &SenderArgs) -> RequestOptions {
    let mut options = RequestOptions::new();
    if let Some(fee) = args.fee {
        options = options.fee(fee);
    }
    for token in &args.require {
        options = options.require_signer(token.clone());
    }
    if args.build_only {
        options = options.build_only();
    }
    options
}

fn contract_args(call: &ContractCallArgs) -> ContractArgs {
    call.args.iter().cloned().collect()
}

fn print_tx(tx: &Transaction) -> Result<()> {
    print_json(&json!({
        "txid": tx.txid_hex(),
        "state": tx.state().to_string(),
        "fee": tx.fee(),
        "gas_used": tx.gas_used(),
        "missing_signers": tx.missing_signers(),
        "tx": tx.to_signed(),
    }))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
