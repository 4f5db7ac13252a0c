//! # CLI Interface
//!
//! Command-line argument structure for `xchain`, using `clap` derive.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Command-line client for XuperChain-style ledgers with oracle-held keys.
///
/// Keys never leave the signing oracle; every command that signs asks the
/// oracle configured in the client config file.
#[derive(Parser, Debug)]
#[command(name = "xchain", version, propagate_version = true)]
pub struct XchainCli {
    /// Path to the client configuration file (TOML).
    ///
    /// When omitted, defaults apply: a local oracle and a local node.
    #[arg(long, short = 'c', env = "XCHAIN_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log output format: `pretty` or `json`.
    #[arg(long, env = "XCHAIN_LOG_FORMAT", default_value = "pretty", global = true)]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the signing oracle is reachable.
    Ping,
    /// Manage oracle-held addresses and contract accounts.
    #[command(subcommand)]
    Account(AccountCommand),
    /// Print the balance of an address or contract account.
    Balance {
        address: String,
    },
    /// Transfer tokens.
    Transfer(TransferArgs),
    /// Invoke a contract method and submit the transaction.
    Invoke(ContractCallArgs),
    /// Query a contract method through pre-execution. Nothing is submitted.
    Query(ContractCallArgs),
    /// Look up a transaction by hex id.
    Tx {
        txid: String,
    },
    /// Look up a block by height.
    Block {
        height: i64,
    },
    /// Show the node's chains, heights and peers.
    Status,
    /// List contracts deployed under a contract account.
    Contracts {
        account: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    /// Ask the oracle to create a new key and print its address.
    Create,
    /// Check that the oracle holds a key for an address.
    Check {
        address: String,
    },
    /// Create a contract account (`XC` + 16 digits) owned by `--from`.
    NewContractAccount {
        #[arg(long)]
        from: String,
        /// Contract account name, e.g. `XC1234567890123456@xuper`.
        name: String,
        #[arg(long)]
        fee: Option<u64>,
    },
    /// List contract accounts whose ACL names an address.
    List {
        address: String,
    },
}

/// Who signs and how the transaction is paid for.
#[derive(Args, Debug)]
pub struct SenderArgs {
    /// Oracle-held address of the initiator.
    #[arg(long)]
    pub from: String,

    /// Act on behalf of this contract account.
    #[arg(long)]
    pub account: Option<String>,

    /// Explicit fee. Must cover pre-execution gas.
    #[arg(long)]
    pub fee: Option<u64>,

    /// Extra authorization token that must sign, e.g. `XC...@xuper/<address>`.
    #[arg(long = "require")]
    pub require: Vec<String>,

    /// Print the unsigned transaction instead of signing and posting it.
    #[arg(long)]
    pub build_only: bool,
}

#[derive(Args, Debug)]
pub struct TransferArgs {
    #[command(flatten)]
    pub sender: SenderArgs,

    /// Recipient address or contract account.
    #[arg(long)]
    pub to: String,

    #[arg(long)]
    pub amount: u64,

    /// Free-form description stored in the transaction.
    #[arg(long)]
    pub desc: Option<String>,
}

#[derive(Args, Debug)]
pub struct ContractCallArgs {
    #[command(flatten)]
    pub sender: SenderArgs,

    /// Contract virtual machine: `wasm`, `native` or `evm`.
    #[arg(long, default_value = "wasm")]
    pub module: String,

    /// Contract name.
    pub contract: String,

    /// Method name.
    pub method: String,

    /// Method arguments as `key=value`.
    #[arg(long = "arg", value_parser = parse_key_val)]
    pub args: Vec<(String, String)>,

    /// Tokens paid to the contract along with the call.
    #[arg(long, default_value_t = 0)]
    pub amount: u64,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", s))?;
    Ok((key.to_string(), value.to_string()))
}
