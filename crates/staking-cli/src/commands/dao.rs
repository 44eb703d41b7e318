use alloy::primitives::U256;
use clap::Subcommand;
use eyre::Result;
use staking_client::web3::contracts::helpers::fixed_point::Ratio;
use staking_client::web3::contracts::implementations::dao_protocol::DaoProtocolSettings;
use staking_client::web3::contracts::implementations::proposal_driver::DriveOutcome;
use staking_client::web3::ChainInvoker;

use crate::commands::common::{
    block_id, create_contracts, create_wallet, parse_address, Contracts,
};
use crate::config::Config;

#[derive(Subcommand)]
pub(crate) enum DaoCommands {
    /// Show a proposal and its current state
    Proposal {
        #[arg(short = 'i', long)]
        id: u64,

        #[arg(short = 'b', long)]
        block: Option<u64>,
    },
    /// Vote on a proposal
    Vote {
        #[arg(short = 'i', long)]
        id: u64,

        /// Vote against instead of for
        #[arg(long)]
        against: bool,

        #[arg(short = 'k', long)]
        key: Option<String>,
    },
    /// Execute a succeeded proposal
    Execute {
        #[arg(short = 'i', long)]
        id: u64,

        #[arg(short = 'k', long)]
        key: Option<String>,
    },
    /// Vote with each key until the proposal passes, then execute it (dev chains only)
    Pass {
        #[arg(short = 'i', long)]
        id: u64,

        /// Member private keys, in voting order
        #[arg(short = 'k', long = "key", required = true)]
        keys: Vec<String>,
    },
    /// Show the proposal vote delay and voting window
    Settings {
        #[arg(short = 'b', long)]
        block: Option<u64>,
    },
    /// Bootstrap a boolean protocol setting
    BootstrapBool {
        #[arg(short = 'c', long)]
        contract: String,

        #[arg(short = 's', long)]
        setting: String,

        #[arg(short = 'v', long)]
        value: bool,

        #[arg(short = 'k', long)]
        key: Option<String>,
    },
    /// Bootstrap an integer protocol setting
    BootstrapUint {
        #[arg(short = 'c', long)]
        contract: String,

        #[arg(short = 's', long)]
        setting: String,

        /// Raw integer value
        #[arg(short = 'v', long)]
        value: String,

        #[arg(short = 'k', long)]
        key: Option<String>,
    },
    /// Bootstrap an address protocol setting
    BootstrapAddress {
        #[arg(short = 'c', long)]
        contract: String,

        #[arg(short = 's', long)]
        setting: String,

        #[arg(short = 'v', long)]
        value: String,

        #[arg(short = 'k', long)]
        key: Option<String>,
    },
    /// Set the share of interval rewards a claims contract receives
    BootstrapClaimer {
        #[arg(short = 'c', long)]
        contract: String,

        /// Fraction of rewards, between 0 and 1
        #[arg(short = 'p', long)]
        percent: f64,

        #[arg(short = 'k', long)]
        key: Option<String>,
    },
}

pub(crate) async fn handle_command(command: DaoCommands, config: &Config) -> Result<()> {
    match command {
        DaoCommands::Proposal { id, block } => show_proposal(id, block, config).await,
        DaoCommands::Vote { id, against, key } => vote(id, !against, key, config).await,
        DaoCommands::Execute { id, key } => execute(id, key, config).await,
        DaoCommands::Pass { id, keys } => pass(id, keys, config).await,
        DaoCommands::Settings { block } => show_settings(block, config).await,
        DaoCommands::BootstrapBool {
            contract,
            setting,
            value,
            key,
        } => {
            let contracts = create_contracts(config)?;
            let wallet = create_wallet(key, "guardian", config)?;
            let tx = protocol(&contracts)?
                .bootstrap_bool(&contract, &setting, value, &wallet)
                .await?;
            println!("Setting {contract}.{setting} = {value} in transaction: {tx}");
            Ok(())
        }
        DaoCommands::BootstrapUint {
            contract,
            setting,
            value,
            key,
        } => {
            let contracts = create_contracts(config)?;
            let wallet = create_wallet(key, "guardian", config)?;
            let value: U256 = value
                .parse()
                .map_err(|e| eyre::eyre!("Invalid integer {value}: {e}"))?;
            let tx = protocol(&contracts)?
                .bootstrap_uint(&contract, &setting, value, &wallet)
                .await?;
            println!("Setting {contract}.{setting} = {value} in transaction: {tx}");
            Ok(())
        }
        DaoCommands::BootstrapAddress {
            contract,
            setting,
            value,
            key,
        } => {
            let contracts = create_contracts(config)?;
            let wallet = create_wallet(key, "guardian", config)?;
            let value = parse_address(&value)?;
            let tx = protocol(&contracts)?
                .bootstrap_address(&contract, &setting, value, &wallet)
                .await?;
            println!("Setting {contract}.{setting} = {value} in transaction: {tx}");
            Ok(())
        }
        DaoCommands::BootstrapClaimer {
            contract,
            percent,
            key,
        } => {
            let contracts = create_contracts(config)?;
            let wallet = create_wallet(key, "guardian", config)?;
            let percent = Ratio::from_f64(percent)
                .ok_or_else(|| eyre::eyre!("Invalid percent: {percent}"))?;
            let dao = protocol(&contracts)?;
            let gas = dao
                .estimate_bootstrap_claimer(&contract, percent, &wallet)
                .await?;
            println!("Estimated gas: {}", gas.safe_gas_limit);
            let tx = dao.bootstrap_claimer(&contract, percent, &wallet).await?;
            println!("{contract} now receives {percent} of rewards, transaction: {tx}");
            Ok(())
        }
    }
}

fn protocol(contracts: &Contracts) -> Result<&DaoProtocolSettings<ChainInvoker>> {
    contracts
        .dao_protocol
        .as_ref()
        .ok_or_else(|| eyre::eyre!("DAO protocol contract not initialized"))
}

async fn show_proposal(id: u64, block: Option<u64>, config: &Config) -> Result<()> {
    let contracts = create_contracts(config)?;
    let at = block_id(block);
    let proposal = contracts.dao_proposals.get_proposal(id, at).await?;
    let state = contracts.dao_proposals.get_state(id, at).await?;
    println!("{}", serde_json::to_string_pretty(&proposal)?);
    println!("State: {state}");
    Ok(())
}

async fn vote(id: u64, support: bool, key: Option<String>, config: &Config) -> Result<()> {
    let contracts = create_contracts(config)?;
    let wallet = create_wallet(key, "member", config)?;
    let tx = contracts.dao_proposals.vote(id, support, &wallet).await?;
    println!("Voted {support} on proposal {id} in transaction: {tx}");
    Ok(())
}

async fn execute(id: u64, key: Option<String>, config: &Config) -> Result<()> {
    let contracts = create_contracts(config)?;
    let wallet = create_wallet(key, "member", config)?;
    let gas = contracts
        .dao_proposals
        .estimate_execute_gas(id, &wallet)
        .await?;
    println!("Estimated gas: {}", gas.safe_gas_limit);
    let tx = contracts.dao_proposals.execute(id, &wallet).await?;
    println!("Executed proposal {id} in transaction: {tx}");
    Ok(())
}

async fn pass(id: u64, keys: Vec<String>, config: &Config) -> Result<()> {
    let contracts = create_contracts(config)?;
    let voters = keys
        .into_iter()
        .map(|key| create_wallet(Some(key), "member", config))
        .collect::<Result<Vec<_>>>()?;

    match contracts.driver().pass_and_execute(id, &voters).await? {
        DriveOutcome::Executed(tx) => println!("Proposal {id} executed in transaction: {tx}"),
        DriveOutcome::Defeated => println!("Proposal {id} was defeated"),
    }
    Ok(())
}

async fn show_settings(block: Option<u64>, config: &Config) -> Result<()> {
    let contracts = create_contracts(config)?;
    let settings = contracts
        .dao_settings
        .as_ref()
        .ok_or_else(|| eyre::eyre!("DAO settings contract not initialized"))?;
    let at = block_id(block);
    let delay = settings.get_proposal_vote_delay_time(at).await?;
    let window = settings.get_proposal_vote_time(at).await?;
    println!("Vote delay: {}s", delay.as_secs());
    println!("Vote time: {}s", window.as_secs());
    Ok(())
}
