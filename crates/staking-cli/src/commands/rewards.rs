use alloy::primitives::utils::format_ether;
use clap::Subcommand;
use eyre::Result;
use staking_client::web3::contracts::constants::names::{
    ROCKET_CLAIM_NODE, ROCKET_CLAIM_TRUSTED_NODE,
};

use crate::commands::common::{block_id, create_contracts, create_wallet, parse_address};
use crate::config::Config;

#[derive(Subcommand)]
pub(crate) enum RewardsCommands {
    /// Show the current reward interval and when the next one starts
    Interval {
        /// Block number to read at (latest if omitted)
        #[arg(short = 'b', long)]
        block: Option<u64>,
    },
    /// Show the share of rewards each claimant category receives
    Categories {
        #[arg(short = 'b', long)]
        block: Option<u64>,
    },
    /// Show what a claimer can claim in the current interval
    Share {
        /// Claims contract name
        #[arg(short = 'c', long, default_value = ROCKET_CLAIM_NODE)]
        category: String,

        /// Claimer address
        #[arg(short = 'a', long)]
        address: String,

        #[arg(short = 'b', long)]
        block: Option<u64>,
    },
    /// Claim the signer's rewards for the current interval
    Claim {
        #[arg(short = 'c', long, default_value = ROCKET_CLAIM_NODE)]
        category: String,

        /// Private key (falls back to PRIVATE_KEY)
        #[arg(short = 'k', long)]
        key: Option<String>,
    },
}

pub(crate) async fn handle_command(command: RewardsCommands, config: &Config) -> Result<()> {
    match command {
        RewardsCommands::Interval { block } => show_interval(block, config).await,
        RewardsCommands::Categories { block } => show_categories(block, config).await,
        RewardsCommands::Share {
            category,
            address,
            block,
        } => show_share(category, address, block, config).await,
        RewardsCommands::Claim { category, key } => claim(category, key, config).await,
    }
}

async fn show_interval(block: Option<u64>, config: &Config) -> Result<()> {
    let contracts = create_contracts(config)?;
    let at = block_id(block);
    let status = contracts.rewards_pool.get_interval_status(at).await?;
    let total = contracts.rewards_pool.get_interval_rewards_total(at).await?;

    println!("Interval start: {}", status.interval.start);
    println!("Interval length: {}s", status.interval.duration.as_secs());
    println!("Block time: {}", status.current_time);
    println!(
        "Next interval: {} (in {}s)",
        status.next_interval_at, status.seconds_until_next
    );
    println!("Rewards this interval: {} RPL", format_ether(total));
    Ok(())
}

async fn show_categories(block: Option<u64>, config: &Config) -> Result<()> {
    let contracts = create_contracts(config)?;
    let configs = contracts
        .rewards_pool
        .get_category_configs(
            &[ROCKET_CLAIM_NODE, ROCKET_CLAIM_TRUSTED_NODE],
            block_id(block),
        )
        .await?;
    for category in configs {
        println!(
            "{}: {} of rewards, {}",
            category.name,
            category.global_percent,
            if category.enabled { "enabled" } else { "disabled" }
        );
    }
    Ok(())
}

async fn show_share(
    category: String,
    address: String,
    block: Option<u64>,
    config: &Config,
) -> Result<()> {
    let contracts = create_contracts(config)?;
    let claimer = parse_address(&address)?;
    let share = contracts
        .rewards_pool
        .get_claimer_share(&category, claimer, block_id(block))
        .await?;
    println!("{}", serde_json::to_string_pretty(&share)?);
    println!("Claimable: {} RPL", format_ether(share.amount_eligible));
    Ok(())
}

async fn claim(category: String, key: Option<String>, config: &Config) -> Result<()> {
    let contracts = create_contracts(config)?;
    let wallet = create_wallet(key, "claimer", config)?;

    let gas = contracts
        .rewards_pool
        .estimate_claim_gas(&category, &wallet)
        .await?;
    println!(
        "Estimated gas: {} (limit {})",
        gas.estimated_gas, gas.safe_gas_limit
    );

    let tx = contracts
        .rewards_pool
        .submit_claim(&category, wallet.address(), &wallet)
        .await?;
    println!("Claimed in transaction: {tx}");
    Ok(())
}
