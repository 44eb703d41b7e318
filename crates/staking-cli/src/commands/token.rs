use alloy::primitives::utils::format_ether;
use clap::Subcommand;
use eyre::Result;
use staking_client::web3::contracts::implementations::tokens::TokenContracts;
use staking_client::web3::contracts::structs::tokens::Token;
use staking_client::web3::ChainInvoker;

use crate::commands::common::{
    block_id, create_contracts, create_wallet, parse_address, parse_ether, Contracts,
};
use crate::config::Config;

#[derive(Subcommand)]
pub(crate) enum TokenCommands {
    /// Show ETH, nETH, rETH and RPL balances of an address
    Balances {
        #[arg(short = 'a', long)]
        address: String,

        #[arg(short = 'b', long)]
        block: Option<u64>,
    },
    /// Show the total supply of a token, and the ETH it holds if any
    Supply {
        /// rpl, reth or neth
        #[arg(short = 't', long)]
        token: Token,

        #[arg(short = 'b', long)]
        block: Option<u64>,
    },
    /// Show how much a spender may move on behalf of an owner
    Allowance {
        #[arg(short = 't', long)]
        token: Token,

        #[arg(short = 'o', long)]
        owner: String,

        #[arg(short = 's', long)]
        spender: String,
    },
    /// Transfer tokens from the signer
    Transfer {
        #[arg(short = 't', long)]
        token: Token,

        #[arg(short = 'a', long)]
        to: String,

        /// Amount in ETH units, supports decimals
        #[arg(short = 'm', long)]
        amount: String,

        #[arg(short = 'k', long)]
        key: Option<String>,
    },
    /// Allow a spender to move the signer's tokens
    Approve {
        #[arg(short = 't', long)]
        token: Token,

        #[arg(short = 's', long)]
        spender: String,

        #[arg(short = 'm', long)]
        amount: String,

        #[arg(short = 'k', long)]
        key: Option<String>,
    },
    /// Move tokens out of an owner's balance using the signer's allowance
    TransferFrom {
        #[arg(short = 't', long)]
        token: Token,

        #[arg(short = 'o', long)]
        from: String,

        #[arg(short = 'a', long)]
        to: String,

        #[arg(short = 'm', long)]
        amount: String,

        #[arg(short = 'k', long)]
        key: Option<String>,
    },
}

fn tokens(contracts: &Contracts) -> Result<&TokenContracts<ChainInvoker>> {
    contracts
        .tokens
        .as_ref()
        .ok_or_else(|| eyre::eyre!("Token contracts not initialized"))
}

pub(crate) async fn handle_command(command: TokenCommands, config: &Config) -> Result<()> {
    let contracts = create_contracts(config)?;
    let tokens = tokens(&contracts)?;

    match command {
        TokenCommands::Balances { address, block } => {
            let address = parse_address(&address)?;
            let balances = tokens.get_balances(address, block_id(block)).await?;
            println!("ETH:  {}", format_ether(balances.eth));
            println!("nETH: {}", format_ether(balances.neth));
            println!("rETH: {}", format_ether(balances.reth));
            println!("RPL:  {}", format_ether(balances.rpl));
        }
        TokenCommands::Supply { token, block } => {
            let at = block_id(block);
            let supply = tokens.total_supply(token, at).await?;
            println!("{token} total supply: {}", format_ether(supply));
            if token.holds_eth() {
                let held = tokens.contract_eth_balance(token, at).await?;
                println!("{token} contract holds: {} ETH", format_ether(held));
            }
        }
        TokenCommands::Allowance {
            token,
            owner,
            spender,
        } => {
            let allowance = tokens
                .allowance(token, parse_address(&owner)?, parse_address(&spender)?, None)
                .await?;
            println!("Allowance: {} {token}", format_ether(allowance));
        }
        TokenCommands::Transfer {
            token,
            to,
            amount,
            key,
        } => {
            let wallet = create_wallet(key, "default", config)?;
            let (to, amount) = (parse_address(&to)?, parse_ether(&amount)?);
            let gas = tokens
                .estimate_transfer_gas(token, to, amount, &wallet)
                .await?;
            println!("Estimated gas: {}", gas.safe_gas_limit);
            let tx = tokens.transfer(token, to, amount, &wallet).await?;
            println!(
                "Transferred {} {token} to {to} in transaction: {tx}",
                format_ether(amount)
            );
        }
        TokenCommands::Approve {
            token,
            spender,
            amount,
            key,
        } => {
            let wallet = create_wallet(key, "default", config)?;
            let (spender, amount) = (parse_address(&spender)?, parse_ether(&amount)?);
            let gas = tokens
                .estimate_approve_gas(token, spender, amount, &wallet)
                .await?;
            println!("Estimated gas: {}", gas.safe_gas_limit);
            let tx = tokens.approve(token, spender, amount, &wallet).await?;
            println!("Approved {spender} in transaction: {tx}");
        }
        TokenCommands::TransferFrom {
            token,
            from,
            to,
            amount,
            key,
        } => {
            let wallet = create_wallet(key, "default", config)?;
            let (from, to) = (parse_address(&from)?, parse_address(&to)?);
            let amount = parse_ether(&amount)?;
            let gas = tokens
                .estimate_transfer_from_gas(token, from, to, amount, &wallet)
                .await?;
            println!("Estimated gas: {}", gas.safe_gas_limit);
            let tx = tokens
                .transfer_from(token, from, to, amount, &wallet)
                .await?;
            println!("Moved {} {token} from {from} in transaction: {tx}", format_ether(amount));
        }
    }
    Ok(())
}
