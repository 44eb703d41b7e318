use std::sync::Arc;

use alloy::eips::BlockId;
use alloy::primitives::{Address, U256};
use eyre::Result;
use staking_client::web3::contracts::helpers::fixed_point::ether_to_wei;
use staking_client::web3::{ChainInvoker, ContractBuilder, StakingContracts, Wallet};

use crate::config::Config;

pub(crate) type Contracts = StakingContracts<ChainInvoker, ChainInvoker>;

pub(crate) fn create_contracts(config: &Config) -> Result<Contracts> {
    let invoker = Arc::new(ChainInvoker::new(
        config.get_rpc_url()?,
        config.get_storage_address()?,
    ));
    Ok(ContractBuilder::new(invoker.clone(), invoker)
        .with_all()
        .build()?)
}

pub(crate) fn create_wallet(key: Option<String>, role: &str, config: &Config) -> Result<Wallet> {
    let private_key = config.get_private_key(key, role)?;
    Ok(Wallet::new(&private_key)?)
}

pub(crate) fn parse_address(address: &str) -> Result<Address> {
    address
        .parse()
        .map_err(|e| eyre::eyre!("Invalid address {address}: {e}"))
}

/// Ether-denominated decimal string to wei, truncating.
pub(crate) fn parse_ether(amount: &str) -> Result<U256> {
    let value: f64 = amount
        .parse()
        .map_err(|_| eyre::eyre!("Invalid amount format: {amount}"))?;
    ether_to_wei(value).ok_or_else(|| eyre::eyre!("Amount out of range: {amount}"))
}

pub(crate) fn block_id(block: Option<u64>) -> Option<BlockId> {
    block.map(BlockId::number)
}
