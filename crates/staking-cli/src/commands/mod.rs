use eyre::Result;

use crate::config::Config;

pub(crate) mod common;
pub(crate) mod dao;
pub(crate) mod rewards;
pub(crate) mod token;

pub(crate) use dao::DaoCommands;
pub(crate) use rewards::RewardsCommands;
pub(crate) use token::TokenCommands;

pub(crate) async fn handle_rewards_command(command: RewardsCommands, config: &Config) -> Result<()> {
    rewards::handle_command(command, config).await
}

pub(crate) async fn handle_dao_command(command: DaoCommands, config: &Config) -> Result<()> {
    dao::handle_command(command, config).await
}

pub(crate) async fn handle_token_command(command: TokenCommands, config: &Config) -> Result<()> {
    token::handle_command(command, config).await
}
