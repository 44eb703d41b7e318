use std::sync::Arc;
use std::time::Duration;

use alloy::eips::BlockId;

use crate::web3::contracts::constants::names::ROCKET_DAO_NODE_TRUSTED_SETTINGS_PROPOSALS;
use crate::web3::contracts::core::error::ContractResult;
use crate::web3::contracts::core::invoker::ContractInvoker;
use crate::web3::contracts::helpers::utils::read;

/// Oracle DAO proposal settings.
pub struct DaoTrustedNodeSettings<I: ContractInvoker> {
    invoker: Arc<I>,
}

impl<I: ContractInvoker> Clone for DaoTrustedNodeSettings<I> {
    fn clone(&self) -> Self {
        Self {
            invoker: self.invoker.clone(),
        }
    }
}

impl<I: ContractInvoker> DaoTrustedNodeSettings<I> {
    pub fn new(invoker: Arc<I>) -> Self {
        Self { invoker }
    }

    async fn get_duration(&self, method: &str, at: Option<BlockId>) -> ContractResult<Duration> {
        let seconds = read(
            self.invoker.as_ref(),
            ROCKET_DAO_NODE_TRUSTED_SETTINGS_PROPOSALS,
            method,
            &[],
            at,
        )
        .await?
        .u64(0)?;
        Ok(Duration::from_secs(seconds))
    }

    /// Delay between a proposal's creation and the opening of its vote.
    pub async fn get_proposal_vote_delay_time(&self, at: Option<BlockId>) -> ContractResult<Duration> {
        self.get_duration("getVoteDelayTime", at).await
    }

    /// Length of a proposal's voting window.
    pub async fn get_proposal_vote_time(&self, at: Option<BlockId>) -> ContractResult<Duration> {
        self.get_duration("getVoteTime", at).await
    }
}
