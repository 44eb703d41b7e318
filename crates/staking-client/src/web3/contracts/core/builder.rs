use std::sync::Arc;

use crate::web3::contracts::core::error::{ContractError, ContractResult};
use crate::web3::contracts::core::invoker::{Clock, ContractInvoker, TimeAdvancer};
use crate::web3::contracts::implementations::{
    dao_proposals::ProposalStateMachine, dao_protocol::DaoProtocolSettings,
    dao_settings::DaoTrustedNodeSettings, proposal_driver::ProposalDriver,
    rewards_pool::RewardsIntervalOracle, tokens::TokenContracts,
};

/// The protocol components, sharing one invoker and clock.
pub struct StakingContracts<I: ContractInvoker, C: Clock> {
    pub rewards_pool: RewardsIntervalOracle<I, C>,
    pub dao_proposals: ProposalStateMachine<I, C>,
    pub tokens: Option<TokenContracts<I>>,
    pub dao_protocol: Option<DaoProtocolSettings<I>>,
    pub dao_settings: Option<DaoTrustedNodeSettings<I>>,
}

impl<I: ContractInvoker, C: Clock> Clone for StakingContracts<I, C> {
    fn clone(&self) -> Self {
        Self {
            rewards_pool: self.rewards_pool.clone(),
            dao_proposals: self.dao_proposals.clone(),
            tokens: self.tokens.clone(),
            dao_protocol: self.dao_protocol.clone(),
            dao_settings: self.dao_settings.clone(),
        }
    }
}

impl<I: ContractInvoker, C: TimeAdvancer> StakingContracts<I, C> {
    /// Proposal driver over the same machine; needs a dev chain clock.
    pub fn driver(&self) -> ProposalDriver<I, C> {
        ProposalDriver::new(self.dao_proposals.clone())
    }
}

pub struct ContractBuilder<I: ContractInvoker, C: Clock> {
    invoker: Arc<I>,
    clock: Arc<C>,
    rewards_pool: Option<RewardsIntervalOracle<I, C>>,
    dao_proposals: Option<ProposalStateMachine<I, C>>,
    tokens: Option<TokenContracts<I>>,
    dao_protocol: Option<DaoProtocolSettings<I>>,
    dao_settings: Option<DaoTrustedNodeSettings<I>>,
}

impl<I: ContractInvoker, C: Clock> ContractBuilder<I, C> {
    pub fn new(invoker: Arc<I>, clock: Arc<C>) -> Self {
        Self {
            invoker,
            clock,
            rewards_pool: None,
            dao_proposals: None,
            tokens: None,
            dao_protocol: None,
            dao_settings: None,
        }
    }

    pub fn with_rewards_pool(mut self) -> Self {
        self.rewards_pool = Some(RewardsIntervalOracle::new(
            self.invoker.clone(),
            self.clock.clone(),
        ));
        self
    }

    pub fn with_dao_proposals(mut self) -> Self {
        self.dao_proposals = Some(ProposalStateMachine::new(
            self.invoker.clone(),
            self.clock.clone(),
        ));
        self
    }

    pub fn with_tokens(mut self) -> Self {
        self.tokens = Some(TokenContracts::new(self.invoker.clone()));
        self
    }

    pub fn with_dao_protocol(mut self) -> Self {
        self.dao_protocol = Some(DaoProtocolSettings::new(self.invoker.clone()));
        self
    }

    pub fn with_dao_settings(mut self) -> Self {
        self.dao_settings = Some(DaoTrustedNodeSettings::new(self.invoker.clone()));
        self
    }

    pub fn with_all(self) -> Self {
        self.with_rewards_pool()
            .with_dao_proposals()
            .with_tokens()
            .with_dao_protocol()
            .with_dao_settings()
    }

    /// Fails unless the rewards pool and the proposal machine were added.
    pub fn build(self) -> ContractResult<StakingContracts<I, C>> {
        Ok(StakingContracts {
            rewards_pool: self.rewards_pool.ok_or_else(|| {
                ContractError::Config("RewardsIntervalOracle not initialized".into())
            })?,
            dao_proposals: self.dao_proposals.ok_or_else(|| {
                ContractError::Config("ProposalStateMachine not initialized".into())
            })?,
            tokens: self.tokens,
            dao_protocol: self.dao_protocol,
            dao_settings: self.dao_settings,
        })
    }
}
