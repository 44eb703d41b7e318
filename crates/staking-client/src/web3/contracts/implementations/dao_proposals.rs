use std::sync::Arc;

use alloy::{
    dyn_abi::DynSolValue,
    eips::BlockId,
    primitives::{Address, TxHash, U256},
};
use log::{info, warn};

use crate::web3::contracts::constants::names::{
    ROCKET_DAO_NODE_TRUSTED, ROCKET_DAO_NODE_TRUSTED_PROPOSALS, ROCKET_DAO_PROPOSAL,
};
use crate::web3::contracts::core::error::{ContractError, ContractResult, InvokeError};
use crate::web3::contracts::core::invoker::{Clock, ContractInvoker, GasInfo};
use crate::web3::contracts::helpers::utils::{block_timestamp, read};
use crate::web3::contracts::structs::proposal::{Proposal, ProposalState};
use crate::web3::wallet::Wallet;

/// Lifecycle of oracle DAO proposals.
///
/// States are derived from raw proposal fields and block time on every
/// call; nothing is cached between calls.
pub struct ProposalStateMachine<I: ContractInvoker, C: Clock> {
    invoker: Arc<I>,
    clock: Arc<C>,
}

impl<I: ContractInvoker, C: Clock> Clone for ProposalStateMachine<I, C> {
    fn clone(&self) -> Self {
        Self {
            invoker: self.invoker.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<I: ContractInvoker, C: Clock> ProposalStateMachine<I, C> {
    pub fn new(invoker: Arc<I>, clock: Arc<C>) -> Self {
        Self { invoker, clock }
    }

    pub fn clock(&self) -> &Arc<C> {
        &self.clock
    }

    pub async fn get_proposal_count(&self, at: Option<BlockId>) -> ContractResult<u64> {
        read(self.invoker.as_ref(), ROCKET_DAO_PROPOSAL, "getTotal", &[], at)
            .await?
            .u64(0)
    }

    pub async fn get_proposal(&self, id: u64, at: Option<BlockId>) -> ContractResult<Proposal> {
        let total = self.get_proposal_count(at).await?;
        if id == 0 || id > total {
            return Err(ContractError::NotFound(format!("proposal {id}")));
        }

        let invoker = self.invoker.as_ref();
        let args = [DynSolValue::from(U256::from(id))];
        let (
            proposer,
            created,
            start,
            end,
            votes_for,
            votes_against,
            votes_required,
            executed,
            cancelled,
            member_count,
        ) = tokio::join!(
            read(invoker, ROCKET_DAO_PROPOSAL, "getProposer", &args, at),
            read(invoker, ROCKET_DAO_PROPOSAL, "getCreated", &args, at),
            read(invoker, ROCKET_DAO_PROPOSAL, "getStart", &args, at),
            read(invoker, ROCKET_DAO_PROPOSAL, "getEnd", &args, at),
            read(invoker, ROCKET_DAO_PROPOSAL, "getVotesFor", &args, at),
            read(invoker, ROCKET_DAO_PROPOSAL, "getVotesAgainst", &args, at),
            read(invoker, ROCKET_DAO_PROPOSAL, "getVotesRequired", &args, at),
            read(invoker, ROCKET_DAO_PROPOSAL, "getExecuted", &args, at),
            read(invoker, ROCKET_DAO_PROPOSAL, "getCancelled", &args, at),
            read(invoker, ROCKET_DAO_NODE_TRUSTED, "getMemberCount", &[], at),
        );

        Ok(Proposal {
            id,
            proposer: proposer?.address(0)?,
            created_at: created?.u64(0)?,
            vote_delay_end: start?.u64(0)?,
            voting_end: end?.u64(0)?,
            votes_for: votes_for?.uint(0)?,
            votes_against: votes_against?.uint(0)?,
            quorum_threshold: votes_required?.uint(0)?,
            member_count: member_count?.u64(0)?,
            executed: executed?.bool(0)?,
            cancelled: cancelled?.bool(0)?,
        })
    }

    /// Proposal together with the block time it was evaluated at.
    async fn snapshot(&self, id: u64, at: Option<BlockId>) -> ContractResult<(Proposal, u64)> {
        let (proposal, now) = tokio::join!(
            self.get_proposal(id, at),
            block_timestamp(self.clock.as_ref(), at),
        );
        Ok((proposal?, now?))
    }

    pub async fn get_state(&self, id: u64, at: Option<BlockId>) -> ContractResult<ProposalState> {
        let (proposal, now) = self.snapshot(id, at).await?;
        Ok(proposal.state_at(now))
    }

    pub async fn has_voted(
        &self,
        id: u64,
        voter: Address,
        at: Option<BlockId>,
    ) -> ContractResult<bool> {
        read(
            self.invoker.as_ref(),
            ROCKET_DAO_PROPOSAL,
            "getReceiptHasVoted",
            &[U256::from(id).into(), voter.into()],
            at,
        )
        .await?
        .bool(0)
    }

    async fn check_can_vote(&self, id: u64, voter: Address) -> ContractResult<()> {
        let (snapshot, voted) = tokio::join!(self.snapshot(id, None), self.has_voted(id, voter, None));
        let (proposal, now) = snapshot?;
        if voted? {
            return Err(ContractError::DuplicateVote {
                proposal_id: id,
                voter,
            });
        }
        let state = proposal.state_at(now);
        if state != ProposalState::Active {
            return Err(ContractError::VotingClosed {
                proposal_id: id,
                state,
            });
        }
        Ok(())
    }

    async fn check_can_execute(&self, id: u64) -> ContractResult<()> {
        let (proposal, now) = self.snapshot(id, None).await?;
        if proposal.executed {
            return Err(ContractError::AlreadyExecuted { proposal_id: id });
        }
        let state = proposal.state_at(now);
        if state != ProposalState::Succeeded {
            return Err(ContractError::NotSucceeded {
                proposal_id: id,
                state,
            });
        }
        Ok(())
    }

    /// Maps a rejected vote to its cause by re-reading the chain, so callers
    /// never depend on revert strings.
    async fn classify_vote_failure(&self, id: u64, voter: Address, err: InvokeError) -> ContractError {
        if let InvokeError::Reverted(reason) = &err {
            warn!("Vote by {voter} on proposal {id} reverted: {reason}");
            if let Err(cause) = self.check_can_vote(id, voter).await {
                return cause;
            }
        }
        ContractError::transaction(ROCKET_DAO_NODE_TRUSTED_PROPOSALS, "vote", err)
    }

    async fn classify_execute_failure(&self, id: u64, err: InvokeError) -> ContractError {
        if let InvokeError::Reverted(reason) = &err {
            warn!("Execution of proposal {id} reverted: {reason}");
            if let Err(cause) = self.check_can_execute(id).await {
                return cause;
            }
        }
        ContractError::transaction(ROCKET_DAO_NODE_TRUSTED_PROPOSALS, "execute", err)
    }

    /// Casts `wallet`'s vote. One vote per member; only while active.
    pub async fn vote(&self, id: u64, support: bool, wallet: &Wallet) -> ContractResult<TxHash> {
        let voter = wallet.address();
        self.check_can_vote(id, voter).await?;

        let args = [DynSolValue::from(U256::from(id)), DynSolValue::Bool(support)];
        match self
            .invoker
            .transact(ROCKET_DAO_NODE_TRUSTED_PROPOSALS, "vote", &args, wallet)
            .await
        {
            Ok(tx) => {
                info!("{voter} voted {support} on proposal {id} in {tx}");
                Ok(tx)
            }
            Err(err) => Err(self.classify_vote_failure(id, voter, err).await),
        }
    }

    /// Executes a succeeded proposal. Succeeds at most once per proposal.
    pub async fn execute(&self, id: u64, wallet: &Wallet) -> ContractResult<TxHash> {
        self.check_can_execute(id).await?;

        let args = [DynSolValue::from(U256::from(id))];
        match self
            .invoker
            .transact(ROCKET_DAO_NODE_TRUSTED_PROPOSALS, "execute", &args, wallet)
            .await
        {
            Ok(tx) => {
                info!("Proposal {id} executed by {} in {tx}", wallet.address());
                Ok(tx)
            }
            Err(err) => Err(self.classify_execute_failure(id, err).await),
        }
    }

    pub async fn estimate_vote_gas(
        &self,
        id: u64,
        support: bool,
        wallet: &Wallet,
    ) -> ContractResult<GasInfo> {
        let args = [DynSolValue::from(U256::from(id)), DynSolValue::Bool(support)];
        self.invoker
            .estimate_gas(ROCKET_DAO_NODE_TRUSTED_PROPOSALS, "vote", &args, wallet)
            .await
            .map(GasInfo::from_estimate)
            .map_err(|e| ContractError::transaction(ROCKET_DAO_NODE_TRUSTED_PROPOSALS, "vote", e))
    }

    pub async fn estimate_execute_gas(&self, id: u64, wallet: &Wallet) -> ContractResult<GasInfo> {
        let args = [DynSolValue::from(U256::from(id))];
        self.invoker
            .estimate_gas(ROCKET_DAO_NODE_TRUSTED_PROPOSALS, "execute", &args, wallet)
            .await
            .map(GasInfo::from_estimate)
            .map_err(|e| {
                ContractError::transaction(ROCKET_DAO_NODE_TRUSTED_PROPOSALS, "execute", e)
            })
    }
}
