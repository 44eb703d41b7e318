use alloy::primitives::TxHash;
use log::{debug, info};

use crate::web3::contracts::core::error::{ContractError, ContractResult};
use crate::web3::contracts::core::invoker::{ContractInvoker, TimeAdvancer};
use crate::web3::contracts::helpers::utils::block_timestamp;
use crate::web3::contracts::implementations::dao_proposals::ProposalStateMachine;
use crate::web3::contracts::structs::proposal::ProposalState;
use crate::web3::wallet::Wallet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    Executed(TxHash),
    Defeated,
}

/// Walks a proposal through voting and execution on a dev chain.
pub struct ProposalDriver<I: ContractInvoker, C: TimeAdvancer> {
    machine: ProposalStateMachine<I, C>,
}

impl<I: ContractInvoker, C: TimeAdvancer> ProposalDriver<I, C> {
    pub fn new(machine: ProposalStateMachine<I, C>) -> Self {
        Self { machine }
    }

    /// Skips to the start of voting if the proposal is still pending.
    async fn wait_for_voting(&self, id: u64) -> ContractResult<()> {
        let clock = self.machine.clock().as_ref();
        let (proposal, now) = tokio::join!(
            self.machine.get_proposal(id, None),
            block_timestamp(clock, None),
        );
        let (proposal, now) = (proposal?, now?);
        if now < proposal.vote_delay_end {
            let wait = proposal.vote_delay_end - now;
            debug!("Proposal {id} opens in {wait}s, advancing chain time");
            clock
                .increase_time(wait)
                .await
                .map_err(|e| ContractError::transaction("evm", "increaseTime", e))?;
        }
        Ok(())
    }

    /// Votes `for` with each voter in turn until the proposal succeeds,
    /// then executes it with the first voter.
    ///
    /// Fails fast: the first rejected vote or execution is returned as is.
    pub async fn pass_and_execute(
        &self,
        id: u64,
        voters: &[Wallet],
    ) -> ContractResult<DriveOutcome> {
        let Some(executor) = voters.first() else {
            return Err(ContractError::Config(format!(
                "no voters given for proposal {id}"
            )));
        };

        self.wait_for_voting(id).await?;

        for voter in voters {
            match self.machine.get_state(id, None).await? {
                ProposalState::Succeeded => break,
                ProposalState::Defeated => {
                    info!("Proposal {id} was defeated");
                    return Ok(DriveOutcome::Defeated);
                }
                ProposalState::Active => {
                    self.machine.vote(id, true, voter).await?;
                }
                state => {
                    return Err(ContractError::VotingClosed {
                        proposal_id: id,
                        state,
                    })
                }
            }
        }

        let proposal = self.machine.get_proposal(id, None).await?;
        let now = block_timestamp(self.machine.clock().as_ref(), None).await?;
        if proposal.state_at(now) != ProposalState::Succeeded {
            return Err(ContractError::QuorumNotReached {
                proposal_id: id,
                votes_for: proposal.votes_for,
                quorum: proposal.quorum_threshold,
            });
        }

        let tx = self.machine.execute(id, executor).await?;
        Ok(DriveOutcome::Executed(tx))
    }
}
