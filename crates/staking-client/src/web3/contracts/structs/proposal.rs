use std::fmt;

use alloy::primitives::{Address, U256};
use serde::Serialize;

use crate::web3::contracts::helpers::fixed_point::SCALE;

/// Vote weight of a single member; vote tallies on chain are kept in these
/// units.
pub const VOTE_WEIGHT: U256 = SCALE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProposalState {
    Pending,
    Active,
    Succeeded,
    Defeated,
    Executed,
    Cancelled,
}

impl ProposalState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProposalState::Defeated | ProposalState::Executed | ProposalState::Cancelled
        )
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProposalState::Pending => "pending",
            ProposalState::Active => "active",
            ProposalState::Succeeded => "succeeded",
            ProposalState::Defeated => "defeated",
            ProposalState::Executed => "executed",
            ProposalState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Snapshot of a proposal's raw on-chain fields.
///
/// The state is never stored: [`Proposal::state_at`] derives it from these
/// fields and a block timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Proposal {
    pub id: u64,
    pub proposer: Address,
    pub created_at: u64,
    /// Voting opens at this timestamp (`created_at` + vote delay).
    pub vote_delay_end: u64,
    /// Voting closes at this timestamp.
    pub voting_end: u64,
    pub votes_for: U256,
    pub votes_against: U256,
    pub quorum_threshold: U256,
    /// Members eligible to vote.
    pub member_count: u64,
    pub executed: bool,
    pub cancelled: bool,
}

impl Proposal {
    pub fn quorum_reached(&self) -> bool {
        self.votes_for >= self.quorum_threshold && self.votes_for > self.votes_against
    }

    /// Whether the votes not yet cast could still carry the proposal.
    pub fn success_possible(&self) -> bool {
        let cast = self.votes_for.saturating_add(self.votes_against);
        let remaining = (U256::from(self.member_count) * VOTE_WEIGHT).saturating_sub(cast);
        let best_case = self.votes_for.saturating_add(remaining);
        best_case >= self.quorum_threshold && best_case > self.votes_against
    }

    pub fn state_at(&self, now: u64) -> ProposalState {
        if self.cancelled {
            ProposalState::Cancelled
        } else if self.executed {
            ProposalState::Executed
        } else if now < self.vote_delay_end {
            ProposalState::Pending
        } else if self.quorum_reached() {
            ProposalState::Succeeded
        } else if now >= self.voting_end || !self.success_possible() {
            ProposalState::Defeated
        } else {
            ProposalState::Active
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn votes(count: u64) -> U256 {
        U256::from(count) * VOTE_WEIGHT
    }

    fn proposal() -> Proposal {
        Proposal {
            id: 1,
            proposer: Address::repeat_byte(0xaa),
            created_at: 1_000,
            vote_delay_end: 1_100,
            voting_end: 2_100,
            votes_for: U256::ZERO,
            votes_against: U256::ZERO,
            quorum_threshold: votes(2),
            member_count: 3,
            executed: false,
            cancelled: false,
        }
    }

    #[test]
    fn test_pending_until_vote_delay_end() {
        let mut p = proposal();
        assert_eq!(p.state_at(1_000), ProposalState::Pending);
        assert_eq!(p.state_at(1_099), ProposalState::Pending);
        assert_eq!(p.state_at(1_100), ProposalState::Active);

        // Even with quorum, nothing is reported before voting opens
        p.votes_for = votes(3);
        assert_eq!(p.state_at(1_099), ProposalState::Pending);
    }

    #[test]
    fn test_succeeded_requires_quorum() {
        let mut p = proposal();
        p.votes_for = votes(1);
        assert_eq!(p.state_at(1_200), ProposalState::Active);
        p.votes_for = votes(2);
        assert_eq!(p.state_at(1_200), ProposalState::Succeeded);
        // Stays succeeded after the voting window closes
        assert_eq!(p.state_at(5_000), ProposalState::Succeeded);
    }

    #[test]
    fn test_succeeded_requires_majority() {
        let mut p = proposal();
        p.member_count = 5;
        p.votes_for = votes(2);
        p.votes_against = votes(2);
        assert_eq!(p.state_at(1_200), ProposalState::Active);
        p.votes_against = votes(3);
        assert_eq!(p.state_at(1_200), ProposalState::Defeated);
    }

    #[test]
    fn test_defeated_when_window_closes() {
        let mut p = proposal();
        p.votes_for = votes(1);
        assert_eq!(p.state_at(2_099), ProposalState::Active);
        assert_eq!(p.state_at(2_100), ProposalState::Defeated);
    }

    #[test]
    fn test_defeated_when_success_impossible() {
        let mut p = proposal();
        p.votes_against = votes(2);
        assert!(!p.success_possible());
        assert_eq!(p.state_at(1_200), ProposalState::Defeated);
    }

    #[test]
    fn test_flags_take_precedence() {
        let mut p = proposal();
        p.votes_for = votes(2);
        p.executed = true;
        assert_eq!(p.state_at(1_200), ProposalState::Executed);
        p.cancelled = true;
        assert_eq!(p.state_at(1_200), ProposalState::Cancelled);
        assert!(ProposalState::Cancelled.is_terminal());
        assert!(!ProposalState::Succeeded.is_terminal());
    }
}
