use alloy::primitives::{Address, U256};
use thiserror::Error;

use crate::web3::contracts::structs::proposal::ProposalState;

/// Failure reported by a [`ContractInvoker`](super::invoker::ContractInvoker)
/// before any domain meaning is attached to it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvokeError {
    // Resolution errors
    #[error("contract {0} is not registered")]
    UnknownContract(String),
    #[error("failed to load ABI: {0}")]
    Abi(String),

    // Execution errors
    #[error("execution reverted: {0}")]
    Reverted(String),
    #[error("transport error: {0}")]
    Transport(String),

    // Data parsing errors
    #[error("failed to decode response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum ContractError {
    // Read errors
    #[error("could not read {contract}.{method}: {source}")]
    ChainRead {
        contract: String,
        method: String,
        #[source]
        source: InvokeError,
    },
    #[error("{0} not found")]
    NotFound(String),

    // Rejected writes
    #[error("claim on {category} for {claimer} rejected: {reason}")]
    ClaimRejected {
        category: String,
        claimer: Address,
        reason: String,
    },
    #[error("{voter} has already voted on proposal {proposal_id}")]
    DuplicateVote { proposal_id: u64, voter: Address },
    #[error("voting on proposal {proposal_id} is closed (state {state})")]
    VotingClosed {
        proposal_id: u64,
        state: ProposalState,
    },
    #[error("proposal {proposal_id} has not succeeded (state {state})")]
    NotSucceeded {
        proposal_id: u64,
        state: ProposalState,
    },
    #[error("proposal {proposal_id} has already been executed")]
    AlreadyExecuted { proposal_id: u64 },
    #[error("transaction {contract}.{method} failed: {source}")]
    Transaction {
        contract: String,
        method: String,
        #[source]
        source: InvokeError,
    },

    // Business logic errors
    #[error("inconsistent chain state: {0}")]
    InconsistentState(String),
    #[error("proposal {proposal_id} did not reach quorum ({votes_for} of {quorum} votes)")]
    QuorumNotReached {
        proposal_id: u64,
        votes_for: U256,
        quorum: U256,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ContractError {
    /// Wraps a failed read. An unregistered contract surfaces as `NotFound`.
    pub fn read(contract: &str, method: &str, source: InvokeError) -> Self {
        match source {
            InvokeError::UnknownContract(name) => ContractError::NotFound(format!("contract {name}")),
            source => ContractError::ChainRead {
                contract: contract.to_string(),
                method: method.to_string(),
                source,
            },
        }
    }

    pub fn transaction(contract: &str, method: &str, source: InvokeError) -> Self {
        match source {
            InvokeError::UnknownContract(name) => ContractError::NotFound(format!("contract {name}")),
            source => ContractError::Transaction {
                contract: contract.to_string(),
                method: method.to_string(),
                source,
            },
        }
    }

    pub fn decode(contract: &str, method: &str, reason: impl Into<String>) -> Self {
        ContractError::ChainRead {
            contract: contract.to_string(),
            method: method.to_string(),
            source: InvokeError::Decode(reason.into()),
        }
    }

    /// Revert reason carried by a failed transaction, if any.
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            ContractError::Transaction {
                source: InvokeError::Reverted(reason),
                ..
            } => Some(reason),
            _ => None,
        }
    }
}

pub type ContractResult<T> = Result<T, ContractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_contract_maps_to_not_found() {
        let err = ContractError::read(
            "rocketClaimDAO",
            "getEnabled",
            InvokeError::UnknownContract("rocketClaimDAO".to_string()),
        );
        assert!(matches!(err, ContractError::NotFound(_)));

        let err = ContractError::read(
            "rocketRewardsPool",
            "getClaimIntervalTime",
            InvokeError::Transport("connection refused".to_string()),
        );
        assert!(matches!(err, ContractError::ChainRead { .. }));
        assert_eq!(
            err.to_string(),
            "could not read rocketRewardsPool.getClaimIntervalTime: transport error: connection refused"
        );
    }

    #[test]
    fn test_revert_reason() {
        let err = ContractError::transaction(
            "rocketClaimNode",
            "claim",
            InvokeError::Reverted("Claimer is not registered".to_string()),
        );
        assert_eq!(err.revert_reason(), Some("Claimer is not registered"));
        assert_eq!(ContractError::NotFound("x".into()).revert_reason(), None);
    }
}
