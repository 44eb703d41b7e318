use alloy::{
    dyn_abi::DynSolValue,
    eips::BlockId,
    primitives::{Address, TxHash, U256},
};
use async_trait::async_trait;
use serde::Serialize;

use crate::web3::contracts::core::error::InvokeError;
use crate::web3::wallet::Wallet;

pub type InvokeResult<T> = Result<T, InvokeError>;

/// Generic "call a contract method" primitive.
///
/// Contracts are addressed by their registered name; resolving the name to
/// an address and encoding/decoding the arguments is the implementation's
/// job. Token amounts and percentages cross this boundary as fixed-point
/// integers.
#[async_trait]
pub trait ContractInvoker: Send + Sync {
    /// Read-only call, as of `at` (latest block when `None`).
    async fn call(
        &self,
        contract: &str,
        method: &str,
        args: &[DynSolValue],
        at: Option<BlockId>,
    ) -> InvokeResult<Vec<DynSolValue>>;

    /// State-changing call signed by `wallet`. Returns once the transaction
    /// is mined.
    async fn transact(
        &self,
        contract: &str,
        method: &str,
        args: &[DynSolValue],
        wallet: &Wallet,
    ) -> InvokeResult<TxHash>;

    async fn estimate_gas(
        &self,
        contract: &str,
        method: &str,
        args: &[DynSolValue],
        wallet: &Wallet,
    ) -> InvokeResult<u64>;

    /// Native ETH balance of an account.
    async fn native_balance(&self, address: Address, at: Option<BlockId>) -> InvokeResult<U256>;

    /// Address a contract name resolves to.
    async fn contract_address(&self, contract: &str) -> InvokeResult<Address>;
}

/// Block-time oracle.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Timestamp (unix seconds) of the block at `at`, latest when `None`.
    async fn block_timestamp(&self, at: Option<BlockId>) -> InvokeResult<u64>;
}

/// Dev chains only: moves block time forward.
#[async_trait]
pub trait TimeAdvancer: Clock {
    async fn increase_time(&self, seconds: u64) -> InvokeResult<()>;
}

const GAS_LIMIT_MULTIPLIER_NUM: u64 = 3;
const GAS_LIMIT_MULTIPLIER_DEN: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GasInfo {
    pub estimated_gas: u64,
    pub safe_gas_limit: u64,
}

impl GasInfo {
    pub fn from_estimate(estimated_gas: u64) -> Self {
        let safe_gas_limit = estimated_gas.saturating_mul(GAS_LIMIT_MULTIPLIER_NUM)
            / GAS_LIMIT_MULTIPLIER_DEN;
        Self {
            estimated_gas,
            safe_gas_limit,
        }
    }
}
