use alloy::{
    dyn_abi::DynSolValue,
    eips::BlockId,
    primitives::{Address, U256},
};
use log::debug;

use crate::web3::contracts::core::error::{ContractError, ContractResult, InvokeError};
use crate::web3::contracts::core::invoker::{Clock, ContractInvoker};

const REVERT_MARKER: &str = "execution reverted";

/// Extracts the revert reason from a node error message.
///
/// Nodes format reverts as `... execution reverted: <reason>, data: ...`; a
/// revert without a reason string yields an empty reason.
pub fn revert_reason(message: &str) -> Option<String> {
    let start = message.find(REVERT_MARKER)? + REVERT_MARKER.len();
    let rest = message[start..].trim_start_matches(':').trim_start();
    let reason = match rest.find(", data:") {
        Some(end) => &rest[..end],
        None => rest,
    };
    Some(reason.trim().trim_matches('"').to_string())
}

pub fn classify_contract_error(err: alloy::contract::Error) -> InvokeError {
    let message = err.to_string();
    if let Some(reason) = revert_reason(&message) {
        return InvokeError::Reverted(reason);
    }
    match err {
        alloy::contract::Error::AbiError(_) => InvokeError::Decode(message),
        alloy::contract::Error::UnknownFunction(_) | alloy::contract::Error::UnknownSelector(_) => {
            InvokeError::Abi(message)
        }
        _ => InvokeError::Transport(message),
    }
}

pub fn first_address(values: &[DynSolValue]) -> Result<Address, String> {
    values
        .first()
        .ok_or("Missing address in response")?
        .as_address()
        .ok_or_else(|| "Failed to parse address".to_string())
}

/// Read-only call whose failure is reported as a chain read error.
pub async fn read<'a, I: ContractInvoker + ?Sized>(
    invoker: &I,
    contract: &'a str,
    method: &'a str,
    args: &[DynSolValue],
    at: Option<BlockId>,
) -> ContractResult<Response<'a>> {
    let values = invoker
        .call(contract, method, args, at)
        .await
        .map_err(|e| ContractError::read(contract, method, e))?;
    debug!("{contract}.{method} returned {} value(s)", values.len());
    Ok(Response::new(contract, method, values))
}

pub async fn block_timestamp<C: Clock + ?Sized>(clock: &C, at: Option<BlockId>) -> ContractResult<u64> {
    clock
        .block_timestamp(at)
        .await
        .map_err(|e| ContractError::read("block", "timestamp", e))
}

/// Typed view over the values returned by one contract call.
pub struct Response<'a> {
    contract: &'a str,
    method: &'a str,
    values: Vec<DynSolValue>,
}

impl<'a> Response<'a> {
    pub fn new(contract: &'a str, method: &'a str, values: Vec<DynSolValue>) -> Self {
        Self {
            contract,
            method,
            values,
        }
    }

    fn value(&self, index: usize) -> ContractResult<&DynSolValue> {
        self.values.get(index).ok_or_else(|| {
            ContractError::decode(
                self.contract,
                self.method,
                format!("missing return value {index}"),
            )
        })
    }

    fn mismatch(&self, index: usize, expected: &str) -> ContractError {
        ContractError::decode(
            self.contract,
            self.method,
            format!("return value {index} is not {expected}"),
        )
    }

    pub fn uint(&self, index: usize) -> ContractResult<U256> {
        self.value(index)?
            .as_uint()
            .map(|(value, _)| value)
            .ok_or_else(|| self.mismatch(index, "a uint"))
    }

    /// Uint that must fit in 64 bits (timestamps, counts, durations).
    pub fn u64(&self, index: usize) -> ContractResult<u64> {
        let value = self.uint(index)?;
        u64::try_from(value).map_err(|_| {
            ContractError::decode(
                self.contract,
                self.method,
                format!("return value {index} ({value}) overflows u64"),
            )
        })
    }

    pub fn bool(&self, index: usize) -> ContractResult<bool> {
        self.value(index)?
            .as_bool()
            .ok_or_else(|| self.mismatch(index, "a bool"))
    }

    pub fn address(&self, index: usize) -> ContractResult<Address> {
        self.value(index)?
            .as_address()
            .ok_or_else(|| self.mismatch(index, "an address"))
    }
}
