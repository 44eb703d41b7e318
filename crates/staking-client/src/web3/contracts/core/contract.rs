use std::sync::Arc;

use alloy::{
    contract::{ContractInstance, Interface},
    dyn_abi::DynSolValue,
    eips::BlockId,
    json_abi::JsonAbi,
    network::ReceiptResponse,
    primitives::{Address, TxHash, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
};
use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, info, warn};
use url::Url;

use crate::web3::contracts::constants::names::ROCKET_STORAGE;
use crate::web3::contracts::core::error::InvokeError;
use crate::web3::contracts::core::invoker::{
    Clock, ContractInvoker, InvokeResult, TimeAdvancer,
};
use crate::web3::contracts::core::resolver::{contract_address_key, AddressResolver};
use crate::web3::contracts::helpers::utils::{classify_contract_error, first_address};
use crate::web3::wallet::Wallet;

macro_rules! include_abi {
    ($path:expr) => {{
        const ABI_BYTES: &[u8] = include_bytes!($path);
        ABI_BYTES
    }};
}

fn abi_artifact(contract: &str) -> Option<&'static [u8]> {
    let artifact = match contract {
        "rocketStorage" => include_abi!("../../../../artifacts/abi/rocket_storage.json"),
        "rocketRewardsPool" => include_abi!("../../../../artifacts/abi/rewards_pool.json"),
        "rocketClaimNode" | "rocketClaimTrustedNode" | "rocketClaimDAO" => {
            include_abi!("../../../../artifacts/abi/claims.json")
        }
        "rocketDAOProposal" => include_abi!("../../../../artifacts/abi/dao_proposal.json"),
        "rocketDAONodeTrusted" => include_abi!("../../../../artifacts/abi/dao_node_trusted.json"),
        "rocketDAONodeTrustedProposals" => {
            include_abi!("../../../../artifacts/abi/dao_node_trusted_proposals.json")
        }
        "rocketDAONodeTrustedSettingsProposals" => {
            include_abi!("../../../../artifacts/abi/dao_node_trusted_settings_proposals.json")
        }
        "rocketDAOProtocol" => include_abi!("../../../../artifacts/abi/dao_protocol.json"),
        "rocketTokenRPL" | "rocketTokenRETH" | "rocketTokenNETH" => {
            include_abi!("../../../../artifacts/abi/erc20.json")
        }
        _ => return None,
    };
    Some(artifact)
}

#[derive(Clone)]
pub struct Contract<P: alloy_provider::Provider> {
    instance: ContractInstance<P>,
}

impl<P: alloy_provider::Provider> Contract<P> {
    pub fn new(address: Address, provider: P, interface: Interface) -> Self {
        let instance = ContractInstance::new(address, provider, interface);
        Self { instance }
    }

    pub fn instance(&self) -> &ContractInstance<P> {
        &self.instance
    }
}

/// [`ContractInvoker`] over a JSON-RPC endpoint.
///
/// Reads go through a shared read-only provider. Writes build a signing
/// provider for the wallet passed to each call.
#[derive(Clone)]
pub struct ChainInvoker {
    rpc_url: Url,
    provider: DynProvider,
    storage_address: Address,
    resolver: AddressResolver,
    interfaces: Arc<DashMap<String, Interface>>,
}

impl ChainInvoker {
    pub fn new(rpc_url: Url, storage_address: Address) -> Self {
        let provider = ProviderBuilder::new()
            .connect_http(rpc_url.clone())
            .erased();
        Self {
            rpc_url,
            provider,
            storage_address,
            resolver: AddressResolver::new(),
            interfaces: Arc::new(DashMap::new()),
        }
    }

    fn interface(&self, contract: &str) -> InvokeResult<Interface> {
        if let Some(interface) = self.interfaces.get(contract) {
            return Ok(interface.clone());
        }
        let artifact = abi_artifact(contract)
            .ok_or_else(|| InvokeError::Abi(format!("no ABI bundled for {contract}")))?;
        let abi: JsonAbi = serde_json::from_slice(artifact)
            .map_err(|e| InvokeError::Abi(format!("{contract}: {e}")))?;
        let interface = Interface::new(abi);
        self.interfaces
            .insert(contract.to_string(), interface.clone());
        Ok(interface)
    }

    async fn lookup_address(&self, contract: &str) -> InvokeResult<Address> {
        if contract == ROCKET_STORAGE {
            return Ok(self.storage_address);
        }
        let storage = Contract::new(
            self.storage_address,
            self.provider.clone(),
            self.interface(ROCKET_STORAGE)?,
        );
        let key = DynSolValue::FixedBytes(contract_address_key(contract), 32);
        let result = storage
            .instance()
            .function("getAddress", &[key])
            .map_err(|e| InvokeError::Abi(e.to_string()))?
            .call()
            .await
            .map_err(classify_contract_error)?;
        first_address(&result).map_err(InvokeError::Decode)
    }

    async fn bind<P: alloy_provider::Provider>(
        &self,
        contract: &str,
        provider: P,
    ) -> InvokeResult<Contract<P>> {
        let address = self.contract_address(contract).await?;
        Ok(Contract::new(address, provider, self.interface(contract)?))
    }
}

#[async_trait]
impl ContractInvoker for ChainInvoker {
    async fn call(
        &self,
        contract: &str,
        method: &str,
        args: &[DynSolValue],
        at: Option<BlockId>,
    ) -> InvokeResult<Vec<DynSolValue>> {
        debug!("Calling {contract}.{method} at {at:?}");
        let bound = self.bind(contract, self.provider.clone()).await?;
        let mut call = bound
            .instance()
            .function(method, args)
            .map_err(|e| InvokeError::Abi(e.to_string()))?;
        if let Some(block) = at {
            call = call.block(block);
        }
        call.call().await.map_err(classify_contract_error)
    }

    async fn transact(
        &self,
        contract: &str,
        method: &str,
        args: &[DynSolValue],
        wallet: &Wallet,
    ) -> InvokeResult<TxHash> {
        let bound = self
            .bind(contract, wallet.connect(self.rpc_url.clone()))
            .await?;
        let call = bound
            .instance()
            .function(method, args)
            .map_err(|e| InvokeError::Abi(e.to_string()))?;

        let pending = call.send().await.map_err(|e| {
            warn!("Sending {contract}.{method} from {} failed: {e}", wallet.address());
            classify_contract_error(e)
        })?;
        let tx_hash = *pending.tx_hash();
        debug!("Transaction {tx_hash} sent, waiting for receipt");

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| InvokeError::Transport(e.to_string()))?;
        if !receipt.status() {
            return Err(InvokeError::Reverted(format!(
                "transaction {tx_hash} reverted on chain"
            )));
        }
        info!("{contract}.{method} mined in transaction {tx_hash}");
        Ok(tx_hash)
    }

    async fn estimate_gas(
        &self,
        contract: &str,
        method: &str,
        args: &[DynSolValue],
        wallet: &Wallet,
    ) -> InvokeResult<u64> {
        let bound = self.bind(contract, self.provider.clone()).await?;
        bound
            .instance()
            .function(method, args)
            .map_err(|e| InvokeError::Abi(e.to_string()))?
            .from(wallet.address())
            .estimate_gas()
            .await
            .map_err(classify_contract_error)
    }

    async fn native_balance(&self, address: Address, at: Option<BlockId>) -> InvokeResult<U256> {
        let mut request = self.provider.get_balance(address);
        if let Some(block) = at {
            request = request.block_id(block);
        }
        request
            .await
            .map_err(|e| InvokeError::Transport(e.to_string()))
    }

    async fn contract_address(&self, contract: &str) -> InvokeResult<Address> {
        self.resolver
            .resolve(contract, || self.lookup_address(contract))
            .await
    }
}

#[async_trait]
impl Clock for ChainInvoker {
    async fn block_timestamp(&self, at: Option<BlockId>) -> InvokeResult<u64> {
        let block = self
            .provider
            .get_block(at.unwrap_or(BlockId::latest()))
            .await
            .map_err(|e| InvokeError::Transport(e.to_string()))?
            .ok_or_else(|| InvokeError::Decode(format!("block {at:?} not found")))?;
        Ok(block.header.timestamp)
    }
}

#[async_trait]
impl TimeAdvancer for ChainInvoker {
    async fn increase_time(&self, seconds: u64) -> InvokeResult<()> {
        info!("Increasing dev chain time by {seconds}s");
        self.provider
            .raw_request::<_, serde_json::Value>("evm_increaseTime".into(), (seconds,))
            .await
            .map_err(|e| InvokeError::Transport(e.to_string()))?;
        self.provider
            .raw_request::<_, serde_json::Value>("evm_mine".into(), Vec::<u64>::new())
            .await
            .map_err(|e| InvokeError::Transport(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web3::contracts::constants::names::*;

    #[test]
    fn test_bundled_abis_parse() {
        let invoker = ChainInvoker::new(
            Url::parse("http://localhost:8545").unwrap(),
            Address::repeat_byte(0x11),
        );
        for contract in [
            ROCKET_STORAGE,
            ROCKET_REWARDS_POOL,
            ROCKET_CLAIM_NODE,
            ROCKET_CLAIM_TRUSTED_NODE,
            ROCKET_DAO_PROPOSAL,
            ROCKET_DAO_NODE_TRUSTED,
            ROCKET_DAO_NODE_TRUSTED_PROPOSALS,
            ROCKET_DAO_NODE_TRUSTED_SETTINGS_PROPOSALS,
            ROCKET_DAO_PROTOCOL,
            ROCKET_TOKEN_RPL,
            ROCKET_TOKEN_RETH,
            ROCKET_TOKEN_NETH,
        ] {
            let interface = invoker.interface(contract).unwrap();
            assert!(!interface.abi().functions.is_empty(), "{contract}");
        }
        assert!(matches!(
            invoker.interface("rocketMinipoolManager"),
            Err(InvokeError::Abi(_))
        ));
    }

    #[tokio::test]
    async fn test_storage_address_needs_no_lookup() {
        let storage = Address::repeat_byte(0x11);
        let invoker = ChainInvoker::new(Url::parse("http://localhost:8545").unwrap(), storage);
        assert_eq!(
            invoker.contract_address(ROCKET_STORAGE).await.unwrap(),
            storage
        );
    }
}
