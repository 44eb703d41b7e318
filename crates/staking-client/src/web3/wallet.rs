use std::fmt;

use alloy::{
    network::EthereumWallet,
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};
use url::Url;

use crate::web3::contracts::core::error::{ContractError, ContractResult};

/// Provider that fills gas, nonce and chain id and signs with a wallet.
pub type WalletProvider = DynProvider;

/// Signing authority for state-changing calls.
///
/// Nothing in this crate holds a global signer: every write takes the
/// wallet that authorizes it.
#[derive(Clone)]
pub struct Wallet {
    pub wallet: EthereumWallet,
    pub signer: PrivateKeySigner,
}

impl Wallet {
    pub fn new(private_key: &str) -> ContractResult<Self> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .map_err(|e| ContractError::Config(format!("invalid private key: {e}")))?;
        Ok(Self::from_signer(signer))
    }

    pub fn from_signer(signer: PrivateKeySigner) -> Self {
        let wallet = EthereumWallet::from(signer.clone());
        Self { wallet, signer }
    }

    /// Throwaway key, for dev chains and tests.
    pub fn random() -> Self {
        Self::from_signer(PrivateKeySigner::random())
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Builds a signing provider for this wallet on top of `rpc_url`.
    pub fn connect(&self, rpc_url: Url) -> WalletProvider {
        ProviderBuilder::new()
            .wallet(self.wallet.clone())
            .connect_http(rpc_url)
            .erased()
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
