use std::future::Future;
use std::sync::Arc;

use alloy::primitives::{keccak256, Address, B256};
use dashmap::DashMap;
use log::debug;
use tokio::sync::OnceCell;

use crate::web3::contracts::core::error::InvokeError;
use crate::web3::contracts::core::invoker::InvokeResult;

/// Storage key under which the protocol registers a contract's address.
pub fn contract_address_key(name: &str) -> B256 {
    keccak256(format!("contract.address{name}").as_bytes())
}

/// Lazily resolves contract names to addresses, at most once per name.
///
/// Concurrent callers for the same name wait on that name's cell, so the
/// lookup runs once and every caller sees the same address. Resolved
/// addresses are never invalidated. A failed lookup leaves the cell empty
/// and the next caller tries again.
#[derive(Clone, Default)]
pub struct AddressResolver {
    cells: Arc<DashMap<String, Arc<OnceCell<Address>>>>,
}

impl AddressResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn resolve<F, Fut>(&self, name: &str, lookup: F) -> InvokeResult<Address>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = InvokeResult<Address>>,
    {
        let cell = self.cells.entry(name.to_string()).or_default().clone();
        cell.get_or_try_init(|| async {
            let address = lookup().await?;
            if address == Address::ZERO {
                return Err(InvokeError::UnknownContract(name.to_string()));
            }
            debug!("Resolved contract {name} to {address}");
            Ok(address)
        })
        .await
        .copied()
    }

    pub fn cached(&self, name: &str) -> Option<Address> {
        self.cells.get(name).and_then(|cell| cell.get().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_contract_address_key() {
        assert_eq!(
            contract_address_key("rocketRewardsPool"),
            keccak256(b"contract.addressrocketRewardsPool")
        );
    }

    #[tokio::test]
    async fn test_concurrent_resolution_runs_once() {
        let resolver = AddressResolver::new();
        let lookups = Arc::new(AtomicUsize::new(0));
        let expected = Address::repeat_byte(0x42);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let resolver = resolver.clone();
            let lookups = lookups.clone();
            handles.push(tokio::spawn(async move {
                resolver
                    .resolve("rocketRewardsPool", || async move {
                        lookups.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(expected)
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), expected);
        }
        assert_eq!(lookups.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cached("rocketRewardsPool"), Some(expected));
    }

    #[tokio::test]
    async fn test_zero_address_is_not_cached() {
        let resolver = AddressResolver::new();

        let err = resolver
            .resolve("rocketClaimDAO", || async { Ok(Address::ZERO) })
            .await
            .unwrap_err();
        assert_eq!(err, InvokeError::UnknownContract("rocketClaimDAO".into()));
        assert_eq!(resolver.cached("rocketClaimDAO"), None);

        let address = Address::repeat_byte(0x01);
        let resolved = resolver
            .resolve("rocketClaimDAO", || async move { Ok(address) })
            .await
            .unwrap();
        assert_eq!(resolved, address);
    }
}
