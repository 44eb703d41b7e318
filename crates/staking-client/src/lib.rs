pub mod web3;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
