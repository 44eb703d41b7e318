pub mod builder;
pub mod contract;
pub mod error;
pub mod invoker;
pub mod resolver;
