//! Adapters for the domain ports: transaction stores, configuration sources,
//! the sandbox bank and the gateway integrations.

pub mod config;
pub mod gateways;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod sandbox;
