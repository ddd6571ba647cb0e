//! Common types

pub use alloy_primitives::Address;

/// 32-byte digest type
pub type Hash = alloy_primitives::B256;

/// Token amount in the token's smallest unit
pub type Amount = alloy_primitives::U256;
