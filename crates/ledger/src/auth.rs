//! Claim authorization
//!
//! A claimant proves control of the recipient address by signing the claim message with
//! `personal_sign` (EIP-191). The message commits to the trusted root and the leaf, so a
//! signature is only valid for one record of one airdrop.

use airdrop_merkle::{Address, AllocationRecord, Hash, Keccak256Hasher};
use alloy_primitives::eip191_hash_message;
pub use alloy_primitives::Signature;
pub use k256::ecdsa::SigningKey;

use crate::error::{LedgerError, Result};

/// Message a claimant signs: `keccak256(root || leaf)`
pub fn claim_message(root: &Hash, record: &AllocationRecord) -> Hash {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(root.as_slice());
    preimage[32..].copy_from_slice(record.leaf_hash().as_slice());
    Keccak256Hasher::hash(&preimage)
}

/// Sign the claim for `record` as the holder of `key`
pub fn sign_claim(root: &Hash, record: &AllocationRecord, key: &SigningKey) -> Result<Signature> {
    let digest = eip191_hash_message(claim_message(root, record));
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(digest.as_slice())
        .map_err(|e| LedgerError::InvalidSignature(e.to_string()))?;
    Ok(Signature::from((signature, recovery_id)))
}

/// Address that signed the claim for `record`
pub fn recover_claimant(
    root: &Hash,
    record: &AllocationRecord,
    signature: &Signature,
) -> Result<Address> {
    signature
        .recover_address_from_msg(claim_message(root, record))
        .map_err(|e| LedgerError::InvalidSignature(e.to_string()))
}

/// Address controlled by `key`
pub fn signer_address(key: &SigningKey) -> Address {
    Address::from_private_key(key)
}

/// Parse a 65-byte `r || s || v` signature from hex, with or without `0x` prefix
pub fn parse_signature(signature: &str) -> Result<Signature> {
    let trimmed = signature.trim();
    let cleaned = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(cleaned)
        .map_err(|e| LedgerError::InvalidSignature(format!("{trimmed:?}: {e}")))?;
    Signature::from_raw(&bytes)
        .map_err(|e| LedgerError::InvalidSignature(format!("{trimmed:?}: {e}")))
}

/// Hex wire form of `signature`
pub fn signature_to_hex(signature: &Signature) -> String {
    format!("0x{}", hex::encode(signature.as_bytes()))
}
