//! Allocation records and their canonical leaf encoding

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    error::{MerkleError, Result},
    hasher::Keccak256Hasher,
    types::{Address, Amount, Hash},
};

/// Type tags of the encoded leaf fields, in encoding order
pub const LEAF_ENCODING: [&str; 3] = ["uint256", "address", "uint256"];

/// Length of an encoded record: three 32-byte words
pub const ENCODED_LEN: usize = 96;

const WORD: usize = 32;
const ADDRESS_LEN: usize = 20;

/// One eligible recipient of the airdrop
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawAllocation", into = "RawAllocation")]
pub struct AllocationRecord {
    /// Unique, stable index of the record
    pub index: u64,
    /// Recipient address
    pub address: Address,
    /// Allocated amount in the token's smallest unit
    pub amount: Amount,
}

impl AllocationRecord {
    /// Create a record from typed fields
    pub const fn new(index: u64, address: Address, amount: Amount) -> Self {
        Self {
            index,
            address,
            amount,
        }
    }

    /// Create a record from raw bytes.
    ///
    /// `address` must be exactly 20 bytes; `amount` is big-endian and must fit in 256 bits.
    pub fn from_parts(index: u64, address: &[u8], amount: &[u8]) -> Result<Self> {
        if address.len() != ADDRESS_LEN {
            return Err(MerkleError::MalformedRecord(format!(
                "address must be {ADDRESS_LEN} bytes, got {}",
                address.len()
            )));
        }
        let amount = Amount::try_from_be_slice(amount).ok_or_else(|| {
            MerkleError::MalformedRecord(format!("amount of {} bytes exceeds u256", amount.len()))
        })?;
        Ok(Self::new(index, Address::from_slice(address), amount))
    }

    /// Parse a record from a hex address and a decimal (or `0x` hex) amount
    pub fn parse(index: u64, address: &str, amount: &str) -> Result<Self> {
        let address = parse_address(address)?;
        let amount = parse_amount(amount)?;
        Ok(Self::new(index, address, amount))
    }

    /// Fixed-width encoding: `index ‖ 0^12 ‖ address ‖ amount`, each word big-endian.
    pub fn encode(&self) -> [u8; ENCODED_LEN] {
        let mut encoded = [0u8; ENCODED_LEN];
        encoded[WORD - 8..WORD].copy_from_slice(&self.index.to_be_bytes());
        encoded[2 * WORD - ADDRESS_LEN..2 * WORD].copy_from_slice(self.address.as_slice());
        encoded[2 * WORD..].copy_from_slice(&self.amount.to_be_bytes::<WORD>());
        encoded
    }

    /// Leaf digest of this record
    pub fn leaf_hash(&self) -> Hash {
        Keccak256Hasher::hash_leaf(&self.encode())
    }
}

impl fmt::Display for AllocationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} => {}", self.index, self.address, self.amount)
    }
}

/// Parse a 20-byte hex address, with or without `0x` prefix
pub fn parse_address(address: &str) -> Result<Address> {
    let trimmed = address.trim();
    let cleaned = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if cleaned.len() != 2 * ADDRESS_LEN {
        return Err(MerkleError::MalformedRecord(format!(
            "address {trimmed:?}: expected {} hex chars, got {}",
            2 * ADDRESS_LEN,
            cleaned.len()
        )));
    }
    let mut bytes = [0u8; ADDRESS_LEN];
    hex::decode_to_slice(cleaned, &mut bytes)
        .map_err(|e| MerkleError::MalformedRecord(format!("address {trimmed:?}: {e}")))?;
    Ok(Address::from(bytes))
}

/// Parse a decimal or `0x` hex amount that must fit in 256 bits
pub fn parse_amount(amount: &str) -> Result<Amount> {
    let trimmed = amount.trim();
    Amount::from_str(trimmed)
        .map_err(|e| MerkleError::MalformedRecord(format!("amount {trimmed:?}: {e}")))
}

/// Loosely typed record as found in input files and artifacts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAllocation {
    /// Record index; input files may leave it to the entry's position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    /// Hex address
    pub address: String,
    /// Amount as a decimal string or a JSON number
    pub amount: RawAmount,
}

/// Amount as written in JSON
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    /// Decimal or `0x` hex string
    Text(String),
    /// Plain JSON number
    Number(u64),
}

impl RawAllocation {
    /// Convert into a record, using `position` when the entry carries no index
    pub fn into_record(self, position: usize) -> Result<AllocationRecord> {
        let index = self.index.unwrap_or(position as u64);
        let amount = match self.amount {
            RawAmount::Text(text) => parse_amount(&text)?,
            RawAmount::Number(value) => Amount::from(value),
        };
        Ok(AllocationRecord::new(index, parse_address(&self.address)?, amount))
    }
}

impl TryFrom<RawAllocation> for AllocationRecord {
    type Error = MerkleError;

    fn try_from(raw: RawAllocation) -> Result<Self> {
        let index = raw.index.ok_or_else(|| {
            MerkleError::MalformedRecord(format!("record {} has no index", raw.address))
        })?;
        raw.into_record(index as usize)
    }
}

impl From<AllocationRecord> for RawAllocation {
    fn from(record: AllocationRecord) -> Self {
        Self {
            index: Some(record.index),
            address: record.address.to_checksum(None),
            amount: RawAmount::Text(record.amount.to_string()),
        }
    }
}

/// Serde adapter writing amounts as decimal strings
pub(crate) mod decimal_amount {
    use super::*;

    pub(crate) fn serialize<S: Serializer>(
        amount: &Amount,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Amount, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_amount(&text).map_err(serde::de::Error::custom)
    }
}
