// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! Wallet address encoding over either Base58 dialect.
//!
//! An address wraps `varint(prefix) ‖ P_spend [‖ P_view]` in the check
//! form of the chosen dialect. Single-key addresses simply omit the view
//! key; decoding reports it as `None`.

use curve25519_dalek::edwards::EdwardsPoint;

use crate::{
    errors::{CryptoError, Result},
    serialization::{Reader, Writer},
};

use super::{base58, cn_base58};

/// A decoded wallet address.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Address {
    pub prefix: u64,
    pub public_spend: EdwardsPoint,
    pub public_view: Option<EdwardsPoint>,
}

fn serialize_address(prefix: u64, public_spend: &EdwardsPoint, public_view: Option<&EdwardsPoint>) -> Vec<u8> {
    let mut writer = Writer::new();
    writer.varint(prefix);
    writer.point(public_spend);
    if let Some(view) = public_view {
        writer.point(view);
    }

    writer.into_bytes()
}

fn deserialize_address(bytes: &[u8]) -> Result<Address> {
    let mut reader = Reader::new(bytes);

    let prefix = reader.varint()?;
    let public_spend = reader.point()?;

    let public_view = if reader.unread() == 32 {
        Some(reader.point()?)
    } else if reader.unread() == 0 {
        None
    } else {
        return Err(CryptoError::InvalidArgument(
            "address payload has a malformed length".to_string(),
        ));
    };

    Ok(Address { prefix, public_spend, public_view })
}

/// Bitcoin-alphabet Base58 addresses.
pub mod plain {
    use super::*;

    pub fn encode(prefix: u64, public_spend: &EdwardsPoint) -> String {
        base58::encode_check(&serialize_address(prefix, public_spend, None))
    }

    pub fn encode_with_view(
        prefix: u64,
        public_spend: &EdwardsPoint,
        public_view: &EdwardsPoint,
    ) -> String {
        base58::encode_check(&serialize_address(prefix, public_spend, Some(public_view)))
    }

    pub fn decode(address: &str) -> Result<Address> {
        deserialize_address(&base58::decode_check(address)?)
    }
}

/// CryptoNote block Base58 addresses.
pub mod cryptonote {
    use super::*;

    pub fn encode(prefix: u64, public_spend: &EdwardsPoint) -> String {
        cn_base58::encode_check(&serialize_address(prefix, public_spend, None))
    }

    pub fn encode_with_view(
        prefix: u64,
        public_spend: &EdwardsPoint,
        public_view: &EdwardsPoint,
    ) -> String {
        cn_base58::encode_check(&serialize_address(prefix, public_spend, Some(public_view)))
    }

    pub fn decode(address: &str) -> Result<Address> {
        deserialize_address(&cn_base58::decode_check(address)?)
    }
}

#[cfg(test)]
mod tests {
    use rand::thread_rng;

    use super::*;
    use crate::common::generate_keys;

    const PREFIX: u64 = 0x1c_9e86;

    #[test]
    fn plain_round_trip() {
        let mut rng = thread_rng();
        let (spend, _) = generate_keys(&mut rng);
        let (view, _) = generate_keys(&mut rng);

        let address = plain::encode_with_view(PREFIX, &spend, &view);
        let decoded = plain::decode(&address).unwrap();
        assert_eq!(decoded.prefix, PREFIX);
        assert_eq!(decoded.public_spend, spend);
        assert_eq!(decoded.public_view, Some(view));
    }

    #[test]
    fn plain_single_key_round_trip() {
        let mut rng = thread_rng();
        let (spend, _) = generate_keys(&mut rng);

        let decoded = plain::decode(&plain::encode(PREFIX, &spend)).unwrap();
        assert_eq!(decoded.public_spend, spend);
        assert_eq!(decoded.public_view, None);
    }

    #[test]
    fn cryptonote_round_trip() {
        let mut rng = thread_rng();
        let (spend, _) = generate_keys(&mut rng);
        let (view, _) = generate_keys(&mut rng);

        let address = cryptonote::encode_with_view(PREFIX, &spend, &view);
        let decoded = cryptonote::decode(&address).unwrap();
        assert_eq!(decoded.prefix, PREFIX);
        assert_eq!(decoded.public_spend, spend);
        assert_eq!(decoded.public_view, Some(view));

        let single = cryptonote::decode(&cryptonote::encode(PREFIX, &spend)).unwrap();
        assert_eq!(single.public_view, None);
    }

    #[test]
    fn corrupted_address_fails() {
        let mut rng = thread_rng();
        let (spend, _) = generate_keys(&mut rng);
        let address = plain::encode(PREFIX, &spend);

        let mut corrupted = address.into_bytes();
        corrupted[3] = if corrupted[3] == b'4' { b'5' } else { b'4' };
        let corrupted = String::from_utf8(corrupted).unwrap();
        assert!(plain::decode(&corrupted).is_err());
    }
}
