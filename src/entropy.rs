// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! Wallet entropy: 32 bytes of keyed randomness with an embedded creation
//! timestamp, round-trippable through the mnemonic codec, from which the
//! deterministic wallet spend and view keys derive.

use core::fmt;
use core::str::FromStr;

use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    domains::{SPEND_KEY_DOMAIN, VIEW_KEY_DOMAIN},
    encoding::mnemonics::{self, Language},
    errors::{CryptoError, Result},
    hashing::{sha3, sha3_parts, Hash},
    serialization::{Reader, Writer},
};

/// Seconds since epoch below which an embedded timestamp is treated as
/// absent.
pub const MINIMUM_TIMESTAMP: u64 = 1_640_995_200;

/// Seconds since epoch above which an embedded timestamp is treated as
/// absent.
pub const MAXIMUM_TIMESTAMP: u64 = 10_413_792_000;

fn now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Wallet entropy. The nominal width is 128 or 256 bits; the 128-bit form
/// zero-pads its upper half.
#[derive(Clone, Debug, Default, Eq, PartialEq, Zeroize, ZeroizeOnDrop)]
pub struct Entropy([u8; 32]);

impl Entropy {
    /// Generates fresh entropy.
    ///
    /// Caller-provided bytes, when present, are folded into the operating
    /// system randomness rather than trusted alone. With
    /// `encode_timestamp` the current UNIX time is written as a varint
    /// into the leading bytes.
    pub fn random(bits: usize, extra: &[u8], encode_timestamp: bool) -> Result<Self> {
        if bits != 128 && bits != 256 {
            return Err(CryptoError::InvalidArgument(
                "entropy must be 128 or 256 bits".to_string(),
            ));
        }

        let mut hash = Hash::random();
        if !extra.is_empty() {
            hash = sha3_parts(&[hash.as_bytes(), extra]);
        }

        let mut writer = Writer::new();
        if encode_timestamp {
            writer.varint(now());
        }
        let fill = 32 - writer.len();
        writer.bytes(&hash.as_bytes()[..fill]);

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(writer.as_bytes());

        if bits == 128 {
            bytes[16..].fill(0);
        }

        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidArgument("entropy must be 32 bytes".to_string()))?;
        Ok(Self(array))
    }

    /// Whether the upper half is zero, i.e. the entropy is nominally
    /// 128 bits.
    pub fn is_short(&self) -> bool {
        self.0[16..].iter().all(|&b| b == 0)
    }

    /// The embedded creation timestamp, or 0 when out of range or absent.
    pub fn timestamp(&self) -> u64 {
        let mut reader = Reader::new(&self.0);
        match reader.varint() {
            Ok(ts) if (MINIMUM_TIMESTAMP..=MAXIMUM_TIMESTAMP).contains(&ts) => ts,
            _ => 0,
        }
    }

    /// Encodes to a mnemonic: 12 words for the 128-bit form, 24 otherwise.
    pub fn to_mnemonic_words(&self, language: Language) -> Result<Vec<String>> {
        if self.is_short() {
            mnemonics::encode(&self.0[..16], language)
        } else {
            mnemonics::encode(&self.0, language)
        }
    }

    /// Encodes to a space-joined mnemonic phrase.
    pub fn to_mnemonic_phrase(&self, language: Language) -> Result<String> {
        Ok(self.to_mnemonic_words(language)?.join(" "))
    }

    /// Recovers entropy from a mnemonic phrase.
    pub fn from_mnemonic_phrase(phrase: &str, language: Language) -> Result<Self> {
        let decoded = mnemonics::decode_phrase(phrase, language)?;

        Self::from_bytes(&decoded)
    }

    /// The deterministic wallet spend keypair at `wallet_index`.
    pub fn spend_keys(&self, wallet_index: u64) -> (EdwardsPoint, Scalar) {
        let mut writer = Writer::new();
        writer.scalar(&SPEND_KEY_DOMAIN);
        writer.bytes(&self.0);
        writer.u64(wallet_index);

        let secret_key = sha3(writer.as_bytes()).to_scalar();

        (EdwardsPoint::mul_base(&secret_key), secret_key)
    }

    /// The deterministic wallet view keypair.
    pub fn view_keys(&self) -> (EdwardsPoint, Scalar) {
        let mut writer = Writer::new();
        writer.scalar(&VIEW_KEY_DOMAIN);
        writer.bytes(&self.0);

        let secret_key = sha3(writer.as_bytes()).to_scalar();

        (EdwardsPoint::mul_base(&secret_key), secret_key)
    }
}

impl fmt::Display for Entropy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for Entropy {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|_| CryptoError::InvalidArgument("entropy hex is malformed".to_string()))?;
        Self::from_bytes(&bytes)
    }
}
