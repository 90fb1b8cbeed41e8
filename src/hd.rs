// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! SLIP-0010 hierarchical deterministic keys over Ed25519.
//!
//! A [`Seed`] carries the master key and chain code split out of
//! `HMAC-SHA512("ed25519 seed", seed_bytes)`; children derive through the
//! hardened-only construction
//! `HMAC-SHA512(chain_code, 0x00 ‖ key ‖ index_be32)`. Neither type is
//! serializable: key material is regenerated from entropy when needed and
//! zeroized on drop.

use curve25519_dalek::{
    edwards::EdwardsPoint,
    scalar::{clamp_integer, Scalar},
};
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    entropy::Entropy,
    errors::{CryptoError, Result},
    hashing::{sha512, Hash},
};

type HmacSha512 = Hmac<Sha512>;

const DEFAULT_HMAC_KEY: &str = "ed25519 seed";

/// PBKDF2 rounds for the BIP-39 entropy-to-seed stretch.
const SEED_STRETCH_ROUNDS: u32 = 2048;

fn split_hmac(key: &[u8], message: &[u8]) -> (Hash, Hash) {
    let mut mac = HmacSha512::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(message);
    let digest = mac.finalize().into_bytes();

    let mut left = [0u8; 32];
    let mut right = [0u8; 32];
    left.copy_from_slice(&digest[..32]);
    right.copy_from_slice(&digest[32..]);

    (Hash(left), Hash(right))
}

fn hardened_child(key: &Hash, chain_code: &Hash, index: u32) -> (Hash, Hash) {
    let mut message = [0u8; 37];
    message[1..33].copy_from_slice(key.as_bytes());
    message[33..].copy_from_slice(&index.to_be_bytes());

    split_hmac(chain_code.as_bytes(), &message)
}

/// Parses `m[/index[']]*`; an apostrophe sets the hardened bit, bare
/// indices are taken as already carrying it where intended.
fn parse_path(path: &str) -> Result<Vec<u32>> {
    let mut segments = path.split('/');

    if segments.next() != Some("m") {
        return Err(CryptoError::InvalidArgument(
            "derivation path must start with m".to_string(),
        ));
    }

    let mut indices = Vec::new();
    for segment in segments {
        if segment.is_empty() {
            return Err(CryptoError::InvalidArgument(
                "derivation path has an empty segment".to_string(),
            ));
        }

        let (digits, hardened) = match segment.strip_suffix('\'') {
            Some(digits) => (digits, true),
            None => (segment, false),
        };

        let mut index: u32 = digits.parse().map_err(|_| {
            CryptoError::InvalidArgument(format!("'{segment}' is not a valid path segment"))
        })?;
        if hardened {
            index = index
                .checked_add(0x8000_0000)
                .ok_or_else(|| CryptoError::InvalidArgument("path index overflows".to_string()))?;
        }

        indices.push(index);
    }

    Ok(indices)
}

/// A derived HD key: the raw 32-byte key, its chain code, and the Ed25519
/// keypair the key expands to.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HdKey {
    key: Hash,
    chain_code: Hash,
}

impl HdKey {
    pub(crate) fn new(key: Hash, chain_code: Hash) -> Self {
        Self { key, chain_code }
    }

    pub fn key(&self) -> &Hash {
        &self.key
    }

    pub fn chain_code(&self) -> &Hash {
        &self.chain_code
    }

    /// The hardened child at `index` (the hardened bit is implied).
    pub fn child(&self, index: u32) -> HdKey {
        let hardened_index = index | 0x8000_0000;
        let (key, chain_code) = hardened_child(&self.key, &self.chain_code, hardened_index);

        HdKey::new(key, chain_code)
    }

    /// Walks a derivation path relative to this key.
    pub fn derive_path(&self, path: &str) -> Result<HdKey> {
        let mut current = self.clone();
        for index in parse_path(path)? {
            let (key, chain_code) = hardened_child(&current.key, &current.chain_code, index);
            current = HdKey::new(key, chain_code);
        }

        Ok(current)
    }

    /// The signing scalar: the clamped low half of `SHA-512(key)`, reduced
    /// mod `l`. Clamping keeps derived public keys in line with the
    /// SLIP-0010 test vectors.
    pub fn secret_scalar(&self) -> Scalar {
        let digest = sha512(self.key.as_bytes());
        let mut low = [0u8; 32];
        low.copy_from_slice(&digest[..32]);

        Scalar::from_bytes_mod_order(clamp_integer(low))
    }

    /// The public key for [`HdKey::secret_scalar`].
    pub fn public_key(&self) -> EdwardsPoint {
        EdwardsPoint::mul_base(&self.secret_scalar())
    }

    /// Both halves of the keypair.
    pub fn keys(&self) -> (EdwardsPoint, Scalar) {
        let secret = self.secret_scalar();

        (EdwardsPoint::mul_base(&secret), secret)
    }
}

/// A SLIP-0010 master seed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Seed {
    key: Hash,
    chain_code: Hash,
}

impl Seed {
    /// Builds the master key pair from raw seed bytes with the standard
    /// `"ed25519 seed"` HMAC key.
    pub fn from_raw(seed_bytes: &[u8]) -> Self {
        Self::from_raw_with_key(seed_bytes, DEFAULT_HMAC_KEY)
    }

    /// Builds the master key pair from raw seed bytes under a caller
    /// chosen HMAC key.
    pub fn from_raw_with_key(seed_bytes: &[u8], hmac_key: &str) -> Self {
        let (key, chain_code) = split_hmac(hmac_key.as_bytes(), seed_bytes);

        Self { key, chain_code }
    }

    /// Stretches wallet entropy into a seed (BIP-39 style: PBKDF2 with
    /// 2048 rounds over `"mnemonic" ‖ passphrase`).
    pub fn from_entropy(entropy: &Entropy, passphrase: &str) -> Self {
        let mut salt = b"mnemonic".to_vec();
        salt.extend_from_slice(passphrase.as_bytes());

        let mut stretched = [0u8; 64];
        pbkdf2_hmac::<Sha512>(entropy.as_bytes(), &salt, SEED_STRETCH_ROUNDS, &mut stretched);

        let seed = Self::from_raw(&stretched);
        stretched.zeroize();

        seed
    }

    pub fn key(&self) -> &Hash {
        &self.key
    }

    pub fn chain_code(&self) -> &Hash {
        &self.chain_code
    }

    /// The master node as an [`HdKey`].
    pub fn master_key(&self) -> HdKey {
        HdKey::new(self.key, self.chain_code)
    }

    /// Derives the hardened child at each index in turn; an empty list
    /// yields the master key.
    pub fn derive_hardened(&self, indices: &[u32]) -> HdKey {
        let mut current = self.master_key();
        for &index in indices {
            current = current.child(index);
        }

        current
    }

    /// Walks a `m/...` derivation path.
    pub fn derive_path(&self, path: &str) -> Result<HdKey> {
        self.master_key().derive_path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::point_protocol::PointProtocol;

    // SLIP-0010 ed25519 test vector 1
    const VECTOR_SEED: &str = "000102030405060708090a0b0c0d0e0f";

    fn vector_seed() -> Seed {
        Seed::from_raw(&hex::decode(VECTOR_SEED).unwrap())
    }

    #[test]
    fn master_key_matches_slip10() {
        let seed = vector_seed();
        assert_eq!(
            seed.key().to_string(),
            "2b4be7f19ee27bbf30c667b642d5f4aa69fd169872f8fc3059c08ebae2eb19e7"
        );
        assert_eq!(
            seed.chain_code().to_string(),
            "90046a93de5380a72b5e45010748567d5ea02bbf6522f979e05c0d8d8ca9fffb"
        );
        assert_eq!(
            seed.master_key().public_key().to_hex(),
            "a4b2856bfec510abab89753fac1ac0e1112364e7d250545963f135f2a33188ed"
        );
    }

    #[test]
    fn hardened_chain_matches_slip10() {
        let seed = vector_seed();

        let child = seed.derive_hardened(&[0]);
        assert_eq!(
            child.key().to_string(),
            "68e0fe46dfb67e368c75379acec591dad19df3cde26e63b93a8e704f1dade7a3"
        );
        assert_eq!(
            child.public_key().to_hex(),
            "8c8a13df77a28f3445213a0f432fde644acaa215fc72dcdf300d5efaa85d350c"
        );

        let deep = seed.derive_hardened(&[0, 1, 2, 2, 1_000_000_000]);
        assert_eq!(
            deep.key().to_string(),
            "8f94d394a8e8fd6b1bc2f3f49f5c47e385281d5c17e65324b0f62483e37e8793"
        );
        assert_eq!(
            deep.public_key().to_hex(),
            "3c24da049451555d51a7014a37337aa4e12d41e485abccfa46b47dfb2af54b7a"
        );
    }

    #[test]
    fn path_parsing_matches_explicit_derivation() {
        let seed = vector_seed();
        let by_path = seed.derive_path("m/0'/1'/2'").unwrap();
        let by_indices = seed.derive_hardened(&[0, 1, 2]);
        assert_eq!(by_path.key(), by_indices.key());
        assert_eq!(by_path.chain_code(), by_indices.chain_code());

        // bare m is the master node
        let master = seed.derive_path("m").unwrap();
        assert_eq!(master.key(), seed.key());
    }

    #[test]
    fn malformed_paths_are_rejected() {
        let seed = vector_seed();
        assert!(seed.derive_path("x/0'").is_err());
        assert!(seed.derive_path("m//0").is_err());
        assert!(seed.derive_path("m/abc").is_err());
    }

    #[test]
    fn entropy_stretching_is_deterministic() {
        let entropy = Entropy::from_bytes(&[7u8; 32]).unwrap();
        let seed_a = Seed::from_entropy(&entropy, "passphrase");
        let seed_b = Seed::from_entropy(&entropy, "passphrase");
        assert_eq!(seed_a.key(), seed_b.key());

        let seed_c = Seed::from_entropy(&entropy, "other");
        assert_ne!(seed_a.key(), seed_c.key());
    }

    #[test]
    fn secret_scalar_signs_consistently() {
        let seed = vector_seed();
        let key = seed.derive_hardened(&[0, 1]);
        let (public_key, secret) = key.keys();
        assert_eq!(EdwardsPoint::mul_base(&secret), public_key);
    }
}
