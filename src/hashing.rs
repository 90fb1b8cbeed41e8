// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! Hash primitives and the 32-byte digest type shared by every protocol.
//!
//! All hash constructions are supplied by external crates; this module only
//! fixes the digest width, the iterated "slow" SHA3 chain used for domain
//! separation and key stretching, and the digest-to-scalar and
//! digest-to-point reductions.

use core::fmt;
use core::str::FromStr;

use argon2::{Algorithm, Argon2, Params, Version};
use blake2::Blake2b;
use curve25519_dalek::{
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar,
    traits::Identity,
};
use digest::{consts::U32, Digest};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Sha256, Sha512};
use sha3::Sha3_256;

use crate::errors::{CryptoError, Result};

type Blake2b256 = Blake2b<U32>;

/// A 256-bit message digest.
///
/// Digests double as the bridge between byte-oriented hashing and the curve:
/// [`Hash::to_scalar`] reduces the digest mod `l` and [`Hash::to_point`]
/// maps it into the prime-order subgroup.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Hash(pub [u8; 32]);

impl zeroize::Zeroize for Hash {
    fn zeroize(&mut self) {
        zeroize::Zeroize::zeroize(&mut self.0);
    }
}

impl Hash {
    /// The digest as raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The digest as an owned byte array.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Loads a digest from a byte slice; the slice must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidArgument("hash must be 32 bytes".to_string()))?;
        Ok(Hash(array))
    }

    /// A digest of fresh operating-system randomness.
    pub fn random() -> Self {
        let mut entropy = [0u8; 32];
        OsRng.fill_bytes(&mut entropy);
        sha3(&entropy)
    }

    /// Reduces the digest to a scalar mod `l`.
    pub fn to_scalar(&self) -> Scalar {
        Scalar::from_bytes_mod_order(self.0)
    }

    /// Maps the digest to a point in the prime-order subgroup.
    ///
    /// The digest bytes are interpreted as a compressed point; bytes that do
    /// not decode are rehashed until they do, and the decoded point is
    /// multiplied by the cofactor. The result is deterministic, torsion-free
    /// and has no known discrete logarithm with respect to any other
    /// generator in use.
    pub fn to_point(&self) -> EdwardsPoint {
        let mut candidate = self.0;
        loop {
            if let Some(point) = CompressedEdwardsY(candidate).decompress() {
                let point = point.mul_by_cofactor();
                if point != EdwardsPoint::identity() {
                    return point;
                }
            }
            candidate = sha3(&candidate).0;
        }
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for Hash {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|_| CryptoError::InvalidArgument("hash hex is malformed".to_string()))?;
        Hash::from_slice(&bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// SHA3-256 of the input.
pub fn sha3(input: &[u8]) -> Hash {
    Hash(Sha3_256::digest(input).into())
}

/// SHA3-256 over the concatenation of several byte strings.
pub(crate) fn sha3_parts(parts: &[&[u8]]) -> Hash {
    let mut hasher = Sha3_256::new();
    for part in parts {
        hasher.update(part);
    }
    Hash(hasher.finalize().into())
}

/// Iterated SHA3-256 with per-round salting.
///
/// Round zero hashes the input; each subsequent round rehashes the running
/// digest followed by the round counter so the chain cannot be shortcut by
/// iterating the bare hash over itself.
pub fn sha3_slow(input: &[u8], iterations: u64) -> Hash {
    let mut result = sha3(input);
    for round in 0..iterations {
        result = sha3_parts(&[&result.0, &round.to_le_bytes()]);
    }
    result
}

/// SHA-256 of the input.
pub fn sha256(input: &[u8]) -> Hash {
    Hash(Sha256::digest(input).into())
}

/// SHA-512 of the input, full 64-byte output.
pub fn sha512(input: &[u8]) -> [u8; 64] {
    Sha512::digest(input).into()
}

/// Blake2b with a 256-bit output.
pub fn blake2b(input: &[u8]) -> Hash {
    Hash(Blake2b256::digest(input).into())
}

/// Argon2id with the given time cost, memory cost (KiB) and lane count.
///
/// The input salts itself, which is acceptable here because the function is
/// used as a deterministic slow hash rather than for password storage.
pub fn argon2id(input: &[u8], time_cost: u32, memory_kib: u32, lanes: u32) -> Result<Hash> {
    let params = Params::new(memory_kib, time_cost, lanes, Some(32))
        .map_err(|e| CryptoError::InvalidArgument(format!("argon2 parameters: {e}")))?;
    let context = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut output = [0u8; 32];
    context
        .hash_password_into(input, input, &mut output)
        .map_err(|e| CryptoError::InvalidArgument(format!("argon2: {e}")))?;
    Ok(Hash(output))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &str = "cfc765d905c65e2b61816dc1f0fd69f6f6779f36ed6239ac7e21ff51ef2c891e";

    #[test]
    fn sha3_known_answer() {
        let input = hex::decode(INPUT).unwrap();
        assert_eq!(
            sha3(&input).to_string(),
            "974506601a60dc465e6e9acddb563889e63471849ec4198656550354b8541fcb"
        );
    }

    #[test]
    fn sha3_slow_changes_per_round() {
        let input = hex::decode(INPUT).unwrap();
        assert_eq!(sha3_slow(&input, 0), sha3(&input));
        assert_ne!(sha3_slow(&input, 1), sha3_slow(&input, 2));
    }

    #[test]
    fn blake2b_known_answer() {
        let input = hex::decode(INPUT).unwrap();
        assert_eq!(
            blake2b(&input).to_string(),
            "56a8ef7f9d7db21fa29b83eb77551f0c3e312525d6151946261911fc38a508c4"
        );
    }

    #[test]
    fn argon2id_known_answer() {
        let input = hex::decode(INPUT).unwrap();
        assert_eq!(
            argon2id(&input, 4, 1024, 1).unwrap().to_string(),
            "a6ac954bce48a46bc01a9b16b484ffb745401ae421b1b6f2e22cf474d4cac1c9"
        );
    }

    #[test]
    fn digest_to_point_is_torsion_free() {
        let point = sha3(b"arbitrary input").to_point();
        assert!(point.is_torsion_free());
        assert_ne!(point, EdwardsPoint::identity());
    }

    #[test]
    fn hex_round_trip() {
        let digest = sha3(b"round trip");
        assert_eq!(digest, digest.to_string().parse().unwrap());
    }
}
