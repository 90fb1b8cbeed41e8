// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! `PointProtocol` trait extending [`EdwardsPoint`] with cofactor handling,
//! subgroup validation and the hash-to-point map.
//!
//! The compressed wire form and the expanded in-memory form are dalek's
//! [`CompressedEdwardsY`] / [`EdwardsPoint`] pair; everything here operates
//! on the expanded form and compresses only at boundaries.

use curve25519_dalek::{
    constants::ED25519_BASEPOINT_POINT,
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar,
    traits::{Identity, VartimeMultiscalarMul},
};
use rand::{CryptoRng, RngCore};

use crate::{
    errors::{CryptoError, Result},
    hashing,
};

/// Extension methods for [`EdwardsPoint`].
pub trait PointProtocol: Sized {
    /// Multiplies by the cofactor, clearing any torsion component.
    fn mul8(&self) -> EdwardsPoint;

    /// Whether the point is in the prime-order subgroup and not the
    /// identity. Called on every key image and proof point at verification.
    fn check_subgroup(&self) -> bool;

    /// Whether the point is usable as a public key: not the identity.
    /// Decoding validity is guaranteed by the type.
    fn valid(&self) -> bool;

    /// `Hp(P)`: SHA3-256 of the compressed point mapped to the prime-order
    /// subgroup.
    fn hash_to_point(&self) -> EdwardsPoint;

    /// Loads a point from its 32-byte compressed encoding.
    fn from_bytes(bytes: &[u8]) -> Result<EdwardsPoint>;

    /// Whether a byte string decodes to a point.
    fn check(bytes: &[u8]) -> bool;

    /// Parses a 64-character lowercase hex string.
    fn from_hex(hex_string: &str) -> Result<EdwardsPoint>;

    /// The compressed point as lowercase hex.
    fn to_hex(&self) -> String;

    /// A random subgroup point with unknown discrete logarithm.
    fn random<R: RngCore + CryptoRng>(rng: &mut R) -> EdwardsPoint;
}

impl PointProtocol for EdwardsPoint {
    fn mul8(&self) -> EdwardsPoint {
        self.mul_by_cofactor()
    }

    fn check_subgroup(&self) -> bool {
        self.is_torsion_free() && self != &EdwardsPoint::identity()
    }

    fn valid(&self) -> bool {
        self != &EdwardsPoint::identity()
    }

    fn hash_to_point(&self) -> EdwardsPoint {
        hashing::sha3(self.compress().as_bytes()).to_point()
    }

    fn from_bytes(bytes: &[u8]) -> Result<EdwardsPoint> {
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidArgument("point must be 32 bytes".to_string()))?;
        CompressedEdwardsY(array)
            .decompress()
            .ok_or_else(|| CryptoError::InvalidArgument("point does not decode".to_string()))
    }

    fn check(bytes: &[u8]) -> bool {
        match <[u8; 32]>::try_from(bytes) {
            Ok(array) => CompressedEdwardsY(array).decompress().is_some(),
            Err(_) => false,
        }
    }

    fn from_hex(hex_string: &str) -> Result<EdwardsPoint> {
        let bytes = hex::decode(hex_string)
            .map_err(|_| CryptoError::InvalidArgument("point hex is malformed".to_string()))?;
        EdwardsPoint::from_bytes(&bytes)
    }

    fn to_hex(&self) -> String {
        hex::encode(self.compress().as_bytes())
    }

    fn random<R: RngCore + CryptoRng>(rng: &mut R) -> EdwardsPoint {
        let mut entropy = [0u8; 32];
        rng.fill_bytes(&mut entropy);
        hashing::sha3(&entropy).to_point()
    }
}

/// `a·A + b·B`, dispatching to the basepoint-optimized path when `B = G`.
///
/// Variable time; callers on secret-dependent paths must use the
/// constant-time single multiplications instead.
pub fn dbl_mult(a: &Scalar, point_a: &EdwardsPoint, b: &Scalar, point_b: &EdwardsPoint) -> EdwardsPoint {
    if point_b == &ED25519_BASEPOINT_POINT {
        EdwardsPoint::vartime_double_scalar_mul_basepoint(a, point_a, b)
    } else {
        EdwardsPoint::vartime_multiscalar_mul([a, b], [point_a, point_b])
    }
}
