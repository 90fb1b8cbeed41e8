// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! RFC-8032 style Ed25519 signatures over raw messages.
//!
//! One deliberate deviation from the RFC: the nonce is drawn from a
//! transcript seeded with the message digest, the public key and fresh
//! randomness instead of the hash of a secret prefix. A fully deterministic
//! nonce exposes the signing key to fault attacks in this setting; the
//! random contribution replaces only the secret-derived half, so verifiers
//! are unaffected.

use core::fmt;
use core::str::FromStr;

use curve25519_dalek::{
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar,
};
use sha2::{Digest, Sha512};

use crate::{
    errors::{retries_exceeded, CryptoError, Result, MAX_PROVER_RETRIES},
    hashing::Hash,
    protocols::{point_protocol::PointProtocol, scalar_protocol::ScalarProtocol},
    serialization::{Reader, Writer},
    transcript::Transcript,
};

/// An Ed25519 signature `(R, s)`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Signature {
    pub r: CompressedEdwardsY,
    pub s: Scalar,
}

impl Signature {
    pub fn serialize(&self, writer: &mut Writer) {
        writer.bytes(self.r.as_bytes());
        writer.scalar(&self.s);
    }

    pub fn deserialize(reader: &mut Reader<'_>) -> Result<Self> {
        let r_bytes: [u8; 32] = reader
            .bytes(32)?
            .try_into()
            .map_err(|_| CryptoError::InvalidArgument("signature is truncated".to_string()))?;
        Ok(Self {
            r: CompressedEdwardsY(r_bytes),
            s: reader.scalar()?,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        self.serialize(&mut writer);
        writer.into_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::deserialize(&mut Reader::new(bytes))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl FromStr for Signature {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|_| CryptoError::InvalidArgument("signature hex is malformed".to_string()))?;
        Self::from_bytes(&bytes)
    }
}

/// `H(R ‖ A ‖ M)` reduced from the full 512-bit digest.
fn challenge_scalar(r_bytes: &[u8; 32], public_key: &EdwardsPoint, message: &[u8]) -> Scalar {
    let mut hasher = Sha512::new();
    hasher.update(r_bytes);
    hasher.update(public_key.compress().as_bytes());
    hasher.update(message);

    Scalar::from_bytes_mod_order_wide(&hasher.finalize().into())
}

/// Signs an arbitrary message.
pub fn generate_signature(message: &[u8], secret_key: &Scalar) -> Result<Signature> {
    if !secret_key.valid() {
        return Err(CryptoError::InvalidArgument(
            "secret_key must be a non-zero scalar".to_string(),
        ));
    }

    let public_key = EdwardsPoint::mul_base(secret_key);

    let message_digest = Hash::from_slice(&crate::hashing::sha512(message)[..32])?;

    let mut rng = rand::thread_rng();

    for _ in 0..MAX_PROVER_RETRIES {
        let mut alpha_transcript = Transcript::new();
        alpha_transcript.update_hash(&message_digest);
        alpha_transcript.update_point(&public_key);
        alpha_transcript.update_scalar(&Scalar::random_not_zero(&mut rng));

        let alpha = alpha_transcript.challenge();
        if !alpha.valid() {
            continue;
        }

        let alpha_point = EdwardsPoint::mul_base(&alpha).compress();

        let k = challenge_scalar(alpha_point.as_bytes(), &public_key, message);

        return Ok(Signature {
            r: alpha_point,
            s: alpha + k * secret_key,
        });
    }

    Err(retries_exceeded())
}

/// Verifies a signature against a message and public key:
/// `s·G == R + H(R ‖ A ‖ M)·A`.
pub fn check_signature(message: &[u8], public_key: &EdwardsPoint, signature: &Signature) -> bool {
    let alpha_point = match signature.r.decompress() {
        Some(point) if point.valid() => point,
        _ => return false,
    };

    let k = challenge_scalar(signature.r.as_bytes(), public_key, message);

    // R + k·A == s·G
    alpha_point + k * public_key == EdwardsPoint::mul_base(&signature.s)
}

#[cfg(test)]
mod tests {
    use rand::thread_rng;

    use super::*;
    use crate::common::generate_keys;

    #[test]
    fn round_trip() {
        let mut rng = thread_rng();
        let (public_key, secret_key) = generate_keys(&mut rng);
        let message = b"attack at dawn".to_vec();

        let signature = generate_signature(&message, &secret_key).unwrap();
        assert!(check_signature(&message, &public_key, &signature));
    }

    #[test]
    fn rejects_modified_message() {
        let mut rng = thread_rng();
        let (public_key, secret_key) = generate_keys(&mut rng);

        let signature = generate_signature(b"attack at dawn", &secret_key).unwrap();
        assert!(!check_signature(b"attack at dusk", &public_key, &signature));
    }

    #[test]
    fn rejects_wrong_key() {
        let mut rng = thread_rng();
        let (_, secret_key) = generate_keys(&mut rng);
        let (other_public, _) = generate_keys(&mut rng);

        let signature = generate_signature(b"message", &secret_key).unwrap();
        assert!(!check_signature(b"message", &other_public, &signature));
    }

    #[test]
    fn serialization_round_trip() {
        let mut rng = thread_rng();
        let (_, secret_key) = generate_keys(&mut rng);
        let signature = generate_signature(b"wire format", &secret_key).unwrap();

        assert_eq!(Signature::from_bytes(&signature.to_bytes()).unwrap(), signature);
        assert_eq!(signature.to_string().parse::<Signature>().unwrap(), signature);
    }
}
