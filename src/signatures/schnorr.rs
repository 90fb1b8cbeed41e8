// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! Single-signer Schnorr signature over a message digest.
//!
//! The prepare/complete split lets a coordinator assemble the challenge
//! without the signing key: `prepare_signature` returns `(L, α)` with the
//! nonce `α` parked in the response slot, and `complete_signature` replaces
//! it with `α − L·x`.

use core::fmt;
use core::str::FromStr;

use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar};
use zeroize::Zeroize;

use crate::{
    domains::{G, SIGNATURE_DOMAIN},
    errors::{retries_exceeded, CryptoError, Result, MAX_PROVER_RETRIES},
    hashing::Hash,
    protocols::{point_protocol::dbl_mult, scalar_protocol::ScalarProtocol},
    serialization::{Reader, Writer},
    transcript::Transcript,
};

/// A Schnorr signature `(L, r)`; between `prepare` and `complete` the `r`
/// slot holds the secret nonce.
#[derive(Clone, Debug, Eq, PartialEq, Zeroize)]
pub struct Signature {
    pub l: Scalar,
    pub r: Scalar,
}

impl Signature {
    /// Whether both halves are usable non-zero scalars.
    pub fn check_construction(&self) -> bool {
        self.l.valid() && self.r.valid()
    }

    pub fn serialize(&self, writer: &mut Writer) {
        writer.scalar(&self.l);
        writer.scalar(&self.r);
    }

    pub fn deserialize(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self {
            l: reader.scalar()?,
            r: reader.scalar()?,
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

fn challenge_for(digest: &Hash, public_key: &EdwardsPoint, point: &EdwardsPoint) -> Scalar {
    let mut transcript = Transcript::new();
    transcript.update_scalar(&SIGNATURE_DOMAIN);
    transcript.update_hash(digest);
    transcript.update_point(public_key);
    transcript.update_point(point);

    transcript.challenge()
}

/// Prepares a signature over `message_digest` for the holder of the secret
/// behind `public_key`. The result carries the challenge in `l` and the
/// secret nonce in `r`.
pub fn prepare_signature(message_digest: &Hash, public_key: &EdwardsPoint) -> Result<Signature> {
    let mut rng = rand::thread_rng();

    for _ in 0..MAX_PROVER_RETRIES {
        // fold fresh randomness through the transcript so a weak RNG alone
        // cannot bias the nonce
        let mut alpha_transcript = Transcript::new();
        alpha_transcript.update_hash(message_digest);
        alpha_transcript.update_point(public_key);
        alpha_transcript.update_scalar(&Scalar::random_not_zero(&mut rng));

        let alpha = alpha_transcript.challenge();
        if !alpha.valid() {
            continue;
        }

        let point = EdwardsPoint::mul_base(&alpha);

        let challenge = challenge_for(message_digest, public_key, &point);
        if !challenge.valid() {
            continue;
        }

        return Ok(Signature { l: challenge, r: alpha });
    }

    Err(retries_exceeded())
}

/// Folds the signing scalar into a prepared signature:
/// `r = α − L·x`.
pub fn complete_signature(signing_scalar: &Scalar, signature: &Signature) -> Result<Signature> {
    if !signing_scalar.valid() {
        return Err(CryptoError::InvalidArgument(
            "signing_scalar must be a non-zero scalar".to_string(),
        ));
    }
    if !signature.check_construction() {
        return Err(CryptoError::InvalidArgument(
            "prepared signature is malformed".to_string(),
        ));
    }

    Ok(Signature {
        l: signature.l,
        r: signature.r - signature.l * signing_scalar,
    })
}

/// Signs a message digest in one step.
pub fn generate_signature(message_digest: &Hash, secret_key: &Scalar) -> Result<Signature> {
    if !secret_key.valid() {
        return Err(CryptoError::InvalidArgument(
            "secret_key must be a non-zero scalar".to_string(),
        ));
    }

    let public_key = EdwardsPoint::mul_base(secret_key);

    let prepared = prepare_signature(message_digest, &public_key)?;

    complete_signature(secret_key, &prepared)
}

/// Verifies a signature: recomputes `R' = L·P + r·G` and accepts when the
/// transcript challenge over `R'` equals `L`.
pub fn check_signature(message_digest: &Hash, public_key: &EdwardsPoint, signature: &Signature) -> bool {
    if !signature.check_construction() {
        return false;
    }

    let point = dbl_mult(&signature.l, public_key, &signature.r, &G);

    let challenge = challenge_for(message_digest, public_key, &point);
    if !challenge.valid() {
        return false;
    }

    challenge == signature.l
}
