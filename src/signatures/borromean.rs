// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! Borromean OR-proof ring signature with a linkable key image.
//!
//! The signer proves knowledge of one secret ephemeral behind a ring of
//! public keys. Every ring slot carries an independent `(c, r)` pair; the
//! real slot's challenge is forced so that the challenges sum to the
//! transcript hash over all `(L, R)` commitments.

use core::fmt;
use core::str::FromStr;

use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar};

use crate::{
    common::generate_key_image,
    domains::{BORROMEAN_DOMAIN, G},
    errors::{retries_exceeded, CryptoError, Result, MAX_PROVER_RETRIES},
    hashing::Hash,
    point_vector::PointVector,
    protocols::{
        point_protocol::{dbl_mult, PointProtocol},
        scalar_protocol::ScalarProtocol,
    },
    serialization::{Reader, Writer},
    signatures::schnorr,
    transcript::Transcript,
};

/// A Borromean ring signature: one `(c, r)` pair per ring member.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RingSignature {
    pub signatures: Vec<schnorr::Signature>,
}

impl RingSignature {
    /// Whether the signature has the right shape for a ring of
    /// `ring_size` keys.
    pub fn check_construction(&self, ring_size: usize) -> bool {
        self.signatures.len() == ring_size
            && self.signatures.iter().all(schnorr::Signature::check_construction)
    }

    pub fn serialize(&self, writer: &mut Writer) {
        writer.varint(self.signatures.len() as u64);
        for signature in &self.signatures {
            signature.serialize(writer);
        }
    }

    pub fn deserialize(reader: &mut Reader<'_>) -> Result<Self> {
        let count = reader.varint()? as usize;
        let mut signatures = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            signatures.push(schnorr::Signature::deserialize(reader)?);
        }
        Ok(Self { signatures })
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

impl fmt::Display for RingSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl FromStr for RingSignature {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|_| CryptoError::InvalidArgument("signature hex is malformed".to_string()))?;
        Self::from_bytes(&bytes)
    }
}

pub(crate) fn contains_duplicates(public_keys: &[EdwardsPoint]) -> bool {
    PointVector(public_keys.to_vec()).dedupe_sort().len() != public_keys.len()
}

/// Verifies a ring signature: recomputes every `(L, R)` pair from the
/// stored `(c, r)` values and accepts when the challenges sum to the
/// transcript hash.
pub fn check_ring_signature(
    message_digest: &Hash,
    key_image: &EdwardsPoint,
    public_keys: &[EdwardsPoint],
    ring_signature: &RingSignature,
) -> bool {
    if contains_duplicates(public_keys) {
        return false;
    }

    if !ring_signature.check_construction(public_keys.len()) {
        return false;
    }

    if !key_image.check_subgroup() {
        return false;
    }

    let mut sum = Scalar::ZERO;

    let mut transcript = Transcript::new();
    transcript.update_scalar(&BORROMEAN_DOMAIN);
    transcript.update_hash(message_digest);

    for (public_key, signature) in public_keys.iter().zip(ring_signature.signatures.iter()) {
        let hashed_point = public_key.hash_to_point();

        // L = c·P + r·G
        let l_point = dbl_mult(&signature.l, public_key, &signature.r, &G);

        // R = r·Hp(P) + c·I
        let r_point = dbl_mult(&signature.r, &hashed_point, &signature.l, key_image);

        sum += signature.l;

        transcript.update_point(&l_point);
        transcript.update_point(&r_point);
    }

    let challenge = transcript.challenge();
    if !challenge.valid() {
        return false;
    }

    challenge == sum
}

/// Builds a ring signature with the real slot holding the nonce; the
/// signing key enters in `complete_ring_signature`.
pub fn prepare_ring_signature(
    message_digest: &Hash,
    key_image: &EdwardsPoint,
    public_keys: &[EdwardsPoint],
    real_output_index: usize,
) -> Result<RingSignature> {
    if contains_duplicates(public_keys) {
        return Err(CryptoError::InvalidArgument(
            "ring contains duplicate public keys".to_string(),
        ));
    }

    let ring_size = public_keys.len();

    if real_output_index >= ring_size {
        return Err(CryptoError::InvalidArgument(
            "real output index exceeds the ring".to_string(),
        ));
    }

    if !key_image.check_subgroup() {
        return Err(CryptoError::InvalidArgument(
            "key image is not in the prime-order subgroup".to_string(),
        ));
    }

    let mut rng = rand::thread_rng();

    'retry: for _ in 0..MAX_PROVER_RETRIES {
        // a zero alpha would leak the signing key in the completed slot
        let mut alpha_transcript = Transcript::new();
        alpha_transcript.update_hash(message_digest);
        alpha_transcript.update_point(key_image);
        alpha_transcript.update_scalar(&Scalar::random_not_zero(&mut rng));
        alpha_transcript.update_points(public_keys);

        let alpha = alpha_transcript.challenge();
        if !alpha.valid() {
            continue 'retry;
        }

        let mut signatures =
            vec![schnorr::Signature { l: Scalar::ZERO, r: Scalar::ZERO }; ring_size];

        let mut sum = Scalar::ZERO;

        let mut transcript = Transcript::new();
        transcript.update_scalar(&BORROMEAN_DOMAIN);
        transcript.update_hash(message_digest);

        for (i, public_key) in public_keys.iter().enumerate() {
            let hashed_point = public_key.hash_to_point();

            let (l_point, r_point) = if i == real_output_index {
                // the real slot commits to the nonce in constant time
                (EdwardsPoint::mul_base(&alpha), alpha * hashed_point)
            } else {
                signatures[i].l = Scalar::random_not_zero(&mut rng);
                signatures[i].r = Scalar::random_not_zero(&mut rng);

                sum += signatures[i].l;

                (
                    dbl_mult(&signatures[i].l, public_key, &signatures[i].r, &G),
                    dbl_mult(&signatures[i].r, &hashed_point, &signatures[i].l, key_image),
                )
            };

            transcript.update_point(&l_point);
            transcript.update_point(&r_point);
        }

        let challenge = transcript.challenge();
        if !challenge.valid() {
            continue 'retry;
        }

        signatures[real_output_index].l = challenge - sum;
        signatures[real_output_index].r = alpha;

        return Ok(RingSignature { signatures });
    }

    Err(retries_exceeded())
}

/// Folds the signing scalar into the real slot: `r = α − c·x`.
pub fn complete_ring_signature(
    signing_scalar: &Scalar,
    real_output_index: usize,
    ring_signature: &RingSignature,
) -> Result<RingSignature> {
    if ring_signature.signatures.is_empty() || real_output_index >= ring_signature.signatures.len() {
        return Err(CryptoError::InvalidArgument(
            "real output index exceeds the prepared signature".to_string(),
        ));
    }

    if !signing_scalar.valid() {
        return Err(CryptoError::InvalidArgument(
            "signing_scalar must be a non-zero scalar".to_string(),
        ));
    }

    if !ring_signature.check_construction(ring_signature.signatures.len()) {
        return Err(CryptoError::InvalidArgument(
            "prepared signature is malformed".to_string(),
        ));
    }

    let mut signatures = ring_signature.signatures.clone();

    signatures[real_output_index].r =
        signatures[real_output_index].r - signatures[real_output_index].l * signing_scalar;

    Ok(RingSignature { signatures })
}

/// Signs in one step for a signer who holds the secret ephemeral. Fails if
/// the matching public ephemeral is not in the ring.
pub fn generate_ring_signature(
    message_digest: &Hash,
    secret_ephemeral: &Scalar,
    public_keys: &[EdwardsPoint],
) -> Result<RingSignature> {
    if !secret_ephemeral.valid() {
        return Err(CryptoError::InvalidArgument(
            "secret_ephemeral must be a non-zero scalar".to_string(),
        ));
    }

    if contains_duplicates(public_keys) {
        return Err(CryptoError::InvalidArgument(
            "ring contains duplicate public keys".to_string(),
        ));
    }

    let public_ephemeral = EdwardsPoint::mul_base(secret_ephemeral);

    let real_output_index = public_keys
        .iter()
        .position(|key| *key == public_ephemeral)
        .ok_or_else(|| {
            CryptoError::InvalidArgument("signer's public ephemeral is not in the ring".to_string())
        })?;

    let key_image = generate_key_image(&public_ephemeral, secret_ephemeral)?;

    let prepared = prepare_ring_signature(message_digest, &key_image, public_keys, real_output_index)?;

    complete_ring_signature(secret_ephemeral, real_output_index, &prepared)
}

#[cfg(test)]
mod tests {
    use rand::thread_rng;

    use super::*;
    use crate::{common::generate_keys_m, hashing::sha3};

    fn ring_with_signer(size: usize, index: usize) -> (Vec<EdwardsPoint>, Scalar, EdwardsPoint) {
        let mut rng = thread_rng();
        let (public_keys, secret_keys) = generate_keys_m(&mut rng, size);
        let secret = secret_keys[index];
        let key_image = generate_key_image(&public_keys[index], &secret).unwrap();
        (public_keys, secret, key_image)
    }

    #[test]
    fn round_trip() {
        let (ring, secret, key_image) = ring_with_signer(5, 2);
        let digest = sha3(b"ring message");

        let signature = generate_ring_signature(&digest, &secret, &ring).unwrap();
        assert!(check_ring_signature(&digest, &key_image, &ring, &signature));
    }

    #[test]
    fn removing_the_signer_breaks_verification() {
        let (ring, secret, key_image) = ring_with_signer(4, 0);
        let digest = sha3(b"ring message");
        let signature = generate_ring_signature(&digest, &secret, &ring).unwrap();

        let mut truncated = ring.clone();
        truncated.remove(0);
        assert!(!check_ring_signature(&digest, &key_image, &truncated, &signature));
    }

    #[test]
    fn altered_key_image_fails() {
        let (ring, secret, _) = ring_with_signer(4, 1);
        let digest = sha3(b"ring message");
        let signature = generate_ring_signature(&digest, &secret, &ring).unwrap();

        let mut rng = thread_rng();
        let other_image = EdwardsPoint::random(&mut rng);
        assert!(!check_ring_signature(&digest, &other_image, &ring, &signature));
    }

    #[test]
    fn linkability_same_key_image() {
        let (ring, secret, key_image) = ring_with_signer(4, 3);
        let public = EdwardsPoint::mul_base(&secret);
        assert_eq!(generate_key_image(&public, &secret).unwrap(), key_image);
    }

    #[test]
    fn duplicate_ring_keys_are_rejected() {
        let (mut ring, secret, key_image) = ring_with_signer(4, 0);
        ring[2] = ring[1];
        let digest = sha3(b"ring message");
        assert!(generate_ring_signature(&digest, &secret, &ring).is_err());

        let (good_ring, good_secret, _) = ring_with_signer(4, 0);
        let signature = generate_ring_signature(&digest, &good_secret, &good_ring).unwrap();
        let mut bad_ring = good_ring.clone();
        bad_ring[2] = bad_ring[1];
        assert!(!check_ring_signature(&digest, &key_image, &bad_ring, &signature));
    }

    #[test]
    fn prepare_complete_split() {
        let (ring, secret, key_image) = ring_with_signer(8, 5);
        let digest = sha3(b"split ring signing");

        let prepared = prepare_ring_signature(&digest, &key_image, &ring, 5).unwrap();
        assert!(!check_ring_signature(&digest, &key_image, &ring, &prepared));

        let signature = complete_ring_signature(&secret, 5, &prepared).unwrap();
        assert!(check_ring_signature(&digest, &key_image, &ring, &signature));
    }

    #[test]
    fn serialization_round_trip() {
        let (ring, secret, _) = ring_with_signer(4, 2);
        let signature = generate_ring_signature(&sha3(b"wire"), &secret, &ring).unwrap();
        assert_eq!(RingSignature::from_bytes(&signature.to_bytes()).unwrap(), signature);
    }
}
