// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause
//
// Inspired by the work of Sarang Noether found at
// https://github.com/SarangNoether/skunkworks/tree/clsag

//! CLSAG: compact linkable spontaneous anonymous group signatures, with
//! optional Pedersen commitment binding.
//!
//! With commitments, the signer additionally proves that the pseudo
//! commitment opens to the same amount as one of the ring's input
//! commitments: the delta `z` between the input and pseudo blinding
//! factors is the discrete log of `8·(C_π − C')`, and the commitment image
//! `D = z·Hp(P_π)` binds it to the key image slot without revealing `π`.

use core::fmt;
use core::str::FromStr;

use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar};
use zeroize::Zeroize;

use crate::{
    common::generate_key_image,
    domains::{CLSAG_DOMAIN_0, CLSAG_DOMAIN_1, CLSAG_DOMAIN_2, G},
    errors::{retries_exceeded, CryptoError, Result, MAX_PROVER_RETRIES},
    hashing::Hash,
    protocols::{
        point_protocol::{dbl_mult, PointProtocol},
        scalar_protocol::ScalarProtocol,
    },
    serialization::{Reader, Writer},
    signatures::borromean::contains_duplicates,
    transcript::Transcript,
};

/// The commitment half of a CLSAG signature.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CommitmentBinding {
    /// `D = z·Hp(P_π)`
    pub commitment_image: EdwardsPoint,
    /// `C' = (1/8)(v·H + r'·G)`
    pub pseudo_commitment: EdwardsPoint,
}

/// The secrets a commitment-binding signer supplies.
#[derive(Clone, Debug, Zeroize)]
pub struct CommitmentContext {
    pub input_blinding_factor: Scalar,
    #[zeroize(skip)]
    pub public_commitments: Vec<EdwardsPoint>,
    pub pseudo_blinding_factor: Scalar,
    #[zeroize(skip)]
    pub pseudo_commitment: EdwardsPoint,
}

/// A CLSAG ring signature.
#[derive(Clone, Debug, PartialEq)]
pub struct RingSignature {
    pub scalars: Vec<Scalar>,
    pub challenge: Scalar,
    pub binding: Option<CommitmentBinding>,
}

/// A prepared signature plus the values `complete_ring_signature` needs to
/// fold the signing key in.
#[derive(Clone, Debug)]
pub struct PreparedRingSignature {
    pub signature: RingSignature,
    pub challenges: Vec<Scalar>,
    pub mu_p: Scalar,
}

impl RingSignature {
    /// Whether the signature has the right shape for a ring of `ring_size`
    /// keys; with commitment binding the commitment image must be a
    /// subgroup point.
    pub fn check_construction(&self, ring_size: usize, use_commitments: bool) -> bool {
        if self.scalars.len() != ring_size || !self.challenge.valid() {
            return false;
        }
        if !self.scalars.iter().all(ScalarProtocol::valid) {
            return false;
        }
        if use_commitments {
            match &self.binding {
                Some(binding) => binding.commitment_image.check_subgroup(),
                None => false,
            }
        } else {
            true
        }
    }

    pub fn serialize(&self, writer: &mut Writer) {
        writer.scalar_vector(&self.scalars);
        writer.scalar(&self.challenge);
        match &self.binding {
            Some(binding) => {
                writer.boolean(true);
                writer.point(&binding.commitment_image);
                writer.point(&binding.pseudo_commitment);
            },
            None => writer.boolean(false),
        }
    }

    pub fn deserialize(reader: &mut Reader<'_>) -> Result<Self> {
        let scalars = reader.scalar_vector()?;
        let challenge = reader.scalar()?;
        let binding = if reader.boolean()? {
            Some(CommitmentBinding {
                commitment_image: reader.point()?,
                pseudo_commitment: reader.point()?,
            })
        } else {
            None
        };
        Ok(Self { scalars, challenge, binding })
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

/// Derives the aggregation scalar for one of the CLSAG domains.
fn aggregation_scalar(
    domain: &Scalar,
    key_image: &EdwardsPoint,
    public_keys: &[EdwardsPoint],
    binding: Option<(&EdwardsPoint, &[EdwardsPoint], &EdwardsPoint)>,
) -> Scalar {
    let mut transcript = Transcript::new();
    transcript.update_scalar(domain);
    transcript.update_point(key_image);
    transcript.update_points(public_keys);
    if let Some((commitment_image, commitments, pseudo_commitment)) = binding {
        transcript.update_point(commitment_image);
        transcript.update_points(commitments);
        transcript.update_point(pseudo_commitment);
    }

    transcript.challenge()
}

/// The per-round transcript common to every ring index.
fn round_transcript(
    message_digest: &Hash,
    public_keys: &[EdwardsPoint],
    binding: Option<(&[EdwardsPoint], &EdwardsPoint)>,
) -> Transcript {
    let mut transcript = Transcript::new();
    transcript.update_scalar(&CLSAG_DOMAIN_1);
    transcript.update_hash(message_digest);
    transcript.update_points(public_keys);
    if let Some((commitments, pseudo_commitment)) = binding {
        transcript.update_points(commitments);
        transcript.update_point(pseudo_commitment);
    }

    transcript
}

/// One verification/generation round at ring index `idx`:
/// `L = h·μ_P·P + s·G [+ h·μ_C·8(C − C')]`,
/// `R = s·Hp(P) + h·μ_P·I [+ h·μ_C·D]`.
#[allow(clippy::too_many_arguments)]
fn round_points(
    h: &Scalar,
    s: &Scalar,
    public_key: &EdwardsPoint,
    key_image: &EdwardsPoint,
    mu_p: &Scalar,
    mu_c: &Scalar,
    commitment_term: Option<(&EdwardsPoint, &EdwardsPoint)>,
) -> (EdwardsPoint, EdwardsPoint) {
    let r = h * mu_p;

    let mut l_point = dbl_mult(&r, public_key, s, &G);

    let hashed_point = public_key.hash_to_point();

    let mut r_point = dbl_mult(s, &hashed_point, &r, key_image);

    if let Some((offset_commitment, commitment_image)) = commitment_term {
        let r2 = h * mu_c;

        l_point += r2 * offset_commitment;
        r_point += r2 * commitment_image;
    }

    (l_point, r_point)
}

/// Verifies a CLSAG signature. Pass the ring's input commitments to check
/// a commitment-bound signature; an empty slice verifies the plain form.
pub fn check_ring_signature(
    message_digest: &Hash,
    key_image: &EdwardsPoint,
    public_keys: &[EdwardsPoint],
    signature: &RingSignature,
    commitments: &[EdwardsPoint],
) -> bool {
    let use_commitments = signature.binding.is_some() && commitments.len() == public_keys.len();

    if contains_duplicates(public_keys) {
        return false;
    }

    let ring_size = public_keys.len();

    if !signature.check_construction(ring_size, use_commitments) {
        return false;
    }

    if !key_image.check_subgroup() {
        return false;
    }

    let binding = signature.binding.as_ref();

    let mu_p = aggregation_scalar(
        &CLSAG_DOMAIN_0,
        key_image,
        public_keys,
        binding
            .filter(|_| use_commitments)
            .map(|b| (&b.commitment_image, commitments, &b.pseudo_commitment)),
    );
    if !mu_p.valid() {
        return false;
    }

    let mu_c = if use_commitments {
        let b = binding.expect("binding present when commitments in use");
        let mu_c = aggregation_scalar(
            &CLSAG_DOMAIN_2,
            key_image,
            public_keys,
            Some((&b.commitment_image, commitments, &b.pseudo_commitment)),
        );
        if !mu_c.valid() {
            return false;
        }
        mu_c
    } else {
        Scalar::ZERO
    };

    let transcript = round_transcript(
        message_digest,
        public_keys,
        binding
            .filter(|_| use_commitments)
            .map(|b| (commitments, &b.pseudo_commitment)),
    );

    // precompute the commitment offsets once per index
    let offsets: Vec<EdwardsPoint> = if use_commitments {
        let pseudo = binding.expect("checked").pseudo_commitment;
        commitments.iter().map(|c| (c - pseudo).mul8()).collect()
    } else {
        Vec::new()
    };

    let mut h = signature.challenge;

    for i in 0..ring_size {
        let commitment_term = if use_commitments {
            let b = binding.expect("checked");
            Some((&offsets[i], &b.commitment_image))
        } else {
            None
        };

        let (l_point, r_point) = round_points(
            &h,
            &signature.scalars[i],
            &public_keys[i],
            key_image,
            &mu_p,
            &mu_c,
            commitment_term,
        );

        let mut sub_transcript = transcript.clone();
        sub_transcript.update_point(&l_point);
        sub_transcript.update_point(&r_point);

        h = sub_transcript.challenge();
        if !h.valid() {
            return false;
        }
    }

    // the loop must close back onto the stored challenge
    h == signature.challenge
}

/// Builds a CLSAG signature with the nonce parked at the real index; the
/// signing key enters in [`complete_ring_signature`].
pub fn prepare_ring_signature(
    message_digest: &Hash,
    key_image: &EdwardsPoint,
    public_keys: &[EdwardsPoint],
    real_output_index: usize,
    context: Option<&CommitmentContext>,
) -> Result<PreparedRingSignature> {
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

    let context = match context {
        Some(ctx) if ctx.public_commitments.len() == ring_size => {
            if !ctx.input_blinding_factor.valid() || !ctx.pseudo_blinding_factor.valid() {
                return Err(CryptoError::InvalidArgument(
                    "blinding factors must be non-zero scalars".to_string(),
                ));
            }
            Some(ctx)
        },
        Some(_) => {
            return Err(CryptoError::InvalidArgument(
                "commitment ring length must match the key ring".to_string(),
            ))
        },
        None => None,
    };

    // z is the discrete log of 8(C_π − C') with respect to G
    let (z, binding) = match context {
        Some(ctx) => {
            let z = ctx.input_blinding_factor - ctx.pseudo_blinding_factor;

            let commitment =
                (ctx.public_commitments[real_output_index] - ctx.pseudo_commitment).mul8();
            if commitment != EdwardsPoint::mul_base(&z) {
                return Err(CryptoError::InvalidArgument(
                    "pseudo commitment does not open against the real input commitment".to_string(),
                ));
            }

            // the commitment image rides on the public ephemeral, not the
            // commitment point, so the verifier rounds stay two-term
            let commitment_image = generate_key_image(&public_keys[real_output_index], &z)?;

            (
                z,
                Some(CommitmentBinding {
                    commitment_image,
                    pseudo_commitment: ctx.pseudo_commitment,
                }),
            )
        },
        None => (Scalar::ZERO, None),
    };

    let mu_p = aggregation_scalar(
        &CLSAG_DOMAIN_0,
        key_image,
        public_keys,
        binding
            .as_ref()
            .zip(context)
            .map(|(b, ctx)| (&b.commitment_image, ctx.public_commitments.as_slice(), &b.pseudo_commitment)),
    );
    if !mu_p.valid() {
        // no random component feeds this transcript, trying again cannot help
        return Err(CryptoError::InvalidArgument(
            "aggregation transcript produced a zero challenge".to_string(),
        ));
    }

    let mu_c = match (&binding, context) {
        (Some(b), Some(ctx)) => {
            let mu_c = aggregation_scalar(
                &CLSAG_DOMAIN_2,
                key_image,
                public_keys,
                Some((&b.commitment_image, ctx.public_commitments.as_slice(), &b.pseudo_commitment)),
            );
            if !mu_c.valid() {
                return Err(CryptoError::InvalidArgument(
                    "aggregation transcript produced a zero challenge".to_string(),
                ));
            }
            mu_c
        },
        _ => Scalar::ZERO,
    };

    let transcript = round_transcript(
        message_digest,
        public_keys,
        binding
            .as_ref()
            .zip(context)
            .map(|(b, ctx)| (ctx.public_commitments.as_slice(), &b.pseudo_commitment)),
    );

    let offsets: Vec<EdwardsPoint> = match context {
        Some(ctx) => ctx
            .public_commitments
            .iter()
            .map(|c| (c - ctx.pseudo_commitment).mul8())
            .collect(),
        None => Vec::new(),
    };

    let mut rng = rand::thread_rng();

    'retry: for _ in 0..MAX_PROVER_RETRIES {
        let mut alpha_transcript = Transcript::new();
        alpha_transcript.update_hash(message_digest);
        alpha_transcript.update_point(key_image);
        alpha_transcript.update_scalar(&Scalar::random_not_zero(&mut rng));
        if let Some(ctx) = context {
            alpha_transcript.update_scalar(&ctx.input_blinding_factor);
            alpha_transcript.update_scalar(&ctx.pseudo_blinding_factor);
            alpha_transcript.update_point(&ctx.pseudo_commitment);
            alpha_transcript.update_points(&ctx.public_commitments);
        }

        let alpha = alpha_transcript.challenge();
        if !alpha.valid() {
            continue 'retry;
        }

        let mut scalars = Scalar::random_many(&mut rng, ring_size);
        let mut challenges = vec![Scalar::ZERO; ring_size];

        // the real slot commits to the nonce in constant time
        {
            let l_point = EdwardsPoint::mul_base(&alpha);
            let r_point = alpha * public_keys[real_output_index].hash_to_point();

            let mut sub_transcript = transcript.clone();
            sub_transcript.update_point(&l_point);
            sub_transcript.update_point(&r_point);

            let challenge = sub_transcript.challenge();
            if !challenge.valid() {
                continue 'retry;
            }

            challenges[(real_output_index + 1) % ring_size] = challenge;
        }

        for i in (real_output_index + 1)..(real_output_index + ring_size) {
            let idx = i % ring_size;

            let commitment_term = binding
                .as_ref()
                .map(|b| (&offsets[idx], &b.commitment_image));

            let (l_point, r_point) = round_points(
                &challenges[idx],
                &scalars[idx],
                &public_keys[idx],
                key_image,
                &mu_p,
                &mu_c,
                commitment_term,
            );

            let mut sub_transcript = transcript.clone();
            sub_transcript.update_point(&l_point);
            sub_transcript.update_point(&r_point);

            let challenge = sub_transcript.challenge();
            if !challenge.valid() {
                continue 'retry;
            }

            challenges[(idx + 1) % ring_size] = challenge;
        }

        scalars[real_output_index] = alpha;
        if binding.is_some() {
            scalars[real_output_index] -= challenges[real_output_index] * z * mu_c;
        }

        return Ok(PreparedRingSignature {
            signature: RingSignature {
                scalars,
                challenge: challenges[0],
                binding,
            },
            challenges,
            mu_p,
        });
    }

    Err(retries_exceeded())
}

/// Folds the signing scalar into a prepared signature:
/// `s_π = α − h_π·μ_P·x [− h_π·μ_C·z]` (the `μ_C` part is already in
/// place from preparation).
pub fn complete_ring_signature(
    signing_scalar: &Scalar,
    real_output_index: usize,
    prepared: &PreparedRingSignature,
) -> Result<RingSignature> {
    let signature = &prepared.signature;

    if signature.scalars.is_empty()
        || real_output_index >= signature.scalars.len()
        || prepared.challenges.len() != signature.scalars.len()
    {
        return Err(CryptoError::InvalidArgument(
            "prepared signature is malformed".to_string(),
        ));
    }

    if !signing_scalar.valid() || !signature.challenge.valid() || !prepared.mu_p.valid() {
        return Err(CryptoError::InvalidArgument(
            "scalars must be non-zero".to_string(),
        ));
    }

    if !signature.scalars.iter().all(ScalarProtocol::valid)
        || !prepared.challenges.iter().all(ScalarProtocol::valid)
    {
        return Err(CryptoError::InvalidArgument(
            "prepared signature carries zero scalars".to_string(),
        ));
    }

    let mut scalars = signature.scalars.clone();

    scalars[real_output_index] -=
        prepared.challenges[real_output_index] * (prepared.mu_p * signing_scalar);

    Ok(RingSignature {
        scalars,
        challenge: signature.challenge,
        binding: signature.binding,
    })
}

/// Signs in one step for a signer who holds every secret. Locates the real
/// index by matching the public ephemeral (and, with commitments, the
/// blinding delta) against the ring.
pub fn generate_ring_signature(
    message_digest: &Hash,
    secret_ephemeral: &Scalar,
    public_keys: &[EdwardsPoint],
    context: Option<&CommitmentContext>,
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

    let real_output_index = match context {
        Some(ctx) => {
            let delta_point =
                EdwardsPoint::mul_base(&(ctx.input_blinding_factor - ctx.pseudo_blinding_factor));
            public_keys
                .iter()
                .zip(ctx.public_commitments.iter())
                .position(|(key, commitment)| {
                    *key == public_ephemeral
                        && (commitment - ctx.pseudo_commitment).mul8() == delta_point
                })
        },
        None => public_keys.iter().position(|key| *key == public_ephemeral),
    }
    .ok_or_else(|| {
        CryptoError::InvalidArgument("signer's output is not in the ring".to_string())
    })?;

    let key_image = generate_key_image(&public_ephemeral, secret_ephemeral)?;

    let prepared =
        prepare_ring_signature(message_digest, &key_image, public_keys, real_output_index, context)?;

    complete_ring_signature(secret_ephemeral, real_output_index, &prepared)
}

#[cfg(test)]
mod tests {
    use rand::thread_rng;

    use super::*;
    use crate::{
        common::generate_keys_m,
        hashing::sha3,
        ringct::{generate_pedersen_commitment, generate_pseudo_commitments},
    };

    fn plain_ring(size: usize, index: usize) -> (Vec<EdwardsPoint>, Scalar, EdwardsPoint) {
        let mut rng = thread_rng();
        let (public_keys, secret_keys) = generate_keys_m(&mut rng, size);
        let secret = secret_keys[index];
        let key_image = generate_key_image(&public_keys[index], &secret).unwrap();
        (public_keys, secret, key_image)
    }

    fn commitment_ring(size: usize, index: usize) -> (Vec<EdwardsPoint>, CommitmentContext) {
        let mut rng = thread_rng();
        let amount = 100u64;
        let blinding_factors = Scalar::random_many(&mut rng, size);
        let commitments: Vec<EdwardsPoint> = blinding_factors
            .iter()
            .map(|factor| generate_pedersen_commitment(factor, amount))
            .collect();
        let (pseudo_blinding_factors, pseudo_commitments) =
            generate_pseudo_commitments(&[amount], &[blinding_factors[index]]).unwrap();
        let context = CommitmentContext {
            input_blinding_factor: blinding_factors[index],
            public_commitments: commitments.clone(),
            pseudo_blinding_factor: pseudo_blinding_factors[0],
            pseudo_commitment: pseudo_commitments[0],
        };
        (commitments, context)
    }

    #[test]
    fn plain_round_trip() {
        let (ring, secret, key_image) = plain_ring(4, 2);
        let digest = sha3(b"clsag message");

        let signature = generate_ring_signature(&digest, &secret, &ring, None).unwrap();
        assert!(check_ring_signature(&digest, &key_image, &ring, &signature, &[]));
    }

    #[test]
    fn commitment_round_trip() {
        let (ring, secret, key_image) = plain_ring(8, 3);
        let (commitments, context) = commitment_ring(8, 3);
        let digest = sha3(b"clsag with commitments");

        let signature =
            generate_ring_signature(&digest, &secret, &ring, Some(&context)).unwrap();
        assert!(check_ring_signature(&digest, &key_image, &ring, &signature, &commitments));
    }

    #[test]
    fn wrong_key_image_fails() {
        let (ring, secret, _) = plain_ring(4, 2);
        let digest = sha3(b"clsag message");
        let signature = generate_ring_signature(&digest, &secret, &ring, None).unwrap();

        let mut rng = thread_rng();
        let other = EdwardsPoint::random(&mut rng);
        assert!(other.check_subgroup());
        assert!(!check_ring_signature(&digest, &other, &ring, &signature, &[]));
    }

    #[test]
    fn shrunken_ring_fails() {
        let (ring, secret, key_image) = plain_ring(4, 0);
        let digest = sha3(b"clsag message");
        let signature = generate_ring_signature(&digest, &secret, &ring, None).unwrap();

        assert!(!check_ring_signature(&digest, &key_image, &ring[1..], &signature, &[]));
    }

    #[test]
    fn tampered_scalar_fails() {
        let (ring, secret, key_image) = plain_ring(4, 1);
        let digest = sha3(b"clsag message");
        let mut signature = generate_ring_signature(&digest, &secret, &ring, None).unwrap();

        signature.scalars[2] += Scalar::ONE;
        assert!(!check_ring_signature(&digest, &key_image, &ring, &signature, &[]));
    }

    #[test]
    fn prepare_complete_split() {
        let (ring, secret, key_image) = plain_ring(4, 3);
        let digest = sha3(b"split clsag");

        let prepared = prepare_ring_signature(&digest, &key_image, &ring, 3, None).unwrap();
        assert!(!check_ring_signature(&digest, &key_image, &ring, &prepared.signature, &[]));

        let signature = complete_ring_signature(&secret, 3, &prepared).unwrap();
        assert!(check_ring_signature(&digest, &key_image, &ring, &signature, &[]));
    }

    #[test]
    fn one_ring_signature() {
        // the audit proof relies on rings of exactly one key
        let (ring, secret, key_image) = plain_ring(1, 0);
        let digest = sha3(b"one of one");
        let signature = generate_ring_signature(&digest, &secret, &ring, None).unwrap();
        assert!(check_ring_signature(&digest, &key_image, &ring, &signature, &[]));
    }

    #[test]
    fn serialization_round_trip() {
        let (ring, secret, _) = plain_ring(4, 2);
        let signature = generate_ring_signature(&sha3(b"wire"), &secret, &ring, None).unwrap();
        assert_eq!(RingSignature::from_bytes(&signature.to_bytes()).unwrap(), signature);

        let (ring, secret, key_image) = plain_ring(4, 1);
        let (commitments, context) = commitment_ring(4, 1);
        let signature =
            generate_ring_signature(&sha3(b"wire2"), &secret, &ring, Some(&context)).unwrap();
        let decoded = RingSignature::from_bytes(&signature.to_bytes()).unwrap();
        assert_eq!(decoded, signature);
        assert!(check_ring_signature(&sha3(b"wire2"), &key_image, &ring, &decoded, &commitments));
    }
}
