// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! Auditable output-ownership proofs.
//!
//! The prover demonstrates control of a set of outputs by producing, for
//! each secret ephemeral, its key image and a one-of-one CLSAG signature
//! over a rolling transcript digest. The bundle serializes to a
//! Base58-check string that any party holding the public ephemerals can
//! verify offline.

use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar};

use crate::{
    common::generate_key_image,
    domains::OUTPUT_PROOF_DOMAIN,
    encoding::base58,
    errors::{CryptoError, Result},
    protocols::scalar_protocol::ScalarProtocol,
    serialization::{Reader, Writer},
    signatures::clsag,
    transcript::Transcript,
};

/// Generates a Base58-check encoded ownership proof for the outputs behind
/// the given secret ephemerals.
pub fn generate_outputs_proof(secret_ephemerals: &[Scalar]) -> Result<String> {
    if secret_ephemerals.is_empty() {
        return Err(CryptoError::InvalidArgument(
            "no secret ephemerals provided".to_string(),
        ));
    }

    let mut key_images = Vec::with_capacity(secret_ephemerals.len());
    let mut signatures = Vec::with_capacity(secret_ephemerals.len());

    let mut transcript = Transcript::new();
    transcript.update_scalar(&OUTPUT_PROOF_DOMAIN);

    for secret_ephemeral in secret_ephemerals {
        if !secret_ephemeral.valid() {
            return Err(CryptoError::InvalidArgument(
                "secret ephemerals must be non-zero scalars".to_string(),
            ));
        }

        let public_ephemeral = EdwardsPoint::mul_base(secret_ephemeral);

        let key_image = generate_key_image(&public_ephemeral, secret_ephemeral)?;

        // the rolling transcript fixes the order of the proven outputs
        transcript.update_point(&public_ephemeral);
        transcript.update_point(&key_image);

        let signature = clsag::generate_ring_signature(
            &transcript.challenge_hash(),
            secret_ephemeral,
            &[public_ephemeral],
            None,
        )?;

        key_images.push(key_image);
        signatures.push(signature);
    }

    let mut writer = Writer::new();
    writer.point_vector(&key_images);
    writer.varint(signatures.len() as u64);
    for signature in &signatures {
        signature.serialize(&mut writer);
    }

    Ok(base58::encode_check(writer.as_bytes()))
}

/// Verifies an ownership proof against the claimed public ephemerals.
/// Returns the recovered key images in proof order, or `None` when the
/// bundle does not verify.
pub fn check_outputs_proof(
    public_ephemerals: &[EdwardsPoint],
    proof: &str,
) -> Option<Vec<EdwardsPoint>> {
    let decoded = base58::decode_check(proof).ok()?;
    let mut reader = Reader::new(&decoded);

    let key_images = reader.point_vector().ok()?;

    let signature_count = reader.varint().ok()? as usize;
    let mut signatures = Vec::with_capacity(signature_count.min(1024));
    for _ in 0..signature_count {
        signatures.push(clsag::RingSignature::deserialize(&mut reader).ok()?);
    }

    if public_ephemerals.len() != key_images.len() || key_images.len() != signatures.len() {
        return None;
    }

    let mut transcript = Transcript::new();
    transcript.update_scalar(&OUTPUT_PROOF_DOMAIN);

    for ((public_ephemeral, key_image), signature) in public_ephemerals
        .iter()
        .zip(key_images.iter())
        .zip(signatures.iter())
    {
        transcript.update_point(public_ephemeral);
        transcript.update_point(key_image);

        if !clsag::check_ring_signature(
            &transcript.challenge_hash(),
            key_image,
            core::slice::from_ref(public_ephemeral),
            signature,
            &[],
        ) {
            return None;
        }
    }

    Some(key_images)
}
