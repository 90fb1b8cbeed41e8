// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! Pedersen commitments and the pseudo-commitment balancing that binds a
//! set of spends to a set of outputs without revealing amounts.

use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar};
use rand::thread_rng;

use crate::{
    domains::{AMOUNT_MASK_DOMAIN, COMMITMENT_MASK_DOMAIN, G, H, INV_EIGHT},
    errors::{CryptoError, Result},
    point_vector::PointVector,
    protocols::scalar_protocol::ScalarProtocol,
    transcript::Transcript,
};

/// `C = (1/8)·(v·H + r·G)`.
///
/// The cofactor division is part of the commitment: verifiers multiply by
/// eight before use, which forces the result into the prime-order subgroup
/// regardless of how the commitment bytes arrived.
pub fn generate_pedersen_commitment(blinding_factor: &Scalar, amount: u64) -> EdwardsPoint {
    let value = Scalar::from(amount);

    *INV_EIGHT * (value * *H + blinding_factor * G)
}

/// Generates the pseudo output commitments for a set of input amounts.
///
/// The final pseudo blinding factor absorbs the difference between the
/// output blinding factors and the fresh pseudo blinding factors, so that
/// `Σ pseudo == Σ output` on the blinding side and commitment parity holds
/// exactly when the amounts balance. This validates amounts only, not their
/// range.
pub fn generate_pseudo_commitments(
    input_amounts: &[u64],
    output_blinding_factors: &[Scalar],
) -> Result<(Vec<Scalar>, Vec<EdwardsPoint>)> {
    if input_amounts.is_empty() {
        return Err(CryptoError::InvalidArgument("input amounts are empty".to_string()));
    }
    for blinding_factor in output_blinding_factors {
        if !blinding_factor.valid() {
            return Err(CryptoError::InvalidArgument(
                "output blinding factors must be non-zero scalars".to_string(),
            ));
        }
    }

    let sum_of_outputs: Scalar = output_blinding_factors.iter().sum();

    let mut rng = thread_rng();
    let mut pseudo_blinding_factors = Scalar::random_many(&mut rng, input_amounts.len());

    let sum_of_pseudo_outputs: Scalar = pseudo_blinding_factors.iter().sum();

    // fold the delta into the last mask so the blinding sides cancel
    let last = pseudo_blinding_factors.len() - 1;
    pseudo_blinding_factors[last] += sum_of_outputs - sum_of_pseudo_outputs;

    let pseudo_commitments = pseudo_blinding_factors
        .iter()
        .zip(input_amounts.iter())
        .map(|(factor, amount)| generate_pedersen_commitment(factor, *amount))
        .collect();

    Ok((pseudo_blinding_factors, pseudo_commitments))
}

/// Whether `Σ pseudo == Σ output + fee·H`.
pub fn check_commitments_parity(
    pseudo_commitments: &[EdwardsPoint],
    output_commitments: &[EdwardsPoint],
    transaction_fee: u64,
) -> bool {
    let pseudo_total = PointVector(pseudo_commitments.to_vec()).sum();
    let output_total = PointVector(output_commitments.to_vec()).sum();

    let fee_commitment = generate_pedersen_commitment(&Scalar::ZERO, transaction_fee);

    pseudo_total == output_total + fee_commitment
}

/// The deterministic amount mask for an output derivation scalar.
pub fn generate_amount_mask(derivation_scalar: &Scalar) -> Result<Scalar> {
    if !derivation_scalar.valid() {
        return Err(CryptoError::InvalidArgument(
            "derivation_scalar must be a non-zero scalar".to_string(),
        ));
    }

    let mut transcript = Transcript::new();
    transcript.update_scalar(&AMOUNT_MASK_DOMAIN);
    transcript.update_scalar(derivation_scalar);

    Ok(transcript.challenge())
}

/// The deterministic commitment blinding factor for an output derivation
/// scalar.
pub fn generate_commitment_blinding_factor(derivation_scalar: &Scalar) -> Result<Scalar> {
    if !derivation_scalar.valid() {
        return Err(CryptoError::InvalidArgument(
            "derivation_scalar must be a non-zero scalar".to_string(),
        ));
    }

    let mut transcript = Transcript::new();
    transcript.update_scalar(&COMMITMENT_MASK_DOMAIN);
    transcript.update_scalar(derivation_scalar);

    Ok(transcript.challenge())
}

/// XORs an amount with the low eight bytes of the amount mask. Applying the
/// mask twice restores the original value.
pub fn toggle_masked_amount(amount_mask: &Scalar, amount: u64) -> Result<u64> {
    if !amount_mask.valid() {
        return Err(CryptoError::InvalidArgument(
            "amount_mask must be a non-zero scalar".to_string(),
        ));
    }

    Ok(amount ^ amount_mask.to_u64())
}
