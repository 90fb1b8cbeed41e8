// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause
//
// Inspired by the work of Sarang Noether at
// https://github.com/SarangNoether/skunkworks/tree/pybullet-plus

//! Bulletproofs+: aggregate range proofs built on a weighted inner
//! product, roughly a third smaller and cheaper to verify than the
//! original construction.

use core::fmt;
use core::str::FromStr;
use std::sync::Mutex;

use curve25519_dalek::{
    edwards::EdwardsPoint,
    scalar::Scalar,
    traits::{Identity, MultiscalarMul, VartimeMultiscalarMul},
};
use lazy_static::lazy_static;

use crate::{
    common::pow2_round,
    domains::{
        BULLETPROOFS_PLUS_DOMAIN_0, BULLETPROOFS_PLUS_DOMAIN_1, BULLETPROOFS_PLUS_DOMAIN_2, G, H,
        INV_EIGHT,
    },
    errors::{retries_exceeded, CryptoError, Result, MAX_PROVER_RETRIES},
    hashing::sha3,
    point_vector::PointVector,
    protocols::{point_protocol::PointProtocol, scalar_protocol::ScalarProtocol},
    ringct::generate_pedersen_commitment,
    scalar_vector::ScalarVector,
    serialization::{Reader, Writer},
    transcript::Transcript,
};

lazy_static! {
    static ref EXPONENTS: Mutex<(PointVector, PointVector)> =
        Mutex::new((PointVector::default(), PointVector::default()));
}

// Same shape as the Bulletproofs cache but a distinct domain, so the two
// systems can never share a generator.
fn generate_exponents(count: usize) -> (PointVector, PointVector) {
    let mut cache = EXPONENTS.lock().expect("generator cache poisoned");
    let (gi, hi) = &mut *cache;

    if count <= gi.len() {
        return (gi.slice(0, count), hi.slice(0, count));
    }

    let mut writer = Writer::new();
    for i in gi.len()..count {
        writer.reset();
        writer.u64(i as u64);
        writer.point(&BULLETPROOFS_PLUS_DOMAIN_1);
        gi.append(sha3(writer.as_bytes()).to_point());
        writer.point(&BULLETPROOFS_PLUS_DOMAIN_2);
        hi.append(sha3(writer.as_bytes()).to_point());
    }

    (gi.clone(), hi.clone())
}

/// A Bulletproofs+ range proof.
#[derive(Clone, Debug, PartialEq)]
pub struct BulletproofPlus {
    pub a: EdwardsPoint,
    pub a1: EdwardsPoint,
    pub b: EdwardsPoint,
    pub r1: Scalar,
    pub s1: Scalar,
    pub d1: Scalar,
    pub l_points: Vec<EdwardsPoint>,
    pub r_points: Vec<EdwardsPoint>,
}

impl BulletproofPlus {
    /// Whether the proof has a usable shape.
    pub fn check_construction(&self) -> bool {
        if self.l_points.len() != self.r_points.len() || self.l_points.is_empty() {
            return false;
        }
        if self.l_points.len() >= 64 {
            return false;
        }
        if !self.a.valid() || !self.a1.valid() || !self.b.valid() {
            return false;
        }
        if !self.l_points.iter().all(PointProtocol::valid)
            || !self.r_points.iter().all(PointProtocol::valid)
        {
            return false;
        }

        self.r1.valid() && self.s1.valid() && self.d1.valid()
    }

    pub fn serialize(&self, writer: &mut Writer) {
        writer.point(&self.a);
        writer.point(&self.a1);
        writer.point(&self.b);
        writer.scalar(&self.r1);
        writer.scalar(&self.s1);
        writer.scalar(&self.d1);
        writer.point_vector(&self.l_points);
        writer.point_vector(&self.r_points);
    }

    pub fn deserialize(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self {
            a: reader.point()?,
            a1: reader.point()?,
            b: reader.point()?,
            r1: reader.scalar()?,
            s1: reader.scalar()?,
            d1: reader.scalar()?,
            l_points: reader.point_vector()?,
            r_points: reader.point_vector()?,
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

impl fmt::Display for BulletproofPlus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl FromStr for BulletproofPlus {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|_| CryptoError::InvalidArgument("proof hex is malformed".to_string()))?;
        Self::from_bytes(&bytes)
    }
}

fn check_range_bits(bits: usize) -> Result<()> {
    if bits == 0 {
        return Err(CryptoError::InvalidArgument("N must be at least 1 bit".to_string()));
    }
    if bits > 64 {
        return Err(CryptoError::InvalidArgument("N must not exceed 64 bits".to_string()));
    }
    Ok(())
}

/// `Σ aᵢ·y^(i+1)·bᵢ`
fn weighted_inner_product(a: &ScalarVector, b: &ScalarVector, y: &Scalar) -> Scalar {
    assert_eq!(a.len(), b.len(), "vectors must be of equal size");
    let mut result = Scalar::ZERO;
    let mut y_power = *y;
    for (a_value, b_value) in a.0.iter().zip(b.0.iter()) {
        result += a_value * y_power * b_value;
        y_power *= y;
    }

    result
}

struct ZeroChallenge;

struct InnerProductRound {
    gi: PointVector,
    hi: PointVector,
    a: ScalarVector,
    b: ScalarVector,
    alpha: Scalar,
    y: Scalar,
}

struct InnerProductResult {
    a1: EdwardsPoint,
    b: EdwardsPoint,
    r1: Scalar,
    s1: Scalar,
    d1: Scalar,
    l_points: Vec<EdwardsPoint>,
    r_points: Vec<EdwardsPoint>,
}

impl InnerProductRound {
    fn compute(
        mut self,
        transcript: &mut Transcript,
    ) -> core::result::Result<InnerProductResult, ZeroChallenge> {
        let mut rng = rand::thread_rng();

        let mut l_points = Vec::new();
        let mut r_points = Vec::new();

        let mut n = self.gi.len();
        while n > 1 {
            n /= 2;

            let a1 = self.a.slice(0, n);
            let a2 = self.a.slice(n, self.a.len());
            let b1 = self.b.slice(0, n);
            let b2 = self.b.slice(n, self.b.len());
            let g1 = self.gi.slice(0, n);
            let g2 = self.gi.slice(n, self.gi.len());
            let h1 = self.hi.slice(0, n);
            let h2 = self.hi.slice(n, self.hi.len());

            let d_l = Scalar::random_not_zero(&mut rng);
            let d_r = Scalar::random_not_zero(&mut rng);

            let y_pow = self.y.pow_u64(n as u64);
            let y_inv_pow = self.y.invert().pow_u64(n as u64);

            let c_l = weighted_inner_product(&a1, &b2, &self.y);
            let c_r = weighted_inner_product(&(&a2 * y_pow), &b1, &self.y);

            // witness-derived scalars keep these commitments constant time
            let l_point = *INV_EIGHT
                * ((&a1 * y_inv_pow).commit(&g2) + b2.commit(&h1) + c_l * *H + d_l * G);
            let r_point = *INV_EIGHT
                * ((&a2 * y_pow).commit(&g1) + b1.commit(&h2) + c_r * *H + d_r * G);

            transcript.update_point(&l_point);
            transcript.update_point(&r_point);

            let x = transcript.challenge();
            if !x.valid() {
                return Err(ZeroChallenge);
            }
            let x_inverse = x.invert();

            l_points.push(l_point);
            r_points.push(r_point);

            self.gi = g1.dbl_mult(&x_inverse, &g2, &(x * y_inv_pow));
            self.hi = h1.dbl_mult(&x, &h2, &x_inverse);

            self.a = &(&a1 * x) + &(&a2 * (y_pow * x_inverse));
            self.b = &(&b1 * x_inverse) + &(&b2 * x);

            self.alpha = d_l * x.squared() + self.alpha + d_r * x_inverse.squared();
        }

        for _ in 0..MAX_PROVER_RETRIES {
            let r = Scalar::random_not_zero(&mut rng);
            let s = Scalar::random_not_zero(&mut rng);
            let d = Scalar::random_not_zero(&mut rng);
            let eta = Scalar::random_not_zero(&mut rng);

            let ry_b_sy_a = r * self.y * self.b[0] + s * self.y * self.a[0];

            let a1 = *INV_EIGHT
                * (r * self.gi[0] + s * self.hi[0] + ry_b_sy_a * *H + d * G);
            let b = *INV_EIGHT * (r * self.y * s * *H + eta * G);

            let mut sub_transcript = transcript.clone();
            sub_transcript.update_point(&a1);
            sub_transcript.update_point(&b);

            let x = sub_transcript.challenge();
            if !x.valid() {
                continue;
            }
            *transcript = sub_transcript;

            return Ok(InnerProductResult {
                a1,
                b,
                r1: r + self.a[0] * x,
                s1: s + self.b[0] * x,
                d1: eta + d * x + self.alpha * x.squared(),
                l_points,
                r_points,
            });
        }

        Err(ZeroChallenge)
    }
}

/// Proves that each amount lies in `[0, 2^N)`, returning the proof and the
/// Pedersen commitments it ranges over.
pub fn prove(
    amounts: &[u64],
    blinding_factors: &[Scalar],
    bits: usize,
) -> Result<(BulletproofPlus, Vec<EdwardsPoint>)> {
    check_range_bits(bits)?;

    if amounts.len() != blinding_factors.len() {
        return Err(CryptoError::InvalidArgument(
            "amounts and blinding factors must be the same size".to_string(),
        ));
    }
    if amounts.is_empty() {
        return Err(CryptoError::InvalidArgument("amounts is empty".to_string()));
    }
    for blinding_factor in blinding_factors {
        if !blinding_factor.valid() {
            return Err(CryptoError::InvalidArgument(
                "blinding factors must be non-zero scalars".to_string(),
            ));
        }
    }

    let batch_size = amounts.len();
    let bits = pow2_round(bits);
    let mn = batch_size * bits;

    let (gi, hi) = generate_exponents(mn);

    let powers_of_two = Scalar::from(2u64).pow_expand(bits, false, true);

    let mut commitments = PointVector::default();
    let mut a_l = ScalarVector::default();
    for (amount, blinding_factor) in amounts.iter().zip(blinding_factors.iter()) {
        commitments.append(generate_pedersen_commitment(blinding_factor, *amount));
        a_l.extend(&Scalar::from(*amount).to_bits(bits)?);
    }
    let a_r = &a_l - Scalar::ONE;

    let mut rng = rand::thread_rng();

    'retry: for _ in 0..MAX_PROVER_RETRIES {
        let alpha = Scalar::random_not_zero(&mut rng);

        let mut transcript = Transcript::new();
        transcript.update_scalar(&BULLETPROOFS_PLUS_DOMAIN_0);
        transcript.update_points(&commitments.0);

        // A = (1/8)(⟨aL, Gi⟩ + ⟨aR, Hi⟩ + α·G), constant time over the bits
        let a_point = {
            let mut scalars = a_l.0.clone();
            scalars.extend_from_slice(&a_r.0);
            scalars.push(alpha);
            let mut points = gi.0.clone();
            points.extend_from_slice(&hi.0);
            points.push(G);
            *INV_EIGHT * EdwardsPoint::multiscalar_mul(&scalars, &points)
        };

        transcript.update_point(&a_point);

        let y = transcript.challenge();
        if !y.valid() {
            continue 'retry;
        }
        transcript.update_scalar(&y);

        let z = transcript.challenge();
        if !z.valid() {
            continue 'retry;
        }

        let mut d = ScalarVector::default();
        for j in 0..batch_size {
            let z_even = z.pow_u64(2 * (j as u64 + 1));
            for power in powers_of_two.iter().take(bits) {
                d.append(z_even * power);
            }
        }

        let a_l1 = &a_l - z;

        let y_descending = ScalarVector(y.pow_expand(mn, true, false));
        let a_r1 = &(&a_r + &(&d * &y_descending)) + z;

        let y_pow = y.pow_u64(mn as u64 + 1);
        let mut alpha1 = alpha;
        for (j, blinding_factor) in blinding_factors.iter().enumerate() {
            alpha1 += z.pow_u64(2 * (j as u64 + 1)) * blinding_factor * y_pow;
        }

        let round = InnerProductRound {
            gi: gi.clone(),
            hi: hi.clone(),
            a: a_l1,
            b: a_r1,
            alpha: alpha1,
            y,
        };

        match round.compute(&mut transcript) {
            Ok(result) => {
                return Ok((
                    BulletproofPlus {
                        a: a_point,
                        a1: result.a1,
                        b: result.b,
                        r1: result.r1,
                        s1: result.s1,
                        d1: result.d1,
                        l_points: result.l_points,
                        r_points: result.r_points,
                    },
                    commitments.0,
                ));
            },
            Err(ZeroChallenge) => continue 'retry,
        }
    }

    Err(retries_exceeded())
}

/// Verifies a batch of proofs against their commitment sets with one final
/// multiscalar multiplication.
pub fn verify_batch(
    proofs: &[BulletproofPlus],
    commitments: &[Vec<EdwardsPoint>],
    bits: usize,
) -> Result<bool> {
    check_range_bits(bits)?;

    if proofs.len() != commitments.len() {
        return Ok(false);
    }

    let bits = pow2_round(bits);

    let mut max_mn = 0usize;
    for proof in proofs {
        if proof.l_points.len() >= 64 {
            return Ok(false);
        }
        max_mn = max_mn.max(1usize << proof.l_points.len());
    }

    let (gi, hi) = generate_exponents(max_mn);

    let mut g_scalar = Scalar::ZERO;
    let mut h_scalar = Scalar::ZERO;

    let mut gi_scalars = vec![Scalar::ZERO; max_mn];
    let mut hi_scalars = vec![Scalar::ZERO; max_mn];

    let mut scalars: Vec<Scalar> = Vec::new();
    let mut points: Vec<EdwardsPoint> = Vec::new();

    let mut rng = rand::thread_rng();

    for (proof, proof_commitments) in proofs.iter().zip(commitments.iter()) {
        if !proof.check_construction() {
            return Ok(false);
        }

        if proof_commitments.is_empty() {
            return Ok(false);
        }

        let mn = 1usize << proof.l_points.len();
        if mn % bits != 0 {
            return Ok(false);
        }
        let batch_size = mn / bits;
        if batch_size == 0 || proof_commitments.len() != batch_size {
            return Ok(false);
        }

        let weight = Scalar::random_not_zero(&mut rng);

        let mut transcript = Transcript::new();
        transcript.update_scalar(&BULLETPROOFS_PLUS_DOMAIN_0);
        transcript.update_points(proof_commitments);
        transcript.update_point(&proof.a);

        let y = transcript.challenge();
        if !y.valid() {
            return Ok(false);
        }

        let y_powers = y.pow_expand(mn + 2, false, true);
        let y_pow = y_powers[mn + 1];

        transcript.update_scalar(&y);

        let z = transcript.challenge();
        if !z.valid() {
            return Ok(false);
        }

        let z_powers = z.pow_expand(2 * (batch_size + 1), false, true);

        let mut d = ScalarVector::default();
        let two = Scalar::from(2u64);
        let powers_of_two = two.pow_expand(bits, false, true);
        for j in 0..batch_size {
            for power in powers_of_two.iter().take(bits) {
                d.append(z_powers[2 * (j + 1)] * power);
            }
        }

        let mut challenges = Vec::with_capacity(proof.l_points.len());
        for (l_point, r_point) in proof.l_points.iter().zip(proof.r_points.iter()) {
            transcript.update_point(l_point);
            transcript.update_point(r_point);

            let challenge = transcript.challenge();
            if !challenge.valid() {
                return Ok(false);
            }
            challenges.push(challenge);
        }

        let challenges_inv = ScalarVector(challenges.clone()).invert(false);

        transcript.update_point(&proof.a1);
        transcript.update_point(&proof.b);

        let x = transcript.challenge();
        if !x.valid() {
            return Ok(false);
        }

        let x_squared = x.squared();
        let x_squared_negated = -x_squared;

        let y_inverse = y.invert();
        let rounds = proof.l_points.len();

        let mut y_inv_power = Scalar::ONE;
        for i in 0..mn {
            let mut index = i;

            let mut g = proof.r1 * x * y_inv_power;
            let mut h = proof.s1 * x;

            for j in (0..rounds).rev() {
                let round = challenges.len() - j - 1;
                let base_power = 1usize << j;

                if index / base_power == 0 {
                    g *= challenges_inv[round];
                    h *= challenges[round];
                } else {
                    g *= challenges[round];
                    h *= challenges_inv[round];
                    index -= base_power;
                }
            }

            gi_scalars[i] += weight * (g + x_squared * z);
            hi_scalars[i] += weight * (h - x_squared * (d[i] * y_powers[mn - i] + z));

            y_inv_power *= y_inverse;
        }

        for (j, commitment) in proof_commitments.iter().enumerate() {
            scalars.push(weight * (x_squared_negated * z_powers[2 * (j + 1)] * y_pow));
            points.push(commitment.mul8());
        }

        let one_mn = ScalarVector::filled(mn, Scalar::ONE);
        let y_ascending = ScalarVector(y.pow_expand(mn, false, false));
        h_scalar += weight
            * (proof.r1 * y * proof.s1
                + x_squared
                    * (y_pow * z * one_mn.inner_product(&d)
                        + (z.squared() - z) * one_mn.inner_product(&y_ascending)));

        g_scalar += weight * proof.d1;

        for (scalar, point) in [
            (weight * (-x), proof.a1),
            (-weight, proof.b),
            (weight * x_squared_negated, proof.a),
        ] {
            let cleared = point.mul8();
            if !cleared.valid() {
                return Ok(false);
            }
            scalars.push(scalar);
            points.push(cleared);
        }

        for (j, (l_point, r_point)) in
            proof.l_points.iter().zip(proof.r_points.iter()).enumerate()
        {
            let l_cleared = l_point.mul8();
            let r_cleared = r_point.mul8();
            if !l_cleared.valid() || !r_cleared.valid() {
                return Ok(false);
            }
            scalars.push(challenges[j].squared() * weight * x_squared_negated);
            points.push(l_cleared);
            scalars.push(challenges_inv[j].squared() * weight * x_squared_negated);
            points.push(r_cleared);
        }
    }

    scalars.push(g_scalar);
    points.push(G);
    scalars.push(h_scalar);
    points.push(*H);

    for i in 0..max_mn {
        scalars.push(gi_scalars[i]);
        points.push(gi[i]);
        scalars.push(hi_scalars[i]);
        points.push(hi[i]);
    }

    Ok(EdwardsPoint::vartime_multiscalar_mul(&scalars, &points) == EdwardsPoint::identity())
}

/// Verifies a single proof.
pub fn verify(proof: &BulletproofPlus, commitments: &[EdwardsPoint], bits: usize) -> Result<bool> {
    verify_batch(core::slice::from_ref(proof), &[commitments.to_vec()], bits)
}

#[cfg(test)]
mod tests {
    use rand::thread_rng;

    use super::*;

    fn blindings(count: usize) -> Vec<Scalar> {
        Scalar::random_many(&mut thread_rng(), count)
    }

    #[test]
    fn single_amount_round_trip() {
        let factors = blindings(1);
        let (proof, commitments) = prove(&[1000], &factors, 64).unwrap();
        assert!(verify(&proof, &commitments, 64).unwrap());
    }

    #[test]
    fn aggregated_amounts_round_trip() {
        let factors = blindings(4);
        let (proof, commitments) = prove(&[0, 7, 2u64.pow(40), u64::MAX], &factors, 64).unwrap();
        assert!(verify(&proof, &commitments, 64).unwrap());
    }

    #[test]
    fn short_range_rejects_large_amounts() {
        let factors = blindings(1);
        let (proof, commitments) = prove(&[1000], &factors, 8).unwrap();
        assert!(!verify(&proof, &commitments, 8).unwrap());
    }

    #[test]
    fn short_range_accepts_small_amounts() {
        let factors = blindings(1);
        let (proof, commitments) = prove(&[200], &factors, 8).unwrap();
        assert!(verify(&proof, &commitments, 8).unwrap());
    }

    #[test]
    fn batched_verification() {
        let factors_a = blindings(2);
        let factors_b = blindings(1);
        let (proof_a, commitments_a) = prove(&[11, 22], &factors_a, 16).unwrap();
        let (proof_b, commitments_b) = prove(&[33], &factors_b, 16).unwrap();

        assert!(verify_batch(
            &[proof_a.clone(), proof_b.clone()],
            &[commitments_a.clone(), commitments_b.clone()],
            16
        )
        .unwrap());

        assert!(verify(&proof_a, &commitments_a, 16).unwrap());
        assert!(verify(&proof_b, &commitments_b, 16).unwrap());
    }

    #[test]
    fn tampered_proof_fails() {
        let factors = blindings(1);
        let (mut proof, commitments) = prove(&[90], &factors, 16).unwrap();
        proof.r1 += Scalar::ONE;
        assert!(!verify(&proof, &commitments, 16).unwrap());
    }

    #[test]
    fn invalid_range_bits_error() {
        let factors = blindings(1);
        assert!(prove(&[1], &factors, 0).is_err());
        assert!(prove(&[1], &factors, 65).is_err());
    }

    #[test]
    fn serialization_round_trip() {
        let factors = blindings(2);
        let (proof, _) = prove(&[3, 4], &factors, 8).unwrap();
        assert_eq!(BulletproofPlus::from_bytes(&proof.to_bytes()).unwrap(), proof);
    }
}
