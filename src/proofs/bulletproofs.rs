// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause
//
// Inspired by the work of Sarang Noether at
// https://github.com/SarangNoether/skunkworks/tree/pybullet

//! Bulletproofs: logarithmic-size aggregate range proofs for 64-bit
//! amounts.

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
    domains::{BULLETPROOFS_DOMAIN_0, BULLETPROOFS_DOMAIN_1, BULLETPROOFS_DOMAIN_2, G, H, INV_EIGHT},
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

/// Returns the first `count` generator points for each side, extending the
/// process-wide cache on demand. Smaller requests slice the cache instead
/// of rehashing.
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
        writer.point(&BULLETPROOFS_DOMAIN_1);
        gi.append(sha3(writer.as_bytes()).to_point());
        writer.point(&BULLETPROOFS_DOMAIN_2);
        hi.append(sha3(writer.as_bytes()).to_point());
    }

    (gi.clone(), hi.clone())
}

/// A Bulletproof range proof.
#[derive(Clone, Debug, PartialEq)]
pub struct Bulletproof {
    pub a: EdwardsPoint,
    pub s: EdwardsPoint,
    pub t1: EdwardsPoint,
    pub t2: EdwardsPoint,
    pub tau_x: Scalar,
    pub mu: Scalar,
    pub l_points: Vec<EdwardsPoint>,
    pub r_points: Vec<EdwardsPoint>,
    pub g: Scalar,
    pub h: Scalar,
    pub t: Scalar,
}

impl Bulletproof {
    /// Whether the proof has a usable shape: matching non-empty rounds,
    /// decodable points and non-zero scalars.
    pub fn check_construction(&self) -> bool {
        if self.l_points.len() != self.r_points.len() || self.l_points.is_empty() {
            return false;
        }
        if self.l_points.len() >= 64 {
            return false;
        }
        if !self.a.valid() || !self.s.valid() || !self.t1.valid() || !self.t2.valid() {
            return false;
        }
        if !self.l_points.iter().all(PointProtocol::valid)
            || !self.r_points.iter().all(PointProtocol::valid)
        {
            return false;
        }

        self.tau_x.valid() && self.mu.valid() && self.g.valid() && self.h.valid() && self.t.valid()
    }

    pub fn serialize(&self, writer: &mut Writer) {
        writer.point(&self.a);
        writer.point(&self.s);
        writer.point(&self.t1);
        writer.point(&self.t2);
        writer.scalar(&self.tau_x);
        writer.scalar(&self.mu);
        writer.point_vector(&self.l_points);
        writer.point_vector(&self.r_points);
        writer.scalar(&self.g);
        writer.scalar(&self.h);
        writer.scalar(&self.t);
    }

    pub fn deserialize(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self {
            a: reader.point()?,
            s: reader.point()?,
            t1: reader.point()?,
            t2: reader.point()?,
            tau_x: reader.scalar()?,
            mu: reader.scalar()?,
            l_points: reader.point_vector()?,
            r_points: reader.point_vector()?,
            g: reader.scalar()?,
            h: reader.scalar()?,
            t: reader.scalar()?,
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

impl fmt::Display for Bulletproof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl FromStr for Bulletproof {
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

struct InnerProductRound {
    g_vec: PointVector,
    h_vec: PointVector,
    u: EdwardsPoint,
    a: ScalarVector,
    b: ScalarVector,
}

struct ZeroChallenge;

impl InnerProductRound {
    /// Runs the halving rounds to completion, returning the `(L, R)` pairs
    /// and the surviving scalars. A zero round challenge aborts; the
    /// caller restarts the proof with fresh randomness.
    fn compute(
        mut self,
        transcript: &mut Transcript,
    ) -> core::result::Result<(Vec<EdwardsPoint>, Vec<EdwardsPoint>, Scalar, Scalar), ZeroChallenge>
    {
        let mut l_points = Vec::new();
        let mut r_points = Vec::new();

        let mut n = self.g_vec.len();
        while n > 1 {
            n /= 2;

            let a1 = self.a.slice(0, n);
            let a2 = self.a.slice(n, self.a.len());
            let b1 = self.b.slice(0, n);
            let b2 = self.b.slice(n, self.b.len());
            let g1 = self.g_vec.slice(0, n);
            let g2 = self.g_vec.slice(n, self.g_vec.len());
            let h1 = self.h_vec.slice(0, n);
            let h2 = self.h_vec.slice(n, self.h_vec.len());

            let c_l = a1.inner_product(&b2);
            let c_r = a2.inner_product(&b1);

            // the scalars are witness-derived, keep the commitments
            // constant time
            let l_point = *INV_EIGHT
                * (a1.commit(&g2) + b2.commit(&h1) + c_l * self.u);
            let r_point = *INV_EIGHT
                * (a2.commit(&g1) + b1.commit(&h2) + c_r * self.u);

            transcript.update_point(&l_point);
            transcript.update_point(&r_point);

            let x = transcript.challenge();
            if !x.valid() {
                return Err(ZeroChallenge);
            }
            let x_inverse = x.invert();

            l_points.push(l_point);
            r_points.push(r_point);

            self.g_vec = g1.dbl_mult(&x_inverse, &g2, &x);
            self.h_vec = h1.dbl_mult(&x, &h2, &x_inverse);

            self.a = &(&a1 * x) + &(&a2 * x_inverse);
            self.b = &(&b1 * x_inverse) + &(&b2 * x);
        }

        Ok((l_points, r_points, self.a[0], self.b[0]))
    }
}

/// Proves that each amount lies in `[0, 2^N)`, returning the proof and the
/// Pedersen commitments it ranges over.
pub fn prove(
    amounts: &[u64],
    blinding_factors: &[Scalar],
    bits: usize,
) -> Result<(Bulletproof, Vec<EdwardsPoint>)> {
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
        transcript.update_scalar(&BULLETPROOFS_DOMAIN_0);
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

        let s_l = ScalarVector(Scalar::random_many(&mut rng, mn));
        let s_r = ScalarVector(Scalar::random_many(&mut rng, mn));
        let rho = Scalar::random_not_zero(&mut rng);

        let s_point = {
            let mut scalars = s_l.0.clone();
            scalars.extend_from_slice(&s_r.0);
            scalars.push(rho);
            let mut points = gi.0.clone();
            points.extend_from_slice(&hi.0);
            points.push(G);
            *INV_EIGHT * EdwardsPoint::multiscalar_mul(&scalars, &points)
        };

        transcript.update_point(&a_point);
        transcript.update_point(&s_point);

        let y = transcript.challenge();
        if !y.valid() {
            continue 'retry;
        }
        transcript.update_scalar(&y);

        let z = transcript.challenge();
        if !z.valid() {
            continue 'retry;
        }

        let y_inverse = y.invert();
        let y_powers = ScalarVector(y.pow_expand(mn, false, true));

        let l0 = &a_l - z;
        let l1 = &s_l;

        let mut zeros_twos = ScalarVector::default();
        let mut z_cache = z.squared();
        for _ in 0..batch_size {
            for power in powers_of_two.iter().take(bits) {
                zeros_twos.append(z_cache * power);
            }
            z_cache *= z;
        }

        let r0 = &(&(&a_r + z) * &y_powers) + &zeros_twos;
        let r1 = &y_powers * &s_r;

        let t1 = l0.inner_product(&r1) + l1.inner_product(&r0);
        let t2 = l1.inner_product(&r1);

        let tau1 = Scalar::random_not_zero(&mut rng);
        let tau2 = Scalar::random_not_zero(&mut rng);

        let t1_point = *INV_EIGHT * (t1 * *H + tau1 * G);
        let t2_point = *INV_EIGHT * (t2 * *H + tau2 * G);

        transcript.update_point(&t1_point);
        transcript.update_point(&t2_point);

        let x = transcript.challenge();
        if !x.valid() {
            continue 'retry;
        }

        let mut tau_x = tau1 * x + tau2 * x.squared();
        for (j, blinding_factor) in blinding_factors.iter().enumerate() {
            tau_x += z.pow_u64(2 + j as u64) * blinding_factor;
        }

        let mu = x * rho + alpha;

        let l = &l0 + &(l1 * x);
        let r = &r0 + &(&r1 * x);
        let t = l.inner_product(&r);

        transcript.update_scalar(&tau_x);
        transcript.update_scalar(&mu);
        transcript.update_scalar(&t);

        let x_ip = transcript.challenge();
        if !x_ip.valid() {
            continue 'retry;
        }

        // fold y-inverse powers into the Hi side
        let y_inverse_powers = y_inverse.pow_expand(mn, false, true);
        let hi_points = PointVector(
            hi.0.iter()
                .zip(y_inverse_powers.iter())
                .map(|(point, power)| power * point)
                .collect(),
        );

        let u = x_ip * *H;

        let round = InnerProductRound {
            g_vec: gi.clone(),
            h_vec: hi_points,
            u,
            a: l,
            b: r,
        };

        match round.compute(&mut transcript) {
            Ok((l_points, r_points, g, h)) => {
                return Ok((
                    Bulletproof {
                        a: a_point,
                        s: s_point,
                        t1: t1_point,
                        t2: t2_point,
                        tau_x,
                        mu,
                        l_points,
                        r_points,
                        g,
                        h,
                        t,
                    },
                    commitments.0,
                ));
            },
            Err(ZeroChallenge) => continue 'retry,
        }
    }

    Err(retries_exceeded())
}

/// Verifies a batch of proofs against their commitment sets. Every proof
/// is combined with fresh random weights into one final multiscalar
/// multiplication that must come out to the identity.
pub fn verify_batch(
    proofs: &[Bulletproof],
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

    let mut y0 = Scalar::ZERO;
    let mut y1 = Scalar::ZERO;
    let mut z1 = Scalar::ZERO;
    let mut z3 = Scalar::ZERO;

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

        let weight_y = Scalar::random_not_zero(&mut rng);
        let weight_z = Scalar::random_not_zero(&mut rng);

        let mut transcript = Transcript::new();
        transcript.update_scalar(&BULLETPROOFS_DOMAIN_0);
        transcript.update_points(proof_commitments);
        transcript.update_point(&proof.a);
        transcript.update_point(&proof.s);

        let y = transcript.challenge();
        if !y.valid() {
            return Ok(false);
        }

        let y_powers = y.pow_expand(mn, false, true);
        let y_inverse_powers = ScalarVector(y_powers.clone()).invert(false);

        transcript.update_scalar(&y);

        let z = transcript.challenge();
        if !z.valid() {
            return Ok(false);
        }

        let z_powers = z.pow_expand(batch_size + 3, false, true);

        transcript.update_point(&proof.t1);
        transcript.update_point(&proof.t2);

        let x = transcript.challenge();
        if !x.valid() {
            return Ok(false);
        }

        transcript.update_scalar(&proof.tau_x);
        transcript.update_scalar(&proof.mu);
        transcript.update_scalar(&proof.t);

        let x_ip = transcript.challenge();
        if !x_ip.valid() {
            return Ok(false);
        }

        y0 += proof.tau_x * weight_y;

        let two = Scalar::from(2u64);
        let mut k = (z - z.squared()) * ScalarVector(y_powers.clone()).sum();
        for j in 1..=batch_size {
            k -= z_powers[j + 2] * two.pow_sum(bits)?;
        }

        y1 += (proof.t - k) * weight_y;

        for (j, commitment) in proof_commitments.iter().enumerate() {
            scalars.push(z_powers[j + 2] * weight_y);
            points.push(commitment.mul8());
        }

        for (scalar, point) in [
            (x * weight_y, proof.t1),
            (x.squared() * weight_y, proof.t2),
            (weight_z, proof.a),
            (x * weight_z, proof.s),
        ] {
            let cleared = point.mul8();
            if !cleared.valid() {
                return Ok(false);
            }
            scalars.push(scalar);
            points.push(cleared);
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

        let rounds = proof.l_points.len();
        for i in 0..mn {
            let mut index = i;

            let mut g = proof.g;
            let mut h = proof.h * y_inverse_powers[i];

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

            g += z;
            h -= (z * y_powers[i] + z_powers[2 + i / bits] * two.pow_u64((i % bits) as u64))
                * y_inverse_powers[i];

            gi_scalars[i] += g * weight_z;
            hi_scalars[i] += h * weight_z;
        }

        z1 += proof.mu * weight_z;

        for (j, (l_point, r_point)) in
            proof.l_points.iter().zip(proof.r_points.iter()).enumerate()
        {
            let l_cleared = l_point.mul8();
            let r_cleared = r_point.mul8();
            if !l_cleared.valid() || !r_cleared.valid() {
                return Ok(false);
            }
            scalars.push(challenges[j].squared() * weight_z);
            points.push(l_cleared);
            scalars.push(challenges_inv[j].squared() * weight_z);
            points.push(r_cleared);
        }

        z3 += (proof.t - proof.g * proof.h) * x_ip * weight_z;
    }

    scalars.push(-y0 - z1);
    points.push(G);
    scalars.push(-y1 + z3);
    points.push(*H);

    for i in 0..max_mn {
        scalars.push(-gi_scalars[i]);
        points.push(gi[i]);
        scalars.push(-hi_scalars[i]);
        points.push(hi[i]);
    }

    Ok(EdwardsPoint::vartime_multiscalar_mul(&scalars, &points) == EdwardsPoint::identity())
}

/// Verifies a single proof.
pub fn verify(proof: &Bulletproof, commitments: &[EdwardsPoint], bits: usize) -> Result<bool> {
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
        let (proof, commitments) = prove(&[0, 1, 2u64.pow(32), u64::MAX], &factors, 64).unwrap();
        assert!(verify(&proof, &commitments, 64).unwrap());
    }

    #[test]
    fn short_range_rejects_large_amounts() {
        // 1000 needs ten bits, the proof claims eight
        let factors = blindings(1);
        let (proof, commitments) = prove(&[1000], &factors, 8).unwrap();
        assert!(!verify(&proof, &commitments, 8).unwrap());
    }

    #[test]
    fn short_range_accepts_small_amounts() {
        let factors = blindings(1);
        let (proof, commitments) = prove(&[255], &factors, 8).unwrap();
        assert!(verify(&proof, &commitments, 8).unwrap());
    }

    #[test]
    fn batched_verification() {
        let factors_a = blindings(1);
        let factors_b = blindings(2);
        let (proof_a, commitments_a) = prove(&[123], &factors_a, 32).unwrap();
        let (proof_b, commitments_b) = prove(&[456, 789], &factors_b, 32).unwrap();

        assert!(verify_batch(
            &[proof_a.clone(), proof_b.clone()],
            &[commitments_a.clone(), commitments_b.clone()],
            32
        )
        .unwrap());

        // batch verification agrees with per-proof verification
        assert!(verify(&proof_a, &commitments_a, 32).unwrap());
        assert!(verify(&proof_b, &commitments_b, 32).unwrap());
    }

    #[test]
    fn tampered_proof_fails() {
        let factors = blindings(1);
        let (mut proof, commitments) = prove(&[77], &factors, 16).unwrap();
        proof.t += Scalar::ONE;
        assert!(!verify(&proof, &commitments, 16).unwrap());
    }

    #[test]
    fn wrong_commitment_fails() {
        let factors = blindings(1);
        let (proof, _) = prove(&[77], &factors, 16).unwrap();
        let other = generate_pedersen_commitment(&factors[0], 78);
        assert!(!verify(&proof, &[other], 16).unwrap());
    }

    #[test]
    fn invalid_range_bits_error() {
        let factors = blindings(1);
        assert!(prove(&[1], &factors, 0).is_err());
        assert!(prove(&[1], &factors, 65).is_err());
        assert!(prove(&[], &[], 64).is_err());
    }

    #[test]
    fn serialization_round_trip() {
        let factors = blindings(2);
        let (proof, _) = prove(&[5, 10], &factors, 8).unwrap();
        assert_eq!(Bulletproof::from_bytes(&proof.to_bytes()).unwrap(), proof);
    }
}
