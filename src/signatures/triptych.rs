// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause
//
// Adapted from Python code by Sarang Noether found at
// https://github.com/SarangNoether/skunkworks/tree/triptych

//! Triptych: a logarithmic-size linkable ring signature.
//!
//! The ring is indexed in base `n = 2` with `m = log2(ring size)` digits.
//! The signer commits to the bit decomposition of the real index through
//! four tensor commitments `(A, B, C, D)` and two vectors of polynomial
//! coefficient points `(X_j, Y_j)`; the verifier walks the ring in Gray
//! code order so each step costs one scalar division and one
//! multiplication instead of re-evaluating the full digit product.
//!
//! The key image is `I = (1/x)·U` and the commitment image is
//! `D = z·I` for the blinding delta `z`; both differ deliberately from
//! their CLSAG counterparts and the verifier equations below assume this
//! exact pairing.

use core::fmt;
use core::str::FromStr;
use std::collections::HashMap;
use std::sync::Mutex;

use curve25519_dalek::{
    edwards::EdwardsPoint,
    scalar::Scalar,
    traits::{Identity, MultiscalarMul, VartimeMultiscalarMul},
};
use lazy_static::lazy_static;

use crate::{
    common::{calculate_base2_exponent, generate_key_image_v2, kronecker_delta},
    domains::{G, H, TRIPTYCH_DOMAIN_0, TRIPTYCH_DOMAIN_1, U},
    errors::{retries_exceeded, CryptoError, Result, MAX_PROVER_RETRIES},
    hashing::{sha3, Hash},
    protocols::{point_protocol::PointProtocol, scalar_protocol::ScalarProtocol},
    serialization::{Reader, Writer},
    signatures::borromean::contains_duplicates,
    transcript::Transcript,
};

/// Ring digits per position; the construction is fixed to binary.
const N: usize = 2;

lazy_static! {
    static ref TENSOR_POINTS: Mutex<HashMap<(u64, u64), EdwardsPoint>> = Mutex::new(HashMap::new());
}

/// The per-cell base `Hp(TRIPTYCH_DOMAIN_1 ‖ i ‖ j ‖ 0)` of the commitment
/// tensor, cached process-wide: the same handful of cells is hashed by
/// every proof otherwise.
fn commitment_tensor_point(i: usize, j: usize) -> EdwardsPoint {
    let key = (i as u64, j as u64);

    let mut cache = TENSOR_POINTS.lock().expect("tensor cache poisoned");
    *cache.entry(key).or_insert_with(|| {
        let mut writer = Writer::new();
        writer.point(&TRIPTYCH_DOMAIN_1);
        writer.u64(key.0);
        writer.u64(key.1);
        writer.u64(0);
        sha3(writer.as_bytes()).to_point()
    })
}

/// `Σ_{i,j} v[i][j]·T(i,j) + r·H` in constant time; the matrix holds
/// secret masks on the proving path.
fn commitment_tensor(values: &[Vec<Scalar>], blinding: &Scalar) -> EdwardsPoint {
    let mut scalars = Vec::with_capacity(values.len() * N + 1);
    let mut points = Vec::with_capacity(values.len() * N + 1);
    for (i, row) in values.iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            scalars.push(*value);
            points.push(commitment_tensor_point(i, j));
        }
    }
    scalars.push(*blinding);
    points.push(*H);

    EdwardsPoint::multiscalar_mul(&scalars, &points)
}

/// Gray-code walk over the `n^k` ring indices.
///
/// `changes[s]` is `(digit, old, new)`: stepping from index `s-1` to `s`
/// rewrites a single digit. `index_digits` is the Gray decomposition of
/// the requested index.
struct GrayCodes {
    changes: Vec<(usize, usize, usize)>,
    index_digits: Vec<usize>,
}

impl GrayCodes {
    fn new(n: usize, k: usize, index: usize) -> Self {
        let count = n.pow(k as u32);

        let mut g = vec![0i64; k + 1];
        let mut u = vec![1i64; k + 1];

        let mut changes = Vec::with_capacity(count);
        changes.push((0, 0, 0));

        let mut index_digits = vec![0usize; k];

        for idx in 0..count - 1 {
            if idx == index {
                index_digits = g[..k].iter().map(|&d| d as usize).collect();
            }

            let mut i = 0usize;
            let mut next = g[0] + u[0];
            while next >= n as i64 || next < 0 {
                u[i] = -u[i];
                i += 1;
                next = g[i] + u[i];
            }

            changes.push((i, g[i] as usize, next as usize));
            g[i] = next;
        }

        if index == count - 1 {
            index_digits = g[..k].iter().map(|&d| d as usize).collect();
        }

        Self { changes, index_digits }
    }
}

/// A Triptych ring signature.
#[derive(Clone, Debug, PartialEq)]
pub struct RingSignature {
    /// `D = z·I`
    pub commitment_image: EdwardsPoint,
    pub pseudo_commitment: EdwardsPoint,
    pub a: EdwardsPoint,
    pub b: EdwardsPoint,
    pub c: EdwardsPoint,
    pub d: EdwardsPoint,
    pub x_points: Vec<EdwardsPoint>,
    pub y_points: Vec<EdwardsPoint>,
    /// Masked digits, `m` rows of `n − 1` scalars.
    pub f: Vec<Vec<Scalar>>,
    pub z_a: Scalar,
    pub z_c: Scalar,
    pub z: Scalar,
}

/// A prepared signature plus the power of the challenge that
/// [`complete_ring_signature`] multiplies the signing scalar by.
#[derive(Clone, Debug)]
pub struct PreparedRingSignature {
    pub signature: RingSignature,
    pub x_pow: Scalar,
}

impl RingSignature {
    /// Whether the signature has the right shape for `m` digit rows.
    pub fn check_construction(&self, m: usize) -> bool {
        if !self.a.valid() || !self.b.valid() || !self.c.valid() || !self.d.valid() {
            return false;
        }
        if self.x_points.len() != m || self.y_points.len() != m || self.f.len() != m {
            return false;
        }
        if !self.x_points.iter().all(PointProtocol::valid)
            || !self.y_points.iter().all(PointProtocol::valid)
        {
            return false;
        }
        if !self.f.iter().all(|row| {
            row.len() == N - 1 && row.iter().all(ScalarProtocol::valid)
        }) {
            return false;
        }
        if !self.z_a.valid() || !self.z_c.valid() || !self.z.valid() {
            return false;
        }

        self.commitment_image.check_subgroup()
    }

    pub fn serialize(&self, writer: &mut Writer) {
        writer.point(&self.a);
        writer.point(&self.b);
        writer.point(&self.c);
        writer.point(&self.d);
        writer.point_vector(&self.x_points);
        writer.point_vector(&self.y_points);
        writer.scalar_matrix(&self.f);
        writer.scalar(&self.z_a);
        writer.scalar(&self.z_c);
        writer.scalar(&self.z);
        writer.point(&self.commitment_image);
        writer.point(&self.pseudo_commitment);
    }

    pub fn deserialize(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self {
            a: reader.point()?,
            b: reader.point()?,
            c: reader.point()?,
            d: reader.point()?,
            x_points: reader.point_vector()?,
            y_points: reader.point_vector()?,
            f: reader.scalar_matrix()?,
            z_a: reader.scalar()?,
            z_c: reader.scalar()?,
            z: reader.scalar()?,
            commitment_image: reader.point()?,
            pseudo_commitment: reader.point()?,
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

fn statement_transcript(
    message_digest: &Hash,
    public_keys: &[EdwardsPoint],
    commitments: &[EdwardsPoint],
    pseudo_commitment: &EdwardsPoint,
    key_image: &EdwardsPoint,
    commitment_image: &EdwardsPoint,
    tensors: [&EdwardsPoint; 4],
) -> Transcript {
    let mut tr = Transcript::new();
    tr.update_scalar(&TRIPTYCH_DOMAIN_0);
    tr.update_hash(message_digest);
    tr.update_points(public_keys);
    tr.update_points(commitments);
    tr.update_point(pseudo_commitment);
    tr.update_point(key_image);
    tr.update_point(commitment_image);
    for tensor in tensors {
        tr.update_point(tensor);
    }

    tr
}

/// Verifies a Triptych signature over a ring of keys and commitments.
pub fn check_ring_signature(
    message_digest: &Hash,
    key_image: &EdwardsPoint,
    public_keys: &[EdwardsPoint],
    signature: &RingSignature,
    commitments: &[EdwardsPoint],
) -> bool {
    if contains_duplicates(public_keys) {
        return false;
    }

    let m = match calculate_base2_exponent(public_keys.len()) {
        Some(m) if m >= 2 => m,
        _ => return false,
    };

    if public_keys.len() != commitments.len() {
        return false;
    }

    if !key_image.check_subgroup() {
        return false;
    }

    if !signature.check_construction(m) {
        return false;
    }

    let mut tr = statement_transcript(
        message_digest,
        public_keys,
        commitments,
        &signature.pseudo_commitment,
        key_image,
        &signature.commitment_image,
        [&signature.a, &signature.b, &signature.c, &signature.d],
    );

    let mu = tr.challenge();
    if !mu.valid() {
        return false;
    }

    tr.update_points(&signature.x_points);
    tr.update_points(&signature.y_points);

    let x = tr.challenge();
    if !x.valid() {
        return false;
    }

    // rebuild the full digit matrix: column zero completes each row to x
    let mut f = vec![vec![Scalar::ZERO; N]; m];
    for j in 0..m {
        f[j][0] = x;
        for i in 1..N {
            let masked_digit = signature.f[j][i - 1];
            f[j][i] = masked_digit;
            f[j][0] -= masked_digit;
        }
    }

    // A/B check
    if commitment_tensor(&f, &signature.z_a) != x * signature.b + signature.a {
        return false;
    }

    // C/D check
    let fx: Vec<Vec<Scalar>> = f
        .iter()
        .map(|row| row.iter().map(|value| value * (x - value)).collect())
        .collect();
    if commitment_tensor(&fx, &signature.z_c) != x * signature.c + signature.d {
        return false;
    }

    // walk the ring in Gray code order, collecting the per-index weights
    let gray = GrayCodes::new(N, m, 0);
    let ring_size = public_keys.len();

    let mut f_inverses = f.clone();
    for row in &mut f_inverses {
        // digits can be zero under an adversarial f, fall back per element
        for value in row.iter_mut() {
            *value = value.invert();
        }
    }

    let mut t = Scalar::ONE;
    for row in f.iter() {
        t *= row[0];
    }

    let mut weights = Vec::with_capacity(ring_size);
    for (k, (digit, old, new)) in gray.changes.iter().enumerate().take(ring_size) {
        if k > 0 {
            t *= f_inverses[*digit][*old] * f[*digit][*new];
        }
        weights.push(t);
    }

    let weight_sum: Scalar = weights.iter().sum();

    let x_powers = x.pow_expand(m, false, true);

    // RX = Σ w_k·(P_k + μ·8(C_k − C')) − Σ x^j·X_j − z·G
    let mut scalars = Vec::with_capacity(2 * ring_size + m + 2);
    let mut points = Vec::with_capacity(2 * ring_size + m + 2);
    for (k, weight) in weights.iter().enumerate() {
        scalars.push(*weight);
        points.push(public_keys[k]);
        scalars.push(weight * mu);
        points.push((commitments[k] - signature.pseudo_commitment).mul8());
    }
    for j in 0..m {
        scalars.push(-x_powers[j]);
        points.push(signature.x_points[j]);
    }
    scalars.push(-signature.z);
    points.push(G);

    if EdwardsPoint::vartime_multiscalar_mul(&scalars, &points) != EdwardsPoint::identity() {
        return false;
    }

    // RY = (Σ w_k)·U + μ(Σ w_k)·D − Σ x^j·Y_j − z·I
    let mut scalars = Vec::with_capacity(m + 4);
    let mut points = Vec::with_capacity(m + 4);
    scalars.push(weight_sum);
    points.push(*U);
    scalars.push(weight_sum * mu);
    points.push(signature.commitment_image);
    for j in 0..m {
        scalars.push(-x_powers[j]);
        points.push(signature.y_points[j]);
    }
    scalars.push(-signature.z);
    points.push(*key_image);

    EdwardsPoint::vartime_multiscalar_mul(&scalars, &points) == EdwardsPoint::identity()
}

/// Builds a Triptych signature missing only the signing scalar term of
/// `z`; [`complete_ring_signature`] adds `x_secret·x^m`.
#[allow(clippy::too_many_arguments)]
pub fn prepare_ring_signature(
    message_digest: &Hash,
    key_image: &EdwardsPoint,
    public_keys: &[EdwardsPoint],
    real_output_index: usize,
    input_blinding_factor: &Scalar,
    input_commitments: &[EdwardsPoint],
    pseudo_blinding_factor: &Scalar,
    pseudo_commitment: &EdwardsPoint,
) -> Result<PreparedRingSignature> {
    if contains_duplicates(public_keys) {
        return Err(CryptoError::InvalidArgument(
            "ring contains duplicate public keys".to_string(),
        ));
    }

    let m = calculate_base2_exponent(public_keys.len())
        .filter(|m| *m >= 2)
        .ok_or_else(|| {
            CryptoError::InvalidArgument(
                "ring size must be a power of two of at least four".to_string(),
            )
        })?;

    if public_keys.len() != input_commitments.len() {
        return Err(CryptoError::InvalidArgument(
            "commitment ring length must match the key ring".to_string(),
        ));
    }

    if real_output_index >= public_keys.len() {
        return Err(CryptoError::InvalidArgument(
            "real output index exceeds the ring".to_string(),
        ));
    }

    if !key_image.check_subgroup() {
        return Err(CryptoError::InvalidArgument(
            "key image is not in the prime-order subgroup".to_string(),
        ));
    }

    if !input_blinding_factor.valid() || !pseudo_blinding_factor.valid() {
        return Err(CryptoError::InvalidArgument(
            "blinding factors must be non-zero scalars".to_string(),
        ));
    }

    let blinding_delta = input_blinding_factor - pseudo_blinding_factor;

    let commitment = (input_commitments[real_output_index] - pseudo_commitment).mul8();
    if commitment != EdwardsPoint::mul_base(&blinding_delta) {
        return Err(CryptoError::InvalidArgument(
            "pseudo commitment does not open against the real input commitment".to_string(),
        ));
    }

    let ring_size = public_keys.len();

    // D = z·I; the Triptych image pairs with I = (1/x)·U
    let commitment_image = blinding_delta * key_image;

    let gray = GrayCodes::new(N, m, real_output_index);
    let decomp_l = &gray.index_digits;

    let offsets: Vec<EdwardsPoint> = input_commitments
        .iter()
        .map(|c| (c - pseudo_commitment).mul8())
        .collect();

    let mut rng = rand::thread_rng();

    'retry: for _ in 0..MAX_PROVER_RETRIES {
        let r_a = Scalar::random_not_zero(&mut rng);
        let r_b = Scalar::random_not_zero(&mut rng);
        let r_c = Scalar::random_not_zero(&mut rng);
        let r_d = Scalar::random_not_zero(&mut rng);

        // row sums of the mask matrix are forced to zero
        let mut a = vec![vec![Scalar::ZERO; N]; m];
        for row in a.iter_mut() {
            for value in row.iter_mut().skip(1) {
                *value = Scalar::random_not_zero(&mut rng);
            }
            row[0] = -row.iter().skip(1).sum::<Scalar>();
        }

        let tensor_a = commitment_tensor(&a, &r_a);

        let mut sigma = vec![vec![Scalar::ZERO; N]; m];
        for (j, row) in sigma.iter_mut().enumerate() {
            for (i, value) in row.iter_mut().enumerate() {
                *value = kronecker_delta(decomp_l[j] as u64, i as u64);
            }
        }

        let tensor_b = commitment_tensor(&sigma, &r_b);

        let a_sigma: Vec<Vec<Scalar>> = a
            .iter()
            .zip(sigma.iter())
            .map(|(a_row, s_row)| {
                a_row
                    .iter()
                    .zip(s_row.iter())
                    .map(|(a_val, s_val)| a_val * (Scalar::ONE - Scalar::from(2u64) * s_val))
                    .collect()
            })
            .collect();

        let tensor_c = commitment_tensor(&a_sigma, &r_c);

        let a_squared: Vec<Vec<Scalar>> = a
            .iter()
            .map(|row| row.iter().map(|value| -value.squared()).collect())
            .collect();

        let tensor_d = commitment_tensor(&a_squared, &r_d);

        // per-index coefficient polynomials, walked in Gray code order
        let mut p = vec![Vec::new(); ring_size];
        let mut decomp_k = vec![0usize; m];
        for (k, (digit, _, new)) in gray.changes.iter().enumerate().take(ring_size) {
            decomp_k[*digit] = *new;

            let mut coefficients = vec![
                a[0][decomp_k[0]],
                kronecker_delta(decomp_l[0] as u64, decomp_k[0] as u64),
            ];
            for j in 1..m {
                coefficients = crate::common::convolve(
                    &coefficients,
                    &[
                        a[j][decomp_k[j]],
                        kronecker_delta(decomp_l[j] as u64, decomp_k[j] as u64),
                    ],
                );
            }

            p[k] = coefficients;
        }

        let mut tr = statement_transcript(
            message_digest,
            public_keys,
            input_commitments,
            pseudo_commitment,
            key_image,
            &commitment_image,
            [&tensor_a, &tensor_b, &tensor_c, &tensor_d],
        );

        let mu = tr.challenge();
        if !mu.valid() {
            continue 'retry;
        }

        let rho = Scalar::random_many(&mut rng, m);

        // X_j and Y_j aggregate the j-th coefficients over the whole ring;
        // the coefficients derive from the signer index, so stay constant
        // time here
        let mut x_points = Vec::with_capacity(m);
        let mut y_points = Vec::with_capacity(m);
        for (j, rho_j) in rho.iter().enumerate() {
            let mut scalars = Vec::with_capacity(2 * ring_size + 1);
            let mut points = Vec::with_capacity(2 * ring_size + 1);
            let mut y_scalar = Scalar::ZERO;
            for i in 0..ring_size {
                let coefficient = p[i][j];
                scalars.push(coefficient);
                points.push(public_keys[i]);
                scalars.push(coefficient * mu);
                points.push(offsets[i]);
                y_scalar += coefficient;
            }
            scalars.push(*rho_j);
            points.push(G);
            x_points.push(EdwardsPoint::multiscalar_mul(&scalars, &points));

            y_points.push(EdwardsPoint::multiscalar_mul(
                [&y_scalar, rho_j],
                [&*U, key_image],
            ));
        }

        tr.update_points(&x_points);
        tr.update_points(&y_points);

        let x = tr.challenge();
        if !x.valid() {
            continue 'retry;
        }

        let f: Vec<Vec<Scalar>> = (0..m)
            .map(|j| (1..N).map(|i| sigma[j][i] * x + a[j][i]).collect())
            .collect();

        let z_a = r_b * x + r_a;
        let z_c = r_c * x + r_d;

        let x_pow = x.pow_u64(m as u64);

        let mut z = (mu * blinding_delta) * x_pow;
        for (j, rho_j) in rho.iter().enumerate() {
            z -= rho_j * x.pow_u64(j as u64);
        }

        return Ok(PreparedRingSignature {
            signature: RingSignature {
                commitment_image,
                pseudo_commitment: *pseudo_commitment,
                a: tensor_a,
                b: tensor_b,
                c: tensor_c,
                d: tensor_d,
                x_points,
                y_points,
                f,
                z_a,
                z_c,
                z,
            },
            x_pow,
        });
    }

    Err(retries_exceeded())
}

/// Adds the signing term to `z`: `z += x_secret·x^m`.
pub fn complete_ring_signature(
    signing_scalar: &Scalar,
    prepared: &PreparedRingSignature,
) -> Result<RingSignature> {
    if !signing_scalar.valid() || !prepared.x_pow.valid() {
        return Err(CryptoError::InvalidArgument(
            "scalars must be non-zero".to_string(),
        ));
    }

    let mut signature = prepared.signature.clone();

    signature.z += signing_scalar * prepared.x_pow;

    Ok(signature)
}

/// Signs in one step for a signer who holds every secret.
pub fn generate_ring_signature(
    message_digest: &Hash,
    secret_ephemeral: &Scalar,
    public_keys: &[EdwardsPoint],
    input_blinding_factor: &Scalar,
    input_commitments: &[EdwardsPoint],
    pseudo_blinding_factor: &Scalar,
    pseudo_commitment: &EdwardsPoint,
) -> Result<RingSignature> {
    if !secret_ephemeral.valid() || !input_blinding_factor.valid() || !pseudo_blinding_factor.valid() {
        return Err(CryptoError::InvalidArgument(
            "secrets must be non-zero scalars".to_string(),
        ));
    }

    if public_keys.len() != input_commitments.len() {
        return Err(CryptoError::InvalidArgument(
            "commitment ring length must match the key ring".to_string(),
        ));
    }

    let public_ephemeral = EdwardsPoint::mul_base(secret_ephemeral);
    let delta_point = EdwardsPoint::mul_base(&(input_blinding_factor - pseudo_blinding_factor));

    let real_output_index = public_keys
        .iter()
        .zip(input_commitments.iter())
        .position(|(key, commitment)| {
            *key == public_ephemeral && (commitment - pseudo_commitment).mul8() == delta_point
        })
        .ok_or_else(|| {
            CryptoError::InvalidArgument("signer's output is not in the ring".to_string())
        })?;

    let key_image = generate_key_image_v2(secret_ephemeral)?;

    let prepared = prepare_ring_signature(
        message_digest,
        &key_image,
        public_keys,
        real_output_index,
        input_blinding_factor,
        input_commitments,
        pseudo_blinding_factor,
        pseudo_commitment,
    )?;

    complete_ring_signature(secret_ephemeral, &prepared)
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

    struct Fixture {
        ring: Vec<EdwardsPoint>,
        commitments: Vec<EdwardsPoint>,
        secret: Scalar,
        key_image: EdwardsPoint,
        input_blinding: Scalar,
        pseudo_blinding: Scalar,
        pseudo_commitment: EdwardsPoint,
    }

    fn fixture(size: usize, index: usize) -> Fixture {
        let mut rng = thread_rng();
        let amount = 250u64;
        let (ring, secrets) = generate_keys_m(&mut rng, size);
        let blinding_factors = Scalar::random_many(&mut rng, size);
        let commitments: Vec<EdwardsPoint> = blinding_factors
            .iter()
            .map(|factor| generate_pedersen_commitment(factor, amount))
            .collect();
        let (pseudo_blinding_factors, pseudo_commitments) =
            generate_pseudo_commitments(&[amount], &[blinding_factors[index]]).unwrap();
        let key_image = generate_key_image_v2(&secrets[index]).unwrap();
        Fixture {
            ring,
            commitments,
            secret: secrets[index],
            key_image,
            input_blinding: blinding_factors[index],
            pseudo_blinding: pseudo_blinding_factors[0],
            pseudo_commitment: pseudo_commitments[0],
        }
    }

    fn sign(fx: &Fixture, digest: &Hash) -> RingSignature {
        generate_ring_signature(
            digest,
            &fx.secret,
            &fx.ring,
            &fx.input_blinding,
            &fx.commitments,
            &fx.pseudo_blinding,
            &fx.pseudo_commitment,
        )
        .unwrap()
    }

    #[test]
    fn round_trip() {
        let fx = fixture(8, 5);
        let digest = sha3(b"triptych message");
        let signature = sign(&fx, &digest);
        assert!(check_ring_signature(
            &digest,
            &fx.key_image,
            &fx.ring,
            &signature,
            &fx.commitments
        ));
    }

    #[test]
    fn first_and_last_indices_sign() {
        for index in [0usize, 3] {
            let fx = fixture(4, index);
            let digest = sha3(b"edge indices");
            let signature = sign(&fx, &digest);
            assert!(check_ring_signature(
                &digest,
                &fx.key_image,
                &fx.ring,
                &signature,
                &fx.commitments
            ));
        }
    }

    #[test]
    fn non_power_of_two_ring_fails() {
        let fx = fixture(8, 1);
        let digest = sha3(b"bad ring");
        let signature = sign(&fx, &digest);
        assert!(!check_ring_signature(
            &digest,
            &fx.key_image,
            &fx.ring[..7],
            &signature,
            &fx.commitments[..7]
        ));
    }

    #[test]
    fn wrong_key_image_fails() {
        let fx = fixture(8, 2);
        let digest = sha3(b"triptych message");
        let signature = sign(&fx, &digest);

        let mut rng = thread_rng();
        let other = EdwardsPoint::random(&mut rng);
        assert!(!check_ring_signature(
            &digest,
            &other,
            &fx.ring,
            &signature,
            &fx.commitments
        ));
    }

    #[test]
    fn wrong_digest_fails() {
        let fx = fixture(4, 2);
        let signature = sign(&fx, &sha3(b"signed digest"));
        assert!(!check_ring_signature(
            &sha3(b"other digest"),
            &fx.key_image,
            &fx.ring,
            &signature,
            &fx.commitments
        ));
    }

    #[test]
    fn key_image_links_spends() {
        let fx = fixture(4, 1);
        assert_eq!(fx.key_image, generate_key_image_v2(&fx.secret).unwrap());
        // the image inverts back onto U
        assert_eq!(fx.secret * fx.key_image, *U);
    }

    #[test]
    fn serialization_round_trip() {
        let fx = fixture(8, 4);
        let digest = sha3(b"wire");
        let signature = sign(&fx, &digest);
        let decoded = RingSignature::from_bytes(&signature.to_bytes()).unwrap();
        assert_eq!(decoded, signature);
        assert!(check_ring_signature(
            &digest,
            &fx.key_image,
            &fx.ring,
            &decoded,
            &fx.commitments
        ));
    }

    #[test]
    fn gray_codes_cover_every_index() {
        let gray = GrayCodes::new(2, 3, 5);
        assert_eq!(gray.changes.len(), 8);
        assert_eq!(gray.index_digits.len(), 3);
        // digits reconstruct index 5 under the cumulative walk
        let gray_alt = GrayCodes::new(2, 3, 7);
        assert_eq!(gray_alt.index_digits.len(), 3);
    }
}
