// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! Key derivation, key images and small arithmetic helpers shared across
//! the signature and proof modules.

use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar};
use rand::{CryptoRng, RngCore};

use crate::{
    domains::{DERIVATION_DOMAIN, INV_EIGHT, U},
    errors::{CryptoError, Result},
    hashing::sha3,
    protocols::{point_protocol::PointProtocol, scalar_protocol::ScalarProtocol},
    serialization::Writer,
};

fn require_nonzero(value: &Scalar, name: &str) -> Result<()> {
    if !value.valid() {
        return Err(CryptoError::InvalidArgument(format!("{name} must be a non-zero scalar")));
    }
    Ok(())
}

/// `D = mul8(a·B)`: the shared key derivation between a secret key and a
/// counterparty public key. Cofactor multiplication clears any torsion a
/// hostile public key may carry.
pub fn generate_key_derivation(public_key: &EdwardsPoint, secret_key: &Scalar) -> Result<EdwardsPoint> {
    require_nonzero(secret_key, "secret_key")?;

    Ok((secret_key * public_key).mul8())
}

/// `Ds = H(DERIVATION_DOMAIN ‖ D ‖ output_index) mod l`
pub fn derivation_to_scalar(derivation: &EdwardsPoint, output_index: u64) -> Scalar {
    let mut writer = Writer::new();
    writer.scalar(&DERIVATION_DOMAIN);
    writer.point(derivation);
    writer.u64(output_index);

    sha3(writer.as_bytes()).to_scalar()
}

/// `P = Ds·G + B`: the one-time public ephemeral for a destination key.
pub fn derive_public_key(derivation_scalar: &Scalar, public_key: &EdwardsPoint) -> Result<EdwardsPoint> {
    require_nonzero(derivation_scalar, "derivation_scalar")?;

    Ok(EdwardsPoint::mul_base(derivation_scalar) + public_key)
}

/// `p = Ds + b`: the one-time secret ephemeral for a destination key.
pub fn derive_secret_key(derivation_scalar: &Scalar, secret_key: &Scalar) -> Result<Scalar> {
    require_nonzero(derivation_scalar, "derivation_scalar")?;
    require_nonzero(secret_key, "secret_key")?;

    Ok(derivation_scalar + secret_key)
}

/// Recovers the destination public key from a public ephemeral:
/// `B = P − Ds·G`.
pub fn underive_public_key(
    derivation: &EdwardsPoint,
    output_index: u64,
    public_ephemeral: &EdwardsPoint,
) -> EdwardsPoint {
    let scalar = derivation_to_scalar(derivation, output_index);

    public_ephemeral - EdwardsPoint::mul_base(&scalar)
}

/// `I = x·Hp(P)`: the linkable key image used by the Borromean and CLSAG
/// ring signatures.
pub fn generate_key_image(public_ephemeral: &EdwardsPoint, secret_ephemeral: &Scalar) -> Result<EdwardsPoint> {
    require_nonzero(secret_ephemeral, "secret_ephemeral")?;

    Ok(secret_ephemeral * public_ephemeral.hash_to_point())
}

/// `I = (1/x)·U`: the key image variant used by Triptych.
pub fn generate_key_image_v2(secret_ephemeral: &Scalar) -> Result<EdwardsPoint> {
    require_nonzero(secret_ephemeral, "secret_ephemeral")?;

    Ok(secret_ephemeral.invert() * *U)
}

/// A fresh random keypair `(x·G, x)`.
///
/// Keys produced here are for ephemeral protocol use; wallet keys are
/// derived deterministically from entropy instead.
pub fn generate_keys<R: RngCore + CryptoRng>(rng: &mut R) -> (EdwardsPoint, Scalar) {
    let secret_key = Scalar::random_not_zero(rng);

    (EdwardsPoint::mul_base(&secret_key), secret_key)
}

/// A batch of fresh random keypairs.
pub fn generate_keys_m<R: RngCore + CryptoRng>(rng: &mut R, count: usize) -> (Vec<EdwardsPoint>, Vec<Scalar>) {
    let mut public_keys = Vec::with_capacity(count);
    let mut secret_keys = Vec::with_capacity(count);
    for _ in 0..count {
        let (public_key, secret_key) = generate_keys(rng);
        public_keys.push(public_key);
        secret_keys.push(secret_key);
    }

    (public_keys, secret_keys)
}

/// The Kronecker delta as a scalar: one when `a == b`, zero otherwise.
pub fn kronecker_delta(a: u64, b: u64) -> Scalar {
    if a == b {
        Scalar::ONE
    } else {
        Scalar::ZERO
    }
}

/// Multiplies the polynomial with coefficient vector `x` by the degree-one
/// polynomial `y[0] + y[1]·t`.
pub fn convolve(x: &[Scalar], y: &[Scalar; 2]) -> Vec<Scalar> {
    let mut result = vec![Scalar::ZERO; x.len() + 1];
    for (i, xi) in x.iter().enumerate() {
        for (j, yj) in y.iter().enumerate() {
            result[i + j] += xi * yj;
        }
    }

    result
}

/// Rounds up to the next power of two.
pub fn pow2_round(value: usize) -> usize {
    value.next_power_of_two()
}

/// The exponent `e` with `2^e == value`, if `value` is a power of two.
pub fn calculate_base2_exponent(value: usize) -> Option<usize> {
    if value.is_power_of_two() {
        Some(value.trailing_zeros() as usize)
    } else {
        None
    }
}

/// Whether a point survives the cofactor round trip unchanged and is not
/// the identity.
pub fn check_torsion(value: &EdwardsPoint) -> bool {
    *INV_EIGHT * value.mul8() == *value && value.valid()
}

#[cfg(test)]
mod tests {
    use rand::thread_rng;

    use super::*;
    use crate::domains::G;

    #[test]
    fn derivation_round_trip() {
        let mut rng = thread_rng();
        let (bob_public, bob_secret) = generate_keys(&mut rng);
        let (alice_public, alice_secret) = generate_keys(&mut rng);

        // both sides arrive at the same derivation
        let derivation_a = generate_key_derivation(&bob_public, &alice_secret).unwrap();
        let derivation_b = generate_key_derivation(&alice_public, &bob_secret).unwrap();
        assert_eq!(derivation_a, derivation_b);

        let scalar = derivation_to_scalar(&derivation_a, 3);
        let public_ephemeral = derive_public_key(&scalar, &bob_public).unwrap();
        let secret_ephemeral = derive_secret_key(&scalar, &bob_secret).unwrap();
        assert_eq!(EdwardsPoint::mul_base(&secret_ephemeral), public_ephemeral);

        assert_eq!(underive_public_key(&derivation_a, 3, &public_ephemeral), bob_public);
    }

    #[test]
    fn key_images_link_to_the_secret() {
        let mut rng = thread_rng();
        let (public_key, secret_key) = generate_keys(&mut rng);
        let image = generate_key_image(&public_key, &secret_key).unwrap();
        assert!(image.check_subgroup());
        assert_eq!(image, generate_key_image(&public_key, &secret_key).unwrap());

        let image_v2 = generate_key_image_v2(&secret_key).unwrap();
        assert_eq!(secret_key * image_v2, *U);
    }

    #[test]
    fn zero_secrets_are_rejected() {
        let mut rng = thread_rng();
        let (public_key, _) = generate_keys(&mut rng);
        assert!(generate_key_image(&public_key, &Scalar::ZERO).is_err());
        assert!(generate_key_image_v2(&Scalar::ZERO).is_err());
        assert!(generate_key_derivation(&public_key, &Scalar::ZERO).is_err());
    }

    #[test]
    fn power_of_two_helpers() {
        assert_eq!(pow2_round(5), 8);
        assert_eq!(pow2_round(8), 8);
        assert_eq!(calculate_base2_exponent(16), Some(4));
        assert_eq!(calculate_base2_exponent(12), None);
    }

    #[test]
    fn convolve_degree_one() {
        // (1 + 2t)(3 + 4t) = 3 + 10t + 8t^2
        let product = convolve(
            &[Scalar::from(1u64), Scalar::from(2u64)],
            &[Scalar::from(3u64), Scalar::from(4u64)],
        );
        assert_eq!(
            product,
            vec![Scalar::from(3u64), Scalar::from(10u64), Scalar::from(8u64)]
        );
    }

    #[test]
    fn torsion_check_accepts_subgroup_points() {
        assert!(check_torsion(&G));
        let mut rng = thread_rng();
        let (public_key, _) = generate_keys(&mut rng);
        assert!(check_torsion(&public_key));
    }
}
