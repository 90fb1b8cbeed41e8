// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! `ScalarProtocol` trait extending [`Scalar`] with the arithmetic the
//! proof systems lean on: exponentiation, power expansions, geometric sums
//! and bit decomposition.

use curve25519_dalek::scalar::Scalar;
use rand::{CryptoRng, RngCore};

use crate::errors::{CryptoError, Result};

/// Extension methods for [`Scalar`].
pub trait ScalarProtocol {
    /// Returns a non-zero random scalar.
    fn random_not_zero<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar;

    /// Returns a vector of non-zero random scalars.
    fn random_many<R: RngCore + CryptoRng>(rng: &mut R, count: usize) -> Vec<Scalar>;

    /// Loads a scalar from 32 canonical little-endian bytes, or from a
    /// truncated 8- or 4-byte little-endian integer.
    fn load(bytes: &[u8]) -> Result<Scalar>;

    /// Loads a scalar from 32 bytes, reducing mod `l` if necessary.
    fn load_reduced(bytes: &[u8]) -> Result<Scalar>;

    /// Whether a byte string is the canonical encoding of a scalar.
    fn check(bytes: &[u8]) -> bool;

    /// Parses a 64-character lowercase hex string.
    fn from_hex(hex_string: &str) -> Result<Scalar>;

    /// The scalar as lowercase hex.
    fn to_hex(&self) -> String;

    /// Whether the scalar is usable as secret material: non-zero. Canonical
    /// form is guaranteed by construction.
    fn valid(&self) -> bool;

    /// The first eight little-endian bytes as an integer.
    fn to_u64(&self) -> u64;

    /// The scalar squared.
    fn squared(&self) -> Scalar;

    /// Raises the scalar to a scalar exponent by square-and-multiply,
    /// walking only up to the exponent's highest set bit.
    fn pow(&self, exponent: &Scalar) -> Scalar;

    /// Raises the scalar to a small integer exponent.
    fn pow_u64(&self, exponent: u64) -> Scalar;

    /// The powers `self^0 .. self^(count-1)` (or `self^1 .. self^count`
    /// when `include_zero` is false), optionally highest-first.
    fn pow_expand(&self, count: usize, descending: bool, include_zero: bool) -> Vec<Scalar>;

    /// The geometric sum `1 + x + … + x^(count-1)` for a power-of-two
    /// `count`, in `O(log count)` multiplications via
    /// `S_{2k} = S_k · (1 + x^k)`.
    fn pow_sum(&self, count: usize) -> Result<Scalar>;

    /// The low `bits` bits of the scalar, little-endian, as 0/1 scalars.
    fn to_bits(&self, bits: usize) -> Result<Vec<Scalar>>;

    /// Rebuilds a scalar from little-endian 0/1 bit scalars.
    fn from_bits(bits: &[Scalar]) -> Result<Scalar>;
}

impl ScalarProtocol for Scalar {
    // `Scalar::random` returning zero is possible in principle; the
    // protocols exclude zero because it leaks signing keys, so make the
    // guarantee explicit.
    fn random_not_zero<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
        let mut value = Scalar::ZERO;
        while value == Scalar::ZERO {
            value = Scalar::random(rng);
        }

        value
    }

    fn random_many<R: RngCore + CryptoRng>(rng: &mut R, count: usize) -> Vec<Scalar> {
        (0..count).map(|_| Scalar::random_not_zero(rng)).collect()
    }

    fn load(bytes: &[u8]) -> Result<Scalar> {
        match bytes.len() {
            32 => {
                let array: [u8; 32] = bytes.try_into().expect("length checked");
                Option::<Scalar>::from(Scalar::from_canonical_bytes(array)).ok_or_else(|| {
                    CryptoError::InvalidArgument("scalar is not canonical".to_string())
                })
            },
            8 | 4 => {
                let mut array = [0u8; 32];
                array[..bytes.len()].copy_from_slice(bytes);
                Ok(Scalar::from_bytes_mod_order(array))
            },
            _ => Err(CryptoError::InvalidArgument(
                "scalar must be 32, 8 or 4 bytes".to_string(),
            )),
        }
    }

    fn load_reduced(bytes: &[u8]) -> Result<Scalar> {
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidArgument("scalar must be 32 bytes".to_string()))?;
        Ok(Scalar::from_bytes_mod_order(array))
    }

    fn check(bytes: &[u8]) -> bool {
        match <[u8; 32]>::try_from(bytes) {
            Ok(array) => Option::<Scalar>::from(Scalar::from_canonical_bytes(array)).is_some(),
            Err(_) => false,
        }
    }

    fn from_hex(hex_string: &str) -> Result<Scalar> {
        let bytes = hex::decode(hex_string)
            .map_err(|_| CryptoError::InvalidArgument("scalar hex is malformed".to_string()))?;
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidArgument(
                "scalar hex must encode 32 bytes".to_string(),
            ));
        }
        Scalar::load(&bytes)
    }

    fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    fn valid(&self) -> bool {
        *self != Scalar::ZERO
    }

    fn to_u64(&self) -> u64 {
        u64::from_le_bytes(self.as_bytes()[..8].try_into().expect("8 bytes"))
    }

    fn squared(&self) -> Scalar {
        self * self
    }

    fn pow(&self, exponent: &Scalar) -> Scalar {
        let bytes = exponent.as_bytes();

        // locate the highest set bit to bound the ladder
        let mut highest = 0usize;
        for i in 0..256 {
            if (bytes[i / 8] >> (i % 8)) & 1 == 1 {
                highest = i;
            }
        }

        let mut result = Scalar::ONE;
        let mut base = *self;
        for i in 0..=highest {
            if (bytes[i / 8] >> (i % 8)) & 1 == 1 {
                result *= base;
            }
            base *= base;
        }

        result
    }

    fn pow_u64(&self, exponent: u64) -> Scalar {
        self.pow(&Scalar::from(exponent))
    }

    fn pow_expand(&self, count: usize, descending: bool, include_zero: bool) -> Vec<Scalar> {
        let mut result = Vec::with_capacity(count);
        let mut running = if include_zero { Scalar::ONE } else { *self };
        for _ in 0..count {
            result.push(running);
            running *= self;
        }
        if descending {
            result.reverse();
        }

        result
    }

    fn pow_sum(&self, count: usize) -> Result<Scalar> {
        if count != 0 && !count.is_power_of_two() {
            return Err(CryptoError::InvalidArgument(
                "pow_sum requires a power-of-two count".to_string(),
            ));
        }
        if count == 0 {
            return Ok(Scalar::ZERO);
        }
        if count == 1 {
            return Ok(Scalar::ONE);
        }

        let mut base = *self;
        let mut result = Scalar::ONE + base;
        let mut remaining = count;
        while remaining > 2 {
            base *= base;
            result += result * base;
            remaining /= 2;
        }

        Ok(result)
    }

    fn to_bits(&self, bits: usize) -> Result<Vec<Scalar>> {
        if bits > 256 {
            return Err(CryptoError::InvalidArgument(
                "requested bit length exceeds the scalar width".to_string(),
            ));
        }
        let bytes = self.as_bytes();
        let mut result = Vec::with_capacity(bits);
        for i in 0..bits {
            result.push(Scalar::from(u64::from((bytes[i / 8] >> (i % 8)) & 1)));
        }

        Ok(result)
    }

    fn from_bits(bits: &[Scalar]) -> Result<Scalar> {
        if bits.len() > 256 {
            return Err(CryptoError::InvalidArgument(
                "bit vector exceeds the scalar width".to_string(),
            ));
        }
        let mut bytes = [0u8; 32];
        for (i, bit) in bits.iter().enumerate() {
            if *bit == Scalar::ONE {
                bytes[i / 8] |= 1 << (i % 8);
            } else if *bit != Scalar::ZERO {
                return Err(CryptoError::InvalidArgument(
                    "bit scalar values must be zero or one".to_string(),
                ));
            }
        }

        Scalar::load(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use rand::thread_rng;

    use super::*;

    #[test]
    fn add_sub_invariant() {
        let mut rng = thread_rng();
        let a = Scalar::random_not_zero(&mut rng);
        let b = Scalar::random_not_zero(&mut rng);
        assert_eq!(a + (b - a), b);
    }

    #[test]
    fn inversion() {
        let mut rng = thread_rng();
        let a = Scalar::random_not_zero(&mut rng);
        assert_eq!(a * a.invert(), Scalar::ONE);
    }

    #[test]
    fn pow_matches_repeated_multiplication() {
        let mut rng = thread_rng();
        let a = Scalar::random_not_zero(&mut rng);
        let mut expected = Scalar::ONE;
        for exponent in 0..24u64 {
            assert_eq!(a.pow_u64(exponent), expected);
            expected *= a;
        }
    }

    #[test]
    fn pow_with_scalar_exponent() {
        let a = Scalar::from(3u64);
        assert_eq!(a.pow(&Scalar::from(5u64)), Scalar::from(243u64));
    }

    #[test]
    fn pow_sum_matches_naive_sum() {
        let mut rng = thread_rng();
        let a = Scalar::random_not_zero(&mut rng);
        for k in [1usize, 2, 4, 8, 16, 64] {
            let naive = a
                .pow_expand(k, false, true)
                .iter()
                .sum::<Scalar>();
            assert_eq!(a.pow_sum(k).unwrap(), naive);
        }
        assert!(a.pow_sum(12).is_err());
    }

    #[test]
    fn pow_expand_orderings() {
        let a = Scalar::from(2u64);
        assert_eq!(
            a.pow_expand(4, false, true),
            vec![
                Scalar::ONE,
                Scalar::from(2u64),
                Scalar::from(4u64),
                Scalar::from(8u64)
            ]
        );
        assert_eq!(
            a.pow_expand(3, true, false),
            vec![Scalar::from(8u64), Scalar::from(4u64), Scalar::from(2u64)]
        );
    }

    #[test]
    fn bit_round_trip() {
        let value = Scalar::from(0b1011_0101u64);
        let bits = value.to_bits(64).unwrap();
        assert_eq!(Scalar::from_bits(&bits).unwrap(), value);
        assert_eq!(bits[0], Scalar::ONE);
        assert_eq!(bits[1], Scalar::ZERO);
    }

    #[test]
    fn load_rejects_bad_lengths() {
        assert!(Scalar::load(&[0u8; 16]).is_err());
        assert!(Scalar::load(&[0u8; 8]).is_ok());
        assert!(Scalar::load(&[0u8; 4]).is_ok());
    }

    #[test]
    fn hex_round_trip() {
        let mut rng = thread_rng();
        let a = Scalar::random_not_zero(&mut rng);
        assert_eq!(Scalar::from_hex(&a.to_hex()).unwrap(), a);
        assert!(Scalar::from_hex("abcd").is_err());
    }

    #[test]
    fn u64_bridging() {
        let a = Scalar::from(0xdead_beef_u64);
        assert_eq!(a.to_u64(), 0xdead_beef);
    }
}
