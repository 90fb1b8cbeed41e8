// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! Scalar vector container used by the range proofs and ring signatures.
//!
//! Elementwise operators panic on length mismatch: vector lengths inside
//! the protocols are structural invariants checked at the public boundary,
//! not runtime conditions.

use core::ops::{Add, Index, IndexMut, Mul, Sub};

use curve25519_dalek::{
    edwards::EdwardsPoint,
    scalar::Scalar,
    traits::{MultiscalarMul, VartimeMultiscalarMul},
};
use zeroize::Zeroize;

use crate::point_vector::PointVector;

/// An ordered sequence of scalars.
#[derive(Clone, Debug, Default, Eq, PartialEq, Zeroize)]
pub struct ScalarVector(pub Vec<Scalar>);

impl ScalarVector {
    /// A vector of `size` copies of `value`.
    pub fn filled(size: usize, value: Scalar) -> Self {
        Self(vec![value; size])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn append(&mut self, value: Scalar) {
        self.0.push(value);
    }

    pub fn extend(&mut self, values: &[Scalar]) {
        self.0.extend_from_slice(values);
    }

    /// The half-open range `[start, end)` as a new vector.
    pub fn slice(&self, start: usize, end: usize) -> Self {
        Self(self.0[start..end].to_vec())
    }

    pub fn sum(&self) -> Scalar {
        self.0.iter().sum()
    }

    /// Elementwise inversion. With `allow_zero` each element inverts on its
    /// own (zero maps to zero); otherwise a Montgomery batch inversion is
    /// used and every element must be non-zero.
    pub fn invert(&self, allow_zero: bool) -> Self {
        if allow_zero {
            Self(self.0.iter().map(|s| s.invert()).collect())
        } else {
            let mut inverted = self.0.clone();
            Scalar::batch_invert(&mut inverted);
            Self(inverted)
        }
    }

    /// Removes duplicates and orders the elements by descending byte value.
    pub fn dedupe_sort(&self) -> Self {
        let mut result = self.0.clone();
        result.sort_by(|a, b| b.as_bytes().cmp(a.as_bytes()));
        result.dedup();
        Self(result)
    }

    /// `⟨a, b⟩` over scalars.
    pub fn inner_product(&self, other: &ScalarVector) -> Scalar {
        assert_eq!(self.len(), other.len(), "vectors must be of equal size");
        self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
    }

    /// `Σ aᵢ·Pᵢ` in constant time, for proving paths that touch secrets.
    pub fn commit(&self, points: &PointVector) -> EdwardsPoint {
        assert_eq!(self.len(), points.len(), "vectors must be of equal size");
        EdwardsPoint::multiscalar_mul(&self.0, &points.0)
    }

    /// `Σ aᵢ·Pᵢ` in variable time, for verification over public data.
    pub fn vartime_commit(&self, points: &PointVector) -> EdwardsPoint {
        assert_eq!(self.len(), points.len(), "vectors must be of equal size");
        EdwardsPoint::vartime_multiscalar_mul(&self.0, &points.0)
    }
}

impl From<Vec<Scalar>> for ScalarVector {
    fn from(scalars: Vec<Scalar>) -> Self {
        Self(scalars)
    }
}

impl Index<usize> for ScalarVector {
    type Output = Scalar;

    fn index(&self, index: usize) -> &Scalar {
        &self.0[index]
    }
}

impl IndexMut<usize> for ScalarVector {
    fn index_mut(&mut self, index: usize) -> &mut Scalar {
        &mut self.0[index]
    }
}

impl Add<&ScalarVector> for &ScalarVector {
    type Output = ScalarVector;

    fn add(self, other: &ScalarVector) -> ScalarVector {
        assert_eq!(self.len(), other.len(), "vectors must be of equal size");
        ScalarVector(self.0.iter().zip(other.0.iter()).map(|(a, b)| a + b).collect())
    }
}

impl Sub<&ScalarVector> for &ScalarVector {
    type Output = ScalarVector;

    fn sub(self, other: &ScalarVector) -> ScalarVector {
        assert_eq!(self.len(), other.len(), "vectors must be of equal size");
        ScalarVector(self.0.iter().zip(other.0.iter()).map(|(a, b)| a - b).collect())
    }
}

/// Hadamard product.
impl Mul<&ScalarVector> for &ScalarVector {
    type Output = ScalarVector;

    fn mul(self, other: &ScalarVector) -> ScalarVector {
        assert_eq!(self.len(), other.len(), "vectors must be of equal size");
        ScalarVector(self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).collect())
    }
}

impl Add<Scalar> for &ScalarVector {
    type Output = ScalarVector;

    fn add(self, other: Scalar) -> ScalarVector {
        ScalarVector(self.0.iter().map(|a| a + other).collect())
    }
}

impl Sub<Scalar> for &ScalarVector {
    type Output = ScalarVector;

    fn sub(self, other: Scalar) -> ScalarVector {
        ScalarVector(self.0.iter().map(|a| a - other).collect())
    }
}

impl Mul<Scalar> for &ScalarVector {
    type Output = ScalarVector;

    fn mul(self, other: Scalar) -> ScalarVector {
        ScalarVector(self.0.iter().map(|a| a * other).collect())
    }
}

#[cfg(test)]
mod tests {
    use rand::thread_rng;

    use super::*;
    use crate::protocols::scalar_protocol::ScalarProtocol;

    #[test]
    fn elementwise_arithmetic() {
        let a = ScalarVector(vec![Scalar::from(1u64), Scalar::from(2u64)]);
        let b = ScalarVector(vec![Scalar::from(3u64), Scalar::from(4u64)]);
        assert_eq!((&a + &b).0, vec![Scalar::from(4u64), Scalar::from(6u64)]);
        assert_eq!((&b - &a).0, vec![Scalar::from(2u64), Scalar::from(2u64)]);
        assert_eq!((&a * &b).0, vec![Scalar::from(3u64), Scalar::from(8u64)]);
        assert_eq!(a.inner_product(&b), Scalar::from(11u64));
    }

    #[test]
    fn batch_inversion_agrees_with_elementwise() {
        let mut rng = thread_rng();
        let values = ScalarVector(Scalar::random_many(&mut rng, 8));
        assert_eq!(values.invert(false), values.invert(true));
    }

    #[test]
    fn dedupe_sort_removes_duplicates() {
        let a = Scalar::from(5u64);
        let b = Scalar::from(9u64);
        let values = ScalarVector(vec![a, b, a]);
        let deduped = values.dedupe_sort();
        assert_eq!(deduped.len(), 2);
        assert!(deduped.0.contains(&a) && deduped.0.contains(&b));
    }

    #[test]
    fn slicing() {
        let values = ScalarVector(vec![Scalar::from(1u64), Scalar::from(2u64), Scalar::from(3u64)]);
        assert_eq!(values.slice(1, 3).0, vec![Scalar::from(2u64), Scalar::from(3u64)]);
        assert_eq!(values.sum(), Scalar::from(6u64));
    }
}
