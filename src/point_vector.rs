// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! Point vector container used by the range proofs and ring signatures.

use core::ops::{Add, Index, IndexMut, Mul, Sub};

use curve25519_dalek::{
    edwards::EdwardsPoint,
    scalar::Scalar,
    traits::VartimeMultiscalarMul,
};

/// An ordered sequence of curve points.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PointVector(pub Vec<EdwardsPoint>);

impl PointVector {
    /// A vector of `size` copies of `value`.
    pub fn filled(size: usize, value: EdwardsPoint) -> Self {
        Self(vec![value; size])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn append(&mut self, value: EdwardsPoint) {
        self.0.push(value);
    }

    pub fn extend(&mut self, values: &[EdwardsPoint]) {
        self.0.extend_from_slice(values);
    }

    /// The half-open range `[start, end)` as a new vector.
    pub fn slice(&self, start: usize, end: usize) -> Self {
        Self(self.0[start..end].to_vec())
    }

    pub fn sum(&self) -> EdwardsPoint {
        self.0.iter().sum()
    }

    pub fn negate(&self) -> Self {
        Self(self.0.iter().map(|p| -p).collect())
    }

    /// `a·selfᵢ + b·otherᵢ` for every index, halving the curve operations
    /// relative to two separate scalar multiplications. Variable time; the
    /// inner-product rounds feed it only public data.
    pub fn dbl_mult(&self, a: &Scalar, other: &PointVector, b: &Scalar) -> Self {
        assert_eq!(self.len(), other.len(), "vectors must be of equal size");
        Self(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(first, second)| {
                    EdwardsPoint::vartime_multiscalar_mul([a, b], [first, second])
                })
                .collect(),
        )
    }

    /// Removes duplicates and orders the elements by descending compressed
    /// byte value. Used to reject rings containing repeated keys.
    pub fn dedupe_sort(&self) -> Self {
        let mut compressed: Vec<[u8; 32]> = self.0.iter().map(|p| p.compress().to_bytes()).collect();
        compressed.sort_by(|a, b| b.cmp(a));
        compressed.dedup();
        Self(
            compressed
                .into_iter()
                .map(|bytes| {
                    curve25519_dalek::edwards::CompressedEdwardsY(bytes)
                        .decompress()
                        .expect("input points decompress")
                })
                .collect(),
        )
    }
}

impl From<Vec<EdwardsPoint>> for PointVector {
    fn from(points: Vec<EdwardsPoint>) -> Self {
        Self(points)
    }
}

impl Index<usize> for PointVector {
    type Output = EdwardsPoint;

    fn index(&self, index: usize) -> &EdwardsPoint {
        &self.0[index]
    }
}

impl IndexMut<usize> for PointVector {
    fn index_mut(&mut self, index: usize) -> &mut EdwardsPoint {
        &mut self.0[index]
    }
}

impl Add<&PointVector> for &PointVector {
    type Output = PointVector;

    fn add(self, other: &PointVector) -> PointVector {
        assert_eq!(self.len(), other.len(), "vectors must be of equal size");
        PointVector(self.0.iter().zip(other.0.iter()).map(|(a, b)| a + b).collect())
    }
}

impl Sub<&PointVector> for &PointVector {
    type Output = PointVector;

    fn sub(self, other: &PointVector) -> PointVector {
        assert_eq!(self.len(), other.len(), "vectors must be of equal size");
        PointVector(self.0.iter().zip(other.0.iter()).map(|(a, b)| a - b).collect())
    }
}

/// Scales every element.
impl Mul<Scalar> for &PointVector {
    type Output = PointVector;

    fn mul(self, other: Scalar) -> PointVector {
        PointVector(self.0.iter().map(|p| other * p).collect())
    }
}

#[cfg(test)]
mod tests {
    use rand::thread_rng;

    use super::*;
    use crate::protocols::{point_protocol::PointProtocol, scalar_protocol::ScalarProtocol};

    #[test]
    fn sum_and_negate() {
        let mut rng = thread_rng();
        let a = EdwardsPoint::random(&mut rng);
        let b = EdwardsPoint::random(&mut rng);
        let vector = PointVector(vec![a, b]);
        assert_eq!(vector.sum(), a + b);
        assert_eq!(vector.negate().sum(), -(a + b));
    }

    #[test]
    fn dbl_mult_matches_naive() {
        let mut rng = thread_rng();
        let first = PointVector(vec![EdwardsPoint::random(&mut rng), EdwardsPoint::random(&mut rng)]);
        let second = PointVector(vec![EdwardsPoint::random(&mut rng), EdwardsPoint::random(&mut rng)]);
        let a = Scalar::random_not_zero(&mut rng);
        let b = Scalar::random_not_zero(&mut rng);
        let combined = first.dbl_mult(&a, &second, &b);
        for i in 0..2 {
            assert_eq!(combined[i], a * first[i] + b * second[i]);
        }
    }

    #[test]
    fn dedupe_sort_detects_duplicate_keys() {
        let mut rng = thread_rng();
        let a = EdwardsPoint::random(&mut rng);
        let b = EdwardsPoint::random(&mut rng);
        assert_eq!(PointVector(vec![a, b, a]).dedupe_sort().len(), 2);
        assert_eq!(PointVector(vec![a, b]).dedupe_sort().len(), 2);
    }
}
