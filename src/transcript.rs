// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! Deterministic Fiat-Shamir challenge accumulator.
//!
//! The transcript is a single scalar. Every update absorbs the previous
//! state together with the new input through SHA3-256 and reduces mod `l`,
//! so a challenge is determined by the exact sequence of prior updates.
//! Vector updates are length-prefixed: committing `(u, v)` and `(u ‖ v)`
//! yields different challenges.
//!
//! A zero challenge is rejected at the call site: provers retry with fresh
//! randomness where a random input participates, verifiers fail
//! deterministically.

use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar};

use crate::{
    domains::TRANSCRIPT_BASE,
    hashing::{sha3, Hash},
    serialization::Writer,
};

/// Fiat-Shamir transcript over a scalar state.
#[derive(Clone, Debug)]
pub struct Transcript {
    state: Scalar,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    /// A transcript at the fixed base state.
    pub fn new() -> Self {
        Self { state: *TRANSCRIPT_BASE }
    }

    /// Returns the transcript to its base state.
    pub fn reset(&mut self) {
        self.state = *TRANSCRIPT_BASE;
    }

    /// The challenge scalar for the current state. Does not mutate the
    /// transcript; interleave updates to obtain successive challenges.
    pub fn challenge(&self) -> Scalar {
        self.state
    }

    /// The current state as a 32-byte digest, for protocols that need a
    /// message digest rather than a scalar.
    pub fn challenge_hash(&self) -> Hash {
        Hash(self.state.to_bytes())
    }

    fn absorb(&mut self, body: impl FnOnce(&mut Writer)) {
        let mut writer = Writer::new();
        writer.scalar(&self.state);
        body(&mut writer);
        self.state = sha3(writer.as_bytes()).to_scalar();
    }

    pub fn update_scalar(&mut self, value: &Scalar) {
        self.absorb(|w| w.scalar(value));
    }

    pub fn update_point(&mut self, value: &EdwardsPoint) {
        self.absorb(|w| w.point(value));
    }

    pub fn update_hash(&mut self, value: &Hash) {
        self.absorb(|w| w.hash(value));
    }

    pub fn update_u64(&mut self, value: u64) {
        self.absorb(|w| w.u64(value));
    }

    pub fn update_scalars(&mut self, values: &[Scalar]) {
        self.absorb(|w| w.scalar_vector(values));
    }

    pub fn update_points(&mut self, values: &[EdwardsPoint]) {
        self.absorb(|w| w.point_vector(values));
    }
}

#[cfg(test)]
mod tests {
    use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;

    use super::*;

    #[test]
    fn deterministic_in_update_order() {
        let mut a = Transcript::new();
        let mut b = Transcript::new();
        a.update_u64(1);
        a.update_u64(2);
        b.update_u64(1);
        b.update_u64(2);
        assert_eq!(a.challenge(), b.challenge());

        let mut c = Transcript::new();
        c.update_u64(2);
        c.update_u64(1);
        assert_ne!(a.challenge(), c.challenge());
    }

    #[test]
    fn reset_restores_the_base_state() {
        let mut tr = Transcript::new();
        let base = tr.challenge();
        tr.update_point(&ED25519_BASEPOINT_POINT);
        assert_ne!(tr.challenge(), base);
        tr.reset();
        assert_eq!(tr.challenge(), base);
    }

    #[test]
    fn vector_framing_is_unambiguous() {
        let u = Scalar::from(7u64);
        let v = Scalar::from(11u64);

        let mut split = Transcript::new();
        split.update_scalars(&[u]);
        split.update_scalars(&[v]);

        let mut joined = Transcript::new();
        joined.update_scalars(&[u, v]);

        assert_ne!(split.challenge(), joined.challenge());
    }

    #[test]
    fn challenge_reads_do_not_mutate() {
        let mut tr = Transcript::new();
        tr.update_u64(99);
        assert_eq!(tr.challenge(), tr.challenge());
        assert_eq!(tr.challenge_hash().to_bytes(), tr.challenge().to_bytes());
    }
}
