// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

use thiserror::Error;

/// Represents an error raised while constructing, parsing or operating on a
/// cryptographic object.
///
/// Verification predicates do not produce these for protocol-level
/// rejection; they return `false`. Errors are reserved for inputs that are
/// structurally unusable.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid argument: `{0}`")]
    InvalidArgument(String),
    #[error("Signature failed verification: `{0}`")]
    InvalidSignature(String),
    #[error("Proof failed verification: `{0}`")]
    InvalidProof(String),
    #[error("Wrong password supplied for decryption")]
    WrongPassword,
    #[error("Checksum mismatch: `{0}`")]
    ChecksumFailure(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, CryptoError>;

/// Hard cap on prover retry loops that draw fresh randomness after a zero
/// Fiat-Shamir challenge. The probability of a single zero challenge is
/// about 2^-252, so hitting the cap indicates a broken RNG.
pub(crate) const MAX_PROVER_RETRIES: usize = 8;

pub(crate) fn retries_exceeded() -> CryptoError {
    CryptoError::InvalidArgument("prover retry limit exceeded".to_string())
}
