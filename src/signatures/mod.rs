// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! Signature constructions: the single-signer Schnorr signature, RFC-8032
//! Ed25519, and the Borromean, CLSAG and Triptych linkable ring signatures.
//!
//! Every scheme exposes the same lifecycle: `prepare_*` builds an
//! incomplete signature without the signing key, `complete_*` folds the
//! signing key in, `generate_*` does both in one step for a signer who
//! holds every secret, and `check_*` verifies. Prepared signatures travel
//! by value, so multi-party flows can interleave freely.

pub mod borromean;
pub mod clsag;
pub mod rfc8032;
pub mod schnorr;
pub mod triptych;
