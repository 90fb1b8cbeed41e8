// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! Zero-knowledge proofs: Bulletproofs and Bulletproofs+ range proofs and
//! the CLSAG-based output-ownership audit proof.
//!
//! The two range-proof systems are independently usable; a deployment
//! chooses one. Both consume amounts through Pedersen commitments, cache
//! their generator vectors process-wide, and batch-verify any number of
//! proofs with one final multiscalar multiplication.

pub mod audit;
pub mod bulletproofs;
pub mod bulletproofs_plus;
