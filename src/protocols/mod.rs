// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! Extension traits layering protocol-specific behavior onto the
//! curve25519-dalek scalar and point types.

pub mod point_protocol;
pub mod scalar_protocol;
