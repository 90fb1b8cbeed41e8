// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! Process-wide generator points and domain-separation constants.
//!
//! Every protocol reserves a distinct index under `SALT_DOMAIN` so that a
//! challenge scalar produced in one construction can never collide with a
//! challenge produced in another. The derived values are computed once at
//! first use and are read-only thereafter.

use curve25519_dalek::{
    constants::ED25519_BASEPOINT_POINT,
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar,
};
use lazy_static::lazy_static;

use crate::hashing::sha3_slow;

/// Primary generator point `G`, the Ed25519 basepoint.
pub const G: EdwardsPoint = ED25519_BASEPOINT_POINT;

/// The 32-byte salt every domain constant is derived from.
pub(crate) const SALT_DOMAIN: [u8; 32] = [
    0x20, 0x20, 0x53, 0x50, 0x4f, 0x4e, 0x53, 0x4f, 0x52, 0x45, 0x44, 0x20, 0x42, 0x59, 0x20,
    0x44, 0x4f, 0x4e, 0x55, 0x54, 0x53, 0x20, 0x41, 0x52, 0x45, 0x20, 0x47, 0x4f, 0x4f, 0x44,
    0x20, 0x20,
];

fn salt_scalar(index: u64) -> Scalar {
    sha3_slow(&SALT_DOMAIN, index).to_scalar()
}

fn salt_point(index: u64) -> EdwardsPoint {
    sha3_slow(&SALT_DOMAIN, index).to_point()
}

lazy_static! {
    /// Secondary generator point `H = Hp(G)`, used as the value base of
    /// Pedersen commitments. The discrete log of `H` with respect to `G` is
    /// unknown.
    pub static ref H: EdwardsPoint = CompressedEdwardsY([
        0xdd, 0x2a, 0xf5, 0xc2, 0x8a, 0xcc, 0xdc, 0x50, 0xc8, 0xbc, 0x4e, 0x15, 0x99, 0x12,
        0x82, 0x3a, 0x87, 0x87, 0xc1, 0x18, 0x52, 0x97, 0x74, 0x5f, 0xb2, 0x30, 0xe2, 0x64,
        0x6c, 0xd7, 0x7e, 0xf6,
    ])
    .decompress()
    .expect("H is a valid point");

    /// Tertiary generator point `U`, the base of Triptych key images.
    pub static ref U: EdwardsPoint = CompressedEdwardsY([
        0x3b, 0x51, 0x37, 0xf1, 0x67, 0x4c, 0x55, 0xf9, 0xad, 0x2b, 0x5d, 0xbf, 0x14, 0x99,
        0x69, 0xc5, 0x62, 0x4a, 0x84, 0x36, 0xbc, 0xfb, 0x99, 0xc6, 0xac, 0x30, 0x1b, 0x4b,
        0x31, 0x21, 0x93, 0xf2,
    ])
    .decompress()
    .expect("U is a valid point");

    /// `1/8`, the inverse of the curve cofactor.
    pub static ref INV_EIGHT: Scalar = Scalar::from(8u64).invert();

    pub static ref DERIVATION_DOMAIN: Scalar = salt_scalar(0);
    pub static ref SPEND_KEY_DOMAIN: Scalar = salt_scalar(1);
    pub static ref VIEW_KEY_DOMAIN: Scalar = salt_scalar(2);
    pub static ref SIGNATURE_DOMAIN: Scalar = salt_scalar(3);
    pub static ref BORROMEAN_DOMAIN: Scalar = salt_scalar(4);
    pub static ref CLSAG_DOMAIN_0: Scalar = salt_scalar(5);
    pub static ref CLSAG_DOMAIN_1: Scalar = salt_scalar(6);
    pub static ref CLSAG_DOMAIN_2: Scalar = salt_scalar(7);
    pub static ref COMMITMENT_MASK_DOMAIN: Scalar = salt_scalar(8);
    pub static ref AMOUNT_MASK_DOMAIN: Scalar = salt_scalar(9);
    pub static ref TRIPTYCH_DOMAIN_0: Scalar = salt_scalar(10);
    pub static ref TRIPTYCH_DOMAIN_1: EdwardsPoint = salt_point(11);
    pub static ref BULLETPROOFS_DOMAIN_0: Scalar = salt_scalar(12);
    pub static ref BULLETPROOFS_DOMAIN_1: EdwardsPoint = salt_point(13);
    pub static ref BULLETPROOFS_DOMAIN_2: EdwardsPoint = salt_point(14);
    pub static ref BULLETPROOFS_PLUS_DOMAIN_0: Scalar = salt_scalar(15);
    pub static ref BULLETPROOFS_PLUS_DOMAIN_1: EdwardsPoint = salt_point(16);
    pub static ref BULLETPROOFS_PLUS_DOMAIN_2: EdwardsPoint = salt_point(17);
    pub static ref OUTPUT_PROOF_DOMAIN: Scalar = salt_scalar(18);
    pub static ref TRANSCRIPT_BASE: Scalar = salt_scalar(19);
}
