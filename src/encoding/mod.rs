// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! Human-facing codecs: the two Base58 dialects, wallet addresses and
//! BIP-39 mnemonics.

pub mod address;
pub mod base58;
pub mod cn_base58;
pub mod mnemonics;
