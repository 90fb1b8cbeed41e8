// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! Bitcoin-alphabet Base58 with the per-character big-integer algorithm
//! and an optional 4-byte SHA3-256 check form. Leading zero bytes map to
//! leading `1` characters and back.

use crate::{
    errors::{CryptoError, Result},
    hashing::sha3,
};

pub(crate) const CHECKSUM_SIZE: usize = 4;

const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

fn digit_of(character: u8) -> Option<u32> {
    ALPHABET.iter().position(|&c| c == character).map(|d| d as u32)
}

/// Encodes bytes to Base58.
pub fn encode(input: &[u8]) -> String {
    if input.is_empty() {
        return String::new();
    }

    let zeroes = input.iter().take_while(|&&b| b == 0).count();

    // log(256) / log(58) rounded up
    let size = (input.len() - zeroes) * 138 / 100 + 1;
    let mut b58 = vec![0u8; size];

    let mut length = 0usize;
    for &byte in &input[zeroes..] {
        let mut carry = u32::from(byte);
        let mut i = 0usize;
        for digit in b58.iter_mut().rev() {
            if carry == 0 && i >= length {
                break;
            }
            carry += 256 * u32::from(*digit);
            *digit = (carry % 58) as u8;
            carry /= 58;
            i += 1;
        }
        length = i;
    }

    let mut result = String::with_capacity(zeroes + length);
    for _ in 0..zeroes {
        result.push('1');
    }
    for &digit in &b58[size - length..] {
        result.push(ALPHABET[digit as usize] as char);
    }

    result
}

/// Decodes a Base58 string to bytes.
pub fn decode(input: &str) -> Result<Vec<u8>> {
    if input.is_empty() {
        return Err(CryptoError::InvalidArgument("input is empty".to_string()));
    }

    let bytes = input.as_bytes();
    let zeroes = bytes.iter().take_while(|&&c| c == b'1').count();

    // log(58) / log(256) rounded up
    let size = (bytes.len() - zeroes) * 733 / 1000 + 1;
    let mut b256 = vec![0u8; size];

    let mut length = 0usize;
    for &character in &bytes[zeroes..] {
        let mut carry = digit_of(character).ok_or_else(|| {
            CryptoError::InvalidArgument("string contains a non-Base58 character".to_string())
        })?;
        let mut i = 0usize;
        for byte in b256.iter_mut().rev() {
            if carry == 0 && i >= length {
                break;
            }
            carry += 58 * u32::from(*byte);
            *byte = (carry % 256) as u8;
            carry /= 256;
            i += 1;
        }
        length = i;
    }

    let mut result = Vec::with_capacity(zeroes + length);
    result.resize(zeroes, 0);
    result.extend_from_slice(&b256[size - length..]);

    Ok(result)
}

/// Encodes bytes with a trailing 4-byte SHA3-256 checksum.
pub fn encode_check(input: &[u8]) -> String {
    let checksum = sha3(input);

    let mut payload = input.to_vec();
    payload.extend_from_slice(&checksum.as_bytes()[..CHECKSUM_SIZE]);

    encode(&payload)
}

/// Decodes a Base58-check string, validating and stripping the checksum.
pub fn decode_check(input: &str) -> Result<Vec<u8>> {
    let mut decoded = decode(input)?;

    if decoded.len() <= CHECKSUM_SIZE {
        return Err(CryptoError::InvalidArgument(
            "input is too short to carry a checksum".to_string(),
        ));
    }

    let payload_length = decoded.len() - CHECKSUM_SIZE;
    let checksum = decoded.split_off(payload_length);

    let expected = sha3(&decoded);
    if checksum != expected.as_bytes()[..CHECKSUM_SIZE] {
        return Err(CryptoError::ChecksumFailure("Base58 checksum mismatch".to_string()));
    }

    Ok(decoded)
}
