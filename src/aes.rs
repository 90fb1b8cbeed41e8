// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! Password-based payload encryption.
//!
//! Blobs are `salt16 ‖ AES-128-CBC(key, IV = salt16, PKCS#7(plaintext))`
//! with the key stretched by PBKDF2-HMAC-SHA3-512 over the password and
//! salt, hex-encoded for transport. A wrong password surfaces as a
//! dedicated error rather than garbage plaintext.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha3::Sha3_512;
use zeroize::Zeroize;

use crate::errors::{CryptoError, Result};

type Aes128CbcEncryptor = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDecryptor = cbc::Decryptor<aes::Aes128>;

/// Default PBKDF2 round count.
pub const PBKDF2_ITERATIONS: u32 = 10_000;

const SALT_SIZE: usize = 16;
const KEY_SIZE: usize = 16;

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha3_512>(password.as_bytes(), salt, iterations, &mut key);

    key
}

/// Encrypts a payload under a password, returning the hex-encoded blob.
pub fn encrypt(plaintext: &[u8], password: &str, iterations: u32) -> String {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);

    let mut key = derive_key(password, &salt, iterations);

    let ciphertext = Aes128CbcEncryptor::new(&key.into(), &salt.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    key.zeroize();

    let mut blob = salt.to_vec();
    blob.extend_from_slice(&ciphertext);

    hex::encode(blob)
}

/// Decrypts a hex-encoded blob produced by [`encrypt`].
pub fn decrypt(input: &str, password: &str, iterations: u32) -> Result<Vec<u8>> {
    let blob = hex::decode(input)
        .map_err(|_| CryptoError::InvalidArgument("ciphertext hex is malformed".to_string()))?;

    if blob.len() < SALT_SIZE {
        return Err(CryptoError::InvalidArgument(
            "ciphertext does not contain enough data to include the salt".to_string(),
        ));
    }

    let (salt, ciphertext) = blob.split_at(SALT_SIZE);

    let mut key = derive_key(password, salt, iterations);

    let salt_array: [u8; SALT_SIZE] = salt.try_into().expect("length checked");
    let result = Aes128CbcDecryptor::new(&key.into(), &salt_array.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::WrongPassword);
    key.zeroize();

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let encrypted = encrypt(b"attack at dawn", "hunter2", PBKDF2_ITERATIONS);
        let decrypted = decrypt(&encrypted, "hunter2", PBKDF2_ITERATIONS).unwrap();
        assert_eq!(decrypted, b"attack at dawn");
    }

    #[test]
    fn wrong_password_is_reported() {
        let encrypted = encrypt(b"attack at dawn", "hunter2", PBKDF2_ITERATIONS);
        assert!(matches!(
            decrypt(&encrypted, "hunter3", PBKDF2_ITERATIONS),
            Err(CryptoError::WrongPassword)
        ));
    }

    #[test]
    fn salts_differ_between_calls() {
        let first = encrypt(b"same payload", "pw", 1000);
        let second = encrypt(b"same payload", "pw", 1000);
        assert_ne!(first, second);
    }

    #[test]
    fn truncated_blob_is_rejected() {
        assert!(decrypt("00ff", "pw", 1000).is_err());
        assert!(decrypt("zz", "pw", 1000).is_err());
    }

    #[test]
    fn iteration_count_is_part_of_the_key() {
        let encrypted = encrypt(b"payload", "pw", 2000);
        assert!(decrypt(&encrypted, "pw", 1000).is_err());
        assert_eq!(decrypt(&encrypted, "pw", 2000).unwrap(), b"payload");
    }
}
