// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! BIP-39 mnemonic codec.
//!
//! Entropy of 16 or 32 bytes gains a SHA-256 checksum (4 or 8 bits), is
//! split into 11-bit groups and mapped through a 2048-word list, yielding
//! 12 or 24 words. Word lookup truncates to a language-specific UTF-8
//! prefix so abbreviated input ("aban" for "abandon") decodes. The word
//! lists themselves come from the `bip39` crate.

use crate::errors::{CryptoError, Result};
use crate::hashing::sha256;

/// Supported mnemonic languages.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Language {
    English,
    ChineseSimplified,
    ChineseTraditional,
    Czech,
    French,
    Italian,
    Japanese,
    Korean,
    Portuguese,
    Spanish,
}

impl Language {
    fn word_list(self) -> &'static [&'static str; 2048] {
        match self {
            Language::English => bip39::Language::English.word_list(),
            Language::ChineseSimplified => bip39::Language::SimplifiedChinese.word_list(),
            Language::ChineseTraditional => bip39::Language::TraditionalChinese.word_list(),
            Language::Czech => bip39::Language::Czech.word_list(),
            Language::French => bip39::Language::French.word_list(),
            Language::Italian => bip39::Language::Italian.word_list(),
            Language::Japanese => bip39::Language::Japanese.word_list(),
            Language::Korean => bip39::Language::Korean.word_list(),
            Language::Portuguese => bip39::Language::Portuguese.word_list(),
            Language::Spanish => bip39::Language::Spanish.word_list(),
        }
    }

    /// The number of UTF-8 code points that uniquely identify a word; CJK
    /// and Korean lists compare whole words.
    fn prefix_length(self) -> Option<usize> {
        match self {
            Language::English
            | Language::Czech
            | Language::French
            | Language::Italian
            | Language::Portuguese
            | Language::Spanish => Some(4),
            Language::ChineseSimplified
            | Language::ChineseTraditional
            | Language::Japanese
            | Language::Korean => None,
        }
    }

    fn trim(self, word: &str) -> String {
        match self.prefix_length() {
            Some(length) => word.chars().take(length).collect(),
            None => word.to_string(),
        }
    }
}

/// Every supported language.
pub fn languages() -> Vec<Language> {
    vec![
        Language::English,
        Language::ChineseSimplified,
        Language::ChineseTraditional,
        Language::Czech,
        Language::French,
        Language::Italian,
        Language::Japanese,
        Language::Korean,
        Language::Portuguese,
        Language::Spanish,
    ]
}

/// The full 2048-word list for a language.
pub fn word_list(language: Language) -> &'static [&'static str; 2048] {
    language.word_list()
}

/// The index of a word (possibly abbreviated) in a language's list.
pub fn word_index(word: &str, language: Language) -> Option<usize> {
    let trimmed = language.trim(word);

    language
        .word_list()
        .iter()
        .position(|candidate| language.trim(candidate) == trimmed)
}

/// Encodes 16 or 32 bytes of entropy into 12 or 24 words.
pub fn encode(input: &[u8], language: Language) -> Result<Vec<String>> {
    if input.len() != 16 && input.len() != 32 {
        return Err(CryptoError::InvalidArgument(
            "entropy must be 16 or 32 bytes".to_string(),
        ));
    }

    let checksum = sha256(input);
    let checksum_bits = input.len() / 4;

    let mut bits: Vec<bool> = Vec::with_capacity(input.len() * 8 + checksum_bits);
    for byte in input {
        for shift in (0..8).rev() {
            bits.push((byte >> shift) & 1 == 1);
        }
    }
    for shift in ((8 - checksum_bits)..8).rev() {
        bits.push((checksum.as_bytes()[0] >> shift) & 1 == 1);
    }

    let selected_word_list = language.word_list();

    let words = bits
        .chunks(11)
        .map(|group| {
            let index = group.iter().fold(0usize, |acc, &bit| (acc << 1) | usize::from(bit));
            selected_word_list[index].to_string()
        })
        .collect();

    Ok(words)
}

/// Decodes 12 or 24 words back to entropy, zero-padded to 32 bytes, after
/// validating the checksum.
pub fn decode_raw(words: &[&str], language: Language) -> Result<Vec<u8>> {
    if words.len() != 12 && words.len() != 24 {
        return Err(CryptoError::InvalidArgument(
            "mnemonic must contain 12 or 24 words".to_string(),
        ));
    }

    let mut bits: Vec<bool> = Vec::with_capacity(words.len() * 11);
    for word in words {
        let index = word_index(word, language).ok_or_else(|| {
            CryptoError::InvalidArgument(format!("'{word}' is not in the word list"))
        })?;
        for shift in (0..11).rev() {
            bits.push((index >> shift) & 1 == 1);
        }
    }

    let entropy_size = if words.len() == 24 { 32 } else { 16 };
    let entropy_bit_count = entropy_size * 8;

    let mut entropy = vec![0u8; entropy_size];
    for (i, &bit) in bits[..entropy_bit_count].iter().enumerate() {
        if bit {
            entropy[i / 8] |= 1 << (7 - (i % 8));
        }
    }

    let checksum = sha256(&entropy);
    for (i, &bit) in bits[entropy_bit_count..].iter().enumerate() {
        if ((checksum.as_bytes()[0] >> (7 - i)) & 1 == 1) != bit {
            return Err(CryptoError::ChecksumFailure(
                "mnemonic checksum mismatch".to_string(),
            ));
        }
    }

    entropy.resize(32, 0);

    Ok(entropy)
}

/// Decodes a whitespace-separated phrase.
pub fn decode_phrase(phrase: &str, language: Language) -> Result<Vec<u8>> {
    let words: Vec<&str> = phrase.split_whitespace().collect();

    decode_raw(&words, language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_round_trip_24_words() {
        let entropy: Vec<u8> = (0u8..32).collect();
        let words = encode(&entropy, Language::English).unwrap();
        assert_eq!(words.len(), 24);

        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        let decoded = decode_raw(&refs, Language::English).unwrap();
        assert_eq!(&decoded[..32], &entropy[..]);
    }

    #[test]
    fn english_round_trip_12_words() {
        let entropy = vec![0xabu8; 16];
        let words = encode(&entropy, Language::English).unwrap();
        assert_eq!(words.len(), 12);

        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        let decoded = decode_raw(&refs, Language::English).unwrap();
        assert_eq!(&decoded[..16], &entropy[..]);
        assert_eq!(&decoded[16..], &[0u8; 16]);
    }

    #[test]
    fn known_bip39_vector() {
        // the all-zero 128-bit vector from the BIP-39 reference set
        let words = encode(&[0u8; 16], Language::English).unwrap();
        assert_eq!(
            words.join(" "),
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about"
        );
    }

    #[test]
    fn abbreviated_words_decode() {
        let entropy = vec![0x5au8; 16];
        let words = encode(&entropy, Language::English).unwrap();
        let abbreviated: Vec<String> = words
            .iter()
            .map(|word| word.chars().take(4).collect())
            .collect();
        let refs: Vec<&str> = abbreviated.iter().map(String::as_str).collect();
        let decoded = decode_raw(&refs, Language::English).unwrap();
        assert_eq!(&decoded[..16], &entropy[..]);
    }

    #[test]
    fn swapped_word_fails_the_checksum() {
        // the zero vector checksums to "about"; an all-"abandon" phrase
        // carries the wrong checksum bits
        let refs = vec!["abandon"; 12];
        assert!(decode_raw(&refs, Language::English).is_err());
    }

    #[test]
    fn unknown_word_is_rejected() {
        let refs = vec!["notaword"; 12];
        assert!(decode_raw(&refs, Language::English).is_err());
    }

    #[test]
    fn every_language_round_trips() {
        let entropy: Vec<u8> = (100u8..132).collect();
        for language in languages() {
            let words = encode(&entropy, language).unwrap();
            let refs: Vec<&str> = words.iter().map(String::as_str).collect();
            let decoded = decode_raw(&refs, language).unwrap();
            assert_eq!(&decoded[..32], &entropy[..]);
        }
    }
}
