// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! Byte-level reader/writer shared by every protocol object.
//!
//! The wire vocabulary is small: raw 32-byte PODs (scalars, compressed
//! points, digests), little-endian `u64`, unsigned LEB128 varints, single
//! byte booleans, vectors as a varint count followed by the elements, and
//! matrices as a varint row count of varint-length rows.

use byteorder::{ByteOrder, LittleEndian};
use curve25519_dalek::{
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar,
};

use crate::{
    errors::{CryptoError, Result},
    hashing::Hash,
};

fn truncated() -> CryptoError {
    CryptoError::InvalidArgument("unexpected end of serialized data".to_string())
}

/// Append-only byte sink.
#[derive(Clone, Debug, Default)]
pub struct Writer {
    buffer: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the buffer for reuse.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// The buffer as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.buffer)
    }

    pub fn bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    pub fn u64(&mut self, value: u64) {
        let mut encoded = [0u8; 8];
        LittleEndian::write_u64(&mut encoded, value);
        self.buffer.extend_from_slice(&encoded);
    }

    /// Unsigned LEB128.
    pub fn varint(&mut self, mut value: u64) {
        loop {
            let mut byte = (value & 0x7f) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            self.buffer.push(byte);
            if value == 0 {
                break;
            }
        }
    }

    pub fn boolean(&mut self, value: bool) {
        self.buffer.push(u8::from(value));
    }

    pub fn scalar(&mut self, value: &Scalar) {
        self.buffer.extend_from_slice(value.as_bytes());
    }

    pub fn point(&mut self, value: &EdwardsPoint) {
        self.buffer.extend_from_slice(value.compress().as_bytes());
    }

    pub fn hash(&mut self, value: &Hash) {
        self.buffer.extend_from_slice(value.as_bytes());
    }

    pub fn scalar_vector(&mut self, values: &[Scalar]) {
        self.varint(values.len() as u64);
        for value in values {
            self.scalar(value);
        }
    }

    pub fn point_vector(&mut self, values: &[EdwardsPoint]) {
        self.varint(values.len() as u64);
        for value in values {
            self.point(value);
        }
    }

    pub fn scalar_matrix(&mut self, rows: &[Vec<Scalar>]) {
        self.varint(rows.len() as u64);
        for row in rows {
            self.scalar_vector(row);
        }
    }
}

/// Cursor over a serialized byte string.
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Number of bytes not yet consumed.
    pub fn unread(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// The unconsumed tail of the buffer.
    pub fn unread_bytes(&self) -> &'a [u8] {
        &self.bytes[self.offset..]
    }

    pub fn bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.unread() < count {
            return Err(truncated());
        }
        let slice = &self.bytes[self.offset..self.offset + count];
        self.offset += count;
        Ok(slice)
    }

    pub fn u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.bytes(8)?))
    }

    /// Unsigned LEB128.
    pub fn varint(&mut self) -> Result<u64> {
        let mut result = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = *self.bytes(1)?.first().ok_or_else(truncated)?;
            if shift == 63 && byte > 1 {
                return Err(CryptoError::InvalidArgument("varint overflow".to_string()));
            }
            result |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
            if shift > 63 {
                return Err(CryptoError::InvalidArgument("varint overflow".to_string()));
            }
        }
    }

    pub fn boolean(&mut self) -> Result<bool> {
        Ok(self.bytes(1)?[0] != 0)
    }

    /// Reads a canonical scalar, rejecting non-reduced encodings.
    pub fn scalar(&mut self) -> Result<Scalar> {
        let bytes: [u8; 32] = self.bytes(32)?.try_into().map_err(|_| truncated())?;
        Option::<Scalar>::from(Scalar::from_canonical_bytes(bytes))
            .ok_or_else(|| CryptoError::InvalidArgument("scalar is not canonical".to_string()))
    }

    pub fn point(&mut self) -> Result<EdwardsPoint> {
        let bytes: [u8; 32] = self.bytes(32)?.try_into().map_err(|_| truncated())?;
        CompressedEdwardsY(bytes)
            .decompress()
            .ok_or_else(|| CryptoError::InvalidArgument("point does not decode".to_string()))
    }

    pub fn hash(&mut self) -> Result<Hash> {
        Hash::from_slice(self.bytes(32)?)
    }

    pub fn scalar_vector(&mut self) -> Result<Vec<Scalar>> {
        let count = self.checked_count(32)?;
        let mut result = Vec::with_capacity(count);
        for _ in 0..count {
            result.push(self.scalar()?);
        }
        Ok(result)
    }

    pub fn point_vector(&mut self) -> Result<Vec<EdwardsPoint>> {
        let count = self.checked_count(32)?;
        let mut result = Vec::with_capacity(count);
        for _ in 0..count {
            result.push(self.point()?);
        }
        Ok(result)
    }

    pub fn hash_vector(&mut self) -> Result<Vec<Hash>> {
        let count = self.checked_count(32)?;
        let mut result = Vec::with_capacity(count);
        for _ in 0..count {
            result.push(self.hash()?);
        }
        Ok(result)
    }

    pub fn scalar_matrix(&mut self) -> Result<Vec<Vec<Scalar>>> {
        let rows = self.checked_count(1)?;
        let mut result = Vec::with_capacity(rows);
        for _ in 0..rows {
            result.push(self.scalar_vector()?);
        }
        Ok(result)
    }

    // A declared element count may not exceed what the buffer could hold;
    // rejecting early keeps hostile lengths from driving allocations.
    fn checked_count(&mut self, element_size: usize) -> Result<usize> {
        let count = self.varint()? as usize;
        if count > self.unread() / element_size.max(1) {
            return Err(truncated());
        }
        Ok(count)
    }
}
