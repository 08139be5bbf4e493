// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Vector packing for the wire
//!
//! Binary vectors travel bit-packed, eight dimensions per byte with the first
//! dimension in the most significant bit. Float vectors travel either as a flat
//! `FloatArray` (insert columns) or as little-endian IEEE-754 bytes (query
//! placeholders).

/// Bit-pack boolean dimensions, MSB first. A trailing partial byte is zero padded.
pub fn pack_binary(bits: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; bits.len().div_ceil(8)];
    for (i, _) in bits.iter().enumerate().filter(|(_, bit)| **bit) {
        bytes[i / 8] |= 0x80 >> (i % 8);
    }
    bytes
}

/// Inverse of [`pack_binary`] for a vector of `dim_bits` dimensions.
pub fn unpack_binary(bytes: &[u8], dim_bits: usize) -> Vec<bool> {
    (0..dim_bits.min(bytes.len() * 8))
        .map(|i| bytes[i / 8] & (0x80 >> (i % 8)) != 0)
        .collect()
}

/// Interpret numeric dimensions as bits; anything non-zero is set.
pub fn bits_from_values(values: &[f32]) -> Vec<bool> {
    values.iter().map(|v| *v != 0.0).collect()
}

/// Float vectors are already in wire precision.
pub fn pack_float(values: &[f32]) -> Vec<f32> {
    values.to_vec()
}

pub fn float_vector_bytes(values: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Inverse of [`float_vector_bytes`]; trailing bytes short of a full float are ignored.
pub fn float_vector_from_bytes(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
