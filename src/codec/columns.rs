// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Column decoding shared by the search and query decoders
//!
//! A wire column becomes one JSON value per entity. Vector columns arrive
//! flattened and are split back into per-entity arrays by dimension; binary
//! vector dimensions are counted in bits, so each entity owns `dim / 8` bytes.

use serde_json::Value;

use crate::core::error::DecodeError;
use crate::proto::schema::{field_data, scalar_field, vector_field, FieldData, VectorField};

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedColumn {
    pub name: String,
    pub values: Vec<Value>,
}

impl DecodedColumn {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value_at(&self, index: usize) -> Result<&Value, DecodeError> {
        self.values.get(index).ok_or_else(|| DecodeError::ColumnTooShort {
            field: self.name.clone(),
            index,
        })
    }
}

pub fn decode_column(field: &FieldData) -> Result<DecodedColumn, DecodeError> {
    let name = field.field_name.clone();
    let values = match &field.field {
        Some(field_data::Field::Scalars(scalars)) => match &scalars.data {
            Some(data) => decode_scalars(&name, data)?,
            None => return Err(DecodeError::MissingColumnData(name)),
        },
        Some(field_data::Field::Vectors(vectors)) => decode_vectors(&name, vectors)?,
        None => return Err(DecodeError::MissingColumnData(name)),
    };
    Ok(DecodedColumn { name, values })
}

/// Decode every column up front so a failure never leaves half-built rows behind.
pub fn decode_columns(fields: &[FieldData]) -> Result<Vec<DecodedColumn>, DecodeError> {
    fields.iter().map(decode_column).collect()
}

fn decode_scalars(name: &str, data: &scalar_field::Data) -> Result<Vec<Value>, DecodeError> {
    let values = match data {
        scalar_field::Data::BoolData(array) => array.data.iter().map(|v| Value::Bool(*v)).collect(),
        scalar_field::Data::IntData(array) => array.data.iter().map(|v| Value::from(*v)).collect(),
        scalar_field::Data::LongData(array) => array.data.iter().map(|v| Value::from(*v)).collect(),
        scalar_field::Data::FloatData(array) => {
            array.data.iter().map(|v| Value::from(f64::from(*v))).collect()
        }
        scalar_field::Data::DoubleData(array) => array.data.iter().map(|v| Value::from(*v)).collect(),
        scalar_field::Data::StringData(array) => {
            array.data.iter().map(|v| Value::String(v.clone())).collect()
        }
        scalar_field::Data::JsonData(array) => array
            .data
            .iter()
            .enumerate()
            .map(|(index, bytes)| {
                serde_json::from_slice(bytes).map_err(|source| DecodeError::InvalidJson {
                    field: name.to_string(),
                    index,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        scalar_field::Data::BytesData(_) => {
            return Err(DecodeError::UnexpectedDiscriminant {
                field: name.to_string(),
                kind: "bytes",
            })
        }
    };
    Ok(values)
}

fn decode_vectors(name: &str, vectors: &VectorField) -> Result<Vec<Value>, DecodeError> {
    let invalid_dim = || DecodeError::InvalidDimension {
        field: name.to_string(),
        dim: vectors.dim,
    };
    let dim = usize::try_from(vectors.dim).map_err(|_| invalid_dim())?;

    match &vectors.data {
        Some(vector_field::Data::FloatVector(array)) => {
            if dim == 0 {
                return Err(invalid_dim());
            }
            let rows = split_rows(name, array.data.as_slice(), dim)?;
            Ok(rows
                .map(|row| Value::Array(row.iter().map(|v| Value::from(f64::from(*v))).collect()))
                .collect())
        }
        Some(vector_field::Data::BinaryVector(bytes)) => {
            if dim < 8 {
                return Err(invalid_dim());
            }
            let rows = split_rows(name, bytes.as_slice(), dim / 8)?;
            Ok(rows
                .map(|row| Value::Array(row.iter().map(|b| Value::from(*b)).collect()))
                .collect())
        }
        None => Err(DecodeError::MissingColumnData(name.to_string())),
    }
}

fn split_rows<'a, T>(
    name: &str,
    flat: &'a [T],
    width: usize,
) -> Result<std::slice::ChunksExact<'a, T>, DecodeError> {
    if flat.len() % width != 0 {
        return Err(DecodeError::RaggedVector {
            field: name.to_string(),
            len: flat.len(),
            width,
        });
    }
    Ok(flat.chunks_exact(width))
}
