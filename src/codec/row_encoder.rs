// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Row to column encoding for inserts
//!
//! Every resolved field gets one accumulator with a slot per row. Slots start
//! unset; a slot still unset when the column is finalized is reported as a
//! missing value instead of being written as a wire default. JSON fields are
//! the one exception and encode an absent value as `{}`.

use serde_json::Value;
use tracing::debug;

use crate::codec::schema_resolver::{ResolvedField, ResolvedSchema};
use crate::core::error::ValidationError;
use crate::core::types::{FieldType, Row};
use crate::proto::schema::{
    field_data, scalar_field, vector_field, BoolArray, DoubleArray, FieldData, FloatArray,
    IntArray, JsonArray, LongArray, ScalarField, StringArray, VectorField,
};

const EMPTY_JSON_OBJECT: &[u8] = b"{}";

/// Per-row values of one field, `None` until the row sets it
struct Slots<T> {
    values: Vec<Option<T>>,
}

impl<T> Slots<T> {
    fn new(rows: usize) -> Self {
        Self {
            values: std::iter::repeat_with(|| None).take(rows).collect(),
        }
    }

    fn set(&mut self, row: usize, value: T) {
        self.values[row] = Some(value);
    }

    fn finish(self, field: &str) -> Result<Vec<T>, ValidationError> {
        self.values
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.ok_or_else(|| ValidationError::MissingValue {
                    row,
                    field: field.to_string(),
                })
            })
            .collect()
    }
}

enum ColumnAccumulator {
    Bool(Slots<bool>),
    Int(Slots<i32>),
    Long(Slots<i64>),
    Float(Slots<f32>),
    Double(Slots<f64>),
    VarChar(Slots<String>),
    Json(Slots<Vec<u8>>),
    BinaryVector(Slots<Vec<u8>>),
    FloatVector(Slots<Vec<f32>>),
}

impl ColumnAccumulator {
    fn for_field(field: &ResolvedField, rows: usize) -> Self {
        match field.field_type {
            FieldType::Bool => ColumnAccumulator::Bool(Slots::new(rows)),
            FieldType::Int8 | FieldType::Int16 | FieldType::Int32 => {
                ColumnAccumulator::Int(Slots::new(rows))
            }
            FieldType::Int64 => ColumnAccumulator::Long(Slots::new(rows)),
            FieldType::Float => ColumnAccumulator::Float(Slots::new(rows)),
            FieldType::Double => ColumnAccumulator::Double(Slots::new(rows)),
            FieldType::VarChar => ColumnAccumulator::VarChar(Slots::new(rows)),
            FieldType::Json => ColumnAccumulator::Json(Slots::new(rows)),
            FieldType::BinaryVector => ColumnAccumulator::BinaryVector(Slots::new(rows)),
            FieldType::FloatVector => ColumnAccumulator::FloatVector(Slots::new(rows)),
        }
    }

    fn set(&mut self, row: usize, field: &ResolvedField, value: &Value) -> Result<(), ValidationError> {
        if value.is_null() {
            return Ok(());
        }
        let invalid = |expected: &'static str| ValidationError::InvalidValue {
            row,
            field: field.name.clone(),
            expected,
        };

        match self {
            ColumnAccumulator::Bool(slots) => {
                slots.set(row, value.as_bool().ok_or_else(|| invalid("a boolean"))?)
            }
            ColumnAccumulator::Int(slots) => {
                let raw = value.as_i64().ok_or_else(|| invalid("an integer"))?;
                let narrowed = match field.field_type {
                    FieldType::Int8 => i8::try_from(raw).map(i32::from).ok(),
                    FieldType::Int16 => i16::try_from(raw).map(i32::from).ok(),
                    _ => i32::try_from(raw).ok(),
                };
                slots.set(row, narrowed.ok_or_else(|| invalid("an integer within the field's range"))?)
            }
            ColumnAccumulator::Long(slots) => {
                let parsed = match value {
                    Value::String(s) => s.trim().parse::<i64>().ok(),
                    other => other.as_i64(),
                };
                slots.set(row, parsed.ok_or_else(|| invalid("a 64-bit integer"))?)
            }
            ColumnAccumulator::Float(slots) => {
                slots.set(row, value.as_f64().ok_or_else(|| invalid("a number"))? as f32)
            }
            ColumnAccumulator::Double(slots) => {
                slots.set(row, value.as_f64().ok_or_else(|| invalid("a number"))?)
            }
            ColumnAccumulator::VarChar(slots) => {
                slots.set(row, value.as_str().ok_or_else(|| invalid("a string"))?.to_string())
            }
            ColumnAccumulator::Json(slots) => {
                // Serializing a Value cannot fail; map keys are always strings.
                let bytes = serde_json::to_vec(value).map_err(|_| invalid("a JSON value"))?;
                slots.set(row, bytes)
            }
            ColumnAccumulator::BinaryVector(slots) => {
                let elements = vector_elements(row, field, value)?;
                let bytes = elements
                    .iter()
                    .map(|v| v.as_u64().and_then(|b| u8::try_from(b).ok()))
                    .collect::<Option<Vec<u8>>>()
                    .ok_or_else(|| invalid("bytes in 0..=255"))?;
                slots.set(row, bytes)
            }
            ColumnAccumulator::FloatVector(slots) => {
                let elements = vector_elements(row, field, value)?;
                let floats = elements
                    .iter()
                    .map(|v| v.as_f64().map(|f| f as f32))
                    .collect::<Option<Vec<f32>>>()
                    .ok_or_else(|| invalid("numeric vector elements"))?;
                slots.set(row, floats)
            }
        }
        Ok(())
    }

    fn finish(self, field: &ResolvedField) -> Result<FieldData, ValidationError> {
        let name = field.name.as_str();
        let scalars = |data: scalar_field::Data| field_data::Field::Scalars(ScalarField { data: Some(data) });
        let vectors = |data: vector_field::Data| {
            field_data::Field::Vectors(VectorField {
                dim: i64::from(field.dimension.unwrap_or_default()),
                data: Some(data),
            })
        };

        let column = match self {
            ColumnAccumulator::Bool(slots) => scalars(scalar_field::Data::BoolData(BoolArray {
                data: slots.finish(name)?,
            })),
            ColumnAccumulator::Int(slots) => scalars(scalar_field::Data::IntData(IntArray {
                data: slots.finish(name)?,
            })),
            ColumnAccumulator::Long(slots) => scalars(scalar_field::Data::LongData(LongArray {
                data: slots.finish(name)?,
            })),
            ColumnAccumulator::Float(slots) => scalars(scalar_field::Data::FloatData(FloatArray {
                data: slots.finish(name)?,
            })),
            ColumnAccumulator::Double(slots) => scalars(scalar_field::Data::DoubleData(DoubleArray {
                data: slots.finish(name)?,
            })),
            ColumnAccumulator::VarChar(slots) => scalars(scalar_field::Data::StringData(StringArray {
                data: slots.finish(name)?,
            })),
            ColumnAccumulator::Json(slots) => scalars(scalar_field::Data::JsonData(JsonArray {
                data: slots
                    .values
                    .into_iter()
                    .map(|v| v.unwrap_or_else(|| EMPTY_JSON_OBJECT.to_vec()))
                    .collect(),
            })),
            ColumnAccumulator::BinaryVector(slots) => {
                vectors(vector_field::Data::BinaryVector(slots.finish(name)?.concat()))
            }
            ColumnAccumulator::FloatVector(slots) => {
                vectors(vector_field::Data::FloatVector(FloatArray {
                    data: slots.finish(name)?.concat(),
                }))
            }
        };

        Ok(FieldData {
            r#type: field.field_type.data_type() as i32,
            field_name: field.name.clone(),
            field: Some(column),
            field_id: 0,
        })
    }
}

/// Array elements of a vector value, checked against the field's row width
fn vector_elements<'a>(
    row: usize,
    field: &ResolvedField,
    value: &'a Value,
) -> Result<&'a Vec<Value>, ValidationError> {
    let elements = value.as_array().ok_or_else(|| ValidationError::InvalidValue {
        row,
        field: field.name.clone(),
        expected: "an array",
    })?;
    let expected = field.row_width().unwrap_or_default();
    if elements.len() != expected {
        return Err(ValidationError::DimensionMismatch {
            row,
            field: field.name.clone(),
            expected,
            actual: elements.len(),
        });
    }
    Ok(elements)
}

pub struct RowEncoder;

impl RowEncoder {
    /// Encode rows into one column per resolved field, in schema order.
    pub fn encode(rows: &[Row], schema: &ResolvedSchema) -> Result<Vec<FieldData>, ValidationError> {
        if rows.is_empty() {
            return Err(ValidationError::EmptyRows);
        }

        let mut columns: Vec<ColumnAccumulator> = schema
            .fields()
            .iter()
            .map(|field| ColumnAccumulator::for_field(field, rows.len()))
            .collect();

        for (row_index, row) in rows.iter().enumerate() {
            for (name, value) in row {
                let (id, field) = schema.lookup(name).ok_or_else(|| ValidationError::UnknownField {
                    row: row_index,
                    field: name.clone(),
                })?;
                columns[id.index()].set(row_index, field, value)?;
            }
        }

        let encoded = schema
            .fields()
            .iter()
            .zip(columns)
            .map(|(field, column)| column.finish(field))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Encoded {} rows into {} columns", rows.len(), encoded.len());
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::schema_resolver::SchemaResolver;
    use crate::core::types::FieldSchema;
    use serde_json::json;

    fn rows(values: Vec<Value>) -> Vec<Row> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    fn resolved() -> ResolvedSchema {
        SchemaResolver::resolve(&[
            FieldSchema::new("id", FieldType::Int64).primary_key(true),
            FieldSchema::new("age", FieldType::Int8),
            FieldSchema::new("name", FieldType::VarChar),
            FieldSchema::vector("vec", FieldType::FloatVector, 2),
            FieldSchema::new("tags", FieldType::Json),
        ])
        .unwrap()
    }

    #[test]
    fn test_columns_follow_schema_order() {
        let rows = rows(vec![
            json!({"tags": {"a": 1}, "vec": [0.5, 1.5], "name": "x", "age": 3}),
            json!({"vec": [2.0, 3.0], "age": 4, "name": "y"}),
        ]);

        let columns = RowEncoder::encode(&rows, &resolved()).unwrap();
        let names: Vec<_> = columns.iter().map(|c| c.field_name.as_str()).collect();
        assert_eq!(names, vec!["age", "name", "vec", "tags"]);

        match &columns[0].field {
            Some(field_data::Field::Scalars(ScalarField {
                data: Some(scalar_field::Data::IntData(ints)),
            })) => assert_eq!(ints.data, vec![3, 4]),
            other => panic!("unexpected age column: {:?}", other),
        }
        match &columns[2].field {
            Some(field_data::Field::Vectors(VectorField {
                dim,
                data: Some(vector_field::Data::FloatVector(floats)),
            })) => {
                assert_eq!(*dim, 2);
                assert_eq!(floats.data, vec![0.5, 1.5, 2.0, 3.0]);
            }
            other => panic!("unexpected vec column: {:?}", other),
        }
        match &columns[3].field {
            Some(field_data::Field::Scalars(ScalarField {
                data: Some(scalar_field::Data::JsonData(json_data)),
            })) => {
                assert_eq!(json_data.data[0], br#"{"a":1}"#.to_vec());
                assert_eq!(json_data.data[1], b"{}".to_vec());
            }
            other => panic!("unexpected tags column: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_field_reports_row() {
        let rows = rows(vec![
            json!({"age": 1, "name": "a", "vec": [0.0, 0.0]}),
            json!({"age": 1, "name": "b", "vec": [0.0, 0.0], "id": 9}),
        ]);

        assert_eq!(
            RowEncoder::encode(&rows, &resolved()).unwrap_err(),
            ValidationError::UnknownField { row: 1, field: "id".to_string() }
        );
    }

    #[test]
    fn test_missing_scalar_is_not_defaulted() {
        let rows = rows(vec![
            json!({"age": 1, "name": "a", "vec": [0.0, 0.0]}),
            json!({"name": "b", "vec": [0.0, 0.0]}),
        ]);

        assert_eq!(
            RowEncoder::encode(&rows, &resolved()).unwrap_err(),
            ValidationError::MissingValue { row: 1, field: "age".to_string() }
        );
    }

    #[test]
    fn test_float_vector_dimension_checked() {
        let rows = rows(vec![json!({"age": 1, "name": "a", "vec": [0.0, 0.0, 1.0]})]);

        assert_eq!(
            RowEncoder::encode(&rows, &resolved()).unwrap_err(),
            ValidationError::DimensionMismatch {
                row: 0,
                field: "vec".to_string(),
                expected: 2,
                actual: 3,
            }
        );
    }

    #[test]
    fn test_binary_vector_expects_packed_bytes() {
        let schema = SchemaResolver::resolve(&[FieldSchema::vector("bits", FieldType::BinaryVector, 16)]).unwrap();

        let ok = rows(vec![json!({"bits": [255, 1]}), json!({"bits": [0, 128]})]);
        let columns = RowEncoder::encode(&ok, &schema).unwrap();
        match &columns[0].field {
            Some(field_data::Field::Vectors(VectorField {
                dim,
                data: Some(vector_field::Data::BinaryVector(bytes)),
            })) => {
                assert_eq!(*dim, 16);
                assert_eq!(bytes, &vec![255, 1, 0, 128]);
            }
            other => panic!("unexpected bits column: {:?}", other),
        }

        let unpacked = rows(vec![json!({"bits": vec![1; 16]})]);
        assert!(matches!(
            RowEncoder::encode(&unpacked, &schema),
            Err(ValidationError::DimensionMismatch { expected: 2, actual: 16, .. })
        ));
    }

    #[test]
    fn test_int8_range_and_int64_strings() {
        let schema = SchemaResolver::resolve(&[
            FieldSchema::new("small", FieldType::Int8),
            FieldSchema::new("big", FieldType::Int64),
        ])
        .unwrap();

        let overflow = rows(vec![json!({"small": 300, "big": 1})]);
        assert!(matches!(
            RowEncoder::encode(&overflow, &schema),
            Err(ValidationError::InvalidValue { field, .. }) if field == "small"
        ));

        let strings = rows(vec![json!({"small": -5, "big": "9007199254740993"})]);
        let columns = RowEncoder::encode(&strings, &schema).unwrap();
        match &columns[1].field {
            Some(field_data::Field::Scalars(ScalarField {
                data: Some(scalar_field::Data::LongData(longs)),
            })) => assert_eq!(longs.data, vec![9_007_199_254_740_993]),
            other => panic!("unexpected big column: {:?}", other),
        }
    }

    #[test]
    fn test_empty_rows_rejected() {
        assert_eq!(
            RowEncoder::encode(&[], &resolved()).unwrap_err(),
            ValidationError::EmptyRows
        );
    }
}
