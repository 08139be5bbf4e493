// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Schema resolution for the write path
//!
//! Turns a collection's field list into the ordered lookup the row encoder
//! works against. Auto-generated primary keys are dropped here because the
//! server assigns them and rejects them in insert payloads.

use std::collections::HashMap;
use tracing::debug;

use crate::core::error::SchemaError;
use crate::core::types::{FieldSchema, FieldType};

/// Position of a field within a [`ResolvedSchema`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(usize);

impl FieldId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub name: String,
    pub field_type: FieldType,
    /// Present for every vector field
    pub dimension: Option<u32>,
}

impl ResolvedField {
    /// Number of wire elements one row contributes to a vector column
    pub fn row_width(&self) -> Option<usize> {
        let dim = self.dimension? as usize;
        match self.field_type {
            FieldType::BinaryVector => Some(dim / 8),
            FieldType::FloatVector => Some(dim),
            _ => None,
        }
    }
}

/// Insertable fields in declaration order, indexed by name
#[derive(Debug, Clone, Default)]
pub struct ResolvedSchema {
    fields: Vec<ResolvedField>,
    by_name: HashMap<String, FieldId>,
}

impl ResolvedSchema {
    pub fn lookup(&self, name: &str) -> Option<(FieldId, &ResolvedField)> {
        let id = *self.by_name.get(name)?;
        Some((id, &self.fields[id.0]))
    }

    pub fn field(&self, id: FieldId) -> &ResolvedField {
        &self.fields[id.0]
    }

    pub fn fields(&self) -> &[ResolvedField] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &ResolvedField)> {
        self.fields.iter().enumerate().map(|(i, f)| (FieldId(i), f))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

pub struct SchemaResolver;

impl SchemaResolver {
    pub fn resolve(schema: &[FieldSchema]) -> Result<ResolvedSchema, SchemaError> {
        let mut resolved = ResolvedSchema::default();

        for field in schema {
            if field.is_primary_key && field.auto_id {
                debug!("Skipping auto-generated primary key '{}'", field.name);
                continue;
            }
            if resolved.by_name.contains_key(&field.name) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }

            let dimension = if field.field_type.is_vector() {
                Some(Self::vector_dimension(field)?)
            } else {
                None
            };

            let id = FieldId(resolved.fields.len());
            resolved.by_name.insert(field.name.clone(), id);
            resolved.fields.push(ResolvedField {
                name: field.name.clone(),
                field_type: field.field_type,
                dimension,
            });
        }

        debug!("Resolved {} insertable fields", resolved.len());
        Ok(resolved)
    }

    fn vector_dimension(field: &FieldSchema) -> Result<u32, SchemaError> {
        let dim = field.dimension.ok_or_else(|| SchemaError::MissingDimension {
            field: field.name.clone(),
        })?;

        let byte_aligned = field.field_type != FieldType::BinaryVector || dim % 8 == 0;
        if dim == 0 || !byte_aligned {
            return Err(SchemaError::InvalidDimension {
                field: field.name.clone(),
                value: dim.to_string(),
            });
        }
        Ok(dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Vec<FieldSchema> {
        vec![
            FieldSchema::new("id", FieldType::Int64).primary_key(true),
            FieldSchema::new("age", FieldType::Int32),
            FieldSchema::vector("vec", FieldType::FloatVector, 4),
            FieldSchema::new("meta", FieldType::Json),
        ]
    }

    #[test]
    fn test_auto_id_primary_key_excluded() {
        let resolved = SchemaResolver::resolve(&schema()).unwrap();

        assert_eq!(resolved.len(), 3);
        assert!(resolved.lookup("id").is_none());
        let names: Vec<_> = resolved.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["age", "vec", "meta"]);
    }

    #[test]
    fn test_manual_primary_key_kept() {
        let fields = vec![
            FieldSchema::new("id", FieldType::VarChar).primary_key(false),
            FieldSchema::vector("vec", FieldType::BinaryVector, 16),
        ];
        let resolved = SchemaResolver::resolve(&fields).unwrap();

        let (id, field) = resolved.lookup("id").unwrap();
        assert_eq!(id.index(), 0);
        assert_eq!(field.field_type, FieldType::VarChar);
        assert_eq!(resolved.lookup("vec").unwrap().1.row_width(), Some(2));
    }

    #[test]
    fn test_vector_without_dimension_fails() {
        let fields = vec![FieldSchema::new("vec", FieldType::FloatVector)];
        assert_eq!(
            SchemaResolver::resolve(&fields).unwrap_err(),
            SchemaError::MissingDimension { field: "vec".to_string() }
        );
    }

    #[test]
    fn test_binary_dimension_must_be_byte_aligned() {
        let fields = vec![FieldSchema::vector("bits", FieldType::BinaryVector, 12)];
        assert!(matches!(
            SchemaResolver::resolve(&fields),
            Err(SchemaError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let fields = vec![
            FieldSchema::new("a", FieldType::Bool),
            FieldSchema::new("a", FieldType::Double),
        ];
        assert_eq!(
            SchemaResolver::resolve(&fields).unwrap_err(),
            SchemaError::DuplicateField("a".to_string())
        );
    }
}
