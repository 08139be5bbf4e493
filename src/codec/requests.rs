// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Insert and query request assembly
//!
//! The schema handed to these functions is fetched fresh by the caller for
//! every call; nothing here caches it.

use tracing::debug;

use crate::codec::row_encoder::RowEncoder;
use crate::codec::schema_resolver::SchemaResolver;
use crate::codec::status::ensure_status_ok;
use crate::core::error::{Result, ValidationError};
use crate::core::types::{FieldSchema, Row};
use crate::proto::common::{KeyValuePair, MsgBase, MsgType};
use crate::proto::milvus::{DescribeCollectionResponse, InsertRequest, QueryRequest};

/// Field list of a described collection
pub fn fields_from_describe(response: &DescribeCollectionResponse) -> Result<Vec<FieldSchema>> {
    ensure_status_ok(response.status.as_ref())?;
    response
        .schema
        .as_ref()
        .map(|schema| schema.fields.iter().map(FieldSchema::try_from).collect())
        .unwrap_or_else(|| Ok(Vec::new()))
}

pub fn build_insert_request(
    collection_name: &str,
    partition_name: Option<&str>,
    rows: &[Row],
    schema: &[FieldSchema],
) -> Result<InsertRequest> {
    if collection_name.trim().is_empty() {
        return Err(ValidationError::MissingRequiredField("collection_name").into());
    }

    let resolved = SchemaResolver::resolve(schema)?;
    let fields_data = RowEncoder::encode(rows, &resolved)?;
    let num_rows = u32::try_from(rows.len()).map_err(|_| ValidationError::InvalidValue {
        row: rows.len(),
        field: "num_rows".to_string(),
        expected: "at most u32::MAX rows",
    })?;

    debug!(
        "Built insert for '{}' with {} rows",
        collection_name, num_rows
    );

    Ok(InsertRequest {
        base: Some(MsgBase::new(MsgType::Insert)),
        db_name: String::new(),
        collection_name: collection_name.to_string(),
        partition_name: partition_name.unwrap_or_default().to_string(),
        fields_data,
        hash_keys: Vec::new(),
        num_rows,
    })
}

/// A scalar-filtered entity query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityQuery {
    pub collection_name: String,
    pub expr: String,
    pub output_fields: Vec<String>,
    pub partition_names: Vec<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub fn build_query_request(query: &EntityQuery) -> Result<QueryRequest> {
    if query.collection_name.trim().is_empty() {
        return Err(ValidationError::MissingRequiredField("collection_name").into());
    }

    let mut query_params = Vec::new();
    if let Some(limit) = query.limit {
        query_params.push(KeyValuePair::new("limit", limit.to_string()));
    }
    if let Some(offset) = query.offset {
        query_params.push(KeyValuePair::new("offset", offset.to_string()));
    }

    Ok(QueryRequest {
        base: Some(MsgBase::new(MsgType::Retrieve)),
        db_name: String::new(),
        collection_name: query.collection_name.clone(),
        expr: query.expr.clone(),
        output_fields: query.output_fields.clone(),
        partition_names: query.partition_names.clone(),
        travel_timestamp: 0,
        guarantee_timestamp: 0,
        query_params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{CodecError, SchemaError};
    use crate::core::types::FieldType;
    use crate::proto::common::{ErrorCode, Status};
    use crate::proto::schema::{self as wire, CollectionSchema, DataType};
    use serde_json::json;

    fn wire_field(name: &str, data_type: DataType, dim: Option<&str>) -> wire::FieldSchema {
        wire::FieldSchema {
            name: name.to_string(),
            data_type: data_type as i32,
            type_params: dim
                .map(|d| vec![KeyValuePair::new("dim", d)])
                .unwrap_or_default(),
            ..Default::default()
        }
    }

    #[test]
    fn test_fields_from_describe() {
        let mut pk = wire_field("pk", DataType::Int64, None);
        pk.is_primary_key = true;
        pk.auto_id = true;
        let response = DescribeCollectionResponse {
            status: Some(Status::success()),
            schema: Some(CollectionSchema {
                name: "c".to_string(),
                fields: vec![pk, wire_field("v", DataType::FloatVector, Some("8"))],
                ..Default::default()
            }),
            ..Default::default()
        };

        let fields = fields_from_describe(&response).unwrap();
        assert_eq!(fields[0], FieldSchema::new("pk", FieldType::Int64).primary_key(true));
        assert_eq!(fields[1], FieldSchema::vector("v", FieldType::FloatVector, 8));
    }

    #[test]
    fn test_unsupported_wire_type_named() {
        let response = DescribeCollectionResponse {
            schema: Some(CollectionSchema {
                fields: vec![wire_field("arr", DataType::Array, None)],
                ..Default::default()
            }),
            ..Default::default()
        };

        match fields_from_describe(&response) {
            Err(CodecError::Validation(ValidationError::UnsupportedType(name))) => {
                assert_eq!(name, "Array")
            }
            other => panic!("expected unsupported type, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_dim_param() {
        let response = DescribeCollectionResponse {
            schema: Some(CollectionSchema {
                fields: vec![wire_field("v", DataType::FloatVector, Some("wide"))],
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            fields_from_describe(&response),
            Err(CodecError::Schema(SchemaError::InvalidDimension { .. }))
        ));
    }

    #[test]
    fn test_describe_failure_status() {
        let response = DescribeCollectionResponse {
            status: Some(Status::failure(ErrorCode::CollectionNotExists, "can't find collection: c")),
            ..Default::default()
        };
        assert_eq!(
            fields_from_describe(&response).unwrap_err().to_string(),
            "can't find collection: c"
        );
    }

    #[test]
    fn test_insert_request_shape() {
        let schema = vec![
            FieldSchema::new("id", FieldType::Int64).primary_key(true),
            FieldSchema::vector("v", FieldType::FloatVector, 2),
        ];
        let rows: Vec<Row> = vec![
            json!({"v": [1.0, 2.0]}).as_object().cloned().unwrap(),
            json!({"v": [3.0, 4.0]}).as_object().cloned().unwrap(),
        ];

        let request = build_insert_request("c", Some("p1"), &rows, &schema).unwrap();
        assert_eq!(request.num_rows, 2);
        assert_eq!(request.partition_name, "p1");
        assert_eq!(request.fields_data.len(), 1);
        assert_eq!(request.fields_data[0].field_name, "v");
        assert_eq!(request.fields_data[0].r#type, DataType::FloatVector as i32);
    }

    #[test]
    fn test_insert_requires_collection() {
        let err = build_insert_request(" ", None, &[], &[]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Validation(ValidationError::MissingRequiredField("collection_name"))
        ));
    }

    #[test]
    fn test_query_params() {
        let query = EntityQuery {
            collection_name: "c".to_string(),
            expr: "id in [1, 2]".to_string(),
            output_fields: vec!["id".to_string()],
            limit: Some(10),
            ..Default::default()
        };

        let request = build_query_request(&query).unwrap();
        assert_eq!(request.expr, "id in [1, 2]");
        assert_eq!(request.query_params, vec![KeyValuePair::new("limit", "10")]);
    }
}
