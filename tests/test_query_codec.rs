/*
 * Copyright 2025 Vijaykumar Singh
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */


//! Entity queries: request assembly and decoding of captured responses

use milvus_codec::proto::common::{ErrorCode, KeyValuePair, Status};
use milvus_codec::proto::milvus::{DescribeCollectionResponse, QueryRequest, QueryResults};
use milvus_codec::proto::schema::{
    field_data, scalar_field, vector_field, CollectionSchema, DataType, FieldData, LongArray,
    ScalarField, VectorField,
};
use milvus_codec::{
    build_query_request, fields_from_describe, CodecError, DecodeError, EntityQuery,
    FieldType, QueryResultDecoder,
};
use prost::Message;
use serde_json::json;

#[test]
fn test_query_request_wire_shape() {
    let query = EntityQuery {
        collection_name: "docs".to_string(),
        expr: "id > 100".to_string(),
        output_fields: vec!["id".to_string(), "fingerprint".to_string()],
        partition_names: vec!["2024".to_string()],
        limit: Some(50),
        offset: Some(10),
    };

    let request = build_query_request(&query).unwrap();
    let received = QueryRequest::decode(request.encode_to_vec().as_slice()).unwrap();

    assert_eq!(received.collection_name, "docs");
    assert_eq!(received.expr, "id > 100");
    assert_eq!(received.partition_names, vec!["2024"]);
    assert_eq!(
        received.query_params,
        vec![KeyValuePair::new("limit", "50"), KeyValuePair::new("offset", "10")]
    );
}

#[test]
fn test_binary_vectors_decoded_per_entity() {
    let response = QueryResults {
        status: Some(Status::success()),
        fields_data: vec![
            FieldData {
                r#type: DataType::Int64 as i32,
                field_name: "id".to_string(),
                field: Some(field_data::Field::Scalars(ScalarField {
                    data: Some(scalar_field::Data::LongData(LongArray { data: vec![101, 102] })),
                })),
                field_id: 100,
            },
            FieldData {
                r#type: DataType::BinaryVector as i32,
                field_name: "fingerprint".to_string(),
                field: Some(field_data::Field::Vectors(VectorField {
                    dim: 16,
                    data: Some(vector_field::Data::BinaryVector(vec![1, 2, 3, 4])),
                })),
                field_id: 101,
            },
        ],
        collection_name: "docs".to_string(),
    };

    let rows = QueryResultDecoder::decode(&response).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["id"], json!(102));
    assert_eq!(rows[1]["fingerprint"], json!([3, 4]));
}

#[test]
fn test_ragged_vector_payload_fails() {
    let response = QueryResults {
        status: None,
        fields_data: vec![FieldData {
            r#type: DataType::BinaryVector as i32,
            field_name: "fingerprint".to_string(),
            field: Some(field_data::Field::Vectors(VectorField {
                dim: 16,
                data: Some(vector_field::Data::BinaryVector(vec![1, 2, 3])),
            })),
            field_id: 0,
        }],
        collection_name: String::new(),
    };

    assert!(matches!(
        QueryResultDecoder::decode(&response),
        Err(CodecError::Decode(DecodeError::RaggedVector { len: 3, width: 2, .. }))
    ));
}

#[test]
fn test_server_error_reason_verbatim() {
    let response = QueryResults {
        status: Some(Status::failure(
            ErrorCode::CollectionNotExists,
            "collection not found[database=default][collection=docs]",
        )),
        ..Default::default()
    };

    let err = QueryResultDecoder::decode(&response).unwrap_err();
    assert_eq!(
        err.to_string(),
        "collection not found[database=default][collection=docs]"
    );
}

#[test]
fn test_describe_feeds_encoder_schema() {
    let response = DescribeCollectionResponse {
        status: Some(Status::success()),
        schema: Some(CollectionSchema {
            name: "docs".to_string(),
            description: String::new(),
            auto_id: true,
            fields: vec![
                milvus_codec::proto::schema::FieldSchema {
                    field_id: 100,
                    name: "id".to_string(),
                    is_primary_key: true,
                    data_type: DataType::Int64 as i32,
                    auto_id: true,
                    ..Default::default()
                },
                milvus_codec::proto::schema::FieldSchema {
                    field_id: 101,
                    name: "fingerprint".to_string(),
                    data_type: DataType::BinaryVector as i32,
                    type_params: vec![KeyValuePair::new("dim", "16")],
                    ..Default::default()
                },
            ],
        }),
        collection_id: 7,
        collection_name: "docs".to_string(),
    };

    let fields = fields_from_describe(&response).unwrap();
    assert_eq!(fields.len(), 2);
    assert!(fields[0].auto_id);
    assert_eq!(fields[1].field_type, FieldType::BinaryVector);
    assert_eq!(fields[1].dimension, Some(16));
}
