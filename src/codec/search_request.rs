// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Search request assembly
//!
//! Accepts either fully formed search parameters plus a batch of query vectors,
//! or a single vector with individual knobs that are completed from
//! [`SearchDefaults`]. Query vectors are packed into a placeholder group under
//! the tag `$0` using the encoding of the collection's vector field.

use prost::Message;
use serde_json::Value;
use tracing::debug;

use crate::codec::result_decoder::{round_decimal_from_raw, ResultDecoder};
use crate::codec::vector_packer::{bits_from_values, float_vector_bytes, pack_binary, pack_float};
use crate::core::config::SearchDefaults;
use crate::core::error::{Result, SchemaError, ValidationError};
use crate::core::types::{FieldSchema, FieldType};
use crate::proto::common::{DslType, KeyValuePair, MsgBase, MsgType, PlaceholderGroup, PlaceholderType, PlaceholderValue};
use crate::proto::milvus::SearchRequest;

pub const PLACEHOLDER_TAG: &str = "$0";

/// Fully formed search parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    /// Vector field to search; empty selects the collection's first vector field
    pub anns_field: String,
    pub topk: i64,
    pub metric_type: String,
    /// Index-specific parameters as a JSON object string, e.g. `{"nprobe":10}`
    pub params: String,
    pub offset: i64,
    pub round_decimal: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchShape {
    Explicit {
        search_params: SearchParams,
        vectors: Vec<Vec<f32>>,
    },
    Simple {
        vector: Vec<f32>,
        limit: Option<i64>,
        offset: Option<i64>,
        metric_type: Option<String>,
        params: Option<serde_json::Map<String, Value>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorSearch {
    pub collection_name: String,
    pub partition_names: Vec<String>,
    /// Defaults to every non-vector field of the collection
    pub output_fields: Option<Vec<String>>,
    /// Boolean filter expression
    pub filter: Option<String>,
    /// Defaults to the number of query vectors
    pub nq: Option<i64>,
    pub shape: SearchShape,
}

impl VectorSearch {
    pub fn simple(collection_name: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            collection_name: collection_name.into(),
            partition_names: Vec::new(),
            output_fields: None,
            filter: None,
            nq: None,
            shape: SearchShape::Simple {
                vector,
                limit: None,
                offset: None,
                metric_type: None,
                params: None,
            },
        }
    }

    pub fn explicit(
        collection_name: impl Into<String>,
        search_params: SearchParams,
        vectors: Vec<Vec<f32>>,
    ) -> Self {
        Self {
            shape: SearchShape::Explicit { search_params, vectors },
            ..Self::simple(collection_name, Vec::new())
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_output_fields(mut self, fields: Vec<String>) -> Self {
        self.output_fields = Some(fields);
        self
    }

    pub fn with_partitions(mut self, partitions: Vec<String>) -> Self {
        self.partition_names = partitions;
        self
    }
}

/// A search ready for the transport, plus what the decoder needs afterwards
#[derive(Debug, Clone)]
pub struct PreparedSearch {
    pub request: SearchRequest,
    pub output_fields: Vec<String>,
    pub vector_field: String,
    pub vector_type: FieldType,
    /// Decimal places scores are rounded to; `None` keeps raw scores
    pub round_decimal: Option<u32>,
}

impl PreparedSearch {
    pub fn decoder(&self) -> ResultDecoder {
        ResultDecoder::new(self.round_decimal).with_output_fields(self.output_fields.clone())
    }
}

pub struct SearchRequestBuilder {
    defaults: SearchDefaults,
}

impl SearchRequestBuilder {
    pub fn new(defaults: SearchDefaults) -> Self {
        Self { defaults }
    }

    pub fn build(&self, schema: &[FieldSchema], search: &VectorSearch) -> Result<PreparedSearch> {
        if search.collection_name.trim().is_empty() {
            return Err(ValidationError::MissingRequiredField("collection_name").into());
        }

        let requested_field = match &search.shape {
            SearchShape::Explicit { search_params, .. } if !search_params.anns_field.is_empty() => {
                Some(search_params.anns_field.as_str())
            }
            _ => None,
        };
        let vector_field = match requested_field {
            Some(name) => schema
                .iter()
                .find(|f| f.field_type.is_vector() && f.name == name)
                .ok_or_else(|| ValidationError::NotAVectorField(name.to_string()))?,
            None => schema
                .iter()
                .find(|f| f.field_type.is_vector())
                .ok_or(ValidationError::MissingVectorField)?,
        };
        let dimension = vector_field.dimension.ok_or_else(|| SchemaError::MissingDimension {
            field: vector_field.name.clone(),
        })? as usize;

        let output_fields = search.output_fields.clone().unwrap_or_else(|| {
            schema
                .iter()
                .filter(|f| !f.field_type.is_vector())
                .map(|f| f.name.clone())
                .collect()
        });

        let (params, vectors) = match &search.shape {
            SearchShape::Explicit { search_params, vectors } => {
                let mut params = search_params.clone();
                params.anns_field = vector_field.name.clone();
                (params, vectors.iter().map(Vec::as_slice).collect::<Vec<_>>())
            }
            SearchShape::Simple { vector, limit, offset, metric_type, params } => {
                let extra = params.clone().unwrap_or_default();
                let synthesized = SearchParams {
                    anns_field: vector_field.name.clone(),
                    topk: limit.unwrap_or(self.defaults.default_topk),
                    metric_type: metric_type
                        .clone()
                        .unwrap_or_else(|| self.defaults.default_metric_type.clone()),
                    params: Value::Object(extra).to_string(),
                    offset: offset.unwrap_or(self.defaults.default_offset),
                    round_decimal: None,
                };
                (synthesized, vec![vector.as_slice()])
            }
        };
        if vectors.is_empty() || vectors.iter().all(|v| v.is_empty()) {
            return Err(ValidationError::NoQueryVectors.into());
        }
        let nq = search.nq.unwrap_or(vectors.len() as i64);
        if usize::try_from(nq).ok() != Some(vectors.len()) {
            return Err(ValidationError::QueryCountMismatch {
                nq,
                vectors: vectors.len(),
            }
            .into());
        }

        let values = vectors
            .iter()
            .enumerate()
            .map(|(index, vector)| encode_query_vector(index, vector_field, dimension, vector))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let placeholder_type = match vector_field.field_type {
            FieldType::BinaryVector => PlaceholderType::BinaryVector,
            _ => PlaceholderType::FloatVector,
        };
        let placeholder_group = PlaceholderGroup {
            placeholders: vec![PlaceholderValue {
                tag: PLACEHOLDER_TAG.to_string(),
                r#type: placeholder_type as i32,
                values,
            }],
        }
        .encode_to_vec();

        let round_decimal = resolve_round_decimal(&search.shape)?;

        let search_params = vec![
            KeyValuePair::new("anns_field", params.anns_field.clone()),
            KeyValuePair::new("topk", params.topk.to_string()),
            KeyValuePair::new("metric_type", params.metric_type.clone()),
            KeyValuePair::new("params", params.params.clone()),
            KeyValuePair::new("offset", params.offset.to_string()),
            KeyValuePair::new(
                "round_decimal",
                round_decimal.map_or(-1, i64::from).to_string(),
            ),
        ];

        debug!(
            "Prepared search on '{}' field '{}': nq={}, topk={}, metric={}",
            search.collection_name, vector_field.name, nq, params.topk, params.metric_type
        );

        Ok(PreparedSearch {
            request: SearchRequest {
                base: Some(MsgBase::new(MsgType::Search)),
                db_name: String::new(),
                collection_name: search.collection_name.clone(),
                partition_names: search.partition_names.clone(),
                dsl: search.filter.clone().unwrap_or_default(),
                placeholder_group,
                dsl_type: DslType::BoolExprV1 as i32,
                output_fields: output_fields.clone(),
                search_params,
                travel_timestamp: 0,
                guarantee_timestamp: 0,
                nq,
            },
            output_fields,
            vector_field: vector_field.name.clone(),
            vector_type: vector_field.field_type,
            round_decimal,
        })
    }
}

/// Pack one query vector for the placeholder group.
///
/// Binary fields accept either one 0/1 value per dimension (bit-packed here) or
/// `dim / 8` already packed bytes.
fn encode_query_vector(
    index: usize,
    field: &FieldSchema,
    dimension: usize,
    vector: &[f32],
) -> std::result::Result<Vec<u8>, ValidationError> {
    match field.field_type {
        FieldType::BinaryVector if vector.len() == dimension => {
            Ok(pack_binary(&bits_from_values(vector)))
        }
        FieldType::BinaryVector if vector.len() == dimension / 8 => vector
            .iter()
            .map(|v| (v.fract() == 0.0 && (0.0..=255.0).contains(v)).then_some(*v as u8))
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| ValidationError::InvalidValue {
                row: index,
                field: field.name.clone(),
                expected: "bytes in 0..=255",
            }),
        FieldType::BinaryVector => Err(ValidationError::DimensionMismatch {
            row: index,
            field: field.name.clone(),
            expected: dimension / 8,
            actual: vector.len(),
        }),
        _ if vector.len() != dimension => Err(ValidationError::DimensionMismatch {
            row: index,
            field: field.name.clone(),
            expected: dimension,
            actual: vector.len(),
        }),
        _ => Ok(float_vector_bytes(&pack_float(vector))),
    }
}

/// Explicit `round_decimal` wins over the one carried in the params object.
// TODO: collapse to a single source once callers stop passing round_decimal inside params.
fn resolve_round_decimal(shape: &SearchShape) -> std::result::Result<Option<u32>, ValidationError> {
    let raw = match shape {
        SearchShape::Explicit { search_params, .. } => search_params.round_decimal.or_else(|| {
            serde_json::from_str::<Value>(&search_params.params)
                .ok()
                .and_then(|params| params.get("round_decimal").and_then(Value::as_i64))
        }),
        SearchShape::Simple { params, .. } => params
            .as_ref()
            .and_then(|params| params.get("round_decimal"))
            .and_then(Value::as_i64),
    };
    raw.map_or(Ok(None), round_decimal_from_raw)
}
