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

//! # milvus-codec
//!
//! Columnar data codec for a Milvus 2.x vector-database client.
//!
//! ## Key Features
//!
//! - **Insert encoding**: rows of JSON values become typed, dimension-checked
//!   column buffers, with binary vectors bit-packed MSB first
//! - **Search requests**: query vectors packed into a `$0` placeholder group
//!   with top-k, metric and extra parameters as key/value pairs
//! - **Result decoding**: flat multi-query responses spliced back into
//!   per-query hit lists, scores rounded on request
//! - **Query decoding**: column buffers transposed into one map per entity,
//!   vectors un-flattened and JSON columns parsed
//!
//! ## Example
//!
//! ```no_run
//! use milvus_codec::{build_insert_request, FieldSchema, FieldType, Row};
//!
//! let schema = vec![
//!     FieldSchema::new("id", FieldType::Int64).primary_key(true),
//!     FieldSchema::vector("embedding", FieldType::FloatVector, 2),
//! ];
//! let row: Row = serde_json::from_str(r#"{"embedding": [0.1, 0.2]}"#)?;
//! let request = build_insert_request("docs", None, &[row], &schema)?;
//! assert_eq!(request.num_rows, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
pub mod core;
pub mod proto;
pub mod services;

pub use crate::codec::{
    build_insert_request, build_query_request, fields_from_describe, EntityQuery, PreparedSearch,
    QueryResultDecoder, ResultDecoder, RowEncoder, SchemaResolver, SearchParams,
    SearchRequestBuilder, SearchShape, VectorSearch,
};
pub use crate::core::{
    CodecConfig, CodecError, ConfigError, DecodeError, FieldSchema, FieldType, FlushConfig,
    ProtocolError, QueryResultRow, Result, Row, RowId, SchemaError, SearchDefaults,
    SearchResultRow, ValidationError,
};
pub use crate::services::{
    build_flush_request, segment_ids_from_flush, FlushStateSource, FlushWaiter,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
