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

//! Row/column codec
//!
//! Write path: [`SchemaResolver`] → [`RowEncoder`] → [`build_insert_request`].
//! Read path: [`SearchRequestBuilder`] or [`build_query_request`] on the way
//! out, [`ResultDecoder`] or [`QueryResultDecoder`] on the way back.

pub mod columns;
pub mod query_decoder;
pub mod requests;
pub mod result_decoder;
pub mod row_encoder;
pub mod schema_resolver;
pub mod search_request;
pub mod status;
pub mod vector_packer;

pub use columns::{decode_column, decode_columns, DecodedColumn};
pub use query_decoder::QueryResultDecoder;
pub use requests::{build_insert_request, build_query_request, fields_from_describe, EntityQuery};
pub use result_decoder::{
    format_score, round_decimal_from_raw, splice_hits, HitSlot, ResultDecoder, MAX_ROUND_DECIMAL,
};
pub use row_encoder::RowEncoder;
pub use schema_resolver::{FieldId, ResolvedField, ResolvedSchema, SchemaResolver};
pub use search_request::{
    PreparedSearch, SearchParams, SearchRequestBuilder, SearchShape, VectorSearch, PLACEHOLDER_TAG,
};
pub use status::ensure_status_ok;
