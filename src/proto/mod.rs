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

//! Protocol buffer definitions for the Milvus wire protocol
//!
//! Only the messages the codec produces or consumes are declared here. Field
//! numbers follow `common.proto`, `schema.proto` and `milvus.proto` of the
//! Milvus 2.x API so the encoded bytes are interchangeable with the server's.

pub mod common;
pub mod milvus;
pub mod schema;
