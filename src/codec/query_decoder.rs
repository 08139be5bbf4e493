// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Query response decoding: columns transposed into one map per entity

use tracing::debug;

use crate::codec::columns::decode_columns;
use crate::codec::status::ensure_status_ok;
use crate::core::error::{DecodeError, Result};
use crate::core::types::QueryResultRow;
use crate::proto::milvus::QueryResults;

pub struct QueryResultDecoder;

impl QueryResultDecoder {
    pub fn decode(response: &QueryResults) -> Result<Vec<QueryResultRow>> {
        ensure_status_ok(response.status.as_ref())?;

        let columns = decode_columns(&response.fields_data)?;
        let entity_count = columns.iter().map(|c| c.len()).max().unwrap_or(0);
        if let Some(short) = columns.iter().find(|c| c.len() < entity_count) {
            return Err(DecodeError::ColumnTooShort {
                field: short.name.clone(),
                index: short.len(),
            }
            .into());
        }

        let mut rows: Vec<QueryResultRow> = (0..entity_count)
            .map(|_| QueryResultRow::with_capacity(columns.len()))
            .collect();
        for column in columns {
            for (row, value) in rows.iter_mut().zip(column.values) {
                row.insert(column.name.clone(), value);
            }
        }

        debug!(
            "Decoded {} entities from {} columns",
            rows.len(),
            response.fields_data.len()
        );
        Ok(rows)
    }
}
