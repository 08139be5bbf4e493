// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Search response decoding
//!
//! A multi-query search comes back as parallel flat arrays: `topks` holds the
//! hit count of each query, `scores` holds every query's scores back to back,
//! and ids plus output columns are flattened the same way. [`splice_hits`]
//! walks the top-k counts with a single absolute cursor so every hit knows
//! which query it answers, its rank, and where its id and fields live.

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::codec::columns::{decode_columns, DecodedColumn};
use crate::codec::status::ensure_status_ok;
use crate::core::error::{DecodeError, Result, ValidationError};
use crate::core::types::{RowId, SearchResultRow};
use crate::proto::milvus::SearchResults;
use crate::proto::schema::{i_ds, IDs};

/// Location of one hit inside the flat response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitSlot {
    pub query: usize,
    pub rank: usize,
    /// Absolute index into ids and field columns
    pub cursor: usize,
    pub score: f32,
}

/// Assign each score to its query and rank.
///
/// Scores are consumed front to back as a queue, `topks[q]` at a time; the
/// cursor only ever increases, so hit `i` of query `q` sits at
/// `topks[..q].sum() + i`.
pub fn splice_hits(topks: &[i64], scores: &[f32]) -> std::result::Result<Vec<HitSlot>, DecodeError> {
    let mut expected = 0usize;
    for (query, &topk) in topks.iter().enumerate() {
        expected = usize::try_from(topk)
            .ok()
            .and_then(|k| expected.checked_add(k))
            .ok_or(DecodeError::InvalidTopK { query, topk })?;
    }
    if expected > scores.len() {
        return Err(DecodeError::TruncatedScores {
            expected,
            actual: scores.len(),
        });
    }

    let mut queue = scores.iter().copied();
    let mut cursor = 0usize;
    let mut hits = Vec::with_capacity(expected);
    for (query, &topk) in topks.iter().enumerate() {
        for rank in 0..topk as usize {
            let score = queue.next().ok_or(DecodeError::TruncatedScores {
                expected,
                actual: scores.len(),
            })?;
            hits.push(HitSlot { query, rank, cursor, score });
            cursor += 1;
        }
    }
    Ok(hits)
}

/// Most decimal places the server accepts for `round_decimal`
pub const MAX_ROUND_DECIMAL: u32 = 6;

/// Round a wire score to `round_decimal` places, or pass it through untouched.
///
/// Rounding goes through the decimal rendering so single-precision noise such
/// as `3.142000047683716` comes back as `3.142`. Places are capped at
/// [`MAX_ROUND_DECIMAL`].
pub fn format_score(raw: f32, round_decimal: Option<u32>) -> f64 {
    let score = f64::from(raw);
    match round_decimal {
        Some(decimals) => format!("{:.*}", decimals.min(MAX_ROUND_DECIMAL) as usize, score)
            .parse()
            .unwrap_or(score),
        None => score,
    }
}

/// `-1` (or any negative value) disables rounding; above
/// [`MAX_ROUND_DECIMAL`] is rejected.
pub fn round_decimal_from_raw(raw: i64) -> std::result::Result<Option<u32>, ValidationError> {
    match u32::try_from(raw) {
        Err(_) => Ok(None),
        Ok(decimals) if decimals <= MAX_ROUND_DECIMAL => Ok(Some(decimals)),
        Ok(_) => Err(ValidationError::InvalidRoundDecimal {
            value: raw,
            max: MAX_ROUND_DECIMAL,
        }),
    }
}

enum IdColumn<'a> {
    Int(&'a [i64]),
    Str(&'a [String]),
}

impl<'a> IdColumn<'a> {
    fn from_wire(ids: Option<&'a IDs>) -> std::result::Result<Self, DecodeError> {
        match ids.and_then(|ids| ids.id_field.as_ref()) {
            Some(i_ds::IdField::IntId(longs)) => Ok(IdColumn::Int(&longs.data)),
            Some(i_ds::IdField::StrId(strings)) => Ok(IdColumn::Str(&strings.data)),
            None => Err(DecodeError::MissingIds),
        }
    }

    fn id_at(&self, index: usize) -> std::result::Result<RowId, DecodeError> {
        let id = match self {
            IdColumn::Int(ids) => ids.get(index).map(|id| RowId::Int(*id)),
            IdColumn::Str(ids) => ids.get(index).map(|id| RowId::Str(id.clone())),
        };
        id.ok_or_else(|| DecodeError::ColumnTooShort {
            field: "ids".to_string(),
            index,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultDecoder {
    round_decimal: Option<u32>,
    output_fields: Vec<String>,
}

impl ResultDecoder {
    pub fn new(round_decimal: Option<u32>) -> Self {
        Self {
            round_decimal,
            output_fields: Vec::new(),
        }
    }

    /// Project only these columns; empty projects every returned column.
    pub fn with_output_fields(mut self, output_fields: Vec<String>) -> Self {
        self.output_fields = output_fields;
        self
    }

    pub fn decode(&self, response: &SearchResults) -> Result<Vec<SearchResultRow>> {
        ensure_status_ok(response.status.as_ref())?;

        let data = match &response.results {
            Some(data) if !data.scores.is_empty() => data,
            _ => return Ok(Vec::new()),
        };

        let hits = splice_hits(&data.topks, &data.scores)?;
        if hits.len() < data.scores.len() {
            warn!(
                "Search response holds {} scores but top-k counts cover {}",
                data.scores.len(),
                hits.len()
            );
        }

        let ids = IdColumn::from_wire(data.ids.as_ref())?;
        let columns = self.projected_columns(decode_columns(&data.fields_data)?);

        let mut rows = Vec::with_capacity(hits.len());
        for hit in &hits {
            let mut fields = serde_json::Map::with_capacity(columns.len());
            for column in &columns {
                fields.insert(column.name.clone(), column.value_at(hit.cursor)?.clone());
            }
            rows.push(SearchResultRow {
                score: format_score(hit.score, self.round_decimal),
                id: ids.id_at(hit.cursor)?,
                fields,
                query_index: hit.query,
                rank: hit.rank,
            });
        }

        debug!(
            "Decoded {} hits across {} queries",
            rows.len(),
            data.topks.len()
        );
        Ok(rows)
    }

    fn projected_columns(&self, columns: Vec<DecodedColumn>) -> Vec<DecodedColumn> {
        if self.output_fields.is_empty() {
            return columns;
        }
        let wanted: HashSet<&str> = self.output_fields.iter().map(String::as_str).collect();
        columns
            .into_iter()
            .filter(|column| wanted.contains(column.name.as_str()))
            .collect()
    }
}
