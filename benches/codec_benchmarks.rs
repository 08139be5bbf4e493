// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Codec benchmarks: insert encoding and search result decoding

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use milvus_codec::codec::vector_packer::pack_binary;
use milvus_codec::proto::common::Status;
use milvus_codec::proto::milvus::SearchResults;
use milvus_codec::proto::schema::{
    field_data, i_ds, scalar_field, FieldData, IDs, LongArray, ScalarField, SearchResultData,
};
use milvus_codec::{build_insert_request, FieldSchema, FieldType, ResultDecoder, Row};

const DIMENSIONS: &[u32] = &[128, 768];
const ROW_COUNTS: &[usize] = &[100, 1_000];

fn generate_rows(count: usize, dimension: u32) -> Vec<Row> {
    (0..count)
        .map(|i| {
            let vector: Vec<f32> = (0..dimension)
                .map(|d| ((i as u32 * 31 + d) % 97) as f32 / 97.0)
                .collect();
            json!({
                "title": format!("doc-{}", i),
                "meta": {"shard": i % 8},
                "embedding": vector,
            })
            .as_object()
            .cloned()
            .unwrap_or_default()
        })
        .collect()
}

fn benchmark_insert_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_encoding");

    for &dimension in DIMENSIONS {
        let schema = vec![
            FieldSchema::new("id", FieldType::Int64).primary_key(true),
            FieldSchema::new("title", FieldType::VarChar),
            FieldSchema::new("meta", FieldType::Json),
            FieldSchema::vector("embedding", FieldType::FloatVector, dimension),
        ];
        for &count in ROW_COUNTS {
            let rows = generate_rows(count, dimension);
            group.throughput(Throughput::Elements(count as u64));
            group.bench_with_input(
                BenchmarkId::new("encode", format!("{}x{}", count, dimension)),
                &rows,
                |b, rows| {
                    b.iter(|| build_insert_request("bench", None, black_box(rows), &schema));
                },
            );
        }
    }

    group.finish();
}

fn search_response(queries: usize, topk: usize) -> SearchResults {
    let hits = queries * topk;
    SearchResults {
        status: Some(Status::success()),
        results: Some(SearchResultData {
            num_queries: queries as i64,
            top_k: topk as i64,
            fields_data: vec![FieldData {
                r#type: 5,
                field_name: "rank".to_string(),
                field: Some(field_data::Field::Scalars(ScalarField {
                    data: Some(scalar_field::Data::LongData(LongArray {
                        data: (0..hits as i64).collect(),
                    })),
                })),
                field_id: 0,
            }],
            scores: (0..hits).map(|i| 1.0 / (i as f32 + 1.0)).collect(),
            ids: Some(IDs {
                id_field: Some(i_ds::IdField::IntId(LongArray {
                    data: (0..hits as i64).collect(),
                })),
            }),
            topks: vec![topk as i64; queries],
        }),
        collection_name: "bench".to_string(),
    }
}

fn benchmark_result_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("result_decoding");

    for &(queries, topk) in &[(1usize, 10usize), (16, 100)] {
        let response = search_response(queries, topk);
        group.throughput(Throughput::Elements((queries * topk) as u64));
        for round_decimal in [None, Some(4)] {
            let decoder = ResultDecoder::new(round_decimal);
            group.bench_with_input(
                BenchmarkId::new(
                    format!("decode_round_{:?}", round_decimal),
                    format!("{}x{}", queries, topk),
                ),
                &response,
                |b, response| {
                    b.iter(|| decoder.decode(black_box(response)));
                },
            );
        }
    }

    group.finish();
}

fn benchmark_binary_packing(c: &mut Criterion) {
    let bits: Vec<bool> = (0..4096).map(|i| i % 3 == 0).collect();
    c.bench_function("pack_binary_4096", |b| b.iter(|| pack_binary(black_box(&bits))));
}

criterion_group!(
    benches,
    benchmark_insert_encoding,
    benchmark_result_decoding,
    benchmark_binary_packing
);
criterion_main!(benches);
