//! milvus-codec - inspect what the codec puts on and takes off the wire

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prost::Message;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use milvus_codec::codec::result_decoder::round_decimal_from_raw;
use milvus_codec::proto::milvus::{QueryResults, SearchResults};
use milvus_codec::{
    build_insert_request, CodecConfig, FieldSchema, QueryResultDecoder, ResultDecoder, Row,
    SearchRequestBuilder, SearchShape, VectorSearch,
};

#[derive(Parser)]
#[command(name = "milvus-codec")]
#[command(about = "Encode rows and decode captured Milvus payloads")]
struct Cli {
    /// Codec configuration; defaults apply when the file does not exist
    #[arg(short, long, default_value = "codec.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a JSON array of rows into an insert request
    Encode {
        /// JSON array of field schemas
        #[arg(short, long)]
        schema: PathBuf,
        /// JSON array of row objects
        #[arg(short, long)]
        rows: PathBuf,
        #[arg(long)]
        collection: String,
        #[arg(short, long)]
        partition: Option<String>,
        /// Write the encoded request bytes here
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Build a single-vector search request
    Search {
        #[arg(short, long)]
        schema: PathBuf,
        #[arg(long)]
        collection: String,
        /// JSON array of floats
        #[arg(short, long)]
        vector: String,
        #[arg(short, long)]
        limit: Option<i64>,
        #[arg(long)]
        filter: Option<String>,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Decode captured QueryResults bytes into rows
    DecodeQuery {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Decode captured SearchResults bytes into hits
    DecodeSearch {
        #[arg(short, long)]
        input: PathBuf,
        /// Decimal places for scores, -1 keeps raw scores
        #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
        round_decimal: i64,
        #[arg(long = "output-field")]
        output_fields: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        CodecConfig::from_file(&cli.config)
            .with_context(|| format!("Failed to load config from {}", cli.config.display()))?
    } else {
        info!("Configuration file not found, using defaults");
        CodecConfig::default()
    };

    match cli.command {
        Commands::Encode {
            schema,
            rows,
            collection,
            partition,
            out,
        } => {
            let schema: Vec<FieldSchema> = read_json(&schema)?;
            let rows: Vec<Row> = read_json(&rows)?;
            let request = build_insert_request(&collection, partition.as_deref(), &rows, &schema)
                .context("Failed to encode rows")?;

            let columns: Vec<_> = request
                .fields_data
                .iter()
                .map(|field| json!({"name": field.field_name, "type": field.r#type}))
                .collect();
            let bytes = request.encode_to_vec();
            write_output(out.as_deref(), &bytes)?;
            print_json(&json!({
                "collection": request.collection_name,
                "partition": request.partition_name,
                "num_rows": request.num_rows,
                "columns": columns,
                "encoded_bytes": bytes.len(),
            }))?;
        }
        Commands::Search {
            schema,
            collection,
            vector,
            limit,
            filter,
            out,
        } => {
            let schema: Vec<FieldSchema> = read_json(&schema)?;
            let vector: Vec<f32> =
                serde_json::from_str(&vector).context("Query vector must be a JSON array of numbers")?;

            let mut search = VectorSearch::simple(collection, vector);
            if let SearchShape::Simple { limit: slot, .. } = &mut search.shape {
                *slot = limit;
            }
            if let Some(filter) = filter {
                search = search.with_filter(filter);
            }

            let prepared = SearchRequestBuilder::new(config.search.clone())
                .build(&schema, &search)
                .context("Failed to build search request")?;
            let bytes = prepared.request.encode_to_vec();
            write_output(out.as_deref(), &bytes)?;

            let params: serde_json::Map<_, _> = prepared
                .request
                .search_params
                .iter()
                .map(|kv| (kv.key.clone(), json!(kv.value)))
                .collect();
            print_json(&json!({
                "collection": prepared.request.collection_name,
                "anns_field": prepared.vector_field,
                "nq": prepared.request.nq,
                "dsl": prepared.request.dsl,
                "output_fields": prepared.output_fields,
                "search_params": params,
                "encoded_bytes": bytes.len(),
            }))?;
        }
        Commands::DecodeQuery { input } => {
            let bytes = read_bytes(&input)?;
            let response = QueryResults::decode(bytes.as_slice())
                .context("Input is not an encoded QueryResults message")?;
            let rows = QueryResultDecoder::decode(&response)?;
            print_json(&serde_json::to_value(rows)?)?;
        }
        Commands::DecodeSearch {
            input,
            round_decimal,
            output_fields,
        } => {
            let bytes = read_bytes(&input)?;
            let response = SearchResults::decode(bytes.as_slice())
                .context("Input is not an encoded SearchResults message")?;
            let round_decimal =
                round_decimal_from_raw(round_decimal).context("Invalid --round-decimal")?;
            let hits = ResultDecoder::new(round_decimal)
                .with_output_fields(output_fields)
                .decode(&response)?;

            let grouped: Vec<_> = hits
                .iter()
                .map(|hit| {
                    json!({
                        "query": hit.query_index,
                        "rank": hit.rank,
                        "hit": hit,
                    })
                })
                .collect();
            print_json(&json!(grouped))?;
        }
    }

    Ok(())
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = read_bytes(path)?;
    serde_json::from_slice(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    if let Some(path) = path {
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {} bytes to {}", bytes.len(), path.display());
    }
    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_round_decimal_accepted() {
        let cli = Cli::try_parse_from([
            "milvus-codec",
            "decode-search",
            "--input",
            "hits.bin",
            "--round-decimal",
            "-1",
        ])
        .unwrap();

        match cli.command {
            Commands::DecodeSearch { round_decimal, .. } => {
                assert_eq!(round_decimal, -1);
                assert_eq!(round_decimal_from_raw(round_decimal).unwrap(), None);
            }
            _ => panic!("expected decode-search"),
        }
    }

    #[test]
    fn test_round_decimal_defaults_to_raw_scores() {
        let cli = Cli::try_parse_from(["milvus-codec", "decode-search", "--input", "hits.bin"]).unwrap();
        assert!(matches!(cli.command, Commands::DecodeSearch { round_decimal: -1, .. }));
    }
}
