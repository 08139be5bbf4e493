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

//! Flush completion polling
//!
//! After a flush the server reports the sealed segment ids; the segments are
//! durable once a flush-state call answers `flushed = true`. The waiter polls
//! at a fixed interval with no attempt bound. Callers that need a deadline wrap
//! the future in `tokio::time::timeout`; dropping it stops polling.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use crate::codec::status::ensure_status_ok;
use crate::core::config::FlushConfig;
use crate::core::error::Result;
use crate::proto::common::{MsgBase, MsgType};
use crate::proto::milvus::{
    FlushRequest, FlushResponse, GetFlushStateRequest, GetFlushStateResponse,
};

/// Transport seam for the flush-state call
#[async_trait]
pub trait FlushStateSource: Send + Sync {
    async fn get_flush_state(&self, request: GetFlushStateRequest) -> Result<GetFlushStateResponse>;
}

pub fn build_flush_request(collection_names: &[String]) -> FlushRequest {
    FlushRequest {
        base: Some(MsgBase::new(MsgType::Flush)),
        db_name: String::new(),
        collection_names: collection_names.to_vec(),
    }
}

/// Segment ids sealed for `collection_name` by a flush
pub fn segment_ids_from_flush(response: &FlushResponse, collection_name: &str) -> Vec<i64> {
    response
        .coll_seg_ids
        .get(collection_name)
        .map(|ids| ids.data.clone())
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct FlushWaiter {
    poll_interval: Duration,
}

impl FlushWaiter {
    pub fn new(config: &FlushConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Poll until the segments report flushed. Returns the number of
    /// flush-state calls made.
    pub async fn wait_until_flushed<S>(&self, source: &S, segment_ids: &[i64]) -> Result<usize>
    where
        S: FlushStateSource + ?Sized,
    {
        let mut attempts = 0usize;
        loop {
            let response = source
                .get_flush_state(GetFlushStateRequest {
                    segment_ids: segment_ids.to_vec(),
                })
                .await?;
            attempts += 1;
            ensure_status_ok(response.status.as_ref())?;

            if response.flushed {
                info!(
                    "{} segments flushed after {} checks",
                    segment_ids.len(),
                    attempts
                );
                return Ok(attempts);
            }

            debug!("Segments not flushed yet, retrying in {:?}", self.poll_interval);
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
