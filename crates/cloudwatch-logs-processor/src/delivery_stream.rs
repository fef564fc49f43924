// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delivery stream collaborator used for reingestion.
//!
//! The only operation needed is `PutRecordBatch`. [`HttpDeliveryStreamClient`]
//! speaks the Firehose JSON 1.1 protocol; request signing is expected to be
//! handled by the endpoint it targets (a signing proxy or a Firehose-compatible
//! service).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::Config;
use crate::error::DeliveryStreamError;
use crate::event::DeliveryStreamArn;

const PUT_RECORD_BATCH_TARGET: &str = "Firehose_20150804.PutRecordBatch";
const AMZ_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Result of one entry of a `PutRecordBatch` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryResult {
    Ok,
    Failed {
        error_code: String,
        error_message: Option<String>,
    },
}

#[async_trait]
pub trait DeliveryStreamClient: Send + Sync {
    /// Submits `records` to the stream in one call.
    ///
    /// On success the returned vector has one entry per record, in order.
    /// An `Err` means the whole call failed and no record was accepted.
    async fn put_record_batch(
        &self,
        stream: &DeliveryStreamArn,
        records: &[Bytes],
    ) -> Result<Vec<EntryResult>, DeliveryStreamError>;
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PutRecordBatchRequest<'a> {
    delivery_stream_name: &'a str,
    records: Vec<RequestRecord>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RequestRecord {
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PutRecordBatchResponse {
    #[serde(default)]
    failed_put_count: u64,
    #[serde(default)]
    request_responses: Vec<ResponseEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResponseEntry {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

/// `PutRecordBatch` over HTTP with the Firehose JSON protocol.
#[derive(Debug, Clone)]
pub struct HttpDeliveryStreamClient {
    client: reqwest::Client,
    endpoint_override: Option<String>,
}

impl HttpDeliveryStreamClient {
    pub fn new(config: &Config) -> Result<Self, DeliveryStreamError> {
        let client = build_client(config.https_proxy.as_deref(), config.request_timeout())?;
        Ok(HttpDeliveryStreamClient {
            client,
            endpoint_override: config.firehose_endpoint_url.clone(),
        })
    }

    /// Regional Firehose endpoint, unless an override is configured.
    pub fn endpoint(&self, region: &str) -> String {
        match &self.endpoint_override {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://firehose.{region}.amazonaws.com"),
        }
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Amz-Target",
            HeaderValue::from_static(PUT_RECORD_BATCH_TARGET),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(AMZ_JSON_CONTENT_TYPE));
        headers
    }
}

#[async_trait]
impl DeliveryStreamClient for HttpDeliveryStreamClient {
    async fn put_record_batch(
        &self,
        stream: &DeliveryStreamArn,
        records: &[Bytes],
    ) -> Result<Vec<EntryResult>, DeliveryStreamError> {
        let body = PutRecordBatchRequest {
            delivery_stream_name: &stream.stream_name,
            records: records
                .iter()
                .map(|data| RequestRecord {
                    data: base64::engine::general_purpose::STANDARD.encode(data),
                })
                .collect(),
        };
        let body = serde_json::to_vec(&body)
            .map_err(|e| DeliveryStreamError::InvalidResponse(e.to_string()))?;

        let url = format!("{}/", self.endpoint(&stream.region));
        let time = Instant::now();
        let resp = self
            .client
            .post(&url)
            .headers(Self::headers())
            .body(body)
            .send()
            .await
            .map_err(|e| DeliveryStreamError::Transport(e.to_string()))?;
        let elapsed = time.elapsed();

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| DeliveryStreamError::Transport(e.to_string()))?;

        if !status.is_success() {
            error!(
                "REINGEST | PutRecordBatch to {} failed with status {status} after {} ms",
                stream.stream_name,
                elapsed.as_millis()
            );
            return Err(DeliveryStreamError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: PutRecordBatchResponse = serde_json::from_str(&text)
            .map_err(|e| DeliveryStreamError::InvalidResponse(e.to_string()))?;

        if parsed.request_responses.len() != records.len() {
            return Err(DeliveryStreamError::InvalidResponse(format!(
                "expected {} entries, got {}",
                records.len(),
                parsed.request_responses.len()
            )));
        }

        debug!(
            "REINGEST | PutRecordBatch of {} records to {} returned {} failures in {} ms",
            records.len(),
            stream.stream_name,
            parsed.failed_put_count,
            elapsed.as_millis()
        );

        Ok(parsed
            .request_responses
            .into_iter()
            .map(|entry| match entry.error_code {
                Some(error_code) => EntryResult::Failed {
                    error_code,
                    error_message: entry.error_message,
                },
                None => EntryResult::Ok,
            })
            .collect())
    }
}

fn build_client(
    https_proxy: Option<&str>,
    timeout: Duration,
) -> Result<reqwest::Client, DeliveryStreamError> {
    let mut builder = reqwest::Client::builder().timeout(timeout);
    if let Some(proxy) = https_proxy {
        let proxy = reqwest::Proxy::https(proxy)
            .map_err(|e| DeliveryStreamError::Transport(format!("invalid proxy: {e}")))?;
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .map_err(|e| DeliveryStreamError::Transport(e.to_string()))
}
