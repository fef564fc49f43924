// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Builders for CloudWatch Logs envelopes and Firehose events

#![allow(dead_code)]

use std::io::Write;

use cloudwatch_logs_processor::event::{InputRecord, TransformationEvent};
use flate2::write::GzEncoder;
use flate2::Compression;

pub const STREAM_ARN: &str = "arn:aws:firehose:us-east-1:123456789012:deliverystream/splunk-logs";

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Compressed `DATA_MESSAGE` envelope carrying one log event per message.
pub fn data_envelope(log_group: &str, filter: &str, messages: &[&str]) -> Vec<u8> {
    let log_events: Vec<serde_json::Value> = messages
        .iter()
        .enumerate()
        .map(|(i, message)| {
            serde_json::json!({
                "id": format!("event-{i}"),
                "timestamp": 1_700_000_000_000_i64 + i as i64,
                "message": message,
            })
        })
        .collect();
    let envelope = serde_json::json!({
        "messageType": "DATA_MESSAGE",
        "owner": "123456789012",
        "logGroup": log_group,
        "logStream": "stream-1",
        "subscriptionFilters": [filter],
        "logEvents": log_events,
    });
    gzip(envelope.to_string().as_bytes())
}

pub fn control_envelope() -> Vec<u8> {
    gzip(
        br#"{"messageType":"CONTROL_MESSAGE","owner":"CloudwatchLogs","logGroup":"","logStream":"","subscriptionFilters":[],"logEvents":[{"id":"","timestamp":1,"message":"CWL CONTROL MESSAGE: Checking health of destination Firehose."}]}"#,
    )
}

pub fn event(records: Vec<InputRecord>) -> TransformationEvent {
    TransformationEvent {
        invocation_id: Some("invocation-1".to_string()),
        delivery_stream_arn: STREAM_ARN.to_string(),
        region: Some("us-east-1".to_string()),
        records,
    }
}
