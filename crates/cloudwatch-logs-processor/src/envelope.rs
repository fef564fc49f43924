// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Decoding of CloudWatch Logs subscription envelopes.
//!
//! CloudWatch Logs delivers gzip-compressed JSON documents of this shape:
//!
//! ```json
//! {
//!   "messageType": "DATA_MESSAGE",
//!   "owner": "123456789012",
//!   "logGroup": "log_group_name",
//!   "logStream": "log_stream_name",
//!   "subscriptionFilters": ["subscription_filter_name"],
//!   "logEvents": [
//!     {"id": "0123...", "timestamp": 1510109208016, "message": "log message 1"}
//!   ]
//! }
//! ```
//!
//! `CONTROL_MESSAGE` envelopes are sent to check that the subscription is
//! reachable and carry no log events.

use std::io::Read;

use flate2::read::GzDecoder;
use serde::{Deserialize, Deserializer};

use crate::error::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum MessageType {
    Data,
    Control,
    Other(String),
}

impl From<String> for MessageType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "DATA_MESSAGE" => MessageType::Data,
            "CONTROL_MESSAGE" => MessageType::Control,
            _ => MessageType::Other(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    #[serde(default)]
    pub id: String,
    pub timestamp: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub message_type: MessageType,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub log_group: String,
    #[serde(default)]
    pub log_stream: String,
    /// `null` and a missing field both read as no filters.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub subscription_filters: Vec<String>,
    #[serde(default)]
    pub log_events: Vec<LogEvent>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Classification of one decoded input record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Liveness probe from CloudWatch Logs, no log content.
    Control,
    Data(Envelope),
}

/// Gunzips and parses one record's data.
///
/// Message types other than `DATA_MESSAGE` and `CONTROL_MESSAGE` are reported
/// as [`DecodeError::UnknownMessageType`].
pub fn decode(data: &[u8]) -> Result<Decoded, DecodeError> {
    let decompressed = gunzip(data)?;
    let envelope: Envelope = serde_json::from_slice(&decompressed).map_err(DecodeError::Parse)?;

    match envelope.message_type {
        MessageType::Control => Ok(Decoded::Control),
        MessageType::Data => Ok(Decoded::Data(envelope)),
        MessageType::Other(other) => Err(DecodeError::UnknownMessageType(other)),
    }
}

fn gunzip(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(DecodeError::Decompression)?;
    Ok(decompressed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_decode_data_message() {
        let data = gzip(
            br#"{
                "messageType": "DATA_MESSAGE",
                "owner": "123456789012",
                "logGroup": "/aws/lambda/checkout",
                "logStream": "2024/01/01/[$LATEST]abc",
                "subscriptionFilters": ["splunk-prod"],
                "logEvents": [
                    {"id": "1", "timestamp": 1510109208016, "message": "log message 1"},
                    {"id": "2", "timestamp": 1510109208017, "message": "log message 2"}
                ]
            }"#,
        );

        let Decoded::Data(envelope) = decode(&data).unwrap() else {
            panic!("expected a data envelope");
        };
        assert_eq!(envelope.log_group, "/aws/lambda/checkout");
        assert_eq!(envelope.subscription_filters, vec!["splunk-prod"]);
        assert_eq!(envelope.log_events.len(), 2);
        assert_eq!(envelope.log_events[1].timestamp, 1510109208017);
        assert_eq!(envelope.log_events[1].message, "log message 2");
    }

    #[test]
    fn test_decode_control_message() {
        let data = gzip(
            br#"{"messageType": "CONTROL_MESSAGE", "owner": "CloudwatchLogs", "logGroup": "", "logStream": "", "subscriptionFilters": [], "logEvents": [{"id": "", "timestamp": 1432826855000, "message": "CWL CONTROL MESSAGE: Checking health of destination Kinesis stream."}]}"#,
        );

        assert_eq!(decode(&data).unwrap(), Decoded::Control);
    }

    #[test]
    fn test_decode_null_subscription_filters() {
        let data = gzip(
            br#"{"messageType": "DATA_MESSAGE", "logGroup": "g", "subscriptionFilters": null, "logEvents": [{"id": "1", "timestamp": 1, "message": "m"}]}"#,
        );

        let Decoded::Data(envelope) = decode(&data).unwrap() else {
            panic!("expected a data envelope");
        };
        assert!(envelope.subscription_filters.is_empty());
        assert_eq!(envelope.log_events.len(), 1);
    }

    #[test]
    fn test_decode_unknown_message_type() {
        let data = gzip(br#"{"messageType": "HEARTBEAT", "logEvents": []}"#);

        match decode(&data) {
            Err(DecodeError::UnknownMessageType(message_type)) => {
                assert_eq!(message_type, "HEARTBEAT");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_decode_not_gzip() {
        let result = decode(b"definitely not gzip");
        assert!(matches!(result, Err(DecodeError::Decompression(_))));
    }

    #[test]
    fn test_decode_invalid_json() {
        let data = gzip(b"{\"messageType\": ");
        assert!(matches!(decode(&data), Err(DecodeError::Parse(_))));
    }

    #[test]
    fn test_decode_missing_message_type() {
        let data = gzip(br#"{"logEvents": []}"#);
        assert!(matches!(decode(&data), Err(DecodeError::Parse(_))));
    }
}
