// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Firehose data-transformation event and response.
//!
//! Firehose invokes the processor with a batch of records whose `data` field is
//! base64. The response must contain exactly one record per input record, in
//! the same order, with a `result` and (for `Ok`) the transformed `data`.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::ProcessorError;

// Base64 serialization for the required `data` field of input records
mod serde_base64_bytes {
    use base64::Engine;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Bytes, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = base64::engine::general_purpose::STANDARD.encode(value);
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(s.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}

// Base64 serialization for the optional `data` field of outcome records
mod serde_base64_option {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
                serializer.serialize_some(&encoded)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt = Option::<String>::deserialize(deserializer)?;
        opt.map(|s| {
            base64::engine::general_purpose::STANDARD
                .decode(s.as_bytes())
                .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}

/// One record handed to the processor by Firehose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputRecord {
    pub record_id: String,
    /// Gzip-compressed CloudWatch Logs envelope, already base64-decoded.
    #[serde(with = "serde_base64_bytes")]
    pub data: Bytes,
}

impl InputRecord {
    pub fn new(record_id: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            record_id: record_id.into(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordResult {
    Ok,
    Dropped,
    ProcessingFailed,
}

/// Per-record verdict returned to Firehose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecord {
    pub record_id: String,
    pub result: RecordResult,
    /// Transformed payload. Present iff `result` is [`RecordResult::Ok`].
    #[serde(
        rename = "data",
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_base64_option"
    )]
    pub payload: Option<Vec<u8>>,
}

impl OutcomeRecord {
    pub fn ok(record_id: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            record_id: record_id.into(),
            result: RecordResult::Ok,
            payload: Some(payload),
        }
    }

    pub fn dropped(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            result: RecordResult::Dropped,
            payload: None,
        }
    }

    pub fn processing_failed(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            result: RecordResult::ProcessingFailed,
            payload: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result == RecordResult::Ok
    }

    /// Bytes this record adds to the response: its id plus the base64 length
    /// of its payload. Zero unless the record is `Ok`.
    pub fn projected_size(&self) -> usize {
        match (&self.result, &self.payload) {
            (RecordResult::Ok, Some(payload)) => {
                let encoded = base64::encoded_len(payload.len(), true).unwrap_or(usize::MAX);
                self.record_id.len().saturating_add(encoded)
            }
            (RecordResult::Ok, None) => self.record_id.len(),
            _ => 0,
        }
    }

    /// Turns an `Ok` record into `Dropped`, discarding its payload.
    pub fn demote(&mut self) {
        self.result = RecordResult::Dropped;
        self.payload = None;
    }
}

/// Invocation payload sent by Firehose to a data-transformation function.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<String>,
    pub delivery_stream_arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub records: Vec<InputRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationResponse {
    pub records: Vec<OutcomeRecord>,
}

/// Region and name of a delivery stream, parsed from its ARN.
///
/// `arn:aws:firehose:us-east-1:123456789012:deliverystream/my-stream`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryStreamArn {
    pub region: String,
    pub stream_name: String,
}

impl DeliveryStreamArn {
    pub fn parse(arn: &str) -> Result<Self, ProcessorError> {
        let region = arn.split(':').nth(3).unwrap_or_default();
        let stream_name = arn.split('/').nth(1).unwrap_or_default();

        if region.is_empty() || stream_name.is_empty() {
            return Err(ProcessorError::InvalidDeliveryStreamArn(arn.to_string()));
        }

        Ok(Self {
            region: region.to_string(),
            stream_name: stream_name.to_string(),
        })
    }
}
