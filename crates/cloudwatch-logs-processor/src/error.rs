// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Reasons a single input record cannot be turned into an `Ok` outcome.
///
/// These never abort an invocation; they surface as `ProcessingFailed` on the
/// affected record only.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Failed to decompress record data: {0}")]
    Decompression(#[source] std::io::Error),

    #[error("Failed to parse envelope: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),
}

/// Call-level failures reported by a delivery stream client.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryStreamError {
    #[error("Request to delivery stream failed: {0}")]
    Transport(String),

    #[error("Delivery stream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid delivery stream response: {0}")]
    InvalidResponse(String),
}

/// Invocation-level failures. Any of these fails the whole batch.
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error("Invalid delivery stream ARN: {0}")]
    InvalidDeliveryStreamArn(String),

    #[error("Could not put records after {attempts} attempts. {detail}")]
    SubmissionAttemptsExhausted { attempts: u32, detail: String },
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    MissingVariable(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ProcessorError::SubmissionAttemptsExhausted {
            attempts: 20,
            detail: "Individual error codes: ServiceUnavailableException".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Could not put records after 20 attempts. Individual error codes: ServiceUnavailableException"
        );
    }

    #[test]
    fn test_missing_variable_display() {
        let error = ConfigError::MissingVariable("DEFAULT_INDEX");
        assert_eq!(
            error.to_string(),
            "DEFAULT_INDEX environment variable is not set"
        );
    }

    #[test]
    fn test_error_debug() {
        let error = DecodeError::UnknownMessageType("SOMETHING_ELSE".to_string());
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("UnknownMessageType"));
    }
}
