// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Limits imposed by Firehose on transformation responses and reingestion.

/// Maximum projected size of the transformation response in bytes.
///
/// Firehose rejects Lambda responses larger than 6MiB (6,291,456 bytes). The
/// projection only counts record ids and encoded payloads, so the budget is
/// kept at 6,000,000 to leave room for the JSON framing around them.
pub const MAX_RESPONSE_SIZE_BYTES: usize = 6_000_000;

/// Maximum number of records accepted by a single `PutRecordBatch` call.
pub const MAX_PUT_RECORD_BATCH_ENTRIES: usize = 500;

/// Maximum number of `PutRecordBatch` attempts for one reingestion group.
pub const MAX_SUBMISSION_ATTEMPTS: u32 = 20;

/// Base delay between reingestion attempts, in milliseconds.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 50;

/// Upper bound on the delay between reingestion attempts, in milliseconds.
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 1_000;

/// Timeout applied to each `PutRecordBatch` HTTP request, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
