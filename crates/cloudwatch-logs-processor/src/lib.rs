// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # CloudWatch Logs processor
//!
//! Transformation stage between a CloudWatch Logs subscription filter and a
//! Kinesis Data Firehose delivery stream.
//!
//! ## Pipeline
//!
//! ```text
//!   Firehose transformation event (base64, gzip, JSON)
//!         │
//!         v
//!   ┌──────────────┐
//!   │   Envelope   │  (gunzip, parse, classify CONTROL / DATA)
//!   └──────┬───────┘
//!          v
//!   ┌──────────────┐
//!   │  Transform   │  (one JSON object per log event, routing key)
//!   └──────┬───────┘
//!          v
//!   ┌──────────────┐
//!   │  Partition   │  (keep the response under 6MB, 500 per group)
//!   └──────┬───────┘
//!          v
//!   ┌──────────────┐
//!   │   Reingest   │  (PutRecordBatch with bounded retries)
//!   └──────────────┘
//! ```
//!
//! The entry point is [`processor::LogsProcessor::process_event`].

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod assembler;
pub mod config;
pub mod constants;
pub mod delivery_stream;
pub mod envelope;
pub mod error;
pub mod event;
pub mod partitioner;
pub mod processor;
pub mod reingest;
pub mod transform;
