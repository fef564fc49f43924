// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Turns every input record of an invocation into exactly one outcome.
//!
//! Records are decoded and transformed independently on the blocking pool and
//! reassembled by position, so `outcomes[i]` always answers `records[i]`.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::envelope::{self, Decoded};
use crate::event::{InputRecord, OutcomeRecord};
use crate::transform::EventTransformer;

/// Decodes and transforms one record.
///
/// * decompression, parse or message type errors → `ProcessingFailed`
/// * `CONTROL_MESSAGE` → `Dropped`
/// * `DATA_MESSAGE` → `Ok` with the concatenated events, possibly empty
pub fn process_record(record: &InputRecord, transformer: &EventTransformer) -> OutcomeRecord {
    let envelope = match envelope::decode(&record.data) {
        Ok(Decoded::Data(envelope)) => envelope,
        Ok(Decoded::Control) => {
            debug!("PROCESSOR | Dropping control message {}", record.record_id);
            return OutcomeRecord::dropped(record.record_id.as_str());
        }
        Err(e) => {
            debug!("PROCESSOR | Record {} failed: {e}", record.record_id);
            return OutcomeRecord::processing_failed(record.record_id.as_str());
        }
    };

    let mut payload = String::new();
    for log_event in &envelope.log_events {
        payload.push_str(&transformer.transform(
            log_event,
            &envelope.log_group,
            &envelope.subscription_filters,
        ));
    }

    OutcomeRecord::ok(record.record_id.as_str(), payload.into_bytes())
}

/// Processes all records concurrently and returns their outcomes in input order.
pub async fn assemble(
    records: &[InputRecord],
    transformer: Arc<EventTransformer>,
) -> Vec<OutcomeRecord> {
    let mut set = JoinSet::new();

    for (idx, record) in records.iter().enumerate() {
        let record = record.clone();
        let transformer = Arc::clone(&transformer);
        set.spawn_blocking(move || (idx, process_record(&record, &transformer)));
    }

    let mut outcomes: Vec<Option<OutcomeRecord>> = vec![None; records.len()];
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((idx, outcome)) => outcomes[idx] = Some(outcome),
            Err(e) => error!("PROCESSOR | Failed to join record task: {e}"),
        }
    }

    // A task that panicked leaves its slot empty.
    outcomes
        .into_iter()
        .zip(records)
        .map(|(outcome, record)| {
            outcome.unwrap_or_else(|| OutcomeRecord::processing_failed(record.record_id.as_str()))
        })
        .collect()
}
