// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Keeps the transformation response under the Firehose size limit.
//!
//! When the projected response is too large, `Ok` records are demoted to
//! `Dropped` front to back until it fits, and their *original* compressed
//! bytes are collected into reingestion groups. A reingested record goes
//! through the whole pipeline again when Firehose redelivers it.
//!
//! Demotion is a single pass in input order. It does not look for the largest
//! records first, so it can demote more records than strictly necessary.

use bytes::Bytes;
use tracing::debug;

use crate::constants::{MAX_PUT_RECORD_BATCH_ENTRIES, MAX_RESPONSE_SIZE_BYTES};
use crate::event::{InputRecord, OutcomeRecord};

/// Original record payloads to submit together in one `PutRecordBatch` call.
pub type ReingestionGroup = Vec<Bytes>;

/// Size and count limits applied while partitioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityLimits {
    /// Budget for the sum of [`OutcomeRecord::projected_size`] over `Ok` records.
    pub max_response_size_bytes: usize,
    /// Maximum entries per reingestion group.
    pub max_group_entries: usize,
}

impl Default for CapacityLimits {
    fn default() -> Self {
        CapacityLimits {
            max_response_size_bytes: MAX_RESPONSE_SIZE_BYTES,
            max_group_entries: MAX_PUT_RECORD_BATCH_ENTRIES,
        }
    }
}

/// Sum of the projected sizes of all `Ok` outcomes.
pub fn projected_size(outcomes: &[OutcomeRecord]) -> usize {
    outcomes
        .iter()
        .map(OutcomeRecord::projected_size)
        .fold(0, usize::saturating_add)
}

/// Demotes outcomes until the projected size fits `limits` and returns the
/// sealed reingestion groups, in input order.
///
/// `outcomes` and `records` are positionally aligned.
pub fn partition(
    outcomes: &mut [OutcomeRecord],
    records: &[InputRecord],
    limits: &CapacityLimits,
) -> Vec<ReingestionGroup> {
    let max_group_entries = limits.max_group_entries.max(1);
    let mut projected = projected_size(outcomes);
    let mut groups = Vec::new();
    let mut current: ReingestionGroup = Vec::new();

    for (outcome, record) in outcomes.iter_mut().zip(records) {
        if projected <= limits.max_response_size_bytes {
            break;
        }
        if !outcome.is_ok() {
            continue;
        }

        projected = projected.saturating_sub(outcome.projected_size());
        outcome.demote();
        current.push(record.data.clone());

        if current.len() == max_group_entries {
            groups.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        groups.push(current);
    }

    if !groups.is_empty() {
        debug!(
            "PROCESSOR | Demoted {} records into {} reingestion groups, projected size now {projected} bytes",
            groups.iter().map(Vec::len).sum::<usize>(),
            groups.len()
        );
    }

    groups
}
