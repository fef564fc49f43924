// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Reingestion of demoted records into the delivery stream.
//!
//! Each group is tracked by a [`SubmissionAttempt`]:
//!
//! ```text
//!   Pending ──> Submitting ──> AllAcked
//!                   │  ^
//!                   v  │
//!             PartialFailure ──> AttemptsExhausted
//! ```
//!
//! Only the entries that failed are resubmitted. Groups are submitted
//! concurrently; attempts within a group are sequential. The first group to
//! exhaust its attempts fails the invocation and cancels the others.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::try_join_all;
use tracing::{debug, error, info};

use crate::constants::MAX_SUBMISSION_ATTEMPTS;
use crate::delivery_stream::{DeliveryStreamClient, EntryResult};
use crate::error::{DeliveryStreamError, ProcessorError};
use crate::event::DeliveryStreamArn;
use crate::partitioner::ReingestionGroup;

/// How many times a group is submitted, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStrategy {
    /// Retry right away.
    Immediate(u32),
    /// Wait a fixed number of milliseconds between attempts.
    LinearBackoff(u32, u64),
    /// Double the delay after every failed attempt, up to `max_delay_ms`.
    ExponentialBackoff {
        max_attempts: u32,
        base_delay_ms: u64,
        max_delay_ms: u64,
    },
}

impl Default for RetryStrategy {
    fn default() -> Self {
        RetryStrategy::Immediate(MAX_SUBMISSION_ATTEMPTS)
    }
}

impl RetryStrategy {
    pub fn max_attempts(&self) -> u32 {
        let attempts = match self {
            RetryStrategy::Immediate(attempts) | RetryStrategy::LinearBackoff(attempts, _) => {
                *attempts
            }
            RetryStrategy::ExponentialBackoff { max_attempts, .. } => *max_attempts,
        };
        attempts.max(1)
    }

    /// Delay before the next attempt, given how many attempts were made.
    pub fn delay(&self, attempts_made: u32) -> Duration {
        match self {
            RetryStrategy::Immediate(_) => Duration::ZERO,
            RetryStrategy::LinearBackoff(_, delay_ms) => Duration::from_millis(*delay_ms),
            RetryStrategy::ExponentialBackoff {
                base_delay_ms,
                max_delay_ms,
                ..
            } => {
                let exponent = attempts_made.saturating_sub(1).min(31);
                let delay_ms = base_delay_ms.saturating_mul(1_u64 << exponent);
                Duration::from_millis(delay_ms.min(*max_delay_ms))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Pending,
    Submitting,
    PartialFailure,
    AllAcked,
    AttemptsExhausted,
}

/// Retry bookkeeping for one reingestion group.
#[derive(Debug)]
pub struct SubmissionAttempt {
    /// Entries still waiting to be accepted.
    pending: ReingestionGroup,
    attempts_made: u32,
    max_attempts: u32,
    state: SubmissionState,
    /// Description of the failures of the latest attempt.
    last_error: String,
}

impl SubmissionAttempt {
    pub fn new(group: ReingestionGroup, max_attempts: u32) -> Self {
        SubmissionAttempt {
            pending: group,
            attempts_made: 0,
            max_attempts: max_attempts.max(1),
            state: SubmissionState::Pending,
            last_error: String::new(),
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            SubmissionState::AllAcked | SubmissionState::AttemptsExhausted
        )
    }

    /// Starts an attempt and returns the entries to submit.
    pub fn begin(&mut self) -> &[Bytes] {
        self.state = SubmissionState::Submitting;
        self.attempts_made += 1;
        &self.pending
    }

    /// Applies the outcome of the current attempt.
    ///
    /// A call-level error fails every pending entry. Entries reported as
    /// failed, or missing from the response, stay pending for the next attempt.
    pub fn complete(
        &mut self,
        result: Result<Vec<EntryResult>, DeliveryStreamError>,
    ) -> SubmissionState {
        match result {
            Ok(results) => {
                let mut codes = Vec::new();
                let mut results = results.into_iter();
                for entry in std::mem::take(&mut self.pending) {
                    match results.next() {
                        Some(EntryResult::Ok) => {}
                        Some(EntryResult::Failed { error_code, .. }) => {
                            codes.push(error_code);
                            self.pending.push(entry);
                        }
                        None => {
                            codes.push("MissingResponseEntry".to_string());
                            self.pending.push(entry);
                        }
                    }
                }
                self.last_error = format!("Individual error codes: {}", codes.join(","));
            }
            Err(e) => {
                self.last_error = e.to_string();
            }
        }

        self.state = if self.pending.is_empty() {
            SubmissionState::AllAcked
        } else if self.attempts_made >= self.max_attempts {
            SubmissionState::AttemptsExhausted
        } else {
            SubmissionState::PartialFailure
        };
        self.state
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Submits reingestion groups with bounded retries.
pub struct Reingestor<C> {
    client: Arc<C>,
    retry_strategy: RetryStrategy,
}

impl<C: DeliveryStreamClient> Reingestor<C> {
    pub fn new(client: Arc<C>, retry_strategy: RetryStrategy) -> Self {
        Reingestor {
            client,
            retry_strategy,
        }
    }

    /// Submits every group, concurrently. Fails as soon as one group exhausts
    /// its attempts; the remaining submissions are dropped.
    pub async fn reingest(
        &self,
        stream: &DeliveryStreamArn,
        groups: Vec<ReingestionGroup>,
    ) -> Result<(), ProcessorError> {
        let total: usize = groups.iter().map(Vec::len).sum();
        let submissions = groups.into_iter().enumerate().map(|(idx, group)| {
            let len = group.len();
            async move {
                self.submit_group(stream, group).await?;
                debug!(
                    "REINGEST | Group {idx} of {len} records accepted by {}",
                    stream.stream_name
                );
                Ok::<usize, ProcessorError>(len)
            }
        });

        let reingested: usize = try_join_all(submissions).await?.into_iter().sum();
        info!(
            "REINGEST | Reingested {reingested}/{total} records in to {} stream",
            stream.stream_name
        );
        Ok(())
    }

    /// Drives one group to a terminal state.
    pub async fn submit_group(
        &self,
        stream: &DeliveryStreamArn,
        group: ReingestionGroup,
    ) -> Result<(), ProcessorError> {
        let mut attempt = SubmissionAttempt::new(group, self.retry_strategy.max_attempts());

        while !attempt.is_terminal() {
            let result = {
                let entries = attempt.begin();
                self.client.put_record_batch(stream, entries).await
            };

            match attempt.complete(result) {
                SubmissionState::PartialFailure => {
                    info!(
                        "REINGEST | {} records failed while calling PutRecordBatch, retrying. {}",
                        attempt.pending_len(),
                        attempt.last_error()
                    );
                    let delay = self.retry_strategy.delay(attempt.attempts_made());
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                SubmissionState::AttemptsExhausted => {
                    error!(
                        "REINGEST | Could not put records after {} attempts. {}",
                        attempt.attempts_made(),
                        attempt.last_error()
                    );
                    return Err(ProcessorError::SubmissionAttemptsExhausted {
                        attempts: attempt.attempts_made(),
                        detail: attempt.last_error().to_string(),
                    });
                }
                SubmissionState::AllAcked
                | SubmissionState::Pending
                | SubmissionState::Submitting => {}
            }
        }

        Ok(())
    }
}
