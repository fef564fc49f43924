// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Entry point that runs one Firehose transformation invocation end to end.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::assembler;
use crate::config::Config;
use crate::delivery_stream::DeliveryStreamClient;
use crate::error::ProcessorError;
use crate::event::{
    DeliveryStreamArn, OutcomeRecord, RecordResult, TransformationEvent, TransformationResponse,
};
use crate::partitioner::{self, CapacityLimits};
use crate::reingest::{Reingestor, RetryStrategy};
use crate::transform::EventTransformer;

pub struct LogsProcessor<C> {
    transformer: Arc<EventTransformer>,
    limits: CapacityLimits,
    reingestor: Reingestor<C>,
}

impl<C: DeliveryStreamClient> LogsProcessor<C> {
    /// Processor using the Firehose limits and the retry strategy from `config`.
    pub fn new(config: Arc<Config>, client: Arc<C>) -> Self {
        let retry_strategy = config.retry_strategy();
        Self::with_limits(config, client, CapacityLimits::default(), retry_strategy)
    }

    pub fn with_limits(
        config: Arc<Config>,
        client: Arc<C>,
        limits: CapacityLimits,
        retry_strategy: RetryStrategy,
    ) -> Self {
        LogsProcessor {
            transformer: Arc::new(EventTransformer::new(config)),
            limits,
            reingestor: Reingestor::new(client, retry_strategy),
        }
    }

    /// Transforms every record and reingests the ones that do not fit in the
    /// response.
    ///
    /// Per-record failures are reported in the response. An error is returned
    /// only when reingestion fails, in which case Firehose retries the whole
    /// batch.
    pub async fn process_event(
        &self,
        event: TransformationEvent,
    ) -> Result<TransformationResponse, ProcessorError> {
        let time = Instant::now();
        let total_records = event.records.len();

        let mut outcomes = assembler::assemble(&event.records, Arc::clone(&self.transformer)).await;
        debug!(
            "PROCESSOR | Transformed {total_records} records in {} ms: {} ok, {} dropped, {} failed",
            time.elapsed().as_millis(),
            count(&outcomes, RecordResult::Ok),
            count(&outcomes, RecordResult::Dropped),
            count(&outcomes, RecordResult::ProcessingFailed),
        );

        let groups = partitioner::partition(&mut outcomes, &event.records, &self.limits);
        if groups.is_empty() {
            info!("PROCESSOR | No records needed to be reingested.");
            return Ok(TransformationResponse { records: outcomes });
        }

        let to_reingest: usize = groups.iter().map(Vec::len).sum();
        let stream = DeliveryStreamArn::parse(&event.delivery_stream_arn)?;

        match self.reingestor.reingest(&stream, groups).await {
            Ok(()) => {
                info!(
                    "PROCESSOR | Reingested all {to_reingest} records out of {total_records} in to {} stream",
                    stream.stream_name
                );
                Ok(TransformationResponse { records: outcomes })
            }
            Err(e) => {
                error!("PROCESSOR | Failed to reingest records. {e}");
                Err(e)
            }
        }
    }
}

fn count(outcomes: &[OutcomeRecord], result: RecordResult) -> usize {
    outcomes.iter().filter(|o| o.result == result).count()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::delivery_stream::EntryResult;
    use crate::error::DeliveryStreamError;
    use crate::event::InputRecord;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;
    use tracing_test::traced_test;

    /// Client that must not be called.
    struct UnusedClient;

    #[async_trait]
    impl DeliveryStreamClient for UnusedClient {
        async fn put_record_batch(
            &self,
            _stream: &DeliveryStreamArn,
            _records: &[Bytes],
        ) -> Result<Vec<EntryResult>, DeliveryStreamError> {
            panic!("no reingestion expected");
        }
    }

    #[derive(Default)]
    struct RecordingClient {
        streams: Mutex<Vec<DeliveryStreamArn>>,
    }

    #[async_trait]
    impl DeliveryStreamClient for RecordingClient {
        async fn put_record_batch(
            &self,
            stream: &DeliveryStreamArn,
            records: &[Bytes],
        ) -> Result<Vec<EntryResult>, DeliveryStreamError> {
            self.streams.lock().unwrap().push(stream.clone());
            Ok(vec![EntryResult::Ok; records.len()])
        }
    }

    fn config() -> Arc<Config> {
        Arc::new(Config::new("default", "aws:cloudwatch"))
    }

    fn event(arn: &str, records: Vec<InputRecord>) -> TransformationEvent {
        TransformationEvent {
            invocation_id: None,
            delivery_stream_arn: arn.to_string(),
            region: None,
            records,
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_small_batch_is_not_reingested() {
        let processor = LogsProcessor::new(config(), Arc::new(UnusedClient));

        let response = processor
            .process_event(event(
                "not-an-arn",
                vec![InputRecord::new("r1", &b"garbage"[..])],
            ))
            .await
            .unwrap();

        assert_eq!(response.records.len(), 1);
        assert_eq!(response.records[0].result, RecordResult::ProcessingFailed);
        assert!(logs_contain("No records needed to be reingested."));
    }

    #[tokio::test]
    async fn test_invalid_arn_fails_only_when_reingesting() {
        let processor = LogsProcessor::with_limits(
            config(),
            Arc::new(UnusedClient),
            CapacityLimits {
                max_response_size_bytes: 0,
                max_group_entries: 500,
            },
            RetryStrategy::Immediate(1),
        );
        let result = processor
            .process_event(event("not-an-arn", vec![ok_record("r1")]))
            .await;

        assert!(matches!(
            result,
            Err(ProcessorError::InvalidDeliveryStreamArn(_))
        ));
    }

    #[tokio::test]
    async fn test_reingests_to_stream_from_arn() {
        let client = Arc::new(RecordingClient::default());
        let processor = LogsProcessor::with_limits(
            config(),
            Arc::clone(&client),
            CapacityLimits {
                max_response_size_bytes: 0,
                max_group_entries: 500,
            },
            RetryStrategy::Immediate(1),
        );

        let response = processor
            .process_event(event(
                "arn:aws:firehose:ap-southeast-2:123456789012:deliverystream/app-logs",
                vec![ok_record("r1"), ok_record("r2")],
            ))
            .await
            .unwrap();

        assert!(response
            .records
            .iter()
            .all(|r| r.result == RecordResult::Dropped && r.payload.is_none()));
        let streams = client.streams.lock().unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].region, "ap-southeast-2");
        assert_eq!(streams[0].stream_name, "app-logs");
    }

    fn ok_record(record_id: &str) -> InputRecord {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(br#"{"messageType":"DATA_MESSAGE","logGroup":"g","subscriptionFilters":[],"logEvents":[{"id":"1","timestamp":1,"message":"m"}]}"#)
            .unwrap();
        InputRecord::new(record_id, encoder.finish().unwrap())
    }
}
