// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

//! Runs one transformation invocation.
//!
//! Reads a Firehose transformation event from the path given as the first
//! argument, or from stdin, and prints the response JSON to stdout. Logs go to
//! stderr. Exits with status 1 when the invocation fails.

use std::{env, sync::Arc};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use cloudwatch_logs_processor::{
    config::Config, delivery_stream::HttpDeliveryStreamClient, event::TransformationEvent,
    processor::LogsProcessor,
};

#[tokio::main]
pub async fn main() {
    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", config.log_level);
    let filter = match EnvFilter::try_new(&env_filter) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("Could not parse log level {}: {e}", config.log_level);
            std::process::exit(1);
        }
    };
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Setting default subscriber failed: {e}");
        std::process::exit(1);
    }

    debug!("Logging subsystem enabled");

    if let Err(e) = run(config).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(config: Arc<Config>) -> Result<(), String> {
    let input = read_input(env::args().nth(1)).await?;
    let event: TransformationEvent = serde_json::from_slice(&input)
        .map_err(|e| format!("Invalid transformation event: {e}"))?;

    let client = HttpDeliveryStreamClient::new(&config)
        .map_err(|e| format!("Could not build delivery stream client: {e}"))?;
    let processor = LogsProcessor::new(config, Arc::new(client));

    let response = processor
        .process_event(event)
        .await
        .map_err(|e| e.to_string())?;

    let mut output = serde_json::to_vec(&response)
        .map_err(|e| format!("Could not serialize response: {e}"))?;
    output.push(b'\n');

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(&output)
        .await
        .map_err(|e| format!("Could not write response: {e}"))?;
    stdout
        .flush()
        .await
        .map_err(|e| format!("Could not write response: {e}"))
}

async fn read_input(path: Option<String>) -> Result<Vec<u8>, String> {
    match path {
        Some(path) => tokio::fs::read(&path)
            .await
            .map_err(|e| format!("Could not read {path}: {e}")),
        None => {
            let mut input = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut input)
                .await
                .map_err(|e| format!("Could not read stdin: {e}"))?;
            Ok(input)
        }
    }
}
