// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use anyhow::Result;
use bank_core::manager::{context::memory::InMemoryContext, Bank, IssuancePolicy};
use bank_server::{metrics, server};
use clap::Parser;
use log::{debug, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on for JSON-RPC requests.
    /// Defaults to 8080.
    #[arg(long, default_value_t = 8080, env = "BANK_PORT")]
    port: u16,

    /// Value held in escrow when the ledger is deployed.
    #[arg(long, default_value_t = 0, env = "BANK_INITIAL_ESCROW")]
    initial_escrow: u128,

    /// Only issue bills that are fully backed by escrow not yet committed to
    /// other active bills.
    #[arg(long, env = "BANK_RESERVE_ON_ISSUE")]
    reserve_on_issue: bool,

    /// Maximum request body size in bytes.
    /// Defaults to 1MB.
    #[arg(long, default_value_t = 1024 * 1024, env = "BANK_MAX_REQUEST_BODY_SIZE")]
    max_request_body_size: u32,

    /// Maximum response body size in bytes.
    /// Defaults to 10MB, `bills` returns the whole ledger.
    #[arg(long, default_value_t = 10 * 1024 * 1024, env = "BANK_MAX_RESPONSE_BODY_SIZE")]
    max_response_body_size: u32,

    /// Maximum number of concurrent connections.
    /// Defaults to 32.
    #[arg(long, default_value_t = 32, env = "BANK_MAX_CONNECTIONS")]
    max_connections: u32,

    /// Metrics server port.
    /// Defaults to 5000.
    #[arg(long, default_value_t = 5000, env = "BANK_METRICS_PORT")]
    metrics_port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Set the log level by setting the RUST_LOG environment variable.
    // tracing_subscriber is the backend so the jsonrpsee spans show up too.
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    debug!("Settings: {:?}", args);

    // We just let it gracelessly get killed at the end of main()
    tokio::spawn(metrics::run_server(args.metrics_port));

    let issuance_policy = if args.reserve_on_issue {
        IssuancePolicy::Reserve
    } else {
        IssuancePolicy::Permissive
    };
    let bank = Arc::new(Bank::new(
        InMemoryContext::with_initial_escrow(args.initial_escrow),
        issuance_policy,
    ));
    info!(
        "Ledger deployed with {} in escrow, issuance policy {:?}",
        args.initial_escrow,
        bank.issuance_policy()
    );

    // This await is non-blocking
    let (handle, _) = server::run_server(
        args.port,
        bank,
        args.max_request_body_size,
        args.max_response_body_size,
        args.max_connections,
    )
    .await?;
    info!("Server started. Listening on port {}.", args.port);

    let _ = handle.await;

    // If we're here, we've received a signal to exit.
    info!("Shutting down...");
    Ok(())
}
