// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use axum::{http::StatusCode, routing::get, Router};
use lazy_static::lazy_static;
use log::{error, info};
use prometheus::{register_counter, register_int_counter, Counter, IntCounter, TextEncoder};
use tokio::net::TcpListener;

// Register the metrics into the global metrics registry.
lazy_static! {
    pub static ref BILLS_ISSUED_COUNTER: IntCounter = register_int_counter!(
        "bills_issued_count",
        "Number of bills successfully issued."
    )
    .unwrap();
    pub static ref ISSUE_FAILURE_COUNTER: IntCounter = register_int_counter!(
        "issue_failure_count",
        "Number of rejected bill issuance requests (for any reason)."
    )
    .unwrap();
    pub static ref BILLS_CASHED_COUNTER: IntCounter = register_int_counter!(
        "bills_cashed_count",
        "Number of bills successfully cashed."
    )
    .unwrap();
    pub static ref CASH_FAILURE_COUNTER: IntCounter = register_int_counter!(
        "cash_failure_count",
        "Number of rejected cash requests (for any reason)."
    )
    .unwrap();
    pub static ref VERSION_ERROR_COUNT: IntCounter = register_int_counter!(
        "version_error_count",
        "Number of API version errors sent to clients."
    )
    .unwrap();
    pub static ref DEPRECATION_WARNING_COUNT: IntCounter = register_int_counter!(
        "deprecation_warning_count",
        "Number of deprecation warnings sent to clients."
    )
    .unwrap();
    // Using float for the paid out value because it can easily exceed the maximum value of int64.
    pub static ref TOTAL_VALUE_PAID_OUT: Counter = register_counter!(
        "total_value_paid_out",
        "Total value paid out of escrow by cashed bills."
    )
    .unwrap();
}

pub(crate) async fn handler_metrics() -> (StatusCode, String) {
    let metric_families = prometheus::gather();
    let encoder = TextEncoder::new();
    match encoder.encode_to_string(&metric_families) {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            error!("Error encoding metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error encoding metrics: {e}"),
            )
        }
    }
}

/// Serves the prometheus metrics on `/metrics`. Runs until the listener fails.
pub async fn run_server(port: u16) {
    let app = Router::new().route("/metrics", get(handler_metrics));
    let listener = match TcpListener::bind(&format!("0.0.0.0:{port}")).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind metrics server to port {port}: {e}");
            return;
        }
    };
    info!("Metrics server listening on port {port}");
    if let Err(e) = axum::serve(listener, app).await {
        error!("Metrics server error: {e}");
    }
}
