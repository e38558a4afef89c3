// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{str::FromStr, sync::Arc};

use anyhow::{Context, Result};
use axum::{error_handling::HandleError, routing::post_service, BoxError, Router};
use bank_core::{
    manager::{context::memory::InMemoryContext, Bank},
    Bill, BillId,
};
use hyper::StatusCode;
use jsonrpsee::{
    proc_macros::rpc,
    server::{ServerBuilder, ServerConfig, ServerHandle, TowerService},
};
use log::{error, info};
use thegraph_core::alloy::primitives::Address;
use tokio::{net::TcpListener, signal, task::JoinHandle};
use tower::layer::util::Identity;

pub use crate::{
    api_versioning::{
        bank_rpc_api_versions_info, BankRpcApiVersion, BankRpcApiVersionsInfo,
        BANK_RPC_API_VERSIONS_DEPRECATED,
    },
    jsonrpsee_helpers::{JsonRpcError, JsonRpcResponse, JsonRpcResult, JsonRpcWarning},
};
use crate::{
    error_codes::{JsonRpcErrorCode, JsonRpcWarningCode},
    jsonrpsee_helpers::bank_error,
    metrics::{
        BILLS_CASHED_COUNTER, BILLS_ISSUED_COUNTER, CASH_FAILURE_COUNTER,
        DEPRECATION_WARNING_COUNT, ISSUE_FAILURE_COUNTER, TOTAL_VALUE_PAID_OUT,
        VERSION_ERROR_COUNT,
    },
};

/// Generates the `RpcServer` trait that is used to define the JSON-RPC API.
///
/// Note that because of the way the `rpc` macro works, we cannot document the RpcServer trait here.
/// The method list with params and results lives in the `bank_server` crate docs.
#[rpc(server)]
pub trait Rpc {
    /// Returns the versions of the Bank JSON-RPC API implemented by this server.
    #[method(name = "api_versions")]
    fn api_versions(&self) -> JsonRpcResult<BankRpcApiVersionsInfo>;

    /// Issues a bill from `caller` to `recipient` and returns its id.
    #[method(name = "issue_bill")]
    async fn issue_bill(
        &self,
        api_version: String,
        caller: Address,
        price: u128,
        recipient: Address,
    ) -> JsonRpcResult<BillId>;

    /// Cashes bill `id` on behalf of `caller`, who must be its recipient.
    #[method(name = "cash_bill")]
    async fn cash_bill(&self, api_version: String, caller: Address, id: BillId)
        -> JsonRpcResult<()>;

    #[method(name = "all_bills")]
    async fn all_bills(&self, id: BillId) -> JsonRpcResult<Bill>;

    #[method(name = "bills")]
    async fn bills(&self) -> JsonRpcResult<Vec<Bill>>;

    #[method(name = "escrow_balance")]
    async fn escrow_balance(&self) -> JsonRpcResult<u128>;

    #[method(name = "account_balance")]
    async fn account_balance(&self, account: Address) -> JsonRpcResult<u128>;
}

#[derive(Clone)]
struct RpcImpl {
    bank: Arc<Bank<InMemoryContext>>,
}

/// Helper method that checks if the given API version is supported.
/// Returns an error if the API version is not supported.
fn parse_api_version(api_version: &str) -> Result<BankRpcApiVersion, JsonRpcError> {
    BankRpcApiVersion::from_str(api_version).map_err(|_| {
        jsonrpsee::types::ErrorObject::owned(
            JsonRpcErrorCode::InvalidVersion as i32,
            format!("Unsupported API version: \"{api_version}\"."),
            Some(bank_rpc_api_versions_info()),
        )
    })
}

/// Helper method that checks if the given API version has a deprecation warning.
/// Returns a warning if the API version is deprecated.
fn check_api_version_deprecation(api_version: &BankRpcApiVersion) -> Option<JsonRpcWarning> {
    if BANK_RPC_API_VERSIONS_DEPRECATED.contains(api_version) {
        Some(JsonRpcWarning::new(
            JsonRpcWarningCode::DeprecatedVersion as i32,
            format!("The API version {api_version} will be deprecated."),
            Some(bank_rpc_api_versions_info()),
        ))
    } else {
        None
    }
}

/// Validates the requested API version for a mutating call, and collects the
/// warnings to send back with the response.
fn negotiate_api_version(
    api_version: &str,
) -> Result<(BankRpcApiVersion, Vec<JsonRpcWarning>), JsonRpcError> {
    let api_version = match parse_api_version(api_version) {
        Ok(v) => v,
        Err(e) => {
            VERSION_ERROR_COUNT.inc();
            return Err(e);
        }
    };

    let mut warnings: Vec<JsonRpcWarning> = Vec::new();
    if let Some(w) = check_api_version_deprecation(&api_version) {
        warnings.push(w);
        DEPRECATION_WARNING_COUNT.inc();
    }
    Ok((api_version, warnings))
}

#[jsonrpsee::core::async_trait]
impl RpcServer for RpcImpl {
    fn api_versions(&self) -> JsonRpcResult<BankRpcApiVersionsInfo> {
        Ok(JsonRpcResponse::ok(bank_rpc_api_versions_info()))
    }

    async fn issue_bill(
        &self,
        api_version: String,
        caller: Address,
        price: u128,
        recipient: Address,
    ) -> JsonRpcResult<BillId> {
        let (api_version, warnings) = negotiate_api_version(&api_version)?;

        let res = match api_version {
            BankRpcApiVersion::V0_1 => self.bank.issue_bill(caller, price, recipient).await,
        };

        match res {
            Ok(id) => {
                BILLS_ISSUED_COUNTER.inc();
                Ok(JsonRpcResponse::warn(id, warnings))
            }
            Err(e) => {
                ISSUE_FAILURE_COUNTER.inc();
                Err(bank_error(e))
            }
        }
    }

    async fn cash_bill(
        &self,
        api_version: String,
        caller: Address,
        id: BillId,
    ) -> JsonRpcResult<()> {
        let (api_version, warnings) = negotiate_api_version(&api_version)?;

        let res = match api_version {
            BankRpcApiVersion::V0_1 => self.bank.cash_bill(caller, id).await,
        };

        match res {
            Ok(paid) => {
                BILLS_CASHED_COUNTER.inc();
                TOTAL_VALUE_PAID_OUT.inc_by(paid as f64);
                Ok(JsonRpcResponse::warn((), warnings))
            }
            Err(e) => {
                CASH_FAILURE_COUNTER.inc();
                Err(bank_error(e))
            }
        }
    }

    async fn all_bills(&self, id: BillId) -> JsonRpcResult<Bill> {
        self.bank
            .all_bills(id)
            .await
            .map(JsonRpcResponse::ok)
            .map_err(bank_error)
    }

    async fn bills(&self) -> JsonRpcResult<Vec<Bill>> {
        self.bank
            .bills()
            .await
            .map(JsonRpcResponse::ok)
            .map_err(bank_error)
    }

    async fn escrow_balance(&self) -> JsonRpcResult<u128> {
        self.bank
            .escrow_balance()
            .await
            .map(JsonRpcResponse::ok)
            .map_err(bank_error)
    }

    async fn account_balance(&self, account: Address) -> JsonRpcResult<u128> {
        self.bank
            .account_balance(account)
            .await
            .map(JsonRpcResponse::ok)
            .map_err(bank_error)
    }
}

/// Starts the JSON-RPC server on `port` (0 picks a free port) in front of
/// `bank`. Returns the handle of the serving task and the bound address.
pub async fn run_server(
    port: u16,
    bank: Arc<Bank<InMemoryContext>>,
    max_request_body_size: u32,
    max_response_body_size: u32,
    max_concurrent_connections: u32,
) -> Result<(JoinHandle<()>, std::net::SocketAddr)> {
    // Setting up the JSON RPC server
    let rpc_impl = RpcImpl { bank };
    let (json_rpc_service, _) = create_json_rpc_service(
        rpc_impl,
        max_request_body_size,
        max_response_body_size,
        max_concurrent_connections,
    )?;

    async fn handle_anyhow_error(err: BoxError) -> (StatusCode, String) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Something went wrong: {err}"),
        )
    }
    let router = Router::new()
        .route_service(
            "/",
            HandleError::new(post_service(json_rpc_service), handle_anyhow_error),
        )
        .layer(tower::limit::ConcurrencyLimitLayer::new(
            max_concurrent_connections as usize,
        ));

    // Create a `TcpListener` using tokio.
    let listener = TcpListener::bind(&format!("0.0.0.0:{port}"))
        .await
        .with_context(|| format!("Failed to bind to bank server port {port}"))?;

    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_handler())
            .await
        {
            error!("Bank server error: {e}");
        }
    });

    Ok((handle, addr))
}

/// Graceful shutdown handler
async fn shutdown_handler() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Signal received, starting graceful shutdown");
}

fn create_json_rpc_service(
    rpc_impl: RpcImpl,
    max_request_body_size: u32,
    max_response_body_size: u32,
    max_concurrent_connections: u32,
) -> Result<(TowerService<Identity, Identity>, ServerHandle)> {
    let config = ServerConfig::builder()
        .max_request_body_size(max_request_body_size)
        .max_response_body_size(max_response_body_size)
        .max_connections(max_concurrent_connections)
        .http_only()
        .build();

    let service_builder = ServerBuilder::new().set_config(config).to_service_builder();
    use jsonrpsee::server::stop_channel;
    let (stop_handle, server_handle) = stop_channel();
    let handle = service_builder.build(rpc_impl.into_rpc(), stop_handle);
    Ok((handle, server_handle))
}
