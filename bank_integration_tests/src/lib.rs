// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Helpers to run a Bank server on a free port and talk to it over JSON-RPC.

use std::sync::Arc;

use anyhow::Result;
use bank_core::{
    manager::{context::memory::InMemoryContext, Bank, IssuancePolicy},
    Bill, BillId,
};
use bank_server::server::{self, JsonRpcResponse};
use jsonrpsee::{
    core::{client::ClientT, ClientError},
    http_client::{HttpClient, HttpClientBuilder},
    rpc_params,
};
use thegraph_core::alloy::primitives::Address;
use tokio::task::JoinHandle;

pub const API_VERSION: &str = "0.1";

/// A running server and a client pointed at it. The server task is aborted
/// when the harness is dropped.
pub struct BankHarness {
    handle: JoinHandle<()>,
    client: HttpClient,
    url: String,
}

impl BankHarness {
    pub async fn start(
        initial_escrow: u128,
        issuance_policy: IssuancePolicy,
        max_request_body_size: u32,
        max_response_body_size: u32,
        max_concurrent_connections: u32,
    ) -> Result<Self> {
        let bank = Arc::new(Bank::new(
            InMemoryContext::with_initial_escrow(initial_escrow),
            issuance_policy,
        ));
        let (handle, local_addr) = server::run_server(
            0,
            bank,
            max_request_body_size,
            max_response_body_size,
            max_concurrent_connections,
        )
        .await?;

        let url = format!("http://127.0.0.1:{}", local_addr.port());
        let client = HttpClientBuilder::default().build(&url)?;
        Ok(Self {
            handle,
            client,
            url,
        })
    }

    /// A fresh client, for callers that want their own connection.
    pub fn new_client(&self) -> Result<HttpClient> {
        Ok(HttpClientBuilder::default().build(&self.url)?)
    }

    pub async fn issue_bill(
        &self,
        caller: Address,
        price: u128,
        recipient: Address,
    ) -> Result<BillId, ClientError> {
        let res: JsonRpcResponse<BillId> = self
            .client
            .request(
                "issue_bill",
                rpc_params!(API_VERSION, caller, price, recipient),
            )
            .await?;
        Ok(res.data)
    }

    pub async fn cash_bill(&self, caller: Address, id: BillId) -> Result<(), ClientError> {
        cash_bill(&self.client, caller, id).await
    }

    pub async fn all_bills(&self, id: BillId) -> Result<Bill, ClientError> {
        let res: JsonRpcResponse<Bill> = self
            .client
            .request("all_bills", rpc_params!(id))
            .await?;
        Ok(res.data)
    }

    pub async fn bills(&self) -> Result<Vec<Bill>, ClientError> {
        let res: JsonRpcResponse<Vec<Bill>> =
            self.client.request("bills", rpc_params!()).await?;
        Ok(res.data)
    }

    pub async fn escrow_balance(&self) -> Result<u128, ClientError> {
        let res: JsonRpcResponse<u128> = self
            .client
            .request("escrow_balance", rpc_params!())
            .await?;
        Ok(res.data)
    }

    pub async fn account_balance(&self, account: Address) -> Result<u128, ClientError> {
        let res: JsonRpcResponse<u128> = self
            .client
            .request("account_balance", rpc_params!(account))
            .await?;
        Ok(res.data)
    }
}

impl Drop for BankHarness {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Cashes `id` as `caller` through `client`.
pub async fn cash_bill(client: &HttpClient, caller: Address, id: BillId) -> Result<(), ClientError> {
    let _: JsonRpcResponse<()> = client
        .request("cash_bill", rpc_params!(API_VERSION, caller, id))
        .await?;
    Ok(())
}

/// JSON-RPC error code of a failed call, if the server answered one.
pub fn error_code(err: &ClientError) -> Option<i32> {
    match err {
        ClientError::Call(err) => Some(err.code()),
        _ => None,
    }
}
