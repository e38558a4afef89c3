// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Bank server
//!
//! JSON-RPC (over HTTP) front end of the [`bank_core`] ledger. Every result is
//! wrapped as `{ "data": ..., "warnings": [...] }`, `warnings` being omitted
//! when empty.
//!
//! | method            | params                                   | result                 |
//! |-------------------|------------------------------------------|------------------------|
//! | `api_versions`    |                                          | supported versions     |
//! | `issue_bill`      | `api_version`, `caller`, `price`, `recipient` | bill id           |
//! | `cash_bill`       | `api_version`, `caller`, `id`            | `null`                 |
//! | `all_bills`       | `id`                                     | bill                   |
//! | `bills`           |                                          | every bill, by id      |
//! | `escrow_balance`  |                                          | escrow left            |
//! | `account_balance` | `account`                                | value paid to account  |
//!
//! `caller` is the identity the transport vouches for; the server does not
//! authenticate it. Error codes are listed in [`error_codes::JsonRpcErrorCode`].
//!
//! Prometheus metrics are served separately on `/metrics`, see [`metrics`].

pub mod api_versioning;
pub mod error_codes;
pub mod jsonrpsee_helpers;
pub mod metrics;
pub mod server;
