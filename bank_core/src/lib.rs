// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Bank core
//!
//! A custodial ledger that holds an escrowed balance and issues Bills against
//! it. A Bill is addressed to a single recipient, who is the only account able
//! to redeem it, and it can be redeemed exactly once.
//!
//! ## Getting started
//!
//! Take a look at the [`manager`] module to see how to run a [`manager::Bank`]
//! and how to implement the adapters it needs for storage and value transfer.
//! An in-memory implementation is available behind the `in_memory` feature.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod bill;
mod error;
pub mod manager;

pub use bill::{Bill, BillId, BillStatus, NewBill};
pub use error::{Error, Result};

fn get_current_timestamp_u64_ns() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| Error::InvalidSystemTime {
            source_error_message: err.to_string(),
        })?
        .as_nanos() as u64)
}
