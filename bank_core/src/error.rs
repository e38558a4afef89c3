// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Module containing the error taxonomy of the ledger
//!

use std::result::Result as StdResult;

use thegraph_core::alloy::primitives::Address;
use thiserror::Error as ThisError;

use crate::bill::BillId;

/// Error type for every ledger operation.
///
/// Whatever the variant, the ledger state (bills and balances) is left exactly
/// as it was before the failing call.
#[derive(ThisError, Debug)]
pub enum Error {
    /// The referenced bill id was never issued
    #[error("No bill found with id {id}")]
    NotFound { id: BillId },

    /// Redemption attempted on a bill that is already cashed
    #[error("Bill {id} has already been cashed")]
    AlreadyCashed { id: BillId },

    /// The caller is not the recipient of the bill
    #[error("Caller {caller} is not the recipient of bill {id}")]
    Unauthorized { id: BillId, caller: Address },

    /// Value could not be moved from escrow to the recipient
    #[error("Transfer of {amount} to {recipient} failed.\n Caused by: {source_error}")]
    TransferFailed {
        recipient: Address,
        amount: u128,
        source_error: anyhow::Error,
    },

    /// The bill was paid out but its status could not be recorded nor the
    /// payment reverted. It stays frozen until reconciled.
    #[error("Bill {id} was paid out without being marked as cashed and is frozen")]
    Unreconciled { id: BillId },

    #[error("Invalid bill recipient: {recipient}")]
    InvalidRecipient { recipient: Address },

    #[error("Not enough free escrow to back the bill: requested {requested}, available {available}")]
    InsufficientEscrow { requested: u128, available: u128 },

    #[error("Failed to get current system time: {source_error_message} ")]
    InvalidSystemTime { source_error_message: String },

    #[error("Error from adapter.\n Caused by: {source_error}")]
    AdapterError { source_error: anyhow::Error },
}

pub type Result<T> = StdResult<T, Error>;
