// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use bank_core::Error;

/// JSON-RPC error codes specific to the Bank server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonRpcErrorCode {
    /// -32000 -- Internal ledger failure (storage adapter, system time).
    Internal = -32000,
    /// -32001 -- Invalid API version.
    InvalidVersion = -32001,
    /// -32010 -- The referenced bill does not exist.
    BillNotFound = -32010,
    /// -32011 -- The bill has already been cashed.
    AlreadyCashed = -32011,
    /// -32012 -- The caller is not the recipient of the bill.
    Unauthorized = -32012,
    /// -32013 -- Moving value from escrow to the recipient failed.
    TransferFailed = -32013,
    /// -32014 -- The bill recipient is not a valid account.
    InvalidRecipient = -32014,
    /// -32015 -- Not enough free escrow to back the bill.
    InsufficientEscrow = -32015,
    /// -32016 -- The bill was paid out but its status could not be recorded.
    Unreconciled = -32016,
}

impl From<&Error> for JsonRpcErrorCode {
    fn from(error: &Error) -> Self {
        match error {
            Error::NotFound { .. } => JsonRpcErrorCode::BillNotFound,
            Error::AlreadyCashed { .. } => JsonRpcErrorCode::AlreadyCashed,
            Error::Unauthorized { .. } => JsonRpcErrorCode::Unauthorized,
            Error::TransferFailed { .. } => JsonRpcErrorCode::TransferFailed,
            Error::InvalidRecipient { .. } => JsonRpcErrorCode::InvalidRecipient,
            Error::InsufficientEscrow { .. } => JsonRpcErrorCode::InsufficientEscrow,
            Error::Unreconciled { .. } => JsonRpcErrorCode::Unreconciled,
            Error::InvalidSystemTime { .. } | Error::AdapterError { .. } => {
                JsonRpcErrorCode::Internal
            }
        }
    }
}

/// JSON-RPC warning codes
/// These are not part of the JSON-RPC standard, but are used to provide additional information to the
/// client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonRpcWarningCode {
    /// -32101 -- Requested API version is deprecated.
    DeprecatedVersion = -32101,
}
