// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The `manager` module provides the ledger core: issuing and redeeming bills.
//!
//! [`Bank`] is the primary interface of the library. Every operation takes the
//! identity of the caller explicitly; the ledger trusts that identity as already
//! authenticated by the transport and only decides whether it is authorized.
//!
//! The `Bank` relies on user-defined adapters (see [`adapters`]) for bill
//! storage and for the value transfer gateway that moves funds out of escrow.
//! This design lets the user plug in their own storage engine, as long as it
//! honours the atomicity contract described on each adapter.

pub mod adapters;
mod bank;
#[cfg(feature = "in_memory")]
pub mod context;

pub use bank::{Bank, IssuancePolicy};
