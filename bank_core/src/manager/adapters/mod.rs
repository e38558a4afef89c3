// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Context adapters for the Bank.
//!
//! Each adapter should be defined by the user of the library based on their
//! specific storage and settlement requirements. This modular design
//! allows for easy integration with various storage solutions and account
//! ledgers, thereby making the library adaptable to a wide range of use cases.

mod bill;
mod escrow;

pub use bill::{BillRead, BillStore};
pub use escrow::EscrowHandler;
