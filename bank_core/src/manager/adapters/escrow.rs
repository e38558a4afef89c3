// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use thegraph_core::alloy::primitives::Address;

/// `EscrowHandler` is the value transfer gateway of the ledger.
///
/// It owns the escrowed balance held by the ledger and the account balances
/// value is paid out to. The error handling is customizable by defining an
/// `AdapterError` type, which must implement both `Error` and `Debug` from the
/// standard library.
///
/// # Usage
///
/// The `transfer` method is called by [crate::manager::Bank] while it holds
/// exclusive access to the ledger, and the bill is only marked as cashed once
/// the transfer is confirmed. A transfer must therefore either fully complete
/// (escrow debited and recipient credited) or fail with no effect at all, and
/// it must never take escrow below zero.
///
/// # Example
///
/// For example code see [crate::manager::context::memory::InMemoryContext]

#[async_trait]
pub trait EscrowHandler: Send + Sync {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from
    /// the standard library.
    /// Errors of this type are returned to the user when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    /// Retrieves the value currently held in escrow by the ledger.
    async fn escrow_balance(&self) -> Result<u128, Self::AdapterError>;

    /// Retrieves the balance of `account`. Unknown accounts hold nothing.
    async fn account_balance(&self, account: Address) -> Result<u128, Self::AdapterError>;

    /// Moves `amount` from escrow to `recipient`.
    async fn transfer(&self, recipient: Address, amount: u128) -> Result<(), Self::AdapterError>;

    /// Undoes a `transfer(recipient, amount)` that has just succeeded.
    ///
    /// Only used by the Bank to roll back a redemption whose status update
    /// could not be stored.
    async fn revert_transfer(
        &self,
        recipient: Address,
        amount: u128,
    ) -> Result<(), Self::AdapterError>;
}
