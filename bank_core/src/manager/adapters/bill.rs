// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::bill::{Bill, BillId, NewBill};

/// Stores bills in the storage.
///
/// # Example
///
/// For example code see [crate::manager::context::memory::InMemoryContext]
#[async_trait]
pub trait BillStore: Send + Sync {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from the standard library.
    /// Errors of this type are returned to the user when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    /// Appends a new `Active` bill built from `bill` to the storage.
    ///
    /// The returned id must be the number of bills stored before this one, so that
    /// ids are handed out as `0, 1, 2, ...` and never reused. If an error is returned,
    /// nothing must have been stored.
    async fn store_bill(&self, bill: NewBill) -> Result<BillId, Self::AdapterError>;

    /// Flips the status of bill `id` to `Cashed`.
    ///
    /// This is the only mutation a stored bill ever goes through. If an error is
    /// returned, the bill must be left untouched.
    async fn mark_cashed(&self, id: BillId) -> Result<(), Self::AdapterError>;
}

/// Retrieves bills from storage.
///
/// # Example
///
/// For example code see [crate::manager::context::memory::InMemoryContext]
#[async_trait]
pub trait BillRead: Send + Sync {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from
    /// the standard library.
    /// Errors of this type are returned to the user when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    /// Retrieves the bill with the given id, or `None` if it was never issued.
    async fn bill(&self, id: BillId) -> Result<Option<Bill>, Self::AdapterError>;

    /// Retrieves every bill ever issued, ordered by id.
    async fn bills(&self) -> Result<Vec<Bill>, Self::AdapterError>;

    /// Number of bills ever issued.
    async fn bill_count(&self) -> Result<u64, Self::AdapterError> {
        Ok(self.bills().await?.len() as u64)
    }
}
