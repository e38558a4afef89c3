// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-memory context implementation for the Bank.
//!
//! This module provides an in-memory implementation of every adapter the
//! [`crate::manager::Bank`] needs. It is useful for testing and development
//! purposes, and for single-process deployments that do not need durability.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use thegraph_core::alloy::primitives::Address;
use thiserror::Error;

use crate::{
    bill::{Bill, BillId, NewBill},
    manager::adapters::*,
};

pub type BillStorage = Arc<RwLock<Vec<Bill>>>;
pub type EscrowStorage = Arc<RwLock<u128>>;
pub type AccountStorage = Arc<RwLock<HashMap<Address, u128>>>;

#[derive(Debug, Error)]
pub enum InMemoryError {
    #[error("something went wrong: {error}")]
    AdapterError { error: String },
}

fn poisoned<T>(_: T) -> InMemoryError {
    InMemoryError::AdapterError {
        error: "Storage lock poisoned.".to_owned(),
    }
}

#[derive(Clone)]
pub struct InMemoryContext {
    /// local stores with rwlocks to allow sharing with other components as needed
    bill_storage: BillStorage,
    escrow_storage: EscrowStorage,
    account_storage: AccountStorage,
}

impl InMemoryContext {
    pub fn new(
        bill_storage: BillStorage,
        escrow_storage: EscrowStorage,
        account_storage: AccountStorage,
    ) -> Self {
        InMemoryContext {
            bill_storage,
            escrow_storage,
            account_storage,
        }
    }

    /// Creates an empty ledger funded with `initial_escrow`.
    pub fn with_initial_escrow(initial_escrow: u128) -> Self {
        Self::new(
            Arc::new(RwLock::new(Vec::new())),
            Arc::new(RwLock::new(initial_escrow)),
            Arc::new(RwLock::new(HashMap::new())),
        )
    }

    pub fn escrow(&self) -> Result<u128, InMemoryError> {
        Ok(*self.escrow_storage.read().map_err(poisoned)?)
    }

    pub fn balance(&self, account: Address) -> Result<u128, InMemoryError> {
        let account_storage = self.account_storage.read().map_err(poisoned)?;
        Ok(account_storage.get(&account).copied().unwrap_or(0))
    }

    /// Adds `value` to the escrow, as further funding of the ledger.
    pub fn increase_escrow(&self, value: u128) -> Result<(), InMemoryError> {
        let mut escrow_storage = self.escrow_storage.write().map_err(poisoned)?;
        *escrow_storage = escrow_storage
            .checked_add(value)
            .ok_or(InMemoryError::AdapterError {
                error: "Escrow overflow.".to_owned(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl BillStore for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn store_bill(&self, bill: NewBill) -> Result<BillId, Self::AdapterError> {
        let mut bill_storage = self.bill_storage.write().map_err(poisoned)?;
        let id = bill_storage.len() as BillId;
        bill_storage.push(bill.into_bill(id));
        Ok(id)
    }

    async fn mark_cashed(&self, id: BillId) -> Result<(), Self::AdapterError> {
        let mut bill_storage = self.bill_storage.write().map_err(poisoned)?;
        let bill = bill_storage
            .get_mut(id as usize)
            .ok_or(InMemoryError::AdapterError {
                error: "No bill found with ID".to_owned(),
            })?;
        bill.cash().map_err(|err| InMemoryError::AdapterError {
            error: err.to_string(),
        })
    }
}

#[async_trait]
impl BillRead for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn bill(&self, id: BillId) -> Result<Option<Bill>, Self::AdapterError> {
        let bill_storage = self.bill_storage.read().map_err(poisoned)?;
        Ok(usize::try_from(id)
            .ok()
            .and_then(|index| bill_storage.get(index))
            .cloned())
    }

    async fn bills(&self) -> Result<Vec<Bill>, Self::AdapterError> {
        Ok(self.bill_storage.read().map_err(poisoned)?.clone())
    }

    async fn bill_count(&self) -> Result<u64, Self::AdapterError> {
        Ok(self.bill_storage.read().map_err(poisoned)?.len() as u64)
    }
}

#[async_trait]
impl EscrowHandler for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn escrow_balance(&self) -> Result<u128, Self::AdapterError> {
        self.escrow()
    }

    async fn account_balance(&self, account: Address) -> Result<u128, Self::AdapterError> {
        self.balance(account)
    }

    async fn transfer(&self, recipient: Address, amount: u128) -> Result<(), Self::AdapterError> {
        // escrow is always locked before accounts
        let mut escrow_storage = self.escrow_storage.write().map_err(poisoned)?;
        let mut account_storage = self.account_storage.write().map_err(poisoned)?;

        let new_escrow =
            escrow_storage
                .checked_sub(amount)
                .ok_or(InMemoryError::AdapterError {
                    error: "Provided value is greater than existing escrow.".to_owned(),
                })?;
        let current_balance = account_storage.get(&recipient).copied().unwrap_or(0);
        let new_balance =
            current_balance
                .checked_add(amount)
                .ok_or(InMemoryError::AdapterError {
                    error: "Recipient balance overflow.".to_owned(),
                })?;

        *escrow_storage = new_escrow;
        account_storage.insert(recipient, new_balance);
        Ok(())
    }

    async fn revert_transfer(
        &self,
        recipient: Address,
        amount: u128,
    ) -> Result<(), Self::AdapterError> {
        let mut escrow_storage = self.escrow_storage.write().map_err(poisoned)?;
        let mut account_storage = self.account_storage.write().map_err(poisoned)?;

        let current_balance = account_storage.get(&recipient).copied().unwrap_or(0);
        let new_balance =
            current_balance
                .checked_sub(amount)
                .ok_or(InMemoryError::AdapterError {
                    error: "Provided value is greater than recipient balance.".to_owned(),
                })?;
        let new_escrow = escrow_storage
            .checked_add(amount)
            .ok_or(InMemoryError::AdapterError {
                error: "Escrow overflow.".to_owned(),
            })?;

        *escrow_storage = new_escrow;
        account_storage.insert(recipient, new_balance);
        Ok(())
    }
}
