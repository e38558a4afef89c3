// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;

use log::{debug, error};
use thegraph_core::alloy::primitives::Address;
use tokio::sync::Mutex;

use super::adapters::{BillRead, BillStore, EscrowHandler};
use crate::{
    bill::{Bill, BillId, NewBill},
    Error,
};

/// Decides whether issuing a bill requires free escrow to back it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IssuancePolicy {
    /// Bills are issued without looking at escrow. Solvency is only enforced
    /// when a bill is cashed, where a short escrow makes the transfer fail.
    #[default]
    Permissive,
    /// A bill is only issued if its price fits in the escrow not yet committed
    /// to other active bills, so active bills are always fully backed.
    Reserve,
}

/// Custodial ledger of bills backed by an escrowed balance.
///
/// `Bank` is generic over a context `E` that stores the bills ([`BillStore`],
/// [`BillRead`]) and moves value out of escrow ([`EscrowHandler`]). Every
/// operation runs under a single lock, so operations never interleave.
///
/// Cashing is all-or-nothing from the caller's point of view: value leaves
/// escrow only together with the status flip of the bill. When the flip fails
/// and the transfer cannot be reverted either, the bill is frozen: it can no
/// longer be cashed and is reported by [`Bank::frozen_bills`] until an
/// operator reconciles it.
pub struct Bank<E> {
    /// Context that implements adapters
    context: E,

    issuance_policy: IssuancePolicy,

    /// Serializes every operation. Held for the full duration of an operation,
    /// gateway calls included, so no caller ever observes a half-applied one.
    /// Guards the ids of frozen bills.
    lock: Mutex<HashSet<BillId>>,
}

impl<E> Bank<E> {
    /// Creates a new bank on top of `context`, which holds the bills and the
    /// escrow funded at deployment.
    pub fn new(context: E, issuance_policy: IssuancePolicy) -> Self {
        Self {
            context,
            issuance_policy,
            lock: Mutex::new(HashSet::new()),
        }
    }

    pub fn context(&self) -> &E {
        &self.context
    }

    pub fn issuance_policy(&self) -> IssuancePolicy {
        self.issuance_policy
    }
}

impl<E> Bank<E>
where
    E: BillRead,
{
    async fn find_bill(&self, id: BillId) -> Result<Bill, Error> {
        self.context
            .bill(id)
            .await
            .map_err(|err| Error::AdapterError {
                source_error: anyhow::Error::new(err),
            })?
            .ok_or(Error::NotFound { id })
    }

    /// Sums the prices of active bills, frozen ones excluded since their value
    /// has already left escrow.
    async fn sum_outstanding(&self, frozen: &HashSet<BillId>) -> Result<u128, Error> {
        let bills = self
            .context
            .bills()
            .await
            .map_err(|err| Error::AdapterError {
                source_error: anyhow::Error::new(err),
            })?;
        Ok(bills
            .iter()
            .filter(|bill| bill.is_active() && !frozen.contains(&bill.id()))
            .fold(0u128, |total, bill| total.saturating_add(bill.price())))
    }

    /// Returns the full record of bill `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no bill was ever issued with that id.
    ///
    pub async fn all_bills(&self, id: BillId) -> Result<Bill, Error> {
        let _guard = self.lock.lock().await;
        self.find_bill(id).await
    }

    /// Returns every bill ever issued, ordered by id.
    pub async fn bills(&self) -> Result<Vec<Bill>, Error> {
        let _guard = self.lock.lock().await;
        self.context
            .bills()
            .await
            .map_err(|err| Error::AdapterError {
                source_error: anyhow::Error::new(err),
            })
    }

    pub async fn bill_count(&self) -> Result<u64, Error> {
        let _guard = self.lock.lock().await;
        self.context
            .bill_count()
            .await
            .map_err(|err| Error::AdapterError {
                source_error: anyhow::Error::new(err),
            })
    }

    /// Sum of the prices of all active bills, i.e. what the ledger still owes.
    pub async fn outstanding_balance(&self) -> Result<u128, Error> {
        let frozen = self.lock.lock().await;
        self.sum_outstanding(&frozen).await
    }

    /// Ids of the bills that were paid out without their status being
    /// recorded, in id order.
    pub async fn frozen_bills(&self) -> Vec<BillId> {
        let frozen = self.lock.lock().await;
        let mut ids: Vec<_> = frozen.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl<E> Bank<E>
where
    E: EscrowHandler,
{
    pub async fn escrow_balance(&self) -> Result<u128, Error> {
        let _guard = self.lock.lock().await;
        self.context
            .escrow_balance()
            .await
            .map_err(|err| Error::AdapterError {
                source_error: anyhow::Error::new(err),
            })
    }

    pub async fn account_balance(&self, account: Address) -> Result<u128, Error> {
        let _guard = self.lock.lock().await;
        self.context
            .account_balance(account)
            .await
            .map_err(|err| Error::AdapterError {
                source_error: anyhow::Error::new(err),
            })
    }
}

impl<E> Bank<E>
where
    E: BillStore + BillRead + EscrowHandler,
{
    /// Issues a new bill of `price` from `caller` to `recipient` and returns its id.
    ///
    /// Ids are handed out in call order starting at 0. Escrow is left untouched:
    /// the funds backing the bill are expected to be in escrow already.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecipient`] if `recipient` is the zero address.
    ///
    /// Returns [`Error::InsufficientEscrow`] if the policy is
    /// [`IssuancePolicy::Reserve`] and `price` is larger than the escrow not yet
    /// committed to active bills.
    ///
    /// Returns [`Error::AdapterError`] if there are any errors while reading
    /// escrow or storing the bill
    ///
    pub async fn issue_bill(
        &self,
        caller: Address,
        price: u128,
        recipient: Address,
    ) -> Result<BillId, Error> {
        if recipient == Address::ZERO {
            return Err(Error::InvalidRecipient { recipient });
        }

        let frozen = self.lock.lock().await;

        if self.issuance_policy == IssuancePolicy::Reserve {
            let escrow = self
                .context
                .escrow_balance()
                .await
                .map_err(|err| Error::AdapterError {
                    source_error: anyhow::Error::new(err),
                })?;
            let available = escrow.saturating_sub(self.sum_outstanding(&frozen).await?);
            if price > available {
                return Err(Error::InsufficientEscrow {
                    requested: price,
                    available,
                });
            }
        }

        let timestamp_ns = crate::get_current_timestamp_u64_ns()?;
        let id = self
            .context
            .store_bill(NewBill {
                price,
                timestamp_ns,
                issuer: caller,
                recipient,
            })
            .await
            .map_err(|err| Error::AdapterError {
                source_error: anyhow::Error::new(err),
            })?;

        debug!("Issued bill {id}: {price} from {caller} to {recipient}");
        Ok(id)
    }

    /// Redeems bill `id` on behalf of `caller`, paying its price out of escrow
    /// to the recipient and marking it as cashed. Returns the amount paid.
    ///
    /// Checks run in order: the bill exists, it is still active, `caller`
    /// is its recipient, and the bill is not frozen. The first failing check
    /// decides the error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`], [`Error::AlreadyCashed`] or
    /// [`Error::Unauthorized`] when a check fails.
    ///
    /// Returns [`Error::TransferFailed`] if the gateway could not move the value,
    /// in which case the bill stays active.
    ///
    /// Returns [`Error::AdapterError`] if the status update could not be stored.
    /// The transfer is reverted before returning.
    ///
    /// Returns [`Error::Unreconciled`] if the revert failed too, and on every
    /// later attempt to cash the same bill.
    ///
    pub async fn cash_bill(&self, caller: Address, id: BillId) -> Result<u128, Error> {
        let mut frozen = self.lock.lock().await;

        let bill = self.find_bill(id).await?;
        if !bill.is_active() {
            debug!("Rejected cashing of bill {id} by {caller}: already cashed");
            return Err(Error::AlreadyCashed { id });
        }
        if bill.recipient() != caller {
            debug!("Rejected cashing of bill {id} by {caller}: not the recipient");
            return Err(Error::Unauthorized { id, caller });
        }
        if frozen.contains(&id) {
            debug!("Rejected cashing of bill {id} by {caller}: frozen");
            return Err(Error::Unreconciled { id });
        }

        let recipient = bill.recipient();
        let amount = bill.price();
        self.context
            .transfer(recipient, amount)
            .await
            .map_err(|err| Error::TransferFailed {
                recipient,
                amount,
                source_error: anyhow::Error::new(err),
            })?;

        if let Err(err) = self.context.mark_cashed(id).await {
            if let Err(revert_err) = self.context.revert_transfer(recipient, amount).await {
                error!(
                    "Bill {id} frozen: {amount} paid to {recipient} but the status update \
                    failed ({err}) and the transfer could not be reverted: {revert_err}"
                );
                frozen.insert(id);
                return Err(Error::Unreconciled { id });
            }
            return Err(Error::AdapterError {
                source_error: anyhow::Error::new(err),
            });
        }

        debug!("Cashed bill {id}: {amount} paid to {recipient}");
        Ok(amount)
    }
}
