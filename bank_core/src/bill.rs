// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Bills
//!
//! A [`Bill`] is a single payment instrument issued by the ledger. Its terms
//! (id, price, issuer, recipient, timestamp) are fixed at issuance; the only
//! thing that ever changes is its [`BillStatus`], and only from
//! [`BillStatus::Active`] to [`BillStatus::Cashed`].

use serde::{Deserialize, Serialize};
use thegraph_core::alloy::primitives::Address;

use crate::Error;

/// Ledger-assigned identifier of a bill. Ids start at 0 and grow by one per issuance.
pub type BillId = u64;

/// Lifecycle state of a bill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillStatus {
    /// Issued and waiting to be redeemed by its recipient
    Active,
    /// Redeemed. Terminal.
    Cashed,
}

/// Terms of a bill before the ledger assigns it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBill {
    pub price: u128,
    pub timestamp_ns: u64,
    pub issuer: Address,
    pub recipient: Address,
}

impl NewBill {
    /// Turns the terms into an `Active` bill with the given id.
    pub fn into_bill(self, id: BillId) -> Bill {
        Bill {
            id,
            price: self.price,
            timestamp_ns: self.timestamp_ns,
            issuer: self.issuer,
            recipient: self.recipient,
            status: BillStatus::Active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    id: BillId,
    price: u128,
    timestamp_ns: u64,
    issuer: Address,
    recipient: Address,
    status: BillStatus,
}

impl Bill {
    pub fn id(&self) -> BillId {
        self.id
    }

    pub fn price(&self) -> u128 {
        self.price
    }

    pub fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    pub fn issuer(&self) -> Address {
        self.issuer
    }

    pub fn recipient(&self) -> Address {
        self.recipient
    }

    pub fn status(&self) -> BillStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == BillStatus::Active
    }

    /// Moves the bill to [`BillStatus::Cashed`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyCashed`] if the bill is not active.
    pub fn cash(&mut self) -> Result<(), Error> {
        if self.status != BillStatus::Active {
            return Err(Error::AlreadyCashed { id: self.id });
        }
        self.status = BillStatus::Cashed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;
    use thegraph_core::alloy::primitives::{address, Address};

    use super::*;

    #[fixture]
    fn terms() -> NewBill {
        NewBill {
            price: 100,
            timestamp_ns: 1_700_000_000_000_000_000,
            issuer: address!("0xabababababababababababababababababababab"),
            recipient: address!("0xdeaddeaddeaddeaddeaddeaddeaddeaddeaddead"),
        }
    }

    #[rstest]
    fn new_bill_keeps_its_terms(terms: NewBill) {
        let bill = terms.clone().into_bill(7);
        assert_eq!(bill.id(), 7);
        assert_eq!(bill.price(), terms.price);
        assert_eq!(bill.timestamp_ns(), terms.timestamp_ns);
        assert_eq!(bill.issuer(), terms.issuer);
        assert_eq!(bill.recipient(), terms.recipient);
        assert_eq!(bill.status(), BillStatus::Active);
    }

    #[rstest]
    fn cashing_is_one_way(terms: NewBill) {
        let mut bill = terms.into_bill(0);
        bill.cash().unwrap();
        assert_eq!(bill.status(), BillStatus::Cashed);

        let err = bill.cash().unwrap_err();
        assert!(matches!(err, Error::AlreadyCashed { id: 0 }));
        assert_eq!(bill.status(), BillStatus::Cashed);
    }

    #[rstest]
    fn bill_serializes_in_camel_case(terms: NewBill) {
        let bill = terms.into_bill(3);
        let json = serde_json::to_value(&bill).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["status"], "Active");
        assert!(json.get("timestampNs").is_some());
        assert_eq!(
            json["recipient"].as_str().unwrap().parse::<Address>().unwrap(),
            bill.recipient()
        );

        let decoded: Bill = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, bill);
    }
}
