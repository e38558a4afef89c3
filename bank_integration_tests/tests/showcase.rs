// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

// These tests run a Bank server with an in-memory ledger and drive it the way
// a payer and a set of payees would: the payer issues bills over JSON-RPC and
// each payee cashes the bills addressed to it.
use std::collections::{HashMap, HashSet};

use bank_core::{manager::IssuancePolicy, BillStatus};
use bank_integration_tests::{cash_bill, error_code, BankHarness};
use bank_server::error_codes::JsonRpcErrorCode;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rstest::*;
use thegraph_core::alloy::primitives::Address;

#[fixture]
fn http_request_size_limit() -> u32 {
    100 * 1024
}

#[fixture]
fn http_response_size_limit() -> u32 {
    1024 * 1024
}

#[fixture]
fn http_max_concurrent_connections() -> u32 {
    8
}

// Escrow funded at deployment
#[fixture]
fn initial_escrow() -> u128 {
    1_000_000
}

// Number of bills the payer issues in the sequence tests
#[fixture]
fn num_bills() -> usize {
    40
}

#[fixture]
fn payer() -> Address {
    Address::from([0x11u8; 20])
}

// Payees are drawn from a seeded PRNG so failures can be replayed.
fn payees(rng: &mut StdRng, count: usize) -> Vec<Address> {
    (0..count)
        .map(|_| Address::from(rng.random::<[u8; 20]>()))
        .collect()
}

#[rstest]
#[tokio::test]
async fn payees_cash_their_own_bills(
    http_request_size_limit: u32,
    http_response_size_limit: u32,
    http_max_concurrent_connections: u32,
    initial_escrow: u128,
    num_bills: usize,
    payer: Address,
    #[values(0, 1, 2)] random_seed: u64,
) {
    let bank = BankHarness::start(
        initial_escrow,
        IssuancePolicy::Permissive,
        http_request_size_limit,
        http_response_size_limit,
        http_max_concurrent_connections,
    )
    .await
    .unwrap();

    let mut rng = StdRng::seed_from_u64(random_seed);
    let payees = payees(&mut rng, 4);

    // Issue bills with random prices to random payees, ids follow call order
    let mut issued = Vec::new();
    for expected_id in 0..num_bills as u64 {
        let recipient = payees[rng.random_range(0..payees.len())];
        let price = rng.random_range(1..=1_000u128);
        let id = bank.issue_bill(payer, price, recipient).await.unwrap();
        assert_eq!(id, expected_id);
        issued.push((id, price, recipient));
    }

    // Every payee cashes roughly half of its bills
    let mut expected_balances: HashMap<Address, u128> = HashMap::new();
    let mut cashed = HashSet::new();
    let mut paid_out = 0u128;
    for (id, price, recipient) in &issued {
        if rng.random_bool(0.5) {
            bank.cash_bill(*recipient, *id).await.unwrap();
            cashed.insert(*id);
            *expected_balances.entry(*recipient).or_default() += price;
            paid_out += price;
        }
    }

    assert_eq!(
        bank.escrow_balance().await.unwrap(),
        initial_escrow - paid_out
    );
    for payee in &payees {
        assert_eq!(
            bank.account_balance(*payee).await.unwrap(),
            expected_balances.get(payee).copied().unwrap_or_default()
        );
    }

    // The ledger reflects exactly what was cashed
    let bills = bank.bills().await.unwrap();
    assert_eq!(bills.len(), num_bills);
    for (bill, (id, price, recipient)) in bills.iter().zip(&issued) {
        assert_eq!(bill.id(), *id);
        assert_eq!(bill.price(), *price);
        assert_eq!(bill.recipient(), *recipient);
        assert_eq!(bill.issuer(), payer);
        let expected_status = if cashed.contains(id) {
            BillStatus::Cashed
        } else {
            BillStatus::Active
        };
        assert_eq!(bill.status(), expected_status);
    }
}

#[rstest]
#[tokio::test]
async fn issuer_cannot_cash_a_bill_it_issued(
    http_request_size_limit: u32,
    http_response_size_limit: u32,
    http_max_concurrent_connections: u32,
    initial_escrow: u128,
    payer: Address,
) {
    let bank = BankHarness::start(
        initial_escrow,
        IssuancePolicy::Permissive,
        http_request_size_limit,
        http_response_size_limit,
        http_max_concurrent_connections,
    )
    .await
    .unwrap();
    let payee = Address::from([0x22u8; 20]);

    // payer is the recipient of bill 0 and the issuer of bill 1
    let to_payer = bank.issue_bill(payee, 30, payer).await.unwrap();
    let to_payee = bank.issue_bill(payer, 70, payee).await.unwrap();

    let err = bank.cash_bill(payer, to_payee).await.unwrap_err();
    assert_eq!(
        error_code(&err),
        Some(JsonRpcErrorCode::Unauthorized as i32)
    );

    bank.cash_bill(payer, to_payer).await.unwrap();
    bank.cash_bill(payee, to_payee).await.unwrap();

    assert_eq!(bank.account_balance(payer).await.unwrap(), 30);
    assert_eq!(bank.account_balance(payee).await.unwrap(), 70);
    assert_eq!(bank.escrow_balance().await.unwrap(), initial_escrow - 100);
}

#[rstest]
#[tokio::test]
async fn bill_is_paid_once_under_concurrent_requests(
    http_request_size_limit: u32,
    http_response_size_limit: u32,
    http_max_concurrent_connections: u32,
    initial_escrow: u128,
    payer: Address,
) {
    let bank = BankHarness::start(
        initial_escrow,
        IssuancePolicy::Permissive,
        http_request_size_limit,
        http_response_size_limit,
        http_max_concurrent_connections,
    )
    .await
    .unwrap();
    let payee = Address::from([0x33u8; 20]);
    let id = bank.issue_bill(payer, 500, payee).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..http_max_concurrent_connections {
        let client = bank.new_client().unwrap();
        tasks.push(tokio::spawn(
            async move { cash_bill(&client, payee, id).await },
        ));
    }

    let mut successes = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => successes += 1,
            Err(err) => assert_eq!(
                error_code(&err),
                Some(JsonRpcErrorCode::AlreadyCashed as i32)
            ),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(bank.account_balance(payee).await.unwrap(), 500);
    assert_eq!(bank.escrow_balance().await.unwrap(), initial_escrow - 500);
}

#[rstest]
#[tokio::test]
async fn unknown_bill_is_not_found(
    http_request_size_limit: u32,
    http_response_size_limit: u32,
    http_max_concurrent_connections: u32,
    initial_escrow: u128,
    payer: Address,
) {
    let bank = BankHarness::start(
        initial_escrow,
        IssuancePolicy::Permissive,
        http_request_size_limit,
        http_response_size_limit,
        http_max_concurrent_connections,
    )
    .await
    .unwrap();

    let err = bank.all_bills(0).await.unwrap_err();
    assert_eq!(
        error_code(&err),
        Some(JsonRpcErrorCode::BillNotFound as i32)
    );

    let err = bank.cash_bill(payer, 0).await.unwrap_err();
    assert_eq!(
        error_code(&err),
        Some(JsonRpcErrorCode::BillNotFound as i32)
    );
    assert_eq!(bank.escrow_balance().await.unwrap(), initial_escrow);
}

#[rstest]
#[case::permissive(IssuancePolicy::Permissive, 2)]
#[case::reserve(IssuancePolicy::Reserve, 1)]
#[tokio::test]
async fn escrow_shortfall(
    http_request_size_limit: u32,
    http_response_size_limit: u32,
    http_max_concurrent_connections: u32,
    payer: Address,
    #[case] policy: IssuancePolicy,
    #[case] expected_bills: usize,
) {
    let bank = BankHarness::start(
        100,
        policy,
        http_request_size_limit,
        http_response_size_limit,
        http_max_concurrent_connections,
    )
    .await
    .unwrap();
    let payee = Address::from([0x44u8; 20]);

    let first = bank.issue_bill(payer, 80, payee).await.unwrap();
    let second = bank.issue_bill(payer, 80, payee).await;

    match policy {
        IssuancePolicy::Reserve => assert_eq!(
            error_code(&second.unwrap_err()),
            Some(JsonRpcErrorCode::InsufficientEscrow as i32)
        ),
        IssuancePolicy::Permissive => {
            // The shortfall only shows when the second bill is cashed
            let second = second.unwrap();
            bank.cash_bill(payee, first).await.unwrap();
            let err = bank.cash_bill(payee, second).await.unwrap_err();
            assert_eq!(
                error_code(&err),
                Some(JsonRpcErrorCode::TransferFailed as i32)
            );
            assert_eq!(
                bank.all_bills(second).await.unwrap().status(),
                BillStatus::Active
            );
        }
    }

    assert_eq!(bank.bills().await.unwrap().len(), expected_bills);
}
