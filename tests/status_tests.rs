// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use rusqlite::Connection;
use tripsplit::models::{ExpenseRecord, SplitKind, TransferState};
use tripsplit::settlement::{
    PairKey, SettlementError, aggregate, assemble, mark_done, request, request_all, resend,
};
use tripsplit::store;

fn equal(id: i64, payer: &str, amount: i64, participants: &[&str]) -> ExpenseRecord {
    ExpenseRecord {
        id,
        room_id: 1,
        title: format!("expense {}", id),
        date: "2025-08-01".into(),
        payer: payer.into(),
        split: SplitKind::Equal,
        amount,
        participants: participants.iter().map(|s| s.to_string()).collect(),
        items: Vec::new(),
    }
}

// One debt: B -> A 1000
fn one_debt() -> Vec<ExpenseRecord> {
    vec![equal(1, "A", 2000, &["A", "B"])]
}

fn fresh_status() -> HashMap<PairKey, TransferState> {
    HashMap::new()
}

#[test]
fn new_transfers_default_to_ready() {
    let view = assemble(aggregate(&one_debt()), &fresh_status(), "A");
    assert_eq!(view.transfers.len(), 1);
    assert_eq!(view.transfers[0].state, TransferState::Ready);
}

#[test]
fn creditor_requests_ready_transfer() {
    let mut status = fresh_status();
    let view = assemble(aggregate(&one_debt()), &status, "A");
    request(&view, &mut status, "A", "B", "A").unwrap();
    assert_eq!(
        status.get(&("B".into(), "A".into())),
        Some(&TransferState::Requested)
    );
}

#[test]
fn debtor_cannot_request() {
    let mut status = fresh_status();
    let view = assemble(aggregate(&one_debt()), &status, "B");
    let err = request(&view, &mut status, "B", "B", "A").unwrap_err();
    assert!(matches!(err, SettlementError::IllegalTransition { .. }));
    assert!(status.is_empty());
}

#[test]
fn request_twice_is_rejected() {
    let mut status = fresh_status();
    let view = assemble(aggregate(&one_debt()), &status, "A");
    request(&view, &mut status, "A", "B", "A").unwrap();

    let view = assemble(aggregate(&one_debt()), &status, "A");
    let err = request(&view, &mut status, "A", "B", "A").unwrap_err();
    assert!(matches!(err, SettlementError::IllegalTransition { .. }));
}

#[test]
fn resend_keeps_requested() {
    let mut status = fresh_status();
    let view = assemble(aggregate(&one_debt()), &status, "A");
    request(&view, &mut status, "A", "B", "A").unwrap();

    let view = assemble(aggregate(&one_debt()), &status, "A");
    resend(&view, &mut status, "A", "B", "A").unwrap();
    assert_eq!(
        status.get(&("B".into(), "A".into())),
        Some(&TransferState::Requested)
    );
}

#[test]
fn resend_before_request_is_rejected() {
    let mut status = fresh_status();
    let view = assemble(aggregate(&one_debt()), &status, "A");
    let err = resend(&view, &mut status, "A", "B", "A").unwrap_err();
    assert!(matches!(err, SettlementError::IllegalTransition { .. }));
}

#[test]
fn done_requires_an_outstanding_request() {
    let mut status = fresh_status();
    let view = assemble(aggregate(&one_debt()), &status, "A");
    let err = mark_done(&view, &mut status, "A", "B", "A").unwrap_err();
    assert!(matches!(err, SettlementError::IllegalTransition { .. }));
}

#[test]
fn non_creditor_cannot_mark_done() {
    // A requests B -> A, then B (the debtor) tries to close it out
    let mut status = fresh_status();
    let view = assemble(aggregate(&one_debt()), &status, "A");
    request(&view, &mut status, "A", "B", "A").unwrap();

    let view = assemble(aggregate(&one_debt()), &status, "B");
    let err = mark_done(&view, &mut status, "B", "B", "A").unwrap_err();
    assert!(matches!(err, SettlementError::IllegalTransition { .. }));
    assert_eq!(
        status.get(&("B".into(), "A".into())),
        Some(&TransferState::Requested)
    );
}

#[test]
fn done_is_terminal() {
    let mut status = fresh_status();
    let view = assemble(aggregate(&one_debt()), &status, "A");
    request(&view, &mut status, "A", "B", "A").unwrap();
    let view = assemble(aggregate(&one_debt()), &status, "A");
    mark_done(&view, &mut status, "A", "B", "A").unwrap();

    let view = assemble(aggregate(&one_debt()), &status, "A");
    assert!(request(&view, &mut status, "A", "B", "A").is_err());
    assert!(resend(&view, &mut status, "A", "B", "A").is_err());
    assert!(mark_done(&view, &mut status, "A", "B", "A").is_err());
    assert_eq!(
        status.get(&("B".into(), "A".into())),
        Some(&TransferState::Done)
    );
}

#[test]
fn unknown_transfer_is_rejected() {
    let mut status = fresh_status();
    let view = assemble(aggregate(&one_debt()), &status, "A");
    let err = request(&view, &mut status, "A", "C", "A").unwrap_err();
    assert_eq!(
        err,
        SettlementError::UnknownTransfer {
            from: "C".into(),
            to: "A".into()
        }
    );
}

// Debts into A from B and C, one already requested, one done by D
fn mixed_expenses() -> Vec<ExpenseRecord> {
    vec![
        equal(1, "A", 2000, &["A", "B"]),  // B -> A: 1000
        equal(2, "A", 600, &["A", "C"]),   // C -> A: 300
        equal(3, "A", 1000, &["A", "D"]),  // D -> A: 500
        equal(4, "B", 2400, &["B", "D"]),  // D -> B: 1200
    ]
}

#[test]
fn bulk_request_moves_exactly_the_requestable_set() {
    let mut status = fresh_status();
    status.insert(("C".into(), "A".into()), TransferState::Requested);
    status.insert(("D".into(), "A".into()), TransferState::Done);

    let view = assemble(aggregate(&mixed_expenses()), &status, "A");
    let moved = request_all(&view, &mut status, "A");

    // Only B -> A was READY and owed to A; D -> B belongs to someone else
    assert_eq!(moved, vec![("B".to_string(), "A".to_string())]);
    assert_eq!(
        status.get(&("B".into(), "A".into())),
        Some(&TransferState::Requested)
    );
    assert_eq!(
        status.get(&("C".into(), "A".into())),
        Some(&TransferState::Requested)
    );
    assert_eq!(
        status.get(&("D".into(), "A".into())),
        Some(&TransferState::Done)
    );
    assert!(!status.contains_key(&("D".into(), "B".into())));
}

#[test]
fn bulk_request_equals_individual_requests() {
    let expenses = mixed_expenses();

    let mut bulk_status = fresh_status();
    let view = assemble(aggregate(&expenses), &bulk_status, "A");
    request_all(&view, &mut bulk_status, "A");

    let mut one_by_one = fresh_status();
    let view = assemble(aggregate(&expenses), &one_by_one, "A");
    let pairs: Vec<(String, String)> = view
        .requestable("A")
        .into_iter()
        .map(|t| (t.from.clone(), t.to.clone()))
        .collect();
    for (from, to) in pairs {
        request(&view, &mut one_by_one, "A", &from, &to).unwrap();
    }

    assert_eq!(bulk_status, one_by_one);
}

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE transfer_status(
            room_id INTEGER NOT NULL,
            from_name TEXT NOT NULL,
            to_name TEXT NOT NULL,
            state TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY(room_id, from_name, to_name)
        );
        "#,
    )
    .unwrap();
    conn
}

#[test]
fn status_round_trips_through_the_store() {
    let mut conn = setup();
    store::save_status(
        &mut conn,
        7,
        &[
            ("B".to_string(), "A".to_string()),
            ("C".to_string(), "A".to_string()),
        ],
        TransferState::Requested,
    )
    .unwrap();
    store::save_status(
        &mut conn,
        7,
        &[("B".to_string(), "A".to_string())],
        TransferState::Done,
    )
    .unwrap();

    let map = store::load_status_map(&conn, 7).unwrap();
    assert_eq!(
        map.get(&("B".into(), "A".into())),
        Some(&TransferState::Done)
    );
    assert_eq!(
        map.get(&("C".into(), "A".into())),
        Some(&TransferState::Requested)
    );
    // Other rooms are untouched
    assert!(store::load_status_map(&conn, 8).unwrap().is_empty());
}

#[test]
fn stale_status_rows_are_not_surfaced() {
    let mut conn = setup();
    store::save_status(
        &mut conn,
        7,
        &[("B".to_string(), "A".to_string())],
        TransferState::Done,
    )
    .unwrap();

    // The expense behind B -> A is gone; the row stays on disk but the
    // assembled view no longer shows the pair.
    let status = store::load_status_map(&conn, 7).unwrap();
    let view = assemble(aggregate(&[]), &status, "A");
    assert!(view.transfers.is_empty());
    assert_eq!(status.len(), 1);
}
