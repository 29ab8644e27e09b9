// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use tripsplit::models::{ExpenseRecord, SplitKind};
use tripsplit::{cli, commands::expenses, store};

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE settings(key TEXT PRIMARY KEY, value TEXT NOT NULL);
        CREATE TABLE rooms(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            trip_start TEXT,
            trip_end TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE TABLE members(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            room_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            UNIQUE(room_id, name),
            FOREIGN KEY(room_id) REFERENCES rooms(id) ON DELETE CASCADE
        );
        CREATE TABLE expenses(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            room_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            date TEXT NOT NULL,
            payer TEXT NOT NULL,
            split_kind TEXT NOT NULL,
            amount INTEGER NOT NULL DEFAULT 0,
            participants TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY(room_id) REFERENCES rooms(id) ON DELETE CASCADE
        );
        CREATE TABLE expense_items(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            expense_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            title TEXT NOT NULL,
            mode TEXT NOT NULL,
            unit_price INTEGER,
            total_price INTEGER,
            users TEXT NOT NULL DEFAULT '[]',
            FOREIGN KEY(expense_id) REFERENCES expenses(id) ON DELETE CASCADE
        );
        "#,
    )
    .unwrap();
    conn.execute("INSERT INTO rooms(name) VALUES('Jeju')", [])
        .unwrap();
    for name in ["Hyeonseo", "Mina", "Jun"] {
        conn.execute(
            "INSERT INTO members(room_id, name) VALUES(1, ?1)",
            [name],
        )
        .unwrap();
    }
    conn
}

fn run_expense(conn: &mut Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["tripsplit", "expense"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("expense", sub)) = matches.subcommand() {
        expenses::handle(conn, sub)
    } else {
        panic!("expense command not parsed");
    }
}

#[test]
fn add_equal_records_expense() {
    let mut conn = setup();
    run_expense(
        &mut conn,
        &[
            "add-equal",
            "--room",
            "Jeju",
            "--title",
            "Dinner",
            "--date",
            "2025-08-02",
            "--payer",
            "Hyeonseo",
            "--amount",
            "45000",
            "--participants",
            "Hyeonseo, Mina, Jun",
        ],
    )
    .unwrap();

    let expenses = store::list_expenses(&conn, 1).unwrap();
    assert_eq!(expenses.len(), 1);
    let e = &expenses[0];
    assert_eq!(e.title, "Dinner");
    assert_eq!(e.split, SplitKind::Equal);
    assert_eq!(e.amount, 45000);
    assert_eq!(e.participants, vec!["Hyeonseo", "Mina", "Jun"]);
    assert_eq!(e.total(), 45000);
}

#[test]
fn add_items_derives_the_total() {
    let mut conn = setup();
    run_expense(
        &mut conn,
        &[
            "add-items",
            "--room",
            "Jeju",
            "--title",
            "Cafe",
            "--date",
            "2025-08-02",
            "--payer",
            "Mina",
            "--item",
            "Americano;per-person;4500;Hyeonseo,Jun",
            "--item",
            "Cake;shared;10500;Hyeonseo,Mina,Jun",
        ],
    )
    .unwrap();

    let expenses = store::list_expenses(&conn, 1).unwrap();
    assert_eq!(expenses.len(), 1);
    let e = &expenses[0];
    assert_eq!(e.split, SplitKind::Item);
    assert_eq!(e.items.len(), 2);
    // 4500 x 2 + 10500
    assert_eq!(e.total(), 19500);
    let stored: i64 = conn
        .query_row("SELECT amount FROM expenses WHERE id=1", [], |r| r.get(0))
        .unwrap();
    assert_eq!(stored, 19500);
}

#[test]
fn non_member_is_rejected() {
    let mut conn = setup();
    let err = run_expense(
        &mut conn,
        &[
            "add-equal",
            "--room",
            "Jeju",
            "--title",
            "Dinner",
            "--date",
            "2025-08-02",
            "--payer",
            "Hyeonseo",
            "--amount",
            "45000",
            "--participants",
            "Hyeonseo, Stranger",
        ],
    )
    .unwrap_err();
    assert!(err.to_string().contains("not a member"));
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM expenses", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn invalid_records_never_hit_the_store() {
    let mut conn = setup();
    let bad = ExpenseRecord {
        id: 0,
        room_id: 1,
        title: "Dinner".into(),
        date: "2025-08-02".into(),
        payer: "Hyeonseo".into(),
        split: SplitKind::Equal,
        amount: 45000,
        participants: Vec::new(),
        items: Vec::new(),
    };
    let err = store::insert_expense(&mut conn, &bad).unwrap_err();
    assert!(err.to_string().contains("invalid expense"));
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM expenses", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn zero_amount_is_rejected_at_parse_time() {
    let mut conn = setup();
    let err = run_expense(
        &mut conn,
        &[
            "add-equal",
            "--room",
            "Jeju",
            "--title",
            "Dinner",
            "--date",
            "2025-08-02",
            "--payer",
            "Hyeonseo",
            "--amount",
            "0",
            "--participants",
            "Hyeonseo, Mina",
        ],
    )
    .unwrap_err();
    assert!(err.to_string().contains("positive"));
}

#[test]
fn list_filters_by_date() {
    let mut conn = setup();
    for (title, date) in [("Lunch", "2025-08-02"), ("Taxi", "2025-08-03")] {
        run_expense(
            &mut conn,
            &[
                "add-equal",
                "--room",
                "Jeju",
                "--title",
                title,
                "--date",
                date,
                "--payer",
                "Jun",
                "--amount",
                "12000",
                "--participants",
                "Hyeonseo, Mina, Jun",
            ],
        )
        .unwrap();
    }

    let matches = cli::build_cli().get_matches_from([
        "tripsplit", "expense", "list", "--room", "Jeju", "--date", "2025-08-03",
    ]);
    let Some(("expense", sub)) = matches.subcommand() else {
        panic!("expense command not parsed");
    };
    let Some(("list", list_m)) = sub.subcommand() else {
        panic!("no list subcommand");
    };
    let rows = expenses::query_rows(&conn, list_m).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Taxi");
}

#[test]
fn rm_deletes_expense_and_items() {
    let mut conn = setup();
    run_expense(
        &mut conn,
        &[
            "add-items",
            "--room",
            "Jeju",
            "--title",
            "Cafe",
            "--date",
            "2025-08-02",
            "--payer",
            "Mina",
            "--item",
            "Latte;per-person;5000;Hyeonseo,Jun",
        ],
    )
    .unwrap();
    run_expense(&mut conn, &["rm", "--room", "Jeju", "--id", "1"]).unwrap();

    assert!(store::list_expenses(&conn, 1).unwrap().is_empty());
    let items: i64 = conn
        .query_row("SELECT COUNT(*) FROM expense_items", [], |r| r.get(0))
        .unwrap();
    assert_eq!(items, 0);
}
