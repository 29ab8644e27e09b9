// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Tripsplit", "tripsplit"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("tripsplit.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS rooms(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        trip_start TEXT,
        trip_end TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS members(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        room_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        UNIQUE(room_id, name),
        FOREIGN KEY(room_id) REFERENCES rooms(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS expenses(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        room_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        date TEXT NOT NULL,
        payer TEXT NOT NULL,
        split_kind TEXT NOT NULL CHECK(split_kind IN ('EQUAL','ITEM')),
        amount INTEGER NOT NULL DEFAULT 0,
        participants TEXT NOT NULL DEFAULT '[]', -- JSON array of member names
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(room_id) REFERENCES rooms(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_expenses_room_date ON expenses(room_id, date);

    CREATE TABLE IF NOT EXISTS expense_items(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        expense_id INTEGER NOT NULL,
        position INTEGER NOT NULL,
        title TEXT NOT NULL,
        mode TEXT NOT NULL CHECK(mode IN ('PER_PERSON','SHARED_SPLIT')),
        unit_price INTEGER,
        total_price INTEGER,
        users TEXT NOT NULL DEFAULT '[]', -- JSON array of member names
        FOREIGN KEY(expense_id) REFERENCES expenses(id) ON DELETE CASCADE
    );

    -- Lifecycle of a pairwise transfer, keyed by the (from, to) pair.
    -- Rows outlive the debts that created them; stale rows are ignored
    -- by the settlement join.
    CREATE TABLE IF NOT EXISTS transfer_status(
        room_id INTEGER NOT NULL,
        from_name TEXT NOT NULL,
        to_name TEXT NOT NULL,
        state TEXT NOT NULL CHECK(state IN ('READY','REQUESTED','DONE')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        PRIMARY KEY(room_id, from_name, to_name),
        FOREIGN KEY(room_id) REFERENCES rooms(id) ON DELETE CASCADE
    );
    "#,
    )?;
    Ok(())
}
