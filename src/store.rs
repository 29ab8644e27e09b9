// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, params};

use crate::models::{ExpenseRecord, ItemMode, LineItem, SplitKind, TransferState};
use crate::settlement::PairKey;

fn names_to_json(names: &[String]) -> Result<String> {
    serde_json::to_string(names).context("Encode name list")
}

fn names_from_json(raw: &str) -> Vec<String> {
    // Tolerate hand-edited rows the way the app always has: garbage
    // decodes to an empty list, which settlement treats as contributing
    // nothing.
    serde_json::from_str(raw).unwrap_or_default()
}

/// Validate and persist one expense record with its items. Returns the
/// new row id. Nothing is written when validation fails.
pub fn insert_expense(conn: &mut Connection, expense: &ExpenseRecord) -> Result<i64> {
    expense
        .validate()
        .map_err(|e| anyhow!("invalid expense: {e}"))?;

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO expenses(room_id, title, date, payer, split_kind, amount, participants)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            expense.room_id,
            expense.title,
            expense.date,
            expense.payer,
            expense.split.as_str(),
            expense.total(),
            names_to_json(&expense.participants)?,
        ],
    )?;
    let expense_id = tx.last_insert_rowid();

    for (position, item) in expense.items.iter().enumerate() {
        tx.execute(
            "INSERT INTO expense_items(expense_id, position, title, mode, unit_price, total_price, users)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                expense_id,
                position as i64,
                item.title,
                item.mode.as_str(),
                item.unit_price,
                item.total_price,
                names_to_json(&item.users)?,
            ],
        )?;
    }
    tx.commit()?;
    Ok(expense_id)
}

/// All expense records of a room, oldest first, items in entry order.
pub fn list_expenses(conn: &Connection, room_id: i64) -> Result<Vec<ExpenseRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, date, payer, split_kind, amount, participants
         FROM expenses WHERE room_id=?1 ORDER BY id",
    )?;
    let mut rows = stmt.query(params![room_id])?;

    let mut expenses = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let kind: String = r.get(4)?;
        let participants: String = r.get(6)?;
        expenses.push(ExpenseRecord {
            id,
            room_id,
            title: r.get(1)?,
            date: r.get(2)?,
            payer: r.get(3)?,
            split: SplitKind::parse(&kind)
                .ok_or_else(|| anyhow!("Unknown split kind '{}' on expense {}", kind, id))?,
            amount: r.get(5)?,
            participants: names_from_json(&participants),
            items: Vec::new(),
        });
    }

    let mut by_id: HashMap<i64, usize> = HashMap::new();
    for (idx, e) in expenses.iter().enumerate() {
        by_id.insert(e.id, idx);
    }

    let mut stmt = conn.prepare(
        "SELECT i.expense_id, i.title, i.mode, i.unit_price, i.total_price, i.users
         FROM expense_items i JOIN expenses e ON i.expense_id=e.id
         WHERE e.room_id=?1 ORDER BY i.expense_id, i.position",
    )?;
    let mut rows = stmt.query(params![room_id])?;
    while let Some(r) = rows.next()? {
        let expense_id: i64 = r.get(0)?;
        let mode: String = r.get(2)?;
        let users: String = r.get(5)?;
        let item = LineItem {
            title: r.get(1)?,
            mode: ItemMode::parse(&mode)
                .ok_or_else(|| anyhow!("Unknown item mode '{}' on expense {}", mode, expense_id))?,
            unit_price: r.get(3)?,
            total_price: r.get(4)?,
            users: names_from_json(&users),
        };
        if let Some(&idx) = by_id.get(&expense_id) {
            expenses[idx].items.push(item);
        }
    }
    Ok(expenses)
}

/// Remove one expense (items cascade). Returns false when the id does not
/// belong to the room. Any transfer-status rows its debts fed are left in
/// place and simply stop being surfaced.
pub fn delete_expense(conn: &Connection, room_id: i64, expense_id: i64) -> Result<bool> {
    let n = conn.execute(
        "DELETE FROM expenses WHERE id=?1 AND room_id=?2",
        params![expense_id, room_id],
    )?;
    Ok(n > 0)
}

/// The persisted lifecycle table for a room. Pairs absent here are READY.
pub fn load_status_map(conn: &Connection, room_id: i64) -> Result<HashMap<PairKey, TransferState>> {
    let mut stmt = conn
        .prepare("SELECT from_name, to_name, state FROM transfer_status WHERE room_id=?1")?;
    let mut rows = stmt.query(params![room_id])?;
    let mut map = HashMap::new();
    while let Some(r) = rows.next()? {
        let from: String = r.get(0)?;
        let to: String = r.get(1)?;
        let state: String = r.get(2)?;
        let state = TransferState::parse(&state)
            .ok_or_else(|| anyhow!("Unknown transfer state '{}' for {} -> {}", state, from, to))?;
        map.insert((from, to), state);
    }
    Ok(map)
}

/// Move every given pair to `state` together (bulk request and the
/// single-pair transitions both funnel through here).
pub fn save_status(
    conn: &mut Connection,
    room_id: i64,
    pairs: &[PairKey],
    state: TransferState,
) -> Result<()> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO transfer_status(room_id, from_name, to_name, state, updated_at)
             VALUES (?1, ?2, ?3, ?4, datetime('now'))
             ON CONFLICT(room_id, from_name, to_name)
             DO UPDATE SET state=excluded.state, updated_at=excluded.updated_at",
        )?;
        for (from, to) in pairs {
            stmt.execute(params![room_id, from, to, state.as_str()])?;
        }
    }
    tx.commit()?;
    Ok(())
}
