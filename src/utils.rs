// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, OptionalExtension, params};

use crate::models::{ItemMode, LineItem};

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Amounts are smallest-unit integers (won); no fractional input.
pub fn parse_amount(s: &str) -> Result<i64> {
    let v: i64 = s
        .trim()
        .parse()
        .with_context(|| format!("Invalid amount '{}', expected a whole number", s))?;
    if v <= 0 {
        return Err(anyhow!("Amount must be positive, got {}", v));
    }
    Ok(v)
}

/// Comma-separated name list; trims entries, drops empties, keeps first
/// occurrence on duplicates.
pub fn parse_names(s: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in s.split(',') {
        let name = part.trim();
        if !name.is_empty() && !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    out
}

/// One `--item` spec: `TITLE;per-person|shared;PRICE;USER,USER,...`
/// per-person charges PRICE to each user; shared divides PRICE across them.
pub fn parse_item_spec(s: &str) -> Result<LineItem> {
    let parts: Vec<&str> = s.split(';').collect();
    if parts.len() != 4 {
        return Err(anyhow!(
            "Invalid item '{}', expected TITLE;per-person|shared;PRICE;USERS",
            s
        ));
    }
    let title = parts[0].trim().to_string();
    let mode = match parts[1].trim().to_lowercase().as_str() {
        "per-person" | "per_person" => ItemMode::PerPerson,
        "shared" | "shared-split" | "shared_split" => ItemMode::SharedSplit,
        other => return Err(anyhow!("Unknown item mode '{}' in '{}'", other, s)),
    };
    let price = parse_amount(parts[2])?;
    let users = parse_names(parts[3]);
    Ok(LineItem {
        title,
        mode,
        unit_price: (mode == ItemMode::PerPerson).then_some(price),
        total_price: (mode == ItemMode::SharedSplit).then_some(price),
        users,
    })
}

/// Thousands-grouped won amount, e.g. 24500 -> "24,500".
pub fn fmt_won(amount: i64) -> String {
    let digits = amount.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if amount < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn id_for_room(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM rooms WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Room '{}' not found", name))?;
    Ok(id)
}

pub fn room_members(conn: &Connection, room_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM members WHERE room_id=?1 ORDER BY id")?;
    let rows = stmt.query_map(params![room_id], |r| r.get::<_, String>(0))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// Acting identity settings
pub fn get_current_user(conn: &Connection) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='current_user'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_current_user(conn: &Connection, name: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('current_user', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![name],
    )?;
    Ok(())
}

/// Identity acting on settlement operations: `--as NAME` wins, otherwise
/// the stored `current_user`.
pub fn acting_user(conn: &Connection, explicit: Option<&String>) -> Result<String> {
    if let Some(name) = explicit {
        return Ok(name.trim().to_string());
    }
    get_current_user(conn)?
        .ok_or_else(|| anyhow!("No acting user set; run 'tripsplit me set <name>' or pass --as"))
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
