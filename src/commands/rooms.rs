// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{id_for_room, parse_date, parse_names, pretty_table, room_members};
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", _)) => list(conn)?,
        Some(("members", sub)) => {
            let room_id = id_for_room(conn, sub.get_one::<String>("room").unwrap())?;
            for name in room_members(conn, room_id)? {
                println!("{}", name);
            }
        }
        Some(("invite", sub)) => invite(conn, sub)?,
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let n = conn.execute("DELETE FROM rooms WHERE name=?1", params![name])?;
            if n == 0 {
                println!("No room named '{}'", name);
            } else {
                println!("Removed room '{}'", name);
            }
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim().to_string();
    let start = sub
        .get_one::<String>("start")
        .map(|s| parse_date(s.trim()))
        .transpose()?;
    let end = sub
        .get_one::<String>("end")
        .map(|s| parse_date(s.trim()))
        .transpose()?;
    conn.execute(
        "INSERT INTO rooms(name, trip_start, trip_end) VALUES (?1, ?2, ?3)",
        params![
            name,
            start.map(|d| d.to_string()),
            end.map(|d| d.to_string())
        ],
    )?;
    let room_id = conn.last_insert_rowid();

    let members = sub
        .get_one::<String>("members")
        .map(|s| parse_names(s))
        .unwrap_or_default();
    for member in &members {
        conn.execute(
            "INSERT INTO members(room_id, name) VALUES (?1, ?2)",
            params![room_id, member],
        )?;
    }
    println!("Created room '{}' with {} member(s)", name, members.len());
    Ok(())
}

fn list(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT r.name, r.trip_start, r.trip_end,
                (SELECT COUNT(*) FROM members m WHERE m.room_id=r.id),
                (SELECT COUNT(*) FROM expenses e WHERE e.room_id=r.id)
         FROM rooms r ORDER BY r.name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, Option<String>>(1)?,
            r.get::<_, Option<String>>(2)?,
            r.get::<_, i64>(3)?,
            r.get::<_, i64>(4)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (name, start, end, members, expenses) = row?;
        let trip = match (start, end) {
            (Some(s), Some(e)) => format!("{} ~ {}", s, e),
            (Some(s), None) => format!("{} ~", s),
            (None, Some(e)) => format!("~ {}", e),
            (None, None) => String::new(),
        };
        data.push(vec![name, trip, members.to_string(), expenses.to_string()]);
    }
    println!(
        "{}",
        pretty_table(&["Room", "Trip", "Members", "Expenses"], data)
    );
    Ok(())
}

fn invite(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let room = sub.get_one::<String>("room").unwrap();
    let name = sub.get_one::<String>("name").unwrap().trim().to_string();
    let room_id = id_for_room(conn, room)?;
    conn.execute(
        "INSERT INTO members(room_id, name) VALUES (?1, ?2)
         ON CONFLICT(room_id, name) DO NOTHING",
        params![room_id, name],
    )?;
    println!("'{}' is now a member of '{}'", name, room);
    Ok(())
}
