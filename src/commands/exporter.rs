// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::settle;
use crate::models::SplitKind;
use crate::store;
use crate::utils::{acting_user, id_for_room};
use anyhow::Result;
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("settlement", sub)) => export_settlement(conn, sub),
        Some(("expenses", sub)) => export_expenses(conn, sub),
        _ => Ok(()),
    }
}

fn export_settlement(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    let room_id = id_for_room(conn, sub.get_one::<String>("room").unwrap())?;
    // The ledger itself is identity-independent; the summary in the JSON
    // export reflects the stored identity when one is set.
    let me = acting_user(conn, None).unwrap_or_default();

    let view = settle::compute(conn, room_id, &me)?;
    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["from", "to", "amount", "status"])?;
            for t in &view.transfers {
                wtr.write_record([
                    t.from.as_str(),
                    t.to.as_str(),
                    &t.amount.to_string(),
                    t.state.as_str(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(out, serde_json::to_string_pretty(&view)?)?;
        }
        _ => {
            eprintln!("Unknown format: {} (use csv|json)", fmt);
            return Ok(());
        }
    }
    println!("Exported settlement to {}", out);
    Ok(())
}

fn export_expenses(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    let room_id = id_for_room(conn, sub.get_one::<String>("room").unwrap())?;

    let expenses = store::list_expenses(conn, room_id)?;
    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["id", "date", "title", "payer", "split", "total", "people"])?;
            for e in &expenses {
                let people = match e.split {
                    SplitKind::Equal => e.participants.join("|"),
                    SplitKind::Item => {
                        let mut names: Vec<String> = Vec::new();
                        for item in &e.items {
                            for u in &item.users {
                                if !names.contains(u) {
                                    names.push(u.clone());
                                }
                            }
                        }
                        names.join("|")
                    }
                };
                wtr.write_record([
                    &e.id.to_string(),
                    e.date.as_str(),
                    e.title.as_str(),
                    e.payer.as_str(),
                    e.split.as_str(),
                    &e.total().to_string(),
                    &people,
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<serde_json::Value> = expenses
                .iter()
                .map(|e| {
                    json!({
                        "id": e.id, "date": e.date, "title": e.title, "payer": e.payer,
                        "split": e.split, "total": e.total(),
                        "participants": e.participants, "items": e.items,
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        _ => {
            eprintln!("Unknown format: {} (use csv|json)", fmt);
            return Ok(());
        }
    }
    println!("Exported expenses to {}", out);
    Ok(())
}
