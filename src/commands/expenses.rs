// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{ExpenseRecord, SplitKind};
use crate::store;
use crate::utils::{
    fmt_won, id_for_room, maybe_print_json, parse_amount, parse_date, parse_item_spec, parse_names,
    pretty_table, room_members,
};
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add-equal", sub)) => add_equal(conn, sub)?,
        Some(("add-items", sub)) => add_items(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let room_id = id_for_room(conn, sub.get_one::<String>("room").unwrap())?;
            let id = *sub.get_one::<i64>("id").unwrap();
            if store::delete_expense(conn, room_id, id)? {
                println!("Removed expense {}", id);
            } else {
                println!("No expense {} in this room", id);
            }
        }
        _ => {}
    }
    Ok(())
}

fn check_members(conn: &Connection, room_id: i64, names: &[String]) -> Result<()> {
    let members = room_members(conn, room_id)?;
    for name in names {
        if !members.iter().any(|m| m == name) {
            return Err(anyhow!("'{}' is not a member of this room", name));
        }
    }
    Ok(())
}

fn add_equal(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let room_id = id_for_room(conn, sub.get_one::<String>("room").unwrap())?;
    let title = sub.get_one::<String>("title").unwrap().trim().to_string();
    let date = parse_date(sub.get_one::<String>("date").unwrap().trim())?;
    let payer = sub.get_one::<String>("payer").unwrap().trim().to_string();
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let participants = parse_names(sub.get_one::<String>("participants").unwrap());

    let mut involved = participants.clone();
    involved.push(payer.clone());
    check_members(conn, room_id, &involved)?;

    let expense = ExpenseRecord {
        id: 0,
        room_id,
        title: title.clone(),
        date: date.to_string(),
        payer,
        split: SplitKind::Equal,
        amount,
        participants,
        items: Vec::new(),
    };
    let id = store::insert_expense(conn, &expense)?;
    println!(
        "Recorded '{}' ({} won, split {} ways) as expense {}",
        title,
        fmt_won(amount),
        expense.participants.len(),
        id
    );
    Ok(())
}

fn add_items(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let room_id = id_for_room(conn, sub.get_one::<String>("room").unwrap())?;
    let title = sub.get_one::<String>("title").unwrap().trim().to_string();
    let date = parse_date(sub.get_one::<String>("date").unwrap().trim())?;
    let payer = sub.get_one::<String>("payer").unwrap().trim().to_string();

    let mut items = Vec::new();
    for spec in sub.get_many::<String>("item").unwrap() {
        items.push(parse_item_spec(spec)?);
    }

    let mut involved: Vec<String> = vec![payer.clone()];
    for item in &items {
        involved.extend(item.users.iter().cloned());
    }
    check_members(conn, room_id, &involved)?;

    let expense = ExpenseRecord {
        id: 0,
        room_id,
        title: title.clone(),
        date: date.to_string(),
        payer,
        split: SplitKind::Item,
        amount: 0, // derived from items on insert
        participants: Vec::new(),
        items,
    };
    let id = store::insert_expense(conn, &expense)?;
    println!(
        "Recorded '{}' ({} won over {} item(s)) as expense {}",
        title,
        fmt_won(expense.total()),
        expense.items.len(),
        id
    );
    Ok(())
}

#[derive(Serialize)]
pub struct ExpenseRow {
    pub id: i64,
    pub date: String,
    pub title: String,
    pub payer: String,
    pub split: String,
    pub total: i64,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<ExpenseRow>> {
    let room_id = id_for_room(conn, sub.get_one::<String>("room").unwrap())?;
    let day = sub
        .get_one::<String>("date")
        .map(|s| parse_date(s.trim()))
        .transpose()?
        .map(|d| d.to_string());

    let expenses = store::list_expenses(conn, room_id)?;
    Ok(expenses
        .iter()
        .filter(|e| day.as_deref().is_none_or(|d| e.date == d))
        .map(|e| ExpenseRow {
            id: e.id,
            date: e.date.clone(),
            title: e.title.clone(),
            payer: e.payer.clone(),
            split: e.split.as_str().to_string(),
            total: e.total(),
        })
        .collect())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let total: i64 = data.iter().map(|r| r.total).sum();
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.title.clone(),
                    r.payer.clone(),
                    r.split.clone(),
                    fmt_won(r.total),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Date", "Title", "Payer", "Split", "Total"], rows)
        );
        println!("Trip total: {} won", fmt_won(total));
    }
    Ok(())
}
