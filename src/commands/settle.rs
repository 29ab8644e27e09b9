// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::TransferState;
use crate::settlement::{self, SettledTransfer, SettlementView, Summary};
use crate::store;
use crate::utils::{acting_user, fmt_won, id_for_room, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("view", sub)) => view(conn, sub)?,
        Some(("request", sub)) => transition(conn, sub, Action::Request)?,
        Some(("resend", sub)) => transition(conn, sub, Action::Resend)?,
        Some(("done", sub)) => transition(conn, sub, Action::Done)?,
        Some(("request-all", sub)) => request_all(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Recompute the settlement for a room as seen by `me`. The transfer
/// amounts are always derived fresh from the expense ledger; only the
/// request lifecycle is read from disk.
pub fn compute(conn: &Connection, room_id: i64, me: &str) -> Result<SettlementView> {
    let expenses = store::list_expenses(conn, room_id)?;
    let transfers = settlement::aggregate(&expenses);
    let status = store::load_status_map(conn, room_id)?;
    Ok(settlement::assemble(transfers, &status, me))
}

#[derive(Serialize)]
struct ViewOut {
    transfers: Vec<SettledTransfer>,
    summary: Summary,
}

fn state_label(state: TransferState) -> &'static str {
    match state {
        TransferState::Ready => "ready",
        TransferState::Requested => "requested",
        TransferState::Done => "done",
    }
}

fn view(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let room_id = id_for_room(conn, sub.get_one::<String>("room").unwrap())?;
    let me = acting_user(conn, sub.get_one::<String>("as"))?;
    let all = sub.get_flag("all");

    let view = compute(conn, room_id, &me)?;
    let shown: Vec<SettledTransfer> = if all {
        view.transfers.clone()
    } else {
        view.involving(&me).into_iter().cloned().collect()
    };

    let out = ViewOut {
        transfers: shown,
        summary: view.summary,
    };
    if maybe_print_json(json_flag, jsonl_flag, &out)? {
        return Ok(());
    }

    if out.transfers.is_empty() {
        println!("Nothing to settle.");
    } else {
        let rows: Vec<Vec<String>> = out
            .transfers
            .iter()
            .map(|t| {
                vec![
                    t.from.clone(),
                    t.to.clone(),
                    fmt_won(t.amount),
                    state_label(t.state).to_string(),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["From", "To", "Amount", "Status"], rows));
    }
    println!(
        "{}: send {} won, receive {} won",
        me,
        fmt_won(out.summary.send),
        fmt_won(out.summary.receive)
    );
    Ok(())
}

enum Action {
    Request,
    Resend,
    Done,
}

fn transition(conn: &mut Connection, sub: &clap::ArgMatches, action: Action) -> Result<()> {
    let room_id = id_for_room(conn, sub.get_one::<String>("room").unwrap())?;
    let me = acting_user(conn, sub.get_one::<String>("as"))?;
    let from = sub.get_one::<String>("from").unwrap().trim().to_string();
    let to = sub.get_one::<String>("to").unwrap().trim().to_string();

    let view = compute(conn, room_id, &me)?;
    let mut status = store::load_status_map(conn, room_id)?;
    let amount = view
        .transfers
        .iter()
        .find(|t| t.from == from && t.to == to)
        .map(|t| t.amount)
        .unwrap_or(0);

    let (next, verb) = match action {
        Action::Request => {
            settlement::request(&view, &mut status, &me, &from, &to)?;
            (TransferState::Requested, "Requested")
        }
        Action::Resend => {
            settlement::resend(&view, &mut status, &me, &from, &to)?;
            (TransferState::Requested, "Resent request for")
        }
        Action::Done => {
            settlement::mark_done(&view, &mut status, &me, &from, &to)?;
            (TransferState::Done, "Completed")
        }
    };
    store::save_status(conn, room_id, &[(from.clone(), to.clone())], next)?;
    println!("{} {} won: {} -> {}", verb, fmt_won(amount), from, to);
    Ok(())
}

fn request_all(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let room_id = id_for_room(conn, sub.get_one::<String>("room").unwrap())?;
    let me = acting_user(conn, sub.get_one::<String>("as"))?;

    let view = compute(conn, room_id, &me)?;
    let mut status = store::load_status_map(conn, room_id)?;
    let pairs = settlement::request_all(&view, &mut status, &me);
    if pairs.is_empty() {
        println!("Nothing to request.");
        return Ok(());
    }
    store::save_status(conn, room_id, &pairs, TransferState::Requested)?;
    for (from, to) in &pairs {
        let amount = view
            .transfers
            .iter()
            .find(|t| &t.from == from && &t.to == to)
            .map(|t| t.amount)
            .unwrap_or(0);
        println!("Requested {} won from {}", fmt_won(amount), from);
    }
    println!("Sent {} request(s)", pairs.len());
    Ok(())
}
