// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::SplitKind;
use crate::settlement;
use crate::store;
use crate::utils::{pretty_table, room_members};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection) -> Result<()> {
    let mut rows = Vec::new();

    let mut stmt = conn.prepare("SELECT id, name FROM rooms ORDER BY name")?;
    let rooms = stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?;
    let rooms: Vec<(i64, String)> = rooms.collect::<Result<_, _>>()?;

    for (room_id, room_name) in &rooms {
        let members = room_members(conn, *room_id)?;
        if members.is_empty() {
            rows.push(vec!["empty_room".into(), room_name.clone()]);
        }

        // 1) Records that violate creation-time invariants (hand-edited
        //    rows; the CLI refuses to create them)
        let expenses = store::list_expenses(conn, *room_id)?;
        for e in &expenses {
            if let Err(err) = e.validate() {
                rows.push(vec![
                    "invalid_expense".into(),
                    format!("{}: expense {} ({})", room_name, e.id, err),
                ]);
            }
            let mut names: Vec<&String> = vec![&e.payer];
            match e.split {
                SplitKind::Equal => names.extend(e.participants.iter()),
                SplitKind::Item => {
                    for item in &e.items {
                        names.extend(item.users.iter());
                    }
                }
            }
            for name in names {
                if !members.iter().any(|m| m == name) {
                    rows.push(vec![
                        "unknown_member".into(),
                        format!("{}: expense {} names '{}'", room_name, e.id, name),
                    ]);
                }
            }
        }

        // 2) Status rows whose debt no longer exists (expenses edited or
        //    removed); harmless, never surfaced, but worth knowing about
        let transfers = settlement::aggregate(&expenses);
        let status = store::load_status_map(conn, *room_id)?;
        for ((from, to), state) in &status {
            let live = transfers.iter().any(|t| &t.from == from && &t.to == to);
            if !live {
                rows.push(vec![
                    "stale_status".into(),
                    format!("{}: {} -> {} ({})", room_name, from, to, state.as_str()),
                ]);
            }
        }
    }

    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        rows.sort();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
