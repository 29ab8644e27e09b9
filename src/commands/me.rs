// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{get_current_user, set_current_user};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim().to_string();
            set_current_user(conn, &name)?;
            println!("Acting as '{}'", name);
        }
        Some(("show", _)) => match get_current_user(conn)? {
            Some(name) => println!("{}", name),
            None => println!("No identity set; run 'tripsplit me set <name>'"),
        },
        _ => {}
    }
    Ok(())
}
