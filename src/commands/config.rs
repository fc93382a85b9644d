// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::utils::{get_setting, pretty_table, set_setting};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim();
            match get_setting(conn, key)? {
                Some(v) => println!("{}", v),
                None => println!("(unset)"),
            }
        }
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim();
            let value = sub.get_one::<String>("value").unwrap().trim();
            set_setting(conn, key, value)?;
            println!("Set {}={}", key, value);
        }
        Some(("list", _)) => {
            let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
            let rows = stmt.query_map([], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
            })?;
            let mut data = Vec::new();
            for row in rows {
                let (k, v) = row?;
                data.push(vec![k, v]);
            }
            println!("{}", pretty_table(&["Key", "Value"], data));
        }
        _ => {}
    }
    Ok(())
}
