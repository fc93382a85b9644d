// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::{Connection, params};
use serde::Serialize;

use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let code = sub.get_one::<String>("code").unwrap().trim().to_lowercase();
            let name = sub.get_one::<String>("name").unwrap();
            let symbol = sub.get_one::<String>("symbol").unwrap();
            let precision: i64 = *sub.get_one::<i64>("precision").unwrap();
            conn.execute(
                "INSERT INTO currencies(code, name, symbol, precision) VALUES (?1, ?2, ?3, ?4)",
                params![code, name, symbol, precision],
            )?;
            println!("Added currency '{}' ({}, precision {})", code, symbol, precision);
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("enable", sub)) => set_active(conn, sub, true)?,
        Some(("disable", sub)) => set_active(conn, sub, false)?,
        _ => {}
    }
    Ok(())
}

fn set_active(conn: &Connection, sub: &clap::ArgMatches, active: bool) -> Result<()> {
    let code = sub.get_one::<String>("code").unwrap().trim().to_lowercase();
    let changed = conn.execute(
        "UPDATE currencies SET is_active=?1, updated_at=datetime('now') WHERE code=?2",
        params![active, code],
    )?;
    if changed == 0 {
        println!("No currency '{}'", code);
    } else {
        println!(
            "Currency '{}' {}",
            code,
            if active { "enabled" } else { "disabled" }
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct CurrencyRow {
    code: String,
    name: String,
    symbol: String,
    precision: i64,
    is_active: bool,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mut stmt = conn
        .prepare("SELECT code, name, symbol, precision, is_active FROM currencies ORDER BY code")?;
    let rows = stmt.query_map([], |r| {
        Ok(CurrencyRow {
            code: r.get(0)?,
            name: r.get(1)?,
            symbol: r.get(2)?,
            precision: r.get(3)?,
            is_active: r.get(4)?,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|c| {
                vec![
                    c.code.clone(),
                    c.name.clone(),
                    c.symbol.clone(),
                    c.precision.to_string(),
                    if c.is_active { "yes" } else { "no" }.into(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Code", "Name", "Symbol", "Precision", "Active"], rows)
        );
    }
    Ok(())
}
