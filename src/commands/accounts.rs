// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::{Connection, params};
use serde::Serialize;

use crate::ledger;
use crate::utils::{fmt_amount, get_currency, maybe_print_json, parse_id, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => show(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("freeze", sub)) => set_frozen(conn, sub, true)?,
        Some(("unfreeze", sub)) => set_frozen(conn, sub, false)?,
        _ => {}
    }
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user_id = parse_id(sub.get_one::<String>("user").unwrap())?;
    let code = sub.get_one::<String>("currency").unwrap().trim();
    let Some(account) = ledger::account(conn, user_id, code)? else {
        println!("User {} has no {} account yet", user_id, code);
        return Ok(());
    };
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &account)? {
        let ccy = get_currency(conn, code)?;
        let disp = |d: &rust_decimal::Decimal| match &ccy {
            Some(c) => fmt_amount(d, c),
            None => d.to_string(),
        };
        println!(
            "{}",
            pretty_table(
                &["User", "Currency", "Balance", "Earned", "Spent", "Frozen"],
                vec![vec![
                    user_id.to_string(),
                    account.currency_code.clone(),
                    disp(&account.balance),
                    disp(&account.total_earned),
                    disp(&account.total_spent),
                    if account.is_frozen { "yes" } else { "no" }.into(),
                ]],
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct AccountRow {
    user_id: i64,
    currency_code: String,
    balance: String,
    total_earned: String,
    total_spent: String,
    is_frozen: bool,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mut sql = String::from(
        "SELECT user_id, currency_code, balance, total_earned, total_spent, is_frozen
         FROM accounts WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();
    if let Some(code) = sub.get_one::<String>("currency") {
        sql.push_str(" AND currency_code=?");
        params_vec.push(code.trim().to_string());
    }
    sql.push_str(" ORDER BY currency_code, user_id");

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> = params_vec
        .iter()
        .map(|s| s as &dyn rusqlite::ToSql)
        .collect();
    let mut rows = stmt.query(rusqlite::params_from_iter(params))?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        data.push(AccountRow {
            user_id: r.get(0)?,
            currency_code: r.get(1)?,
            balance: r.get(2)?,
            total_earned: r.get(3)?,
            total_spent: r.get(4)?,
            is_frozen: r.get(5)?,
        });
    }
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|a| {
                vec![
                    a.user_id.to_string(),
                    a.currency_code.clone(),
                    a.balance.clone(),
                    a.total_earned.clone(),
                    a.total_spent.clone(),
                    if a.is_frozen { "yes" } else { "no" }.into(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["User", "Currency", "Balance", "Earned", "Spent", "Frozen"],
                rows
            )
        );
    }
    Ok(())
}

fn set_frozen(conn: &Connection, sub: &clap::ArgMatches, frozen: bool) -> Result<()> {
    let user_id = parse_id(sub.get_one::<String>("user").unwrap())?;
    let code = sub.get_one::<String>("currency").unwrap().trim();
    let changed = conn.execute(
        "UPDATE accounts SET is_frozen=?1, updated_at=datetime('now')
         WHERE user_id=?2 AND currency_code=?3",
        params![frozen, user_id, code],
    )?;
    if changed == 0 {
        println!("User {} has no {} account yet", user_id, code);
    } else {
        println!(
            "Account {} / {} {}",
            user_id,
            code,
            if frozen { "frozen" } else { "unfrozen" }
        );
    }
    Ok(())
}
