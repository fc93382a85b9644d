// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

use crate::ledger::{self, Posting, Reference};
use crate::utils::{maybe_print_json, parse_decimal, parse_id, pretty_table};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("grant", sub)) => grant(conn, sub)?,
        Some(("deduct", sub)) => deduct(conn, sub)?,
        Some(("transfer", sub)) => transfer(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn posting<'a>(sub: &'a clap::ArgMatches) -> Posting<'a> {
    let reference = match (
        sub.get_one::<String>("ref-type"),
        sub.get_one::<String>("ref-id"),
    ) {
        (Some(kind), Some(id)) => Some(Reference {
            kind: kind.as_str(),
            id: id.as_str(),
        }),
        _ => None,
    };
    Posting {
        kind: sub.get_one::<String>("type").unwrap().as_str(),
        reference,
        description: sub.get_one::<String>("note").map(|s| s.as_str()),
        ..Default::default()
    }
}

fn grant(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user_id = parse_id(sub.get_one::<String>("user").unwrap())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let code = sub.get_one::<String>("currency").unwrap().trim().to_string();
    let txn = ledger::grant(conn, user_id, amount, &code, &posting(sub))?;
    println!(
        "Granted {} {} to user {} (balance: {})",
        amount, code, user_id, txn.balance_after
    );
    Ok(())
}

fn deduct(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user_id = parse_id(sub.get_one::<String>("user").unwrap())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let code = sub.get_one::<String>("currency").unwrap().trim().to_string();
    let allow_negative = sub.get_flag("allow-negative");
    let txn = ledger::deduct(conn, user_id, amount, &code, &posting(sub), allow_negative)?;
    println!(
        "Deducted {} {} from user {} (balance: {})",
        amount, code, user_id, txn.balance_after
    );
    Ok(())
}

fn transfer(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let from = parse_id(sub.get_one::<String>("from").unwrap())?;
    let to = parse_id(sub.get_one::<String>("to").unwrap())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let code = sub.get_one::<String>("currency").unwrap().trim().to_string();
    let (from_txn, to_txn) = ledger::transfer(conn, from, to, amount, &code, &posting(sub))?;
    println!(
        "Transferred {} {} from user {} (balance: {}) to user {} (balance: {})",
        amount, code, from, from_txn.balance_after, to, to_txn.balance_after
    );
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub created_at: String,
    pub user_id: i64,
    pub kind: String,
    pub amount: String,
    pub balance_after: String,
    pub currency: String,
    pub reference: String,
    pub related_user_id: Option<i64>,
    pub description: String,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let mut sql = String::from(
        "SELECT id, created_at, user_id, type, amount, balance_after, currency_code,
                reference_type, reference_id, related_user_id, description
         FROM transactions WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();

    if let Some(user) = sub.get_one::<String>("user") {
        sql.push_str(" AND user_id=?");
        params_vec.push(parse_id(user)?.to_string());
    }
    if let Some(code) = sub.get_one::<String>("currency") {
        sql.push_str(" AND currency_code=?");
        params_vec.push(code.trim().into());
    }
    if let Some(kind) = sub.get_one::<String>("type") {
        sql.push_str(" AND type=?");
        params_vec.push(kind.into());
    }
    sql.push_str(" ORDER BY id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> = params_vec
        .iter()
        .map(|s| s as &dyn rusqlite::ToSql)
        .collect();
    let mut rows = stmt.query(rusqlite::params_from_iter(params))?;

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let reference_type: Option<String> = r.get(7)?;
        let reference_id: Option<String> = r.get(8)?;
        let reference = match (reference_type, reference_id) {
            (Some(t), Some(i)) => format!("{}:{}", t, i),
            _ => String::new(),
        };
        let description: Option<String> = r.get(10)?;
        data.push(TransactionRow {
            id: r.get(0)?,
            created_at: r.get(1)?,
            user_id: r.get(2)?,
            kind: r.get(3)?,
            amount: r.get(4)?,
            balance_after: r.get(5)?,
            currency: r.get(6)?,
            reference,
            related_user_id: r.get(9)?,
            description: description.unwrap_or_default(),
        });
    }
    Ok(data)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|t| {
                vec![
                    t.id.to_string(),
                    t.created_at.clone(),
                    t.user_id.to_string(),
                    t.kind.clone(),
                    t.amount.clone(),
                    t.balance_after.clone(),
                    t.currency.clone(),
                    t.reference.clone(),
                    t.related_user_id.map(|u| u.to_string()).unwrap_or_default(),
                    t.description.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "Id", "Date", "User", "Type", "Amount", "Balance", "CCY", "Reference",
                    "Related", "Note"
                ],
                rows
            )
        );
    }
    Ok(())
}
