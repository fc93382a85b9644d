// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

use crate::utils::pretty_table;

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = collect_issues(conn)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

/// Verify the ledger invariant per account: the stored balance and running
/// totals must equal the sums over its transaction history, and the newest
/// balance snapshot must match the balance.
pub fn collect_issues(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    let mut stmt = conn.prepare(
        "SELECT user_id, currency_code, balance, total_earned, total_spent FROM accounts",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let user_id: i64 = r.get(0)?;
        let code: String = r.get(1)?;
        let balance = parse(&r.get::<_, String>(2)?)?;
        let earned = parse(&r.get::<_, String>(3)?)?;
        let spent = parse(&r.get::<_, String>(4)?)?;
        let who = format!("user {} / {}", user_id, code);

        let mut signed = Decimal::ZERO;
        let mut credits = Decimal::ZERO;
        let mut debits = Decimal::ZERO;
        let mut tstmt = conn.prepare_cached(
            "SELECT amount FROM transactions WHERE user_id=?1 AND currency_code=?2",
        )?;
        let mut tcur = tstmt.query(params![user_id, code])?;
        while let Some(t) = tcur.next()? {
            let amount = parse(&t.get::<_, String>(0)?)?;
            signed += amount;
            if amount > Decimal::ZERO {
                credits += amount;
            } else {
                debits -= amount;
            }
        }

        if signed != balance {
            rows.push(vec![
                "balance_mismatch".into(),
                format!("{}: balance {} vs history {}", who, balance, signed),
            ]);
        }
        if credits != earned {
            rows.push(vec![
                "earned_mismatch".into(),
                format!("{}: total_earned {} vs history {}", who, earned, credits),
            ]);
        }
        if debits != spent {
            rows.push(vec![
                "spent_mismatch".into(),
                format!("{}: total_spent {} vs history {}", who, spent, debits),
            ]);
        }

        let last: Option<String> = conn
            .query_row(
                "SELECT balance_after FROM transactions
                 WHERE user_id=?1 AND currency_code=?2 ORDER BY id DESC LIMIT 1",
                params![user_id, code],
                |r| r.get(0),
            )
            .optional()?;
        if let Some(s) = last {
            if parse(&s)? != balance {
                rows.push(vec![
                    "stale_snapshot".into(),
                    format!("{}: last balance_after {} vs balance {}", who, s, balance),
                ]);
            }
        }
    }

    // Transactions naming a currency with no currencies row
    let mut stmt2 = conn.prepare(
        "SELECT DISTINCT currency_code FROM transactions EXCEPT SELECT code FROM currencies",
    )?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let c: String = r.get(0)?;
        rows.push(vec!["txn_currency_unknown".into(), c]);
    }

    Ok(rows)
}

fn parse(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid stored amount '{}'", s))
}
