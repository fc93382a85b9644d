// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use coinpurse::ledger::{self, Posting};
use coinpurse::{cli, commands::transactions, db};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    db::seed_default_currencies(&conn).unwrap();
    conn
}

fn seed_history(conn: &mut Connection) {
    for _ in 0..3 {
        ledger::grant(
            conn,
            1,
            Decimal::ONE,
            "credits",
            &Posting {
                kind: "post_reply",
                ..Default::default()
            },
        )
        .unwrap();
    }
    ledger::grant(
        conn,
        2,
        Decimal::from(5),
        "credits",
        &Posting {
            kind: "post_topic",
            ..Default::default()
        },
    )
    .unwrap();
}

fn list_matches(args: &[&str]) -> clap::ArgMatches {
    let mut argv = vec!["coinpurse", "tx", "list"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let Some(("tx", tx_m)) = matches.subcommand() else {
        panic!("no tx subcommand");
    };
    let Some(("list", list_m)) = tx_m.subcommand() else {
        panic!("no list subcommand");
    };
    list_m.clone()
}

#[test]
fn list_limit_respected_newest_first() {
    let mut conn = setup();
    seed_history(&mut conn);
    let rows = transactions::query_rows(&conn, &list_matches(&["--limit", "2"])).unwrap();
    assert_eq!(rows.len(), 2);
    // Newest first: the user-2 grant was recorded last.
    assert_eq!(rows[0].user_id, 2);
    assert_eq!(rows[0].amount, "5");
}

#[test]
fn list_filters_by_user_and_type() {
    let mut conn = setup();
    seed_history(&mut conn);
    let rows = transactions::query_rows(&conn, &list_matches(&["--user", "1"])).unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.user_id == 1));

    let rows =
        transactions::query_rows(&conn, &list_matches(&["--type", "post_topic"])).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, "post_topic");
}

#[test]
fn grant_command_credits_user() {
    let mut conn = setup();
    let matches = cli::build_cli().get_matches_from([
        "coinpurse", "tx", "grant", "--user", "1", "--amount", "5", "--currency", "credits",
        "--type", "admin_grant", "--ref-type", "topic", "--ref-id", "42",
    ]);
    let Some(("tx", tx_m)) = matches.subcommand() else {
        panic!("no tx subcommand");
    };
    transactions::handle(&mut conn, tx_m).unwrap();

    let account = ledger::account(&conn, 1, "credits").unwrap().unwrap();
    assert_eq!(account.balance, Decimal::from(5));
    let (kind, ref_id): (String, String) = conn
        .query_row(
            "SELECT reference_type, reference_id FROM transactions WHERE user_id=1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(kind, "topic");
    assert_eq!(ref_id, "42");
}

#[test]
fn deduct_command_surfaces_insufficient_funds() {
    let mut conn = setup();
    let matches = cli::build_cli().get_matches_from([
        "coinpurse", "tx", "deduct", "--user", "1", "--amount", "5", "--currency", "credits",
        "--type", "purchase",
    ]);
    let Some(("tx", tx_m)) = matches.subcommand() else {
        panic!("no tx subcommand");
    };
    let err = transactions::handle(&mut conn, tx_m).unwrap_err();
    assert!(err.to_string().contains("insufficient funds"));
}
