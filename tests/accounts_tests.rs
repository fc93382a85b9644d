// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use coinpurse::ledger::{self, Posting};
use coinpurse::{cli, commands, db};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    db::seed_default_currencies(&conn).unwrap();
    conn
}

#[test]
fn seed_is_idempotent() {
    let conn = setup();
    assert_eq!(db::seed_default_currencies(&conn).unwrap(), 0);
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM currencies", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn freeze_command_sets_flag() {
    let mut conn = setup();
    ledger::grant(
        &mut conn,
        1,
        Decimal::from(5),
        "credits",
        &Posting {
            kind: "post_topic",
            ..Default::default()
        },
    )
    .unwrap();

    let matches = cli::build_cli().get_matches_from([
        "coinpurse", "account", "freeze", "--user", "1", "--currency", "credits",
    ]);
    let Some(("account", account_m)) = matches.subcommand() else {
        panic!("no account subcommand");
    };
    commands::accounts::handle(&conn, account_m).unwrap();

    let account = ledger::account(&conn, 1, "credits").unwrap().unwrap();
    assert!(account.is_frozen);
}

#[test]
fn currency_disable_round_trips() {
    let conn = setup();
    let matches = cli::build_cli().get_matches_from([
        "coinpurse", "currency", "disable", "--code", "credits",
    ]);
    let Some(("currency", currency_m)) = matches.subcommand() else {
        panic!("no currency subcommand");
    };
    commands::currencies::handle(&conn, currency_m).unwrap();

    let ccy = coinpurse::utils::get_currency(&conn, "credits")
        .unwrap()
        .unwrap();
    assert!(!ccy.is_active);
}

#[test]
fn config_set_then_get() {
    let conn = setup();
    let matches = cli::build_cli().get_matches_from([
        "coinpurse", "config", "set", "--key", "post_topic_amount", "--value", "8",
    ]);
    let Some(("config", config_m)) = matches.subcommand() else {
        panic!("no config subcommand");
    };
    commands::config::handle(&conn, config_m).unwrap();
    assert_eq!(
        coinpurse::utils::get_setting(&conn, "post_topic_amount").unwrap(),
        Some("8".to_string())
    );
}
