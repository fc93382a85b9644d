// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, params};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Coinpurse", "coinpurse"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("coinpurse.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    conn.busy_timeout(Duration::from_secs(5))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS currencies(
        code TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        symbol TEXT NOT NULL,
        precision INTEGER NOT NULL DEFAULT 0,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    -- One balance row per (user, currency); created lazily on first use.
    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        currency_code TEXT NOT NULL,
        balance TEXT NOT NULL DEFAULT '0',
        total_earned TEXT NOT NULL DEFAULT '0',
        total_spent TEXT NOT NULL DEFAULT '0',
        is_frozen INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(user_id, currency_code),
        FOREIGN KEY(currency_code) REFERENCES currencies(code)
    );

    -- Append-only audit log; rows are never updated or deleted.
    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        currency_code TEXT NOT NULL,
        amount TEXT NOT NULL,
        balance_after TEXT NOT NULL,
        type TEXT NOT NULL,
        reference_type TEXT,
        reference_id TEXT,
        related_user_id INTEGER,
        description TEXT,
        metadata TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(currency_code) REFERENCES currencies(code)
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_user
        ON transactions(user_id, currency_code);

    -- Storage-level idempotency for reward crediting: a second grant with the
    -- same reward reference conflicts here instead of double-paying.
    CREATE UNIQUE INDEX IF NOT EXISTS ux_transactions_reward_ref
        ON transactions(user_id, type, reference_type, reference_id)
        WHERE reference_type = 'reward_event';
    "#,
    )?;
    Ok(())
}

/// Default currencies shipped with a fresh install: spendable forum credits
/// plus a disabled example currency admins can turn on.
pub fn seed_default_currencies(conn: &Connection) -> Result<usize> {
    let defaults: [(&str, &str, &str, i64, bool); 2] = [
        ("credits", "Credits", "pts", 0, true),
        ("gold", "Gold", "g", 2, false),
    ];
    let mut added = 0;
    for (code, name, symbol, precision, is_active) in defaults {
        added += conn.execute(
            "INSERT OR IGNORE INTO currencies(code, name, symbol, precision, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![code, name, symbol, precision, is_active],
        )?;
    }
    Ok(added)
}
