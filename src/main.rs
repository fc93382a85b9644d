// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use coinpurse::{cli, commands, db};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut conn = db::open_or_init()?;

    match matches.subcommand() {
        Some(("init", _)) => {
            let added = db::seed_default_currencies(&conn)?;
            println!(
                "Database initialized at {} ({} currencies seeded)",
                db::db_path()?.display(),
                added
            );
        }
        Some(("currency", sub)) => commands::currencies::handle(&conn, sub)?,
        Some(("account", sub)) => commands::accounts::handle(&conn, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&mut conn, sub)?,
        Some(("reward", sub)) => commands::rewards::handle(&mut conn, sub)?,
        Some(("config", sub)) => commands::config::handle(&conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
