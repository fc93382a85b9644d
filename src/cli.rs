// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

fn reference_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("ref-type")
            .long("ref-type")
            .help("Reference type linking back to the causing entity"),
    )
    .arg(
        Arg::new("ref-id")
            .long("ref-id")
            .requires("ref-type")
            .help("Reference id linking back to the causing entity"),
    )
    .arg(Arg::new("note").long("note").help("Free-form description"))
}

pub fn build_cli() -> Command {
    Command::new("coinpurse")
        .about("Community currency ledger: accounts, grants, transfers, and reward crediting")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand(Command::new("init").about("Initialize the database and seed default currencies"))
        .subcommand(
            Command::new("currency")
                .about("Manage currencies")
                .subcommand(
                    Command::new("add")
                        .about("Add a currency")
                        .arg(Arg::new("code").long("code").required(true))
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("symbol").long("symbol").required(true))
                        .arg(
                            Arg::new("precision")
                                .long("precision")
                                .default_value("0")
                                .value_parser(value_parser!(i64)),
                        ),
                )
                .subcommand(json_flags(Command::new("list").about("List currencies")))
                .subcommand(
                    Command::new("enable")
                        .about("Activate a currency")
                        .arg(Arg::new("code").long("code").required(true)),
                )
                .subcommand(
                    Command::new("disable")
                        .about("Deactivate a currency")
                        .arg(Arg::new("code").long("code").required(true)),
                ),
        )
        .subcommand(
            Command::new("account")
                .about("Inspect and administer balance accounts")
                .subcommand(json_flags(
                    Command::new("show")
                        .about("Show one user's account in a currency")
                        .arg(Arg::new("user").long("user").required(true))
                        .arg(Arg::new("currency").long("currency").required(true)),
                ))
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List accounts")
                        .arg(Arg::new("currency").long("currency")),
                ))
                .subcommand(
                    Command::new("freeze")
                        .about("Mark an account frozen")
                        .arg(Arg::new("user").long("user").required(true))
                        .arg(Arg::new("currency").long("currency").required(true)),
                )
                .subcommand(
                    Command::new("unfreeze")
                        .about("Clear an account's frozen flag")
                        .arg(Arg::new("user").long("user").required(true))
                        .arg(Arg::new("currency").long("currency").required(true)),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Ledger mutations and history")
                .subcommand(reference_args(
                    Command::new("grant")
                        .about("Credit currency to a user")
                        .arg(Arg::new("user").long("user").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("currency").long("currency").required(true))
                        .arg(Arg::new("type").long("type").required(true)),
                ))
                .subcommand(
                    reference_args(
                        Command::new("deduct")
                            .about("Debit currency from a user")
                            .arg(Arg::new("user").long("user").required(true))
                            .arg(Arg::new("amount").long("amount").required(true))
                            .arg(Arg::new("currency").long("currency").required(true))
                            .arg(Arg::new("type").long("type").required(true)),
                    )
                    .arg(
                        Arg::new("allow-negative")
                            .long("allow-negative")
                            .action(ArgAction::SetTrue)
                            .help("Permit the balance to go below zero"),
                    ),
                )
                .subcommand(reference_args(
                    Command::new("transfer")
                        .about("Move currency between two users")
                        .arg(Arg::new("from").long("from").required(true))
                        .arg(Arg::new("to").long("to").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("currency").long("currency").required(true))
                        .arg(Arg::new("type").long("type").default_value("transfer")),
                ))
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List transactions, newest first")
                        .arg(Arg::new("user").long("user"))
                        .arg(Arg::new("currency").long("currency"))
                        .arg(Arg::new("type").long("type"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )),
        )
        .subcommand(
            Command::new("reward")
                .about("Credit rewards for forum events (idempotent)")
                .subcommand(
                    Command::new("topic-created")
                        .about("A user published a topic")
                        .arg(Arg::new("topic").long("topic").required(true))
                        .arg(Arg::new("user").long("user").required(true))
                        .arg(Arg::new("title").long("title").default_value("")),
                )
                .subcommand(
                    Command::new("post-created")
                        .about("A user published a post")
                        .arg(Arg::new("post").long("post").required(true))
                        .arg(Arg::new("topic").long("topic").required(true))
                        .arg(Arg::new("user").long("user").required(true))
                        .arg(
                            Arg::new("number")
                                .long("number")
                                .required(true)
                                .help("Post number within the topic; 1 is the topic body"),
                        ),
                )
                .subcommand(
                    Command::new("post-liked")
                        .about("A post received a like")
                        .arg(Arg::new("post").long("post").required(true))
                        .arg(Arg::new("author").long("author").required(true))
                        .arg(Arg::new("liker").long("liker").required(true)),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Reward configuration settings")
                .subcommand(
                    Command::new("get")
                        .about("Read a setting")
                        .arg(Arg::new("key").long("key").required(true)),
                )
                .subcommand(
                    Command::new("set")
                        .about("Write a setting")
                        .arg(Arg::new("key").long("key").required(true))
                        .arg(Arg::new("value").long("value").required(true)),
                )
                .subcommand(Command::new("list").about("List all settings")),
        )
        .subcommand(Command::new("doctor").about("Check ledger invariants"))
}
