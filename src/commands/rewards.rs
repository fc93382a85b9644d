// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::rewards::{ForumEvent, apply_event};
use crate::utils::parse_id;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let event = match m.subcommand() {
        Some(("topic-created", sub)) => ForumEvent::TopicCreated {
            topic_id: parse_id(sub.get_one::<String>("topic").unwrap())?,
            user_id: parse_id(sub.get_one::<String>("user").unwrap())?,
            title: sub.get_one::<String>("title").unwrap().clone(),
        },
        Some(("post-created", sub)) => ForumEvent::PostCreated {
            post_id: parse_id(sub.get_one::<String>("post").unwrap())?,
            topic_id: parse_id(sub.get_one::<String>("topic").unwrap())?,
            user_id: parse_id(sub.get_one::<String>("user").unwrap())?,
            post_number: parse_id(sub.get_one::<String>("number").unwrap())?,
        },
        Some(("post-liked", sub)) => ForumEvent::PostLiked {
            post_id: parse_id(sub.get_one::<String>("post").unwrap())?,
            author_id: parse_id(sub.get_one::<String>("author").unwrap())?,
            liker_id: parse_id(sub.get_one::<String>("liker").unwrap())?,
        },
        _ => return Ok(()),
    };

    match apply_event(conn, &event)? {
        Some(txn) => println!(
            "Rewarded {} {} to user {} (balance: {}, ref: {})",
            txn.amount,
            txn.currency_code,
            txn.user_id,
            txn.balance_after,
            txn.reference_id.as_deref().unwrap_or("-")
        ),
        None => println!("No reward issued (skipped, disabled, or already credited)"),
    }
    Ok(())
}
