// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use coinpurse::ledger::{self, LedgerError, Posting, Reference};
use coinpurse::models::TxnMetadata;
use coinpurse::rewards::{self, ForumEvent};
use coinpurse::{db, utils};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    db::seed_default_currencies(&conn).unwrap();
    conn
}

fn like(post_id: i64, author_id: i64, liker_id: i64) -> ForumEvent {
    ForumEvent::PostLiked {
        post_id,
        author_id,
        liker_id,
    }
}

#[test]
fn like_reward_is_granted_once() {
    let mut conn = setup();
    let event = like(7, 2, 3);

    let first = rewards::apply_event(&mut conn, &event).unwrap();
    let txn = first.expect("first like should grant");
    assert_eq!(txn.amount, Decimal::ONE);
    assert_eq!(txn.kind, "receive_like");
    assert_eq!(txn.reference_id.as_deref(), Some("receive_like_7_3"));
    assert_eq!(txn.related_user_id, Some(3));
    assert_eq!(
        txn.metadata,
        Some(TxnMetadata::Reward {
            topic_id: None,
            post_id: Some(7),
            liker_id: Some(3),
        })
    );

    // Like/unlike/like toggling replays the same logical event.
    assert!(rewards::apply_event(&mut conn, &event).unwrap().is_none());

    let account = ledger::account(&conn, 2, "credits").unwrap().unwrap();
    assert_eq!(account.balance, Decimal::ONE);
    let txns: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(txns, 1);
}

#[test]
fn likes_from_different_users_each_grant() {
    let mut conn = setup();
    assert!(rewards::apply_event(&mut conn, &like(7, 2, 3)).unwrap().is_some());
    assert!(rewards::apply_event(&mut conn, &like(7, 2, 4)).unwrap().is_some());
    let account = ledger::account(&conn, 2, "credits").unwrap().unwrap();
    assert_eq!(account.balance, Decimal::from(2));
}

#[test]
fn self_like_earns_nothing() {
    let mut conn = setup();
    assert!(rewards::apply_event(&mut conn, &like(7, 2, 2)).unwrap().is_none());
    assert!(ledger::account(&conn, 2, "credits").unwrap().is_none());
}

#[test]
fn first_post_of_topic_is_not_rewarded() {
    let mut conn = setup();
    let body = ForumEvent::PostCreated {
        post_id: 10,
        topic_id: 4,
        user_id: 1,
        post_number: 1,
    };
    assert!(rewards::apply_event(&mut conn, &body).unwrap().is_none());

    let reply = ForumEvent::PostCreated {
        post_id: 11,
        topic_id: 4,
        user_id: 1,
        post_number: 2,
    };
    let txn = rewards::apply_event(&mut conn, &reply).unwrap().unwrap();
    assert_eq!(txn.amount, Decimal::from(2));
    assert_eq!(txn.kind, "post_reply");
}

#[test]
fn topic_reward_uses_configured_amount() {
    let mut conn = setup();
    utils::set_setting(&conn, "post_topic_amount", "10").unwrap();
    let event = ForumEvent::TopicCreated {
        topic_id: 42,
        user_id: 1,
        title: "Hello world".to_string(),
    };
    let txn = rewards::apply_event(&mut conn, &event).unwrap().unwrap();
    assert_eq!(txn.amount, Decimal::from(10));
    assert_eq!(txn.kind, "post_topic");
    assert_eq!(
        txn.description.as_deref(),
        Some("Topic published: Hello world")
    );
}

#[test]
fn zero_amount_disables_reward() {
    let mut conn = setup();
    utils::set_setting(&conn, "post_reply_amount", "0").unwrap();
    let reply = ForumEvent::PostCreated {
        post_id: 11,
        topic_id: 4,
        user_id: 1,
        post_number: 2,
    };
    assert!(rewards::apply_event(&mut conn, &reply).unwrap().is_none());
}

#[test]
fn reward_currency_is_configurable() {
    let mut conn = setup();
    utils::set_setting(&conn, "reward_currency", "gold").unwrap();
    let event = ForumEvent::TopicCreated {
        topic_id: 42,
        user_id: 1,
        title: "t".to_string(),
    };
    let txn = rewards::apply_event(&mut conn, &event).unwrap().unwrap();
    assert_eq!(txn.currency_code, "gold");
    assert!(ledger::account(&conn, 1, "gold").unwrap().is_some());
    assert!(ledger::account(&conn, 1, "credits").unwrap().is_none());
}

#[test]
fn unique_index_rejects_duplicate_reward_reference() {
    let mut conn = setup();
    let details = Posting {
        kind: "receive_like",
        reference: Some(Reference {
            kind: rewards::REWARD_REFERENCE_TYPE,
            id: "receive_like_7_3",
        }),
        ..Default::default()
    };
    ledger::grant(&mut conn, 2, Decimal::ONE, "credits", &details).unwrap();
    let err = ledger::grant(&mut conn, 2, Decimal::ONE, "credits", &details).unwrap_err();
    match err {
        LedgerError::DuplicateReference {
            user_id,
            reference_id,
        } => {
            assert_eq!(user_id, 2);
            assert_eq!(reference_id, "receive_like_7_3");
        }
        other => panic!("expected DuplicateReference, got {other:?}"),
    }
    // The losing grant must leave no trace, balance included.
    let account = ledger::account(&conn, 2, "credits").unwrap().unwrap();
    assert_eq!(account.balance, Decimal::ONE);
}

#[test]
fn non_reward_references_may_repeat() {
    let mut conn = setup();
    ledger::grant(&mut conn, 1, Decimal::from(10), "credits", &Posting {
        kind: "post_topic",
        ..Default::default()
    })
    .unwrap();
    let details = Posting {
        kind: "purchase",
        reference: Some(Reference {
            kind: "shop_item",
            id: "5",
        }),
        ..Default::default()
    };
    // Buying the same item twice is legitimate; only reward references dedupe.
    ledger::deduct(&mut conn, 1, Decimal::ONE, "credits", &details, false).unwrap();
    ledger::deduct(&mut conn, 1, Decimal::ONE, "credits", &details, false).unwrap();
    let account = ledger::account(&conn, 1, "credits").unwrap().unwrap();
    assert_eq!(account.balance, Decimal::from(8));
}
