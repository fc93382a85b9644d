// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Reward crediting for forum events. Each logical event earns currency at
//! most once: reference ids are derived deterministically from the event's
//! stable fields, and the partial unique index on reward references turns a
//! racing duplicate into a skip instead of a double grant.

use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::ledger::{self, LedgerError, Posting, Reference};
use crate::models::{Transaction, TxnMetadata};
use crate::utils::{get_setting, parse_decimal};

pub const REWARD_REFERENCE_TYPE: &str = "reward_event";
pub const DEFAULT_REWARD_CURRENCY: &str = "credits";

#[derive(Debug, Clone)]
pub enum ForumEvent {
    TopicCreated {
        topic_id: i64,
        user_id: i64,
        title: String,
    },
    PostCreated {
        post_id: i64,
        topic_id: i64,
        user_id: i64,
        post_number: i64,
    },
    PostLiked {
        post_id: i64,
        author_id: i64,
        liker_id: i64,
    },
}

impl ForumEvent {
    /// Transaction type recorded for this event's grant.
    pub fn reward_kind(&self) -> &'static str {
        match self {
            ForumEvent::TopicCreated { .. } => "post_topic",
            ForumEvent::PostCreated { .. } => "post_reply",
            ForumEvent::PostLiked { .. } => "receive_like",
        }
    }

    /// Deterministic idempotency key built from the event's identifying ids.
    pub fn reference_id(&self) -> String {
        match self {
            ForumEvent::TopicCreated { topic_id, .. } => format!("post_topic_{topic_id}"),
            ForumEvent::PostCreated { post_id, .. } => format!("post_reply_{post_id}"),
            ForumEvent::PostLiked {
                post_id, liker_id, ..
            } => format!("receive_like_{post_id}_{liker_id}"),
        }
    }
}

/// Configured reward amount for `key`, falling back to the shipped default.
/// A configured amount of zero (or less) disables the reward.
pub fn reward_amount(conn: &Connection, key: &str, default: Decimal) -> Result<Decimal> {
    match get_setting(conn, key)? {
        Some(v) => parse_decimal(v.trim()),
        None => Ok(default),
    }
}

pub fn reward_currency(conn: &Connection) -> Result<String> {
    Ok(get_setting(conn, "reward_currency")?
        .unwrap_or_else(|| DEFAULT_REWARD_CURRENCY.to_string()))
}

/// Credit the reward for one forum event. Returns `None` when the event earns
/// nothing: first post of a topic, self-like, disabled reward, or an event
/// that was already credited.
pub fn apply_event(conn: &mut Connection, event: &ForumEvent) -> Result<Option<Transaction>> {
    let (user_id, amount_key, default_amount, description, metadata, related_user_id) = match event
    {
        ForumEvent::TopicCreated {
            topic_id,
            user_id,
            title,
        } => (
            *user_id,
            "post_topic_amount",
            Decimal::from(5),
            format!("Topic published: {title}"),
            TxnMetadata::Reward {
                topic_id: Some(*topic_id),
                post_id: None,
                liker_id: None,
            },
            None,
        ),
        // The first post is the topic body itself; only replies earn.
        ForumEvent::PostCreated { post_number, .. } if *post_number == 1 => return Ok(None),
        ForumEvent::PostCreated {
            post_id,
            topic_id,
            user_id,
            ..
        } => (
            *user_id,
            "post_reply_amount",
            Decimal::from(2),
            "Reply published".to_string(),
            TxnMetadata::Reward {
                topic_id: Some(*topic_id),
                post_id: Some(*post_id),
                liker_id: None,
            },
            None,
        ),
        ForumEvent::PostLiked {
            author_id,
            liker_id,
            ..
        } if author_id == liker_id => return Ok(None),
        ForumEvent::PostLiked {
            post_id,
            author_id,
            liker_id,
        } => (
            *author_id,
            "receive_like_amount",
            Decimal::ONE,
            "Post received a like".to_string(),
            TxnMetadata::Reward {
                topic_id: None,
                post_id: Some(*post_id),
                liker_id: Some(*liker_id),
            },
            Some(*liker_id),
        ),
    };

    let amount = reward_amount(conn, amount_key, default_amount)?;
    if amount <= Decimal::ZERO {
        return Ok(None);
    }
    let currency = reward_currency(conn)?;

    let reference_id = event.reference_id();
    let reference = Reference {
        kind: REWARD_REFERENCE_TYPE,
        id: reference_id.as_str(),
    };

    // Fast path; the unique index is what actually prevents a racing double grant.
    if ledger::find_by_reference(conn, user_id, event.reward_kind(), &reference)?.is_some() {
        return Ok(None);
    }

    let details = Posting {
        kind: event.reward_kind(),
        reference: Some(reference),
        related_user_id,
        description: Some(description.as_str()),
        metadata: Some(&metadata),
    };
    match ledger::grant(conn, user_id, amount, &currency, &details) {
        Ok(txn) => Ok(Some(txn)),
        Err(LedgerError::DuplicateReference { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
