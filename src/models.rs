// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub name: String,
    pub symbol: String,
    pub precision: u32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub currency_code: String,
    pub balance: Decimal,
    pub total_earned: Decimal,
    pub total_spent: Decimal,
    pub is_frozen: bool,
}

/// One immutable balance change. `amount` is signed: positive for grants and
/// transfer credits, negative for deducts and transfer debits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub currency_code: String,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub kind: String,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
    pub related_user_id: Option<i64>,
    pub description: Option<String>,
    pub metadata: Option<TxnMetadata>,
    pub created_at: NaiveDateTime,
}

/// Typed per-kind payload stored in the `metadata` column as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TxnMetadata {
    Reward {
        #[serde(skip_serializing_if = "Option::is_none")]
        topic_id: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        post_id: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        liker_id: Option<i64>,
    },
    Purchase {
        item_id: i64,
        quantity: i64,
    },
    Adjustment {
        reason: String,
    },
}
