// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Sole writer of the `accounts` and `transactions` tables. Every mutation
//! (grant, deduct, transfer) runs in a single IMMEDIATE SQLite transaction:
//! the account update and the audit row commit or roll back together.

use rusqlite::{Connection, ErrorCode, OptionalExtension, TransactionBehavior, params};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{Account, Transaction, TxnMetadata};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("cannot transfer from user {0} to self")]
    SelfTransfer(i64),
    #[error("insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: Decimal, required: Decimal },
    #[error("unknown currency '{0}'")]
    UnknownCurrency(String),
    #[error("duplicate reference '{reference_id}' for user {user_id}")]
    DuplicateReference { user_id: i64, reference_id: String },
    #[error("invalid stored amount '{0}'")]
    BadStoredAmount(String),
    #[error(transparent)]
    Db(#[from] rusqlite::Error),
    #[error("metadata encoding failed: {0}")]
    Metadata(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Pointer from a transaction back to the domain event that caused it.
#[derive(Debug, Clone, Copy)]
pub struct Reference<'a> {
    pub kind: &'a str,
    pub id: &'a str,
}

/// Classification and audit detail shared by the three mutations.
#[derive(Debug, Clone, Copy, Default)]
pub struct Posting<'a> {
    pub kind: &'a str,
    pub reference: Option<Reference<'a>>,
    pub related_user_id: Option<i64>,
    pub description: Option<&'a str>,
    pub metadata: Option<&'a TxnMetadata>,
}

fn parse_stored(s: &str) -> Result<Decimal> {
    s.parse()
        .map_err(|_| LedgerError::BadStoredAmount(s.to_string()))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

/// Read the balance row for (user, currency), if one exists.
pub fn account(conn: &Connection, user_id: i64, currency_code: &str) -> Result<Option<Account>> {
    let row = conn
        .query_row(
            "SELECT id, user_id, currency_code, balance, total_earned, total_spent, is_frozen
             FROM accounts WHERE user_id=?1 AND currency_code=?2",
            params![user_id, currency_code],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, String>(4)?,
                    r.get::<_, String>(5)?,
                    r.get::<_, bool>(6)?,
                ))
            },
        )
        .optional()?;
    let Some((id, user_id, currency_code, balance, earned, spent, is_frozen)) = row else {
        return Ok(None);
    };
    Ok(Some(Account {
        id,
        user_id,
        currency_code,
        balance: parse_stored(&balance)?,
        total_earned: parse_stored(&earned)?,
        total_spent: parse_stored(&spent)?,
        is_frozen,
    }))
}

fn currency_exists(conn: &Connection, code: &str) -> Result<bool> {
    let hit: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM currencies WHERE code=?1",
            params![code],
            |r| r.get(0),
        )
        .optional()?;
    Ok(hit.is_some())
}

/// Fetch the (user, currency) balance row, lazily inserting a zero-balance one.
/// A UNIQUE conflict on insert means a concurrent caller won the race; the row
/// is re-read instead of surfacing the error.
pub fn get_or_create_account(
    conn: &Connection,
    user_id: i64,
    currency_code: &str,
) -> Result<Account> {
    if let Some(existing) = account(conn, user_id, currency_code)? {
        return Ok(existing);
    }
    if !currency_exists(conn, currency_code)? {
        return Err(LedgerError::UnknownCurrency(currency_code.to_string()));
    }
    match conn.execute(
        "INSERT INTO accounts(user_id, currency_code) VALUES (?1, ?2)",
        params![user_id, currency_code],
    ) {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {}
        Err(e) => return Err(e.into()),
    }
    account(conn, user_id, currency_code)?
        .ok_or(LedgerError::Db(rusqlite::Error::QueryReturnedNoRows))
}

pub fn read_transaction(conn: &Connection, id: i64) -> Result<Transaction> {
    let (id, user_id, currency_code, amount, balance_after, kind, reference_type, reference_id,
         related_user_id, description, metadata, created_at) = conn.query_row(
        "SELECT id, user_id, currency_code, amount, balance_after, type, reference_type,
                reference_id, related_user_id, description, metadata, created_at
         FROM transactions WHERE id=?1",
        params![id],
        |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, i64>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, String>(5)?,
                r.get::<_, Option<String>>(6)?,
                r.get::<_, Option<String>>(7)?,
                r.get::<_, Option<i64>>(8)?,
                r.get::<_, Option<String>>(9)?,
                r.get::<_, Option<String>>(10)?,
                r.get::<_, chrono::NaiveDateTime>(11)?,
            ))
        },
    )?;
    let metadata = match metadata {
        Some(s) => Some(serde_json::from_str(&s)?),
        None => None,
    };
    Ok(Transaction {
        id,
        user_id,
        currency_code,
        amount: parse_stored(&amount)?,
        balance_after: parse_stored(&balance_after)?,
        kind,
        reference_type,
        reference_id,
        related_user_id,
        description,
        metadata,
        created_at,
    })
}

/// Look up a prior transaction by its (type, referenceType, referenceId)
/// tuple. Fast path for idempotent consumers; the reward unique index is the
/// authoritative guard.
pub fn find_by_reference(
    conn: &Connection,
    user_id: i64,
    kind: &str,
    reference: &Reference,
) -> Result<Option<Transaction>> {
    let id: Option<i64> = conn
        .query_row(
            "SELECT id FROM transactions
             WHERE user_id=?1 AND type=?2 AND reference_type=?3 AND reference_id=?4
             LIMIT 1",
            params![user_id, kind, reference.kind, reference.id],
            |r| r.get(0),
        )
        .optional()?;
    match id {
        Some(id) => Ok(Some(read_transaction(conn, id)?)),
        None => Ok(None),
    }
}

fn append_transaction(
    conn: &Connection,
    user_id: i64,
    currency_code: &str,
    amount: Decimal,
    balance_after: Decimal,
    details: &Posting,
    default_description: Option<&str>,
) -> Result<Transaction> {
    let metadata = details.metadata.map(serde_json::to_string).transpose()?;
    let description = details.description.or(default_description);
    let (reference_type, reference_id) = match details.reference {
        Some(r) => (Some(r.kind), Some(r.id)),
        None => (None, None),
    };
    let inserted = conn.execute(
        "INSERT INTO transactions(user_id, currency_code, amount, balance_after, type,
                                  reference_type, reference_id, related_user_id, description, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            user_id,
            currency_code,
            amount.to_string(),
            balance_after.to_string(),
            details.kind,
            reference_type,
            reference_id,
            details.related_user_id,
            description,
            metadata
        ],
    );
    if let Err(e) = inserted {
        if is_unique_violation(&e) {
            return Err(LedgerError::DuplicateReference {
                user_id,
                reference_id: reference_id.unwrap_or_default().to_string(),
            });
        }
        return Err(e.into());
    }
    read_transaction(conn, conn.last_insert_rowid())
}

/// Credit `amount` to the user's account (system -> user).
pub fn grant(
    conn: &mut Connection,
    user_id: i64,
    amount: Decimal,
    currency_code: &str,
    details: &Posting,
) -> Result<Transaction> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(amount));
    }
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let account = get_or_create_account(&tx, user_id, currency_code)?;
    let new_balance = account.balance + amount;
    let new_earned = account.total_earned + amount;
    tx.execute(
        "UPDATE accounts SET balance=?1, total_earned=?2, updated_at=datetime('now') WHERE id=?3",
        params![new_balance.to_string(), new_earned.to_string(), account.id],
    )?;
    let txn = append_transaction(&tx, user_id, currency_code, amount, new_balance, details, None)?;
    tx.commit()?;
    Ok(txn)
}

/// Debit `amount` from the user's account (user -> system). Unless
/// `allow_negative` is set, fails before any mutation when the balance does
/// not cover the amount.
pub fn deduct(
    conn: &mut Connection,
    user_id: i64,
    amount: Decimal,
    currency_code: &str,
    details: &Posting,
    allow_negative: bool,
) -> Result<Transaction> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(amount));
    }
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let account = get_or_create_account(&tx, user_id, currency_code)?;
    if !allow_negative && account.balance < amount {
        // Dropping the transaction rolls back the lazy account creation too.
        return Err(LedgerError::InsufficientFunds {
            balance: account.balance,
            required: amount,
        });
    }
    let new_balance = account.balance - amount;
    let new_spent = account.total_spent + amount;
    tx.execute(
        "UPDATE accounts SET balance=?1, total_spent=?2, updated_at=datetime('now') WHERE id=?3",
        params![new_balance.to_string(), new_spent.to_string(), account.id],
    )?;
    let txn = append_transaction(&tx, user_id, currency_code, -amount, new_balance, details, None)?;
    tx.commit()?;
    Ok(txn)
}

/// Move `amount` between two users in one atomic unit. Each side's audit row
/// carries the counterparty as `related_user_id`.
pub fn transfer(
    conn: &mut Connection,
    from_user_id: i64,
    to_user_id: i64,
    amount: Decimal,
    currency_code: &str,
    details: &Posting,
) -> Result<(Transaction, Transaction)> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(amount));
    }
    if from_user_id == to_user_id {
        return Err(LedgerError::SelfTransfer(from_user_id));
    }
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let from_account = get_or_create_account(&tx, from_user_id, currency_code)?;
    let to_account = get_or_create_account(&tx, to_user_id, currency_code)?;
    if from_account.balance < amount {
        return Err(LedgerError::InsufficientFunds {
            balance: from_account.balance,
            required: amount,
        });
    }

    let from_balance = from_account.balance - amount;
    tx.execute(
        "UPDATE accounts SET balance=?1, total_spent=?2, updated_at=datetime('now') WHERE id=?3",
        params![
            from_balance.to_string(),
            (from_account.total_spent + amount).to_string(),
            from_account.id
        ],
    )?;
    let to_balance = to_account.balance + amount;
    tx.execute(
        "UPDATE accounts SET balance=?1, total_earned=?2, updated_at=datetime('now') WHERE id=?3",
        params![
            to_balance.to_string(),
            (to_account.total_earned + amount).to_string(),
            to_account.id
        ],
    )?;

    let from_desc = format!("Transfer to user {}", to_user_id);
    let to_desc = format!("Transfer from user {}", from_user_id);
    let from_details = Posting {
        related_user_id: Some(to_user_id),
        ..*details
    };
    let to_details = Posting {
        related_user_id: Some(from_user_id),
        ..*details
    };
    let from_txn = append_transaction(
        &tx,
        from_user_id,
        currency_code,
        -amount,
        from_balance,
        &from_details,
        Some(&from_desc),
    )?;
    let to_txn = append_transaction(
        &tx,
        to_user_id,
        currency_code,
        amount,
        to_balance,
        &to_details,
        Some(&to_desc),
    )?;
    tx.commit()?;
    Ok((from_txn, to_txn))
}
