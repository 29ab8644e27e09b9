// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub trip_start: Option<String>, // YYYY-MM-DD
    pub trip_end: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitKind {
    #[serde(rename = "EQUAL")]
    Equal,
    #[serde(rename = "ITEM")]
    Item,
}

impl SplitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitKind::Equal => "EQUAL",
            SplitKind::Item => "ITEM",
        }
    }

    pub fn parse(s: &str) -> Option<SplitKind> {
        match s {
            "EQUAL" => Some(SplitKind::Equal),
            "ITEM" => Some(SplitKind::Item),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemMode {
    #[serde(rename = "PER_PERSON")]
    PerPerson,
    #[serde(rename = "SHARED_SPLIT")]
    SharedSplit,
}

impl ItemMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemMode::PerPerson => "PER_PERSON",
            ItemMode::SharedSplit => "SHARED_SPLIT",
        }
    }

    pub fn parse(s: &str) -> Option<ItemMode> {
        match s {
            "PER_PERSON" => Some(ItemMode::PerPerson),
            "SHARED_SPLIT" => Some(ItemMode::SharedSplit),
            _ => None,
        }
    }
}

/// One receipt line of an `ITEM` expense. `unit_price` is set for
/// `PER_PERSON` items, `total_price` for `SHARED_SPLIT` items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub title: String,
    pub mode: ItemMode,
    pub unit_price: Option<i64>,
    pub total_price: Option<i64>,
    pub users: Vec<String>,
}

impl LineItem {
    /// What this line adds to the expense total.
    pub fn line_total(&self) -> i64 {
        match self.mode {
            ItemMode::SharedSplit => self.total_price.unwrap_or(0),
            ItemMode::PerPerson => self.unit_price.unwrap_or(0) * self.users.len() as i64,
        }
    }
}

/// An expense as recorded: who fronted the money and how it splits.
/// Immutable once saved; settlement is always recomputed from these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: i64,
    pub room_id: i64,
    pub title: String,
    pub date: String, // YYYY-MM-DD
    pub payer: String,
    pub split: SplitKind,
    /// For `EQUAL` the entered total; for `ITEM` the derived item sum.
    pub amount: i64,
    pub participants: Vec<String>,
    pub items: Vec<LineItem>,
}

impl ExpenseRecord {
    /// Total spent, recomputed from items for `ITEM` records rather than
    /// trusting the stored column.
    pub fn total(&self) -> i64 {
        match self.split {
            SplitKind::Equal => self.amount,
            SplitKind::Item => self.items.iter().map(LineItem::line_total).sum(),
        }
    }

    /// Creation-time invariants. A record that fails here must never be
    /// written; settlement itself stays lenient (see `settlement`).
    pub fn validate(&self) -> Result<(), InvalidRecord> {
        if self.title.trim().is_empty() {
            return Err(InvalidRecord::EmptyTitle);
        }
        if self.payer.trim().is_empty() {
            return Err(InvalidRecord::NoPayer);
        }
        match self.split {
            SplitKind::Equal => {
                if self.amount <= 0 {
                    return Err(InvalidRecord::NonPositiveAmount {
                        amount: self.amount,
                    });
                }
                if self.participants.is_empty() {
                    return Err(InvalidRecord::NoParticipants);
                }
            }
            SplitKind::Item => {
                if self.items.is_empty() {
                    return Err(InvalidRecord::NoItems);
                }
                for item in &self.items {
                    if item.title.trim().is_empty() {
                        return Err(InvalidRecord::EmptyItemTitle);
                    }
                    if item.users.is_empty() {
                        return Err(InvalidRecord::NoItemUsers {
                            item: item.title.clone(),
                        });
                    }
                    let price = match item.mode {
                        ItemMode::PerPerson => item.unit_price,
                        ItemMode::SharedSplit => item.total_price,
                    };
                    if price.unwrap_or(0) <= 0 {
                        return Err(InvalidRecord::NonPositivePrice {
                            item: item.title.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Rejected at record creation, before anything is persisted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidRecord {
    #[error("expense title must not be empty")]
    EmptyTitle,
    #[error("expense needs a payer")]
    NoPayer,
    #[error("amount must be positive, got {amount}")]
    NonPositiveAmount { amount: i64 },
    #[error("equal split needs at least one participant")]
    NoParticipants,
    #[error("itemized expense needs at least one item")]
    NoItems,
    #[error("item title must not be empty")]
    EmptyItemTitle,
    #[error("item '{item}' has no users")]
    NoItemUsers { item: String },
    #[error("item '{item}' needs a positive price")]
    NonPositivePrice { item: String },
}

/// A derived, directed pairwise debt: `from` owes `to` `amount`.
/// Never persisted; recomputed from the expense set on every view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: i64,
}

/// Request/acknowledge lifecycle of a transfer, persisted per
/// `(room, from, to)` independently of the recomputed amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferState {
    #[serde(rename = "READY")]
    Ready,
    #[serde(rename = "REQUESTED")]
    Requested,
    #[serde(rename = "DONE")]
    Done,
}

impl TransferState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Ready => "READY",
            TransferState::Requested => "REQUESTED",
            TransferState::Done => "DONE",
        }
    }

    pub fn parse(s: &str) -> Option<TransferState> {
        match s {
            "READY" => Some(TransferState::Ready),
            "REQUESTED" => Some(TransferState::Requested),
            "DONE" => Some(TransferState::Done),
            _ => None,
        }
    }
}
