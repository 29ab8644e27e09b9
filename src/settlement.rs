// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use thiserror::Error;

use crate::models::{ExpenseRecord, ItemMode, SplitKind, Transfer, TransferState};

/// Transfer identity: the ordered `(debtor, creditor)` pair.
pub type PairKey = (String, String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettlementError {
    /// The referenced pair is not in the current aggregation; the caller
    /// should recompute and retry.
    #[error("no transfer from '{from}' to '{to}' in the current settlement")]
    UnknownTransfer { from: String, to: String },
    #[error("illegal transition on transfer '{from}' -> '{to}': {reason}")]
    IllegalTransition {
        from: String,
        to: String,
        reason: &'static str,
    },
}

/// Round-half-up integer division for positive operands. Matches what the
/// ledger has always shown for equal and shared splits.
pub fn split_share(total: i64, n: i64) -> i64 {
    if n <= 0 {
        return 0;
    }
    (2 * total + n) / (2 * n)
}

/// Resolve one expense into `(debtor, creditor, amount)` obligations owed
/// to the payer.
///
/// Shares are rounded per debtor independently, so the collected total may
/// drift from the paid total by up to participants-1 smallest units. A
/// payer listed among the participants of a split enlarges the divisor but
/// owes nothing. Lenient on malformed records that slipped past
/// `ExpenseRecord::validate`: missing prices count as zero and empty user
/// sets emit nothing.
pub fn resolve_obligations(expense: &ExpenseRecord) -> Vec<(String, String, i64)> {
    let payer = expense.payer.as_str();
    let mut out = Vec::new();

    match expense.split {
        SplitKind::Equal => {
            if expense.participants.is_empty() {
                return out;
            }
            let share = split_share(expense.amount.max(0), expense.participants.len() as i64);
            for p in &expense.participants {
                if p != payer {
                    out.push((p.clone(), payer.to_string(), share));
                }
            }
        }
        SplitKind::Item => {
            for item in &expense.items {
                if item.users.is_empty() {
                    continue;
                }
                match item.mode {
                    ItemMode::PerPerson => {
                        // Charged once per user, not divided.
                        let unit = item.unit_price.unwrap_or(0).max(0);
                        for u in &item.users {
                            if u != payer {
                                out.push((u.clone(), payer.to_string(), unit));
                            }
                        }
                    }
                    ItemMode::SharedSplit => {
                        let total = item.total_price.unwrap_or(0).max(0);
                        let share = split_share(total, item.users.len() as i64);
                        for u in &item.users {
                            if u != payer {
                                out.push((u.clone(), payer.to_string(), share));
                            }
                        }
                    }
                }
            }
        }
    }
    out
}

fn add_transfer(acc: &mut BTreeMap<PairKey, i64>, from: String, to: String, amount: i64) {
    if from.is_empty() || to.is_empty() || from == to {
        return;
    }
    *acc.entry((from, to)).or_insert(0) += amount;
}

/// Net all expenses into one transfer per ordered `(from, to)` pair.
///
/// Obligations are summed exactly (no second rounding); zero totals drop
/// out. Opposite-direction pairs are kept separate rather than offset
/// against each other. Output is sorted by descending amount, ties in
/// lexical pair order.
pub fn aggregate(expenses: &[ExpenseRecord]) -> Vec<Transfer> {
    let mut acc: BTreeMap<PairKey, i64> = BTreeMap::new();
    for expense in expenses {
        for (from, to, amount) in resolve_obligations(expense) {
            add_transfer(&mut acc, from, to, amount);
        }
    }

    let mut transfers: Vec<Transfer> = acc
        .into_iter()
        .filter(|(_, amount)| *amount != 0)
        .map(|((from, to), amount)| Transfer { from, to, amount })
        .collect();
    // Stable sort on a lexically ordered input keeps equal amounts in
    // deterministic pair order.
    transfers.sort_by(|a, b| b.amount.cmp(&a.amount));
    transfers
}

/// A transfer joined with its lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettledTransfer {
    pub from: String,
    pub to: String,
    pub amount: i64,
    pub state: TransferState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Total the acting user still has to send (they are the debtor).
    pub send: i64,
    /// Total owed to the acting user (they are the creditor).
    pub receive: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettlementView {
    pub transfers: Vec<SettledTransfer>,
    pub summary: Summary,
}

impl SettlementView {
    /// Transfers involving `who` as either side ("my transfers").
    pub fn involving(&self, who: &str) -> Vec<&SettledTransfer> {
        self.transfers
            .iter()
            .filter(|t| t.from == who || t.to == who)
            .collect()
    }

    /// Transfers `me` may request right now: owed to `me` and still READY.
    /// This is exactly the bulk-request candidate set.
    pub fn requestable(&self, me: &str) -> Vec<&SettledTransfer> {
        self.transfers
            .iter()
            .filter(|t| t.to == me && t.state == TransferState::Ready)
            .collect()
    }
}

/// Join freshly aggregated transfers against the persisted status table.
/// Pairs never seen before default to READY; stored rows whose debt no
/// longer exists are simply not surfaced. The summary covers the
/// transfers involving `me`.
pub fn assemble(
    transfers: Vec<Transfer>,
    status: &HashMap<PairKey, TransferState>,
    me: &str,
) -> SettlementView {
    let transfers: Vec<SettledTransfer> = transfers
        .into_iter()
        .map(|t| {
            let state = status
                .get(&(t.from.clone(), t.to.clone()))
                .copied()
                .unwrap_or(TransferState::Ready);
            SettledTransfer {
                from: t.from,
                to: t.to,
                amount: t.amount,
                state,
            }
        })
        .collect();

    let mut summary = Summary::default();
    for t in &transfers {
        if t.from == me {
            summary.send += t.amount;
        }
        if t.to == me {
            summary.receive += t.amount;
        }
    }
    SettlementView { transfers, summary }
}

fn current_state(
    view: &SettlementView,
    from: &str,
    to: &str,
) -> Result<TransferState, SettlementError> {
    view.transfers
        .iter()
        .find(|t| t.from == from && t.to == to)
        .map(|t| t.state)
        .ok_or_else(|| SettlementError::UnknownTransfer {
            from: from.to_string(),
            to: to.to_string(),
        })
}

/// READY -> REQUESTED. Only the creditor may ask.
pub fn request(
    view: &SettlementView,
    status: &mut HashMap<PairKey, TransferState>,
    me: &str,
    from: &str,
    to: &str,
) -> Result<(), SettlementError> {
    let state = current_state(view, from, to)?;
    if me != to {
        return Err(SettlementError::IllegalTransition {
            from: from.to_string(),
            to: to.to_string(),
            reason: "only the creditor may request payment",
        });
    }
    if state != TransferState::Ready {
        return Err(SettlementError::IllegalTransition {
            from: from.to_string(),
            to: to.to_string(),
            reason: "transfer was already requested or completed",
        });
    }
    status.insert((from.to_string(), to.to_string()), TransferState::Requested);
    Ok(())
}

/// REQUESTED -> REQUESTED. Re-notifies the debtor without changing state.
pub fn resend(
    view: &SettlementView,
    status: &mut HashMap<PairKey, TransferState>,
    me: &str,
    from: &str,
    to: &str,
) -> Result<(), SettlementError> {
    let state = current_state(view, from, to)?;
    if me != to {
        return Err(SettlementError::IllegalTransition {
            from: from.to_string(),
            to: to.to_string(),
            reason: "only the creditor may resend a request",
        });
    }
    if state != TransferState::Requested {
        return Err(SettlementError::IllegalTransition {
            from: from.to_string(),
            to: to.to_string(),
            reason: "only an outstanding request can be resent",
        });
    }
    status.insert((from.to_string(), to.to_string()), TransferState::Requested);
    Ok(())
}

/// REQUESTED -> DONE, once the money moved out-of-band. DONE is terminal.
pub fn mark_done(
    view: &SettlementView,
    status: &mut HashMap<PairKey, TransferState>,
    me: &str,
    from: &str,
    to: &str,
) -> Result<(), SettlementError> {
    let state = current_state(view, from, to)?;
    if me != to {
        return Err(SettlementError::IllegalTransition {
            from: from.to_string(),
            to: to.to_string(),
            reason: "only the creditor may mark a transfer done",
        });
    }
    if state != TransferState::Requested {
        return Err(SettlementError::IllegalTransition {
            from: from.to_string(),
            to: to.to_string(),
            reason: "transfer must be requested before it can be completed",
        });
    }
    status.insert((from.to_string(), to.to_string()), TransferState::Done);
    Ok(())
}

/// Move every transfer `me` can request to REQUESTED in one step.
/// REQUESTED and DONE transfers are untouched. Returns the pairs moved.
pub fn request_all(
    view: &SettlementView,
    status: &mut HashMap<PairKey, TransferState>,
    me: &str,
) -> Vec<PairKey> {
    let pairs: Vec<PairKey> = view
        .requestable(me)
        .into_iter()
        .map(|t| (t.from.clone(), t.to.clone()))
        .collect();
    for key in &pairs {
        status.insert(key.clone(), TransferState::Requested);
    }
    pairs
}
