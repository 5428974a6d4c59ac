//! Trade lifecycle transitions
//!
//! Each helper takes the full trade list and activity log and returns new
//! copies; nothing is changed in place. Only pending trades move, and they
//! move exactly once.

use crate::error::RuleViolation;
use crate::logging::{ActivityLog, EventKind, LogEntry};
use crate::types::{Cancellation, NameKey, TradeProposal, TradeStatus};
use chrono::{DateTime, Utc};

/// Trades and log after a lifecycle transition
#[derive(Debug, Clone, PartialEq)]
pub struct TradeBook {
    pub trades: Vec<TradeProposal>,
    pub log: ActivityLog,
}

/// How a cancellation came about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancelOptions {
    pub auto_cancelled: bool,
    pub reason: Option<String>,
    pub cancelled_by: Option<String>,
}

impl CancelOptions {
    /// A manager or commissioner withdrew the trade
    pub fn manual(cancelled_by: impl Into<String>) -> Self {
        Self {
            auto_cancelled: false,
            reason: None,
            cancelled_by: Some(cancelled_by.into()),
        }
    }

    /// The system withdrew the trade because it can no longer settle
    pub fn automatic(reason: impl Into<String>) -> Self {
        Self {
            auto_cancelled: true,
            reason: Some(reason.into()),
            cancelled_by: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Pending → rejected. Only the receiving team or the commissioner may
/// reject; the caller checks that.
pub fn reject_trade_by_id(
    trades: &[TradeProposal],
    log: &ActivityLog,
    trade_id: &str,
    rejected_by: Option<&str>,
    now: DateTime<Utc>,
) -> Result<TradeBook, RuleViolation> {
    let index = pending_index(trades, trade_id)?;
    let mut trades = trades.to_vec();
    let mut log = log.clone();

    let trade = &mut trades[index];
    trade.status = TradeStatus::Rejected;
    trade.resolved_at = Some(now);

    let mut entry = LogEntry::info(
        EventKind::TradeRejected,
        now,
        format!("{} rejected the trade from {}", trade.to_team, trade.from_team),
    )
    .with_team(trade.to_team.clone())
    .with_subject(trade.id.clone());
    if let Some(by) = rejected_by {
        entry = entry.with_metadata("rejected_by", by);
    }
    log.log(entry);

    Ok(TradeBook { trades, log })
}

/// Pending → cancelled, manually or automatically
pub fn cancel_trade_by_id(
    trades: &[TradeProposal],
    log: &ActivityLog,
    trade_id: &str,
    options: CancelOptions,
    now: DateTime<Utc>,
) -> Result<TradeBook, RuleViolation> {
    let index = pending_index(trades, trade_id)?;
    let mut trades = trades.to_vec();
    let mut log = log.clone();
    cancel_in_place(&mut trades[index], &mut log, options, now);
    Ok(TradeBook { trades, log })
}

/// Cancel every pending trade whose deadline has passed, flagging it expired.
///
/// Run this before anything trusts a trade's pending status.
pub fn expire_pending_trades(
    trades: &[TradeProposal],
    log: &ActivityLog,
    now: DateTime<Utc>,
) -> TradeBook {
    let mut trades = trades.to_vec();
    let mut log = log.clone();

    for trade in trades
        .iter_mut()
        .filter(|t| t.is_pending() && t.is_past_expiry(now))
    {
        expire_in_place(trade, &mut log, now);
    }

    TradeBook { trades, log }
}

/// Cancel every pending trade in which `team` sends or receives `player`.
///
/// Used when a buyout or commissioner removal takes the player off a roster.
pub fn cancel_trades_for_player(
    trades: &[TradeProposal],
    log: &ActivityLog,
    team: &str,
    player: &str,
    reason: &str,
    now: DateTime<Utc>,
) -> TradeBook {
    let team_key = NameKey::new(team);
    let player_key = NameKey::new(player);
    let affected: Vec<String> = trades
        .iter()
        .filter(|t| t.is_pending() && t.involves_team(&team_key) && t.involves_player(&player_key))
        .map(|t| t.id.clone())
        .collect();

    let mut book = TradeBook {
        trades: trades.to_vec(),
        log: log.clone(),
    };
    for trade_id in affected {
        // Ids were collected from pending trades in this same list
        if let Ok(next) = cancel_trade_by_id(
            &book.trades,
            &book.log,
            &trade_id,
            CancelOptions::automatic(reason),
            now,
        ) {
            book = next;
        }
    }
    book
}

pub(crate) fn expire_in_place(trade: &mut TradeProposal, log: &mut ActivityLog, now: DateTime<Utc>) {
    trade.status = TradeStatus::Cancelled;
    trade.expired = true;
    trade.resolved_at = Some(now);
    trade.cancellation = Some(Cancellation {
        auto_cancelled: true,
        reason: Some("Trade expired".to_string()),
        cancelled_by: None,
    });
    log.log(
        LogEntry::info(
            EventKind::TradeExpired,
            now,
            format!(
                "Trade between {} and {} expired without a response",
                trade.from_team, trade.to_team
            ),
        )
        .with_team(trade.from_team.clone())
        .with_subject(trade.id.clone())
        .with_metadata("expires_at", trade.expires_at.to_rfc3339()),
    );
}

fn cancel_in_place(
    trade: &mut TradeProposal,
    log: &mut ActivityLog,
    options: CancelOptions,
    now: DateTime<Utc>,
) {
    trade.status = TradeStatus::Cancelled;
    trade.resolved_at = Some(now);

    let message = match (&options.reason, options.auto_cancelled) {
        (Some(reason), true) => format!("Trade between {} and {} was cancelled: {}", trade.from_team, trade.to_team, reason),
        (_, true) => format!("Trade between {} and {} was cancelled", trade.from_team, trade.to_team),
        (_, false) => format!(
            "{} cancelled the trade with {}",
            options.cancelled_by.as_deref().unwrap_or(&trade.from_team),
            trade.to_team
        ),
    };
    let mut entry = LogEntry::info(EventKind::TradeCancelled, now, message)
        .with_team(trade.from_team.clone())
        .with_subject(trade.id.clone())
        .with_metadata("auto_cancelled", options.auto_cancelled);
    if let Some(by) = &options.cancelled_by {
        entry = entry.with_metadata("cancelled_by", by);
    }
    log.log(entry);

    trade.cancellation = Some(Cancellation {
        auto_cancelled: options.auto_cancelled,
        reason: options.reason,
        cancelled_by: options.cancelled_by,
    });
}

fn pending_index(trades: &[TradeProposal], trade_id: &str) -> Result<usize, RuleViolation> {
    let index = trades
        .iter()
        .position(|t| t.id == trade_id)
        .ok_or_else(|| RuleViolation::TradeNotFound {
            trade_id: trade_id.to_string(),
        })?;
    if trades[index].status.is_terminal() {
        return Err(RuleViolation::TradeNotPending {
            trade_id: trade_id.to_string(),
            status: trades[index].status,
        });
    }
    Ok(index)
}
