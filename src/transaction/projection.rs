//! Read-only summaries of transactions for the chat bot to display.

use std::fmt::Display;

use rust_decimal::Decimal;
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    database_id::{TransactionId, UserId},
    transaction::{Transaction, TransactionStatus},
};

/// The max number of graphemes of the item label to show in a one line
/// summary before truncating and displaying an ellipsis.
const MAX_ITEM_GRAPHEMES: usize = 40;

/// The emoji shown next to a status.
///
/// Takes the status name rather than a [TransactionStatus] so that labels
/// from other sources can be shown too; unknown names get a question mark.
pub fn status_marker(status: &str) -> &'static str {
    match status.parse::<TransactionStatus>() {
        Ok(TransactionStatus::Pending) => "⏳",
        Ok(TransactionStatus::Completed) => "✅",
        Ok(TransactionStatus::Cancelled) => "🚫",
        Ok(TransactionStatus::Failed) => "❌",
        Ok(TransactionStatus::Disputed) => "⚠️",
        Err(_) => "❓",
    }
}

/// What the bot shows for one transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionSummary {
    /// The transaction's ID, shown as `#id`.
    pub id: TransactionId,
    /// The user who bought the item.
    pub buyer_id: UserId,
    /// The user who sold the item, if any.
    pub creator_id: Option<UserId>,
    /// What was bought.
    pub item: String,
    /// How many units were bought.
    pub quantity: u32,
    /// The price of one unit.
    pub unit_price: Decimal,
    /// What the buyer pays in total.
    pub total_amount: Decimal,
    /// The lowercase status name.
    pub status: TransactionStatus,
    /// The capitalised status name.
    pub status_label: &'static str,
    /// The emoji for the status, see [status_marker].
    pub marker: &'static str,
    /// When the transaction was created, in RFC 3339 format.
    pub created_at: String,
}

impl From<&Transaction> for TransactionSummary {
    fn from(transaction: &Transaction) -> Self {
        Self {
            id: transaction.id,
            buyer_id: transaction.buyer_id,
            creator_id: transaction.creator_id,
            item: transaction.item.clone(),
            quantity: transaction.quantity,
            unit_price: transaction.unit_price,
            total_amount: transaction.total_amount,
            status: transaction.status,
            status_label: transaction.status.label(),
            marker: status_marker(transaction.status.as_str()),
            created_at: format_timestamp(transaction.created_at),
        }
    }
}

impl Display for TransactionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} #{} {} ×{} @ {:.2} = {:.2} ({})",
            self.marker,
            self.id,
            truncate_item(&self.item),
            self.quantity,
            self.unit_price,
            self.total_amount,
            self.status_label
        )
    }
}

/// What the bot shows for a user's transaction history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    /// Whose history this is.
    pub user_id: UserId,
    /// Newest first.
    pub transactions: Vec<TransactionSummary>,
}

impl HistorySummary {
    /// Summarise `transactions`, keeping their order.
    pub fn new(user_id: UserId, transactions: &[Transaction]) -> Self {
        Self {
            user_id,
            transactions: transactions.iter().map(TransactionSummary::from).collect(),
        }
    }
}

impl Display for HistorySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.transactions.is_empty() {
            return write!(f, "No transactions yet.");
        }

        let lines: Vec<String> = self
            .transactions
            .iter()
            .map(|summary| summary.to_string())
            .collect();

        write!(f, "{}", lines.join("\n"))
    }
}

fn truncate_item(item: &str) -> String {
    if item.graphemes(true).count() <= MAX_ITEM_GRAPHEMES {
        return item.to_owned();
    }

    let truncated: String = item.graphemes(true).take(MAX_ITEM_GRAPHEMES - 3).collect();
    truncated + "..."
}

fn format_timestamp(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(&Rfc3339)
        .unwrap_or_else(|_| timestamp.to_string())
}
