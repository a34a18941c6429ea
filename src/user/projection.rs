//! What the bot shows for "show status".

use std::fmt::Display;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{database_id::UserId, user::User};

/// A user's purchase and sales totals and whether they are flagged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStatus {
    /// The user's ID.
    pub user_id: UserId,
    /// The stored display name, may be empty.
    pub display_name: String,
    /// Completed purchases.
    pub purchases_count: i64,
    /// Total of completed purchases.
    pub amount_spent: Decimal,
    /// Completed sales.
    pub sales_count: i64,
    /// Total of completed sales.
    pub amount_earned: Decimal,
    /// Whether the user is flagged as a scammer.
    pub is_scammer: bool,
    /// The moderator's notes for the flag.
    pub scammer_notes: Option<String>,
    /// `🚨` for flagged users, empty otherwise.
    pub marker: &'static str,
}

impl From<&User> for UserStatus {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            display_name: user.display_name.clone(),
            purchases_count: user.purchases_count,
            amount_spent: user.amount_spent,
            sales_count: user.sales_count,
            amount_earned: user.amount_earned,
            is_scammer: user.is_scammer,
            scammer_notes: user.scammer_notes.clone(),
            marker: if user.is_scammer { "🚨" } else { "" },
        }
    }
}

impl Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = if self.display_name.is_empty() {
            self.user_id.to_string()
        } else {
            self.display_name.clone()
        };

        write!(
            f,
            "{name}: {} purchases ({:.2} spent), {} sales ({:.2} earned)",
            self.purchases_count, self.amount_spent, self.sales_count, self.amount_earned
        )?;

        if self.is_scammer {
            write!(f, "\n{} Flagged as a scammer", self.marker)?;

            if let Some(notes) = &self.scammer_notes {
                write!(f, ": {notes}")?;
            }
        }

        Ok(())
    }
}
