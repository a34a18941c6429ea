//! The scammer gate, which stops flagged users from starting new purchases.

use serde::Serialize;

use crate::{
    Error,
    database_id::UserId,
    transaction::LedgerStore,
    user::User,
};

/// The outcome of [check_allowed].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum GateDecision {
    /// The user may create transactions.
    Allowed,
    /// The user is flagged as a scammer.
    Denied {
        /// The notes the moderator left with the flag.
        notes: Option<String>,
    },
}

impl GateDecision {
    /// Whether the user may create transactions.
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allowed)
    }
}

/// Check whether `user_id` may create new transactions.
///
/// Users that have never been seen have no flag and are allowed. The gate is
/// only consulted when creating transactions; existing transactions of a
/// flagged user can still be completed or cancelled.
///
/// # Errors
/// Returns an [Error::SqlError] if the user cannot be read.
pub fn check_allowed(user_id: UserId, store: &impl LedgerStore) -> Result<GateDecision, Error> {
    let decision = match store.find_user(user_id)? {
        Some(User {
            is_scammer: true,
            scammer_notes,
            ..
        }) => GateDecision::Denied {
            notes: scammer_notes,
        },
        _ => GateDecision::Allowed,
    };

    Ok(decision)
}

/// Flag `user_id` as a scammer with optional `notes`, or clear the flag.
///
/// The user is created if they have not been seen yet, so moderators can flag
/// people before their first purchase.
///
/// # Errors
/// Returns an [Error::SqlError] if the flag cannot be saved.
pub fn set_scammer_flag(
    user_id: UserId,
    is_scammer: bool,
    notes: Option<&str>,
    store: &impl LedgerStore,
) -> Result<User, Error> {
    let notes = notes.map(str::trim).filter(|notes| !notes.is_empty());

    let user = store.atomically(|store| store.set_scammer_flag(user_id, is_scammer, notes))?;

    if is_scammer {
        tracing::info!("Flagged user {user_id} as a scammer");
    } else {
        tracing::info!("Cleared the scammer flag for user {user_id}");
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        database_id::UserId,
        db::initialize,
        transaction::{InMemoryLedger, LedgerStore},
        user::{GateDecision, check_allowed, get_user, set_scammer_flag},
    };

    #[test]
    fn unknown_user_is_allowed() {
        let store = InMemoryLedger::new();

        assert_eq!(
            check_allowed(UserId::new(1), &store),
            Ok(GateDecision::Allowed)
        );
    }

    #[test]
    fn unflagged_user_is_allowed() {
        let store = InMemoryLedger::new();
        store.ensure_user(UserId::new(1), Some("Alice")).unwrap();

        assert!(check_allowed(UserId::new(1), &store).unwrap().is_allowed());
    }

    #[test]
    fn flagged_user_is_denied_with_notes() {
        let store = InMemoryLedger::new();
        set_scammer_flag(UserId::new(1), true, Some(" fake receipts "), &store).unwrap();

        assert_eq!(
            check_allowed(UserId::new(1), &store),
            Ok(GateDecision::Denied {
                notes: Some("fake receipts".to_owned())
            })
        );
    }

    #[test]
    fn blank_notes_are_dropped() {
        let store = InMemoryLedger::new();

        let user = set_scammer_flag(UserId::new(1), true, Some("   "), &store).unwrap();

        assert_eq!(user.scammer_notes, None);
    }

    #[test]
    fn cleared_user_is_allowed_again() {
        let store = InMemoryLedger::new();
        set_scammer_flag(UserId::new(1), true, None, &store).unwrap();

        set_scammer_flag(UserId::new(1), false, None, &store).unwrap();

        assert!(check_allowed(UserId::new(1), &store).unwrap().is_allowed());
    }

    #[test]
    fn flag_is_persisted_in_sqlite() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        set_scammer_flag(UserId::new(5), true, Some("chargebacks"), &conn).unwrap();

        let user = get_user(UserId::new(5), &conn).unwrap();
        assert!(user.is_scammer);
        assert_eq!(
            check_allowed(UserId::new(5), &conn),
            Ok(GateDecision::Denied {
                notes: Some("chargebacks".to_owned())
            })
        );
    }
}
