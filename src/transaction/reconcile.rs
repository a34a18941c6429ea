//! Works out how a status change affects the buyer and seller totals.
//!
//! The rules live in one pure function, [delta], so that they can be checked
//! against every pair of statuses without a database. Applying the result is
//! the job of [transition_transaction](crate::transaction::transition_transaction).

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{Error, transaction::TransactionStatus};

/// Which pair of counters on a user a [CounterDelta] applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AggregateSide {
    /// `purchases_count` and `amount_spent`.
    Buyer,
    /// `sales_count` and `amount_earned`.
    Seller,
}

/// A change to one side of a user's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CounterDelta {
    /// Added to the purchase or sale count.
    pub count: i64,
    /// Added to the amount spent or earned.
    pub amount: Decimal,
}

impl CounterDelta {
    /// No change.
    pub const ZERO: Self = Self {
        count: 0,
        amount: Decimal::ZERO,
    };

    /// Create a counter delta.
    pub fn new(count: i64, amount: Decimal) -> Self {
        Self { count, amount }
    }

    /// Whether applying this delta changes nothing.
    pub fn is_zero(&self) -> bool {
        self.count == 0 && self.amount.is_zero()
    }

    /// The delta that undoes this one.
    pub fn inverse(&self) -> Self {
        Self {
            count: -self.count,
            amount: -self.amount,
        }
    }
}

/// The change to the buyer's and seller's counters implied by a status change.
///
/// The seller half is only applied when the transaction has a creator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregateDelta {
    /// Applied to the buyer's purchase counters.
    pub buyer: CounterDelta,
    /// Applied to the creator's sales counters.
    pub seller: CounterDelta,
}

impl AggregateDelta {
    /// No change to either side.
    pub const ZERO: Self = Self {
        buyer: CounterDelta::ZERO,
        seller: CounterDelta::ZERO,
    };

    /// One more completed sale of `amount` for both sides.
    pub fn completion(amount: Decimal) -> Self {
        let side = CounterDelta::new(1, amount);

        Self {
            buyer: side,
            seller: side,
        }
    }

    /// Whether applying this delta changes nothing.
    pub fn is_zero(&self) -> bool {
        self.buyer.is_zero() && self.seller.is_zero()
    }

    /// The delta that undoes this one.
    pub fn inverse(&self) -> Self {
        Self {
            buyer: self.buyer.inverse(),
            seller: self.seller.inverse(),
        }
    }
}

/// Compute the counter changes for moving a transaction worth `amount` from
/// `previous` to `next`.
///
/// | previous \ next      | completed          | cancelled          |
/// |----------------------|--------------------|--------------------|
/// | pending              | completion         | zero               |
/// | completed            | zero               | inverse completion |
/// | cancelled            | invalid            | zero               |
/// | failed, disputed     | invalid            | zero               |
///
/// Moving into a state that would claim the counters include the transaction
/// without them ever having been credited is invalid, which is why nothing
/// but `pending` may move to `completed`.
///
/// # Errors
/// Returns [Error::InvalidTransition] if `next` is not `completed` or
/// `cancelled`, or for the invalid pairs in the table above.
pub fn delta(
    previous: TransactionStatus,
    next: TransactionStatus,
    amount: Decimal,
) -> Result<AggregateDelta, Error> {
    use TransactionStatus::*;

    match (previous, next) {
        (Pending, Completed) => Ok(AggregateDelta::completion(amount)),
        (Completed, Cancelled) => Ok(AggregateDelta::completion(amount).inverse()),
        (Pending | Cancelled | Failed | Disputed, Cancelled) | (Completed, Completed) => {
            Ok(AggregateDelta::ZERO)
        }
        (from, to) => Err(Error::InvalidTransition { from, to }),
    }
}
