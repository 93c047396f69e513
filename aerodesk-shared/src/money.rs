use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// Booking agents earn this share of every ticket price they sell.
pub const COMMISSION_RATE_PERCENT: i64 = 5;

/// Highest ticket price a flight may carry: 1,000,000.00.
pub const MAX_TICKET_PRICE: Money = Money(100_000_000);

/// An amount in minor currency units (cents).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Agent commission on a ticket of this price, rounded half up to the cent.
    ///
    /// Computed in `i128`; the result is never larger than the price.
    pub fn commission(self) -> Money {
        let cents = (i128::from(self.0) * i128::from(COMMISSION_RATE_PERCENT) + 50).div_euclid(100);
        Money(narrow(cents))
    }

    /// Average over `count` items, rounded half up. Zero when `count` is zero.
    pub fn average(self, count: i64) -> Money {
        if count <= 0 {
            return Money::ZERO;
        }
        let count = i128::from(count);
        Money(narrow((i128::from(self.0) * 2 + count).div_euclid(count * 2)))
    }
}

fn narrow(cents: i128) -> i64 {
    i64::try_from(cents).unwrap_or(if cents < 0 { i64::MIN } else { i64::MAX })
}

/// Saturates at the `i64` bounds instead of wrapping.
impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}
