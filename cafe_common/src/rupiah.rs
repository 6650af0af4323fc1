use std::{
    fmt::Display,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;

use crate::op;

//--------------------------------------       Rupiah        ---------------------------------------------------------
/// An amount of Indonesian Rupiah. Rupiah have no minor unit in day-to-day use, so amounts are whole numbers.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Rupiah(i64);

op!(binary Rupiah, Add, add);
op!(binary Rupiah, Sub, sub);
op!(inplace Rupiah, AddAssign, add_assign);
op!(inplace Rupiah, SubAssign, sub_assign);
op!(unary Rupiah, Neg, neg);
op!(checked Rupiah);
op!(sum Rupiah);

impl From<i64> for Rupiah {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for Rupiah {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}Rp {grouped}")
    }
}

impl Rupiah {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns `pct` percent of this amount, rounded half away from zero. `pct` is clamped to 0..=100, so the result
    /// is never larger than the amount itself.
    pub fn percent(&self, pct: i64) -> Self {
        let scaled = i128::from(self.0) * i128::from(pct.clamp(0, 100));
        let rounded = if scaled >= 0 { (scaled + 50) / 100 } else { (scaled - 50) / 100 };
        Self(i64::try_from(rounded).unwrap_or(self.0))
    }
}
