//! Operator impls for money newtypes that wrap a single integer.
//!
//! ```ignore
//! op!(binary Rupiah, Add, add);      // Rupiah + Rupiah
//! op!(inplace Rupiah, AddAssign, add_assign);
//! op!(unary Rupiah, Neg, neg);
//! op!(checked Rupiah);              // checked_mul, checked_add, saturating_add
//! op!(sum Rupiah);                   // iter.sum::<Rupiah>(), saturating
//! ```
#[macro_export]
macro_rules! op {
    (binary $money:ident, $op_trait:ident, $op_fn:ident) => {
        impl $op_trait for $money {
            type Output = Self;

            fn $op_fn(self, rhs: Self) -> Self {
                Self(self.0.$op_fn(rhs.0))
            }
        }
    };

    (inplace $money:ident, $op_trait:ident, $op_fn:ident) => {
        impl $op_trait for $money {
            fn $op_fn(&mut self, rhs: Self) {
                self.0.$op_fn(rhs.0);
            }
        }
    };

    (unary $money:ident, $op_trait:ident, $op_fn:ident) => {
        impl $op_trait for $money {
            type Output = Self;

            fn $op_fn(self) -> Self {
                Self(self.0.$op_fn())
            }
        }
    };

    (checked $money:ident) => {
        impl $money {
            /// `None` if the product does not fit.
            pub fn checked_mul(self, factor: i64) -> Option<Self> {
                self.0.checked_mul(factor).map(Self)
            }

            pub fn checked_add(self, rhs: Self) -> Option<Self> {
                self.0.checked_add(rhs.0).map(Self)
            }

            pub fn saturating_add(self, rhs: Self) -> Self {
                Self(self.0.saturating_add(rhs.0))
            }
        }
    };

    (sum $money:ident) => {
        impl std::iter::Sum for $money {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                iter.fold(Self::default(), |acc, x| Self(acc.0.saturating_add(x.0)))
            }
        }
    };
}
