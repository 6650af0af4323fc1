//! Price calculations for orders and the order cart.
//!
//! All amounts are whole Rupiah. Percentages are rounded half away from zero, once per amount, so that the totals a
//! customer sees on the bill are exactly the ones sent to the payment gateway.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{Menu, Rupiah};

/// Government tax charged on every order, in percent.
pub const TAX_PERCENT: i64 = 12;
/// Service charge, in percent.
pub const SERVICE_PERCENT: i64 = 5;

pub fn discounted_price(price: Rupiah, discount_percent: i64) -> Rupiah {
    price - price.percent(discount_percent)
}

//--------------------------------------     OrderSummary      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub subtotal: Rupiah,
    pub tax: Rupiah,
    pub service: Rupiah,
    pub grand_total: Rupiah,
}

impl OrderSummary {
    pub fn from_subtotal(subtotal: Rupiah) -> Self {
        let tax = subtotal.percent(TAX_PERCENT);
        let service = subtotal.percent(SERVICE_PERCENT);
        let grand_total = subtotal.saturating_add(tax).saturating_add(service);
        Self { subtotal, tax, service, grand_total }
    }

    pub fn from_nominals<I: IntoIterator<Item = Rupiah>>(nominals: I) -> Self {
        Self::from_subtotal(nominals.into_iter().sum())
    }
}

/// Percentage change from `previous` to `current`, formatted with one decimal place.
///
/// There is no meaningful growth rate when nothing was earned in the previous period, so "0" is returned instead.
pub fn growth_rate(current: Rupiah, previous: Rupiah) -> String {
    if previous.is_zero() {
        return "0".to_string();
    }
    #[allow(clippy::cast_precision_loss)]
    let rate = (current - previous).value() as f64 / previous.value() as f64 * 100.0;
    format!("{rate:.1}")
}

//--------------------------------------         Cart          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("The total for menu {menu} is too large")]
pub struct PriceOverflow {
    pub menu: i64,
}

/// A single menu line as submitted when items are added to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub menu_id: i64,
    pub quantity: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CartLine {
    pub fn new(menu_id: i64, quantity: i64) -> Self {
        Self { menu_id, quantity, notes: None }
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub menu_id: i64,
    pub name: String,
    pub unit_price: Rupiah,
    pub quantity: i64,
    pub nominal: Rupiah,
    pub notes: Option<String>,
}

/// An order-in-progress. Entries are keyed by menu; adding a menu that is already in the cart bumps its quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, menu: &Menu) -> Result<(), PriceOverflow> {
        self.add_quantity(menu, 1, None)
    }

    /// Adds `quantity` units of the menu. Non-empty notes replace any notes already on the entry.
    ///
    /// The cart is left untouched if the new quantity or nominal does not fit.
    pub fn add_quantity(&mut self, menu: &Menu, quantity: i64, notes: Option<String>) -> Result<(), PriceOverflow> {
        let overflow = PriceOverflow { menu: menu.id };
        let notes = notes.filter(|n| !n.trim().is_empty());
        match self.entries.iter_mut().find(|e| e.menu_id == menu.id) {
            Some(entry) => {
                let total_quantity = entry.quantity.checked_add(quantity).ok_or(overflow)?;
                let nominal = entry.unit_price.checked_mul(total_quantity).ok_or(overflow)?;
                entry.quantity = total_quantity;
                entry.nominal = nominal;
                if notes.is_some() {
                    entry.notes = notes;
                }
            },
            None => {
                let unit_price = menu.discounted_price();
                let nominal = unit_price.checked_mul(quantity).ok_or(overflow)?;
                self.entries.push(CartEntry {
                    menu_id: menu.id,
                    name: menu.name.clone(),
                    unit_price,
                    quantity,
                    nominal,
                    notes,
                });
            },
        }
        Ok(())
    }

    /// Returns `Ok(false)` if the menu is not in the cart.
    pub fn increment(&mut self, menu_id: i64) -> Result<bool, PriceOverflow> {
        let Some(entry) = self.entries.iter_mut().find(|e| e.menu_id == menu_id) else {
            return Ok(false);
        };
        let overflow = PriceOverflow { menu: menu_id };
        let nominal = entry.nominal.checked_add(entry.unit_price).ok_or(overflow)?;
        entry.quantity = entry.quantity.checked_add(1).ok_or(overflow)?;
        entry.nominal = nominal;
        Ok(true)
    }

    /// Takes one unit off the entry. The entry is removed once its last unit is taken off.
    pub fn decrement(&mut self, menu_id: i64) -> bool {
        let Some(pos) = self.entries.iter().position(|e| e.menu_id == menu_id) else {
            return false;
        };
        let entry = &mut self.entries[pos];
        if entry.quantity <= 1 {
            self.entries.remove(pos);
        } else {
            entry.quantity -= 1;
            entry.nominal -= entry.unit_price;
        }
        true
    }

    pub fn remove(&mut self, menu_id: i64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.menu_id != menu_id);
        self.entries.len() != before
    }

    pub fn set_notes<S: Into<String>>(&mut self, menu_id: i64, notes: S) -> bool {
        match self.entries.iter_mut().find(|e| e.menu_id == menu_id) {
            Some(entry) => {
                entry.notes = Some(notes.into());
                true
            },
            None => false,
        }
    }

    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> Rupiah {
        self.entries.iter().map(|e| e.nominal).sum()
    }

    pub fn summary(&self) -> OrderSummary {
        OrderSummary::from_subtotal(self.total())
    }

    pub fn lines(&self) -> Vec<CartLine> {
        self.entries
            .iter()
            .map(|e| CartLine { menu_id: e.menu_id, quantity: e.quantity, notes: e.notes.clone() })
            .collect()
    }
}
