//! The printable bill handed to the customer once an order is settled.
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{OrderCode, OrderItemDetail, Rupiah},
    pricing::OrderSummary,
};

pub const RECEIPT_TITLE: &str = "STAR Cafe";
const RECEIPT_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Rupiah,
    pub total: Rupiah,
}

impl From<&OrderItemDetail> for ReceiptLine {
    fn from(detail: &OrderItemDetail) -> Self {
        Self {
            name: detail.menu_name.clone(),
            quantity: detail.item.quantity,
            unit_price: detail.unit_price(),
            total: detail.item.nominal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub title: String,
    pub bill_no: OrderCode,
    pub table: String,
    pub customer: String,
    pub date: DateTime<Utc>,
    pub lines: Vec<ReceiptLine>,
    pub summary: OrderSummary,
}

impl Receipt {
    pub fn new(
        bill_no: OrderCode,
        table: String,
        customer: String,
        date: DateTime<Utc>,
        items: &[OrderItemDetail],
    ) -> Self {
        let lines = items.iter().map(ReceiptLine::from).collect::<Vec<_>>();
        let summary = OrderSummary::from_nominals(lines.iter().map(|l| l.total));
        Self { title: RECEIPT_TITLE.to_string(), bill_no, table, customer, date, lines, summary }
    }
}

fn write_row(f: &mut Formatter<'_>, left: &str, right: &str) -> std::fmt::Result {
    let pad = RECEIPT_WIDTH.saturating_sub(left.chars().count() + right.chars().count()).max(1);
    writeln!(f, "{left}{}{right}", " ".repeat(pad))
}

impl Display for Receipt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rule = "-".repeat(RECEIPT_WIDTH);
        writeln!(f, "{:^width$}", self.title, width = RECEIPT_WIDTH)?;
        writeln!(f, "{rule}")?;
        write_row(f, "Bill No", self.bill_no.as_str())?;
        write_row(f, "Table", &self.table)?;
        write_row(f, "Customer", &self.customer)?;
        write_row(f, "Date", &self.date.format("%d %b %Y %H:%M").to_string())?;
        writeln!(f, "{rule}")?;
        for line in &self.lines {
            writeln!(f, "{}", line.name)?;
            write_row(f, &format!("  {} x {}", line.quantity, line.unit_price), &line.total.to_string())?;
        }
        writeln!(f, "{rule}")?;
        write_row(f, "Subtotal", &self.summary.subtotal.to_string())?;
        write_row(f, "Tax (12%)", &self.summary.tax.to_string())?;
        write_row(f, "Service (5%)", &self.summary.service.to_string())?;
        write_row(f, "Total", &self.summary.grand_total.to_string())?;
        writeln!(f, "{rule}")?;
        write!(f, "{:^width$}", "Thank you!", width = RECEIPT_WIDTH)
    }
}
