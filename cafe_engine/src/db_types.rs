use std::{
    fmt::Display,
    str::FromStr,
    sync::atomic::{AtomicI64, Ordering},
};

pub use cafe_common::Rupiah;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::pricing::discounted_price;

/// Capacities that a table on the floor plan can have.
pub const TABLE_CAPACITIES: [i64; 5] = [2, 4, 6, 8, 10];

/// Label used wherever an order without a table is displayed.
pub const TAKEAWAY_LABEL: &str = "Takeaway";

const ORDER_CODE_PREFIX: &str = "STARCAFE";

/// Millisecond stamp of the last generated order code.
static LAST_ORDER_CODE_MILLIS: AtomicI64 = AtomicI64::new(0);

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

/// Declares a closed set of values that is stored as lower-case text in the database and serialized the same way
/// over the wire.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
        #[sqlx(rename_all = "lowercase")]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    s => Err(ConversionError(format!("{s} is not a valid {}", stringify!($name)))),
                }
            }
        }
    };
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
text_enum! {
    OrderStatusType {
        /// A table has been booked for the customer, who has not sat down yet.
        Reserved => "reserved",
        /// The customer is being served. Items can be added to the order.
        Process => "process",
        /// The order has been paid for.
        Settled => "settled",
        /// The reservation was cancelled.
        Canceled => "canceled",
    }
}

impl OrderStatusType {
    /// Active orders are the ones that still occupy the floor: reserved or in process.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Reserved | Self::Process)
    }

    /// The status a table takes on when an order with this status is seated at it.
    pub fn table_status(&self) -> TableStatus {
        match self {
            Self::Reserved => TableStatus::Reserved,
            Self::Process => TableStatus::Unavailable,
            Self::Settled | Self::Canceled => TableStatus::Available,
        }
    }
}

//--------------------------------------   OrderItemStatus     ---------------------------------------------------------
text_enum! {
    OrderItemStatus {
        Pending => "pending",
        Process => "process",
        Ready => "ready",
        Served => "served",
    }
}

impl OrderItemStatus {
    /// The only status an item may move to from this one. Served items are final.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Process),
            Self::Process => Some(Self::Ready),
            Self::Ready => Some(Self::Served),
            Self::Served => None,
        }
    }

    pub fn can_transition_to(&self, new_status: OrderItemStatus) -> bool {
        self.next() == Some(new_status)
    }

    /// Position of the status in the kitchen pipeline. Used to sort order items.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Process => 1,
            Self::Ready => 2,
            Self::Served => 3,
        }
    }
}

//--------------------------------------     TableStatus       ---------------------------------------------------------
text_enum! {
    TableStatus {
        Available => "available",
        Reserved => "reserved",
        Unavailable => "unavailable",
    }
}

//--------------------------------------         Role          ---------------------------------------------------------
text_enum! {
    Role {
        Admin => "admin",
        Cashier => "cashier",
        Kitchen => "kitchen",
    }
}

//--------------------------------------       OrderCode       ---------------------------------------------------------
/// The human-readable order number printed on bills and passed to the payment gateway, e.g. `STARCAFE-1718000000000`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderCode(pub String);

impl OrderCode {
    /// A code from the current time. Codes generated within the same millisecond are bumped forward, so this
    /// process never hands out the same code twice.
    pub fn generate() -> Self {
        let now = Utc::now().timestamp_millis();
        let last = LAST_ORDER_CODE_MILLIS
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
            .unwrap_or_else(|last| last);
        Self::from_millis(now.max(last + 1))
    }

    pub fn from_timestamp(ts: DateTime<Utc>) -> Self {
        Self::from_millis(ts.timestamp_millis())
    }

    fn from_millis(millis: i64) -> Self {
        Self(format!("{ORDER_CODE_PREFIX}-{millis}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the broadcast channel that dashboards viewing this order listen on.
    pub fn sync_channel(&self) -> String {
        format!("order-sync-{}", self.0)
    }
}

impl FromStr for OrderCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderCode,
    pub customer_name: String,
    pub table_id: Option<i64>,
    pub status: OrderStatusType,
    pub payment_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order joined with the name of the table it is seated at.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub order: Order,
    pub table_name: Option<String>,
}

impl OrderRow {
    pub fn table_label(&self) -> &str {
        self.table_name.as_deref().unwrap_or(TAKEAWAY_LABEL)
    }
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_id: OrderCode,
    pub customer_name: String,
    pub table_id: Option<i64>,
    pub status: OrderStatusType,
}

impl NewOrder {
    pub fn dine_in<S: Into<String>>(customer_name: S, table_id: i64, status: OrderStatusType) -> Self {
        Self { order_id: OrderCode::generate(), customer_name: customer_name.into(), table_id: Some(table_id), status }
    }

    /// Takeaway orders skip the reservation step and go straight to the kitchen.
    pub fn takeaway<S: Into<String>>(customer_name: S) -> Self {
        Self {
            order_id: OrderCode::generate(),
            customer_name: customer_name.into(),
            table_id: None,
            status: OrderStatusType::Process,
        }
    }

    pub fn with_order_id(mut self, order_id: OrderCode) -> Self {
        self.order_id = order_id;
        self
    }
}

//--------------------------------------      OrderItem        ---------------------------------------------------------
/// A line on an order. `nominal` is the discounted unit price multiplied by the quantity, fixed at the time the item
/// was added.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_id: i64,
    pub quantity: i64,
    pub nominal: Rupiah,
    pub notes: Option<String>,
    pub status: OrderItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItemDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub item: OrderItem,
    pub menu_name: String,
    pub menu_category: String,
    pub menu_price: Rupiah,
    pub menu_discount: i64,
    pub menu_image_url: Option<String>,
}

impl OrderItemDetail {
    pub fn unit_price(&self) -> Rupiah {
        discounted_price(self.menu_price, self.menu_discount)
    }
}

//--------------------------------------         Menu          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Menu {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Rupiah,
    /// Discount in whole percent, 0 - 100
    pub discount: i64,
    pub category: String,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Menu {
    pub fn discounted_price(&self) -> Rupiah {
        discounted_price(self.price, self.discount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMenu {
    pub name: String,
    pub description: String,
    pub price: Rupiah,
    pub discount: i64,
    pub category: String,
    pub image_url: Option<String>,
    pub is_available: bool,
}

//--------------------------------------         Table         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Table {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub capacity: i64,
    pub status: TableStatus,
    pub position_x: i64,
    pub position_y: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTable {
    pub name: String,
    pub description: Option<String>,
    pub capacity: i64,
    pub status: TableStatus,
    pub position_x: i64,
    pub position_y: i64,
}

//--------------------------------------        Profile        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub avatar_url: Option<String>,
}
