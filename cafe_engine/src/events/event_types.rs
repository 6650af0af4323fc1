use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::db_types::{Menu, Order, OrderCode, OrderItem, Table};

pub const ORDERS_TOPIC: &str = "orders";
pub const ORDER_ITEMS_TOPIC: &str = "orders_menus";
pub const TABLES_TOPIC: &str = "tables";
pub const MENUS_TOPIC: &str = "menus";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A change to one of the rows that dashboards display. Subscribers re-fetch whatever they are showing when they
/// receive one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeEvent {
    OrderChanged { change: ChangeKind, order: Order },
    OrderItemChanged { change: ChangeKind, order_code: OrderCode, item: OrderItem },
    TableChanged { change: ChangeKind, table: Table },
    MenuChanged { change: ChangeKind, menu: Menu },
    /// Ask every client listening on `channel` to reload.
    ForceRefresh { channel: String },
    /// The subscriber fell behind and `missed` events were dropped.
    Resync { missed: u64 },
}

impl RealtimeEvent {
    pub fn order(change: ChangeKind, order: Order) -> Self {
        Self::OrderChanged { change, order }
    }

    pub fn order_item(change: ChangeKind, order_code: OrderCode, item: OrderItem) -> Self {
        Self::OrderItemChanged { change, order_code, item }
    }

    pub fn table(change: ChangeKind, table: Table) -> Self {
        Self::TableChanged { change, table }
    }

    pub fn menu(change: ChangeKind, menu: Menu) -> Self {
        Self::MenuChanged { change, menu }
    }

    pub fn force_refresh<S: Into<String>>(channel: S) -> Self {
        Self::ForceRefresh { channel: channel.into() }
    }

    /// The SSE event name.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::OrderChanged { .. } => "order_changed",
            Self::OrderItemChanged { .. } => "order_item_changed",
            Self::TableChanged { .. } => "table_changed",
            Self::MenuChanged { .. } => "menu_changed",
            Self::ForceRefresh { .. } => "force_refresh",
            Self::Resync { .. } => "resync",
        }
    }

    /// The topic the event is published on. `None` for events that go to everyone.
    pub fn topic(&self) -> Option<&str> {
        match self {
            Self::OrderChanged { .. } => Some(ORDERS_TOPIC),
            Self::OrderItemChanged { .. } => Some(ORDER_ITEMS_TOPIC),
            Self::TableChanged { .. } => Some(TABLES_TOPIC),
            Self::MenuChanged { .. } => Some(MENUS_TOPIC),
            Self::ForceRefresh { channel } => Some(channel.as_str()),
            Self::Resync { .. } => None,
        }
    }
}

/// The set of topics a realtime client asked for. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicFilter {
    topics: HashSet<String>,
}

impl TopicFilter {
    pub fn all() -> Self {
        Self::default()
    }

    /// Parses a comma separated list such as `orders,orders_menus`.
    pub fn parse(topics: &str) -> Self {
        let topics = topics.split(',').map(str::trim).filter(|t| !t.is_empty()).map(String::from).collect();
        Self { topics }
    }

    pub fn matches(&self, event: &RealtimeEvent) -> bool {
        match event.topic() {
            None => true,
            Some(_) if self.topics.is_empty() => true,
            Some(topic) => self.topics.contains(topic),
        }
    }
}
