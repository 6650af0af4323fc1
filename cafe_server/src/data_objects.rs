use std::{fmt::Display, str::FromStr};

use cafe_engine::{
    db_types::{OrderItemStatus, OrderStatusType, Profile, TableStatus},
    traits::{MenuQueryFilter, OrderQueryFilter},
};
use midtrans_tools::MidtransConfig;
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

pub const DEFAULT_DASHBOARD_DAYS: i64 = 7;
pub const DEFAULT_REVENUE_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub profile: Profile,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReservationUpdate {
    pub status: OrderStatusType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ItemStatusUpdate {
    pub status: OrderItemStatus,
}

/// Where a table was dropped on the floor plan. Fractional positions are rounded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastRequest {
    pub channel: String,
}

/// Query string of the order list. `status` is a comma separated list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl TryFrom<OrderListParams> for OrderQueryFilter {
    type Error = ServerError;

    fn try_from(params: OrderListParams) -> Result<Self, Self::Error> {
        let statuses = params
            .status
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| OrderStatusType::from_str(s).map_err(|e| ServerError::InvalidRequestPath(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        let search = params.search.filter(|s| !s.trim().is_empty());
        Ok(OrderQueryFilter { search, statuses, page: params.page, limit: params.limit })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuListParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub available: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl From<MenuListParams> for MenuQueryFilter {
    fn from(params: MenuListParams) -> Self {
        MenuQueryFilter {
            search: params.search.filter(|s| !s.trim().is_empty()),
            category: params.category.filter(|s| !s.trim().is_empty()),
            available_only: params.available.unwrap_or(false),
            page: params.page,
            limit: params.limit,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableListParams {
    pub status: Option<TableStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaysParams {
    pub days: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiptParams {
    /// `text` for the printable receipt. Anything else returns JSON.
    pub format: Option<String>,
}

impl ReceiptParams {
    pub fn wants_text(&self) -> bool {
        self.format.as_deref().map(|f| f.eq_ignore_ascii_case("text")).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealtimeParams {
    pub topics: Option<String>,
}

/// What the browser needs to open the Snap payment widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentWidgetConfig {
    pub client_key: String,
    pub snap_js_url: String,
    pub is_production: bool,
}

impl From<&MidtransConfig> for PaymentWidgetConfig {
    fn from(config: &MidtransConfig) -> Self {
        Self {
            client_key: config.client_key.clone(),
            snap_js_url: config.snap_js_url(),
            is_production: config.is_production,
        }
    }
}
