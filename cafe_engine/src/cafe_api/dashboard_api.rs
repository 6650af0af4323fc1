use std::{collections::BTreeMap, fmt::Debug};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::Rupiah,
    pricing::{growth_rate, OrderSummary},
    traits::{OrderFlowError, OrderManagement},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueSummary {
    pub period_days: i64,
    pub current: Rupiah,
    pub previous: Rupiah,
    pub growth_rate: String,
}

/// Buckets timestamps into one entry per UTC day for the `days` days ending on `today`, oldest first. Days with no
/// orders are included with a zero count.
pub fn daily_counts(timestamps: &[DateTime<Utc>], today: NaiveDate, days: i64) -> Vec<DailyCount> {
    let days = days.max(1);
    let first = today - Duration::days(days - 1);
    let mut buckets = (0..days).map(|i| (first + Duration::days(i), 0i64)).collect::<BTreeMap<_, _>>();
    for ts in timestamps {
        if let Some(count) = buckets.get_mut(&ts.date_naive()) {
            *count += 1;
        }
    }
    buckets.into_iter().map(|(date, count)| DailyCount { date, count }).collect()
}

/// Revenue is what customers actually paid: the grand total of each settled order, tax and service included.
pub fn revenue<I: IntoIterator<Item = Rupiah>>(subtotals: I) -> Rupiah {
    subtotals.into_iter().map(|s| OrderSummary::from_subtotal(s).grand_total).sum()
}

/// Figures for the admin dashboard.
pub struct DashboardApi<B> {
    db: B,
}

impl<B> Debug for DashboardApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DashboardApi")
    }
}

impl<B> DashboardApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> DashboardApi<B>
where B: OrderManagement
{
    pub async fn orders_per_day(&self, days: i64) -> Result<Vec<DailyCount>, OrderFlowError> {
        let days = days.max(1);
        let today = Utc::now().date_naive();
        let first = today - Duration::days(days - 1);
        let since = first.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()).unwrap_or_else(Utc::now);
        let timestamps = self.db.order_timestamps_since(since).await?;
        Ok(daily_counts(&timestamps, today, days))
    }

    /// Revenue over the last `period_days` days compared with the period of the same length before it.
    pub async fn revenue_summary(&self, period_days: i64) -> Result<RevenueSummary, OrderFlowError> {
        let period_days = period_days.max(1);
        let now = Utc::now();
        let period = Duration::days(period_days);
        let current = revenue(self.db.settled_order_subtotals(now - period, now + Duration::seconds(1)).await?);
        let previous = revenue(self.db.settled_order_subtotals(now - period - period, now - period).await?);
        Ok(RevenueSummary { period_days, current, previous, growth_rate: growth_rate(current, previous) })
    }
}
