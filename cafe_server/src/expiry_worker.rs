use cafe_engine::{db_types::Order, OrderFlowApi, SqliteDatabase};
use chrono::Duration;
use log::*;
use tokio::task::JoinHandle;

/// Starts the stale reservation worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Once a minute, reservations that have not been touched for `timeout` are cancelled and their tables released.
pub fn start_expiry_worker(api: OrderFlowApi<SqliteDatabase>, timeout: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(60));
        info!("🕰️ Stale reservation worker started. Reservations expire after {} minutes", timeout.num_minutes());
        loop {
            timer.tick().await;
            trace!("🕰️ Running stale reservation job");
            match api.expire_stale_reservations(timeout).await {
                Ok(result) if result.is_empty() => trace!("🕰️ No stale reservations"),
                Ok(result) => {
                    info!("🕰️ {} reservations expired", result.orders.len());
                    debug!("🕰️ Expired reservations: {}", order_list(&result.orders));
                },
                Err(e) => {
                    error!("🕰️ Error running stale reservation job: {e}");
                },
            }
        }
    })
}

fn order_list(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format!("[{}] {} ({})", o.id, o.order_id, o.customer_name))
        .collect::<Vec<String>>()
        .join(", ")
}
