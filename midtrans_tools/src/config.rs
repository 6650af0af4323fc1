use cafe_common::{helpers::parse_boolean_flag, Secret};
use log::*;

const SANDBOX_SNAP_URL: &str = "https://app.sandbox.midtrans.com";
const PRODUCTION_SNAP_URL: &str = "https://app.midtrans.com";
const SANDBOX_API_URL: &str = "https://api.sandbox.midtrans.com";
const PRODUCTION_API_URL: &str = "https://api.midtrans.com";

#[derive(Debug, Clone, Default)]
pub struct MidtransConfig {
    pub server_key: Secret<String>,
    /// The public key the browser widget is opened with.
    pub client_key: String,
    pub is_production: bool,
}

impl MidtransConfig {
    pub fn new(server_key: &str, client_key: &str, is_production: bool) -> Self {
        Self { server_key: Secret::new(server_key.to_string()), client_key: client_key.to_string(), is_production }
    }

    pub fn new_from_env_or_default() -> Self {
        let server_key = Secret::new(std::env::var("CAFE_MIDTRANS_SERVER_KEY").unwrap_or_else(|_| {
            warn!("💳️ CAFE_MIDTRANS_SERVER_KEY not set. Payments will be rejected by Midtrans.");
            String::default()
        }));
        let client_key = std::env::var("CAFE_MIDTRANS_CLIENT_KEY").unwrap_or_else(|_| {
            warn!("💳️ CAFE_MIDTRANS_CLIENT_KEY not set. The payment widget will not open.");
            String::default()
        });
        let is_production = parse_boolean_flag(std::env::var("CAFE_MIDTRANS_PRODUCTION").ok(), false);
        if is_production {
            info!("💳️ Using the Midtrans PRODUCTION environment");
        }
        Self { server_key, client_key, is_production }
    }

    pub fn snap_url(&self) -> &'static str {
        if self.is_production {
            PRODUCTION_SNAP_URL
        } else {
            SANDBOX_SNAP_URL
        }
    }

    pub fn api_url(&self) -> &'static str {
        if self.is_production {
            PRODUCTION_API_URL
        } else {
            SANDBOX_API_URL
        }
    }

    /// Where the browser loads the Snap payment widget from.
    pub fn snap_js_url(&self) -> String {
        format!("{}/snap/snap.js", self.snap_url())
    }
}
