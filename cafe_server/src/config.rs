//! Server configuration, read from `CAFE_*` environment variables.
//!
//! Missing or malformed values never stop the server from starting: a warning is logged and a default is used
//! instead. Run the binary with any argument to see the current (non-secret) configuration.
use std::env;

use cafe_common::{helpers::parse_boolean_flag, Secret};
use cafe_engine::DEFAULT_DATABASE_URL;
use chrono::Duration;
use log::*;
use midtrans_tools::MidtransConfig;
use rand::{distributions::Alphanumeric, thread_rng, Rng};

const DEFAULT_CAFE_HOST: &str = "127.0.0.1";
const DEFAULT_CAFE_PORT: u16 = 8380;
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::hours(24);
const DEFAULT_RESERVATION_TIMEOUT: Duration = Duration::hours(4);
const RANDOM_SECRET_LEN: usize = 64;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Credentials for the admin account created on first start.
    pub bootstrap_admin: Option<AdminCredentials>,
    /// Reservations untouched for this long are cancelled. `None` switches the expiry worker off.
    pub reservation_timeout: Option<Duration>,
    pub midtrans: MidtransConfig,
    /// If false, payment notifications are accepted without checking their signature. **DANGER**
    pub verify_payment_signature: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CAFE_HOST.to_string(),
            port: DEFAULT_CAFE_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            bootstrap_admin: None,
            reservation_timeout: Some(DEFAULT_RESERVATION_TIMEOUT),
            midtrans: MidtransConfig::default(),
            verify_payment_signature: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AdminCredentials {
    pub email: String,
    pub password: Secret<String>,
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CAFE_HOST").ok().unwrap_or_else(|| DEFAULT_CAFE_HOST.into());
        let port = env::var("CAFE_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CAFE_PORT. {e} Using the default, {DEFAULT_CAFE_PORT}, instead."
                    );
                    DEFAULT_CAFE_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CAFE_PORT);
        let database_url = env::var("CAFE_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ CAFE_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::from_env_or_default();
        let bootstrap_admin = configure_bootstrap_admin();
        let reservation_timeout = configure_reservation_timeout();
        let midtrans = MidtransConfig::new_from_env_or_default();
        let verify_payment_signature = parse_boolean_flag(env::var("CAFE_MIDTRANS_VERIFY_SIGNATURE").ok(), true);
        if !verify_payment_signature {
            warn!(
                "🚨️ Payment notification signatures are NOT checked. Anyone can mark orders as paid. Never run \
                 production like this."
            );
        }
        Self {
            host,
            port,
            database_url,
            auth,
            bootstrap_admin,
            reservation_timeout,
            midtrans,
            verify_payment_signature,
        }
    }
}

fn configure_bootstrap_admin() -> Option<AdminCredentials> {
    match (env::var("CAFE_ADMIN_EMAIL"), env::var("CAFE_ADMIN_PASSWORD")) {
        (Ok(email), Ok(password)) => Some(AdminCredentials { email, password: Secret::new(password) }),
        (Ok(_), Err(_)) => {
            warn!("🪛️ CAFE_ADMIN_EMAIL is set, but CAFE_ADMIN_PASSWORD is not. No bootstrap admin will be created.");
            None
        },
        _ => {
            info!("🪛️ No bootstrap admin is configured.");
            None
        },
    }
}

fn configure_reservation_timeout() -> Option<Duration> {
    let timeout = env::var("CAFE_RESERVATION_TIMEOUT")
        .map_err(|_| {
            info!(
                "🪛️ CAFE_RESERVATION_TIMEOUT is not set. Using the default value of {} hrs.",
                DEFAULT_RESERVATION_TIMEOUT.num_hours()
            )
        })
        .and_then(|s| {
            s.trim()
                .parse::<i64>()
                .map(Duration::hours)
                .map_err(|e| warn!("🪛️ Invalid configuration value for CAFE_RESERVATION_TIMEOUT. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_RESERVATION_TIMEOUT);
    if timeout <= Duration::zero() {
        info!("🪛️ Stale reservations will not be cancelled automatically.");
        None
    } else {
        Some(timeout)
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HMAC secret used to sign session tokens.
    pub jwt_secret: Secret<String>,
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT signing secret has not been set. I'm using a random value for this session. Every session \
             token becomes invalid when the server restarts. Set CAFE_JWT_SECRET to avoid this. 🚨️🚨️🚨️"
        );
        Self { jwt_secret: Secret::new(random_secret()), token_lifetime: DEFAULT_TOKEN_LIFETIME }
    }
}

impl AuthConfig {
    pub fn new(secret: &str, token_lifetime: Duration) -> Self {
        Self { jwt_secret: Secret::new(secret.to_string()), token_lifetime }
    }

    pub fn from_env_or_default() -> Self {
        let token_lifetime = env::var("CAFE_JWT_EXPIRY_HOURS")
            .ok()
            .and_then(|s| {
                s.trim()
                    .parse::<i64>()
                    .ok()
                    .filter(|h| *h > 0)
                    .or_else(|| {
                        warn!("🪛️ Invalid CAFE_JWT_EXPIRY_HOURS value '{s}'. Using the default.");
                        None
                    })
                    .map(Duration::hours)
            })
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);
        match env::var("CAFE_JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => Self::new(&secret, token_lifetime),
            _ => Self { token_lifetime, ..Self::default() },
        }
    }
}

fn random_secret() -> String {
    thread_rng().sample_iter(&Alphanumeric).take(RANDOM_SECRET_LEN).map(char::from).collect()
}
