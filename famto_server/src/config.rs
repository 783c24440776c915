use std::{env, str::FromStr, time::Duration};

use famto_common::Secret;
use log::*;

const DEFAULT_FAMTO_HOST: &str = "127.0.0.1";
const DEFAULT_FAMTO_PORT: u16 = 8380;
const DEFAULT_ADMIN_ID: &str = "admin";
const DEFAULT_EVENT_BUFFER_SIZE: usize = 1024;
const DEFAULT_OFFER_SWEEP_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_RAZORPAY_BASE_URL: &str = "https://api.razorpay.com/v1";
const DEFAULT_RAZORPAY_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The user id that receives admin notifications (e.g. unclaimed tasks).
    pub admin_id: String,
    /// Capacity of each event channel. Publishers wait when a channel is full.
    pub event_buffer_size: usize,
    /// How often lapsed task offers are swept up and re-offered.
    pub offer_sweep_interval: Duration,
    pub push: PushConfig,
    pub razorpay: RazorpayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_FAMTO_HOST.to_string(),
            port: DEFAULT_FAMTO_PORT,
            database_url: String::default(),
            admin_id: DEFAULT_ADMIN_ID.to_string(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            offer_sweep_interval: DEFAULT_OFFER_SWEEP_INTERVAL,
            push: PushConfig::default(),
            razorpay: RazorpayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("FAMTO_HOST").ok().unwrap_or_else(|| DEFAULT_FAMTO_HOST.into());
        let port = parse_env_or("FAMTO_PORT", DEFAULT_FAMTO_PORT);
        let database_url = env::var("FAMTO_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ FAMTO_DATABASE_URL is not set. Please set it to the URL for the Famto database.");
            String::default()
        });
        let admin_id = env::var("FAMTO_ADMIN_ID").ok().unwrap_or_else(|| {
            warn!("🪛️ FAMTO_ADMIN_ID is not set. Admin notifications will go to '{DEFAULT_ADMIN_ID}'.");
            DEFAULT_ADMIN_ID.into()
        });
        let event_buffer_size = parse_env_or("FAMTO_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE).max(1);
        let sweep_secs = parse_env_or("FAMTO_OFFER_SWEEP_INTERVAL", DEFAULT_OFFER_SWEEP_INTERVAL.as_secs());
        let offer_sweep_interval = Duration::from_secs(sweep_secs.max(1));
        Self {
            host,
            port,
            database_url,
            admin_id,
            event_buffer_size,
            offer_sweep_interval,
            push: PushConfig::from_env_or_default(),
            razorpay: RazorpayConfig::from_env_or_default(),
        }
    }
}

fn parse_env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            info!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}

//-------------------------------------------------  PushConfig  -------------------------------------------------------
#[derive(Clone, Debug, Default)]
pub struct PushConfig {
    /// The push provider's send endpoint. Push notifications are disabled when this is empty.
    pub endpoint: String,
    pub server_key: Secret<String>,
}

impl PushConfig {
    pub fn from_env_or_default() -> Self {
        let endpoint = env::var("FAMTO_PUSH_ENDPOINT").ok().unwrap_or_default();
        let server_key = Secret::new(env::var("FAMTO_PUSH_SERVER_KEY").ok().unwrap_or_default());
        if endpoint.is_empty() {
            warn!("🪛️ FAMTO_PUSH_ENDPOINT is not set. Push notifications will not be sent.");
        } else if server_key.is_blank() {
            warn!("🪛️ FAMTO_PUSH_SERVER_KEY is not set. The push provider will probably refuse our requests.");
        }
        Self { endpoint, server_key }
    }

    pub fn is_enabled(&self) -> bool {
        !self.endpoint.is_empty()
    }
}

//-----------------------------------------------  RazorpayConfig  -----------------------------------------------------
#[derive(Clone, Debug)]
pub struct RazorpayConfig {
    pub base_url: String,
    pub key_id: String,
    pub key_secret: Secret<String>,
    /// Upper bound on a single refund request. The order stays claimed for cancellation until it returns.
    pub timeout: Duration,
}

impl Default for RazorpayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_RAZORPAY_BASE_URL.to_string(),
            key_id: String::default(),
            key_secret: Secret::default(),
            timeout: DEFAULT_RAZORPAY_TIMEOUT,
        }
    }
}

impl RazorpayConfig {
    pub fn from_env_or_default() -> Self {
        let base_url = env::var("FAMTO_RAZORPAY_BASE_URL").ok().unwrap_or_else(|| DEFAULT_RAZORPAY_BASE_URL.into());
        let key_id = env::var("FAMTO_RAZORPAY_KEY_ID").ok().unwrap_or_else(|| {
            error!("🪛️ FAMTO_RAZORPAY_KEY_ID is not set. Online payments cannot be refunded.");
            String::default()
        });
        let key_secret = Secret::new(env::var("FAMTO_RAZORPAY_KEY_SECRET").ok().unwrap_or_default());
        if key_secret.is_blank() {
            error!("🪛️ FAMTO_RAZORPAY_KEY_SECRET is not set. Online payments cannot be refunded.");
        }
        let timeout_secs = parse_env_or("FAMTO_RAZORPAY_TIMEOUT", DEFAULT_RAZORPAY_TIMEOUT.as_secs());
        let timeout = Duration::from_secs(timeout_secs.clamp(1, 60));
        Self { base_url, key_id, key_secret, timeout }
    }

    pub fn is_configured(&self) -> bool {
        !self.key_id.is_empty() && !self.key_secret.is_blank()
    }
}
