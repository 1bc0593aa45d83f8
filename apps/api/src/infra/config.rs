use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

pub struct AppConfig {
    pub stripe_secret_key: SecretString,
    pub stripe_webhook_secret: SecretString,
    /// Global trial switch. When false, checkouts never start a trial.
    pub trials_enabled: bool,
    /// Origin of the web app; default checkout and portal URLs are built from it.
    pub app_origin: Url,
    pub cors_origin: HeaderValue,
    pub bind_addr: SocketAddr,
    /// Postgres document store. `None` runs on the in-memory store.
    pub database_url: Option<String>,
    /// Maximum age of a webhook signature timestamp.
    pub webhook_tolerance_secs: i64,
    /// Deadline applied to every gateway request.
    pub gateway_timeout: Duration,
    /// Optional JSON log file, in addition to console output.
    pub log_file: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let stripe_secret_key: SecretString =
            SecretString::new(get_env::<String>("STRIPE_SECRET_KEY").into());
        let stripe_webhook_secret: SecretString =
            SecretString::new(get_env::<String>("STRIPE_WEBHOOK_SECRET").into());

        let trials_enabled: bool = get_env_default("TRIALS_ENABLED", true);
        let app_origin: Url = get_env("APP_ORIGIN");
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");

        let bind_addr: SocketAddr = get_env_default(
            "BIND_ADDR",
            SocketAddr::from(([127, 0, 0, 1], 3001)),
        );
        let database_url: Option<String> = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let webhook_tolerance_secs: i64 = get_env_default("WEBHOOK_TOLERANCE_SECS", 300);
        let gateway_timeout_secs: u64 = get_env_default("GATEWAY_TIMEOUT_SECS", 20);
        let log_file: Option<String> = std::env::var("LOG_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty());

        Self {
            stripe_secret_key,
            stripe_webhook_secret,
            trials_enabled,
            app_origin,
            cors_origin,
            bind_addr,
            database_url,
            webhook_tolerance_secs,
            gateway_timeout: Duration::from_secs(gateway_timeout_secs),
            log_file,
        }
    }

    /// `app_origin` without a trailing slash, for joining paths.
    pub fn app_origin_base(&self) -> String {
        self.app_origin.as_str().trim_end_matches('/').to_string()
    }
}
