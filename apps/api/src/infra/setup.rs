use std::fs::File;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{
        http::app_state::AppState,
        persistence::{InMemoryDocumentStore, PostgresDocumentStore},
    },
    application::ports::{document_store::DocumentStore, payment_gateway::PaymentGateway},
    infra::{
        config::AppConfig, db::init_db, error::InfraError, stripe_client::StripeClient,
        stripe_payment_adapter::StripePaymentAdapter,
    },
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();
    init_tracing(config.log_file.as_deref())?;

    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(database_url) => {
            let pool = init_db(database_url).await?;
            let store = PostgresDocumentStore::new(pool);
            store.ensure_schema().await.map_err(InfraError::Schema)?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory document store");
            Arc::new(InMemoryDocumentStore::new())
        }
    };

    // One client for the whole process; every request shares its connection pool.
    let client = StripeClient::new(
        SecretString::new(config.stripe_secret_key.expose_secret().into()),
        config.gateway_timeout,
    )
        .map_err(InfraError::GatewayClient)?;
    let gateway: Arc<dyn PaymentGateway> = Arc::new(StripePaymentAdapter::new(client));

    Ok(AppState::new(Arc::new(config), store, gateway))
}

pub fn init_tracing(log_file: Option<&str>) -> Result<(), InfraError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "billing_sync_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don’t show target (module path)
        .with_level(true) // show log level
        .pretty(); // human-friendly, with colors

    // File (structured JSON logs)
    let json_layer = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|source| InfraError::LogFile {
                path: path.to_string(),
                source,
            })?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(file)
                    .with_current_span(true)
                    .with_span_list(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();

    Ok(())
}
