//! Test app state builder for HTTP-level integration testing.
//!
//! This module provides `TestAppStateBuilder` which creates an `AppState`
//! over an in-memory document store and a scripted gateway.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use secrecy::SecretString;
use url::Url;

use crate::{
    adapters::{http::app_state::AppState, persistence::InMemoryDocumentStore},
    application::ports::{document_store::DocumentStore, payment_gateway::PaymentGateway},
    infra::config::AppConfig,
    test_utils::{MockGateway, TEST_WEBHOOK_SECRET},
};

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let gateway = Arc::new(MockGateway::new());
/// let builder = TestAppStateBuilder::new().with_gateway(gateway.clone());
/// let store = builder.store();
/// let server = TestServer::new(create_app(builder.build())).unwrap();
/// ```
pub struct TestAppStateBuilder {
    store: Arc<dyn DocumentStore>,
    gateway: Arc<dyn PaymentGateway>,
    trials_enabled: bool,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryDocumentStore::new()),
            gateway: Arc::new(MockGateway::new()),
            trials_enabled: true,
        }
    }

    /// Replace the document store (e.g. with a counting or failing one).
    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn with_trials_enabled(mut self, enabled: bool) -> Self {
        self.trials_enabled = enabled;
        self
    }

    /// The store the built state will use, for seeding and assertions.
    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    /// Build the AppState with all configured mocks.
    pub fn build(self) -> AppState {
        let config = Arc::new(AppConfig {
            stripe_secret_key: SecretString::new("sk_test_unused".into()),
            stripe_webhook_secret: SecretString::new(TEST_WEBHOOK_SECRET.into()),
            trials_enabled: self.trials_enabled,
            app_origin: Url::parse("http://localhost:3000").unwrap(),
            cors_origin: HeaderValue::from_static("http://localhost:3000"),
            bind_addr: "127.0.0.1:3001".parse::<SocketAddr>().unwrap(),
            database_url: None,
            webhook_tolerance_secs: 300,
            gateway_timeout: Duration::from_secs(5),
            log_file: None,
        });

        AppState::new(config, self.store, self.gateway)
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
