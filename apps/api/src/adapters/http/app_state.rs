use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use crate::{
    application::ports::{document_store::DocumentStore, payment_gateway::PaymentGateway},
    infra::config::AppConfig,
    use_cases::{
        checkout::{CheckoutSettings, CheckoutUseCases},
        projection::ProjectionUseCases,
        seats::SeatUseCases,
        subscription_resolver::SubscriptionResolverUseCases,
        teams::TeamUseCases,
        webhook::WebhookUseCases,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub webhook_use_cases: Arc<WebhookUseCases>,
    pub checkout_use_cases: Arc<CheckoutUseCases>,
    pub resolver_use_cases: Arc<SubscriptionResolverUseCases>,
    pub team_use_cases: Arc<TeamUseCases>,
    pub seat_use_cases: Arc<SeatUseCases>,
}

impl AppState {
    /// Wire every use case onto one store and one gateway client.
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn DocumentStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let teams = TeamUseCases::new(store.clone());

        let webhook_use_cases = WebhookUseCases::new(
            gateway.clone(),
            ProjectionUseCases::new(store.clone()),
            SecretString::new(config.stripe_webhook_secret.expose_secret().into()),
            config.webhook_tolerance_secs,
        );

        let checkout_use_cases = CheckoutUseCases::new(
            gateway,
            store.clone(),
            teams.clone(),
            CheckoutSettings {
                trials_enabled: config.trials_enabled,
                app_origin: config.app_origin_base(),
            },
        );

        Self {
            webhook_use_cases: Arc::new(webhook_use_cases),
            checkout_use_cases: Arc::new(checkout_use_cases),
            resolver_use_cases: Arc::new(SubscriptionResolverUseCases::new(store.clone())),
            seat_use_cases: Arc::new(SeatUseCases::new(store, teams.clone())),
            team_use_cases: Arc::new(teams),
            config,
        }
    }
}
