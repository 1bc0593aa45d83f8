use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{
    app_error::AppResult,
    application::ports::payment_gateway::{
        CheckoutSession, CheckoutSessionRequest, GatewayCustomer, GatewayPrice, PaymentGateway,
        PaymentMethodCollection, PortalSession,
    },
    infra::stripe_client::{StripeClient, metadata_params},
};

/// Adapter that wraps StripeClient to implement PaymentGateway.
pub struct StripePaymentAdapter {
    client: StripeClient,
}

impl StripePaymentAdapter {
    pub fn new(client: StripeClient) -> Self {
        Self { client }
    }
}

/// Encode a checkout request as Stripe form parameters.
fn checkout_params(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = vec![
        ("customer".to_string(), request.customer_id.clone()),
        ("mode".to_string(), "subscription".to_string()),
        ("line_items[0][price]".to_string(), request.price_id.clone()),
        (
            "line_items[0][quantity]".to_string(),
            request.quantity.to_string(),
        ),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        (
            "client_reference_id".to_string(),
            request.client_reference_id.clone(),
        ),
        (
            "payment_method_collection".to_string(),
            request.payment_method_collection.as_str().to_string(),
        ),
    ];

    if let Some(trial) = &request.trial {
        params.push((
            "subscription_data[trial_period_days]".to_string(),
            trial.days.to_string(),
        ));
        if trial.cancel_if_missing_payment_method
            && request.payment_method_collection == PaymentMethodCollection::IfRequired
        {
            params.push((
                "subscription_data[trial_settings][end_behavior][missing_payment_method]"
                    .to_string(),
                "cancel".to_string(),
            ));
        }
    }

    params.extend(metadata_params("metadata", &request.metadata));
    params.extend(metadata_params(
        "subscription_data[metadata]",
        &request.metadata,
    ));
    params
}

#[async_trait]
impl PaymentGateway for StripePaymentAdapter {
    async fn retrieve_price(&self, price_id: &str) -> AppResult<GatewayPrice> {
        self.client.retrieve_price(price_id).await
    }

    async fn retrieve_customer(&self, customer_id: &str) -> AppResult<GatewayCustomer> {
        self.client.retrieve_customer(customer_id).await
    }

    async fn find_customer_by_email(&self, email: &str) -> AppResult<Option<GatewayCustomer>> {
        let customers = self.client.list_customers_by_email(email).await?;
        Ok(customers.into_iter().find(|c| !c.deleted))
    }

    async fn create_customer(
        &self,
        email: &str,
        metadata: &BTreeMap<String, String>,
    ) -> AppResult<GatewayCustomer> {
        self.client.create_customer(email, metadata).await
    }

    async fn update_customer_metadata(
        &self,
        customer_id: &str,
        metadata: &BTreeMap<String, String>,
    ) -> AppResult<GatewayCustomer> {
        self.client
            .update_customer_metadata(customer_id, metadata)
            .await
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> AppResult<CheckoutSession> {
        self.client
            .create_checkout_session(&checkout_params(request))
            .await
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> AppResult<PortalSession> {
        self.client
            .create_portal_session(customer_id, return_url)
            .await
    }
}
