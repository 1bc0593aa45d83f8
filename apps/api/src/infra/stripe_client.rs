use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_gateway::{
        CheckoutSession, GatewayCustomer, GatewayPrice, PortalSession,
    },
};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Thin typed wrapper over the Stripe REST API.
///
/// Constructed once at startup and shared; every request carries the
/// configured timeout.
pub struct StripeClient {
    client: Client,
    secret_key: SecretString,
    base_url: String,
}

impl StripeClient {
    pub fn new(secret_key: SecretString, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            secret_key,
            base_url: STRIPE_API_BASE.to_string(),
        })
    }

    fn auth_header(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:", self.secret_key.expose_secret()));
        format!("Basic {}", encoded)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    // ========================================================================
    // Prices
    // ========================================================================

    pub async fn retrieve_price(&self, price_id: &str) -> AppResult<GatewayPrice> {
        let response = self
            .client
            .get(self.url(&format!("prices/{}", price_id)))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(request_failed)?;

        self.handle_response(response).await
    }

    // ========================================================================
    // Customers
    // ========================================================================

    pub async fn retrieve_customer(&self, customer_id: &str) -> AppResult<GatewayCustomer> {
        let response = self
            .client
            .get(self.url(&format!("customers/{}", customer_id)))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(request_failed)?;

        self.handle_response(response).await
    }

    pub async fn list_customers_by_email(&self, email: &str) -> AppResult<Vec<GatewayCustomer>> {
        let response = self
            .client
            .get(self.url("customers"))
            .header("Authorization", self.auth_header())
            .query(&[("email", email), ("limit", "1")])
            .send()
            .await
            .map_err(request_failed)?;

        let list: StripeList<GatewayCustomer> = self.handle_response(response).await?;
        Ok(list.data)
    }

    pub async fn create_customer(
        &self,
        email: &str,
        metadata: &BTreeMap<String, String>,
    ) -> AppResult<GatewayCustomer> {
        let mut params: Vec<(String, String)> = vec![("email".to_string(), email.to_string())];
        params.extend(metadata_params("metadata", metadata));

        self.post_form("customers", &params).await
    }

    pub async fn update_customer_metadata(
        &self,
        customer_id: &str,
        metadata: &BTreeMap<String, String>,
    ) -> AppResult<GatewayCustomer> {
        let params = metadata_params("metadata", metadata);
        self.post_form(&format!("customers/{}", customer_id), &params)
            .await
    }

    // ========================================================================
    // Checkout Sessions
    // ========================================================================

    pub async fn create_checkout_session(
        &self,
        params: &[(String, String)],
    ) -> AppResult<CheckoutSession> {
        self.post_form("checkout/sessions", params).await
    }

    // ========================================================================
    // Customer Portal
    // ========================================================================

    pub async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> AppResult<PortalSession> {
        let params = vec![
            ("customer".to_string(), customer_id.to_string()),
            ("return_url".to_string(), return_url.to_string()),
        ];
        self.post_form("billing_portal/sessions", &params).await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> AppResult<T> {
        let response = self
            .client
            .post(self.url(path))
            .header("Authorization", self.auth_header())
            .form(params)
            .send()
            .await
            .map_err(request_failed)?;

        self.handle_response(response).await
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Gateway(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Stripe API error");
            let message = serde_json::from_str::<StripeErrorResponse>(&body)
                .ok()
                .map(|e| e.error.message.unwrap_or(e.error.error_type));
            return Err(map_error_status(status, message));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "Failed to parse Stripe response");
            AppError::Gateway(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

fn request_failed(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Gateway("Stripe request timed out".into())
    } else {
        AppError::Gateway(format!("Stripe request failed: {}", e))
    }
}

/// Map a non-success Stripe status onto the error taxonomy.
///
/// Only malformed or declined requests are terminal. Authentication,
/// permission and lock errors depend on our credentials or on timing, so they
/// stay retryable along with rate limits and server errors.
pub(crate) fn map_error_status(status: StatusCode, message: Option<String>) -> AppError {
    let message = message.unwrap_or_else(|| status.to_string());
    match status {
        StatusCode::NOT_FOUND => AppError::NotFound,
        StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited,
        StatusCode::BAD_REQUEST | StatusCode::PAYMENT_REQUIRED => {
            AppError::InvalidInput(format!("Stripe error: {}", message))
        }
        _ => AppError::Gateway(format!("Stripe API error: {} - {}", status, message)),
    }
}

/// Encode a map as Stripe form fields: `prefix[key]=value`.
pub(crate) fn metadata_params(
    prefix: &str,
    metadata: &BTreeMap<String, String>,
) -> Vec<(String, String)> {
    metadata
        .iter()
        .map(|(key, value)| (format!("{}[{}]", prefix, key), value.clone()))
        .collect()
}

// ============================================================================
// Stripe Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct StripeList<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    #[serde(rename = "type")]
    error_type: String,
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_params_are_bracketed() {
        let mut meta = BTreeMap::new();
        meta.insert("firebase_uid".to_string(), "u1".to_string());
        meta.insert("team_id".to_string(), "t1".to_string());

        let params = metadata_params("metadata", &meta);
        assert_eq!(
            params,
            vec![
                ("metadata[firebase_uid]".to_string(), "u1".to_string()),
                ("metadata[team_id]".to_string(), "t1".to_string()),
            ]
        );
    }

    #[test]
    fn test_error_status_mapping() {
        assert!(matches!(
            map_error_status(StatusCode::NOT_FOUND, None),
            AppError::NotFound
        ));
        assert!(matches!(
            map_error_status(StatusCode::TOO_MANY_REQUESTS, None),
            AppError::RateLimited
        ));
        assert!(matches!(
            map_error_status(StatusCode::BAD_REQUEST, Some("No such price".into())),
            AppError::InvalidInput(msg) if msg.contains("No such price")
        ));
        assert!(matches!(
            map_error_status(StatusCode::BAD_GATEWAY, None),
            AppError::Gateway(_)
        ));
    }

    #[test]
    fn test_credential_and_lock_errors_are_retryable() {
        use crate::use_cases::webhook::is_retryable_error;

        for status in [
            StatusCode::UNAUTHORIZED,
            StatusCode::FORBIDDEN,
            StatusCode::CONFLICT,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            let err = map_error_status(status, Some("Invalid API Key provided".into()));
            assert!(matches!(err, AppError::Gateway(_)), "{status} -> {err:?}");
            assert!(is_retryable_error(&err), "{status} should be retried");
        }
        assert!(!is_retryable_error(&map_error_status(
            StatusCode::PAYMENT_REQUIRED,
            Some("Your card was declined".into())
        )));
    }

    #[test]
    fn test_auth_header_is_basic() {
        let client = StripeClient::new(
            SecretString::new("sk_test_123".into()),
            Duration::from_secs(5),
        )
        .unwrap();
        // base64("sk_test_123:")
        assert_eq!(client.auth_header(), "Basic c2tfdGVzdF8xMjM6");
    }
}
