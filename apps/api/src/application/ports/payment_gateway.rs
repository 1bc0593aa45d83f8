use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use billing_types::SubscriptionStatus;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::app_error::{AppError, AppResult};

/// Customer metadata key holding the owning user id. Always required.
pub const METADATA_USER_ID: &str = "firebase_uid";
/// Customer metadata key holding the owning team id, for team purchases.
pub const METADATA_TEAM_ID: &str = "team_id";

// ============================================================================
// Response Shapes
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayCustomer {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Deleted customers come back as `{id, deleted: true}` without metadata.
    #[serde(default)]
    pub deleted: bool,
}

impl GatewayCustomer {
    /// Non-empty metadata value for `key`.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayPrice {
    pub id: String,
    #[serde(default)]
    pub recurring: Option<GatewayPriceRecurring>,
}

impl GatewayPrice {
    /// Trial length configured on the price, 0 when none.
    pub fn trial_days(&self) -> u32 {
        self.recurring
            .as_ref()
            .and_then(|r| r.trial_period_days)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayPriceRecurring {
    pub interval: String,
    #[serde(default)]
    pub trial_period_days: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayPriceRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySubscriptionItem {
    pub price: GatewayPriceRef,
    #[serde(default)]
    pub quantity: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySubscriptionItems {
    pub data: Vec<GatewaySubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySubscription {
    pub id: String,
    pub customer: String,
    pub status: SubscriptionStatus,
    pub created: i64,
    #[serde(default)]
    pub start_date: Option<i64>,
    #[serde(default)]
    pub cancel_at: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    #[serde(default)]
    pub trial_end: Option<i64>,
    pub items: GatewaySubscriptionItems,
}

impl GatewaySubscription {
    pub fn first_item(&self) -> Option<&GatewaySubscriptionItem> {
        self.items.data.first()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayInvoice {
    pub id: String,
    pub customer: String,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortalSession {
    pub id: String,
    pub url: String,
}

// ============================================================================
// Webhook Event
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub created: i64,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

impl WebhookEvent {
    pub fn created_at(&self) -> AppResult<DateTime<Utc>> {
        timestamp(self.created)
    }

    pub fn subscription(&self) -> AppResult<GatewaySubscription> {
        self.object_as("subscription")
    }

    pub fn invoice(&self) -> AppResult<GatewayInvoice> {
        self.object_as("invoice")
    }

    fn object_as<T: for<'de> Deserialize<'de>>(&self, what: &str) -> AppResult<T> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| {
            AppError::InvalidInput(format!("Event {} has a malformed {}: {}", self.id, what, e))
        })
    }
}

/// Convert a Unix timestamp from the gateway.
pub fn timestamp(secs: i64) -> AppResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| AppError::InvalidInput(format!("Timestamp out of range: {}", secs)))
}

// ============================================================================
// Checkout Request
// ============================================================================

/// When the checkout collects a payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethodCollection {
    /// Card is collected up front.
    Always,
    /// Collection is deferred; the subscription may start without one.
    IfRequired,
}

impl PaymentMethodCollection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::IfRequired => "if_required",
        }
    }
}

/// Subscription-level trial settings of a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialSettings {
    pub days: u32,
    /// Cancel the subscription when the trial ends without a payment method.
    pub cancel_if_missing_payment_method: bool,
}

#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    pub customer_id: String,
    pub price_id: String,
    pub quantity: u32,
    pub success_url: String,
    pub cancel_url: String,
    pub client_reference_id: String,
    pub payment_method_collection: PaymentMethodCollection,
    pub trial: Option<TrialSettings>,
    /// Copied to the session and to the resulting subscription.
    pub metadata: BTreeMap<String, String>,
}

// ============================================================================
// Port Trait
// ============================================================================

/// Remote payment gateway.
///
/// Every call carries the client's request deadline; errors are returned
/// unchanged so callers decide between retry and user-visible failure.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn retrieve_price(&self, price_id: &str) -> AppResult<GatewayPrice>;

    async fn retrieve_customer(&self, customer_id: &str) -> AppResult<GatewayCustomer>;

    async fn find_customer_by_email(&self, email: &str) -> AppResult<Option<GatewayCustomer>>;

    async fn create_customer(
        &self,
        email: &str,
        metadata: &BTreeMap<String, String>,
    ) -> AppResult<GatewayCustomer>;

    /// Set the given metadata keys, leaving other keys untouched.
    async fn update_customer_metadata(
        &self,
        customer_id: &str,
        metadata: &BTreeMap<String, String>,
    ) -> AppResult<GatewayCustomer>;

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> AppResult<CheckoutSession>;

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> AppResult<PortalSession>;
}
