//! Gateway webhook event processing.

use std::sync::Arc;

use billing_types::Subject;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use super::projection::{ProjectionUseCases, SubscriptionProjection};
use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_gateway::{
        METADATA_TEAM_ID, METADATA_USER_ID, PaymentGateway, WebhookEvent,
    },
    domain::entities::payment_status::PaymentStatus,
    infra::webhook_signer::verify_webhook_signature,
};

pub const SUBSCRIPTION_CREATED: &str = "customer.subscription.created";
pub const SUBSCRIPTION_UPDATED: &str = "customer.subscription.updated";
pub const SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";
pub const INVOICE_PAYMENT_SUCCEEDED: &str = "invoice.payment_succeeded";
pub const INVOICE_PAYMENT_FAILED: &str = "invoice.payment_failed";

/// Determines if a webhook processing error should trigger a gateway retry.
///
/// Returns `true` for transient failures, which are answered with a 5xx so the
/// gateway redelivers. Returns `false` for conditions a redelivery cannot fix;
/// those are logged and acknowledged.
pub fn is_retryable_error(error: &AppError) -> bool {
    match error {
        // Transient errors - retry may succeed
        AppError::Database(_) => true,
        AppError::Gateway(_) => true,
        AppError::Internal(_) => true,
        AppError::RateLimited => true,
        AppError::Conflict => true,

        // Expected conditions - won't change with retry
        AppError::InvalidSignature(_) => false,
        AppError::Unattributable(_) => false,
        AppError::NotFound => false,
        AppError::InvalidInput(_) => false,
        AppError::ValidationError(_) => false,
        AppError::Forbidden => false,
        AppError::InsufficientSeats { .. } => false,
        AppError::OwnerSeatProtected => false,
    }
}

/// What processing an event did.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    SubscriptionProjected { subject: Subject },
    /// A newer event for the subject was already projected.
    SubscriptionStale { subject: Subject },
    PaymentProjected { subject: Subject, invoice_id: String },
    /// Event type this service does not handle.
    Ignored,
}

pub struct WebhookUseCases {
    gateway: Arc<dyn PaymentGateway>,
    projection: ProjectionUseCases,
    webhook_secret: SecretString,
    tolerance_secs: i64,
}

impl WebhookUseCases {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        projection: ProjectionUseCases,
        webhook_secret: SecretString,
        tolerance_secs: i64,
    ) -> Self {
        Self {
            gateway,
            projection,
            webhook_secret,
            tolerance_secs,
        }
    }

    /// Authenticate the raw payload, then parse it.
    ///
    /// Nothing in the body is interpreted until the signature has been checked.
    pub fn verify_event(&self, body: &[u8], signature: Option<&str>) -> AppResult<WebhookEvent> {
        let signature =
            signature.ok_or_else(|| AppError::InvalidSignature("missing signature header".into()))?;

        verify_webhook_signature(
            body,
            signature,
            self.webhook_secret.expose_secret(),
            self.tolerance_secs,
            Utc::now().timestamp(),
        )?;

        serde_json::from_slice(body)
            .map_err(|e| AppError::InvalidInput(format!("Invalid webhook payload: {}", e)))
    }

    /// Dispatch a verified event to the projectors.
    #[instrument(skip(self, event), fields(event_id = %event.id, event_type = %event.event_type))]
    pub async fn handle_event(&self, event: &WebhookEvent) -> AppResult<WebhookOutcome> {
        match event.event_type.as_str() {
            SUBSCRIPTION_CREATED | SUBSCRIPTION_UPDATED | SUBSCRIPTION_DELETED => {
                let sub = event.subscription()?;
                let subject = self.resolve_subject(&sub.customer).await?;
                let projection = self
                    .projection
                    .project_subscription(&sub, &subject, event.created_at()?)
                    .await?;
                Ok(match projection {
                    SubscriptionProjection::Written(_) => {
                        WebhookOutcome::SubscriptionProjected { subject }
                    }
                    SubscriptionProjection::SkippedStale { .. } => {
                        WebhookOutcome::SubscriptionStale { subject }
                    }
                })
            }
            INVOICE_PAYMENT_SUCCEEDED | INVOICE_PAYMENT_FAILED => {
                let status = if event.event_type == INVOICE_PAYMENT_SUCCEEDED {
                    PaymentStatus::Succeeded
                } else {
                    PaymentStatus::Failed
                };
                let invoice = event.invoice()?;
                let subject = self.resolve_subject(&invoice.customer).await?;
                // The event time, not the wall clock, so redelivery rewrites identical content.
                self.projection
                    .project_payment(&invoice, &subject, status, event.created_at()?)
                    .await?;
                Ok(WebhookOutcome::PaymentProjected {
                    subject,
                    invoice_id: invoice.id,
                })
            }
            other => {
                tracing::info!(event_type = other, "Ignoring unhandled webhook event");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    /// Find the owner of a gateway customer from its metadata.
    ///
    /// `team_id` selects the team; otherwise `firebase_uid` selects the user.
    /// `firebase_uid` is required either way.
    pub async fn resolve_subject(&self, customer_id: &str) -> AppResult<Subject> {
        let customer = match self.gateway.retrieve_customer(customer_id).await {
            Ok(customer) => customer,
            Err(AppError::NotFound) => {
                return Err(AppError::Unattributable(format!(
                    "customer {} not found",
                    customer_id
                )));
            }
            Err(e) => return Err(e),
        };

        if customer.deleted {
            return Err(AppError::Unattributable(format!(
                "customer {} is deleted",
                customer_id
            )));
        }

        let user_id = customer.metadata_value(METADATA_USER_ID).ok_or_else(|| {
            AppError::Unattributable(format!(
                "customer {} has no {} metadata",
                customer_id, METADATA_USER_ID
            ))
        })?;

        Ok(match customer.metadata_value(METADATA_TEAM_ID) {
            Some(team_id) => Subject::team(team_id),
            None => Subject::individual(user_id),
        })
    }
}
