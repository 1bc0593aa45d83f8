//! Projection of gateway objects into subscription and payment documents.

use std::sync::Arc;

use billing_types::{Subject, Subscription};
use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{
        document_store::{DocumentStore, Precondition, paths},
        payment_gateway::{GatewayInvoice, GatewaySubscription, timestamp},
    },
    domain::entities::{payment::Payment, payment_status::PaymentStatus},
};

/// Result of projecting a subscription event.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionProjection {
    Written(Subscription),
    /// A newer event has already been projected for this subject.
    SkippedStale {
        stored_event_created: DateTime<Utc>,
    },
}

/// Map a gateway subscription to the record stored for `subject`.
pub fn subscription_record(
    sub: &GatewaySubscription,
    subject: &Subject,
    event_created: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> AppResult<Subscription> {
    let item = sub.first_item().ok_or_else(|| {
        AppError::InvalidInput(format!("Subscription {} has no items", sub.id))
    })?;

    let quantity = match subject {
        Subject::Team { .. } => Some(item.quantity.unwrap_or(0)),
        Subject::Individual { .. } => None,
    };

    let trial_end = if sub.status.is_trialing() {
        sub.trial_end.map(timestamp).transpose()?
    } else {
        None
    };

    Ok(Subscription {
        gateway_subscription_id: sub.id.clone(),
        gateway_customer_id: sub.customer.clone(),
        status: sub.status.clone(),
        current_period_start: timestamp(sub.start_date.unwrap_or(sub.created))?,
        cancel_at: sub.cancel_at.map(timestamp).transpose()?,
        cancel_at_period_end: sub.cancel_at_period_end,
        price_id: item.price.id.clone(),
        quantity,
        trial_end,
        updated_at: now,
        last_event_created: event_created,
    })
}

/// Map a gateway invoice to a payment record. The amount is `amount_paid`
/// for successes and `amount_due` for failures.
pub fn payment_record(invoice: &GatewayInvoice, status: PaymentStatus, at: DateTime<Utc>) -> Payment {
    match status {
        PaymentStatus::Succeeded => Payment::succeeded(
            invoice.id.clone(),
            invoice.amount_paid,
            invoice.currency.clone(),
            at,
        ),
        PaymentStatus::Failed => Payment::failed(
            invoice.id.clone(),
            invoice.amount_due,
            invoice.currency.clone(),
            at,
        ),
    }
}

fn stored_event_created(data: &serde_json::Value) -> Option<DateTime<Utc>> {
    data.get("lastEventCreated")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct ProjectionUseCases {
    store: Arc<dyn DocumentStore>,
}

impl ProjectionUseCases {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Write the full subscription record for `subject`.
    ///
    /// Events older than the one that produced the stored record are skipped.
    /// The write is conditional on the revision that was read, so a
    /// concurrent projection surfaces as `AppError::Conflict`.
    #[instrument(skip(self, sub, subject), fields(subscription_id = %sub.id, subject = %subject))]
    pub async fn project_subscription(
        &self,
        sub: &GatewaySubscription,
        subject: &Subject,
        event_created: DateTime<Utc>,
    ) -> AppResult<SubscriptionProjection> {
        let path = paths::subscription(subject);
        let current = self.store.get(&path).await?;

        if let Some(stored) = current.as_ref().and_then(|d| stored_event_created(&d.data)) {
            if stored > event_created {
                tracing::info!(
                    stored_event_created = %stored,
                    event_created = %event_created,
                    "Skipping stale subscription event"
                );
                return Ok(SubscriptionProjection::SkippedStale {
                    stored_event_created: stored,
                });
            }
        }

        let record = subscription_record(sub, subject, Some(event_created), Utc::now())?;
        self.store
            .set_if(
                &path,
                serde_json::to_value(&record)?,
                Precondition::from_read(current.as_ref()),
            )
            .await?;

        tracing::info!(status = %record.status, "Projected subscription");
        Ok(SubscriptionProjection::Written(record))
    }

    /// Upsert the payment document keyed by invoice id.
    #[instrument(skip(self, invoice, subject), fields(invoice_id = %invoice.id, subject = %subject))]
    pub async fn project_payment(
        &self,
        invoice: &GatewayInvoice,
        subject: &Subject,
        status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Payment> {
        let payment = payment_record(invoice, status, at);
        self.store
            .set_as(&paths::payment(subject, &invoice.id), &payment)
            .await?;

        tracing::info!(status = %status, amount = payment.amount, "Projected payment");
        Ok(payment)
    }
}
