use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::payment_status::PaymentStatus;

/// One payment attempt, keyed by gateway invoice id.
///
/// Exactly one of `paid_at` / `failed_at` is set, matching `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub invoice_id: String,
    pub amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn succeeded(
        invoice_id: impl Into<String>,
        amount: i64,
        currency: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            invoice_id: invoice_id.into(),
            amount,
            currency,
            status: PaymentStatus::Succeeded,
            paid_at: Some(at),
            failed_at: None,
        }
    }

    pub fn failed(
        invoice_id: impl Into<String>,
        amount: i64,
        currency: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            invoice_id: invoice_id.into(),
            amount,
            currency,
            status: PaymentStatus::Failed,
            paid_at: None,
            failed_at: Some(at),
        }
    }
}
