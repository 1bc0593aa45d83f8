use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subscription status as reported by the payment gateway.
///
/// Statuses the gateway may add later are kept verbatim in `Other` so a
/// projected record never loses information. Only `Active` and `Trialing`
/// count as valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionStatus {
    Incomplete,
    IncompleteExpired,
    Trialing,
    Active,
    PastDue,
    Canceled,
    Unpaid,
    Paused,
    Other(String),
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Incomplete => "incomplete",
            Self::IncompleteExpired => "incomplete_expired",
            Self::Trialing => "trialing",
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Unpaid => "unpaid",
            Self::Paused => "paused",
            Self::Other(s) => s,
        }
    }

    /// Returns true if the subscription grants entitlement (active or trialing).
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Active | Self::Trialing)
    }

    pub fn is_trialing(&self) -> bool {
        matches!(self, Self::Trialing)
    }
}

impl From<String> for SubscriptionStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "incomplete" => Self::Incomplete,
            "incomplete_expired" => Self::IncompleteExpired,
            "trialing" => Self::Trialing,
            "active" => Self::Active,
            "past_due" => Self::PastDue,
            "canceled" => Self::Canceled,
            "unpaid" => Self::Unpaid,
            "paused" => Self::Paused,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for SubscriptionStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<SubscriptionStatus> for String {
    fn from(status: SubscriptionStatus) -> Self {
        match status {
            SubscriptionStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The projected subscription of one subject (user or team).
///
/// Stored as a single document at the subject's canonical path and fully
/// replaced on every projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub gateway_subscription_id: String,
    pub gateway_customer_id: String,
    pub status: SubscriptionStatus,
    pub current_period_start: DateTime<Utc>,
    pub cancel_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    pub price_id: String,
    /// Seat count; present for team subscriptions only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    /// Present only while trialing.
    #[serde(default)]
    pub trial_end: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    /// `created` of the gateway event that produced this record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_event_created: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn is_valid(&self) -> bool {
        self.status.is_valid()
    }
}
