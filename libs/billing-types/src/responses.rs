use serde::{Deserialize, Serialize};

use crate::subscription::Subscription;

/// Effective entitlement of a user.
///
/// `subscription` is returned even when it is not valid so callers can tell
/// "expired" apart from "never subscribed".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResolution {
    pub has_valid_subscription: bool,
    pub subscription: Option<Subscription>,
}

impl SubscriptionResolution {
    pub fn none() -> Self {
        Self {
            has_valid_subscription: false,
            subscription: None,
        }
    }

    pub fn from_subscription(subscription: Subscription) -> Self {
        Self {
            has_valid_subscription: subscription.is_valid(),
            subscription: Some(subscription),
        }
    }
}

/// Seat usage of a team, derived from the subscription quantity and members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatSummary {
    pub quantity: u32,
    pub assigned: u32,
    pub available: u32,
}

impl SeatSummary {
    pub fn new(quantity: u32, assigned: u32) -> Self {
        Self {
            quantity,
            assigned,
            available: quantity.saturating_sub(assigned),
        }
    }
}
