//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use std::collections::HashMap;

use billing_types::{Subscription, SubscriptionStatus};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::application::ports::payment_gateway::{
    GatewayCustomer, GatewayInvoice, GatewayPrice, GatewayPriceRecurring, GatewayPriceRef,
    GatewaySubscription, GatewaySubscriptionItem, GatewaySubscriptionItems,
};

/// Signing secret shared by `TestAppStateBuilder` and webhook tests.
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Returns the UTC datetime for a Unix timestamp.
pub fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

/// Create a projected subscription record with sensible defaults.
pub fn create_test_subscription(overrides: impl FnOnce(&mut Subscription)) -> Subscription {
    let mut subscription = Subscription {
        gateway_subscription_id: "sub_test".to_string(),
        gateway_customer_id: "cus_test".to_string(),
        status: SubscriptionStatus::Active,
        current_period_start: ts(1_700_000_000),
        cancel_at: None,
        cancel_at_period_end: false,
        price_id: "price_test".to_string(),
        quantity: None,
        trial_end: None,
        updated_at: ts(1_700_000_000),
        last_event_created: None,
    };
    overrides(&mut subscription);
    subscription
}

/// Create a gateway subscription object with one item.
pub fn create_test_gateway_subscription(
    overrides: impl FnOnce(&mut GatewaySubscription),
) -> GatewaySubscription {
    let mut subscription = GatewaySubscription {
        id: "sub_test".to_string(),
        customer: "cus_test".to_string(),
        status: SubscriptionStatus::Active,
        created: 1_700_000_000,
        start_date: Some(1_700_000_000),
        cancel_at: None,
        cancel_at_period_end: false,
        trial_end: None,
        items: GatewaySubscriptionItems {
            data: vec![GatewaySubscriptionItem {
                price: GatewayPriceRef {
                    id: "price_test".to_string(),
                },
                quantity: Some(1),
            }],
        },
    };
    overrides(&mut subscription);
    subscription
}

/// Create a paid gateway invoice.
pub fn create_test_gateway_invoice(overrides: impl FnOnce(&mut GatewayInvoice)) -> GatewayInvoice {
    let mut invoice = GatewayInvoice {
        id: "in_test".to_string(),
        customer: "cus_test".to_string(),
        amount_paid: 999,
        amount_due: 999,
        currency: Some("usd".to_string()),
        subscription: Some("sub_test".to_string()),
    };
    overrides(&mut invoice);
    invoice
}

/// Create a gateway customer without metadata.
pub fn create_test_customer(overrides: impl FnOnce(&mut GatewayCustomer)) -> GatewayCustomer {
    let mut customer = GatewayCustomer {
        id: "cus_test".to_string(),
        email: Some("customer@example.com".to_string()),
        metadata: HashMap::new(),
        deleted: false,
    };
    overrides(&mut customer);
    customer
}

/// Create a monthly recurring price without a trial.
pub fn create_test_price(overrides: impl FnOnce(&mut GatewayPrice)) -> GatewayPrice {
    let mut price = GatewayPrice {
        id: "price_test".to_string(),
        recurring: Some(GatewayPriceRecurring {
            interval: "month".to_string(),
            trial_period_days: None,
        }),
    };
    overrides(&mut price);
    price
}

fn event(id: &str, event_type: &str, created: i64, object: Value) -> Value {
    json!({
        "id": id,
        "object": "event",
        "type": event_type,
        "created": created,
        "data": { "object": object }
    })
}

/// Raw `customer.subscription.*` event payload as the gateway sends it.
pub fn subscription_event(
    id: &str,
    event_type: &str,
    created: i64,
    customer: &str,
    overrides: impl FnOnce(&mut Value),
) -> Value {
    let mut object = json!({
        "id": "sub_test",
        "object": "subscription",
        "customer": customer,
        "status": "active",
        "created": 1_699_000_000,
        "start_date": 1_699_000_000,
        "cancel_at": null,
        "cancel_at_period_end": false,
        "trial_end": null,
        "items": {
            "object": "list",
            "data": [
                { "price": { "id": "price_test" }, "quantity": 1 }
            ]
        }
    });
    overrides(&mut object);
    event(id, event_type, created, object)
}

/// Raw `invoice.*` event payload as the gateway sends it.
pub fn invoice_event(
    id: &str,
    event_type: &str,
    created: i64,
    customer: &str,
    overrides: impl FnOnce(&mut Value),
) -> Value {
    let mut object = json!({
        "id": "in_test",
        "object": "invoice",
        "customer": customer,
        "subscription": "sub_test",
        "amount_paid": 999,
        "amount_due": 999,
        "currency": "usd"
    });
    overrides(&mut object);
    event(id, event_type, created, object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::payment_gateway::WebhookEvent;

    #[test]
    fn test_event_payloads_parse() {
        let event: WebhookEvent = serde_json::from_value(subscription_event(
            "evt_1",
            "customer.subscription.created",
            1_700_000_000,
            "cus_1",
            |o| o["status"] = json!("trialing"),
        ))
        .unwrap();
        let sub = event.subscription().unwrap();
        assert_eq!(sub.customer, "cus_1");
        assert_eq!(sub.status, SubscriptionStatus::Trialing);

        let event: WebhookEvent = serde_json::from_value(invoice_event(
            "evt_2",
            "invoice.payment_succeeded",
            1_700_000_000,
            "cus_1",
            |_| {},
        ))
        .unwrap();
        assert_eq!(event.invoice().unwrap().amount_paid, 999);
    }
}
