//! Scripted in-memory payment gateway that records every call.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_gateway::{
        CheckoutSession, CheckoutSessionRequest, GatewayCustomer, GatewayPrice, PaymentGateway,
        PortalSession,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    RetrievePrice(String),
    RetrieveCustomer(String),
    FindCustomerByEmail(String),
    CreateCustomer(String),
    UpdateCustomerMetadata(String, BTreeMap<String, String>),
    CreateCheckoutSession(String),
    /// `(customer_id, return_url)`
    CreatePortalSession(String, String),
}

#[derive(Default)]
pub struct MockGateway {
    pub customers: Mutex<HashMap<String, GatewayCustomer>>,
    pub prices: Mutex<HashMap<String, GatewayPrice>>,
    calls: Mutex<Vec<GatewayCall>>,
    checkout_requests: Mutex<Vec<CheckoutSessionRequest>>,
    next_error: Mutex<Option<AppError>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_customer(&self, customer: GatewayCustomer) {
        self.customers
            .lock()
            .unwrap()
            .insert(customer.id.clone(), customer);
    }

    pub fn add_price(&self, price: GatewayPrice) {
        self.prices.lock().unwrap().insert(price.id.clone(), price);
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: AppError) {
        *self.next_error.lock().unwrap() = Some(error);
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_checkout_request(&self) -> Option<CheckoutSessionRequest> {
        self.checkout_requests.lock().unwrap().last().cloned()
    }

    pub fn customer_by_email(&self, email: &str) -> Option<GatewayCustomer> {
        self.customers
            .lock()
            .unwrap()
            .values()
            .find(|c| !c.deleted && c.email.as_deref() == Some(email))
            .cloned()
    }

    fn record(&self, call: GatewayCall) -> AppResult<()> {
        self.calls.lock().unwrap().push(call);
        match self.next_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn retrieve_price(&self, price_id: &str) -> AppResult<GatewayPrice> {
        self.record(GatewayCall::RetrievePrice(price_id.to_string()))?;
        self.prices
            .lock()
            .unwrap()
            .get(price_id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn retrieve_customer(&self, customer_id: &str) -> AppResult<GatewayCustomer> {
        self.record(GatewayCall::RetrieveCustomer(customer_id.to_string()))?;
        self.customers
            .lock()
            .unwrap()
            .get(customer_id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn find_customer_by_email(&self, email: &str) -> AppResult<Option<GatewayCustomer>> {
        self.record(GatewayCall::FindCustomerByEmail(email.to_string()))?;
        Ok(self.customer_by_email(email))
    }

    async fn create_customer(
        &self,
        email: &str,
        metadata: &BTreeMap<String, String>,
    ) -> AppResult<GatewayCustomer> {
        self.record(GatewayCall::CreateCustomer(email.to_string()))?;
        let mut customers = self.customers.lock().unwrap();
        let customer = GatewayCustomer {
            id: format!("cus_mock_{}", customers.len() + 1),
            email: Some(email.to_string()),
            metadata: metadata.clone().into_iter().collect(),
            deleted: false,
        };
        customers.insert(customer.id.clone(), customer.clone());
        Ok(customer)
    }

    async fn update_customer_metadata(
        &self,
        customer_id: &str,
        metadata: &BTreeMap<String, String>,
    ) -> AppResult<GatewayCustomer> {
        self.record(GatewayCall::UpdateCustomerMetadata(
            customer_id.to_string(),
            metadata.clone(),
        ))?;
        let mut customers = self.customers.lock().unwrap();
        let customer = customers.get_mut(customer_id).ok_or(AppError::NotFound)?;
        customer
            .metadata
            .extend(metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(customer.clone())
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> AppResult<CheckoutSession> {
        self.record(GatewayCall::CreateCheckoutSession(request.customer_id.clone()))?;
        let mut requests = self.checkout_requests.lock().unwrap();
        requests.push(request.clone());
        let id = format!("cs_test_{}", requests.len());
        Ok(CheckoutSession {
            url: Some(format!("https://checkout.example.com/{}", id)),
            id,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> AppResult<PortalSession> {
        self.record(GatewayCall::CreatePortalSession(
            customer_id.to_string(),
            return_url.to_string(),
        ))?;
        Ok(PortalSession {
            id: "bps_test".to_string(),
            url: format!("https://billing.example.com/session/{}", customer_id),
        })
    }
}
