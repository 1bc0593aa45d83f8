//! Checkout and customer portal sessions.

use std::collections::BTreeMap;
use std::sync::Arc;

use billing_types::{Subject, Subscription};
use serde::Serialize;
use tracing::instrument;

use super::teams::TeamUseCases;
use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::{
            document_store::{DocumentStore, paths},
            payment_gateway::{
                CheckoutSessionRequest, GatewayCustomer, METADATA_TEAM_ID, METADATA_USER_ID,
                PaymentGateway, PaymentMethodCollection, TrialSettings,
            },
        },
        validators::{is_valid_document_id, is_valid_email, is_valid_gateway_id},
    },
};

pub const METADATA_TRIAL_ENABLED: &str = "trial_enabled";
pub const METADATA_TRIAL_DAYS: &str = "trial_days";

#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    /// Global trial feature flag; overrides what callers ask for.
    pub trials_enabled: bool,
    /// Base for default success/cancel/return URLs.
    pub app_origin: String,
}

impl CheckoutSettings {
    fn default_success_url(&self) -> String {
        format!(
            "{}/billing?checkout=success&session_id={{CHECKOUT_SESSION_ID}}",
            self.app_origin
        )
    }

    fn default_cancel_url(&self) -> String {
        format!("{}/billing?checkout=canceled", self.app_origin)
    }

    fn default_return_url(&self) -> String {
        format!("{}/billing", self.app_origin)
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutInput {
    pub user_id: String,
    pub user_email: String,
    pub price_id: String,
    /// Set for team purchases.
    pub team_id: Option<String>,
    /// Seat count; required for teams, defaults to 1 otherwise.
    pub quantity: Option<u32>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
    pub trial_enabled: bool,
    pub require_payment_method: bool,
}

/// A team purchase; the customer email comes from the buyer's member record.
#[derive(Debug, Clone)]
pub struct TeamCheckoutInput {
    pub price_id: String,
    pub quantity: Option<u32>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
    pub trial_enabled: bool,
    pub require_payment_method: bool,
}

impl CheckoutInput {
    pub fn subject(&self) -> Subject {
        match &self.team_id {
            Some(team_id) => Subject::team(team_id.clone()),
            None => Subject::individual(self.user_id.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionOutput {
    pub session_id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortalSessionOutput {
    pub url: String,
}

/// Trial and payment-method policy of one checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPolicy {
    pub trial_days: Option<u32>,
    pub payment_method_collection: PaymentMethodCollection,
}

/// Combine the caller's request with the global flag and the price's trial length.
///
/// Deferred card collection is only allowed while a trial runs; the trial then
/// cancels the subscription if no card is on file when it ends.
pub fn checkout_policy(
    trials_allowed: bool,
    price_trial_days: u32,
    require_payment_method: bool,
) -> CheckoutPolicy {
    let trial_days = (trials_allowed && price_trial_days > 0).then_some(price_trial_days);
    let payment_method_collection = if require_payment_method || trial_days.is_none() {
        PaymentMethodCollection::Always
    } else {
        PaymentMethodCollection::IfRequired
    };
    CheckoutPolicy {
        trial_days,
        payment_method_collection,
    }
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct CheckoutUseCases {
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<dyn DocumentStore>,
    teams: TeamUseCases,
    settings: CheckoutSettings,
}

impl CheckoutUseCases {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        store: Arc<dyn DocumentStore>,
        teams: TeamUseCases,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            gateway,
            store,
            teams,
            settings,
        }
    }

    /// Start a checkout for an individual or a team.
    ///
    /// Input is validated before any gateway call. Gateway errors propagate
    /// unchanged; the caller may simply retry.
    #[instrument(skip(self, input), fields(subject = %input.subject(), price_id = %input.price_id))]
    pub async fn create_checkout_session(
        &self,
        input: CheckoutInput,
    ) -> AppResult<CheckoutSessionOutput> {
        let quantity = validate_checkout(&input)?;

        let mut customer_metadata = BTreeMap::new();
        customer_metadata.insert(METADATA_USER_ID.to_string(), input.user_id.clone());
        if let Some(team_id) = &input.team_id {
            customer_metadata.insert(METADATA_TEAM_ID.to_string(), team_id.clone());
        }

        let customer = self
            .resolve_customer(input.user_email.trim(), &customer_metadata)
            .await?;

        let trials_allowed = input.trial_enabled && self.settings.trials_enabled;
        if input.trial_enabled && !self.settings.trials_enabled {
            tracing::debug!("Trials disabled globally, checkout proceeds without trial");
        }
        let price_trial_days = if trials_allowed {
            self.gateway.retrieve_price(&input.price_id).await?.trial_days()
        } else {
            0
        };
        let policy = checkout_policy(trials_allowed, price_trial_days, input.require_payment_method);

        let mut metadata = customer_metadata;
        metadata.insert(
            METADATA_TRIAL_ENABLED.to_string(),
            policy.trial_days.is_some().to_string(),
        );
        metadata.insert(
            METADATA_TRIAL_DAYS.to_string(),
            policy.trial_days.unwrap_or(0).to_string(),
        );

        let request = CheckoutSessionRequest {
            customer_id: customer.id,
            price_id: input.price_id,
            quantity,
            success_url: input
                .success_url
                .unwrap_or_else(|| self.settings.default_success_url()),
            cancel_url: input
                .cancel_url
                .unwrap_or_else(|| self.settings.default_cancel_url()),
            client_reference_id: input.team_id.unwrap_or(input.user_id),
            payment_method_collection: policy.payment_method_collection,
            trial: policy.trial_days.map(|days| TrialSettings {
                days,
                cancel_if_missing_payment_method: policy.payment_method_collection
                    == PaymentMethodCollection::IfRequired,
            }),
            metadata,
        };

        let session = self.gateway.create_checkout_session(&request).await?;
        tracing::info!(
            session_id = %session.id,
            trial_days = policy.trial_days.unwrap_or(0),
            collection = policy.payment_method_collection.as_str(),
            "Checkout session created"
        );

        Ok(CheckoutSessionOutput {
            session_id: session.id,
            url: session.url,
        })
    }

    /// Start a team checkout on behalf of `user_id`, who must manage the team.
    pub async fn create_team_checkout_session(
        &self,
        user_id: &str,
        team_id: &str,
        input: TeamCheckoutInput,
    ) -> AppResult<CheckoutSessionOutput> {
        if !is_valid_document_id(user_id) || !is_valid_document_id(team_id) {
            return Err(AppError::InvalidInput("Invalid user or team id".into()));
        }
        let member = self.teams.require_admin(team_id, user_id).await?;

        self.create_checkout_session(CheckoutInput {
            user_id: user_id.to_string(),
            user_email: member.email,
            price_id: input.price_id,
            team_id: Some(team_id.to_string()),
            quantity: input.quantity,
            success_url: input.success_url,
            cancel_url: input.cancel_url,
            trial_enabled: input.trial_enabled,
            require_payment_method: input.require_payment_method,
        })
        .await
    }

    /// Open the customer portal for the gateway customer behind `user_id`.
    ///
    /// The customer is taken from the user's subscription, or from the
    /// subscription of the team they own.
    #[instrument(skip(self, return_url))]
    pub async fn create_portal_session(
        &self,
        user_id: &str,
        return_url: Option<String>,
    ) -> AppResult<PortalSessionOutput> {
        if !is_valid_document_id(user_id) {
            return Err(AppError::InvalidInput("Invalid user id".into()));
        }

        let customer_id = self
            .customer_for_user(user_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let return_url = return_url.unwrap_or_else(|| self.settings.default_return_url());
        let session = self
            .gateway
            .create_portal_session(&customer_id, &return_url)
            .await?;

        Ok(PortalSessionOutput { url: session.url })
    }

    async fn customer_for_user(&self, user_id: &str) -> AppResult<Option<String>> {
        let individual: Option<Subscription> = self
            .store
            .get_as(&paths::subscription(&Subject::individual(user_id)))
            .await?;
        if let Some(sub) = individual {
            return Ok(Some(sub.gateway_customer_id));
        }

        let Some(team_id) = self.teams.owned_team_id(user_id).await? else {
            return Ok(None);
        };
        let team: Option<Subscription> = self
            .store
            .get_as(&paths::subscription(&Subject::team(team_id)))
            .await?;
        Ok(team.map(|sub| sub.gateway_customer_id))
    }

    /// Find the customer by email or create it. Existing customers only get
    /// metadata keys they are missing; present values are never overwritten.
    async fn resolve_customer(
        &self,
        email: &str,
        metadata: &BTreeMap<String, String>,
    ) -> AppResult<GatewayCustomer> {
        let Some(customer) = self.gateway.find_customer_by_email(email).await? else {
            let customer = self.gateway.create_customer(email, metadata).await?;
            tracing::info!(customer_id = %customer.id, "Created gateway customer");
            return Ok(customer);
        };

        let missing: BTreeMap<String, String> = metadata
            .iter()
            .filter(|(key, _)| customer.metadata_value(key).is_none())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if missing.is_empty() {
            return Ok(customer);
        }

        tracing::info!(
            customer_id = %customer.id,
            keys = ?missing.keys().collect::<Vec<_>>(),
            "Backfilling customer metadata"
        );
        self.gateway
            .update_customer_metadata(&customer.id, &missing)
            .await
    }
}

/// Check required fields; returns the line item quantity.
fn validate_checkout(input: &CheckoutInput) -> AppResult<u32> {
    if !is_valid_document_id(&input.user_id) {
        return Err(AppError::InvalidInput("userId is required".into()));
    }
    if !is_valid_email(&input.user_email) {
        return Err(AppError::InvalidInput("A valid userEmail is required".into()));
    }
    if !is_valid_gateway_id(&input.price_id) {
        return Err(AppError::InvalidInput("priceId is required".into()));
    }

    match &input.team_id {
        Some(team_id) => {
            if !is_valid_document_id(team_id) {
                return Err(AppError::InvalidInput("Invalid teamId".into()));
            }
            match input.quantity {
                Some(q) if q >= 1 => Ok(q),
                _ => Err(AppError::InvalidInput(
                    "quantity of at least 1 is required for team checkout".into(),
                )),
            }
        }
        None => Ok(input.quantity.unwrap_or(1).max(1)),
    }
}
