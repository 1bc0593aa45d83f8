//! Read-time entitlement: individual subscription first, then the owned team's.

use std::sync::Arc;

use billing_types::{Subject, Subscription, SubscriptionResolution};
use tracing::instrument;

use super::teams::OwnedTeamRef;
use crate::{
    app_error::AppResult,
    application::ports::document_store::{DocumentStore, paths},
};

#[derive(Clone)]
pub struct SubscriptionResolverUseCases {
    store: Arc<dyn DocumentStore>,
}

impl SubscriptionResolverUseCases {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Effective subscription of `user_id`.
    ///
    /// An individual subscription always shadows the team one, valid or not.
    /// Lookup failures resolve to "no subscription".
    #[instrument(skip(self))]
    pub async fn resolve(&self, user_id: &str) -> SubscriptionResolution {
        match self.lookup(user_id).await {
            Ok(Some(subscription)) => SubscriptionResolution::from_subscription(subscription),
            Ok(None) => SubscriptionResolution::none(),
            Err(e) => {
                tracing::warn!(error = %e, "Subscription lookup failed, denying entitlement");
                SubscriptionResolution::none()
            }
        }
    }

    async fn lookup(&self, user_id: &str) -> AppResult<Option<Subscription>> {
        let individual: Option<Subscription> = self
            .store
            .get_as(&paths::subscription(&Subject::individual(user_id)))
            .await?;
        if individual.is_some() {
            return Ok(individual);
        }

        let Some(owned) = self
            .store
            .get_as::<OwnedTeamRef>(&paths::owned_team(user_id))
            .await?
        else {
            return Ok(None);
        };

        self.store
            .get_as(&paths::subscription(&Subject::team(owned.team_id)))
            .await
    }
}
