//! Seat assignment over a team's paid capacity.
//!
//! The team document is the seat ledger: its `seatHolders` set is read once,
//! checked against the purchased quantity, and written back conditionally on
//! the revision that was read. Member records mirror the ledger and are only
//! written after the ledger change is committed.

use std::sync::Arc;

use billing_types::{SeatSummary, Subject, Subscription};
use chrono::Utc;
use tracing::instrument;

use super::teams::TeamUseCases;
use crate::{
    app_error::{AppError, AppResult},
    application::ports::document_store::{DocumentStore, paths},
    domain::entities::team::{SeatAssignment, TeamMember},
};

#[derive(Clone)]
pub struct SeatUseCases {
    store: Arc<dyn DocumentStore>,
    teams: TeamUseCases,
}

impl SeatUseCases {
    pub fn new(store: Arc<dyn DocumentStore>, teams: TeamUseCases) -> Self {
        Self { store, teams }
    }

    /// Seats bought by the team; 0 without a team subscription.
    async fn seat_quantity(&self, team_id: &str) -> AppResult<u32> {
        let sub: Option<Subscription> = self
            .store
            .get_as(&paths::subscription(&Subject::team(team_id)))
            .await?;
        Ok(sub.and_then(|s| s.quantity).unwrap_or(0))
    }

    pub async fn seat_summary(&self, team_id: &str) -> AppResult<SeatSummary> {
        let team = self.teams.get_team(team_id).await?;
        let quantity = self.seat_quantity(team_id).await?;
        Ok(SeatSummary::new(quantity, team.assigned_seats()))
    }

    async fn write_seat(
        &self,
        team_id: &str,
        mut member: TeamMember,
        actor_id: &str,
        is_active: bool,
    ) -> AppResult<TeamMember> {
        member.seat_assignment = Some(SeatAssignment {
            assigned_at: Utc::now(),
            assigned_by: actor_id.to_string(),
            is_active,
        });
        self.store
            .set_as(&paths::team_member(team_id, &member.id), &member)
            .await?;
        Ok(member)
    }

    /// Give `member_id` an active seat.
    ///
    /// Fails with `InsufficientSeats` when every purchased seat is taken, and
    /// with `Conflict` when another seat change committed first.
    #[instrument(skip(self))]
    pub async fn assign_seat(
        &self,
        team_id: &str,
        member_id: &str,
        actor_id: &str,
    ) -> AppResult<TeamMember> {
        self.teams.require_admin(team_id, actor_id).await?;

        let (mut team, revision) = self.teams.load_team(team_id).await?;
        let member = self
            .teams
            .get_member(team_id, member_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if team.holds_seat(member_id) {
            if member.has_active_seat() {
                return Ok(member);
            }
            // Ledger committed but the member write was lost.
            tracing::warn!("Repairing seat missing from member record");
            return self.write_seat(team_id, member, actor_id, true).await;
        }

        let quantity = self.seat_quantity(team_id).await?;
        let assigned = team.assigned_seats();
        if assigned >= quantity {
            tracing::info!(quantity, assigned, "Seat assignment rejected, no seats left");
            return Err(AppError::InsufficientSeats { quantity, assigned });
        }

        team.seat_holders.insert(member_id.to_string());
        self.teams.commit_seats(team, revision).await?;
        let member = self.write_seat(team_id, member, actor_id, true).await?;

        tracing::info!(assigned = assigned + 1, quantity, "Seat assigned");
        Ok(member)
    }

    /// Deactivate the seat of `member_id`. The owner's seat is never released.
    #[instrument(skip(self))]
    pub async fn unassign_seat(
        &self,
        team_id: &str,
        member_id: &str,
        actor_id: &str,
    ) -> AppResult<TeamMember> {
        self.teams.require_admin(team_id, actor_id).await?;

        let (mut team, revision) = self.teams.load_team(team_id).await?;
        let member = self
            .teams
            .get_member(team_id, member_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if member.is_owner() {
            return Err(AppError::OwnerSeatProtected);
        }

        if team.seat_holders.remove(member_id) {
            self.teams.commit_seats(team, revision).await?;
        } else if !member.has_active_seat() {
            return Ok(member);
        }
        let member = self.write_seat(team_id, member, actor_id, false).await?;

        tracing::info!("Seat unassigned");
        Ok(member)
    }
}
