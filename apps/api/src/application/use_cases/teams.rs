//! Team membership: teams, members, and role checks.

use std::{collections::BTreeSet, sync::Arc};

use billing_types::TeamRole;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::document_store::{DocumentStore, Precondition, decode, paths},
        validators::{is_valid_document_id, is_valid_email},
    },
    domain::entities::team::{SeatAssignment, Team, TeamMember},
};

/// Document stored at `users/{uid}/teams/owned`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedTeamRef {
    pub team_id: String,
}

#[derive(Debug, Clone)]
pub struct NewMemberInput {
    pub member_id: String,
    pub email: String,
    pub role: TeamRole,
}

#[derive(Clone)]
pub struct TeamUseCases {
    store: Arc<dyn DocumentStore>,
}

impl TeamUseCases {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a team owned by `owner_id`. The owner joins with an active seat.
    ///
    /// A user owns at most one team; a second call fails with `Conflict`.
    /// A call that failed after claiming the owner index is completed by the
    /// next call instead of being rejected.
    #[instrument(skip(self, owner_email))]
    pub async fn create_team(
        &self,
        owner_id: &str,
        owner_email: &str,
        name: &str,
    ) -> AppResult<Team> {
        if !is_valid_document_id(owner_id) {
            return Err(AppError::InvalidInput("Invalid owner id".into()));
        }
        if !is_valid_email(owner_email) {
            return Err(AppError::InvalidInput("Invalid email".into()));
        }
        let name = name.trim();
        if name.is_empty() || name.len() > 100 {
            return Err(AppError::ValidationError(
                "Team name must be 1-100 characters".into(),
            ));
        }

        let now = Utc::now();
        let mut team = Team {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            owner_id: owner_id.to_string(),
            created_at: now,
            updated_at: now,
            seats_version: 0,
            seat_holders: BTreeSet::from([owner_id.to_string()]),
        };

        // Claim the owner index first so two concurrent creates cannot both succeed.
        let claimed = self
            .store
            .set_if(
                &paths::owned_team(owner_id),
                serde_json::to_value(OwnedTeamRef {
                    team_id: team.id.clone(),
                })?,
                Precondition::Missing,
            )
            .await;

        match claimed {
            Ok(()) => {}
            Err(AppError::Conflict) => {
                let team_id = self.owned_team_id(owner_id).await?.ok_or(AppError::Conflict)?;
                match self.store.get_as::<Team>(&paths::team(&team_id)).await? {
                    Some(existing) => {
                        if self.get_member(&team_id, owner_id).await?.is_some() {
                            return Err(AppError::Conflict);
                        }
                        tracing::warn!(team_id = %team_id, "Completing team left without its owner");
                        self.write_owner(&existing, owner_email).await?;
                        return Ok(existing);
                    }
                    None => {
                        tracing::warn!(team_id = %team_id, "Completing team creation from owner index");
                        team.id = team_id;
                    }
                }
            }
            Err(e) => return Err(e),
        }

        // A concurrent completion of the same index writes the same id; only one wins.
        self.store
            .set_if(
                &paths::team(&team.id),
                serde_json::to_value(&team)?,
                Precondition::Missing,
            )
            .await?;
        self.write_owner(&team, owner_email).await?;

        tracing::info!(team_id = %team.id, "Team created");
        Ok(team)
    }

    async fn write_owner(&self, team: &Team, owner_email: &str) -> AppResult<()> {
        let owner = TeamMember {
            id: team.owner_id.clone(),
            email: owner_email.trim().to_string(),
            role: TeamRole::Owner,
            joined_at: team.created_at,
            invited_by: None,
            seat_assignment: Some(SeatAssignment {
                assigned_at: team.created_at,
                assigned_by: team.owner_id.clone(),
                is_active: true,
            }),
        };
        self.store
            .set_as(&paths::team_member(&team.id, &team.owner_id), &owner)
            .await
    }

    /// The team document together with the revision it was read at.
    pub async fn load_team(&self, team_id: &str) -> AppResult<(Team, u64)> {
        let path = paths::team(team_id);
        let doc = self.store.get(&path).await?.ok_or(AppError::NotFound)?;
        let revision = doc.revision;
        Ok((decode(&path, doc.data)?, revision))
    }

    /// Write a seat change to the team, provided nobody changed it since `revision`.
    ///
    /// Two seat mutations racing on the same team cannot both pass this step.
    pub async fn commit_seats(&self, mut team: Team, revision: u64) -> AppResult<Team> {
        team.seats_version += 1;
        team.updated_at = Utc::now();
        self.store
            .set_if(
                &paths::team(&team.id),
                serde_json::to_value(&team)?,
                Precondition::Revision(revision),
            )
            .await?;
        Ok(team)
    }

    pub async fn get_team(&self, team_id: &str) -> AppResult<Team> {
        self.store
            .get_as(&paths::team(team_id))
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Id of the team `user_id` owns, if any.
    pub async fn owned_team_id(&self, user_id: &str) -> AppResult<Option<String>> {
        let owned: Option<OwnedTeamRef> = self.store.get_as(&paths::owned_team(user_id)).await?;
        Ok(owned.map(|o| o.team_id))
    }

    pub async fn get_member(&self, team_id: &str, member_id: &str) -> AppResult<Option<TeamMember>> {
        self.store
            .get_as(&paths::team_member(team_id, member_id))
            .await
    }

    pub async fn list_members(&self, team_id: &str) -> AppResult<Vec<TeamMember>> {
        self.get_team(team_id).await?;
        let members = self
            .store
            .list_as::<TeamMember>(&paths::team_members(team_id))
            .await?;
        Ok(members.into_iter().map(|(_, m)| m).collect())
    }

    /// The member record of `user_id` if they may manage `team_id`; `Forbidden` otherwise.
    pub async fn require_admin(&self, team_id: &str, user_id: &str) -> AppResult<TeamMember> {
        match self.get_member(team_id, user_id).await? {
            Some(member) if member.role.can_manage() => Ok(member),
            _ => {
                tracing::warn!(team_id, user_id, "Team management denied");
                Err(AppError::Forbidden)
            }
        }
    }

    /// Add a member without a seat. Only owners and admins may add members.
    #[instrument(skip(self, input), fields(member_id = %input.member_id))]
    pub async fn add_member(
        &self,
        team_id: &str,
        actor_id: &str,
        input: NewMemberInput,
    ) -> AppResult<TeamMember> {
        self.require_admin(team_id, actor_id).await?;

        if !is_valid_document_id(&input.member_id) {
            return Err(AppError::InvalidInput("Invalid member id".into()));
        }
        if !is_valid_email(&input.email) {
            return Err(AppError::InvalidInput("Invalid email".into()));
        }
        if input.role == TeamRole::Owner {
            return Err(AppError::ValidationError(
                "A team has exactly one owner".into(),
            ));
        }

        let member = TeamMember {
            id: input.member_id,
            email: input.email.trim().to_string(),
            role: input.role,
            joined_at: Utc::now(),
            invited_by: Some(actor_id.to_string()),
            seat_assignment: None,
        };
        self.store
            .set_if(
                &paths::team_member(team_id, &member.id),
                serde_json::to_value(&member)?,
                Precondition::Missing,
            )
            .await?;

        tracing::info!(role = member.role.as_str(), "Member added");
        Ok(member)
    }

    /// Remove a member. The owner cannot be removed.
    #[instrument(skip(self))]
    pub async fn remove_member(&self, team_id: &str, actor_id: &str, member_id: &str) -> AppResult<()> {
        self.require_admin(team_id, actor_id).await?;

        let member = self
            .get_member(team_id, member_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if member.is_owner() {
            return Err(AppError::Forbidden);
        }

        let (mut team, revision) = self.load_team(team_id).await?;
        if team.seat_holders.remove(member_id) {
            self.commit_seats(team, revision).await?;
        }

        self.store
            .delete(&paths::team_member(team_id, member_id))
            .await?;
        tracing::info!("Member removed");
        Ok(())
    }
}
