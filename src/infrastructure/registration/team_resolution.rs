//! Team resolution: decides whether a submission creates a team, joins one
//! or is refused, and recovers from concurrent creation of the same team.
//!
//! Creation is optimistic. The team is inserted inside the registration's
//! transaction and the (name, category) uniqueness constraint arbitrates
//! between concurrent creators. The loser rolls back, opens a fresh
//! transaction, looks the team up again and joins it. Only one such retry is
//! made.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::domain::reference::CategoryId;
use crate::domain::registration::{RegistrationError, TeamIntent, TeamPolicyReason};
use crate::domain::storage::{RegistrationStore, RegistrationTransaction, UniqueConstraint};
use crate::domain::team::{NewTeam, Team, TeamId, TeamPolicy};
use crate::domain::DomainError;
use crate::infrastructure::observability::record_team_race_recovery;

/// Creation collisions tolerated before giving up
const MAX_CREATE_RACES: u32 = 1;

/// Team the participant will be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTeam {
    pub id: TeamId,
    pub leader: bool,
    /// Whether the team was inserted by this registration
    pub created: bool,
}

/// Successful resolution holding the still-open transaction
pub struct Resolution {
    pub transaction: Box<dyn RegistrationTransaction>,
    pub team: Option<ResolvedTeam>,
    /// Whether a creation race was lost and recovered from
    pub race_recovered: bool,
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolution")
            .field("team", &self.team)
            .field("race_recovered", &self.race_recovered)
            .finish_non_exhaustive()
    }
}

enum State {
    NoTeamIntent(Box<dyn RegistrationTransaction>),
    LookingUp(Box<dyn RegistrationTransaction>),
    Joining(Box<dyn RegistrationTransaction>, Team),
    Creating(Box<dyn RegistrationTransaction>),
    CreateRaceDetected(Box<dyn RegistrationTransaction>),
    Resolved(Resolution),
    Rejected(Box<dyn RegistrationTransaction>, TeamPolicyReason),
}

/// Drives the team resolution state machine against a transactional store
#[derive(Clone)]
pub struct TeamResolver {
    store: Arc<dyn RegistrationStore>,
    policy: TeamPolicy,
}

impl TeamResolver {
    pub fn new(store: Arc<dyn RegistrationStore>, policy: TeamPolicy) -> Self {
        Self { store, policy }
    }

    /// Resolve the team intent within `category_id`.
    ///
    /// On success the returned transaction is still open and already holds
    /// the new team, if one was created. On failure every transaction opened
    /// here has been rolled back.
    pub async fn resolve(
        &self,
        intent: &TeamIntent,
        category_id: CategoryId,
    ) -> Result<Resolution, RegistrationError> {
        let tx = self.store.begin().await?;

        let (team_name, leader) = match intent {
            TeamIntent::None => (None, false),
            TeamIntent::JoinOrCreate { team_name, leader } => (Some(team_name.as_str()), *leader),
        };

        let mut state = match team_name {
            None => State::NoTeamIntent(tx),
            Some(_) => State::LookingUp(tx),
        };
        let name = team_name.unwrap_or_default();
        let mut races = 0;

        loop {
            state = match state {
                State::NoTeamIntent(tx) => State::Resolved(Resolution {
                    transaction: tx,
                    team: None,
                    race_recovered: false,
                }),

                State::LookingUp(mut tx) => match tx.find_team(name, category_id).await {
                    Ok(Some(team)) => State::Joining(tx, team),
                    Ok(None) => State::Creating(tx),
                    Err(e) => return Err(abort(tx, e).await),
                },

                State::Joining(mut tx, team) => {
                    let has_room = match self.policy.max_team_size {
                        Some(_) => match tx.count_team_members(team.id()).await {
                            Ok(members) => self.policy.has_room(members),
                            Err(e) => return Err(abort(tx, e).await),
                        },
                        None => true,
                    };

                    if has_room {
                        debug!(team_id = %team.id(), team_name = %name, "Joining existing team");
                        State::Resolved(Resolution {
                            transaction: tx,
                            team: Some(ResolvedTeam {
                                id: team.id(),
                                leader: false,
                                created: false,
                            }),
                            race_recovered: races > 0,
                        })
                    } else {
                        State::Rejected(tx, TeamPolicyReason::TeamFull)
                    }
                }

                State::Creating(mut tx) if !leader => {
                    match tx.team_exists_in_other_category(name, category_id).await {
                        Ok(true) => State::Rejected(tx, TeamPolicyReason::TeamInOtherCategory),
                        Ok(false) => State::Rejected(tx, TeamPolicyReason::LeaderRequired),
                        Err(e) => return Err(abort(tx, e).await),
                    }
                }

                State::Creating(mut tx) => {
                    match tx.insert_team(NewTeam::new(name, category_id)).await {
                        Ok(team) => {
                            info!(
                                team_id = %team.id(),
                                team_name = %name,
                                category_id = %category_id,
                                "Team created"
                            );
                            State::Resolved(Resolution {
                                transaction: tx,
                                team: Some(ResolvedTeam {
                                    id: team.id(),
                                    leader: true,
                                    created: true,
                                }),
                                race_recovered: races > 0,
                            })
                        }
                        Err(e) if is_team_collision(&e) => State::CreateRaceDetected(tx),
                        Err(e) => return Err(abort(tx, e).await),
                    }
                }

                State::CreateRaceDetected(tx) => {
                    races += 1;
                    rollback_quietly(tx).await;

                    if races > MAX_CREATE_RACES {
                        error!(
                            team_name = %name,
                            category_id = %category_id,
                            "Team creation collided again after recovery"
                        );
                        return Err(RegistrationError::ConcurrencyConflict);
                    }

                    warn!(
                        team_name = %name,
                        category_id = %category_id,
                        "Team was created concurrently, retrying as join"
                    );
                    record_team_race_recovery();

                    State::LookingUp(self.store.begin().await?)
                }

                State::Rejected(tx, reason) => {
                    rollback_quietly(tx).await;
                    warn!(
                        team_name = %name,
                        category_id = %category_id,
                        reason = %reason.reason_code(),
                        "Registration rejected by team policy"
                    );
                    return Err(RegistrationError::team_policy(reason));
                }

                State::Resolved(resolution) => return Ok(resolution),
            };
        }
    }
}

fn is_team_collision(error: &DomainError) -> bool {
    error.violated_constraint() == Some(UniqueConstraint::TeamNameCategory)
}

/// Roll back after a storage failure and surface the failure
async fn abort(tx: Box<dyn RegistrationTransaction>, cause: DomainError) -> RegistrationError {
    error!(error = %cause, "Storage failure during team resolution");
    rollback_quietly(tx).await;
    RegistrationError::Storage(cause)
}

async fn rollback_quietly(tx: Box<dyn RegistrationTransaction>) {
    if let Err(e) = tx.rollback().await {
        error!(error = %e, "Failed to roll back transaction");
    }
}
