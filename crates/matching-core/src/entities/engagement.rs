//! Engagement entity - one client request to an expert for a catalog offer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::entities::CatalogOffer;
use crate::error::DomainError;
use crate::events::{Decision, EngagementEvent};
use crate::value_objects::{Actor, ActorRole, Snowflake};

/// Lifecycle status of an engagement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngagementStatus {
    Requested,
    Accepted,
    Rejected,
    InProgress,
    WorkCompleted,
    Confirmed,
    Cancelled,
}

impl EngagementStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "REQUESTED",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::InProgress => "IN_PROGRESS",
            Self::WorkCompleted => "WORK_COMPLETED",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Terminal states never change again
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Confirmed | Self::Cancelled)
    }

    /// Transition table. `None` means the event is not legal from `self`.
    pub fn next(self, event: &EngagementEvent) -> Option<Self> {
        use EngagementEvent as E;

        match (self, event) {
            (
                Self::Requested,
                E::Decide {
                    decision: Decision::Accept,
                },
            ) => Some(Self::Accepted),
            (
                Self::Requested,
                E::Decide {
                    decision: Decision::Reject,
                },
            ) => Some(Self::Rejected),
            // payment received: accepted, or stays accepted
            (Self::Requested | Self::Accepted, E::PaymentConfirmed) => Some(Self::Accepted),
            (Self::Accepted, E::StartWork) => Some(Self::InProgress),
            (Self::InProgress, E::CompleteWork) => Some(Self::WorkCompleted),
            (Self::WorkCompleted, E::Confirm) => Some(Self::Confirmed),
            (Self::Requested | Self::Accepted | Self::InProgress, E::Cancel { .. }) => {
                Some(Self::Cancelled)
            }
            _ => None,
        }
    }
}

impl fmt::Display for EngagementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngagementStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REQUESTED" => Ok(Self::Requested),
            "ACCEPTED" => Ok(Self::Accepted),
            "REJECTED" => Ok(Self::Rejected),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "WORK_COMPLETED" => Ok(Self::WorkCompleted),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(DomainError::InternalError(format!(
                "unknown engagement status: {other}"
            ))),
        }
    }
}

/// Engagement entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Engagement {
    pub id: Snowflake,
    pub client_id: Snowflake,
    pub expert_id: Snowflake,
    pub offer_id: Snowflake,
    pub status: EngagementStatus,
    pub work_started_at: Option<DateTime<Utc>>,
    pub work_ended_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    /// Optimistic concurrency counter, bumped by every persisted transition
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Engagement {
    /// A fresh request from `client_id` for `offer`
    pub fn new(id: Snowflake, client_id: Snowflake, offer: &CatalogOffer) -> Self {
        let now = Utc::now();
        Self {
            id,
            client_id,
            expert_id: offer.expert_id,
            offer_id: offer.id,
            status: EngagementStatus::Requested,
            work_started_at: None,
            work_ended_at: None,
            cancel_reason: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Client or owning expert of this engagement
    pub fn is_party(&self, actor: &Actor) -> bool {
        actor.is(self.client_id, ActorRole::Client) || actor.is(self.expert_id, ActorRole::Expert)
    }

    pub fn is_client(&self, actor: &Actor) -> bool {
        actor.is(self.client_id, ActorRole::Client)
    }

    /// Check that `actor` may submit `event`, independent of current state
    pub fn authorize(&self, event: &EngagementEvent, actor: &Actor) -> Result<(), DomainError> {
        let allowed = match event {
            EngagementEvent::Decide { .. }
            | EngagementEvent::StartWork
            | EngagementEvent::CompleteWork => actor.is(self.expert_id, ActorRole::Expert),
            EngagementEvent::Confirm => actor.is(self.client_id, ActorRole::Client),
            EngagementEvent::Cancel { .. } => actor.is_system() || self.is_party(actor),
            EngagementEvent::PaymentConfirmed => actor.is_system(),
        };

        if allowed {
            Ok(())
        } else {
            Err(DomainError::PermissionDenied {
                role: actor.role,
                action: event.action(),
            })
        }
    }

    /// Guard-then-apply: returns the engagement as it would be after `event`,
    /// without touching `self`. The returned value keeps the loaded `version`,
    /// which the repository uses as the expected version when persisting.
    pub fn apply(
        &self,
        event: &EngagementEvent,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Engagement, DomainError> {
        self.authorize(event, actor)?;

        let status = self
            .status
            .next(event)
            .ok_or(DomainError::InvalidStateTransition {
                from: self.status,
                action: event.action(),
            })?;

        let mut next = self.clone();
        next.status = status;
        next.updated_at = now;
        match event {
            EngagementEvent::StartWork => next.work_started_at = Some(now),
            EngagementEvent::CompleteWork => next.work_ended_at = Some(now),
            EngagementEvent::Cancel { reason } => next.cancel_reason = Some(reason.clone()),
            _ => {}
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Money;

    const CLIENT: Snowflake = Snowflake::new(10);
    const EXPERT: Snowflake = Snowflake::new(20);

    fn engagement(status: EngagementStatus) -> Engagement {
        let offer = CatalogOffer::new(
            Snowflake::new(30),
            EXPERT,
            "Logo design",
            Money::new(120_000).unwrap(),
        );
        let mut engagement = Engagement::new(Snowflake::new(1), CLIENT, &offer);
        engagement.status = status;
        engagement
    }

    fn expert() -> Actor {
        Actor::expert(EXPERT)
    }

    fn client() -> Actor {
        Actor::client(CLIENT)
    }

    #[test]
    fn test_new_engagement_is_requested() {
        let e = engagement(EngagementStatus::Requested);
        assert_eq!(e.expert_id, EXPERT);
        assert_eq!(e.offer_id, Snowflake::new(30));
        assert_eq!(e.version, 0);
    }

    #[test]
    fn test_happy_path() {
        let now = Utc::now();
        let e = engagement(EngagementStatus::Requested);
        let e = e
            .apply(&EngagementEvent::decide(Decision::Accept), &expert(), now)
            .unwrap();
        assert_eq!(e.status, EngagementStatus::Accepted);

        let e = e.apply(&EngagementEvent::StartWork, &expert(), now).unwrap();
        assert_eq!(e.status, EngagementStatus::InProgress);
        assert_eq!(e.work_started_at, Some(now));

        let e = e.apply(&EngagementEvent::CompleteWork, &expert(), now).unwrap();
        assert_eq!(e.status, EngagementStatus::WorkCompleted);
        assert_eq!(e.work_ended_at, Some(now));

        let e = e.apply(&EngagementEvent::Confirm, &client(), now).unwrap();
        assert_eq!(e.status, EngagementStatus::Confirmed);
        assert!(e.status.is_terminal());
    }

    #[test]
    fn test_confirm_from_in_progress_is_invalid() {
        let e = engagement(EngagementStatus::InProgress);
        let err = e
            .apply(&EngagementEvent::Confirm, &client(), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidStateTransition {
                from: EngagementStatus::InProgress,
                ..
            }
        ));
        assert_eq!(e.status, EngagementStatus::InProgress);
    }

    #[test]
    fn test_wrong_actor_is_denied_before_state_check() {
        // client trying to start work on a Requested engagement: permission wins
        let e = engagement(EngagementStatus::Requested);
        let err = e
            .apply(&EngagementEvent::StartWork, &client(), Utc::now())
            .unwrap_err();
        assert!(err.is_authorization());

        // another expert cannot decide
        let err = e
            .apply(
                &EngagementEvent::decide(Decision::Accept),
                &Actor::expert(Snowflake::new(99)),
                Utc::now(),
            )
            .unwrap_err();
        assert!(err.is_authorization());

        // the expert's id presented with the client role is still denied
        let err = e
            .apply(
                &EngagementEvent::decide(Decision::Accept),
                &Actor::client(EXPERT),
                Utc::now(),
            )
            .unwrap_err();
        assert!(err.is_authorization());
    }

    #[test]
    fn test_cancel_sources() {
        let cancel = EngagementEvent::cancel("changed my mind");
        for status in [
            EngagementStatus::Requested,
            EngagementStatus::Accepted,
            EngagementStatus::InProgress,
        ] {
            let e = engagement(status).apply(&cancel, &client(), Utc::now()).unwrap();
            assert_eq!(e.status, EngagementStatus::Cancelled);
            assert_eq!(e.cancel_reason.as_deref(), Some("changed my mind"));
        }

        for status in [
            EngagementStatus::WorkCompleted,
            EngagementStatus::Rejected,
            EngagementStatus::Confirmed,
            EngagementStatus::Cancelled,
        ] {
            let err = engagement(status)
                .apply(&cancel, &expert(), Utc::now())
                .unwrap_err();
            assert!(err.is_invalid_transition(), "{status} should not be cancellable");
        }
    }

    #[test]
    fn test_outsider_cannot_cancel() {
        let err = engagement(EngagementStatus::Requested)
            .apply(
                &EngagementEvent::cancel("spam"),
                &Actor::client(Snowflake::new(77)),
                Utc::now(),
            )
            .unwrap_err();
        assert!(err.is_authorization());
    }

    #[test]
    fn test_payment_confirmed_is_system_only() {
        let e = engagement(EngagementStatus::Requested);
        assert!(e
            .apply(&EngagementEvent::PaymentConfirmed, &client(), Utc::now())
            .unwrap_err()
            .is_authorization());

        let accepted = e
            .apply(&EngagementEvent::PaymentConfirmed, &Actor::system(), Utc::now())
            .unwrap();
        assert_eq!(accepted.status, EngagementStatus::Accepted);

        let still_accepted = accepted
            .apply(&EngagementEvent::PaymentConfirmed, &Actor::system(), Utc::now())
            .unwrap();
        assert_eq!(still_accepted.status, EngagementStatus::Accepted);

        assert!(engagement(EngagementStatus::Cancelled)
            .apply(&EngagementEvent::PaymentConfirmed, &Actor::system(), Utc::now())
            .unwrap_err()
            .is_invalid_transition());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            EngagementStatus::Requested,
            EngagementStatus::Accepted,
            EngagementStatus::Rejected,
            EngagementStatus::InProgress,
            EngagementStatus::WorkCompleted,
            EngagementStatus::Confirmed,
            EngagementStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<EngagementStatus>().unwrap(), status);
        }
        assert!("WAITING_PAYMENT".parse::<EngagementStatus>().is_err());
    }
}
