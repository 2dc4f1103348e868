//! Matching service
//!
//! Drives an engagement through its lifecycle. Every transition is
//! guard-then-apply on a freshly loaded row and is persisted with a version
//! check, so a transition computed from a stale read is never written.

use chrono::Utc;
use matching_core::{
    Actor, ActorRole, Decision, DomainError, Engagement, EngagementEvent, Snowflake,
};
use tracing::{info, instrument, warn};

use crate::dto::{CreateEngagementRequest, EngagementResponse};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::settlement::SettlementService;

/// Attempts before a lost version race is reported as a conflict
pub(crate) const MAX_ATTEMPTS: usize = 3;

/// Matching service
pub struct MatchingService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MatchingService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Open a new engagement for an offer
    #[instrument(skip(self, request), fields(offer_id = %request.offer_id))]
    pub async fn request(
        &self,
        actor: &Actor,
        request: CreateEngagementRequest,
    ) -> ServiceResult<EngagementResponse> {
        let denied = || DomainError::PermissionDenied {
            role: actor.role,
            action: "request an engagement",
        };
        if actor.role != ActorRole::Client {
            return Err(denied().into());
        }

        let member = self
            .ctx
            .member_repo()
            .find_by_id(actor.id)
            .await?
            .ok_or(DomainError::MemberNotFound(actor.id))?;
        if !member.is_client() {
            return Err(denied().into());
        }

        let offer = self
            .ctx
            .offer_repo()
            .find_by_id(request.offer_id)
            .await?
            .ok_or(DomainError::OfferNotFound(request.offer_id))?;
        if offer.expert_id == actor.id {
            return Err(denied().into());
        }

        let engagement = Engagement::new(self.ctx.generate_id(), actor.id, &offer);
        self.ctx.engagement_repo().create(&engagement).await?;

        info!(
            engagement_id = %engagement.id,
            client_id = %engagement.client_id,
            expert_id = %engagement.expert_id,
            "Engagement requested"
        );

        Ok(EngagementResponse::from(&engagement))
    }

    /// Read an engagement; parties only
    #[instrument(skip(self))]
    pub async fn get(&self, engagement_id: Snowflake, actor: &Actor) -> ServiceResult<EngagementResponse> {
        let engagement = self.load(engagement_id).await?;
        if !actor.is_system() && !engagement.is_party(actor) {
            return Err(DomainError::NotEngagementParty.into());
        }
        Ok(EngagementResponse::from(&engagement))
    }

    /// The expert accepts or rejects a request
    #[instrument(skip(self))]
    pub async fn decide(
        &self,
        engagement_id: Snowflake,
        actor: &Actor,
        decision: Decision,
    ) -> ServiceResult<EngagementResponse> {
        self.transition(engagement_id, &EngagementEvent::decide(decision), actor)
            .await
            .map(|e| EngagementResponse::from(&e))
    }

    #[instrument(skip(self))]
    pub async fn start_work(&self, engagement_id: Snowflake, actor: &Actor) -> ServiceResult<EngagementResponse> {
        self.transition(engagement_id, &EngagementEvent::StartWork, actor)
            .await
            .map(|e| EngagementResponse::from(&e))
    }

    #[instrument(skip(self))]
    pub async fn complete_work(
        &self,
        engagement_id: Snowflake,
        actor: &Actor,
    ) -> ServiceResult<EngagementResponse> {
        self.transition(engagement_id, &EngagementEvent::CompleteWork, actor)
            .await
            .map(|e| EngagementResponse::from(&e))
    }

    /// The client accepts the delivered work; unlocks the review
    #[instrument(skip(self))]
    pub async fn confirm(&self, engagement_id: Snowflake, actor: &Actor) -> ServiceResult<EngagementResponse> {
        self.transition(engagement_id, &EngagementEvent::Confirm, actor)
            .await
            .map(|e| EngagementResponse::from(&e))
    }

    /// Cancel an engagement. When a payment exists the settlement service
    /// refunds or closes it in the same write as the transition.
    #[instrument(skip(self, reason))]
    pub async fn cancel(
        &self,
        engagement_id: Snowflake,
        actor: &Actor,
        reason: String,
    ) -> ServiceResult<EngagementResponse> {
        let event = EngagementEvent::cancel(reason.clone());
        let engagement = self.load(engagement_id).await?;
        engagement.authorize(&event, actor)?;

        let payment = self
            .ctx
            .payment_repo()
            .find_latest_by_engagement(engagement_id)
            .await?;
        if payment.is_none() {
            return self
                .transition(engagement_id, &event, actor)
                .await
                .map(|e| EngagementResponse::from(&e));
        }

        SettlementService::new(self.ctx)
            .cancel(engagement_id, actor, &reason)
            .await?;

        let engagement = self.load(engagement_id).await?;
        Ok(EngagementResponse::from(&engagement))
    }

    /// Apply `event` with optimistic retries. Returns the engagement as
    /// persisted.
    #[instrument(skip(self, event), fields(event = event.event_type()))]
    pub(crate) async fn transition(
        &self,
        engagement_id: Snowflake,
        event: &EngagementEvent,
        actor: &Actor,
    ) -> ServiceResult<Engagement> {
        for attempt in 1..=MAX_ATTEMPTS {
            let current = self.load(engagement_id).await?;
            let mut next = current.apply(event, actor, Utc::now())?;

            if self.ctx.engagement_repo().update_status(&next).await? {
                next.version += 1;
                info!(
                    engagement_id = %engagement_id,
                    from = %current.status,
                    to = %next.status,
                    "Engagement transitioned"
                );
                return Ok(next);
            }

            warn!(engagement_id = %engagement_id, attempt, "Engagement changed concurrently, retrying");
        }

        Err(DomainError::ConcurrentModification(format!("engagement {engagement_id}")).into())
    }

    async fn load(&self, engagement_id: Snowflake) -> ServiceResult<Engagement> {
        self.ctx
            .engagement_repo()
            .find_by_id(engagement_id)
            .await?
            .ok_or_else(|| DomainError::EngagementNotFound(engagement_id).into())
    }
}
