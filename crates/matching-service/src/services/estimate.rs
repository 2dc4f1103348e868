//! Estimate service
//!
//! Freezes the offer's current prices for a client's option selection.

use matching_core::{Actor, DomainError, EngagementStatus, Estimate, Snowflake};
use tracing::{info, instrument};

use crate::dto::{BuildEstimateRequest, EstimateResponse};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Estimate service
pub struct EstimateService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> EstimateService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Build the engagement's one and only estimate
    #[instrument(skip(self, request), fields(options = request.option_ids.len()))]
    pub async fn build(
        &self,
        engagement_id: Snowflake,
        requester: &Actor,
        request: BuildEstimateRequest,
    ) -> ServiceResult<EstimateResponse> {
        let engagement = self
            .ctx
            .engagement_repo()
            .find_by_id(engagement_id)
            .await?
            .ok_or(DomainError::EngagementNotFound(engagement_id))?;

        if !engagement.is_client(requester) {
            return Err(DomainError::PermissionDenied {
                role: requester.role,
                action: "build an estimate",
            }
            .into());
        }
        if !matches!(
            engagement.status,
            EngagementStatus::Requested | EngagementStatus::Accepted
        ) {
            return Err(DomainError::InvalidStateTransition {
                from: engagement.status,
                action: "build an estimate for",
            }
            .into());
        }
        if self
            .ctx
            .estimate_repo()
            .find_by_engagement(engagement_id)
            .await?
            .is_some()
        {
            return Err(DomainError::EstimateAlreadyExists.into());
        }

        let offer = self
            .ctx
            .offer_repo()
            .find_by_id(engagement.offer_id)
            .await?
            .ok_or(DomainError::OfferNotFound(engagement.offer_id))?;

        let estimate = Estimate::snapshot(
            self.ctx.generate_id(),
            engagement_id,
            &offer,
            &request.option_ids,
            self.ctx.settings().estimate_policy,
        )?;
        // a concurrent build loses here on the unique engagement constraint
        self.ctx.estimate_repo().create(&estimate).await?;

        info!(
            engagement_id = %engagement_id,
            estimate_id = %estimate.id,
            total = estimate.total.amount(),
            "Estimate built"
        );

        Ok(EstimateResponse::from(&estimate))
    }

    /// Read the estimate; parties only
    #[instrument(skip(self))]
    pub async fn get(&self, engagement_id: Snowflake, actor: &Actor) -> ServiceResult<EstimateResponse> {
        let engagement = self
            .ctx
            .engagement_repo()
            .find_by_id(engagement_id)
            .await?
            .ok_or(DomainError::EngagementNotFound(engagement_id))?;
        if !actor.is_system() && !engagement.is_party(actor) {
            return Err(DomainError::NotEngagementParty.into());
        }

        let estimate = self
            .ctx
            .estimate_repo()
            .find_by_engagement(engagement_id)
            .await?
            .ok_or(DomainError::EstimateNotFound(engagement_id))?;

        Ok(EstimateResponse::from(&estimate))
    }
}
