//! Review service
//!
//! Reviews of confirmed engagements and the expert ratings they feed.
//! The rating update always commits in the same write as the review row.

use chrono::Utc;
use matching_core::{
    Actor, ActorRole, DomainError, EngagementStatus, Review, Score, Snowflake,
};
use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{CreateReviewRequest, ExpertRatingResponse, ReviewResponse};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Review service
pub struct ReviewService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ReviewService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// The client reviews a confirmed engagement, once
    #[instrument(skip(self, request), fields(score = request.score))]
    pub async fn create(
        &self,
        engagement_id: Snowflake,
        author: &Actor,
        request: CreateReviewRequest,
    ) -> ServiceResult<ReviewResponse> {
        request.validate()?;
        let score = Score::new(request.score)?;

        let engagement = self
            .ctx
            .engagement_repo()
            .find_by_id(engagement_id)
            .await?
            .ok_or(DomainError::EngagementNotFound(engagement_id))?;
        if !engagement.is_client(author) {
            return Err(DomainError::PermissionDenied {
                role: author.role,
                action: "review this engagement",
            }
            .into());
        }
        if engagement.status != EngagementStatus::Confirmed {
            return Err(DomainError::InvalidStateTransition {
                from: engagement.status,
                action: "review",
            }
            .into());
        }

        let review = Review {
            id: self.ctx.generate_id(),
            engagement_id,
            expert_id: engagement.expert_id,
            author_id: author.id,
            score,
            content: request.content,
            created_at: Utc::now(),
        };
        let rating = self.ctx.review_repo().create_with_rating(&review).await?;

        info!(
            review_id = %review.id,
            expert_id = %review.expert_id,
            rating = rating.rating(),
            review_count = rating.review_count(),
            "Review created"
        );

        Ok(ReviewResponse::from(&review))
    }

    /// The author withdraws a review
    #[instrument(skip(self))]
    pub async fn delete(&self, review_id: Snowflake, actor: &Actor) -> ServiceResult<ExpertRatingResponse> {
        let review = self
            .ctx
            .review_repo()
            .find_by_id(review_id)
            .await?
            .ok_or(DomainError::ReviewNotFound(review_id))?;
        if !actor.is(review.author_id, ActorRole::Client) {
            return Err(DomainError::NotReviewAuthor.into());
        }

        let rating = self.ctx.review_repo().delete_with_rating(&review).await?;

        info!(
            review_id = %review_id,
            expert_id = %review.expert_id,
            rating = rating.rating(),
            review_count = rating.review_count(),
            "Review deleted"
        );

        Ok(ExpertRatingResponse::from(rating))
    }

    /// Public rating of an expert
    #[instrument(skip(self))]
    pub async fn expert_rating(&self, expert_id: Snowflake) -> ServiceResult<ExpertRatingResponse> {
        let member = self
            .ctx
            .member_repo()
            .find_by_id(expert_id)
            .await?
            .ok_or(DomainError::MemberNotFound(expert_id))?;
        if member.is_client() {
            return Err(DomainError::MemberNotFound(expert_id).into());
        }

        let rating = self.ctx.review_repo().expert_rating(expert_id).await?;
        Ok(ExpertRatingResponse::from(rating))
    }
}
