//! Review and rating model -> entity mappers

use matching_core::entities::Review;
use matching_core::error::DomainError;
use matching_core::value_objects::{ExpertRating, Score, Snowflake};

use crate::models::{ExpertRatingModel, ReviewModel};

impl TryFrom<ReviewModel> for Review {
    type Error = DomainError;

    fn try_from(model: ReviewModel) -> Result<Self, Self::Error> {
        Ok(Review {
            id: Snowflake::new(model.id),
            engagement_id: Snowflake::new(model.engagement_id),
            expert_id: Snowflake::new(model.expert_id),
            author_id: Snowflake::new(model.author_id),
            score: Score::new(i32::from(model.score))?,
            content: model.content,
            created_at: model.created_at,
        })
    }
}

impl From<ExpertRatingModel> for ExpertRating {
    fn from(model: ExpertRatingModel) -> Self {
        ExpertRating::from_parts(
            Snowflake::new(model.expert_id),
            model.rating_sum,
            model.review_count,
        )
    }
}
