//! Engagement model -> entity mapper

use matching_core::entities::Engagement;
use matching_core::error::DomainError;
use matching_core::value_objects::Snowflake;

use crate::models::EngagementModel;

impl TryFrom<EngagementModel> for Engagement {
    type Error = DomainError;

    fn try_from(model: EngagementModel) -> Result<Self, Self::Error> {
        Ok(Engagement {
            id: Snowflake::new(model.id),
            client_id: Snowflake::new(model.client_id),
            expert_id: Snowflake::new(model.expert_id),
            offer_id: Snowflake::new(model.offer_id),
            status: model.status.parse()?,
            work_started_at: model.work_started_at,
            work_ended_at: model.work_ended_at,
            cancel_reason: model.cancel_reason,
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
