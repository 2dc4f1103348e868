//! Entity to DTO mappers
//!
//! Implements `From` conversions from domain entities to response DTOs.

use matching_core::entities::{Engagement, Estimate, Payment, Review};
use matching_core::ExpertRating;

use super::responses::{
    EngagementResponse, EstimateOptionResponse, EstimateResponse, ExpertRatingResponse,
    PaymentResponse, ReviewResponse, SettlementResponse,
};
use crate::services::SettlementResult;

// ============================================================================
// Engagement Mappers
// ============================================================================

impl From<&Engagement> for EngagementResponse {
    fn from(engagement: &Engagement) -> Self {
        Self {
            id: engagement.id.to_string(),
            client_id: engagement.client_id.to_string(),
            expert_id: engagement.expert_id.to_string(),
            offer_id: engagement.offer_id.to_string(),
            status: engagement.status.as_str().to_string(),
            work_started_at: engagement.work_started_at,
            work_ended_at: engagement.work_ended_at,
            cancel_reason: engagement.cancel_reason.clone(),
            created_at: engagement.created_at,
            updated_at: engagement.updated_at,
        }
    }
}

impl From<Engagement> for EngagementResponse {
    fn from(engagement: Engagement) -> Self {
        Self::from(&engagement)
    }
}

// ============================================================================
// Estimate Mappers
// ============================================================================

impl From<&Estimate> for EstimateResponse {
    fn from(estimate: &Estimate) -> Self {
        Self {
            id: estimate.id.to_string(),
            engagement_id: estimate.engagement_id.to_string(),
            item_name: estimate.item_name.clone(),
            base_price: estimate.base_price.amount(),
            total: estimate.total.amount(),
            options: estimate
                .options
                .iter()
                .map(|o| EstimateOptionResponse {
                    option_id: o.option_id.to_string(),
                    name: o.name.clone(),
                    price: o.price.amount(),
                })
                .collect(),
            created_at: estimate.created_at,
        }
    }
}

impl From<Estimate> for EstimateResponse {
    fn from(estimate: Estimate) -> Self {
        Self::from(&estimate)
    }
}

// ============================================================================
// Payment Mappers
// ============================================================================

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id.to_string(),
            engagement_id: payment.engagement_id.to_string(),
            cost: payment.cost.amount(),
            status: payment.status.as_str().to_string(),
            transaction_id: payment.transaction_id.clone(),
            created_at: payment.created_at,
            updated_at: payment.updated_at,
        }
    }
}

impl From<SettlementResult> for SettlementResponse {
    fn from(result: SettlementResult) -> Self {
        Self {
            outcome: result.outcome.as_str().to_string(),
            payment: PaymentResponse::from(&result.payment),
            engagement_status: result.engagement_status.as_str().to_string(),
        }
    }
}

// ============================================================================
// Review Mappers
// ============================================================================

impl From<&Review> for ReviewResponse {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id.to_string(),
            engagement_id: review.engagement_id.to_string(),
            expert_id: review.expert_id.to_string(),
            author_id: review.author_id.to_string(),
            score: review.score.value(),
            content: review.content.clone(),
            created_at: review.created_at,
        }
    }
}

impl From<ExpertRating> for ExpertRatingResponse {
    fn from(rating: ExpertRating) -> Self {
        Self {
            expert_id: rating.expert_id.to_string(),
            rating: rating.rating(),
            review_count: rating.review_count(),
        }
    }
}
