//! Payment model -> entity mapper

use matching_core::entities::Payment;
use matching_core::error::DomainError;
use matching_core::value_objects::{Money, Snowflake};

use crate::models::PaymentModel;

impl TryFrom<PaymentModel> for Payment {
    type Error = DomainError;

    fn try_from(model: PaymentModel) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: Snowflake::new(model.id),
            engagement_id: Snowflake::new(model.engagement_id),
            cost: Money::new(model.cost)?,
            status: model.status.parse()?,
            transaction_id: model.transaction_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
