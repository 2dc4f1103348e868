//! Estimate models -> entity mapper

use matching_core::entities::{Estimate, EstimateOption};
use matching_core::error::DomainError;
use matching_core::value_objects::{Money, Snowflake};

use crate::models::{EstimateModel, EstimateOptionModel};

/// Assemble an estimate from its row and its option copy rows (in position order)
pub fn estimate_from_rows(
    model: EstimateModel,
    options: Vec<EstimateOptionModel>,
) -> Result<Estimate, DomainError> {
    let options = options
        .into_iter()
        .map(|o| {
            Ok(EstimateOption {
                option_id: Snowflake::new(o.option_id),
                name: o.name,
                price: Money::new(o.price)?,
            })
        })
        .collect::<Result<Vec<_>, DomainError>>()?;

    Ok(Estimate {
        id: Snowflake::new(model.id),
        engagement_id: Snowflake::new(model.engagement_id),
        item_name: model.item_name,
        base_price: Money::new(model.base_price)?,
        total: Money::new(model.total)?,
        options,
        created_at: model.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_keeps_option_order() {
        let estimate = estimate_from_rows(
            EstimateModel {
                id: 1,
                engagement_id: 2,
                item_name: "Logo".to_string(),
                base_price: 100,
                total: 130,
                created_at: Utc::now(),
            },
            vec![
                EstimateOptionModel {
                    estimate_id: 1,
                    position: 0,
                    option_id: 9,
                    name: "A".to_string(),
                    price: 20,
                },
                EstimateOptionModel {
                    estimate_id: 1,
                    position: 1,
                    option_id: 8,
                    name: "B".to_string(),
                    price: 10,
                },
            ],
        )
        .unwrap();

        assert_eq!(estimate.total.amount(), 130);
        assert_eq!(estimate.options[0].option_id, Snowflake::new(9));
        assert_eq!(estimate.options[1].name, "B");
    }

    #[test]
    fn test_negative_money_is_rejected() {
        let result = estimate_from_rows(
            EstimateModel {
                id: 1,
                engagement_id: 2,
                item_name: "Logo".to_string(),
                base_price: 100,
                total: -1,
                created_at: Utc::now(),
            },
            Vec::new(),
        );
        assert!(result.is_err());
    }
}
