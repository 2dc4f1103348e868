//! Offer models -> entity mapper

use matching_core::entities::{CatalogOffer, OfferOption};
use matching_core::error::DomainError;
use matching_core::value_objects::{Money, Snowflake};

use crate::models::{OfferModel, OfferOptionModel};

/// Assemble an offer from its row and its option rows
pub fn offer_from_rows(
    model: OfferModel,
    options: Vec<OfferOptionModel>,
) -> Result<CatalogOffer, DomainError> {
    let options = options
        .into_iter()
        .map(|o| {
            Ok(OfferOption {
                id: Snowflake::new(o.id),
                name: o.name,
                additional_price: Money::new(o.additional_price)?,
            })
        })
        .collect::<Result<Vec<_>, DomainError>>()?;

    Ok(CatalogOffer {
        id: Snowflake::new(model.id),
        expert_id: Snowflake::new(model.expert_id),
        title: model.title,
        base_price: Money::new(model.base_price)?,
        options,
        updated_at: model.updated_at,
    })
}
