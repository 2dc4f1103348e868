//! Estimate - immutable price snapshot of a catalog selection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::entities::CatalogOffer;
use crate::error::DomainError;
use crate::value_objects::{Money, Snowflake};

/// How option ids that do not belong to the offer are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatePolicy {
    /// Reject the whole selection (`true`) or silently drop them (`false`)
    pub reject_unknown_options: bool,
}

impl Default for EstimatePolicy {
    fn default() -> Self {
        Self {
            reject_unknown_options: true,
        }
    }
}

/// Copy of a selected option, frozen at estimate time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateOption {
    pub option_id: Snowflake,
    pub name: String,
    pub price: Money,
}

/// Estimate entity. Never mutated after it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Estimate {
    pub id: Snowflake,
    pub engagement_id: Snowflake,
    /// Offer title at estimate time, used as the gateway item name
    pub item_name: String,
    pub base_price: Money,
    pub total: Money,
    pub options: Vec<EstimateOption>,
    pub created_at: DateTime<Utc>,
}

impl Estimate {
    /// Freeze `offer`'s current prices for the selected option ids.
    ///
    /// `total = base price + sum of the resolved options' additional prices`.
    /// Option copies keep the order of `selected`.
    pub fn snapshot(
        id: Snowflake,
        engagement_id: Snowflake,
        offer: &CatalogOffer,
        selected: &[Snowflake],
        policy: EstimatePolicy,
    ) -> Result<Self, DomainError> {
        let mut seen = HashSet::with_capacity(selected.len());
        let mut unknown = Vec::new();
        let mut options = Vec::with_capacity(selected.len());
        let mut total = offer.base_price;

        for &option_id in selected {
            if !seen.insert(option_id) {
                return Err(DomainError::DuplicateOption(option_id));
            }
            match offer.option(option_id) {
                Some(option) => {
                    total = total.checked_add(option.additional_price)?;
                    options.push(EstimateOption {
                        option_id,
                        name: option.name.clone(),
                        price: option.additional_price,
                    });
                }
                None => unknown.push(option_id),
            }
        }

        if policy.reject_unknown_options && !unknown.is_empty() {
            return Err(DomainError::UnknownOptions(unknown));
        }

        Ok(Self {
            id,
            engagement_id,
            item_name: offer.title.clone(),
            base_price: offer.base_price,
            total,
            options,
            created_at: Utc::now(),
        })
    }
}
