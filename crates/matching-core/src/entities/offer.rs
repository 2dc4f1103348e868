//! Catalog offer - an expert's service listing (read-only to this engine)

use chrono::{DateTime, Utc};

use crate::value_objects::{Money, Snowflake};

/// Selectable add-on of an offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferOption {
    pub id: Snowflake,
    pub name: String,
    pub additional_price: Money,
}

/// Catalog offer entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogOffer {
    pub id: Snowflake,
    pub expert_id: Snowflake,
    pub title: String,
    pub base_price: Money,
    pub options: Vec<OfferOption>,
    pub updated_at: DateTime<Utc>,
}

impl CatalogOffer {
    pub fn new(id: Snowflake, expert_id: Snowflake, title: impl Into<String>, base_price: Money) -> Self {
        Self {
            id,
            expert_id,
            title: title.into(),
            base_price,
            options: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Add a selectable option
    pub fn with_option(mut self, id: Snowflake, name: impl Into<String>, additional_price: Money) -> Self {
        self.options.push(OfferOption {
            id,
            name: name.into(),
            additional_price,
        });
        self
    }

    /// Look up an option by id
    pub fn option(&self, id: Snowflake) -> Option<&OfferOption> {
        self.options.iter().find(|o| o.id == id)
    }
}
