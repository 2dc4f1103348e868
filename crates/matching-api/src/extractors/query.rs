//! Query string extractor for gateway redirects

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::response::ApiError;

/// Gateway callback parameters (`engagement_id`, `pg_token`)
#[derive(Debug, Clone)]
pub struct CallbackParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for CallbackParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(inner) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_query(e.body_text()))?;

        Ok(CallbackParams(inner))
    }
}
