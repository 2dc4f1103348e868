//! Axum extractors for request handling
//!
//! Custom extractors for authentication, path and query parameters, and
//! validated bodies. Every rejection is an [`ApiError`](crate::response::ApiError)
//! so clients always see the same error body.

mod auth;
mod path;
mod query;
mod validated;

pub use auth::AuthUser;
pub use path::SnowflakePath;
pub use query::CallbackParams;
pub use validated::ValidatedJson;
