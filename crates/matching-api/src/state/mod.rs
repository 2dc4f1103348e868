//! Application state
//!
//! Holds the shared state for the Axum application: the service context and
//! the token verifier.

use std::sync::Arc;

use matching_common::JwtService;
use matching_service::ServiceContext;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Service context containing all dependencies
    service_context: Arc<ServiceContext>,
    jwt_service: JwtService,
}

impl AppState {
    pub fn new(service_context: Arc<ServiceContext>, jwt_service: JwtService) -> Self {
        Self {
            service_context,
            jwt_service,
        }
    }

    /// Get the service context
    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service_context", &"ServiceContext")
            .field("jwt_service", &self.jwt_service)
            .finish()
    }
}
