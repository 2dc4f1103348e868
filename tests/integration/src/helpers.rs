//! Test helpers for integration tests
//!
//! Provides the in-process test server, HTTP shortcuts and response
//! assertions.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use matching_api::middleware::apply_middleware;
use matching_api::routes::{create_router, health_routes};
use matching_api::AppState;
use matching_common::JwtService;
use matching_core::Actor;
use matching_db::{apply_schema, PgPool};
use matching_payment::RecordingGateway;
use matching_service::ServiceContextBuilder;
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub pool: PgPool,
    /// The gateway the server talks to; scripted and inspected by tests
    pub gateway: RecordingGateway,
    jwt: JwtService,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server on an ephemeral port
    pub async fn start() -> Result<Self> {
        dotenvy::dotenv().ok();
        let database_url = std::env::var("DATABASE_URL")?;
        let secret = std::env::var("JWT_SECRET")?;

        let pool = PgPool::connect(&database_url).await?;
        apply_schema(&pool).await?;

        let gateway = RecordingGateway::new();
        let ctx = ServiceContextBuilder::new()
            .postgres(pool.clone())
            .gateway(Arc::new(gateway.clone()))
            .build()
            .map_err(|e| anyhow::anyhow!("{e}"))?;
        let jwt = JwtService::new(&secret);
        let state = AppState::new(Arc::new(ctx), jwt.clone());

        let app = apply_middleware(create_router())
            .merge(apply_middleware(health_routes()))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            pool,
            gateway,
            jwt,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Bearer token for `actor`
    pub fn token(&self, actor: Actor) -> String {
        self.jwt
            .issue(actor, 3600)
            .unwrap_or_else(|e| panic!("failed to issue token: {e}"))
    }

    /// GET without a token (health, gateway callbacks, ratings)
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    pub async fn get_as(&self, path: &str, actor: Actor) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self
            .client
            .get(&url)
            .bearer_auth(self.token(actor))
            .send()
            .await?)
    }

    /// POST a JSON body as `actor`
    pub async fn post_as<T: Serialize>(&self, path: &str, actor: Actor, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self
            .client
            .post(&url)
            .bearer_auth(self.token(actor))
            .json(body)
            .send()
            .await?)
    }

    /// POST without a body as `actor`
    pub async fn post_empty_as(&self, path: &str, actor: Actor) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self
            .client
            .post(&url)
            .bearer_auth(self.token(actor))
            .send()
            .await?)
    }

    pub async fn delete_as(&self, path: &str, actor: Actor) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self
            .client
            .delete(&url)
            .bearer_auth(self.token(actor))
            .send()
            .await?)
    }
}

/// The suite needs PostgreSQL and a signing secret
pub fn check_test_env() -> bool {
    dotenvy::dotenv().ok();

    for var in ["DATABASE_URL", "JWT_SECRET"] {
        if std::env::var(var).is_err() {
            eprintln!("Skipping test: {var} not set");
            return false;
        }
    }

    true
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(response: Response, expected_status: StatusCode) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(())
}
