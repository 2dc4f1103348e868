//! Payment gateway port

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::value_objects::{Money, Snowflake};

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Open a payment session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyRequest {
    pub order_id: Snowflake,
    pub payer_id: Snowflake,
    pub item_name: String,
    pub amount: Money,
    pub approval_url: String,
    pub cancel_url: String,
    pub fail_url: String,
    pub idempotency_key: String,
}

/// An opened session: where to send the payer, and the reference to settle it by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadySession {
    pub transaction_id: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveRequest {
    pub transaction_id: String,
    pub order_id: Snowflake,
    pub payer_id: Snowflake,
    pub approval_token: String,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelRequest {
    pub transaction_id: String,
    pub amount: Money,
    pub reason: String,
    pub idempotency_key: String,
}

/// What the gateway knows about a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayPaymentState {
    /// Session open, payer has not approved yet
    Ready,
    Approved,
    Cancelled,
    Failed,
    Expired,
}

/// External payment processor
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a session for `amount`
    async fn ready(&self, request: &ReadyRequest) -> GatewayResult<ReadySession>;

    /// Capture an approved session
    async fn approve(&self, request: &ApproveRequest) -> GatewayResult<()>;

    /// Cancel (refund) a transaction for `amount`
    async fn cancel(&self, request: &CancelRequest) -> GatewayResult<()>;

    /// Query the current state of a transaction
    async fn inquire(&self, transaction_id: &str) -> GatewayResult<GatewayPaymentState>;
}
