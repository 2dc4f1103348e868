//! Gateway wire format (camelCase JSON)

use matching_core::GatewayPaymentState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReadyBody<'a> {
    pub merchant_id: &'a str,
    pub order_id: String,
    pub payer_id: String,
    pub item_name: &'a str,
    pub amount: i64,
    pub approval_url: &'a str,
    pub cancel_url: &'a str,
    pub fail_url: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReadyReply {
    pub transaction_id: String,
    pub redirect_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApproveBody<'a> {
    pub merchant_id: &'a str,
    pub transaction_id: &'a str,
    pub order_id: String,
    pub payer_id: String,
    pub approval_token: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CancelBody<'a> {
    pub merchant_id: &'a str,
    pub transaction_id: &'a str,
    pub cancel_amount: i64,
    pub reason: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderBody<'a> {
    pub merchant_id: &'a str,
    pub transaction_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderReply {
    #[allow(dead_code)]
    pub transaction_id: String,
    pub status: WireState,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum WireState {
    Ready,
    Approved,
    Cancelled,
    Failed,
    Expired,
}

impl From<WireState> for GatewayPaymentState {
    fn from(state: WireState) -> Self {
        match state {
            WireState::Ready => Self::Ready,
            WireState::Approved => Self::Approved,
            WireState::Cancelled => Self::Cancelled,
            WireState::Failed => Self::Failed,
            WireState::Expired => Self::Expired,
        }
    }
}

/// Error payload returned with non-2xx statuses
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorReply {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
