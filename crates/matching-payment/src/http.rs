//! HTTP payment gateway client

use async_trait::async_trait;
use matching_common::PaymentConfig;
use matching_core::{
    ApproveRequest, CancelRequest, GatewayError, GatewayPaymentState, GatewayResult,
    PaymentGateway, ReadyRequest, ReadySession,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, instrument};

use crate::protocol::{
    ApproveBody, CancelBody, ErrorReply, OrderBody, OrderReply, ReadyBody, ReadyReply,
};

const IDEMPOTENCY_KEY: &str = "Idempotency-Key";

/// [`PaymentGateway`] over JSON/HTTP.
///
/// Every call is bounded by the configured timeout. A timeout never tells us
/// whether the gateway acted, so it is reported as [`GatewayError::Timeout`]
/// and the payment is left as it was.
#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: Client,
    base_url: String,
    merchant_id: String,
    authorization: String,
}

impl HttpPaymentGateway {
    /// Build a client from the payment section of the configuration
    pub fn new(config: &PaymentConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            merchant_id: config.merchant_id.clone(),
            authorization: format!("SECRET_KEY {}", config.secret_key),
        })
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> RequestBuilder {
        self.client
            .post(format!("{}{path}", self.base_url))
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .json(body)
    }

    /// Send and map transport failures and non-2xx statuses
    async fn send(&self, request: RequestBuilder) -> GatewayResult<Response> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status.is_server_error() {
            return Err(GatewayError::Unavailable(status.as_u16()));
        }

        let text = response.text().await.unwrap_or_default();
        let reply = serde_json::from_str::<ErrorReply>(&text).ok();
        let (code, message) = match reply {
            Some(ErrorReply { code, message }) => (
                code.unwrap_or_else(|| "UNKNOWN".to_string()),
                message.unwrap_or_default(),
            ),
            None => ("UNKNOWN".to_string(), text),
        };
        Err(GatewayError::Rejected {
            status: status.as_u16(),
            code,
            message,
        })
    }

    /// Send and decode a JSON reply
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> GatewayResult<T> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await.map_err(transport_error)?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Transport(e.to_string())
    }
}

fn logged<T>(operation: &'static str, result: GatewayResult<T>) -> GatewayResult<T> {
    if let Err(e) = &result {
        error!(operation, code = e.code(), error = %e, "Payment gateway call failed");
    }
    result
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[instrument(skip(self, request), fields(order_id = %request.order_id, amount = %request.amount))]
    async fn ready(&self, request: &ReadyRequest) -> GatewayResult<ReadySession> {
        let body = ReadyBody {
            merchant_id: &self.merchant_id,
            order_id: request.order_id.to_string(),
            payer_id: request.payer_id.to_string(),
            item_name: &request.item_name,
            amount: request.amount.amount(),
            approval_url: &request.approval_url,
            cancel_url: &request.cancel_url,
            fail_url: &request.fail_url,
        };
        let call = self
            .post("/payment/ready", &body)
            .header(IDEMPOTENCY_KEY, &request.idempotency_key);

        let result = self.fetch::<ReadyReply>(call).await.map(|reply| {
            debug!(transaction_id = %reply.transaction_id, "Payment session opened");
            ReadySession {
                transaction_id: reply.transaction_id,
                redirect_url: reply.redirect_url,
            }
        });
        logged("ready", result)
    }

    #[instrument(skip(self, request), fields(transaction_id = %request.transaction_id))]
    async fn approve(&self, request: &ApproveRequest) -> GatewayResult<()> {
        let body = ApproveBody {
            merchant_id: &self.merchant_id,
            transaction_id: &request.transaction_id,
            order_id: request.order_id.to_string(),
            payer_id: request.payer_id.to_string(),
            approval_token: &request.approval_token,
        };
        let call = self
            .post("/payment/approve", &body)
            .header(IDEMPOTENCY_KEY, &request.idempotency_key);

        logged("approve", self.send(call).await.map(|_| ()))
    }

    #[instrument(skip(self, request), fields(transaction_id = %request.transaction_id, amount = %request.amount))]
    async fn cancel(&self, request: &CancelRequest) -> GatewayResult<()> {
        let body = CancelBody {
            merchant_id: &self.merchant_id,
            transaction_id: &request.transaction_id,
            cancel_amount: request.amount.amount(),
            reason: &request.reason,
        };
        let call = self
            .post("/payment/cancel", &body)
            .header(IDEMPOTENCY_KEY, &request.idempotency_key);

        logged("cancel", self.send(call).await.map(|_| ()))
    }

    #[instrument(skip(self))]
    async fn inquire(&self, transaction_id: &str) -> GatewayResult<GatewayPaymentState> {
        let body = OrderBody {
            merchant_id: &self.merchant_id,
            transaction_id,
        };
        let call = self.post("/payment/order", &body);

        let result = self
            .fetch::<OrderReply>(call)
            .await
            .map(|reply| GatewayPaymentState::from(reply.status));
        logged("inquire", result)
    }
}

impl std::fmt::Debug for HttpPaymentGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPaymentGateway")
            .field("base_url", &self.base_url)
            .field("merchant_id", &self.merchant_id)
            .finish_non_exhaustive()
    }
}
