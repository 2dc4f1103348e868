//! Scripted in-process gateway
//!
//! Each operation answers from its own queue of scripted results and falls
//! back to success once the queue is empty. Every call is recorded in order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use matching_core::{
    ApproveRequest, CancelRequest, GatewayPaymentState, GatewayResult, PaymentGateway,
    ReadyRequest, ReadySession,
};
use tokio::sync::Mutex;

/// A call received by [`RecordingGateway`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Ready(ReadyRequest),
    Approve(ApproveRequest),
    Cancel(CancelRequest),
    Inquire(String),
}

#[derive(Default)]
struct Script {
    calls: Vec<GatewayCall>,
    ready: VecDeque<GatewayResult<ReadySession>>,
    approve: VecDeque<GatewayResult<()>>,
    cancel: VecDeque<GatewayResult<()>>,
    inquire: VecDeque<GatewayResult<GatewayPaymentState>>,
}

#[derive(Default, Clone)]
pub struct RecordingGateway {
    script: Arc<Mutex<Script>>,
    sessions: Arc<AtomicU64>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn script_ready(&self, result: GatewayResult<ReadySession>) {
        self.script.lock().await.ready.push_back(result);
    }

    pub async fn script_approve(&self, result: GatewayResult<()>) {
        self.script.lock().await.approve.push_back(result);
    }

    pub async fn script_cancel(&self, result: GatewayResult<()>) {
        self.script.lock().await.cancel.push_back(result);
    }

    /// Unscripted inquiries answer `Ready`
    pub async fn script_inquire(&self, result: GatewayResult<GatewayPaymentState>) {
        self.script.lock().await.inquire.push_back(result);
    }

    /// Every call so far, oldest first
    pub async fn calls(&self) -> Vec<GatewayCall> {
        self.script.lock().await.calls.clone()
    }

    pub async fn approve_calls(&self) -> Vec<ApproveRequest> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::Approve(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub async fn cancel_calls(&self) -> Vec<CancelRequest> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::Cancel(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    fn next_session(&self) -> ReadySession {
        let n = self.sessions.fetch_add(1, Ordering::Relaxed) + 1;
        ReadySession {
            transaction_id: format!("T{n}"),
            redirect_url: format!("https://pg.test/redirect/T{n}"),
        }
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn ready(&self, request: &ReadyRequest) -> GatewayResult<ReadySession> {
        let mut script = self.script.lock().await;
        script.calls.push(GatewayCall::Ready(request.clone()));
        script
            .ready
            .pop_front()
            .unwrap_or_else(|| Ok(self.next_session()))
    }

    async fn approve(&self, request: &ApproveRequest) -> GatewayResult<()> {
        let mut script = self.script.lock().await;
        script.calls.push(GatewayCall::Approve(request.clone()));
        script.approve.pop_front().unwrap_or(Ok(()))
    }

    async fn cancel(&self, request: &CancelRequest) -> GatewayResult<()> {
        let mut script = self.script.lock().await;
        script.calls.push(GatewayCall::Cancel(request.clone()));
        script.cancel.pop_front().unwrap_or(Ok(()))
    }

    async fn inquire(&self, transaction_id: &str) -> GatewayResult<GatewayPaymentState> {
        let mut script = self.script.lock().await;
        script.calls.push(GatewayCall::Inquire(transaction_id.to_string()));
        script
            .inquire
            .pop_front()
            .unwrap_or(Ok(GatewayPaymentState::Ready))
    }
}
