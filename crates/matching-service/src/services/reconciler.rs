//! Reconciliation sweep
//!
//! Payments can stay `NOT_PAID` when the payer never comes back through a
//! gateway redirect, or when a callback failed halfway. The sweep asks the
//! gateway about every such payment older than the grace period and
//! records whatever the gateway knows.

use std::sync::Arc;

use chrono::Utc;
use matching_core::{DomainError, GatewayPaymentState, Payment, PaymentStatus};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::settlement::SettlementService;

/// Result of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Stale payments looked at
    pub examined: usize,
    /// Recorded as `PAID`
    pub settled: usize,
    /// Closed as `CANCELLED` or `FAILED`
    pub closed: usize,
    /// Still open at the gateway
    pub pending: usize,
    pub errors: usize,
}

enum Resolution {
    Settled,
    Closed,
    Pending,
}

/// Periodic reconciler; owns its context so it can run as a spawned task
pub struct Reconciler {
    ctx: Arc<ServiceContext>,
}

impl Reconciler {
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Sweep until `shutdown` flips to `true`
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let period = self.ctx.settings().reconcile_interval;
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = period.as_secs(), "Payment reconciler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.sweep_once().await {
                        Ok(report) if report.examined > 0 => info!(?report, "Reconciliation sweep finished"),
                        Ok(_) => debug!("Nothing to reconcile"),
                        Err(e) => warn!(error = %e, "Reconciliation sweep failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Payment reconciler stopped");
    }

    /// One pass over the stale unpaid payments. A failure on one payment is
    /// counted and logged; the rest of the batch still runs.
    #[instrument(skip(self))]
    pub async fn sweep_once(&self) -> ServiceResult<SweepReport> {
        let settings = self.ctx.settings();
        let cutoff = Utc::now() - settings.reconcile_grace;
        let stale = self
            .ctx
            .payment_repo()
            .find_stale_unpaid(cutoff, settings.reconcile_batch_size)
            .await?;

        let mut report = SweepReport::default();
        for payment in &stale {
            report.examined += 1;
            match self.reconcile(payment).await {
                Ok(Resolution::Settled) => report.settled += 1,
                Ok(Resolution::Closed) => report.closed += 1,
                Ok(Resolution::Pending) => report.pending += 1,
                Err(e) => {
                    report.errors += 1;
                    warn!(payment_id = %payment.id, error = %e, "Could not reconcile payment");
                }
            }
        }

        Ok(report)
    }

    async fn reconcile(&self, payment: &Payment) -> ServiceResult<Resolution> {
        let state = self
            .ctx
            .gateway()
            .inquire(&payment.transaction_id)
            .await
            .map_err(DomainError::Gateway)?;

        let closed_as = match state {
            GatewayPaymentState::Ready => return Ok(Resolution::Pending),
            GatewayPaymentState::Approved => {
                return match SettlementService::new(&self.ctx).confirm_captured(payment).await {
                    Ok(_) => Ok(Resolution::Settled),
                    // the capture was cancelled again at the gateway
                    Err(ServiceError::Domain(e))
                        if e.is_invalid_transition() || matches!(e, DomainError::AlreadyPaid) =>
                    {
                        Ok(Resolution::Closed)
                    }
                    Err(e) => Err(e),
                };
            }
            GatewayPaymentState::Cancelled => PaymentStatus::Cancelled,
            GatewayPaymentState::Failed | GatewayPaymentState::Expired => PaymentStatus::Failed,
        };

        if self
            .ctx
            .payment_repo()
            .update_status_if(payment.id, PaymentStatus::NotPaid, closed_as)
            .await?
        {
            info!(payment_id = %payment.id, status = %closed_as, "Stale payment closed");
        }
        Ok(Resolution::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use matching_core::{
        ApproveRequest, CancelRequest, EngagementStatus, GatewayError, GatewayResult,
        PaymentGateway, PaymentRepository, ReadyRequest, ReadySession, Snowflake,
    };
    use matching_db::InMemoryStore;
    use matching_payment::RecordingGateway;

    use crate::services::testing::{client, domain, expert, Harness};

    async fn stale_payment(h: &Harness) -> (Snowflake, Payment) {
        let id = h.accepted().await;
        h.estimate(id).await;
        h.settlement().prepare(id, &client()).await.unwrap();
        let payment = h.store.payments(id).await.remove(0);
        h.store
            .set_payment_created_at(payment.id, Utc::now() - chrono::Duration::hours(1))
            .await;
        (id, payment)
    }

    fn reconciler(h: &Harness) -> Reconciler {
        let ctx = crate::ServiceContextBuilder::new()
            .in_memory(h.store.clone())
            .gateway(Arc::new(h.gateway.clone()))
            .build()
            .unwrap();
        Reconciler::new(Arc::new(ctx))
    }

    #[tokio::test]
    async fn test_approved_payment_is_settled() {
        let h = Harness::new().await;
        let (id, _) = stale_payment(&h).await;
        h.gateway.script_inquire(Ok(GatewayPaymentState::Approved)).await;

        let report = reconciler(&h).sweep_once().await.unwrap();
        assert_eq!(
            report,
            SweepReport {
                examined: 1,
                settled: 1,
                ..SweepReport::default()
            }
        );
        assert_eq!(h.store.payments(id).await[0].status, PaymentStatus::Paid);
        assert_eq!(h.status(id).await, EngagementStatus::Accepted);
    }

    #[tokio::test]
    async fn test_gateway_outcomes_close_payments() {
        let h = Harness::new().await;
        let (first, _) = stale_payment(&h).await;
        h.gateway.script_inquire(Ok(GatewayPaymentState::Expired)).await;

        let report = reconciler(&h).sweep_once().await.unwrap();
        assert_eq!(report.closed, 1);
        assert_eq!(h.store.payments(first).await[0].status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn test_fresh_payments_are_left_alone() {
        let h = Harness::new().await;
        let id = h.accepted().await;
        h.estimate(id).await;
        h.settlement().prepare(id, &client()).await.unwrap();

        let report = reconciler(&h).sweep_once().await.unwrap();
        assert_eq!(report, SweepReport::default());
        assert!(h
            .gateway
            .calls()
            .await
            .iter()
            .all(|c| !matches!(c, matching_payment::GatewayCall::Inquire(_))));
    }

    #[tokio::test]
    async fn test_ready_stays_pending_and_errors_do_not_abort() {
        let h = Harness::new().await;
        let (id, _) = stale_payment(&h).await;
        h.gateway
            .script_inquire(Err(GatewayError::Unavailable(503)))
            .await;

        let report = reconciler(&h).sweep_once().await.unwrap();
        assert_eq!(report.errors, 1);
        assert_eq!(h.store.payments(id).await[0].status, PaymentStatus::NotPaid);

        // unscripted inquiries answer READY
        let report = reconciler(&h).sweep_once().await.unwrap();
        assert_eq!(report.pending, 1);
    }

    #[tokio::test]
    async fn test_capture_after_work_started_is_refunded() {
        let h = Harness::new().await;
        let (id, payment) = stale_payment(&h).await;

        // work moved on without the payment; capture can no longer be recorded
        h.matching().start_work(id, &expert()).await.unwrap();
        h.gateway.script_inquire(Ok(GatewayPaymentState::Approved)).await;

        let report = reconciler(&h).sweep_once().await.unwrap();
        assert_eq!(report.closed, 1);
        assert_eq!(h.store.payments(id).await[0].status, PaymentStatus::Cancelled);

        let refunds = h.gateway.cancel_calls().await;
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds[0].transaction_id, payment.transaction_id);
    }

    /// Closes the session as an abandoned redirect while reporting it captured
    struct AbandoningGateway {
        inner: RecordingGateway,
        store: InMemoryStore,
    }

    #[async_trait]
    impl PaymentGateway for AbandoningGateway {
        async fn ready(&self, request: &ReadyRequest) -> GatewayResult<ReadySession> {
            self.inner.ready(request).await
        }

        async fn approve(&self, request: &ApproveRequest) -> GatewayResult<()> {
            self.inner.approve(request).await
        }

        async fn cancel(&self, request: &CancelRequest) -> GatewayResult<()> {
            self.inner.cancel(request).await
        }

        async fn inquire(&self, transaction_id: &str) -> GatewayResult<GatewayPaymentState> {
            self.inner.inquire(transaction_id).await?;
            let open = PaymentRepository::find_stale_unpaid(&self.store, Utc::now(), 10)
                .await
                .unwrap();
            for payment in open.iter().filter(|p| p.transaction_id == transaction_id) {
                PaymentRepository::update_status_if(
                    &self.store,
                    payment.id,
                    PaymentStatus::NotPaid,
                    PaymentStatus::Cancelled,
                )
                .await
                .unwrap();
            }
            Ok(GatewayPaymentState::Approved)
        }
    }

    #[tokio::test]
    async fn test_capture_of_abandoned_payment_is_refunded() {
        let h = Harness::new().await;
        let (id, payment) = stale_payment(&h).await;
        let ctx = crate::ServiceContextBuilder::new()
            .in_memory(h.store.clone())
            .gateway(Arc::new(AbandoningGateway {
                inner: h.gateway.clone(),
                store: h.store.clone(),
            }))
            .build()
            .unwrap();

        let report = Reconciler::new(Arc::new(ctx)).sweep_once().await.unwrap();
        assert_eq!(report.closed, 1);
        assert_eq!(report.errors, 0);

        let refunds = h.gateway.cancel_calls().await;
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds[0].transaction_id, payment.transaction_id);
        assert_eq!(h.store.payments(id).await[0].status, PaymentStatus::Cancelled);
        assert_eq!(h.status(id).await, EngagementStatus::Accepted);
    }

    #[tokio::test]
    async fn test_older_session_captured_after_newer_one_opened() {
        let h = Harness::new().await;
        let (id, older) = stale_payment(&h).await;
        h.settlement().prepare(id, &client()).await.unwrap();
        h.gateway.script_inquire(Ok(GatewayPaymentState::Approved)).await;

        let report = reconciler(&h).sweep_once().await.unwrap();
        assert_eq!(report.settled, 1);

        let err = h.settlement().prepare(id, &client()).await.unwrap_err();
        assert!(matches!(domain(err), DomainError::AlreadyPaid));
        h.settlement().abandon(id).await.unwrap();

        h.matching()
            .cancel(id, &client(), "plans changed".to_string())
            .await
            .unwrap();

        let refunds = h.gateway.cancel_calls().await;
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds[0].transaction_id, older.transaction_id);
        assert_eq!(refunds[0].amount, older.cost);

        let statuses: Vec<_> = h.store.payments(id).await.iter().map(|p| p.status).collect();
        assert_eq!(statuses, vec![PaymentStatus::Cancelled, PaymentStatus::Cancelled]);
        assert_eq!(h.status(id).await, EngagementStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let h = Harness::new().await;
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(reconciler(&h).run(rx));

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
    }
}
