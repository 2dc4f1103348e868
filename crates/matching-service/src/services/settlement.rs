//! Settlement service
//!
//! Opens gateway payment sessions for an engagement's estimate and turns
//! gateway outcomes into payment and engagement transitions. A failed
//! gateway call never changes a payment; the caller re-reads and retries.

use chrono::Utc;
use matching_core::{
    Actor, ApproveRequest, CancelRequest, DomainError, Engagement, EngagementEvent,
    EngagementStatus, Payment, PaymentSettlement, PaymentStatus, ReadyRequest, SettlementWrite,
    Snowflake,
};
use tracing::{error, info, instrument, warn};

use crate::dto::{PaymentResponse, PreparePaymentResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::matching::MAX_ATTEMPTS;

const COMPENSATION_REASON: &str = "engagement no longer accepts payment";

/// How a settlement call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// This call moved the payment
    Settled,
    /// The payment was already in the requested end state; nothing changed
    AlreadySettled,
}

impl SettlementOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Settled => "SETTLED",
            Self::AlreadySettled => "ALREADY_SETTLED",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettlementResult {
    pub outcome: SettlementOutcome,
    pub payment: Payment,
    pub engagement_status: EngagementStatus,
}

/// Settlement service
pub struct SettlementService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> SettlementService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Open a gateway session for the engagement's estimate.
    ///
    /// The payment row is only written once the gateway has answered, so a
    /// failed `ready` call leaves nothing behind.
    #[instrument(skip(self, payer), fields(payer_id = %payer.id))]
    pub async fn prepare(
        &self,
        engagement_id: Snowflake,
        payer: &Actor,
    ) -> ServiceResult<PreparePaymentResponse> {
        let engagement = self.load_engagement(engagement_id).await?;
        if !engagement.is_client(payer) {
            return Err(DomainError::PermissionDenied {
                role: payer.role,
                action: "pay for this engagement",
            }
            .into());
        }
        if !matches!(
            engagement.status,
            EngagementStatus::Requested | EngagementStatus::Accepted
        ) {
            return Err(DomainError::InvalidStateTransition {
                from: engagement.status,
                action: "pay for",
            }
            .into());
        }

        let estimate = self
            .ctx
            .estimate_repo()
            .find_by_engagement(engagement_id)
            .await?
            .ok_or(DomainError::EstimateNotFound(engagement_id))?;
        if !estimate.total.is_positive() {
            return Err(DomainError::ValidationError(
                "estimate total must be positive".to_string(),
            )
            .into());
        }

        // an older session may have been captured after a newer one opened
        if self.paid_payment(engagement_id).await?.is_some() {
            return Err(DomainError::AlreadyPaid.into());
        }

        let payment_id = self.ctx.generate_id();
        let request = ReadyRequest {
            order_id: engagement_id,
            payer_id: payer.id,
            item_name: estimate.item_name.clone(),
            amount: estimate.total,
            approval_url: self.callback_url("approve", engagement_id),
            cancel_url: self.callback_url("cancel", engagement_id),
            fail_url: self.callback_url("fail", engagement_id),
            idempotency_key: format!("{payment_id}:ready"),
        };
        let session = self.ctx.gateway().ready(&request).await.map_err(|e| {
            error!(engagement_id = %engagement_id, error = %e, "Gateway ready failed");
            DomainError::Gateway(e)
        })?;

        let payment = Payment::new(
            payment_id,
            engagement_id,
            estimate.total,
            session.transaction_id,
        );
        self.ctx.payment_repo().create(&payment).await?;

        info!(
            engagement_id = %engagement_id,
            payment_id = %payment.id,
            amount = payment.cost.amount(),
            "Payment session opened"
        );

        Ok(PreparePaymentResponse {
            payment_id: payment.id.to_string(),
            redirect_url: session.redirect_url,
        })
    }

    /// Gateway approval redirect: capture the latest payment and confirm the
    /// engagement. A second approval for a paid payment changes nothing.
    #[instrument(skip(self, approval_token))]
    pub async fn approve(
        &self,
        engagement_id: Snowflake,
        approval_token: &str,
    ) -> ServiceResult<SettlementResult> {
        let engagement = self.load_engagement(engagement_id).await?;
        let payment = self.latest_payment(engagement_id).await?;

        if payment.is_paid() {
            info!(payment_id = %payment.id, "Payment already approved");
            return Ok(SettlementResult {
                outcome: SettlementOutcome::AlreadySettled,
                payment,
                engagement_status: engagement.status,
            });
        }
        if payment.status != PaymentStatus::NotPaid {
            return Err(DomainError::InvalidPaymentState {
                status: payment.status,
                action: "approve",
            }
            .into());
        }

        if let Some(paid) = self.paid_payment(engagement_id).await? {
            if paid.id != payment.id {
                return Err(DomainError::AlreadyPaid.into());
            }
            info!(payment_id = %paid.id, "Payment approved by a concurrent call");
            return Ok(SettlementResult {
                outcome: SettlementOutcome::AlreadySettled,
                engagement_status: self.load_engagement(engagement_id).await?.status,
                payment: paid,
            });
        }

        // never capture money the engagement can no longer take
        engagement.apply(&EngagementEvent::PaymentConfirmed, &Actor::system(), Utc::now())?;

        let request = ApproveRequest {
            transaction_id: payment.transaction_id.clone(),
            order_id: engagement_id,
            payer_id: engagement.client_id,
            approval_token: approval_token.to_string(),
            idempotency_key: payment.idempotency_key("approve"),
        };
        self.ctx.gateway().approve(&request).await.map_err(|e| {
            error!(payment_id = %payment.id, error = %e, "Gateway approve failed");
            DomainError::Gateway(e)
        })?;

        self.confirm_captured(&payment).await
    }

    /// Record a payment the gateway has captured: `PAID` together with
    /// `PaymentConfirmed`. If the engagement can no longer take the payment,
    /// another payment already settled it, or the row was closed meanwhile,
    /// the capture is cancelled at the gateway.
    #[instrument(skip(self, payment), fields(payment_id = %payment.id))]
    pub(crate) async fn confirm_captured(&self, payment: &Payment) -> ServiceResult<SettlementResult> {
        let engagement_id = payment.engagement_id;

        for attempt in 1..=MAX_ATTEMPTS {
            let engagement = self.load_engagement(engagement_id).await?;

            if let Some(paid) = self.paid_payment(engagement_id).await? {
                if paid.id != payment.id {
                    return Err(self.compensate(payment, DomainError::AlreadyPaid).await);
                }
            }

            let next = match engagement.apply(
                &EngagementEvent::PaymentConfirmed,
                &Actor::system(),
                Utc::now(),
            ) {
                Ok(next) => next,
                Err(e) => return Err(self.compensate(payment, e).await),
            };

            let write = self
                .ctx
                .payment_repo()
                .settle(PaymentSettlement {
                    payment_id: payment.id,
                    from: PaymentStatus::NotPaid,
                    to: PaymentStatus::Paid,
                    engagement: Some(&next),
                })
                .await?;

            match write {
                SettlementWrite::Applied => {
                    info!(
                        engagement_id = %engagement_id,
                        amount = payment.cost.amount(),
                        engagement_status = %next.status,
                        "Payment settled"
                    );
                    return Ok(SettlementResult {
                        outcome: SettlementOutcome::Settled,
                        payment: self.load_payment(payment.id).await?,
                        engagement_status: next.status,
                    });
                }
                SettlementWrite::PaymentMoved => {
                    let current = self.load_payment(payment.id).await?;
                    if current.is_paid() {
                        info!("Payment settled by a concurrent call");
                        return Ok(SettlementResult {
                            outcome: SettlementOutcome::AlreadySettled,
                            engagement_status: self.load_engagement(engagement_id).await?.status,
                            payment: current,
                        });
                    }
                    // closed by a redirect or a cancel while the capture ran
                    let cause = DomainError::InvalidPaymentState {
                        status: current.status,
                        action: "approve",
                    };
                    return Err(self.compensate(&current, cause).await);
                }
                SettlementWrite::EngagementMoved => {
                    warn!(attempt, "Engagement changed during settlement, retrying");
                }
            }
        }

        Err(DomainError::ConcurrentModification(format!("engagement {engagement_id}")).into())
    }

    /// Cancel the engagement together with its payment. A paid payment is
    /// refunded in full first; otherwise the latest session is just closed.
    #[instrument(skip(self, actor, reason), fields(actor_role = %actor.role))]
    pub async fn cancel(
        &self,
        engagement_id: Snowflake,
        actor: &Actor,
        reason: &str,
    ) -> ServiceResult<SettlementResult> {
        let event = EngagementEvent::cancel(reason);

        for attempt in 1..=MAX_ATTEMPTS {
            let engagement = self.load_engagement(engagement_id).await?;
            let payment = match self.paid_payment(engagement_id).await? {
                Some(paid) => paid,
                None => self.latest_payment(engagement_id).await?,
            };
            engagement.authorize(&event, actor)?;

            if engagement.status == EngagementStatus::Cancelled && !payment.is_paid() {
                return self.close_after_cancel(engagement, payment).await;
            }

            let next = engagement.apply(&event, actor, Utc::now())?;

            let write = match payment.status {
                PaymentStatus::Paid => {
                    self.refund(&payment, reason).await?;
                    let result = self.record_refund(&payment, &event, actor).await;
                    self.close_open_session(engagement_id).await?;
                    return result;
                }
                PaymentStatus::NotPaid => {
                    self.settle_cancel(&payment, PaymentStatus::NotPaid, &next).await?
                }
                _ => {
                    if self.ctx.engagement_repo().update_status(&next).await? {
                        SettlementWrite::Applied
                    } else {
                        SettlementWrite::EngagementMoved
                    }
                }
            };

            if write == SettlementWrite::Applied {
                info!(
                    engagement_id = %engagement_id,
                    payment_id = %payment.id,
                    "Engagement and unpaid payment cancelled"
                );
                return Ok(SettlementResult {
                    outcome: SettlementOutcome::Settled,
                    payment: self.load_payment(payment.id).await?,
                    engagement_status: next.status,
                });
            }

            warn!(attempt, ?write, "Cancellation raced another write, retrying");
        }

        Err(DomainError::ConcurrentModification(format!("engagement {engagement_id}")).into())
    }

    /// Record a refund the gateway has already paid out. The payment always
    /// ends `CANCELLED`; the engagement is cancelled with it when the
    /// transition is still legal, otherwise the transition error is returned.
    async fn record_refund(
        &self,
        payment: &Payment,
        event: &EngagementEvent,
        actor: &Actor,
    ) -> ServiceResult<SettlementResult> {
        let engagement_id = payment.engagement_id;

        for attempt in 1..=MAX_ATTEMPTS {
            let engagement = self.load_engagement(engagement_id).await?;
            let next = match engagement.apply(event, actor, Utc::now()) {
                Ok(next) => next,
                Err(e) => {
                    self.close_refunded(payment).await?;
                    return Err(e.into());
                }
            };

            match self.settle_cancel(payment, PaymentStatus::Paid, &next).await? {
                SettlementWrite::Applied => {
                    info!(
                        engagement_id = %engagement_id,
                        payment_id = %payment.id,
                        amount = payment.cost.amount(),
                        "Engagement cancelled and payment refunded"
                    );
                    return Ok(SettlementResult {
                        outcome: SettlementOutcome::Settled,
                        payment: self.load_payment(payment.id).await?,
                        engagement_status: next.status,
                    });
                }
                SettlementWrite::PaymentMoved => {
                    let current = self.load_payment(payment.id).await?;
                    if current.status == PaymentStatus::Cancelled {
                        return Ok(SettlementResult {
                            outcome: SettlementOutcome::AlreadySettled,
                            engagement_status: self.load_engagement(engagement_id).await?.status,
                            payment: current,
                        });
                    }
                    return Err(DomainError::InvalidPaymentState {
                        status: current.status,
                        action: "cancel",
                    }
                    .into());
                }
                SettlementWrite::EngagementMoved => {
                    warn!(attempt, "Engagement changed after refund, retrying");
                }
            }
        }

        self.close_refunded(payment).await?;
        Err(DomainError::ConcurrentModification(format!("engagement {engagement_id}")).into())
    }

    /// The refund went through but the engagement could not be cancelled
    /// with it
    async fn close_refunded(&self, payment: &Payment) -> ServiceResult<()> {
        let write = self
            .ctx
            .payment_repo()
            .settle(PaymentSettlement {
                payment_id: payment.id,
                from: PaymentStatus::Paid,
                to: PaymentStatus::Cancelled,
                engagement: None,
            })
            .await?;
        warn!(
            payment_id = %payment.id,
            ?write,
            "Refunded payment closed without cancelling the engagement"
        );
        Ok(())
    }

    /// A session opened after the paid one is no longer needed
    async fn close_open_session(&self, engagement_id: Snowflake) -> ServiceResult<()> {
        let latest = self.latest_payment(engagement_id).await?;
        if latest.status == PaymentStatus::NotPaid {
            self.ctx
                .payment_repo()
                .update_status_if(latest.id, PaymentStatus::NotPaid, PaymentStatus::Cancelled)
                .await?;
        }
        Ok(())
    }

    /// The payer left the gateway page without paying
    #[instrument(skip(self))]
    pub async fn abandon(&self, engagement_id: Snowflake) -> ServiceResult<PaymentResponse> {
        self.close_unpaid(engagement_id, PaymentStatus::Cancelled, "abandon")
            .await
    }

    /// The gateway reported a failed payment
    #[instrument(skip(self))]
    pub async fn fail(&self, engagement_id: Snowflake) -> ServiceResult<PaymentResponse> {
        self.close_unpaid(engagement_id, PaymentStatus::Failed, "fail")
            .await
    }

    /// Move the latest `NOT_PAID` payment to `to`. Repeating the call once
    /// it is there is a no-op.
    async fn close_unpaid(
        &self,
        engagement_id: Snowflake,
        to: PaymentStatus,
        action: &'static str,
    ) -> ServiceResult<PaymentResponse> {
        let payment = self.latest_payment(engagement_id).await?;
        if payment.status == to {
            return Ok(PaymentResponse::from(&payment));
        }
        if payment.status != PaymentStatus::NotPaid {
            return Err(DomainError::InvalidPaymentState {
                status: payment.status,
                action,
            }
            .into());
        }

        let moved = self
            .ctx
            .payment_repo()
            .update_status_if(payment.id, PaymentStatus::NotPaid, to)
            .await?;
        let current = self.load_payment(payment.id).await?;
        if !moved && current.status != to {
            return Err(DomainError::InvalidPaymentState {
                status: current.status,
                action,
            }
            .into());
        }

        info!(payment_id = %payment.id, status = %current.status, "Unpaid payment closed");
        Ok(PaymentResponse::from(&current))
    }

    /// Already cancelled: only a stray unpaid payment may still need closing
    async fn close_after_cancel(
        &self,
        engagement: Engagement,
        payment: Payment,
    ) -> ServiceResult<SettlementResult> {
        if payment.status == PaymentStatus::NotPaid {
            self.ctx
                .payment_repo()
                .update_status_if(payment.id, PaymentStatus::NotPaid, PaymentStatus::Cancelled)
                .await?;
        }
        Ok(SettlementResult {
            outcome: SettlementOutcome::AlreadySettled,
            payment: self.load_payment(payment.id).await?,
            engagement_status: engagement.status,
        })
    }

    async fn settle_cancel(
        &self,
        payment: &Payment,
        from: PaymentStatus,
        next: &Engagement,
    ) -> ServiceResult<SettlementWrite> {
        let write = self
            .ctx
            .payment_repo()
            .settle(PaymentSettlement {
                payment_id: payment.id,
                from,
                to: PaymentStatus::Cancelled,
                engagement: Some(next),
            })
            .await?;
        Ok(write)
    }

    /// Full-cost gateway cancel. Repeats share the idempotency key, so a
    /// retried refund is not paid out twice.
    async fn refund(&self, payment: &Payment, reason: &str) -> ServiceResult<()> {
        let request = CancelRequest {
            transaction_id: payment.transaction_id.clone(),
            amount: payment.cost,
            reason: reason.to_string(),
            idempotency_key: payment.idempotency_key("cancel"),
        };
        self.ctx.gateway().cancel(&request).await.map_err(|e| {
            error!(payment_id = %payment.id, error = %e, "Gateway cancel failed");
            ServiceError::from(DomainError::Gateway(e))
        })
    }

    /// Undo a capture that can no longer be recorded. Returns the error to
    /// report: `cause` once the capture is cancelled, the gateway error if
    /// the cancel itself failed (the payment then stays `NOT_PAID`).
    async fn compensate(&self, payment: &Payment, cause: DomainError) -> ServiceError {
        warn!(payment_id = %payment.id, cause = %cause, "Compensating captured payment");

        if let Err(e) = self.refund(payment, COMPENSATION_REASON).await {
            return e;
        }
        match self
            .ctx
            .payment_repo()
            .update_status_if(payment.id, PaymentStatus::NotPaid, PaymentStatus::Cancelled)
            .await
        {
            Ok(_) => ServiceError::from(cause),
            Err(e) => ServiceError::from(e),
        }
    }

    async fn load_engagement(&self, engagement_id: Snowflake) -> ServiceResult<Engagement> {
        self.ctx
            .engagement_repo()
            .find_by_id(engagement_id)
            .await?
            .ok_or_else(|| DomainError::EngagementNotFound(engagement_id).into())
    }

    async fn paid_payment(&self, engagement_id: Snowflake) -> ServiceResult<Option<Payment>> {
        Ok(self
            .ctx
            .payment_repo()
            .find_paid_by_engagement(engagement_id)
            .await?)
    }

    async fn latest_payment(&self, engagement_id: Snowflake) -> ServiceResult<Payment> {
        self.ctx
            .payment_repo()
            .find_latest_by_engagement(engagement_id)
            .await?
            .ok_or_else(|| DomainError::PaymentNotFound(engagement_id).into())
    }

    async fn load_payment(&self, payment_id: Snowflake) -> ServiceResult<Payment> {
        self.ctx
            .payment_repo()
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| ServiceError::internal(format!("payment {payment_id} vanished")))
    }

    fn callback_url(&self, outcome: &str, engagement_id: Snowflake) -> String {
        format!(
            "{}/api/v1/payments/callback/{outcome}?engagement_id={engagement_id}",
            self.ctx.settings().callback_base_url
        )
    }
}
