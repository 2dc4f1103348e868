//! Shared fixtures for service tests: an in-memory store, a recording
//! gateway, one client, one expert and one offer with two options.

use std::sync::Arc;

use matching_core::{
    Actor, CatalogOffer, Decision, DomainError, EngagementStatus, Member, MemberRole,
    Money, PaymentGateway, Snowflake,
};
use matching_db::InMemoryStore;
use matching_payment::RecordingGateway;

use super::{
    EstimateService, MatchingService, ServiceContext, ServiceContextBuilder, ServiceError,
    SettlementService,
};
use crate::dto::{BuildEstimateRequest, CreateEngagementRequest};

pub(crate) const CLIENT: Snowflake = Snowflake::new(100);
pub(crate) const OTHER_CLIENT: Snowflake = Snowflake::new(101);
pub(crate) const EXPERT: Snowflake = Snowflake::new(200);
pub(crate) const OFFER: Snowflake = Snowflake::new(300);
pub(crate) const OPTION_REVISION: Snowflake = Snowflake::new(301);
pub(crate) const OPTION_SOURCE: Snowflake = Snowflake::new(302);

pub(crate) fn client() -> Actor {
    Actor::client(CLIENT)
}

pub(crate) fn expert() -> Actor {
    Actor::expert(EXPERT)
}

pub(crate) fn money(amount: i64) -> Money {
    Money::new(amount).unwrap()
}

pub(crate) fn offer() -> CatalogOffer {
    CatalogOffer::new(OFFER, EXPERT, "Brand identity", money(120_000))
        .with_option(OPTION_REVISION, "Extra revision", money(20_000))
        .with_option(OPTION_SOURCE, "Source files", money(10_000))
}

/// Unwrap the domain error inside a service error
pub(crate) fn domain(err: ServiceError) -> DomainError {
    match err {
        ServiceError::Domain(e) => e,
        other => panic!("expected a domain error, got {other:?}"),
    }
}

pub(crate) struct Harness {
    pub store: InMemoryStore,
    pub gateway: RecordingGateway,
    pub ctx: ServiceContext,
}

impl Harness {
    pub async fn new() -> Self {
        let gateway = RecordingGateway::new();
        let services_gateway = gateway.clone();
        Self::with_gateway(gateway, move |_| Arc::new(services_gateway) as Arc<dyn PaymentGateway>).await
    }

    /// `recording` is kept for assertions; services call whatever
    /// `gateway` builds around the seeded store
    pub async fn with_gateway(
        recording: RecordingGateway,
        gateway: impl FnOnce(&InMemoryStore) -> Arc<dyn PaymentGateway>,
    ) -> Self {
        let store = InMemoryStore::new();
        store.insert_member(Member::new(CLIENT, MemberRole::Client, "client")).await;
        store
            .insert_member(Member::new(OTHER_CLIENT, MemberRole::Client, "other"))
            .await;
        store.insert_member(Member::new(EXPERT, MemberRole::Expert, "expert")).await;
        store.insert_offer(offer()).await;

        let ctx = ServiceContextBuilder::new()
            .in_memory(store.clone())
            .gateway(gateway(&store))
            .build()
            .unwrap();

        Self {
            store,
            gateway: recording,
            ctx,
        }
    }

    pub fn matching(&self) -> MatchingService<'_> {
        MatchingService::new(&self.ctx)
    }

    pub fn settlement(&self) -> SettlementService<'_> {
        SettlementService::new(&self.ctx)
    }

    pub async fn status(&self, engagement_id: Snowflake) -> EngagementStatus {
        self.ctx
            .engagement_repo()
            .find_by_id(engagement_id)
            .await
            .unwrap()
            .unwrap()
            .status
    }

    /// A fresh request from [`CLIENT`] for [`OFFER`]
    pub async fn requested(&self) -> Snowflake {
        let response = self
            .matching()
            .request(&client(), CreateEngagementRequest { offer_id: OFFER })
            .await
            .unwrap();
        Snowflake::parse(&response.id).unwrap()
    }

    pub async fn accepted(&self) -> Snowflake {
        let id = self.requested().await;
        self.matching()
            .decide(id, &expert(), Decision::Accept)
            .await
            .unwrap();
        id
    }

    /// Estimate with both options: 150 000
    pub async fn estimate(&self, engagement_id: Snowflake) {
        EstimateService::new(&self.ctx)
            .build(
                engagement_id,
                &client(),
                BuildEstimateRequest {
                    option_ids: vec![OPTION_REVISION, OPTION_SOURCE],
                },
            )
            .await
            .unwrap();
    }

    /// Accepted, estimated and paid
    pub async fn paid(&self) -> Snowflake {
        let id = self.accepted().await;
        self.estimate(id).await;
        self.settlement().prepare(id, &client()).await.unwrap();
        self.settlement().approve(id, "pg-token").await.unwrap();
        id
    }

    pub async fn confirmed(&self) -> Snowflake {
        let id = self.paid().await;
        let matching = self.matching();
        matching.start_work(id, &expert()).await.unwrap();
        matching.complete_work(id, &expert()).await.unwrap();
        matching.confirm(id, &client()).await.unwrap();
        id
    }
}
