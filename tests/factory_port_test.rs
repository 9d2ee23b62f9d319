use async_trait::async_trait;
use common::{CountingStore, SpyBank, configured, seed};
use ipay::application::registry::PortRegistry;
use ipay::application::router::{PaymentRouter, Services};
use ipay::domain::gateway::{PaymentRequest, Redirect, RedirectMethod, VerifyOutcome};
use ipay::domain::port::PortId;
use ipay::domain::ports::{Gateway, GatewayBox, GatewayContext, GatewayFactory, TransactionStore};
use ipay::domain::request::VerifyRequest;
use ipay::domain::transaction::{Transaction, TransactionId, TransactionStatus};
use ipay::error::{PaymentError, Result};
use ipay::infrastructure::in_memory::InMemoryTransactionStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

mod common;

const CARD: PortId = PortId(4);

/// A gateway that approves everything, registered from outside the crate.
struct CardGateway {
    ctx: GatewayContext,
}

#[async_trait]
impl Gateway for CardGateway {
    fn port_id(&self) -> PortId {
        self.ctx.port
    }

    async fn initiate(&self, _request: PaymentRequest) -> Result<Redirect> {
        Err(PaymentError::Gateway("not supported".to_string()))
    }

    async fn redirect(&self, transaction: &Transaction) -> Result<Redirect> {
        Ok(Redirect {
            transaction_id: transaction.id,
            port_id: self.ctx.port,
            url: "https://card.test/pay".to_string(),
            method: RedirectMethod::Get,
            fields: BTreeMap::new(),
        })
    }

    async fn verify(&self, transaction: &Transaction) -> Result<VerifyOutcome> {
        self.ctx
            .store
            .transition_status(
                transaction.id,
                TransactionStatus::Pending,
                TransactionStatus::Succeeded,
                Some("CARD-OK".to_string()),
            )
            .await?;
        Ok(VerifyOutcome {
            transaction_id: transaction.id,
            port_id: self.ctx.port,
            status: TransactionStatus::Succeeded,
            tracking_code: Some("CARD-OK".to_string()),
            message: None,
        })
    }
}

fn context(store: CountingStore, port: PortId) -> GatewayContext {
    GatewayContext {
        port,
        config: Arc::new(configured()),
        store: Arc::new(store),
        bank: Arc::new(SpyBank::new()),
    }
}

#[test]
fn test_factory_instantiation() {
    let factory: GatewayFactory =
        Box::new(|ctx: GatewayContext| Box::new(CardGateway { ctx }) as GatewayBox);

    let gateway = factory(context(CountingStore::default(), CARD));
    assert_eq!(gateway.port_id(), CARD);
}

#[test]
fn test_unknown_port_builds_nothing() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();

    let mut registry = PortRegistry::with_defaults();
    registry.register(
        CARD,
        Box::new(move |ctx: GatewayContext| {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::new(CardGateway { ctx }) as GatewayBox
        }),
    );

    let store = CountingStore::default();
    assert!(matches!(
        registry.build(context(store.clone(), PortId(5))),
        Err(PaymentError::PortNotFound(PortId(5)))
    ));
    assert_eq!(built.load(Ordering::SeqCst), 0);
    assert_eq!(store.calls(), 0);

    registry.build(context(store, CARD)).unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_registered_port_is_routed() {
    let mut registry = PortRegistry::with_defaults();
    registry.register(
        CARD,
        Box::new(|ctx: GatewayContext| Box::new(CardGateway { ctx }) as GatewayBox),
    );

    let store = InMemoryTransactionStore::new();
    seed(&store, 1, CARD, TransactionStatus::Pending).await;

    let services = Services::new(
        Arc::new(configured()),
        Arc::new(store.clone()),
        Arc::new(SpyBank::new()),
    )
    .with_registry(registry);
    let mut router = PaymentRouter::new(services, None).unwrap();

    assert_eq!(
        router.supported_ports(),
        vec![PortId::MELLAT, PortId::SADAD, PortId::ZARINPAL, CARD]
    );

    let outcome = router
        .verify(&VerifyRequest::for_transaction(TransactionId(1)))
        .await
        .unwrap();
    assert_eq!(outcome.port_id, CARD);
    assert_eq!(outcome.tracking_code.as_deref(), Some("CARD-OK"));
}
