use common::{SpyBank, configured};
use ipay::application::registry::PortRegistry;
use ipay::domain::gateway::PaymentRequest;
use ipay::domain::port::PortId;
use ipay::domain::ports::{ConfigProviderRef, Gateway, GatewayBox, GatewayContext, TransactionStore};
use ipay::domain::transaction::{Amount, TransactionStatus};
use ipay::infrastructure::in_memory::InMemoryTransactionStore;
use rust_decimal_macros::dec;
use std::sync::Arc;

mod common;

#[tokio::test]
async fn test_gateways_as_trait_objects() {
    let store = InMemoryTransactionStore::new();
    let config: ConfigProviderRef = Arc::new(configured());
    let registry = PortRegistry::with_defaults();

    let gateways: Vec<GatewayBox> = PortId::BUILTIN
        .into_iter()
        .map(|port| {
            registry
                .build(GatewayContext {
                    port,
                    config: config.clone(),
                    store: Arc::new(store.clone()),
                    bank: Arc::new(SpyBank::new()),
                })
                .unwrap()
        })
        .collect();

    // Verify Send + Sync by spawning tasks
    let mut handles = Vec::new();
    for gateway in gateways {
        handles.push(tokio::spawn(async move {
            let redirect = gateway
                .initiate(PaymentRequest::new(Amount::new(dec!(1000)).unwrap()))
                .await
                .unwrap();
            assert_eq!(redirect.port_id, gateway.port_id());
            redirect.transaction_id
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);

    for id in ids {
        let tx = store.find(id).await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert!(tx.reference.is_some());
    }
}
