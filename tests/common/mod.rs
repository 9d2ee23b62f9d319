#![allow(dead_code)]

use async_trait::async_trait;
use ipay::application::router::Services;
use ipay::domain::gateway::{Confirmation, ConfirmRequest, TokenRequest};
use ipay::domain::port::PortId;
use ipay::domain::ports::{BankClient, TransactionStore};
use ipay::domain::transaction::{
    Amount, NewTransaction, Transaction, TransactionId, TransactionStatus,
};
use ipay::error::{PaymentError, Result};
use ipay::infrastructure::config::MapConfig;
use ipay::infrastructure::in_memory::InMemoryTransactionStore;
use ipay::infrastructure::sandbox::SandboxBank;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Credentials and callback URLs for every built-in port.
pub fn configured() -> MapConfig {
    MapConfig::new()
        .with("mellat.terminal_id", "1001")
        .with("mellat.username", "shop")
        .with("mellat.password", "secret")
        .with("mellat.callback_url", "https://shop.test/callback")
        .with("sadad.merchant_id", "m-1")
        .with("sadad.terminal_id", "t-1")
        .with("sadad.terminal_key", "a2V5")
        .with("sadad.callback_url", "https://shop.test/callback")
        .with("zarinpal.merchant_id", "zp-1")
        .with("zarinpal.callback_url", "https://shop.test/callback")
}

/// A store wrapper counting every call that reaches the backing store.
#[derive(Clone, Default)]
pub struct CountingStore {
    pub inner: InMemoryTransactionStore,
    calls: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new(inner: InMemoryTransactionStore) -> Self {
        Self {
            inner,
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransactionStore for CountingStore {
    async fn create(&self, tx: NewTransaction) -> Result<Transaction> {
        self.hit();
        self.inner.create(tx).await
    }

    async fn find(&self, id: TransactionId) -> Result<Option<Transaction>> {
        self.hit();
        self.inner.find(id).await
    }

    async fn set_reference(&self, id: TransactionId, reference: String) -> Result<bool> {
        self.hit();
        self.inner.set_reference(id, reference).await
    }

    async fn transition_status(
        &self,
        id: TransactionId,
        from: TransactionStatus,
        to: TransactionStatus,
        tracking_code: Option<String>,
    ) -> Result<bool> {
        self.hit();
        self.inner
            .transition_status(id, from, to, tracking_code)
            .await
    }

    async fn claim(&self, id: TransactionId) -> Result<bool> {
        self.hit();
        self.inner.claim(id).await
    }

    async fn release(&self, id: TransactionId) -> Result<()> {
        self.hit();
        self.inner.release(id).await
    }
}

/// Sandbox bank that records which port every confirmation was sent to and
/// can stall confirmations to widen race windows or fail the next one.
#[derive(Clone, Default)]
pub struct SpyBank {
    inner: SandboxBank,
    delay: Duration,
    fail_next: Arc<AtomicBool>,
    confirmed_ports: Arc<std::sync::Mutex<Vec<PortId>>>,
}

impl SpyBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Makes the next confirmation fail with a transport error.
    pub fn fail_next_confirm(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn confirmations(&self) -> usize {
        self.inner.confirmations()
    }

    pub fn confirmed_ports(&self) -> Vec<PortId> {
        self.confirmed_ports.lock().unwrap().clone()
    }
}

#[async_trait]
impl BankClient for SpyBank {
    async fn request_token(&self, port: PortId, request: &TokenRequest) -> Result<String> {
        self.inner.request_token(port, request).await
    }

    async fn confirm(&self, port: PortId, request: &ConfirmRequest) -> Result<Confirmation> {
        self.confirmed_ports.lock().unwrap().push(port);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PaymentError::Gateway("connection reset by bank".to_string()));
        }
        self.inner.confirm(port, request).await
    }
}

pub fn services(store: impl TransactionStore + 'static, bank: SpyBank) -> Services {
    Services::new(Arc::new(configured()), Arc::new(store), Arc::new(bank))
}

/// Seeds a row directly, bypassing any gateway.
pub async fn seed(
    store: &InMemoryTransactionStore,
    id: u64,
    port: PortId,
    status: TransactionStatus,
) -> Transaction {
    let mut tx = Transaction::new(
        TransactionId(id),
        NewTransaction {
            port_id: port,
            amount: Amount::new(dec!(12000)).unwrap(),
            description: None,
            mobile: None,
        },
    );
    tx.status = status;
    tx.reference = Some(format!("{}-{}-1", port.name().unwrap_or("PORT"), id));
    store.insert(tx.clone()).await;
    tx
}
