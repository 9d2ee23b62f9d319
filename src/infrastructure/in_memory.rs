use crate::domain::ports::TransactionStore;
use crate::domain::transaction::{NewTransaction, Transaction, TransactionId, TransactionStatus};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    transactions: HashMap<TransactionId, Transaction>,
    claimed: HashSet<TransactionId>,
    last_id: u64,
}

/// A thread-safe in-memory store for transactions.
///
/// Rows, claims and the id sequence live behind a single `RwLock`, so every
/// conditional operation is atomic. Cloning shares the underlying state.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryTransactionStore {
    /// Creates a new, empty in-memory transaction store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record as-is, replacing any row with the same id.
    ///
    /// Used to seed fixtures such as rows left behind by retired gateways.
    pub async fn insert(&self, tx: Transaction) {
        let mut inner = self.inner.write().await;
        inner.last_id = inner.last_id.max(tx.id.0);
        inner.transactions.insert(tx.id, tx);
    }

    pub async fn is_claimed(&self, id: TransactionId) -> bool {
        self.inner.read().await.claimed.contains(&id)
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn create(&self, new: NewTransaction) -> Result<Transaction> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let tx = Transaction::new(TransactionId(inner.last_id), new);
        inner.transactions.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn find(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let inner = self.inner.read().await;
        Ok(inner.transactions.get(&id).cloned())
    }

    async fn set_reference(&self, id: TransactionId, reference: String) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.transactions.get_mut(&id) {
            Some(tx) if tx.status == TransactionStatus::Pending => {
                tx.reference = Some(reference);
                tx.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn transition_status(
        &self,
        id: TransactionId,
        from: TransactionStatus,
        to: TransactionStatus,
        tracking_code: Option<String>,
    ) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.transactions.get_mut(&id) {
            Some(tx) if tx.status == from => {
                tx.status = to;
                if tracking_code.is_some() {
                    tx.tracking_code = tracking_code;
                }
                tx.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn claim(&self, id: TransactionId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let pending = inner
            .transactions
            .get(&id)
            .is_some_and(|tx| tx.status == TransactionStatus::Pending);
        Ok(pending && inner.claimed.insert(id))
    }

    async fn release(&self, id: TransactionId) -> Result<()> {
        self.inner.write().await.claimed.remove(&id);
        Ok(())
    }
}
