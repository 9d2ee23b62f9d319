use crate::domain::ports::TransactionStore;
use crate::domain::transaction::{NewTransaction, Transaction, TransactionId, TransactionStatus};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options, WriteBatch};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing transaction records.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for bookkeeping such as the id sequence.
pub const CF_META: &str = "meta";

const LAST_ID_KEY: &[u8] = b"last_id";

/// A persistent store implementation using RocksDB.
///
/// Transactions are stored as JSON under their big-endian id. Every
/// read-modify-write goes through one async mutex, which also guards the
/// verification claims; claims are therefore process-local and do not survive
/// a restart.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    /// Write lock for every read-modify-write. The guarded set holds the
    /// transactions currently claimed for verification.
    lock: Arc<Mutex<HashSet<TransactionId>>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("transactions" and "meta") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());
        let cf_meta = ColumnFamilyDescriptor::new(CF_META, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_transactions, cf_meta])?;

        Ok(Self {
            db: Arc::new(db),
            lock: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            PaymentError::InternalError(Box::new(std::io::Error::other(format!(
                "{} column family not found",
                name
            ))))
        })
    }

    fn read(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        match self.db.get_cf(&cf, id.0.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write(&self, tx: &Transaction) -> Result<()> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        let value = serde_json::to_vec(tx)?;
        self.db.put_cf(&cf, tx.id.0.to_be_bytes(), value)?;
        Ok(())
    }

    fn last_id(&self) -> Result<u64> {
        let cf = self.cf(CF_META)?;
        match self.db.get_cf(&cf, LAST_ID_KEY)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    PaymentError::InternalError(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "Corrupted id sequence",
                    )))
                })?;
                Ok(u64::from_be_bytes(raw))
            }
            None => Ok(0),
        }
    }
}

#[async_trait]
impl TransactionStore for RocksDBStore {
    async fn create(&self, new: NewTransaction) -> Result<Transaction> {
        let _guard = self.lock.lock().await;

        let id = TransactionId(self.last_id()? + 1);
        let tx = Transaction::new(id, new);

        // Row and sequence land together or not at all.
        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_TRANSACTIONS)?, id.0.to_be_bytes(), serde_json::to_vec(&tx)?);
        batch.put_cf(self.cf(CF_META)?, LAST_ID_KEY, id.0.to_be_bytes());
        self.db.write(batch)?;

        Ok(tx)
    }

    async fn find(&self, id: TransactionId) -> Result<Option<Transaction>> {
        self.read(id)
    }

    async fn set_reference(&self, id: TransactionId, reference: String) -> Result<bool> {
        let _guard = self.lock.lock().await;
        match self.read(id)? {
            Some(mut tx) if tx.status == TransactionStatus::Pending => {
                tx.reference = Some(reference);
                tx.updated_at = Utc::now();
                self.write(&tx)?;
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
        let _guard = self.lock.lock().await;
        match self.read(id)? {
            Some(mut tx) if tx.status == from => {
                tx.status = to;
                if tracking_code.is_some() {
                    tx.tracking_code = tracking_code;
                }
                tx.updated_at = Utc::now();
                self.write(&tx)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn claim(&self, id: TransactionId) -> Result<bool> {
        let mut claims = self.lock.lock().await;
        let pending = self
            .read(id)?
            .is_some_and(|tx| tx.status == TransactionStatus::Pending);
        Ok(pending && claims.insert(id))
    }

    async fn release(&self, id: TransactionId) -> Result<()> {
        self.lock.lock().await.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::port::PortId;
    use crate::domain::transaction::Amount;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn new_tx() -> NewTransaction {
        NewTransaction {
            port_id: PortId::ZARINPAL,
            amount: Amount::new(dec!(5000)).unwrap(),
            description: Some("order 12".to_string()),
            mobile: None,
        }
    }

    #[tokio::test]
    async fn test_rocksdb_transaction_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let tx = store.create(new_tx()).await.unwrap();
        assert_eq!(tx.id, TransactionId(1));

        let retrieved = store.find(tx.id).await.unwrap().unwrap();
        assert_eq!(retrieved, tx);
        assert!(store.find(TransactionId(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rocksdb_transition_is_conditional() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let tx = store.create(new_tx()).await.unwrap();

        assert!(store.claim(tx.id).await.unwrap());
        assert!(!store.claim(tx.id).await.unwrap());
        assert!(
            store
                .transition_status(
                    tx.id,
                    TransactionStatus::Pending,
                    TransactionStatus::Failed,
                    None
                )
                .await
                .unwrap()
        );
        assert!(
            !store
                .transition_status(
                    tx.id,
                    TransactionStatus::Pending,
                    TransactionStatus::Succeeded,
                    None
                )
                .await
                .unwrap()
        );
        store.release(tx.id).await.unwrap();
        assert!(!store.claim(tx.id).await.unwrap());

        let stored = store.find(tx.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TransactionStatus::Failed);
    }

    #[tokio::test]
    async fn test_rocksdb_sequence_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDBStore::open(dir.path()).unwrap();
            store.create(new_tx()).await.unwrap();
            store.create(new_tx()).await.unwrap();
        }

        let store = RocksDBStore::open(dir.path()).unwrap();
        let tx = store.create(new_tx()).await.unwrap();
        assert_eq!(tx.id, TransactionId(3));
        assert!(store.find(TransactionId(1)).await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rocksdb_concurrent_claims_and_writes() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let tx = store.create(new_tx()).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                // Writers share the lock with the claim set.
                store.create(new_tx()).await.unwrap();
                store.claim(tx.id).await.unwrap()
            }));
        }

        let mut won = 0;
        for handle in handles {
            if handle.await.unwrap() {
                won += 1;
            }
        }
        assert_eq!(won, 1);
        assert!(store.find(TransactionId(9)).await.unwrap().is_some());
    }
}
