use super::gateway::{
    Confirmation, ConfirmRequest, PaymentRequest, Redirect, TokenRequest, VerifyOutcome,
};
use super::port::PortId;
use super::transaction::{NewTransaction, Transaction, TransactionId, TransactionStatus};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Persistence for transaction records.
///
/// Every mutation after creation is conditional, so concurrent verifications
/// of the same row cannot both succeed.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Persists a new `PENDING` transaction under a freshly assigned id.
    async fn create(&self, tx: NewTransaction) -> Result<Transaction>;

    async fn find(&self, id: TransactionId) -> Result<Option<Transaction>>;

    /// Records the bank reference of a transaction that is still `PENDING`.
    /// Returns `false` when the row is missing or no longer pending.
    async fn set_reference(&self, id: TransactionId, reference: String) -> Result<bool>;

    /// Moves the status from `from` to `to` if and only if it currently equals
    /// `from`, recording `tracking_code` in the same step. Returns `false` when
    /// nothing was applied.
    async fn transition_status(
        &self,
        id: TransactionId,
        from: TransactionStatus,
        to: TransactionStatus,
        tracking_code: Option<String>,
    ) -> Result<bool>;

    /// Takes the verification lease on a `PENDING` row. Returns `false` if the
    /// row is missing, terminal, or already claimed.
    async fn claim(&self, id: TransactionId) -> Result<bool>;

    /// Drops the verification lease. Releasing an unclaimed row is a no-op.
    async fn release(&self, id: TransactionId) -> Result<()>;
}

/// Named settings. Keys of nested sections are dotted (`mellat.terminal_id`).
pub trait ConfigProvider: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Wire protocol of the banks: token issuance and payment confirmation.
#[async_trait]
pub trait BankClient: Send + Sync {
    async fn request_token(&self, port: PortId, request: &TokenRequest) -> Result<String>;
    async fn confirm(&self, port: PortId, request: &ConfirmRequest) -> Result<Confirmation>;
}

/// The operations every gateway integration offers. The router forwards these
/// to whichever gateway is active.
#[async_trait]
pub trait Gateway: Send + Sync {
    fn port_id(&self) -> PortId;

    /// Opens a new payment: creates the `PENDING` row, obtains a bank
    /// reference and returns where to send the payer.
    async fn initiate(&self, request: PaymentRequest) -> Result<Redirect>;

    /// Rebuilds the redirect of a pending transaction opened by this gateway.
    async fn redirect(&self, transaction: &Transaction) -> Result<Redirect>;

    /// Confirms a `PENDING` transaction with the bank and finalizes it.
    ///
    /// On `Ok` the transaction is terminal. On `Err` it is left `PENDING`.
    async fn verify(&self, transaction: &Transaction) -> Result<VerifyOutcome>;
}

pub type TransactionStoreRef = Arc<dyn TransactionStore>;
pub type ConfigProviderRef = Arc<dyn ConfigProvider>;
pub type BankClientRef = Arc<dyn BankClient>;
pub type GatewayBox = Box<dyn Gateway>;

/// Dependencies injected into every gateway, including the port id the
/// gateway reports as its own.
#[derive(Clone)]
pub struct GatewayContext {
    pub port: PortId,
    pub config: ConfigProviderRef,
    pub store: TransactionStoreRef,
    pub bank: BankClientRef,
}

/// Builds a gateway from its injected dependencies.
pub type GatewayFactory = Box<dyn Fn(GatewayContext) -> GatewayBox + Send + Sync>;
