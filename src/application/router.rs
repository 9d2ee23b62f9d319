use super::registry::PortRegistry;
use crate::domain::gateway::{PaymentRequest, Redirect, VerifyOutcome};
use crate::domain::port::PortId;
use crate::domain::ports::{
    BankClientRef, ConfigProviderRef, Gateway, GatewayBox, GatewayContext, TransactionStoreRef,
};
use crate::domain::request::VerifyRequest;
use crate::domain::transaction::{Transaction, TransactionId};
use crate::error::{PaymentError, Result};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{error, info, warn};

/// Shared dependencies of a [`PaymentRouter`]. Cheap to clone.
#[derive(Clone)]
pub struct Services {
    pub config: ConfigProviderRef,
    pub store: TransactionStoreRef,
    pub bank: BankClientRef,
    pub registry: Arc<PortRegistry>,
}

impl Services {
    /// Services using the built-in gateways.
    pub fn new(config: ConfigProviderRef, store: TransactionStoreRef, bank: BankClientRef) -> Self {
        Self {
            config,
            store,
            bank,
            registry: Arc::new(PortRegistry::with_defaults()),
        }
    }

    pub fn with_registry(mut self, registry: PortRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    fn build(&self, port: PortId) -> Result<GatewayBox> {
        self.registry.build(GatewayContext {
            port,
            config: self.config.clone(),
            store: self.store.clone(),
            bank: self.bank.clone(),
        })
    }
}

/// Single entry point in front of every gateway.
///
/// A router is meant to live for one request. It verifies callbacks against
/// the gateway recorded on the transaction and forwards the other gateway
/// operations to its active gateway.
pub struct PaymentRouter {
    services: Services,
    active: Option<GatewayBox>,
}

impl PaymentRouter {
    /// Creates a router, eagerly building the gateway for `port` if given.
    pub fn new(services: Services, port: Option<PortId>) -> Result<Self> {
        let active = port.map(|port| services.build(port)).transpose()?;
        Ok(Self { services, active })
    }

    /// Ports callers may offer, in a stable order.
    pub fn supported_ports(&self) -> Vec<PortId> {
        self.services.registry.supported_ports()
    }

    pub fn active(&self) -> Option<&dyn Gateway> {
        self.active.as_deref()
    }

    pub fn active_port(&self) -> Result<PortId> {
        Ok(self.gateway()?.port_id())
    }

    /// Opens a payment through the active gateway.
    pub async fn initiate(&self, request: PaymentRequest) -> Result<Redirect> {
        self.gateway()?.initiate(request).await
    }

    /// Rebuilds the redirect of a pending transaction through the active gateway.
    pub async fn redirect(&self, transaction: &Transaction) -> Result<Redirect> {
        self.gateway()?.redirect(transaction).await
    }

    /// Verifies the transaction named by `request` with the gateway that
    /// opened it.
    ///
    /// Each step gates the next: a malformed request never reaches the store,
    /// a finalized transaction never reaches a gateway, and the gateway is
    /// always derived from the stored record rather than from the request.
    pub async fn verify(&mut self, request: &VerifyRequest) -> Result<VerifyOutcome> {
        let id = request.transaction_id()?;

        let transaction = self
            .services
            .store
            .find(id)
            .await?
            .ok_or(PaymentError::NotFoundTransaction(id))?;

        if transaction.status.is_terminal() {
            warn!(transaction_id = %id, status = %transaction.status, "verification of finalized transaction rejected");
            return Err(PaymentError::Retry(id));
        }

        let gateway = self.services.build(transaction.port_id)?;

        let Some(claim) = Claim::acquire(&self.services.store, id).await? else {
            warn!(transaction_id = %id, "transaction is already being verified");
            return Err(PaymentError::Retry(id));
        };

        info!(transaction_id = %id, port = %transaction.port_id, "verifying transaction");
        let gateway = self.active.insert(gateway);
        let outcome = gateway.verify(&transaction).await;
        claim.release().await;
        outcome
    }

    fn gateway(&self) -> Result<&dyn Gateway> {
        self.active().ok_or(PaymentError::NoActivePort)
    }
}

/// Verification lease on a transaction.
///
/// Released explicitly on the normal path. If the owning future is dropped
/// or unwinds first, the release is handed to the current runtime instead.
struct Claim {
    store: TransactionStoreRef,
    id: TransactionId,
    held: bool,
}

impl Claim {
    async fn acquire(store: &TransactionStoreRef, id: TransactionId) -> Result<Option<Self>> {
        let claimed = store.claim(id).await?;
        Ok(claimed.then(|| Self {
            store: store.clone(),
            id,
            held: true,
        }))
    }

    async fn release(mut self) {
        if let Err(e) = self.store.release(self.id).await {
            warn!(transaction_id = %self.id, error = %e, "failed to release verification claim");
        }
        self.held = false;
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        if !self.held {
            return;
        }
        let (store, id) = (self.store.clone(), self.id);
        match Handle::try_current() {
            Ok(handle) => {
                warn!(transaction_id = %id, "verification abandoned, releasing claim");
                handle.spawn(async move {
                    if let Err(e) = store.release(id).await {
                        warn!(transaction_id = %id, error = %e, "failed to release verification claim");
                    }
                });
            }
            Err(_) => {
                error!(transaction_id = %id, "verification abandoned outside a runtime, claim left in place");
            }
        }
    }
}
