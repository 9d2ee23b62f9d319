//! Gateway integrations.
//!
//! Every bank shares the same payment lifecycle, implemented once by
//! [`BankGateway`]; a [`PortProtocol`] supplies what differs per bank: the
//! configuration section, the required credentials and the shape of the
//! redirect. The wire protocol itself lives behind the injected
//! [`BankClient`](crate::domain::ports::BankClient).

pub mod mellat;
pub mod sadad;
pub mod zarinpal;

use crate::domain::gateway::{
    ConfirmRequest, Credentials, PaymentRequest, Redirect, RedirectMethod, TokenRequest,
    VerifyOutcome,
};
use crate::domain::port::PortId;
use crate::domain::ports::{Gateway, GatewayContext};
use crate::domain::request::TRANSACTION_ID_PARAM;
use crate::domain::transaction::{NewTransaction, Transaction, TransactionId, TransactionStatus};
use crate::error::{PaymentError, Result};
use crate::infrastructure::config::Settings;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use tracing::{info, warn};

pub use mellat::{Mellat, MellatGateway};
pub use sadad::{Sadad, SadadGateway};
pub use zarinpal::{Zarinpal, ZarinpalGateway};

/// Where and how the payer is sent to the bank.
pub struct RedirectTarget {
    pub url: String,
    pub method: RedirectMethod,
    pub fields: BTreeMap<String, String>,
}

/// The bank-specific parts of a gateway.
pub trait PortProtocol: Send + Sync + 'static {
    /// Configuration section holding this bank's settings.
    const SECTION: &'static str;
    /// Settings that must be present before any payment is opened or confirmed.
    const CREDENTIALS: &'static [&'static str];

    fn redirect_target(reference: &str, settings: &Settings<'_>) -> Result<RedirectTarget>;
}

/// A gateway integration for the bank described by `P`.
pub struct BankGateway<P: PortProtocol> {
    ctx: GatewayContext,
    _protocol: PhantomData<P>,
}

impl<P: PortProtocol> BankGateway<P> {
    pub fn new(ctx: GatewayContext) -> Self {
        Self {
            ctx,
            _protocol: PhantomData,
        }
    }

    fn settings(&self) -> Settings<'_> {
        Settings::new(self.ctx.config.as_ref())
    }

    fn credentials(&self) -> Result<Credentials> {
        self.settings().credentials(P::SECTION, P::CREDENTIALS)
    }

    fn callback_base(&self) -> Result<String> {
        self.settings()
            .optional(P::SECTION, "callback_url")
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                PaymentError::Config(format!("Missing setting `{}.callback_url`", P::SECTION))
            })
    }

    fn ensure_owned(&self, transaction: &Transaction) -> Result<()> {
        if transaction.port_id == self.ctx.port {
            Ok(())
        } else {
            Err(PaymentError::Gateway(format!(
                "Transaction {} belongs to {}, not {}",
                transaction.id, transaction.port_id, self.ctx.port
            )))
        }
    }

    fn build_redirect(&self, id: TransactionId, reference: &str) -> Result<Redirect> {
        let target = P::redirect_target(reference, &self.settings())?;
        Ok(Redirect {
            transaction_id: id,
            port_id: self.ctx.port,
            url: target.url,
            method: target.method,
            fields: target.fields,
        })
    }

    /// Applies the terminal transition. Losing the race to another writer
    /// surfaces as `Retry`.
    async fn finalize(
        &self,
        transaction: &Transaction,
        status: TransactionStatus,
        tracking_code: Option<String>,
        message: Option<String>,
    ) -> Result<VerifyOutcome> {
        let applied = self
            .ctx
            .store
            .transition_status(
                transaction.id,
                TransactionStatus::Pending,
                status,
                tracking_code.clone(),
            )
            .await?;
        if !applied {
            warn!(transaction_id = %transaction.id, port = %self.ctx.port, "transaction finalized concurrently");
            return Err(PaymentError::Retry(transaction.id));
        }

        info!(transaction_id = %transaction.id, port = %self.ctx.port, %status, "transaction finalized");
        Ok(VerifyOutcome {
            transaction_id: transaction.id,
            port_id: self.ctx.port,
            status,
            tracking_code,
            message,
        })
    }
}

#[async_trait]
impl<P: PortProtocol> Gateway for BankGateway<P> {
    fn port_id(&self) -> PortId {
        self.ctx.port
    }

    async fn initiate(&self, request: PaymentRequest) -> Result<Redirect> {
        // Fail on configuration before anything is persisted.
        let credentials = self.credentials()?;
        let callback_base = self.callback_base()?;

        let tx = self
            .ctx
            .store
            .create(NewTransaction {
                port_id: self.ctx.port,
                amount: request.amount,
                description: request.description,
                mobile: request.mobile,
            })
            .await?;

        let token_request = TokenRequest {
            transaction_id: tx.id,
            amount: tx.amount,
            callback_url: with_transaction_id(&callback_base, tx.id),
            description: tx.description.clone(),
            mobile: tx.mobile.clone(),
            credentials,
        };
        let reference = match self
            .ctx
            .bank
            .request_token(self.ctx.port, &token_request)
            .await
        {
            Ok(reference) => reference,
            Err(e) => {
                // The bank never opened the payment.
                warn!(transaction_id = %tx.id, port = %self.ctx.port, error = %e, "bank refused to open payment");
                self.ctx
                    .store
                    .transition_status(tx.id, TransactionStatus::Pending, TransactionStatus::Failed, None)
                    .await?;
                return Err(e);
            }
        };

        if !self
            .ctx
            .store
            .set_reference(tx.id, reference.clone())
            .await?
        {
            return Err(PaymentError::Retry(tx.id));
        }

        info!(transaction_id = %tx.id, port = %self.ctx.port, amount = %tx.amount, "payment initiated");
        self.build_redirect(tx.id, &reference)
    }

    async fn redirect(&self, transaction: &Transaction) -> Result<Redirect> {
        self.ensure_owned(transaction)?;
        if transaction.status != TransactionStatus::Pending {
            return Err(PaymentError::Retry(transaction.id));
        }
        let reference = transaction.reference.as_deref().ok_or_else(|| {
            PaymentError::ValidationError(format!(
                "Transaction {} was never opened at the bank",
                transaction.id
            ))
        })?;
        self.build_redirect(transaction.id, reference)
    }

    async fn verify(&self, transaction: &Transaction) -> Result<VerifyOutcome> {
        self.ensure_owned(transaction)?;
        let credentials = self.credentials()?;

        let Some(reference) = transaction.reference.clone() else {
            // The bank never issued a token, so there is nothing to confirm.
            return self
                .finalize(
                    transaction,
                    TransactionStatus::Failed,
                    None,
                    Some("Payment was never opened at the bank".to_string()),
                )
                .await;
        };

        let request = ConfirmRequest::for_transaction(transaction, reference, credentials);
        let confirmation = self.ctx.bank.confirm(self.ctx.port, &request).await?;

        let status = if confirmation.approved {
            TransactionStatus::Succeeded
        } else {
            TransactionStatus::Failed
        };
        self.finalize(
            transaction,
            status,
            confirmation.tracking_code,
            confirmation.message,
        )
        .await
    }
}

/// Appends `transaction_id=<id>` to a callback URL.
fn with_transaction_id(base: &str, id: TransactionId) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", base, separator, TRANSACTION_ID_PARAM, id)
}
