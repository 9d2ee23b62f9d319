//! Values exchanged between the router, the gateway integrations and the bank
//! client.

use super::port::PortId;
use super::transaction::{Amount, Transaction, TransactionId, TransactionStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a caller supplies to open a new payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: Amount,
    pub description: Option<String>,
    pub mobile: Option<String>,
}

impl PaymentRequest {
    pub fn new(amount: Amount) -> Self {
        Self {
            amount,
            description: None,
            mobile: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RedirectMethod {
    Get,
    Post,
}

/// Where to send the payer's browser to complete a payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Redirect {
    pub transaction_id: TransactionId,
    pub port_id: PortId,
    pub url: String,
    pub method: RedirectMethod,
    /// Form fields to post along with the redirect. Empty for `GET` redirects.
    pub fields: BTreeMap<String, String>,
}

/// Result of verifying a transaction with its gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyOutcome {
    pub transaction_id: TransactionId,
    pub port_id: PortId,
    /// Always terminal.
    pub status: TransactionStatus,
    pub tracking_code: Option<String>,
    pub message: Option<String>,
}

impl VerifyOutcome {
    pub fn is_success(&self) -> bool {
        self.status == TransactionStatus::Succeeded
    }
}

/// Per-port settings read from configuration, keyed without the port prefix
/// (`terminal_id`, `merchant_id`, ...).
pub type Credentials = BTreeMap<String, String>;

/// Asks the bank for a payment token or authority.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRequest {
    pub transaction_id: TransactionId,
    pub amount: Amount,
    pub callback_url: String,
    pub description: Option<String>,
    pub mobile: Option<String>,
    pub credentials: Credentials,
}

/// Asks the bank to confirm a payment opened with `reference`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmRequest {
    pub transaction_id: TransactionId,
    pub amount: Amount,
    pub reference: String,
    pub credentials: Credentials,
}

impl ConfirmRequest {
    pub fn for_transaction(
        transaction: &Transaction,
        reference: String,
        credentials: Credentials,
    ) -> Self {
        Self {
            transaction_id: transaction.id,
            amount: transaction.amount,
            reference,
            credentials,
        }
    }
}

/// The bank's answer to a [`ConfirmRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub approved: bool,
    pub tracking_code: Option<String>,
    pub message: Option<String>,
}
