use super::port::PortId;
use crate::error::PaymentError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Store-assigned identifier of a transaction. Always greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransactionId {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(PaymentError::InvalidRequest(format!(
                "Malformed transaction id: {:?}",
                s
            ))),
            Ok(id) => Ok(Self(id)),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Succeeded,
    Failed,
}

impl TransactionStatus {
    /// `Succeeded` and `Failed` are final: once reached, the status never changes.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "PENDING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

/// Represents a positive payment amount.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PaymentError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PaymentError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The data a gateway hands to the store when it opens a new payment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub port_id: PortId,
    pub amount: Amount,
    pub description: Option<String>,
    pub mobile: Option<String>,
}

/// Persisted record of a single payment attempt.
///
/// Only `status`, `reference` and `tracking_code` change after creation, and
/// only through the store's conditional operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// The gateway that opened this payment. Never changes.
    pub port_id: PortId,
    pub status: TransactionStatus,
    pub amount: Amount,
    pub description: Option<String>,
    pub mobile: Option<String>,
    /// Token or authority issued by the bank when the payment was opened.
    pub reference: Option<String>,
    /// Bank receipt number, set when the payment succeeds.
    pub tracking_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(id: TransactionId, new: NewTransaction) -> Self {
        let now = Utc::now();
        Self {
            id,
            port_id: new.port_id,
            status: TransactionStatus::Pending,
            amount: new.amount,
            description: new.description,
            mobile: new.mobile,
            reference: None,
            tracking_code: None,
            created_at: now,
            updated_at: now,
        }
    }
}
