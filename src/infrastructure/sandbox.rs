use crate::domain::gateway::{Confirmation, ConfirmRequest, TokenRequest};
use crate::domain::port::PortId;
use crate::domain::ports::BankClient;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SandboxPolicy {
    #[default]
    Approve,
    Decline,
}

/// Deterministic in-process stand-in for the banks.
///
/// Issues tokens of the form `<PORT>-<transaction>-<seq>`, remembers which
/// transaction each token belongs to, and approves or declines confirmations
/// according to its policy. Confirming an unknown or mismatched token is a
/// decline, not an error.
#[derive(Clone, Default)]
pub struct SandboxBank {
    policy: SandboxPolicy,
    issued: Arc<Mutex<HashMap<String, u64>>>,
    sequence: Arc<AtomicU64>,
    confirmations: Arc<AtomicUsize>,
}

impl SandboxBank {
    pub fn new(policy: SandboxPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Number of confirmation calls received so far.
    pub fn confirmations(&self) -> usize {
        self.confirmations.load(Ordering::SeqCst)
    }

    fn issued(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, u64>>> {
        self.issued
            .lock()
            .map_err(|_| PaymentError::Gateway("Sandbox token table poisoned".to_string()))
    }
}

#[async_trait]
impl BankClient for SandboxBank {
    async fn request_token(&self, port: PortId, request: &TokenRequest) -> Result<String> {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let prefix = port.name().unwrap_or("PORT");
        let token = format!("{}-{}-{}", prefix, request.transaction_id, seq);
        self.issued()?.insert(token.clone(), request.transaction_id.0);
        debug!(%port, transaction_id = %request.transaction_id, %token, "sandbox token issued");
        Ok(token)
    }

    async fn confirm(&self, port: PortId, request: &ConfirmRequest) -> Result<Confirmation> {
        self.confirmations.fetch_add(1, Ordering::SeqCst);

        // Tokens issued by an earlier process are unknown here; accept those
        // whose shape still names this transaction.
        let known = match self.issued()?.get(&request.reference) {
            Some(owner) => *owner == request.transaction_id.0,
            None => request
                .reference
                .starts_with(&format!("{}-{}-", port.name().unwrap_or("PORT"), request.transaction_id)),
        };

        let confirmation = match (known, self.policy) {
            (true, SandboxPolicy::Approve) => Confirmation {
                approved: true,
                tracking_code: Some(format!("{:012}", request.transaction_id.0.wrapping_mul(7919))),
                message: None,
            },
            (true, SandboxPolicy::Decline) => Confirmation {
                approved: false,
                tracking_code: None,
                message: Some("Declined by payer".to_string()),
            },
            (false, _) => Confirmation {
                approved: false,
                tracking_code: None,
                message: Some("Unknown payment reference".to_string()),
            },
        };
        Ok(confirmation)
    }
}
