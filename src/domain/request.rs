use super::transaction::TransactionId;
use crate::error::{PaymentError, Result};
use std::collections::HashMap;
use url::form_urlencoded;

/// Query parameter the gateways append to their callback URLs.
pub const TRANSACTION_ID_PARAM: &str = "transaction_id";

/// Inbound verification request, typically built from the query string of a
/// gateway callback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerifyRequest {
    params: HashMap<String, String>,
}

impl VerifyRequest {
    pub fn new(params: HashMap<String, String>) -> Self {
        Self { params }
    }

    pub fn for_transaction(id: TransactionId) -> Self {
        let mut params = HashMap::new();
        params.insert(TRANSACTION_ID_PARAM.to_string(), id.to_string());
        Self { params }
    }

    /// Parses a raw `application/x-www-form-urlencoded` query string. A
    /// leading `?` is ignored and later duplicates win.
    pub fn from_query(query: &str) -> Self {
        let params = form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .into_owned()
            .collect();
        Self { params }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The transaction this request refers to.
    ///
    /// Fails with `InvalidRequest` when the parameter is absent or is not a
    /// positive integer.
    pub fn transaction_id(&self) -> Result<TransactionId> {
        let raw = self.param(TRANSACTION_ID_PARAM).ok_or_else(|| {
            PaymentError::InvalidRequest(format!("Missing `{}` parameter", TRANSACTION_ID_PARAM))
        })?;
        raw.parse()
    }
}
