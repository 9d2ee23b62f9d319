//! Behpardakht Mellat. Payments are opened with a `RefId` that the payer's
//! browser posts back to the bank.

use super::{BankGateway, PortProtocol, RedirectTarget};
use crate::domain::gateway::RedirectMethod;
use crate::error::Result;
use crate::infrastructure::config::Settings;
use std::collections::BTreeMap;

const START_PAY_URL: &str = "https://bpm.shaparak.ir/pgwchannel/startpay.mellat";

pub struct Mellat;

impl PortProtocol for Mellat {
    const SECTION: &'static str = "mellat";
    const CREDENTIALS: &'static [&'static str] = &["terminal_id", "username", "password"];

    fn redirect_target(reference: &str, _settings: &Settings<'_>) -> Result<RedirectTarget> {
        let mut fields = BTreeMap::new();
        fields.insert("RefId".to_string(), reference.to_string());
        Ok(RedirectTarget {
            url: START_PAY_URL.to_string(),
            method: RedirectMethod::Post,
            fields,
        })
    }
}

pub type MellatGateway = BankGateway<Mellat>;
