//! Sadad (Bank Melli). The purchase page takes the issued token as a query
//! parameter.

use super::{BankGateway, PortProtocol, RedirectTarget};
use crate::domain::gateway::RedirectMethod;
use crate::error::Result;
use crate::infrastructure::config::Settings;
use std::collections::BTreeMap;
use url::Url;

const PURCHASE_URL: &str = "https://sadad.shaparak.ir/VPG/Purchase";

pub struct Sadad;

impl PortProtocol for Sadad {
    const SECTION: &'static str = "sadad";
    const CREDENTIALS: &'static [&'static str] = &["merchant_id", "terminal_id", "terminal_key"];

    fn redirect_target(reference: &str, _settings: &Settings<'_>) -> Result<RedirectTarget> {
        let url = Url::parse_with_params(PURCHASE_URL, &[("Token", reference)])?;
        Ok(RedirectTarget {
            url: url.into(),
            method: RedirectMethod::Get,
            fields: BTreeMap::new(),
        })
    }
}

pub type SadadGateway = BankGateway<Sadad>;
