//! Zarinpal. The issued authority is part of the start-pay path; the
//! `zarinpal.sandbox` flag switches to the sandbox host.

use super::{BankGateway, PortProtocol, RedirectTarget};
use crate::domain::gateway::RedirectMethod;
use crate::error::{PaymentError, Result};
use crate::infrastructure::config::Settings;
use std::collections::BTreeMap;
use url::Url;

const LIVE_HOST: &str = "https://www.zarinpal.com";
const SANDBOX_HOST: &str = "https://sandbox.zarinpal.com";

pub struct Zarinpal;

impl PortProtocol for Zarinpal {
    const SECTION: &'static str = "zarinpal";
    const CREDENTIALS: &'static [&'static str] = &["merchant_id"];

    fn redirect_target(reference: &str, settings: &Settings<'_>) -> Result<RedirectTarget> {
        let host = if settings.flag(Self::SECTION, "sandbox") {
            SANDBOX_HOST
        } else {
            LIVE_HOST
        };
        let mut url = Url::parse(host)?;
        url.path_segments_mut()
            .map_err(|_| PaymentError::Gateway(format!("{} cannot carry a path", host)))?
            .pop_if_empty()
            .extend(["pg", "StartPay", reference]);
        Ok(RedirectTarget {
            url: url.into(),
            method: RedirectMethod::Get,
            fields: BTreeMap::new(),
        })
    }
}

pub type ZarinpalGateway = BankGateway<Zarinpal>;
