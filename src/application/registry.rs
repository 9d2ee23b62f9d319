use crate::domain::port::PortId;
use crate::domain::ports::{GatewayBox, GatewayContext, GatewayFactory};
use crate::error::{PaymentError, Result};
use crate::infrastructure::gateways::{MellatGateway, SadadGateway, ZarinpalGateway};
use tracing::debug;

/// Maps port identifiers to gateway factories.
///
/// Registration order is the order reported by [`supported_ports`](Self::supported_ports).
#[derive(Default)]
pub struct PortRegistry {
    factories: Vec<(PortId, GatewayFactory)>,
}

impl PortRegistry {
    /// An empty registry; every `build` fails with `PortNotFound`.
    pub fn new() -> Self {
        Self::default()
    }

    /// MELLAT, SADAD and ZARINPAL, in that order.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            PortId::MELLAT,
            Box::new(|ctx: GatewayContext| Box::new(MellatGateway::new(ctx)) as GatewayBox),
        );
        registry.register(
            PortId::SADAD,
            Box::new(|ctx: GatewayContext| Box::new(SadadGateway::new(ctx)) as GatewayBox),
        );
        registry.register(
            PortId::ZARINPAL,
            Box::new(|ctx: GatewayContext| Box::new(ZarinpalGateway::new(ctx)) as GatewayBox),
        );
        registry
    }

    /// Adds a gateway. Re-registering a port replaces its factory in place.
    pub fn register(&mut self, port: PortId, factory: GatewayFactory) {
        match self.factories.iter_mut().find(|(id, _)| *id == port) {
            Some(entry) => entry.1 = factory,
            None => self.factories.push((port, factory)),
        }
    }

    pub fn supported_ports(&self) -> Vec<PortId> {
        self.factories.iter().map(|(id, _)| *id).collect()
    }

    pub fn supports(&self, port: PortId) -> bool {
        self.factories.iter().any(|(id, _)| *id == port)
    }

    /// Builds the gateway registered for `ctx.port`.
    ///
    /// An unknown port fails before any factory runs.
    pub fn build(&self, ctx: GatewayContext) -> Result<GatewayBox> {
        let port = ctx.port;
        let (_, factory) = self
            .factories
            .iter()
            .find(|(id, _)| *id == port)
            .ok_or(PaymentError::PortNotFound(port))?;
        debug!(%port, "building gateway");
        Ok(factory(ctx))
    }
}
