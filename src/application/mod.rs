//! Application layer: the port registry and the payment router that sits in
//! front of every gateway.

pub mod registry;
pub mod router;
