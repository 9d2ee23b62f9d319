//! Domain entities and the ports through which the application reaches its
//! collaborators.

pub mod gateway;
pub mod port;
pub mod ports;
pub mod request;
pub mod transaction;
