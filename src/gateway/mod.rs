pub mod client;
pub mod mock;

pub use client::{ChargeItem, ChargeOutcome, ChargeRequest, CustomerAddress, GatewayClient};
