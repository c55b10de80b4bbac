pub mod client;
pub mod payload;

pub use client::UtmifyClient;
pub use payload::{OrderInput, OrderStatus, build_order};
