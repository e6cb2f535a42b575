/// AEGIS Fleet SDK
///
/// Drive agent nodes and the fleet manager from Rust.

pub mod client;
pub mod types;

pub use client::FleetClient;
pub use types::*;
