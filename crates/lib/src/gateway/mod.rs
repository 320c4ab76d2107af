//! Gateway: webhook ingress HTTP server and reply delivery.

mod server;

pub use server::{build_router, run_gateway, spawn_processor, GatewayState};
