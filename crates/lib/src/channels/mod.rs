//! Communication channels (e.g. LINE).
//!
//! Channel trait and registry so the gateway can deliver replies without
//! knowing the platform transport. Inbound messages are sent to the gateway
//! for pipeline handling.

mod inbound;
mod line;
mod registry;

pub use inbound::InboundMessage;
pub use line::{verify_signature, LineChannel, MessageContent, WebhookEnvelope, WebhookEvent};
pub use registry::{ChannelHandle, ChannelRegistry};
