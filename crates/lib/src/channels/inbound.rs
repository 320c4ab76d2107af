//! Inbound message from a channel: delivered to the gateway for pipeline handling.

/// A single user text message from a channel, with the opaque reply handle
/// needed to answer it. Created per webhook event, discarded after one
/// pipeline run.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub channel_id: String,
    pub reply_token: String,
    pub text: String,
}
