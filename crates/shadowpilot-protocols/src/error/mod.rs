//! Error types for ShadowPilot protocols.

mod backend;
mod bridge;
mod protocol;

pub use backend::BackendError;
pub use bridge::BridgeError;
pub use protocol::ProtocolError;
