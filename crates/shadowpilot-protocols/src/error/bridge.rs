//! Bridge (intra-extension channel) errors.

use thiserror::Error;

use super::protocol::ProtocolError;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The other execution context is gone (torn down or reloaded).
    #[error("Bridge channel closed")]
    ChannelClosed,

    /// A message could not be encoded to, or decoded from, the wire format.
    #[error("Malformed bridge message: {0}")]
    Malformed(#[from] ProtocolError),

    #[error("Bridge request timed out after {0} ms")]
    Timeout(u64),

    /// The receiver dropped the acknowledgment handle without answering.
    #[error("Acknowledgment dropped")]
    AckDropped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_closed_error() {
        let err = BridgeError::ChannelClosed;
        assert!(err.to_string().contains("closed"));
    }

    #[test]
    fn test_malformed_from_protocol_error() {
        let err: BridgeError = ProtocolError::InvalidPayload("missing label".to_string()).into();
        assert!(matches!(err, BridgeError::Malformed(_)));
        assert!(err.to_string().contains("missing label"));
    }

    #[test]
    fn test_timeout_error() {
        let err = BridgeError::Timeout(2000);
        assert!(err.to_string().contains("2000"));
    }

    #[test]
    fn test_error_debug() {
        let debug = format!("{:?}", BridgeError::AckDropped);
        assert!(debug.contains("AckDropped"));
    }
}
