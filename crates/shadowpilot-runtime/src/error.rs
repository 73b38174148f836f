//! Runtime errors.

use shadowpilot_observer::ObserverError;
use shadowpilot_protocols::BridgeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Observer error: {0}")]
    Observer(#[from] ObserverError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Invalid recorded session: {0}")]
    Session(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The agent's task has exited and no longer accepts input.
    #[error("{0} agent stopped")]
    Stopped(&'static str),
}
