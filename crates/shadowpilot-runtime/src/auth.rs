//! Authentication gate.
//!
//! Polls the backend's auth status and publishes a single "signed in" flag
//! on a `watch` channel. The panel only reads the flag. On sign-in the
//! monitor looks up who signed in, for the log.

use std::sync::Arc;
use std::time::Duration;

use shadowpilot_protocols::{AuthService, AuthStatusResponse, BackendError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct AuthMonitor {
    service: Arc<dyn AuthService>,
    interval: Duration,
    tx: watch::Sender<bool>,
}

impl AuthMonitor {
    /// Starts signed out until the first successful check.
    pub fn new(service: Arc<dyn AuthService>, interval: Duration) -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        let monitor = Self {
            service,
            interval,
            tx,
        };
        (monitor, rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        *self.tx.borrow()
    }

    /// Poll once. A failed poll keeps the previous state.
    pub async fn check(&self) -> bool {
        match self.service.status().await {
            Ok(status) => {
                let authenticated = status.is_authenticated();
                if self.publish(authenticated) && authenticated {
                    self.log_profile().await;
                }
                authenticated
            }
            Err(e) => {
                warn!("Auth status check failed: {}", e);
                self.is_authenticated()
            }
        }
    }

    /// Start the device-code login flow.
    pub async fn login(&self) -> Result<AuthStatusResponse, BackendError> {
        let response = self.service.login().await?;
        if response.is_authenticated() {
            if self.publish(true) {
                self.log_profile().await;
            }
        } else if let (Some(code), Some(uri)) = (&response.user_code, &response.verification_uri) {
            info!(user_code = %code, verification_uri = %uri, "Sign in to continue");
        } else {
            debug!(status = ?response.status, "Login started");
        }
        Ok(response)
    }

    /// Poll every `interval` until cancelled.
    pub async fn run(self, cancel: CancellationToken) {
        info!("Auth monitor started (poll interval: {:?})", self.interval);
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Auth monitor shutting down");
                    break;
                }
                _ = interval.tick() => {
                    self.check().await;
                }
            }
        }
    }

    /// Returns whether the flag changed.
    fn publish(&self, authenticated: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == authenticated {
                return false;
            }
            *current = authenticated;
            true
        });
        if changed {
            info!(authenticated, "Auth state changed");
        }
        changed
    }

    async fn log_profile(&self) {
        match self.service.profile().await {
            Ok(profile) => info!(user = profile.name().unwrap_or("unknown"), "Signed in"),
            Err(e) => debug!("Profile unavailable: {}", e),
        }
    }
}

/// A flag that never changes, for offline replays.
pub fn fixed_auth(authenticated: bool) -> watch::Receiver<bool> {
    let (_tx, rx) = watch::channel(authenticated);
    rx
}
