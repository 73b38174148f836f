//! `shadowpilot replay`: run a recorded session through both agents.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use shadowpilot_backend_http::HttpBackendClient;
use shadowpilot_config::Config;
use shadowpilot_observer::PageDocument;
use shadowpilot_protocols::ToolService;
use shadowpilot_runtime::{fixed_auth, AuthMonitor, Pipeline, RecordedSession};

pub(crate) async fn run(
    config: &Config,
    session_path: &Path,
    assume_authenticated: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = RecordedSession::load(session_path)?;
    info!(
        "Replaying {} ({} steps)",
        session_path.display(),
        session.steps.len()
    );

    let client = Arc::new(HttpBackendClient::new(&config.backend)?);
    let cancel = CancellationToken::new();

    match client.health().await {
        Ok(health) => info!(
            status = %health.status,
            service = %health.service,
            auth_status = %health.auth_status,
            "Backend reachable at {}",
            client.base_url()
        ),
        Err(e) => warn!("Backend at {} not reachable: {}", client.base_url(), e),
    }

    let authenticated = if assume_authenticated {
        fixed_auth(true)
    } else {
        let (monitor, authenticated) =
            AuthMonitor::new(client.clone(), config.timing.auth_poll_interval());
        if !monitor.check().await {
            match monitor.login().await {
                Ok(response) => info!(status = ?response.status, "Sign-in required"),
                Err(e) => warn!("Login request failed: {}", e),
            }
        }
        tokio::spawn(monitor.run(cancel.clone()));
        authenticated
    };

    let document = PageDocument::from_snapshot(session.page.clone());
    let tools: Arc<dyn ToolService> = client.clone();
    let mut pipeline = Pipeline::start_with_tools(
        config,
        document,
        client,
        Some(tools),
        authenticated,
        cancel.clone(),
    )?;
    let mut events = pipeline.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => warn!("Failed to serialize panel event: {}", e),
                },
                Err(RecvError::Lagged(skipped)) => warn!("Skipped {} panel events", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    tokio::select! {
        result = pipeline.replay(&session.steps) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping replay");
            cancel.cancel();
        }
    }

    let transcript = pipeline.finish().await?;
    cancel.cancel();
    let _ = printer.await;
    info!("Replay finished with {} transcript entries", transcript.len());
    Ok(())
}
