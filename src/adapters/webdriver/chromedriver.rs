//! chromedriver child process
//!
//! Spawns chromedriver on a local port, waits until its `/status` endpoint
//! reports ready, and stops it again at teardown. The process is killed when
//! the handle is dropped so an aborted run never leaves it behind.

use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::domain::errors::AutomationError;

const READY_POLL: Duration = Duration::from_millis(250);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle to a spawned chromedriver. Killed on drop if not stopped.
pub struct ChromeDriverProcess {
    child: Option<Child>,
    port: u16,
}

impl ChromeDriverProcess {
    /// Start chromedriver and wait until it accepts sessions.
    pub async fn spawn(
        path: &str,
        port: u16,
        startup_timeout: Duration,
    ) -> Result<Self, AutomationError> {
        info!(path, port, "Starting chromedriver");
        let child = Command::new(path)
            .arg(format!("--port={port}"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AutomationError::Driver(format!("failed to spawn {path}: {e}")))?;

        let mut process = Self {
            child: Some(child),
            port,
        };
        if let Err(err) = process.wait_ready(startup_timeout).await {
            process.stop().await;
            return Err(err);
        }
        info!(url = %process.url(), "chromedriver ready");
        Ok(process)
    }

    /// Base URL of the driver's HTTP endpoint.
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    async fn wait_ready(&mut self, timeout: Duration) -> Result<(), AutomationError> {
        let http = reqwest::Client::builder()
            .timeout(READY_POLL * 4)
            .build()
            .map_err(|e| AutomationError::Transport(e.to_string()))?;
        let status_url = format!("{}/status", self.url());
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(child) = self.child.as_mut() {
                if let Ok(Some(status)) = child.try_wait() {
                    return Err(AutomationError::Driver(format!(
                        "chromedriver exited during startup ({status})"
                    )));
                }
            }

            match http.get(&status_url).send().await {
                Ok(response) => {
                    let body: serde_json::Value = response.json().await.unwrap_or_default();
                    if body["value"]["ready"].as_bool().unwrap_or(false) {
                        return Ok(());
                    }
                    debug!("chromedriver not ready yet");
                }
                Err(e) => debug!(error = %e, "chromedriver status unavailable"),
            }

            if Instant::now() >= deadline {
                return Err(AutomationError::Driver(format!(
                    "chromedriver not ready after {}s",
                    timeout.as_secs()
                )));
            }
            sleep(READY_POLL).await;
        }
    }

    /// Kill the process and wait for it to exit.
    pub async fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        if let Err(e) = child.start_kill() {
            warn!(error = ?e, "Failed to send kill signal to chromedriver");
        }

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, child.wait()).await {
            Ok(Ok(status)) => info!(?status, "chromedriver exited"),
            Ok(Err(e)) => error!(error = ?e, "Error waiting for chromedriver to exit"),
            Err(_) => {
                warn!("chromedriver shutdown timeout, forcing kill");
                let _ = child.kill().await;
            }
        }
    }
}

impl Drop for ChromeDriverProcess {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.start_kill();
        }
    }
}
