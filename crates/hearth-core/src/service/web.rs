//! OpenAI-compatible web service process
//! Starts the local service on demand and stops it only if this run owns it

use std::process::{ExitStatus, Stdio};
use std::sync::Mutex;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::{ServiceConfig, WebServiceConfig};
use crate::error::{Error, Result};

/// Interval between readiness probes
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Placeholder in the start and stop commands replaced by the configured bind address
const URLS_PLACEHOLDER: &str = "{urls}";

/// A web service this handle started
enum Owned {
    /// Our child process is, or launched, the service
    Child { child: Child, urls: String },
    /// The launcher returned successfully and left the service running
    Detached { urls: String },
}

/// Handle on the local web service
pub struct LocalWebService {
    start_command: Vec<String>,
    stop_command: Vec<String>,
    startup_timeout: Duration,
    http: reqwest::Client,
    owned: Mutex<Option<Owned>>,
}

impl LocalWebService {
    pub fn new(config: &ServiceConfig, http: reqwest::Client) -> Self {
        Self {
            start_command: config.start_command.clone(),
            stop_command: config.stop_command.clone(),
            startup_timeout: config.startup_timeout(),
            http,
            owned: Mutex::new(None),
        }
    }

    /// Check whether something already answers at `web.urls`
    pub async fn is_running(&self, web: &WebServiceConfig) -> bool {
        let url = format!("{}/openai/status", web.urls.trim_end_matches('/'));
        match self
            .http
            .get(&url)
            .timeout(Duration::from_secs(2))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Start the service if it is not running. Returns `true` if it was started here.
    pub async fn start(&self, web: &WebServiceConfig) -> Result<bool> {
        if self.is_running(web).await {
            debug!("Web service already answering at {}", web.urls);
            return Ok(false);
        }

        let (program, args) = expand(&self.start_command, &web.urls)
            .ok_or_else(|| Error::ConfigError("service.start_command is empty".to_string()))?;

        info!("Starting web service: {} {}", program, args.join(" "));

        let child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::ServiceError(format!("Failed to start web service: {}", e)))?;

        self.replace_owned(Some(Owned::Child {
            child,
            urls: web.urls.clone(),
        }));

        let deadline = Instant::now() + self.startup_timeout;
        while Instant::now() < deadline {
            sleep(POLL_INTERVAL).await;

            if self.is_running(web).await {
                info!("Web service listening on {}", web.urls);
                return Ok(true);
            }

            match self.child_exit()? {
                Some(status) if status.success() => {
                    debug!("Launcher returned, waiting for web service at {}", web.urls);
                    self.replace_owned(Some(Owned::Detached {
                        urls: web.urls.clone(),
                    }));
                }
                Some(status) => {
                    self.replace_owned(None);
                    return Err(Error::ServiceError(format!(
                        "Web service exited during startup ({})",
                        status
                    )));
                }
                None => {}
            }
        }

        if let Err(e) = self.stop().await {
            warn!("Cleanup after failed web service start: {}", e);
        }
        Err(Error::ServiceError(format!(
            "Web service did not answer at {} within {}s",
            web.urls,
            self.startup_timeout.as_secs()
        )))
    }

    /// Stop the service if this handle started it
    pub async fn stop(&self) -> Result<()> {
        match self.replace_owned(None) {
            None => Ok(()),
            Some(Owned::Child { mut child, urls }) => match child.try_wait()? {
                // The service outlived the process we spawned
                Some(_) => self.run_stop_command(&urls).await,
                None => {
                    info!("Stopping web service");
                    child.kill().await.map_err(|e| {
                        Error::ServiceError(format!("Failed to stop web service: {}", e))
                    })
                }
            },
            Some(Owned::Detached { urls }) => self.run_stop_command(&urls).await,
        }
    }

    pub fn owns_process(&self) -> bool {
        self.owned
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    async fn run_stop_command(&self, urls: &str) -> Result<()> {
        let Some((program, args)) = expand(&self.stop_command, urls) else {
            warn!(
                "No service.stop_command configured; web service at {} left running",
                urls
            );
            return Ok(());
        };

        info!("Stopping web service: {} {}", program, args.join(" "));

        let output = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::ServiceError(format!("Failed to run stop command: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ServiceError(format!(
                "Stop command failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn replace_owned(&self, owned: Option<Owned>) -> Option<Owned> {
        let mut guard = self.owned.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *guard, owned)
    }

    /// Exit status of our child, if we still hold one and it has finished
    fn child_exit(&self) -> Result<Option<ExitStatus>> {
        let mut guard = self.owned.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_mut() {
            Some(Owned::Child { child, .. }) => Ok(child.try_wait()?),
            _ => Ok(None),
        }
    }
}

/// Split a configured command into program and arguments with `{urls}` filled in
fn expand(command: &[String], urls: &str) -> Option<(String, Vec<String>)> {
    let (program, args) = command.split_first()?;
    let args = args
        .iter()
        .map(|a| a.replace(URLS_PLACEHOLDER, urls))
        .collect();
    Some((program.clone(), args))
}
