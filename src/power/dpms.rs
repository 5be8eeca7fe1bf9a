use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::core::{Error, Result};
use super::{ActuationError, PowerControl, PowerSource};

/// Wait after enabling DPMS before forcing a level, otherwise the X server
/// may ignore the forced level.
const ENABLE_SETTLE: Duration = Duration::from_millis(100);

/// X11 DPMS adapter driven through the `xset` utility
#[derive(Debug, Clone)]
pub struct XsetDpms {
    /// Display selector, e.g. `:0`
    display: Option<String>,
}

impl XsetDpms {
    /// Connects to a display, `None` for the default one
    ///
    /// Fails if the display cannot be reached.
    pub async fn open(display: Option<String>) -> Result<Self> {
        let dpms = XsetDpms { display };
        dpms.xset(&["q"]).await.map_err(|e| {
            Error::display(format!("Cannot connect to display {}: {}", dpms.display_name(), e))
        })?;
        Ok(dpms)
    }

    /// Name of the display in use
    pub fn display_name(&self) -> String {
        self.display
            .clone()
            .or_else(|| std::env::var("DISPLAY").ok())
            .unwrap_or_else(|| ":0".to_string())
    }

    /// Disables the screen saver and DPMS timeouts so the power state only
    /// changes when it is forced.
    pub async fn reset(&self) -> std::result::Result<(), ActuationError> {
        self.xset(&["s", "off"]).await?;
        self.xset(&["dpms", "0", "0", "0"]).await?;
        Ok(())
    }

    async fn xset(&self, args: &[&str]) -> std::result::Result<String, ActuationError> {
        let mut cmd = Command::new("xset");
        if let Some(display) = &self.display {
            cmd.arg("-display").arg(display);
        }
        let output = cmd.args(args).kill_on_drop(true).output().await?;

        if !output.status.success() {
            return Err(ActuationError::CommandFailed(format!(
                "xset {} exited with {}: {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl PowerSource for XsetDpms {
    async fn get_power(&mut self) -> Option<bool> {
        match self.xset(&["q"]).await {
            Ok(output) => parse_query(&output),
            Err(e) => {
                debug!("DPMS query failed: {}", e);
                None
            }
        }
    }
}

impl PowerControl for XsetDpms {
    async fn set_power(&mut self, on: bool) -> std::result::Result<(), ActuationError> {
        let query = self.xset(&["q"]).await?;
        if parse_query(&query).is_none() {
            return Err(ActuationError::Unsupported);
        }

        self.xset(&["+dpms"]).await?;
        tokio::time::sleep(ENABLE_SETTLE).await;
        self.reset().await?;
        self.xset(&["dpms", "force", if on { "on" } else { "off" }]).await?;
        Ok(())
    }
}

/// Extracts the power state from `xset q` output
///
/// The monitor counts as on unless DPMS is enabled and reports it off.
/// Returns `None` when the server has no DPMS extension.
pub(crate) fn parse_query(output: &str) -> Option<bool> {
    let mut in_dpms = false;
    let mut enabled = None;
    let mut monitor = None;

    for line in output.lines().map(str::trim) {
        if line.contains("does not have the DPMS Extension") {
            return None;
        }
        if line.starts_with("DPMS (") {
            in_dpms = true;
            continue;
        }
        if !in_dpms {
            continue;
        }

        match line {
            "DPMS is Enabled" => enabled = Some(true),
            "DPMS is Disabled" => enabled = Some(false),
            _ => {
                if let Some(state) = line.strip_prefix("Monitor is ") {
                    monitor = Some(state.trim());
                }
            }
        }
    }

    match (enabled, monitor) {
        (Some(false), _) => Some(true),
        (Some(true), Some(state)) => Some(!state.eq_ignore_ascii_case("off")),
        _ => None,
    }
}
