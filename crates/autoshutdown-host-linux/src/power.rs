//! Power-off actions

use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

use autoshutdown_config::HostConfig;
use autoshutdown_host_api::{HostResult, ShutdownAction};

use crate::run_command;

/// Powers the machine off by running an external command
pub struct CommandPowerOff {
    argv: Vec<String>,
    timeout: Duration,
}

impl CommandPowerOff {
    pub fn new(argv: Vec<String>, timeout: Duration) -> Self {
        Self { argv, timeout }
    }

    pub fn from_config(config: &HostConfig) -> Self {
        Self::new(config.poweroff_command.clone(), config.command_timeout)
    }
}

#[async_trait]
impl ShutdownAction for CommandPowerOff {
    async fn power_off(&self) -> HostResult<()> {
        info!(command = %self.describe(), "Running power-off command");
        run_command(&self.argv, self.timeout).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.argv.join(" ")
    }
}

/// Logs instead of powering off
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunPowerOff;

#[async_trait]
impl ShutdownAction for DryRunPowerOff {
    async fn power_off(&self) -> HostResult<()> {
        warn!("Dry run: skipping power-off");
        Ok(())
    }

    fn describe(&self) -> String {
        "dry run, no power-off".to_string()
    }
}
