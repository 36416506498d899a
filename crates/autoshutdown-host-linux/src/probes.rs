//! System metric probes backed by procfs, `ss`, and `who`

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

use autoshutdown_config::HostConfig;
use autoshutdown_host_api::{HostError, HostResult, SampleSource};

use crate::run_command;

/// Reads metrics from the local Linux host
pub struct LinuxSampleSource {
    loadavg_path: PathBuf,
    ssh_port: u16,
    command_timeout: Duration,
}

impl LinuxSampleSource {
    pub fn new(config: &HostConfig) -> Self {
        Self {
            loadavg_path: config.loadavg_path.clone(),
            ssh_port: config.ssh_port,
            command_timeout: config.command_timeout,
        }
    }

    fn ss_argv(&self) -> Vec<String> {
        vec![
            "ss".into(),
            "-H".into(),
            "-t".into(),
            "-n".into(),
            "state".into(),
            "established".into(),
            format!("sport = :{}", self.ssh_port),
        ]
    }
}

#[async_trait]
impl SampleSource for LinuxSampleSource {
    async fn read_load(&self) -> HostResult<f64> {
        let content = tokio::fs::read_to_string(&self.loadavg_path).await?;
        parse_loadavg(&content)
    }

    async fn count_ssh_sessions(&self) -> HostResult<u32> {
        let output = run_command(&self.ss_argv(), self.command_timeout).await?;
        Ok(count_lines(&output))
    }

    async fn count_logged_in_users(&self) -> HostResult<u32> {
        let output = run_command(&["who".to_string()], self.command_timeout).await?;
        Ok(count_lines(&output))
    }
}

/// Extract the 5-minute average from `/proc/loadavg` content
pub fn parse_loadavg(content: &str) -> HostResult<f64> {
    let field = content
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| HostError::parse("loadavg", format!("too few fields in {:?}", content.trim())))?;

    let load: f64 = field
        .parse()
        .map_err(|e| HostError::parse("loadavg", format!("{:?}: {}", field, e)))?;

    if !load.is_finite() || load < 0.0 {
        return Err(HostError::parse("loadavg", format!("implausible value {}", load)));
    }

    Ok(load)
}

/// Count non-blank lines, one per session in `ss -H` and `who` output
pub fn count_lines(output: &str) -> u32 {
    let count = output.lines().filter(|line| !line.trim().is_empty()).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}
