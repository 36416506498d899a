//! autoshutdownd - idle-detection self-shutdown daemon
//!
//! This is the main entry point for the service. It:
//! - Loads configuration (file, environment, command line)
//! - Detects the cloud platform and runs pre-flight checks
//! - Runs the monitor loop until the machine powers off or a signal arrives

use anyhow::{Context, Result};
use autoshutdown_config::{
    RawConfig, Settings, apply_env_overrides, finalize_with_errors, load_raw,
};
use autoshutdown_core::MonitorLoop;
use autoshutdown_host_api::{
    PlatformDetector, PlatformKind, SampleSource, ShutdownAction, Sleeper, TokioSleeper,
};
use autoshutdown_host_linux::{
    CommandPowerOff, DryRunPowerOff, LinuxSampleSource, MetadataDetector, running_as_root,
};
use autoshutdown_util::{AUTO_SHUTDOWN_CONFIG_ENV, AutoShutdownError, default_config_path};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// autoshutdownd - Power off a cloud VM once it has been idle for a while
#[derive(Parser, Debug)]
#[command(name = "autoshutdownd")]
#[command(about = "Power off a cloud VM once it has been idle for a while", long_about = None)]
struct Args {
    /// Configuration file path (default: $AUTO_SHUTDOWN_CONFIG or /etc/autoshutdown/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 5-minute load average at or above which the machine counts as busy
    #[arg(long)]
    threshold: Option<f64>,

    /// Consecutive idle intervals before shutting down
    #[arg(long)]
    intervals: Option<u32>,

    /// Seconds between samples
    #[arg(long)]
    interval: Option<u64>,

    /// Seconds between the shutdown announcement and the power-off
    #[arg(long)]
    grace: Option<u64>,

    /// Seconds to wait before monitoring starts
    #[arg(long)]
    initial_delay: Option<u64>,

    /// Abort unless running on this platform (gce or azure)
    #[arg(long, value_parser = parse_platform)]
    require_platform: Option<PlatformKind>,

    /// Log instead of powering off
    #[arg(long)]
    dry_run: bool,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    /// Command-line flags take precedence over file and environment
    fn apply_overrides(&self, raw: &mut RawConfig) {
        if let Some(threshold) = self.threshold {
            raw.monitor.load_threshold = Some(threshold);
        }
        if let Some(intervals) = self.intervals {
            raw.monitor.required_idle_intervals = Some(intervals);
        }
        if let Some(interval) = self.interval {
            raw.monitor.interval_seconds = Some(interval);
        }
        if let Some(grace) = self.grace {
            raw.monitor.shutdown_grace_seconds = Some(grace);
        }
        if let Some(delay) = self.initial_delay {
            raw.monitor.initial_delay_seconds = Some(delay);
        }
        if let Some(platform) = self.require_platform {
            raw.platform.require = Some(platform);
        }
    }

    /// Config file to read, and whether it must exist
    fn config_source(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (
                default_config_path(),
                std::env::var_os(AUTO_SHUTDOWN_CONFIG_ENV).is_some(),
            ),
        }
    }
}

fn parse_platform(value: &str) -> Result<PlatformKind, String> {
    match value.to_ascii_lowercase().as_str() {
        "gce" => Ok(PlatformKind::Gce),
        "azure" => Ok(PlatformKind::Azure),
        other => Err(format!("unknown platform '{}', expected gce or azure", other)),
    }
}

/// Resolve settings: defaults < file < environment < command line.
///
/// Environment values are read through `lookup`. Bad environment values
/// and bad merged values are reported together.
fn load_settings<F>(args: &Args, mut raw: RawConfig, lookup: F) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let env_errors = apply_env_overrides(&mut raw, lookup);
    args.apply_overrides(&mut raw);
    finalize_with_errors(raw, env_errors).context("Invalid configuration")
}

/// Outcome of the pre-flight checks
#[derive(Debug, Clone, PartialEq)]
struct Preflight {
    platform: PlatformKind,

    /// Platform notice that was logged, if any
    warning: Option<&'static str>,
}

/// Main service state
struct Daemon {
    settings: Settings,
    dry_run: bool,
}

impl Daemon {
    fn new(args: &Args) -> Result<Self> {
        Self::with_env(args, |var| std::env::var(var).ok())
    }

    fn with_env<F>(args: &Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (config_path, required) = args.config_source();
        let raw = load_raw(&config_path, required)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?;
        let settings = load_settings(args, raw, lookup)?;

        info!(
            config_path = %config_path.display(),
            threshold = settings.monitor.load_threshold,
            intervals = settings.monitor.required_idle_intervals,
            interval_secs = settings.monitor.interval.as_secs(),
            "Configuration loaded"
        );

        Ok(Self {
            settings,
            dry_run: args.dry_run,
        })
    }

    /// Platform checks that run once before monitoring
    async fn preflight(&self, detector: &dyn PlatformDetector) -> Result<Preflight> {
        let platform = &self.settings.platform;
        let detected = detector.detect().await;

        if let Some(required) = platform.require
            && detected != required
        {
            let err = AutoShutdownError::platform_mismatch(
                required.display_name(),
                detected.display_name(),
            );
            error!(required = %required, detected = %detected, "{}", err);
            return Err(err.into());
        }

        let warning = match detected.preflight_warning() {
            Some(_) if platform.silence_azure_warning => {
                info!(platform = %detected, "Pre-flight warning silenced");
                None
            }
            Some(notice) => {
                warn!("{}", notice);
                Some(notice)
            }
            None => None,
        };

        if !self.dry_run && !running_as_root() {
            warn!(
                command = %self.settings.host.poweroff_command.join(" "),
                "Not running as root; power-off depends on the command being permitted"
            );
        }

        Ok(Preflight {
            platform: detected,
            warning,
        })
    }

    fn monitor(&self) -> MonitorLoop {
        let source: Arc<dyn SampleSource> = Arc::new(LinuxSampleSource::new(&self.settings.host));
        let action: Arc<dyn ShutdownAction> = if self.dry_run {
            Arc::new(DryRunPowerOff)
        } else {
            Arc::new(CommandPowerOff::from_config(&self.settings.host))
        };
        let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);

        MonitorLoop::new(self.settings.monitor.clone(), source, action, sleeper)
    }

    async fn run(self) -> Result<()> {
        let detector = MetadataDetector::new(self.settings.platform.metadata_timeout)
            .context("Failed to create metadata detector")?;
        let preflight = self.preflight(&detector).await?;
        info!(
            platform = %preflight.platform,
            warned = preflight.warning.is_some(),
            "Pre-flight checks passed"
        );

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup =
            signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        if self.dry_run {
            warn!("Dry run enabled, the machine will not be powered off");
        }

        info!("Service running");

        // Dropping the monitor future also abandons an in-progress grace
        // window, so a signal there stops the daemon without powering off.
        tokio::select! {
            _ = self.monitor().run() => {}
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully");
            }
            _ = sighup.recv() => {
                info!("Received SIGHUP, shutting down gracefully");
            }
        }

        info!("Service stopped");
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "autoshutdownd starting"
    );

    Daemon::new(&args)?.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoshutdown_config::{ConfigError, ENV_INTERVALS, ENV_SLEEP_TIME, parse_raw};
    use autoshutdown_host_api::MockHost;
    use std::io::Write;
    use std::time::Duration;

    fn args(extra: &[&str]) -> Args {
        let argv = std::iter::once("autoshutdownd").chain(extra.iter().copied());
        Args::try_parse_from(argv).unwrap()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn daemon_with(platform: autoshutdown_config::PlatformConfig) -> Daemon {
        Daemon {
            settings: Settings {
                platform,
                ..Settings::default()
            },
            dry_run: true,
        }
    }

    #[test]
    fn cli_flags_override_file_values() {
        let raw = parse_raw(
            "config_version = 1\n[monitor]\nload_threshold = 0.3\nrequired_idle_intervals = 20",
        )
        .unwrap();
        let args = args(&["--threshold", "0.05", "--interval", "10", "--grace", "0"]);

        let settings = load_settings(&args, raw, no_env).unwrap();
        assert_eq!(settings.monitor.load_threshold, 0.05);
        assert_eq!(settings.monitor.required_idle_intervals, 20);
        assert_eq!(settings.monitor.interval, Duration::from_secs(10));
        assert_eq!(settings.monitor.shutdown_grace, Duration::ZERO);
    }

    #[test]
    fn environment_sits_between_file_and_cli() {
        let raw = parse_raw("config_version = 1\n[monitor]\nrequired_idle_intervals = 20").unwrap();
        let lookup = |var: &str| match var {
            ENV_INTERVALS => Some("5".to_string()),
            ENV_SLEEP_TIME => Some("60".to_string()),
            _ => None,
        };

        let settings = load_settings(&args(&["--interval", "10"]), raw, lookup).unwrap();
        assert_eq!(settings.monitor.required_idle_intervals, 5);
        assert_eq!(settings.monitor.interval, Duration::from_secs(10));
    }

    #[test]
    fn invalid_cli_value_fails_validation() {
        let args = args(&["--intervals", "0"]);
        assert!(load_settings(&args, RawConfig::default(), no_env).is_err());
    }

    #[test]
    fn env_and_cli_errors_reported_together() {
        let lookup = |var: &str| (var == ENV_SLEEP_TIME).then(|| "soon".to_string());

        let err = load_settings(&args(&["--intervals", "0"]), RawConfig::default(), lookup)
            .unwrap_err();
        match err.downcast_ref::<ConfigError>() {
            Some(ConfigError::ValidationFailed { errors }) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn require_platform_parses() {
        let args = args(&["--require-platform", "GCE", "--dry-run"]);
        assert_eq!(args.require_platform, Some(PlatformKind::Gce));
        assert!(args.dry_run);

        assert!(Args::try_parse_from(["autoshutdownd", "--require-platform", "aws"]).is_err());
    }

    #[test]
    fn explicit_config_path_is_required() {
        let args = args(&["--config", "/nonexistent/autoshutdown.toml"]);
        let (path, required) = args.config_source();
        assert_eq!(path, PathBuf::from("/nonexistent/autoshutdown.toml"));
        assert!(required);
        assert!(Daemon::with_env(&args, no_env).is_err());
    }

    #[test]
    fn daemon_loads_explicit_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "config_version = 1\n[monitor]\nrequired_idle_intervals = 4").unwrap();

        let path = file.path().to_string_lossy().into_owned();
        let daemon = Daemon::with_env(&args(&["--config", &path, "--dry-run"]), no_env).unwrap();
        assert_eq!(daemon.settings.monitor.required_idle_intervals, 4);
        assert!(daemon.dry_run);
    }

    #[tokio::test]
    async fn required_platform_mismatch_aborts() {
        let daemon = daemon_with(autoshutdown_config::PlatformConfig {
            require: Some(PlatformKind::Gce),
            ..Default::default()
        });
        let host = MockHost::new().with_platform(PlatformKind::Generic);

        let err = daemon.preflight(&host).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AutoShutdownError>(),
            Some(AutoShutdownError::PlatformMismatch { .. })
        ));
        assert_eq!(err.to_string(), "This tool only works on GCE VMs, aborting ...");
    }

    #[tokio::test]
    async fn required_platform_match_passes() {
        let daemon = daemon_with(autoshutdown_config::PlatformConfig {
            require: Some(PlatformKind::Gce),
            ..Default::default()
        });
        let host = MockHost::new().with_platform(PlatformKind::Gce);

        let preflight = daemon.preflight(&host).await.unwrap();
        assert_eq!(preflight.platform, PlatformKind::Gce);
        assert_eq!(preflight.warning, None);
    }

    #[tokio::test]
    async fn azure_warning_is_logged() {
        let daemon = daemon_with(Default::default());
        let host = MockHost::new().with_platform(PlatformKind::Azure);

        let preflight = daemon.preflight(&host).await.unwrap();
        assert_eq!(preflight.platform, PlatformKind::Azure);
        assert_eq!(preflight.warning, PlatformKind::Azure.preflight_warning());
        assert!(preflight.warning.is_some());
    }

    #[tokio::test]
    async fn azure_warning_can_be_silenced() {
        let daemon = daemon_with(autoshutdown_config::PlatformConfig {
            silence_azure_warning: true,
            ..Default::default()
        });
        let host = MockHost::new().with_platform(PlatformKind::Azure);

        let preflight = daemon.preflight(&host).await.unwrap();
        assert_eq!(preflight.platform, PlatformKind::Azure);
        assert_eq!(preflight.warning, None);
    }
}
