//! Config validation CLI tool
//!
//! Validates an autoshutdownd configuration file, with environment
//! overrides applied, and prints the effective settings.

use autoshutdown_config::{ConfigError, apply_process_env, finalize_with_errors, load_raw};
use autoshutdown_util::{default_config_path, format_duration_long};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1).map(String::as_str) {
        Some("-h") | Some("--help") => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates an autoshutdownd configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
        Some(path) => PathBuf::from(path),
        None => default_config_path(),
    };

    let result = load_raw(&config_path, true).and_then(|mut raw| {
        let env_errors = apply_process_env(&mut raw);
        finalize_with_errors(raw, env_errors)
    });

    match result {
        Ok(settings) => {
            let monitor = &settings.monitor;
            println!("✓ Configuration is valid");
            println!();
            println!("Effective settings ({}):", config_path.display());
            println!("  Load threshold:          {:.2}", monitor.load_threshold);
            println!("  Required idle intervals: {}", monitor.required_idle_intervals);
            println!(
                "  Interval:                {}",
                format_duration_long(monitor.interval)
            );
            println!(
                "  Maximum idle time:       {}",
                format_duration_long(monitor.min_idle_before_shutdown())
            );
            println!(
                "  Shutdown grace:          {}",
                format_duration_long(monitor.shutdown_grace)
            );
            println!(
                "  Initial delay:           {}",
                format_duration_long(monitor.initial_delay)
            );
            println!("  SSH port:                {}", settings.host.ssh_port);
            println!(
                "  Power-off command:       {}",
                settings.host.poweroff_command.join(" ")
            );
            match settings.platform.require {
                Some(platform) => println!("  Required platform:       {}", platform),
                None => println!("  Required platform:       (any)"),
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read {}: {}", config_path.display(), io_err);
                }
                ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        autoshutdown_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
