//! `settle serve` command implementation.

use std::convert::Infallible;
use std::path::PathBuf;

use clap::Args;
use settle_config::{CliSettings, Config};
use settle_server::{run_server, server_config_from_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover settle.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Template directory (overrides config).
    #[arg(short, long)]
    templates_dir: Option<PathBuf>,

    /// Serve templates from disk and reload browsers on change.
    ///
    /// `LOCAL_MODE=true` enables it too; any other value leaves it off.
    #[arg(long, env = "LOCAL_MODE", value_parser = parse_local_mode)]
    local_mode: bool,

    /// Enable verbose output (info-level logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the server fails to start,
    /// or the template watcher fails while running.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = self.cli_settings();
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.status(
            "Listening",
            format!("http://{}:{}", config.server.host, config.server.port),
        );
        let templates = &config.templates_resolved;
        if templates.local_mode {
            output.status(
                "Templates",
                format!("{} ({})", templates.dir.display(), templates.pattern),
            );
            output.highlight(
                "Live reload",
                format!("enabled, {}ms quiet window", config.live_reload.debounce_ms),
            );
        } else {
            output.status("Templates", "embedded");
            output.status("Live reload", "disabled (use --local-mode or LOCAL_MODE=true)");
        }

        run_server(server_config_from_config(&config)).await?;

        output.success("Server stopped");
        Ok(())
    }

    /// CLI overrides; an absent `--local-mode` leaves the config value alone.
    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            host: self.host.clone(),
            port: self.port,
            templates_dir: self.templates_dir.clone(),
            local_mode: self.local_mode.then_some(true),
        }
    }
}

/// Only the exact value `true` turns local mode on.
#[allow(clippy::unnecessary_wraps)]
fn parse_local_mode(value: &str) -> Result<bool, Infallible> {
    Ok(value == "true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: ServeArgs,
    }

    #[test]
    fn test_cli_settings_without_flags() {
        let harness = Harness::try_parse_from(["serve"]).unwrap();
        let settings = harness.args.cli_settings();

        assert_eq!(settings.host, None);
        assert_eq!(settings.port, None);
        assert_eq!(settings.templates_dir, None);
    }

    #[test]
    fn test_cli_settings_with_flags() {
        let harness = Harness::try_parse_from([
            "serve",
            "--host",
            "0.0.0.0",
            "-p",
            "3000",
            "--templates-dir",
            "views",
            "--local-mode",
        ])
        .unwrap();
        let settings = harness.args.cli_settings();

        assert_eq!(settings.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(settings.port, Some(3000));
        assert_eq!(settings.templates_dir, Some(PathBuf::from("views")));
        assert_eq!(settings.local_mode, Some(true));
    }

    #[test]
    fn test_local_mode_value_must_be_exactly_true() {
        assert_eq!(parse_local_mode("true"), Ok(true));
        for value in ["", "1", "yes", "TRUE", "false"] {
            assert_eq!(parse_local_mode(value), Ok(false), "{value:?}");
        }
    }

    #[test]
    fn test_local_mode_absent_leaves_config_alone() {
        let harness = Harness::try_parse_from(["serve"]).unwrap();
        assert_eq!(harness.args.cli_settings().local_mode, None);
    }
}
