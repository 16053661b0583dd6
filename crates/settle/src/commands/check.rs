//! `settle check` command implementation.

use std::path::PathBuf;

use clap::Args;
use settle_config::{CliSettings, Config};
use settle_templates::TemplateRegistry;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Path to configuration file (default: auto-discover settle.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Template directory (overrides config).
    #[arg(short, long)]
    templates_dir: Option<PathBuf>,
}

impl CheckArgs {
    /// Parse every template in the configured directory once.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or any template does not parse.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            templates_dir: self.templates_dir,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let templates = &config.templates_resolved;

        let names = check_dir(&templates.dir, &templates.pattern)?;

        output.status(
            "Checked",
            format!("{} ({})", templates.dir.display(), templates.pattern),
        );
        for name in &names {
            output.item(name);
        }
        output.success(&format!("{} template(s) OK", names.len()));
        Ok(())
    }
}

/// Load the directory as the server would and list what parsed.
fn check_dir(dir: &std::path::Path, pattern: &str) -> Result<Vec<String>, CliError> {
    let registry = TemplateRegistry::from_dir(dir, pattern)?;
    Ok(registry.snapshot().names().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use settle_templates::TemplateError;
    use std::fs;

    #[test]
    fn test_check_dir_lists_templates() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("base.html"), "<p>{{ x }}</p>").unwrap();
        fs::write(temp_dir.path().join("nav.html"), "<nav></nav>").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();

        let mut names = check_dir(temp_dir.path(), "*.html").unwrap();
        names.sort();

        assert_eq!(names, vec!["base.html", "nav.html"]);
    }

    #[test]
    fn test_check_dir_reports_syntax_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("base.html"), "{% if %}").unwrap();

        let err = check_dir(temp_dir.path(), "*.html").unwrap_err();

        assert!(matches!(err, CliError::Template(TemplateError::Parse { .. })));
    }
}
