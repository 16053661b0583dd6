//! CLI error types.

use settle_config::ConfigError;
use settle_server::ServerError;
use settle_templates::TemplateError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Template(#[from] TemplateError),

    #[error("{0}")]
    Server(#[from] ServerError),
}
