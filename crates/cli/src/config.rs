//! Runtime configuration.
//!
//! [`CliConfig`] is the validated form of the global flags. Validation runs
//! before any client is built, so no request is ever issued with an invalid
//! configuration.

use std::time::Duration;

use audit::{AuditError, OrganizationName};

use crate::args::{Cli, LogFormat};

#[derive(Clone)]
pub struct CliConfig {
    pub token: String,
    organization: Option<OrganizationName>,
    pub api_url: String,
    pub max_pages: Option<u32>,
    pub timeout: Duration,
    pub log_format: LogFormat,
    pub otlp_endpoint: Option<String>,
}

impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("token", &"<redacted>")
            .field("organization", &self.organization)
            .field("api_url", &self.api_url)
            .field("max_pages", &self.max_pages)
            .field("timeout", &self.timeout)
            .field("log_format", &self.log_format)
            .field("otlp_endpoint", &self.otlp_endpoint)
            .finish()
    }
}

fn invalid(message: impl Into<String>) -> AuditError {
    AuditError::ConfigurationError {
        message: message.into(),
    }
}

impl CliConfig {
    /// Validates the parsed arguments.
    pub fn from_args(cli: &Cli) -> Result<Self, AuditError> {
        let token = cli
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| invalid("a GitHub token is required (--token or GITHUB_TOKEN)"))?
            .to_owned();

        let organization = cli
            .organization
            .as_deref()
            .map(str::trim)
            .and_then(OrganizationName::new);
        if organization.is_none() && cli.command.needs_organization() {
            return Err(invalid(format!(
                "`{}` needs an organization (--organization or GITHUB_ORGANIZATION)",
                cli.command.name()
            )));
        }

        let api_url = cli.api_url.trim().to_owned();
        if !(api_url.starts_with("https://") || api_url.starts_with("http://")) {
            return Err(invalid(format!(
                "API URL must be an http(s) URL, got {api_url:?}"
            )));
        }

        if cli.max_pages == Some(0) {
            return Err(invalid("--max-pages must be at least 1"));
        }
        if cli.timeout_secs == 0 {
            return Err(invalid("--timeout-secs must be at least 1"));
        }

        let otlp_endpoint = cli
            .otlp_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_owned);

        Ok(Self {
            token,
            organization,
            api_url,
            max_pages: cli.max_pages,
            timeout: Duration::from_secs(cli.timeout_secs),
            log_format: cli.log_format,
            otlp_endpoint,
        })
    }

    /// The organization every org-scoped command runs against.
    pub fn organization(&self) -> Result<&OrganizationName, AuditError> {
        self.organization
            .as_ref()
            .ok_or_else(|| invalid("no organization configured"))
    }
}
