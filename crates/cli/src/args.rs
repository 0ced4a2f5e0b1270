//! Command-line surface.

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Top-level CLI parser for the `org-audit` binary.
#[derive(Debug, Parser)]
#[command(
    name = "org-audit",
    version,
    about = "Audit access and Actions usage of a GitHub organization"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Token used to authenticate against the GitHub API
    #[arg(long, env = "GITHUB_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Login of the organization to audit
    #[arg(short, long, env = "GITHUB_ORGANIZATION", global = true)]
    pub organization: Option<String>,

    /// REST base URL (GitHub Enterprise Server: https://HOST/api/v3)
    #[arg(long, env = "GITHUB_API_URL", global = true, default_value = github::DEFAULT_API_URL)]
    pub api_url: String,

    /// Fail any paginated fetch that needs more than this many pages
    #[arg(long, global = true)]
    pub max_pages: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Log output format (logs go to stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; spans are exported when set
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT", global = true)]
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List confirmed members followed by pending invitations.
    Members,
    /// List teams.
    Teams {
        /// Load the members of every team
        #[arg(long)]
        members: bool,
        /// Load the repository grants of every team
        #[arg(long)]
        repositories: bool,
    },
    /// List repositories.
    Repositories(RepositoryArgs),
    /// List the public SSH keys of a user.
    Keys {
        /// User login
        user: String,
    },
    /// Create a repository from a JSON document read on stdin.
    CreateRepository,
    /// Enable vulnerability alerts on a repository of the organization.
    EnableVulnerabilityAlerts {
        /// Repository name (without owner)
        repo: String,
    },
    /// Run an audit.
    Audit {
        #[command(subcommand)]
        kind: AuditKind,
    },
}

impl Command {
    /// Name recorded on the root span.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Members => "members",
            Self::Teams { .. } => "teams",
            Self::Repositories(_) => "repositories",
            Self::Keys { .. } => "keys",
            Self::CreateRepository => "create-repository",
            Self::EnableVulnerabilityAlerts { .. } => "enable-vulnerability-alerts",
            Self::Audit { kind } => kind.name(),
        }
    }

    /// Whether the command addresses an organization.
    pub fn needs_organization(&self) -> bool {
        !matches!(self, Self::Keys { .. })
    }
}

/// Child collections to load onto each repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct RepositoryArgs {
    /// Load collaborators and their permission sources (skips archived repositories)
    #[arg(long)]
    pub collaborators: bool,
    /// Load branch protection rules
    #[arg(long)]
    pub branch_protection: bool,
    /// Load detected languages
    #[arg(long)]
    pub languages: bool,
    /// Load the vulnerability-alert setting
    #[arg(long)]
    pub security: bool,
    /// Load Actions workflows with their billable usage
    #[arg(long)]
    pub workflows: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum AuditKind {
    /// Members plus repositories with collaborators.
    Full,
    /// Team memberships per login.
    TeamMembership,
    /// Repository grants per team.
    TeamPermission,
    /// Direct repository grants per login.
    MemberPermission,
    /// Weighted Actions usage per workflow.
    Actions,
}

impl AuditKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Full => "audit full",
            Self::TeamMembership => "audit team-membership",
            Self::TeamPermission => "audit team-permission",
            Self::MemberPermission => "audit member-permission",
            Self::Actions => "audit actions",
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::*;

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "org-audit",
            "audit",
            "team-membership",
            "--organization",
            "acme",
            "--max-pages",
            "5",
            "--log-format",
            "pretty",
        ])
        .expect("cli should parse");

        assert_eq!(
            cli.command,
            Command::Audit {
                kind: AuditKind::TeamMembership
            }
        );
        assert_eq!(cli.organization.as_deref(), Some("acme"));
        assert_eq!(cli.max_pages, Some(5));
        assert_eq!(cli.log_format, LogFormat::Pretty);
    }

    #[test]
    fn repository_flags() {
        let cli = Cli::try_parse_from([
            "org-audit",
            "repositories",
            "--collaborators",
            "--workflows",
        ])
        .expect("cli should parse");

        assert_eq!(
            cli.command,
            Command::Repositories(RepositoryArgs {
                collaborators: true,
                workflows: true,
                ..RepositoryArgs::default()
            })
        );
    }

    #[test]
    fn audit_kinds_use_kebab_case() {
        for (arg, kind) in [
            ("full", AuditKind::Full),
            ("team-membership", AuditKind::TeamMembership),
            ("team-permission", AuditKind::TeamPermission),
            ("member-permission", AuditKind::MemberPermission),
            ("actions", AuditKind::Actions),
        ] {
            let cli = Cli::try_parse_from(["org-audit", "audit", arg]).expect("cli should parse");
            assert_eq!(cli.command, Command::Audit { kind });
        }
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let parsed = Cli::try_parse_from(["org-audit", "--log-format", "xml", "members"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn keys_take_a_user_and_need_no_organization() {
        let cli = Cli::try_parse_from(["org-audit", "keys", "octocat"]).expect("cli should parse");
        assert_eq!(
            cli.command,
            Command::Keys {
                user: "octocat".into()
            }
        );
        assert!(!cli.command.needs_organization());
        assert!(Command::Members.needs_organization());
    }
}
