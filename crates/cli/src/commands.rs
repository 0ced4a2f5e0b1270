//! Command dispatch.
//!
//! Each command runs one or more fetches (or one audit) through
//! [`AuditClient`] and yields the JSON document to print. Mutating commands
//! print nothing.

use std::io::Read;
use std::sync::Arc;

use anyhow::{bail, Context};
use audit::{AuditClient, Repository};
use github::{GithubClient, GithubConfig};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::args::{AuditKind, Command, RepositoryArgs};
use crate::config::CliConfig;

#[path = "commands_tests.rs"]
#[cfg(test)]
mod tests;

const USER_AGENT: &str = concat!("org-audit/", env!("CARGO_PKG_VERSION"));

/// Builds the GitHub transport and wraps it in an [`AuditClient`].
pub fn connect(config: &CliConfig) -> anyhow::Result<AuditClient> {
    let github = Arc::new(
        GithubClient::new(GithubConfig {
            api_url: config.api_url.clone(),
            token: config.token.clone(),
            timeout: config.timeout,
            user_agent: USER_AGENT.to_owned(),
        })
        .context("failed to build the GitHub client")?,
    );
    Ok(AuditClient::new(github.clone(), github).with_max_pages(config.max_pages))
}

fn to_json(value: impl Serialize) -> anyhow::Result<Value> {
    serde_json::to_value(value).context("failed to serialize output")
}

/// Runs `command`. `input` is only read by `create-repository`.
pub async fn execute(
    command: &Command,
    config: &CliConfig,
    client: &AuditClient,
    input: impl Read,
) -> anyhow::Result<Option<Value>> {
    let output = match command {
        Command::Members => to_json(client.get_members(config.organization()?).await?)?,
        Command::Teams {
            members,
            repositories,
        } => {
            let org = config.organization()?;
            let mut teams = client.get_teams(org).await?;
            if *members {
                client.load_team_members(org, &mut teams).await?;
            }
            if *repositories {
                client.load_team_repositories(org, &mut teams).await?;
            }
            to_json(teams)?
        }
        Command::Repositories(args) => {
            let mut repositories = client
                .get_organization_repositories(config.organization()?)
                .await?;
            load_repository_children(client, args, &mut repositories).await?;
            to_json(repositories)?
        }
        Command::Keys { user } => to_json(client.list_public_keys(user).await?)?,
        Command::CreateRepository => {
            let org = config.organization()?;
            let repository = read_repository(input)?;
            client.create_repository(org, &repository).await?;
            info!(org = %org, repo = %repository.name, "Created repository");
            return Ok(None);
        }
        Command::EnableVulnerabilityAlerts { repo } => {
            let org = config.organization()?;
            client.enable_vulnerability_alerts(org.as_str(), repo).await?;
            info!(org = %org, repo = %repo, "Enabled vulnerability alerts");
            return Ok(None);
        }
        Command::Audit { kind } => {
            let org = config.organization()?;
            match kind {
                AuditKind::Full => to_json(client.full_audit(org).await?)?,
                AuditKind::TeamMembership => to_json(client.team_membership_audit(org).await?)?,
                AuditKind::TeamPermission => to_json(client.team_permission_audit(org).await?)?,
                AuditKind::MemberPermission => {
                    to_json(client.member_permission_audit(org).await?)?
                }
                AuditKind::Actions => to_json(client.actions_audit(org).await?)?,
            }
        }
    };
    Ok(Some(output))
}

async fn load_repository_children(
    client: &AuditClient,
    args: &RepositoryArgs,
    repositories: &mut [Repository],
) -> anyhow::Result<()> {
    if args.collaborators {
        client.load_repository_collaborators(repositories).await?;
    }
    if args.branch_protection {
        client
            .load_repository_branch_protection_rules(repositories)
            .await?;
    }
    if args.languages {
        client.load_repository_languages(repositories).await?;
    }
    if args.security {
        client.load_repository_security_config(repositories).await?;
    }
    if args.workflows {
        client.load_repository_workflows(repositories).await?;
    }
    Ok(())
}

/// Parses the repository document given to `create-repository`.
pub fn read_repository(input: impl Read) -> anyhow::Result<Repository> {
    let repository: Repository =
        serde_json::from_reader(input).context("failed to parse repository JSON from stdin")?;
    if repository.name.trim().is_empty() {
        bail!("repository JSON must carry a non-empty \"name\"");
    }
    Ok(repository)
}
