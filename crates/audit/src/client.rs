//! Entity fetchers and audit orchestration.
//!
//! [`AuditClient`] composes the port traits into typed fetch operations. Each
//! fetch drives one or more queries through [`PaginatedQuery`] (or
//! [`walk_pages`] for REST lists) to exhaustion before returning.
//!
//! Loaders that take `&mut [T]` attach child collections onto the entities
//! passed in. They work through the slice in order and stop at the first
//! failure; entities before the failing one keep what was attached to them,
//! and the whole slice should be discarded by the caller.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::model::{Member, Repository, Team, Workflow};
use crate::ports::{CreateRepositoryRequest, GraphQlTransport, PublicKey, RestApi};
use crate::query::{walk_pages, PaginatedQuery};
use crate::reports::{
    self, ActionsAudit, FullAudit, MemberPermissionAudit, TeamMembershipAudit,
    TeamPermissionAudit,
};
use crate::schema::{self, unpack_edges, unpack_nodes};
use crate::{AuditError, OrganizationName, Timestamp};

#[path = "client_tests.rs"]
#[cfg(test)]
mod tests;

/// Typed access to an organization through the transport ports.
#[derive(Clone)]
pub struct AuditClient {
    graphql: Arc<dyn GraphQlTransport>,
    rest: Arc<dyn RestApi>,
    max_pages: Option<u32>,
}

impl std::fmt::Debug for AuditClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditClient")
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}

impl AuditClient {
    /// Creates a client with unbounded pagination.
    pub fn new(graphql: Arc<dyn GraphQlTransport>, rest: Arc<dyn RestApi>) -> Self {
        Self {
            graphql,
            rest,
            max_pages: None,
        }
    }

    /// Bounds every paginated fetch to `limit` pages.
    pub fn with_max_pages(mut self, limit: Option<u32>) -> Self {
        self.max_pages = limit;
        self
    }

    fn query(&self, operation: &'static str, document: &'static str) -> PaginatedQuery {
        PaginatedQuery::new(operation, document)
            .cursor("cursor")
            .max_pages(self.max_pages)
    }

    // -----------------------------------------------------------------------
    // Members
    // -----------------------------------------------------------------------

    /// Fetches confirmed members followed by pending invitations.
    #[instrument(skip(self, org), fields(org = %org))]
    pub async fn get_members(&self, org: &OrganizationName) -> Result<Vec<Member>, AuditError> {
        let mut members = Vec::new();
        self.query("get_members", schema::MEMBERS_WITH_ROLE)
            .string("org", org.as_str())
            .run(
                self.graphql.as_ref(),
                |data: schema::MembersWithRoleData| {
                    let (edges, page_info) =
                        unpack_edges(data.organization.and_then(|o| o.members_with_role));
                    members.extend(edges.into_iter().filter_map(schema::MemberEdge::into_member));
                    page_info
                },
            )
            .await?;

        self.query("get_pending_members", schema::PENDING_MEMBERS)
            .string("org", org.as_str())
            .run(
                self.graphql.as_ref(),
                |data: schema::PendingMembersData| {
                    let (nodes, page_info) =
                        unpack_nodes(data.organization.and_then(|o| o.pending_members));
                    members.extend(nodes.into_iter().map(|n| n.into_member(true)));
                    page_info
                },
            )
            .await?;

        info!(count = members.len(), "Fetched members");
        Ok(members)
    }

    // -----------------------------------------------------------------------
    // Teams
    // -----------------------------------------------------------------------

    /// Fetches all teams with their counts. Child collections stay empty.
    #[instrument(skip(self, org), fields(org = %org))]
    pub async fn get_teams(&self, org: &OrganizationName) -> Result<Vec<Team>, AuditError> {
        let mut teams = Vec::new();
        self.query("get_teams", schema::TEAMS)
            .string("org", org.as_str())
            .run(self.graphql.as_ref(), |data: schema::TeamsData| {
                let (nodes, page_info) = unpack_nodes(data.organization.and_then(|o| o.teams));
                teams.extend(nodes.into_iter().map(schema::TeamNode::into_team));
                page_info
            })
            .await?;
        info!(count = teams.len(), "Fetched teams");
        Ok(teams)
    }

    /// Attaches members to each team.
    #[instrument(skip(self, org, teams), fields(org = %org, teams = teams.len()))]
    pub async fn load_team_members(
        &self,
        org: &OrganizationName,
        teams: &mut [Team],
    ) -> Result<(), AuditError> {
        for team in teams.iter_mut() {
            self.load_members_of_team(org, team).await?;
        }
        Ok(())
    }

    async fn load_members_of_team(
        &self,
        org: &OrganizationName,
        team: &mut Team,
    ) -> Result<(), AuditError> {
        let query = self
            .query("load_team_members", schema::TEAM_MEMBERS)
            .string("org", org.as_str())
            .string("slug", team.slug.as_str());
        let members = &mut team.members;
        query
            .run(self.graphql.as_ref(), |data: schema::TeamMembersData| {
                let (edges, page_info) = unpack_edges(data.into_connection());
                members.extend(edges.into_iter().filter_map(schema::TeamMemberEdge::into_team_member));
                page_info
            })
            .await?;
        Ok(())
    }

    /// Attaches repository grants to each team.
    #[instrument(skip(self, org, teams), fields(org = %org, teams = teams.len()))]
    pub async fn load_team_repositories(
        &self,
        org: &OrganizationName,
        teams: &mut [Team],
    ) -> Result<(), AuditError> {
        for team in teams.iter_mut() {
            self.load_repositories_of_team(org, team).await?;
        }
        Ok(())
    }

    async fn load_repositories_of_team(
        &self,
        org: &OrganizationName,
        team: &mut Team,
    ) -> Result<(), AuditError> {
        let query = self
            .query("load_team_repositories", schema::TEAM_REPOSITORIES)
            .string("org", org.as_str())
            .string("slug", team.slug.as_str());
        let repositories = &mut team.repositories;
        query
            .run(
                self.graphql.as_ref(),
                |data: schema::TeamRepositoriesData| {
                    let (edges, page_info) = unpack_edges(data.into_connection());
                    repositories.extend(
                        edges
                            .into_iter()
                            .map(schema::TeamRepositoryEdge::into_team_repository),
                    );
                    page_info
                },
            )
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Repositories
    // -----------------------------------------------------------------------

    /// Fetches every repository owned by the organization, archived ones
    /// included.
    #[instrument(skip(self, org), fields(org = %org))]
    pub async fn get_organization_repositories(
        &self,
        org: &OrganizationName,
    ) -> Result<Vec<Repository>, AuditError> {
        let fetched_at = Timestamp::now();
        let mut repositories = Vec::new();
        self.query("get_organization_repositories", schema::ORGANIZATION_REPOSITORIES)
            .string("org", org.as_str())
            .run(
                self.graphql.as_ref(),
                |data: schema::OrganizationRepositoriesData| {
                    let (nodes, page_info) =
                        unpack_nodes(data.organization.and_then(|o| o.repositories));
                    repositories.extend(nodes.into_iter().map(|n| n.into_repository(fetched_at)));
                    page_info
                },
            )
            .await?;
        info!(count = repositories.len(), "Fetched repositories");
        Ok(repositories)
    }

    /// Attaches detected languages to each repository.
    #[instrument(skip_all, fields(repositories = repositories.len()))]
    pub async fn load_repository_languages(
        &self,
        repositories: &mut [Repository],
    ) -> Result<(), AuditError> {
        for repository in repositories.iter_mut() {
            let query = self
                .query("load_repository_languages", schema::REPOSITORY_LANGUAGES)
                .string("owner", repository.owner.as_str())
                .string("repo", repository.name.as_str());
            let languages = &mut repository.languages;
            query
                .run(
                    self.graphql.as_ref(),
                    |data: schema::RepositoryData<schema::LanguagesRepository>| {
                        let (edges, page_info) =
                            unpack_edges(data.repository.and_then(|r| r.languages));
                        languages.extend(edges.into_iter().map(schema::LanguageEdge::into_language));
                        page_info
                    },
                )
                .await?;
        }
        Ok(())
    }

    /// Attaches collaborators and their permission sources to each
    /// repository. Archived repositories are skipped without a request.
    #[instrument(skip_all, fields(repositories = repositories.len()))]
    pub async fn load_repository_collaborators(
        &self,
        repositories: &mut [Repository],
    ) -> Result<(), AuditError> {
        for repository in repositories.iter_mut().filter(|r| !r.archived) {
            info!(repo = %repository.name, "Fetching collaborators");
            let query = self
                .query("load_repository_collaborators", schema::REPOSITORY_COLLABORATORS)
                .string("owner", repository.owner.as_str())
                .string("repo", repository.name.as_str());
            let collaborators = &mut repository.collaborators;
            query
                .run(
                    self.graphql.as_ref(),
                    |data: schema::RepositoryData<schema::CollaboratorsRepository>| {
                        let (edges, page_info) =
                            unpack_edges(data.repository.and_then(|r| r.collaborators));
                        collaborators
                            .extend(edges.into_iter().filter_map(schema::CollaboratorEdge::into_collaborator));
                        page_info
                    },
                )
                .await?;
        }
        Ok(())
    }

    /// Attaches branch protection rules to each repository.
    #[instrument(skip_all, fields(repositories = repositories.len()))]
    pub async fn load_repository_branch_protection_rules(
        &self,
        repositories: &mut [Repository],
    ) -> Result<(), AuditError> {
        for repository in repositories.iter_mut() {
            let query = self
                .query(
                    "load_repository_branch_protection_rules",
                    schema::REPOSITORY_BRANCH_PROTECTION_RULES,
                )
                .string("owner", repository.owner.as_str())
                .string("repo", repository.name.as_str());
            let rules = &mut repository.branch_protection_rules;
            query
                .run(
                    self.graphql.as_ref(),
                    |data: schema::RepositoryData<schema::BranchProtectionRulesRepository>| {
                        let (nodes, page_info) =
                            unpack_nodes(data.repository.and_then(|r| r.branch_protection_rules));
                        rules.extend(nodes.into_iter().map(schema::BranchProtectionRuleNode::into_rule));
                        page_info
                    },
                )
                .await?;
        }
        Ok(())
    }

    /// Records whether vulnerability alerts are enabled on each repository.
    #[instrument(skip_all, fields(repositories = repositories.len()))]
    pub async fn load_repository_security_config(
        &self,
        repositories: &mut [Repository],
    ) -> Result<(), AuditError> {
        for repository in repositories.iter_mut() {
            repository.vulnerability_alerts = self
                .rest
                .get_vulnerability_alerts(&repository.owner, &repository.name)
                .await
                .map_err(|e| AuditError::transport("load_repository_security_config", e))?;
        }
        Ok(())
    }

    /// Enables vulnerability alerts on `owner/repo`.
    #[instrument(skip(self))]
    pub async fn enable_vulnerability_alerts(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<(), AuditError> {
        self.rest
            .enable_vulnerability_alerts(owner, repo)
            .await
            .map_err(|e| AuditError::transport("enable_vulnerability_alerts", e))
    }

    /// Attaches every Actions workflow, with its billable usage, to each
    /// repository.
    #[instrument(skip_all, fields(repositories = repositories.len()))]
    pub async fn load_repository_workflows(
        &self,
        repositories: &mut [Repository],
    ) -> Result<(), AuditError> {
        let rest = self.rest.as_ref();
        for repository in repositories.iter_mut() {
            let owner = repository.owner.clone();
            let name = repository.name.clone();
            let summaries = walk_pages("load_repository_workflows", self.max_pages, |page| {
                rest.list_workflows(&owner, &name, page)
            })
            .await?;

            for summary in summaries {
                let usage = rest
                    .get_workflow_usage(&owner, &name, summary.id)
                    .await
                    .map_err(|e| AuditError::transport("load_repository_workflows", e))?;
                repository.workflows.push(Workflow {
                    name: summary.name,
                    path: summary.path,
                    state: summary.state,
                    usage_windows: usage.windows,
                    usage_ubuntu: usage.ubuntu,
                    usage_mac: usage.mac,
                });
            }
        }
        Ok(())
    }

    /// Creates a repository in `org` from the name, visibility, description
    /// and homepage of `repository`. Empty strings are sent as absent.
    #[instrument(skip(self, org, repository), fields(org = %org, repo = %repository.name))]
    pub async fn create_repository(
        &self,
        org: &OrganizationName,
        repository: &Repository,
    ) -> Result<(), AuditError> {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_owned());
        let request = CreateRepositoryRequest {
            name: repository.name.clone(),
            private: repository.private,
            description: non_empty(&repository.description),
            homepage: non_empty(&repository.homepage),
        };
        self.rest
            .create_repository(org, &request)
            .await
            .map_err(|e| AuditError::transport("create_repository", e))
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Lists the public SSH keys of `user`.
    #[instrument(skip(self))]
    pub async fn list_public_keys(&self, user: &str) -> Result<Vec<PublicKey>, AuditError> {
        let rest = self.rest.as_ref();
        walk_pages("list_public_keys", self.max_pages, |page| {
            rest.list_public_keys(user, page)
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Audits
    // -----------------------------------------------------------------------

    /// Members plus repositories with collaborators loaded.
    #[instrument(skip(self, org), fields(org = %org))]
    pub async fn full_audit(&self, org: &OrganizationName) -> Result<FullAudit, AuditError> {
        let members = self.get_members(org).await?;
        let mut repositories = self.get_organization_repositories(org).await?;
        self.load_repository_collaborators(&mut repositories).await?;
        Ok(reports::full_audit(members, repositories))
    }

    /// Team memberships per login.
    #[instrument(skip(self, org), fields(org = %org))]
    pub async fn team_membership_audit(
        &self,
        org: &OrganizationName,
    ) -> Result<Vec<TeamMembershipAudit>, AuditError> {
        let mut teams = self.get_teams(org).await?;
        self.load_team_members(org, &mut teams).await?;
        Ok(reports::team_membership_audit(&teams))
    }

    /// Repository grants per team.
    #[instrument(skip(self, org), fields(org = %org))]
    pub async fn team_permission_audit(
        &self,
        org: &OrganizationName,
    ) -> Result<Vec<TeamPermissionAudit>, AuditError> {
        let mut teams = self.get_teams(org).await?;
        self.load_team_repositories(org, &mut teams).await?;
        Ok(reports::team_permission_audit(&teams))
    }

    /// Direct repository grants per login.
    #[instrument(skip(self, org), fields(org = %org))]
    pub async fn member_permission_audit(
        &self,
        org: &OrganizationName,
    ) -> Result<Vec<MemberPermissionAudit>, AuditError> {
        info!("Fetching repositories");
        let mut repositories = self.get_organization_repositories(org).await?;
        info!("Fetching repository collaborators");
        self.load_repository_collaborators(&mut repositories).await?;
        Ok(reports::member_permission_audit(&repositories))
    }

    /// Weighted Actions usage per workflow.
    #[instrument(skip(self, org), fields(org = %org))]
    pub async fn actions_audit(&self, org: &OrganizationName) -> Result<ActionsAudit, AuditError> {
        let mut repositories = self.get_organization_repositories(org).await?;
        self.load_repository_workflows(&mut repositories).await?;
        Ok(reports::actions_audit(&repositories))
    }
}
