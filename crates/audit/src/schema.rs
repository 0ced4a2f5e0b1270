//! GraphQL documents and their response schemas.
//!
//! Every fetch issues one document from this module and decodes the `data`
//! object into the matching `*Data` type. Nullable remote fields are
//! `Option`s here and collapse to empty strings / `false` / `0` when mapped
//! into the entity model.

use serde::Deserialize;

use crate::model::{
    BranchProtectionRule, Collaborator, Language, Member, PermissionSource, PermissionSourceType,
    Repository, Team, TeamMember, TeamRepository,
};
use crate::query::{EdgeConnection, NodeConnection, PageInfo};
use crate::{Login, Timestamp};

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

pub(crate) const MEMBERS_WITH_ROLE: &str = r#"
query($org: String!, $cursor: String) {
  organization(login: $org) {
    membersWithRole(first: 100, after: $cursor) {
      pageInfo { startCursor endCursor hasPreviousPage hasNextPage }
      edges {
        node { login name email createdAt }
        hasTwoFactorEnabled
        role
      }
    }
  }
}"#;

pub(crate) const PENDING_MEMBERS: &str = r#"
query($org: String!, $cursor: String) {
  organization(login: $org) {
    pendingMembers(first: 100, after: $cursor) {
      pageInfo { startCursor endCursor hasPreviousPage hasNextPage }
      nodes { login name email createdAt }
    }
  }
}"#;

pub(crate) const TEAMS: &str = r#"
query($org: String!, $cursor: String) {
  organization(login: $org) {
    teams(first: 100, after: $cursor) {
      pageInfo { startCursor endCursor hasPreviousPage hasNextPage }
      nodes {
        id name slug combinedSlug
        parentTeam { id }
        members { totalCount }
        repositories { totalCount }
        childTeams { totalCount }
      }
    }
  }
}"#;

pub(crate) const TEAM_MEMBERS: &str = r#"
query($org: String!, $slug: String!, $cursor: String) {
  organization(login: $org) {
    team(slug: $slug) {
      members(first: 100, after: $cursor) {
        pageInfo { startCursor endCursor hasPreviousPage hasNextPage }
        edges { node { login } role }
      }
    }
  }
}"#;

pub(crate) const TEAM_REPOSITORIES: &str = r#"
query($org: String!, $slug: String!, $cursor: String) {
  organization(login: $org) {
    team(slug: $slug) {
      repositories(first: 100, after: $cursor) {
        pageInfo { startCursor endCursor hasPreviousPage hasNextPage }
        edges { node { owner { login } name } permission }
      }
    }
  }
}"#;

pub(crate) const ORGANIZATION_REPOSITORIES: &str = r#"
query($org: String!, $cursor: String) {
  organization(login: $org) {
    repositories(first: 100, after: $cursor) {
      pageInfo { startCursor endCursor hasPreviousPage hasNextPage }
      nodes {
        owner { login }
        name
        description
        homepageUrl
        url
        sshUrl
        defaultBranchRef { name }
        isArchived isDisabled isPrivate isTemplate
        hasIssuesEnabled hasProjectsEnabled hasWikiEnabled
        rebaseMergeAllowed mergeCommitAllowed squashMergeAllowed deleteBranchOnMerge
        licenseInfo { name }
        repositoryTopics(first: 100) { nodes { topic { name } } }
        diskUsage
        pushedAt
        updatedAt
        primaryLanguage { name }
      }
    }
  }
}"#;

pub(crate) const REPOSITORY_LANGUAGES: &str = r#"
query($owner: String!, $repo: String!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    languages(first: 100, after: $cursor) {
      pageInfo { startCursor endCursor hasPreviousPage hasNextPage }
      edges { node { name } size }
    }
  }
}"#;

pub(crate) const REPOSITORY_COLLABORATORS: &str = r#"
query($owner: String!, $repo: String!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    collaborators(first: 10, after: $cursor) {
      pageInfo { startCursor endCursor hasPreviousPage hasNextPage }
      edges {
        node { login }
        permission
        permissionSources {
          organization { name }
          permission
          source {
            __typename
            ... on Team { name id }
            ... on Repository { owner { login } name }
            ... on Organization { name }
          }
        }
      }
    }
  }
}"#;

pub(crate) const REPOSITORY_BRANCH_PROTECTION_RULES: &str = r#"
query($owner: String!, $repo: String!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    branchProtectionRules(first: 100, after: $cursor) {
      pageInfo { startCursor endCursor hasPreviousPage hasNextPage }
      nodes {
        pattern
        matchingRefs(first: 100) { nodes { name } }
        allowsForcePushes
        allowsDeletions
        requiredApprovingReviewCount
        requiredStatusCheckContexts
        requiresApprovingReviews
        requiresCodeOwnerReviews
        requiresCommitSignatures
        requiresLinearHistory
        requiresStrictStatusChecks
        isAdminEnforced
        restrictsReviewDismissals
        dismissesStaleReviews
      }
    }
  }
}"#;

// ---------------------------------------------------------------------------
// Shared fragments
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct LoginNode {
    pub login: Login,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NameNode {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IdNode {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TotalCount {
    #[serde(default)]
    pub total_count: u64,
}

fn name_of(node: Option<NameNode>) -> String {
    node.and_then(|n| n.name).unwrap_or_default()
}

/// Splits an optional connection into its items and page descriptor. A
/// `null` connection is an empty last page.
pub(crate) fn unpack_nodes<T>(connection: Option<NodeConnection<T>>) -> (Vec<T>, PageInfo) {
    match connection {
        Some(c) => (c.nodes, c.page_info),
        None => (Vec::new(), PageInfo::last()),
    }
}

/// Edge-connection counterpart of [`unpack_nodes`].
pub(crate) fn unpack_edges<E>(connection: Option<EdgeConnection<E>>) -> (Vec<E>, PageInfo) {
    match connection {
        Some(c) => (c.edges, c.page_info),
        None => (Vec::new(), PageInfo::last()),
    }
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct MembersWithRoleData {
    pub organization: Option<MembersWithRoleOrganization>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MembersWithRoleOrganization {
    pub members_with_role: Option<EdgeConnection<MemberEdge>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MemberEdge {
    /// `null` for deleted accounts.
    #[serde(default)]
    pub node: Option<UserNode>,
    #[serde(default)]
    pub has_two_factor_enabled: Option<bool>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserNode {
    pub login: Login,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: Timestamp,
}

impl MemberEdge {
    pub fn into_member(self) -> Option<Member> {
        let node = self.node?;
        Some(Member {
            has_two_factor_enabled: self.has_two_factor_enabled.unwrap_or(false),
            role: self.role.unwrap_or_default(),
            ..node.into_member(false)
        })
    }
}

impl UserNode {
    pub fn into_member(self, pending: bool) -> Member {
        Member {
            login: self.login,
            name: self.name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            has_two_factor_enabled: false,
            role: String::new(),
            created_at: self.created_at,
            pending,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PendingMembersData {
    pub organization: Option<PendingMembersOrganization>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PendingMembersOrganization {
    pub pending_members: Option<NodeConnection<UserNode>>,
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct TeamsData {
    pub organization: Option<TeamsOrganization>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamsOrganization {
    pub teams: Option<NodeConnection<TeamNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TeamNode {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub combined_slug: Option<String>,
    #[serde(default)]
    pub parent_team: Option<IdNode>,
    #[serde(default)]
    pub members: Option<TotalCount>,
    #[serde(default)]
    pub repositories: Option<TotalCount>,
    #[serde(default)]
    pub child_teams: Option<TotalCount>,
}

impl TeamNode {
    pub fn into_team(self) -> Team {
        let count = |c: Option<TotalCount>| c.map(|c| c.total_count).unwrap_or(0);
        Team {
            id: self.id,
            name: self.name,
            slug: self.slug,
            combined_slug: self.combined_slug.unwrap_or_default(),
            parent: self.parent_team.and_then(|p| p.id).unwrap_or_default(),
            member_count: count(self.members),
            members: Vec::new(),
            repository_count: count(self.repositories),
            repositories: Vec::new(),
            child_count: count(self.child_teams),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamMembersData {
    pub organization: Option<TeamMembersOrganization>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamMembersOrganization {
    pub team: Option<TeamMembersTeam>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamMembersTeam {
    pub members: Option<EdgeConnection<TeamMemberEdge>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamMemberEdge {
    #[serde(default)]
    pub node: Option<LoginNode>,
    #[serde(default)]
    pub role: Option<String>,
}

impl TeamMembersData {
    pub fn into_connection(self) -> Option<EdgeConnection<TeamMemberEdge>> {
        self.organization.and_then(|o| o.team).and_then(|t| t.members)
    }
}

impl TeamMemberEdge {
    pub fn into_team_member(self) -> Option<TeamMember> {
        Some(TeamMember {
            login: self.node?.login,
            role: self.role.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamRepositoriesData {
    pub organization: Option<TeamRepositoriesOrganization>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamRepositoriesOrganization {
    pub team: Option<TeamRepositoriesTeam>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamRepositoriesTeam {
    pub repositories: Option<EdgeConnection<TeamRepositoryEdge>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamRepositoryEdge {
    pub node: OwnedRepositoryNode,
    #[serde(default)]
    pub permission: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwnedRepositoryNode {
    pub owner: LoginNode,
    pub name: String,
}

impl TeamRepositoriesData {
    pub fn into_connection(self) -> Option<EdgeConnection<TeamRepositoryEdge>> {
        self.organization
            .and_then(|o| o.team)
            .and_then(|t| t.repositories)
    }
}

impl TeamRepositoryEdge {
    pub fn into_team_repository(self) -> TeamRepository {
        TeamRepository {
            owner: self.node.owner.login.to_string(),
            name: self.node.name,
            permission: self.permission.unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct OrganizationRepositoriesData {
    pub organization: Option<OrganizationRepositories>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrganizationRepositories {
    pub repositories: Option<NodeConnection<RepositoryNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RepositoryNode {
    pub owner: LoginNode,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub ssh_url: Option<String>,
    #[serde(default)]
    pub default_branch_ref: Option<NameNode>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_disabled: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default)]
    pub has_issues_enabled: bool,
    #[serde(default)]
    pub has_projects_enabled: bool,
    #[serde(default)]
    pub has_wiki_enabled: bool,
    #[serde(default)]
    pub rebase_merge_allowed: bool,
    #[serde(default)]
    pub merge_commit_allowed: bool,
    #[serde(default)]
    pub squash_merge_allowed: bool,
    #[serde(default)]
    pub delete_branch_on_merge: bool,
    #[serde(default)]
    pub license_info: Option<NameNode>,
    #[serde(default)]
    pub repository_topics: Option<TopicConnection>,
    #[serde(default)]
    pub disk_usage: Option<u64>,
    #[serde(default)]
    pub pushed_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    #[serde(default)]
    pub primary_language: Option<NameNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopicConnection {
    #[serde(default)]
    pub nodes: Vec<TopicNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopicNode {
    pub topic: NameNode,
}

impl RepositoryNode {
    /// Maps the node, measuring `age` against `fetched_at`.
    pub fn into_repository(self, fetched_at: Timestamp) -> Repository {
        let topics: Vec<String> = self
            .repository_topics
            .map(|t| {
                t.nodes
                    .into_iter()
                    .filter_map(|n| n.topic.name)
                    .collect()
            })
            .unwrap_or_default();
        Repository {
            owner: self.owner.login.to_string(),
            name: self.name,
            private: self.is_private,
            description: self.description.unwrap_or_default(),
            homepage: self.homepage_url.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            ssh: self.ssh_url.unwrap_or_default(),
            default_branch: name_of(self.default_branch_ref),
            archived: self.is_archived,
            disabled: self.is_disabled,
            template: self.is_template,
            issues_enabled: self.has_issues_enabled,
            projects_enabled: self.has_projects_enabled,
            wiki_enabled: self.has_wiki_enabled,
            allow_rebase_merge: self.rebase_merge_allowed,
            allow_squash_merge: self.squash_merge_allowed,
            allow_merge_commit: self.merge_commit_allowed,
            delete_branch_on_merge: self.delete_branch_on_merge,
            license_name: name_of(self.license_info),
            topics,
            disk_usage: self.disk_usage.unwrap_or(0),
            age: self
                .pushed_at
                .map(|pushed| pushed.seconds_until(fetched_at))
                .unwrap_or(0),
            pushed_at: self.pushed_at,
            updated_at: self.updated_at,
            primary_language: name_of(self.primary_language),
            ..Repository::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Repository children
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryData<T> {
    pub repository: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LanguagesRepository {
    pub languages: Option<EdgeConnection<LanguageEdge>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LanguageEdge {
    pub node: NameNode,
    #[serde(default)]
    pub size: u64,
}

impl LanguageEdge {
    pub fn into_language(self) -> Language {
        Language {
            name: self.node.name.unwrap_or_default(),
            lines_of_code: self.size,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CollaboratorsRepository {
    pub collaborators: Option<EdgeConnection<CollaboratorEdge>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CollaboratorEdge {
    #[serde(default)]
    pub node: Option<LoginNode>,
    #[serde(default)]
    pub permission: Option<String>,
    #[serde(default)]
    pub permission_sources: Vec<PermissionSourceNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PermissionSourceNode {
    #[serde(default)]
    pub organization: Option<NameNode>,
    #[serde(default)]
    pub permission: Option<String>,
    pub source: PermissionGranter,
}

/// The union behind a permission source, discriminated by `__typename`.
#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
pub(crate) enum PermissionGranter {
    Team {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        id: Option<String>,
    },
    Repository {
        #[serde(default)]
        owner: Option<LoginNode>,
        #[serde(default)]
        name: Option<String>,
    },
    Organization {
        #[serde(default)]
        name: Option<String>,
    },
}

impl PermissionSourceNode {
    pub fn into_permission_source(self) -> PermissionSource {
        let mut source = PermissionSource {
            organization: name_of(self.organization),
            permission: self.permission.unwrap_or_default(),
            source_type: PermissionSourceType::Organization,
            team_name: String::new(),
            team_id: String::new(),
            repository_owner: String::new(),
            repository_name: String::new(),
        };
        match self.source {
            PermissionGranter::Team { name, id } => {
                source.source_type = PermissionSourceType::Team;
                source.team_name = name.unwrap_or_default();
                source.team_id = id.unwrap_or_default();
            }
            PermissionGranter::Repository { owner, name } => {
                source.source_type = PermissionSourceType::Repository;
                source.repository_owner = owner.map(|o| o.login.to_string()).unwrap_or_default();
                source.repository_name = name.unwrap_or_default();
            }
            PermissionGranter::Organization { .. } => {}
        }
        source
    }
}

impl CollaboratorEdge {
    pub fn into_collaborator(self) -> Option<Collaborator> {
        Some(Collaborator {
            login: self.node?.login,
            effective_permission: self.permission.unwrap_or_default(),
            sources: self
                .permission_sources
                .into_iter()
                .map(PermissionSourceNode::into_permission_source)
                .collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BranchProtectionRulesRepository {
    pub branch_protection_rules: Option<NodeConnection<BranchProtectionRuleNode>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefConnection {
    #[serde(default)]
    pub nodes: Vec<NameNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BranchProtectionRuleNode {
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub matching_refs: Option<RefConnection>,
    #[serde(default)]
    pub allows_force_pushes: bool,
    #[serde(default)]
    pub allows_deletions: bool,
    #[serde(default)]
    pub required_approving_review_count: Option<u64>,
    #[serde(default)]
    pub required_status_check_contexts: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub requires_approving_reviews: bool,
    #[serde(default)]
    pub requires_code_owner_reviews: bool,
    #[serde(default)]
    pub requires_commit_signatures: bool,
    #[serde(default)]
    pub requires_linear_history: bool,
    #[serde(default)]
    pub requires_strict_status_checks: bool,
    #[serde(default)]
    pub is_admin_enforced: bool,
    #[serde(default)]
    pub restricts_review_dismissals: bool,
    #[serde(default)]
    pub dismisses_stale_reviews: bool,
}

impl BranchProtectionRuleNode {
    pub fn into_rule(self) -> BranchProtectionRule {
        BranchProtectionRule {
            pattern: self.pattern,
            matching_refs: self
                .matching_refs
                .map(|r| r.nodes.into_iter().filter_map(|n| n.name).collect())
                .unwrap_or_default(),
            allows_force_pushes: self.allows_force_pushes,
            allows_deletions: self.allows_deletions,
            required_approving_review_count: self.required_approving_review_count.unwrap_or(0),
            required_status_check_contexts: self
                .required_status_check_contexts
                .unwrap_or_default()
                .into_iter()
                .flatten()
                .collect(),
            requires_approving_reviews: self.requires_approving_reviews,
            requires_code_owner_reviews: self.requires_code_owner_reviews,
            requires_commit_signatures: self.requires_commit_signatures,
            requires_linear_history: self.requires_linear_history,
            requires_strict_status_checks: self.requires_strict_status_checks,
            is_admin_enforced: self.is_admin_enforced,
            restricts_review_dismissals: self.restricts_review_dismissals,
            dismisses_stale_reviews: self.dismisses_stale_reviews,
        }
    }
}
