//! Entity model of an organization.
//!
//! Entities are snapshots of remote state keyed by natural keys (logins,
//! slugs, `owner/name`). They are created by the fetchers in
//! [`crate::client`] and only ever extended afterwards by the child-collection
//! loaders, which append to the collections documented below.
//!
//! Serialized field names and the omit-when-empty behaviour are part of the
//! report contract consumed downstream.

use serde::{Deserialize, Serialize};

use crate::{Login, Timestamp};

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}

pub(crate) fn is_zero(value: &u64) -> bool {
    *value == 0
}

fn is_zero_i64(value: &i64) -> bool {
    *value == 0
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

/// A member of an organization, or a pending invitation to become one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub login: Login,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub has_two_factor_enabled: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    pub created_at: Timestamp,
    /// `true` for invitations that have not been accepted yet.
    pub pending: bool,
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

/// A team and, once loaded, its members and repository grants.
///
/// `members` and `repositories` stay empty until
/// [`crate::AuditClient::load_team_members`] and
/// [`crate::AuditClient::load_team_repositories`] run; non-zero counts with
/// empty collections simply mean "not loaded".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Team {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub slug: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub combined_slug: String,
    /// Id of the parent team; empty for top-level teams.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub parent: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub member_count: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<TeamMember>,
    #[serde(skip_serializing_if = "is_zero")]
    pub repository_count: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<TeamRepository>,
    #[serde(skip_serializing_if = "is_zero")]
    pub child_count: u64,
}

/// A user's membership in one team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub login: Login,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
}

/// A repository one team has been granted access to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamRepository {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub owner: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub permission: String,
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

/// A repository and its optionally loaded child collections.
///
/// `collaborators`, `branch_protection_rules`, `languages`, `workflows` and
/// `vulnerability_alerts` are filled by separate loaders and may each be
/// absent independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Repository {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "is_false")]
    pub private: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub homepage: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub owner: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ssh: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub git: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub default_branch: String,
    #[serde(skip_serializing_if = "is_false")]
    pub archived: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub disabled: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub template: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub issues_enabled: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub wiki_enabled: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub projects_enabled: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub pages_enabled: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub allow_rebase_merge: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub allow_squash_merge: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub allow_merge_commit: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub delete_branch_on_merge: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub vulnerability_alerts: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub license_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collaborators: Vec<Collaborator>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branch_protection_rules: Vec<BranchProtectionRule>,
    #[serde(skip_serializing_if = "is_zero")]
    pub disk_usage: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pushed_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    /// Seconds between the last push and the moment the repository was
    /// fetched.
    #[serde(skip_serializing_if = "is_zero_i64")]
    pub age: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub primary_language: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<Language>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub workflows: Vec<Workflow>,
}

impl Repository {
    /// `owner/name`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// A language detected in a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Language {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Size attributed to the language, as reported by the API (bytes).
    #[serde(skip_serializing_if = "is_zero")]
    pub lines_of_code: u64,
}

// ---------------------------------------------------------------------------
// Access
// ---------------------------------------------------------------------------

/// An account with access to a repository, with every path that grants it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaborator {
    pub login: Login,
    /// The highest permission granted across all sources.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub effective_permission: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<PermissionSource>,
}

/// Kind of grant a [`PermissionSource`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionSourceType {
    /// A direct grant on the repository.
    Repository,
    /// A grant inherited through team membership.
    Team,
    /// An organization-wide base permission or role.
    Organization,
}

impl PermissionSourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Repository => "Repository",
            Self::Team => "Team",
            Self::Organization => "Organization",
        }
    }
}

impl std::fmt::Display for PermissionSourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a collaborator holds a permission.
///
/// Only the identity fields matching `source_type` are populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSource {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub organization: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub permission: String,
    pub source_type: PermissionSourceType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub team_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub team_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repository_owner: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repository_name: String,
}

/// A branch protection rule as configured on the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchProtectionRule {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pattern: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matching_refs: Vec<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub allows_force_pushes: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub allows_deletions: bool,
    #[serde(skip_serializing_if = "is_zero")]
    pub required_approving_review_count: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_status_check_contexts: Vec<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub requires_approving_reviews: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub requires_code_owner_reviews: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub requires_commit_signatures: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub requires_linear_history: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub requires_strict_status_checks: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_admin_enforced: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub restricts_review_dismissals: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub dismisses_stale_reviews: bool,
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// An Actions workflow and its billable runner time per platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workflow {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub usage_windows: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub usage_ubuntu: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub usage_mac: u64,
}

impl Workflow {
    /// The per-platform usage of this workflow.
    pub fn runner_usage(&self) -> crate::usage::RunnerUsage {
        crate::usage::RunnerUsage::new(self.usage_ubuntu, self.usage_windows, self.usage_mac)
    }
}
