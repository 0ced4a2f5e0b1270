//! Audit aggregation.
//!
//! Every function here is a pure reshaping of an already-fetched entity graph:
//! no I/O, no mutation of the inputs, and a fresh report per call. Reports
//! keyed by login are ordered by login so that repeated runs over the same
//! graph serialize identically.
//!
//! [`crate::AuditClient`] pairs each function with the fetches it needs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Member, PermissionSourceType, Repository, Team};
use crate::usage::fraction_of;
use crate::{Login, UsageFraction, WeightedUsage};

#[path = "reports_tests.rs"]
#[cfg(test)]
mod tests;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Everyone in the organization and everyone with access to its
/// repositories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FullAudit {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Member>,
    /// Repositories with collaborators loaded (archived ones without).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<Repository>,
}

/// One repository-level grant in a permission report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permission {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub repository_owner: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub repository_name: String,
    /// Grant path; empty where the report implies it.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub role: String,
}

/// One team membership of a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamMembership {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub team_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub role: String,
}

/// All team memberships of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMembershipAudit {
    pub login: Login,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub memberships: Vec<TeamMembership>,
}

/// All repository grants of one team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamPermissionAudit {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<Permission>,
}

/// All direct repository grants of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPermissionAudit {
    pub login: Login,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<Permission>,
}

/// Weighted Actions usage of every workflow in the organization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionsAudit {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionAudit>,
    #[serde(skip_serializing_if = "WeightedUsage::is_zero")]
    pub total_usage_weighted: WeightedUsage,
}

/// Usage of one workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionAudit {
    /// Repository name (without owner).
    #[serde(skip_serializing_if = "String::is_empty")]
    pub repository: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub workflow_name: String,
    #[serde(
        rename = "usage_summary_weighted",
        skip_serializing_if = "WeightedUsage::is_zero"
    )]
    pub usage_weighted: WeightedUsage,
    #[serde(skip_serializing_if = "UsageFraction::is_zero")]
    pub fraction_of_total_usage: UsageFraction,
    #[serde(skip_serializing_if = "crate::model::is_zero")]
    pub usage_mac: u64,
    #[serde(skip_serializing_if = "crate::model::is_zero")]
    pub usage_ubuntu: u64,
    #[serde(skip_serializing_if = "crate::model::is_zero")]
    pub usage_windows: u64,
}

// ---------------------------------------------------------------------------
// Aggregations
// ---------------------------------------------------------------------------

/// Composes members and repositories into one report.
pub fn full_audit(members: Vec<Member>, repositories: Vec<Repository>) -> FullAudit {
    FullAudit {
        members,
        repositories,
    }
}

/// Inverts team → members into login → memberships.
///
/// Within one login, memberships follow team order, then member order.
pub fn team_membership_audit(teams: &[Team]) -> Vec<TeamMembershipAudit> {
    let mut memberships: BTreeMap<&Login, Vec<TeamMembership>> = BTreeMap::new();
    for team in teams {
        for member in &team.members {
            memberships
                .entry(&member.login)
                .or_default()
                .push(TeamMembership {
                    team_name: team.name.clone(),
                    role: member.role.clone(),
                });
        }
    }
    memberships
        .into_iter()
        .map(|(login, memberships)| TeamMembershipAudit {
            login: login.clone(),
            memberships,
        })
        .collect()
}

/// Flattens each team's repository grants, one entry per team in team order.
pub fn team_permission_audit(teams: &[Team]) -> Vec<TeamPermissionAudit> {
    teams
        .iter()
        .map(|team| TeamPermissionAudit {
            name: team.name.clone(),
            permissions: team
                .repositories
                .iter()
                .map(|repo| Permission {
                    repository_owner: repo.owner.clone(),
                    repository_name: repo.name.clone(),
                    source: String::new(),
                    role: repo.permission.clone(),
                })
                .collect(),
        })
        .collect()
}

/// Collects, per login, the grants that come directly from a repository.
///
/// Grants inherited through a team or the organization are left out: this
/// report answers which repositories each person was added to by hand.
pub fn member_permission_audit(repositories: &[Repository]) -> Vec<MemberPermissionAudit> {
    let mut permissions: BTreeMap<&Login, Vec<Permission>> = BTreeMap::new();
    for repository in repositories {
        for collaborator in &repository.collaborators {
            for source in &collaborator.sources {
                if source.source_type != PermissionSourceType::Repository {
                    continue;
                }
                permissions
                    .entry(&collaborator.login)
                    .or_default()
                    .push(Permission {
                        repository_owner: repository.owner.clone(),
                        repository_name: repository.name.clone(),
                        source: source.source_type.to_string(),
                        role: source.permission.clone(),
                    });
            }
        }
    }
    permissions
        .into_iter()
        .map(|(login, permissions)| MemberPermissionAudit {
            login: login.clone(),
            permissions,
        })
        .collect()
}

/// Weighs every workflow's usage and its share of the organization total.
///
/// Rows follow repository order, then workflow order. With a zero total every
/// fraction is zero.
pub fn actions_audit(repositories: &[Repository]) -> ActionsAudit {
    let mut actions: Vec<ActionAudit> = repositories
        .iter()
        .flat_map(|repository| {
            repository.workflows.iter().map(move |workflow| ActionAudit {
                repository: repository.name.clone(),
                workflow_name: workflow.name.clone(),
                usage_weighted: workflow.runner_usage().weighted(),
                fraction_of_total_usage: UsageFraction::zero(),
                usage_mac: workflow.usage_mac,
                usage_ubuntu: workflow.usage_ubuntu,
                usage_windows: workflow.usage_windows,
            })
        })
        .collect();

    let total: WeightedUsage = actions.iter().map(|a| a.usage_weighted).sum();
    for action in &mut actions {
        action.fraction_of_total_usage = fraction_of(action.usage_weighted, total);
    }

    ActionsAudit {
        actions,
        total_usage_weighted: total,
    }
}
