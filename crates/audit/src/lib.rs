//! Organization audit domain.
//!
//! This crate contains the entity model of a GitHub organization, the
//! paginated query executor, the typed fetchers built on top of it, and the
//! pure aggregations that turn a fetched entity graph into audit reports.
//! Transport crates implement the port traits defined here; they never add
//! domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed from the remote API; the `github` crate
//! defines *how* to supply it over HTTP.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`OrganizationName`, `Login`, `WorkflowId`, etc.) |
//! | [`types`] | Shared value types (`WeightedUsage`, `UsageFraction`, `Timestamp`) |
//! | [`errors`] | The [`AuditError`] type |
//! | [`ports`] | Transport traits and their wire-level types |
//! | [`query`] | Query variables, page descriptors and the pagination executors |
//! | [`model`] | Organization entities (members, teams, repositories, ...) |
//! | [`usage`] | Runner multipliers and usage weighting |
//! | [`client`] | [`AuditClient`]: entity fetchers and audit orchestration |
//! | [`reports`] | Report types and the pure aggregation functions |

pub mod client;
pub mod errors;
pub mod identifiers;
pub mod model;
pub mod ports;
pub mod query;
pub mod reports;
pub mod types;
pub mod usage;

pub(crate) mod schema;

#[cfg(test)]
mod test_support;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use client::AuditClient;
pub use errors::AuditError;
pub use identifiers::{AuditRunId, Cursor, Login, OrganizationName, WorkflowId};
pub use model::{
    BranchProtectionRule, Collaborator, Language, Member, PermissionSource, PermissionSourceType,
    Repository, Team, TeamMember, TeamRepository, Workflow,
};
pub use ports::{
    CreateRepositoryRequest, GraphQlTransport, PageRequest, PublicKey, RestApi, RestPage,
    TransportError, WorkflowSummary,
};
pub use reports::{
    ActionAudit, ActionsAudit, FullAudit, MemberPermissionAudit, Permission, TeamMembership,
    TeamMembershipAudit, TeamPermissionAudit,
};
pub use types::{Timestamp, UsageFraction, WeightedUsage};
pub use usage::RunnerUsage;
