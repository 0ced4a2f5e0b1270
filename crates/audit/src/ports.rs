//! Port traits implemented by transport adapters.
//!
//! The domain never talks HTTP. It consumes two capabilities:
//!
//! - [`GraphQlTransport`]: one GraphQL request/response cycle. Everything
//!   that pages by cursor goes through it (see [`crate::query`]).
//! - [`RestApi`]: the handful of single-shot and page-numbered REST calls
//!   that have no GraphQL equivalent (Actions workflows and their timing,
//!   vulnerability alerts, SSH keys, repository creation).
//!
//! Both traits are object-safe so the CLI can inject a concrete adapter and
//! tests can inject a scripted fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::query::QueryVariables;
use crate::usage::RunnerUsage;
use crate::{OrganizationName, WorkflowId};

/// Failure reported by a transport adapter.
///
/// The domain does not classify these further; they abort the running fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The remote API answered with a non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The request could not be sent or the response could not be read.
    #[error("network error: {0}")]
    Network(String),

    /// The GraphQL endpoint answered with an `errors` array.
    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    /// The response body was not the JSON the adapter expected.
    #[error("malformed response: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// GraphQL
// ---------------------------------------------------------------------------

/// Executes one GraphQL document against the remote API.
#[async_trait]
pub trait GraphQlTransport: Send + Sync {
    /// Sends `document` with `variables` and returns the `data` object of the
    /// response.
    ///
    /// A response carrying a non-empty `errors` array must be reported as
    /// [`TransportError::GraphQl`], even when partial `data` is present.
    async fn execute(
        &self,
        document: &str,
        variables: &QueryVariables,
    ) -> Result<serde_json::Value, TransportError>;
}

// ---------------------------------------------------------------------------
// REST
// ---------------------------------------------------------------------------

/// Page-number request for REST list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
}

impl PageRequest {
    /// Largest page size the REST API accepts.
    pub const MAX_PER_PAGE: u32 = 100;

    /// The first page at the maximum page size.
    pub fn first() -> Self {
        Self {
            page: 1,
            per_page: Self::MAX_PER_PAGE,
        }
    }

    /// The same request addressed at `page`.
    pub fn at(self, page: u32) -> Self {
        Self { page, ..self }
    }
}

/// One page of a REST list response.
#[derive(Debug, Clone, PartialEq)]
pub struct RestPage<T> {
    /// Items on this page, in server order.
    pub items: Vec<T>,
    /// The page to request next, if the server advertised one.
    pub next_page: Option<u32>,
}

impl<T> RestPage<T> {
    /// A page with no successor.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page: None,
        }
    }
}

/// A workflow as listed by the Actions API, before its usage is looked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub id: WorkflowId,
    pub name: String,
    pub path: String,
    pub state: String,
}

/// A public SSH key registered on a user account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Body of a repository-creation request.
///
/// Absent optional fields are left out of the request so the server applies
/// its defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateRepositoryRequest {
    pub name: String,
    pub private: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

/// REST operations the domain depends on.
///
/// Every method is a single blocking round trip from the caller's point of
/// view; list methods return one page at a time and are walked by
/// [`crate::query::walk_pages`].
#[async_trait]
pub trait RestApi: Send + Sync {
    /// Lists one page of the Actions workflows defined in `owner/repo`.
    async fn list_workflows(
        &self,
        owner: &str,
        repo: &str,
        page: PageRequest,
    ) -> Result<RestPage<WorkflowSummary>, TransportError>;

    /// Returns the billable runner time of one workflow.
    async fn get_workflow_usage(
        &self,
        owner: &str,
        repo: &str,
        workflow: WorkflowId,
    ) -> Result<RunnerUsage, TransportError>;

    /// Returns whether vulnerability alerts are enabled for `owner/repo`.
    async fn get_vulnerability_alerts(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<bool, TransportError>;

    /// Enables vulnerability alerts for `owner/repo`.
    async fn enable_vulnerability_alerts(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<(), TransportError>;

    /// Lists one page of the public SSH keys of `user`.
    async fn list_public_keys(
        &self,
        user: &str,
        page: PageRequest,
    ) -> Result<RestPage<PublicKey>, TransportError>;

    /// Creates a repository in `org`.
    async fn create_repository(
        &self,
        org: &OrganizationName,
        request: &CreateRepositoryRequest,
    ) -> Result<(), TransportError>;
}
