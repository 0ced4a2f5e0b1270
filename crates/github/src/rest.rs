//! REST (v3) transport.
//!
//! Covers the handful of endpoints the GraphQL API does not expose: Actions
//! workflows and their billable timing, vulnerability-alert settings, user
//! SSH keys and repository creation.

use std::borrow::Cow;

use async_trait::async_trait;
use audit::{
    CreateRepositoryRequest, OrganizationName, PageRequest, PublicKey, RestApi, RestPage,
    RunnerUsage, TransportError, WorkflowId, WorkflowSummary,
};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tracing::instrument;

use crate::client::{http_error, json_body, network_error, GithubClient};
use crate::link::next_page_from_headers;

#[path = "rest_tests.rs"]
#[cfg(test)]
mod tests;

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct WorkflowList {
    #[serde(default)]
    workflows: Vec<WorkflowSummary>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkflowTiming {
    #[serde(default)]
    billable: Billable,
}

#[derive(Debug, Default, Deserialize)]
struct Billable {
    #[serde(default, rename = "UBUNTU")]
    ubuntu: PlatformTiming,
    #[serde(default, rename = "WINDOWS")]
    windows: PlatformTiming,
    #[serde(default, rename = "MACOS")]
    macos: PlatformTiming,
}

#[derive(Debug, Default, Deserialize)]
struct PlatformTiming {
    #[serde(default)]
    total_ms: u64,
}

impl From<WorkflowTiming> for RunnerUsage {
    fn from(timing: WorkflowTiming) -> Self {
        let b = timing.billable;
        RunnerUsage::new(b.ubuntu.total_ms, b.windows.total_ms, b.macos.total_ms)
    }
}

/// Percent-encodes a caller-supplied value for use as one path segment.
fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

fn repo_path(owner: &str, repo: &str, suffix: &str) -> String {
    format!("/repos/{}/{}{suffix}", segment(owner), segment(repo))
}

fn page_query(page: PageRequest) -> [(&'static str, u32); 2] {
    [("per_page", page.per_page), ("page", page.page)]
}

// ---------------------------------------------------------------------------
// Port implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl RestApi for GithubClient {
    #[instrument(skip(self))]
    async fn list_workflows(
        &self,
        owner: &str,
        repo: &str,
        page: PageRequest,
    ) -> Result<RestPage<WorkflowSummary>, TransportError> {
        let request = self
            .rest(Method::GET, &repo_path(owner, repo, "/actions/workflows"))
            .query(&page_query(page));
        let response = self.send(request).await?;
        let next_page = next_page_from_headers(response.headers());
        let list: WorkflowList = json_body(response).await?;
        Ok(RestPage {
            items: list.workflows,
            next_page,
        })
    }

    #[instrument(skip(self))]
    async fn get_workflow_usage(
        &self,
        owner: &str,
        repo: &str,
        workflow: WorkflowId,
    ) -> Result<RunnerUsage, TransportError> {
        let request = self.rest(
            Method::GET,
            &repo_path(owner, repo, &format!("/actions/workflows/{workflow}/timing")),
        );
        let response = self.send(request).await?;
        let timing: WorkflowTiming = json_body(response).await?;
        Ok(timing.into())
    }

    /// `204` means enabled and `404` means disabled.
    #[instrument(skip(self))]
    async fn get_vulnerability_alerts(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<bool, TransportError> {
        let response = self
            .rest(Method::GET, &repo_path(owner, repo, "/vulnerability-alerts"))
            .send()
            .await
            .map_err(network_error)?;
        match response.status() {
            StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(http_error(status, &body))
            }
        }
    }

    #[instrument(skip(self))]
    async fn enable_vulnerability_alerts(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<(), TransportError> {
        let request = self.rest(
            Method::PUT,
            &repo_path(owner, repo, "/vulnerability-alerts"),
        );
        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_public_keys(
        &self,
        user: &str,
        page: PageRequest,
    ) -> Result<RestPage<PublicKey>, TransportError> {
        let request = self
            .rest(Method::GET, &format!("/users/{}/keys", segment(user)))
            .query(&page_query(page));
        let response = self.send(request).await?;
        let next_page = next_page_from_headers(response.headers());
        Ok(RestPage {
            items: json_body(response).await?,
            next_page,
        })
    }

    #[instrument(skip(self, request), fields(repo = %request.name))]
    async fn create_repository(
        &self,
        org: &OrganizationName,
        request: &CreateRepositoryRequest,
    ) -> Result<(), TransportError> {
        let request = self
            .rest(Method::POST, &format!("/orgs/{}/repos", segment(org.as_str())))
            .json(request);
        self.send(request).await?;
        Ok(())
    }
}
