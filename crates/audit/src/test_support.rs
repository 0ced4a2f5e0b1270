//! Scripted fakes of the transport ports.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::ports::{
    CreateRepositoryRequest, GraphQlTransport, PageRequest, PublicKey, RestApi, RestPage,
    TransportError, WorkflowSummary,
};
use crate::query::QueryVariables;
use crate::usage::RunnerUsage;
use crate::{OrganizationName, WorkflowId};

/// A recorded GraphQL request.
#[derive(Debug, Clone)]
pub struct RecordedQuery {
    pub document: String,
    pub variables: QueryVariables,
}

/// Answers GraphQL requests from a queue of canned responses, in order.
#[derive(Default)]
pub struct ScriptedGraphQl {
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    calls: Mutex<Vec<RecordedQuery>>,
}

impl ScriptedGraphQl {
    pub fn new(responses: impl IntoIterator<Item = Result<Value, TransportError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedQuery> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl GraphQlTransport for ScriptedGraphQl {
    async fn execute(
        &self,
        document: &str,
        variables: &QueryVariables,
    ) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(RecordedQuery {
            document: document.to_owned(),
            variables: variables.clone(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("script exhausted".into())))
    }
}

/// A connection page: `{ pageInfo, <items_key>: items }`.
pub fn connection(items_key: &str, items: Value, end_cursor: Option<&str>, has_next: bool) -> Value {
    let mut page = json!({
        "pageInfo": {
            "startCursor": null,
            "endCursor": end_cursor,
            "hasPreviousPage": false,
            "hasNextPage": has_next,
        }
    });
    page[items_key] = items;
    page
}

/// In-memory REST API.
#[derive(Default)]
pub struct ScriptedRest {
    pub workflow_pages: Mutex<HashMap<String, VecDeque<RestPage<WorkflowSummary>>>>,
    pub usage: HashMap<u64, RunnerUsage>,
    pub alerts_enabled: HashMap<String, bool>,
    pub key_pages: Mutex<VecDeque<Result<RestPage<PublicKey>, TransportError>>>,
    pub created: Mutex<Vec<CreateRepositoryRequest>>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedRest {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RestApi for ScriptedRest {
    async fn list_workflows(
        &self,
        owner: &str,
        repo: &str,
        page: PageRequest,
    ) -> Result<RestPage<WorkflowSummary>, TransportError> {
        self.record(format!("list_workflows {owner}/{repo} page={}", page.page));
        let next = self
            .workflow_pages
            .lock()
            .unwrap()
            .get_mut(&format!("{owner}/{repo}"))
            .and_then(VecDeque::pop_front);
        Ok(next.unwrap_or_else(|| RestPage::last(Vec::new())))
    }

    async fn get_workflow_usage(
        &self,
        owner: &str,
        repo: &str,
        workflow: WorkflowId,
    ) -> Result<RunnerUsage, TransportError> {
        self.record(format!("get_workflow_usage {owner}/{repo} {workflow}"));
        self.usage
            .get(&workflow.as_u64())
            .copied()
            .ok_or_else(|| TransportError::Http {
                status: 404,
                message: "Not Found".into(),
            })
    }

    async fn get_vulnerability_alerts(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<bool, TransportError> {
        let key = format!("{owner}/{repo}");
        self.record(format!("get_vulnerability_alerts {key}"));
        Ok(self.alerts_enabled.get(&key).copied().unwrap_or(false))
    }

    async fn enable_vulnerability_alerts(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<(), TransportError> {
        self.record(format!("enable_vulnerability_alerts {owner}/{repo}"));
        Ok(())
    }

    async fn list_public_keys(
        &self,
        user: &str,
        page: PageRequest,
    ) -> Result<RestPage<PublicKey>, TransportError> {
        self.record(format!("list_public_keys {user} page={}", page.page));
        self.key_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(RestPage::last(Vec::new())))
    }

    async fn create_repository(
        &self,
        org: &OrganizationName,
        request: &CreateRepositoryRequest,
    ) -> Result<(), TransportError> {
        self.record(format!("create_repository {org}"));
        self.created.lock().unwrap().push(request.clone());
        Ok(())
    }
}
