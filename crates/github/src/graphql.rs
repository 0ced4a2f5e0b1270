//! GraphQL (v4) transport.

use async_trait::async_trait;
use audit::query::QueryVariables;
use audit::{GraphQlTransport, TransportError};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::client::{json_body, GithubClient};

#[path = "graphql_tests.rs"]
#[cfg(test)]
mod tests;

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: &'a QueryVariables,
}

/// The response envelope. GitHub may return partial `data` alongside
/// `errors`; any error fails the whole request.
#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorMessage {
    message: String,
}

impl GraphQlResponse {
    fn into_data(self) -> Result<Value, TransportError> {
        if !self.errors.is_empty() {
            return Err(TransportError::GraphQl(
                self.errors.into_iter().map(|e| e.message).collect(),
            ));
        }
        self.data
            .ok_or_else(|| TransportError::Decode("response carried neither data nor errors".into()))
    }
}

#[async_trait]
impl GraphQlTransport for GithubClient {
    #[instrument(skip_all)]
    async fn execute(
        &self,
        document: &str,
        variables: &QueryVariables,
    ) -> Result<Value, TransportError> {
        let request = self
            .authorized(Method::POST, self.graphql_endpoint())
            .json(&GraphQlRequest {
                query: document,
                variables,
            });
        let response = self.send(request).await?;
        json_body::<GraphQlResponse>(response).await?.into_data()
    }
}
