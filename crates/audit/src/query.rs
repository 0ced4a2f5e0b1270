//! Pagination executors.
//!
//! [`PaginatedQuery`] drives one GraphQL document to exhaustion by advancing
//! a cursor variable. Each fetcher declares its own response schema and
//! passes an accumulation callback that moves the page's items into
//! caller-owned state and hands back the connection's [`PageInfo`]; the
//! executor only decides whether to ask for another page.
//!
//! [`walk_pages`] is the page-number equivalent for REST list endpoints.
//!
//! Both executors are strictly sequential: the next request is issued only
//! after the previous page has been accumulated. A failure aborts the walk at
//! once; items accumulated from earlier pages are left in place and the
//! caller must treat the collection as unusable.

use std::collections::BTreeMap;
use std::future::Future;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ports::{GraphQlTransport, PageRequest, RestPage, TransportError};
use crate::{AuditError, Cursor, Timestamp};

#[path = "query_tests.rs"]
#[cfg(test)]
mod tests;

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

/// A typed GraphQL variable value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VariableValue {
    /// Explicit `null`; also the initial value of a cursor variable.
    Null,
    String(String),
    Int(i64),
    Bool(bool),
    DateTime(Timestamp),
}

/// Named variable bindings sent alongside a GraphQL document.
///
/// Serializes as the JSON object expected in the `variables` member of a
/// GraphQL request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QueryVariables(BTreeMap<String, VariableValue>);

impl QueryVariables {
    /// Creates an empty binding set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `value`, replacing any previous binding.
    pub fn set(&mut self, name: impl Into<String>, value: VariableValue) {
        self.0.insert(name.into(), value);
    }

    /// Returns the value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&VariableValue> {
        self.0.get(name)
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Connection schema
// ---------------------------------------------------------------------------

/// Page descriptor of a GraphQL connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub start_cursor: Option<Cursor>,
    #[serde(default)]
    pub end_cursor: Option<Cursor>,
    #[serde(default)]
    pub has_previous_page: bool,
    #[serde(default)]
    pub has_next_page: bool,
}

impl PageInfo {
    /// Descriptor of a final page. Used when a connection is `null`.
    pub fn last() -> Self {
        Self::default()
    }
}

/// A connection exposing its items as `nodes`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConnection<T> {
    pub page_info: PageInfo,
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

/// A connection exposing its items as `edges`, for queries that need
/// edge-level fields such as a member's role.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeConnection<E> {
    pub page_info: PageInfo,
    #[serde(default = "Vec::new")]
    pub edges: Vec<E>,
}

// ---------------------------------------------------------------------------
// Cursor executor
// ---------------------------------------------------------------------------

/// One logical GraphQL query, paged by a cursor variable.
#[derive(Debug, Clone)]
pub struct PaginatedQuery {
    operation: &'static str,
    document: &'static str,
    variables: QueryVariables,
    cursor: Option<String>,
    max_pages: Option<u32>,
}

impl PaginatedQuery {
    /// Starts a query. `operation` names it in logs and errors.
    pub fn new(operation: &'static str, document: &'static str) -> Self {
        Self {
            operation,
            document,
            variables: QueryVariables::new(),
            cursor: None,
            max_pages: None,
        }
    }

    pub fn string(mut self, name: &str, value: impl Into<String>) -> Self {
        self.variables.set(name, VariableValue::String(value.into()));
        self
    }

    pub fn nullable_string(mut self, name: &str) -> Self {
        self.variables.set(name, VariableValue::Null);
        self
    }

    pub fn int(mut self, name: &str, value: i64) -> Self {
        self.variables.set(name, VariableValue::Int(value));
        self
    }

    pub fn bool(mut self, name: &str, value: bool) -> Self {
        self.variables.set(name, VariableValue::Bool(value));
        self
    }

    pub fn time(mut self, name: &str, value: Timestamp) -> Self {
        self.variables.set(name, VariableValue::DateTime(value));
        self
    }

    /// Designates `name` as the cursor variable and binds it to `null`.
    ///
    /// A query without a cursor variable is executed exactly once.
    pub fn cursor(mut self, name: &str) -> Self {
        self.cursor = Some(name.to_owned());
        self.variables.set(name, VariableValue::Null);
        self
    }

    /// Fails the query once more than `limit` pages would be requested.
    /// `None` leaves the query unbounded.
    pub fn max_pages(mut self, limit: Option<u32>) -> Self {
        self.max_pages = limit;
        self
    }

    /// Current variable bindings.
    pub fn variables(&self) -> &QueryVariables {
        &self.variables
    }

    /// Runs the query until the source reports no further page.
    ///
    /// Each response's `data` object is decoded as `T` and passed to
    /// `accumulate`, whose returned [`PageInfo`] decides whether to continue.
    /// Returns the number of pages processed.
    pub async fn run<T, F>(
        mut self,
        transport: &dyn GraphQlTransport,
        mut accumulate: F,
    ) -> Result<u32, AuditError>
    where
        T: DeserializeOwned,
        F: FnMut(T) -> PageInfo,
    {
        let operation = self.operation;
        let mut pages = 0u32;
        loop {
            let data = transport
                .execute(self.document, &self.variables)
                .await
                .map_err(|source| AuditError::transport(operation, source))?;
            let page: T = serde_json::from_value(data).map_err(|e| AuditError::Decode {
                operation,
                message: e.to_string(),
            })?;
            let info = accumulate(page);
            pages += 1;
            debug!(
                operation,
                page = pages,
                has_next_page = info.has_next_page,
                "Fetched page"
            );

            if !info.has_next_page {
                return Ok(pages);
            }
            let Some(cursor_name) = self.cursor.clone() else {
                return Ok(pages);
            };
            let end_cursor = info
                .end_cursor
                .ok_or(AuditError::MissingCursor { operation })?;
            if let Some(limit) = self.max_pages {
                if pages >= limit {
                    return Err(AuditError::PageLimitExceeded { operation, limit });
                }
            }
            self.variables
                .set(cursor_name, VariableValue::String(end_cursor.as_str().to_owned()));
        }
    }
}

// ---------------------------------------------------------------------------
// Page-number executor
// ---------------------------------------------------------------------------

/// Walks a page-numbered REST list from page 1, following each page's
/// `next_page`, and returns every item in server order.
pub async fn walk_pages<T, F, Fut>(
    operation: &'static str,
    max_pages: Option<u32>,
    mut fetch: F,
) -> Result<Vec<T>, AuditError>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<RestPage<T>, TransportError>>,
{
    let mut items = Vec::new();
    let mut request = PageRequest::first();
    let mut pages = 0u32;
    loop {
        let page = fetch(request)
            .await
            .map_err(|source| AuditError::transport(operation, source))?;
        items.extend(page.items);
        pages += 1;
        debug!(
            operation,
            page = request.page,
            has_next_page = page.next_page.is_some(),
            "Fetched page"
        );

        let Some(next) = page.next_page else {
            return Ok(items);
        };
        if let Some(limit) = max_pages {
            if pages >= limit {
                return Err(AuditError::PageLimitExceeded { operation, limit });
            }
        }
        request = request.at(next);
    }
}
