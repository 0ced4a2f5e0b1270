//! GitHub infrastructure adapter.
//!
//! Implements the port traits defined in the [`audit`] crate
//! ([`GraphQlTransport`](audit::GraphQlTransport) and
//! [`RestApi`](audit::RestApi)) with a single [`GithubClient`] backed by
//! `reqwest`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules.
//! Authentication, URL construction, the GraphQL response envelope and the
//! REST `Link` header are handled here; the [`audit`] crate never sees them.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`client`] | [`GithubClient`], [`GithubConfig`] and the shared request path |
//! | [`graphql`] | `GraphQlTransport` implementation (v4 API) |
//! | [`rest`] | `RestApi` implementation (v3 API) |
//! | [`link`] | `Link` header parsing for REST pagination |
//!
//! Rate limiting and retries are intentionally absent: a failed request is
//! reported to the caller as a [`TransportError`](audit::TransportError).

pub mod client;
pub mod graphql;
pub mod link;
pub mod rest;

pub use client::{GithubClient, GithubConfig, DEFAULT_API_URL};
