//! Top-level error type for the audit domain.
//!
//! [`AuditError`] covers every condition that aborts a fetch or an audit.
//! Failures reported by the transport adapters are defined next to the port
//! traits as [`crate::ports::TransportError`] and wrapped here together with
//! the name of the operation that was running.
//!
//! There is no retry classification: every fetch and audit is all-or-nothing,
//! and a caller receiving an error must discard whatever it was building.

use thiserror::Error;

use crate::ports::TransportError;

/// Errors produced by fetchers, the pagination executors, and audits.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The transport failed to complete a request.
    #[error("{operation} failed: {source}")]
    Transport {
        /// Name of the fetch operation that issued the request.
        operation: &'static str,
        /// The underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// A response arrived but did not match the declared response schema.
    #[error("{operation} returned an unexpected response: {message}")]
    Decode {
        /// Name of the fetch operation whose response failed to decode.
        operation: &'static str,
        /// Decoder message.
        message: String,
    },

    /// The remote source kept reporting further pages beyond the configured
    /// page bound.
    #[error("{operation} exceeded the limit of {limit} pages")]
    PageLimitExceeded {
        /// Name of the fetch operation that was paging.
        operation: &'static str,
        /// The configured maximum number of pages.
        limit: u32,
    },

    /// The remote source reported a further page without an end cursor to
    /// continue from.
    #[error("{operation} reported another page but no end cursor")]
    MissingCursor {
        /// Name of the fetch operation that was paging.
        operation: &'static str,
    },

    /// The runtime configuration is invalid.
    ///
    /// Produced at load time; no request is issued with an invalid config.
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },
}

impl AuditError {
    /// Wraps a transport failure with the name of the running operation.
    pub fn transport(operation: &'static str, source: TransportError) -> Self {
        Self::Transport { operation, source }
    }
}
