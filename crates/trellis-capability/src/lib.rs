//! Trellis Capabilities
//!
//! External capability traits consumed by node handlers. The engine never
//! talks to a mail server, HTTP endpoint, database, or notification channel
//! directly; it goes through these traits so hosts can wire in real
//! transports and tests can observe calls with the mocks in [`mock`].
//!
//! A capability failure (network error, SQL error, timeout) surfaces as a
//! [`CapabilityError`], which the executor wraps into the failing node's
//! execution record. Nothing here is retried or swallowed.

pub mod mock;

mod log;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub use log::{LogDatabase, LogMailer, LogNotifier};

/// Error produced by an external capability.
#[derive(Debug, Error)]
pub enum CapabilityError {
  /// The transport failed (network error, connection refused, timeout).
  #[error("transport error: {0}")]
  Transport(String),

  /// The collaborator accepted the call but rejected the request.
  #[error("rejected: {0}")]
  Rejected(String),
}

/// Outcome of an HTTP request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
  pub status: u16,
  /// Response body, parsed as JSON when possible, else a JSON string.
  pub data: Value,
}

/// Sends an email on behalf of an email node.
#[async_trait]
pub trait Mailer: Send + Sync {
  async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), CapabilityError>;
}

/// Performs an HTTP request on behalf of a webhook node.
#[async_trait]
pub trait HttpClient: Send + Sync {
  async fn request(
    &self,
    method: &str,
    url: &str,
    headers: &Map<String, Value>,
    body: Option<&Value>,
  ) -> Result<HttpResponse, CapabilityError>;
}

/// Executes a parameterized statement on behalf of a database node.
///
/// Returns the number of rows affected.
#[async_trait]
pub trait Database: Send + Sync {
  async fn execute(&self, statement: &str, params: &[Value]) -> Result<u64, CapabilityError>;
}

/// Emits a notification on behalf of a notification node.
#[async_trait]
pub trait Notifier: Send + Sync {
  async fn notify(&self, title: &str, message: &str) -> Result<(), CapabilityError>;
}

/// The full set of capabilities available to node handlers.
#[derive(Clone)]
pub struct Capabilities {
  pub mailer: Arc<dyn Mailer>,
  pub http: Arc<dyn HttpClient>,
  pub database: Arc<dyn Database>,
  pub notifier: Arc<dyn Notifier>,
}

impl Capabilities {
  /// Capabilities that log mail/database/notification calls via `tracing`
  /// and succeed, with the given HTTP client for webhook nodes.
  ///
  /// Useful for local runs where only the HTTP side effect is real.
  pub fn logging_with_http(http: Arc<dyn HttpClient>) -> Self {
    Self {
      mailer: Arc::new(LogMailer),
      http,
      database: Arc::new(LogDatabase),
      notifier: Arc::new(LogNotifier),
    }
  }
}
