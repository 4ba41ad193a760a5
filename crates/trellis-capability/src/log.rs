//! Capability implementations that log the call and succeed.
//!
//! These stand in for real transports during local runs and demos; the
//! concrete mail/notification/database integrations are wired in by the host
//! application.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::{CapabilityError, Database, Mailer, Notifier};

/// Logs outgoing mail instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
  async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), CapabilityError> {
    info!(to = %to, subject = %subject, "mail_send");
    Ok(())
  }
}

/// Logs statements instead of executing them; reports zero rows affected.
#[derive(Debug, Clone, Default)]
pub struct LogDatabase;

#[async_trait]
impl Database for LogDatabase {
  async fn execute(&self, statement: &str, params: &[Value]) -> Result<u64, CapabilityError> {
    info!(statement = %statement, params = ?params, "db_execute");
    Ok(0)
  }
}

/// Logs notifications instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
  async fn notify(&self, title: &str, message: &str) -> Result<(), CapabilityError> {
    info!(title = %title, message = %message, "notify");
    Ok(())
  }
}
