//! Recording mock capabilities for tests.
//!
//! Each mock records the calls it receives behind a mutex so assertions can
//! inspect them after an execution completes. The HTTP mock additionally
//! returns a canned response or error.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{
  Capabilities, CapabilityError, Database, HttpClient, HttpResponse, Mailer, Notifier,
};

/// A recorded outgoing email.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMail {
  pub to: String,
  pub subject: String,
  pub body: String,
}

/// Records every mail send.
#[derive(Debug, Clone, Default)]
pub struct MockMailer {
  sent: Arc<Mutex<Vec<SentMail>>>,
}

impl MockMailer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn sent(&self) -> Vec<SentMail> {
    self.sent.lock().unwrap().clone()
  }
}

#[async_trait]
impl Mailer for MockMailer {
  async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), CapabilityError> {
    self.sent.lock().unwrap().push(SentMail {
      to: to.to_string(),
      subject: subject.to_string(),
      body: body.to_string(),
    });
    Ok(())
  }
}

/// A recorded HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpCall {
  pub method: String,
  pub url: String,
  pub headers: Map<String, Value>,
  pub body: Option<Value>,
}

enum HttpBehavior {
  Respond { status: u16, data: Value },
  Fail(String),
}

/// Returns a canned response (or error) and records every request.
pub struct MockHttpClient {
  behavior: HttpBehavior,
  calls: Arc<Mutex<Vec<HttpCall>>>,
}

impl MockHttpClient {
  /// A client that answers every request with the given status and body.
  pub fn respond_with(status: u16, data: Value) -> Self {
    Self {
      behavior: HttpBehavior::Respond { status, data },
      calls: Arc::default(),
    }
  }

  /// A client that fails every request with a transport error.
  pub fn failing(message: &str) -> Self {
    Self {
      behavior: HttpBehavior::Fail(message.to_string()),
      calls: Arc::default(),
    }
  }

  pub fn calls(&self) -> Vec<HttpCall> {
    self.calls.lock().unwrap().clone()
  }
}

#[async_trait]
impl HttpClient for MockHttpClient {
  async fn request(
    &self,
    method: &str,
    url: &str,
    headers: &Map<String, Value>,
    body: Option<&Value>,
  ) -> Result<HttpResponse, CapabilityError> {
    self.calls.lock().unwrap().push(HttpCall {
      method: method.to_string(),
      url: url.to_string(),
      headers: headers.clone(),
      body: body.cloned(),
    });

    match &self.behavior {
      HttpBehavior::Respond { status, data } => Ok(HttpResponse {
        status: *status,
        data: data.clone(),
      }),
      HttpBehavior::Fail(message) => Err(CapabilityError::Transport(message.clone())),
    }
  }
}

/// A recorded database statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
  pub statement: String,
  pub params: Vec<Value>,
}

/// Records every statement and reports a fixed number of rows affected.
#[derive(Debug, Clone)]
pub struct MockDatabase {
  rows_affected: u64,
  executed: Arc<Mutex<Vec<ExecutedStatement>>>,
}

impl MockDatabase {
  pub fn new(rows_affected: u64) -> Self {
    Self {
      rows_affected,
      executed: Arc::default(),
    }
  }

  pub fn executed(&self) -> Vec<ExecutedStatement> {
    self.executed.lock().unwrap().clone()
  }
}

#[async_trait]
impl Database for MockDatabase {
  async fn execute(&self, statement: &str, params: &[Value]) -> Result<u64, CapabilityError> {
    self.executed.lock().unwrap().push(ExecutedStatement {
      statement: statement.to_string(),
      params: params.to_vec(),
    });
    Ok(self.rows_affected)
  }
}

/// A recorded notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Notified {
  pub title: String,
  pub message: String,
}

/// Records every notification.
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
  notified: Arc<Mutex<Vec<Notified>>>,
}

impl MockNotifier {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn notified(&self) -> Vec<Notified> {
    self.notified.lock().unwrap().clone()
  }
}

#[async_trait]
impl Notifier for MockNotifier {
  async fn notify(&self, title: &str, message: &str) -> Result<(), CapabilityError> {
    self.notified.lock().unwrap().push(Notified {
      title: title.to_string(),
      message: message.to_string(),
    });
    Ok(())
  }
}

/// A full mock capability set with handles kept for assertions.
#[derive(Clone)]
pub struct MockCapabilities {
  pub mailer: MockMailer,
  pub http: Arc<MockHttpClient>,
  pub database: MockDatabase,
  pub notifier: MockNotifier,
}

impl MockCapabilities {
  /// Mocks whose HTTP client answers with the given status and body.
  pub fn with_http_response(status: u16, data: Value) -> Self {
    Self::with_http(MockHttpClient::respond_with(status, data))
  }

  /// Mocks whose HTTP client fails every request.
  pub fn with_http_failure(message: &str) -> Self {
    Self::with_http(MockHttpClient::failing(message))
  }

  fn with_http(http: MockHttpClient) -> Self {
    Self {
      mailer: MockMailer::new(),
      http: Arc::new(http),
      database: MockDatabase::new(1),
      notifier: MockNotifier::new(),
    }
  }

  /// The trait-object bundle handed to the executor.
  pub fn capabilities(&self) -> Capabilities {
    Capabilities {
      mailer: Arc::new(self.mailer.clone()),
      http: self.http.clone(),
      database: Arc::new(self.database.clone()),
      notifier: Arc::new(self.notifier.clone()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[tokio::test]
  async fn test_mock_http_records_calls() {
    let http = MockHttpClient::respond_with(200, json!({"ok": true}));

    let response = http
      .request("POST", "https://example.com", &Map::new(), None)
      .await
      .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(http.calls().len(), 1);
    assert_eq!(http.calls()[0].method, "POST");
  }

  #[tokio::test]
  async fn test_failing_http_returns_transport_error() {
    let http = MockHttpClient::failing("connection refused");

    let err = http
      .request("GET", "https://example.com", &Map::new(), None)
      .await
      .unwrap_err();

    assert!(matches!(err, CapabilityError::Transport(_)));
    assert_eq!(http.calls().len(), 1);
  }
}
