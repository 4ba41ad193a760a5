//! Reqwest-backed [`HttpClient`] implementation for webhook nodes.
//!
//! Timeouts are whatever the underlying `reqwest::Client` is configured
//! with; the engine itself imposes none. A hung call stalls only the issuing
//! execution.

use async_trait::async_trait;
use serde_json::{Map, Value};
use trellis_capability::{CapabilityError, HttpClient, HttpResponse};

/// HTTP capability backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttpClient {
  client: reqwest::Client,
}

impl ReqwestHttpClient {
  pub fn new() -> Self {
    Self::default()
  }

  /// Use a preconfigured client (custom timeout, proxy, etc.).
  pub fn with_client(client: reqwest::Client) -> Self {
    Self { client }
  }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
  async fn request(
    &self,
    method: &str,
    url: &str,
    headers: &Map<String, Value>,
    body: Option<&Value>,
  ) -> Result<HttpResponse, CapabilityError> {
    let method = reqwest::Method::from_bytes(method.to_uppercase().as_bytes())
      .map_err(|_| CapabilityError::Rejected(format!("invalid HTTP method: {}", method)))?;

    let mut request = self.client.request(method, url);
    for (name, value) in headers {
      let value = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
      };
      request = request.header(name.as_str(), value);
    }
    if let Some(body) = body {
      request = request.json(body);
    }

    let response = request
      .send()
      .await
      .map_err(|e| CapabilityError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let text = response
      .text()
      .await
      .map_err(|e| CapabilityError::Transport(e.to_string()))?;

    // Non-JSON bodies come back as a plain string.
    let data = serde_json::from_str(&text).unwrap_or(Value::String(text));

    Ok(HttpResponse { status, data })
  }
}
