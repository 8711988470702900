use std::time::Duration;

/// Where and how the client talks to the API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
  /// Server origin, e.g. `http://localhost:5000`. Routes are joined under `/api`.
  pub base_url: String,

  pub timeout: Duration,
}

impl ClientConfig {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into(),
      timeout: Duration::from_secs(30),
    }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// Absolute URL of an API route such as `/cart`.
  pub fn url(&self, path: &str) -> String {
    format!("{}/api/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn joins_routes_under_api() {
    let config = ClientConfig::new("http://localhost:5000/");
    assert_eq!(config.url("/cart"), "http://localhost:5000/api/cart");
    assert_eq!(config.url("orders/1"), "http://localhost:5000/api/orders/1");
  }
}
