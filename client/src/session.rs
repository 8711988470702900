use parking_lot::RwLock;

/// The access/refresh pair the server issued last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
  pub access_token: String,
  pub refresh_token: String,
}

/// Holds at most one session. Reads and writes never block across an await.
#[derive(Debug, Default)]
pub struct SessionStore {
  tokens: RwLock<Option<SessionTokens>>,
}

impl SessionStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set(&self, tokens: SessionTokens) {
    *self.tokens.write() = Some(tokens);
  }

  pub fn clear(&self) {
    *self.tokens.write() = None;
  }

  pub fn tokens(&self) -> Option<SessionTokens> {
    self.tokens.read().clone()
  }

  pub fn access_token(&self) -> Option<String> {
    self.tokens.read().as_ref().map(|t| t.access_token.clone())
  }

  pub fn refresh_token(&self) -> Option<String> {
    self.tokens.read().as_ref().map(|t| t.refresh_token.clone())
  }

  pub fn is_authenticated(&self) -> bool {
    self.tokens.read().is_some()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn set_replaces_and_clear_forgets() {
    let store = SessionStore::new();
    assert!(!store.is_authenticated());

    store.set(SessionTokens {
      access_token: "a1".to_string(),
      refresh_token: "r1".to_string(),
    });
    store.set(SessionTokens {
      access_token: "a2".to_string(),
      refresh_token: "r2".to_string(),
    });
    assert_eq!(store.access_token().as_deref(), Some("a2"));
    assert_eq!(store.refresh_token().as_deref(), Some("r2"));

    store.clear();
    assert!(store.tokens().is_none());
  }
}
