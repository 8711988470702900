use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  User,
  Admin,
}

/// What a role may do beyond managing its own account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
  ManageCatalog,
  ManageOrders,
  ManageUsers,
  ViewDashboard,
}

impl Role {
  pub fn grants(&self, capability: Capability) -> bool {
    match capability {
      Capability::ManageCatalog | Capability::ManageOrders | Capability::ManageUsers | Capability::ViewDashboard => {
        *self == Role::Admin
      }
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Role::User => "USER",
      Role::Admin => "ADMIN",
    }
  }
}

impl std::str::FromStr for Role {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "USER" => Ok(Role::User),
      "ADMIN" => Ok(Role::Admin),
      other => Err(format!("unknown role '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: Uuid,
  pub email: String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub first_name: String,
  pub last_name: String,
  pub phone: Option<String>,
  pub role: Role,
  pub is_blocked: bool,
  /// SHA-256 digest of the only refresh token currently honoured for this user.
  #[serde(skip_serializing)]
  pub refresh_token_hash: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// What a user may see about themselves.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  pub id: Uuid,
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  pub phone: Option<String>,
  pub role: Role,
  pub is_blocked: bool,
  pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
  fn from(user: &User) -> Self {
    Self {
      id: user.id,
      email: user.email.clone(),
      first_name: user.first_name.clone(),
      last_name: user.last_name.clone(),
      phone: user.phone.clone(),
      role: user.role,
      is_blocked: user.is_blocked,
      created_at: user.created_at,
    }
  }
}

#[derive(Debug, Clone)]
pub struct NewUser {
  pub email: String,
  pub password_hash: String,
  pub first_name: String,
  pub last_name: String,
  pub phone: Option<String>,
  pub role: Role,
}

/// Row of the admin customer table.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
  pub id: Uuid,
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  pub phone: Option<String>,
  pub is_blocked: bool,
  pub created_at: DateTime<Utc>,
  pub order_count: i64,
}

#[cfg(test)]
mod tests {
  use super::*;

  const ALL: [Capability; 4] = [
    Capability::ManageCatalog,
    Capability::ManageOrders,
    Capability::ManageUsers,
    Capability::ViewDashboard,
  ];

  #[test]
  fn only_admins_hold_capabilities() {
    assert!(ALL.iter().all(|c| Role::Admin.grants(*c)));
    assert!(!ALL.iter().any(|c| Role::User.grants(*c)));
  }
}
