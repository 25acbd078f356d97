use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::shared::constants::ROLE_STAFF;

/// Caller identity attached to the request by the auth middleware
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Local user id (`core_users.id`)
    pub user_id: Uuid,
    /// Google subject identifier
    pub sub: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    /// Check if user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Staff users may use the admin endpoints
    pub fn is_staff(&self) -> bool {
        self.has_role(ROLE_STAFF)
    }
}

/// Verified claims of a Google ID token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleIdentity {
    pub sub: String,
    pub email: String,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
}

impl GoogleIdentity {
    /// Profile fields kept on the linked social account
    pub fn extra_data(&self) -> serde_json::Value {
        let mut data = serde_json::Map::new();
        let fields = [
            ("name", &self.name),
            ("given_name", &self.given_name),
            ("family_name", &self.family_name),
            ("picture", &self.picture),
        ];
        for (key, value) in fields {
            if let Some(v) = value {
                data.insert(key.to_string(), serde_json::Value::String(v.clone()));
            }
        }
        serde_json::Value::Object(data)
    }
}

/// Database row for a user joined with its Google social account (if linked)
#[derive(Debug, Clone, FromRow)]
pub struct UserWithSocial {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub extra_data: Option<serde_json::Value>,
}

impl UserWithSocial {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    fn social_field(&self, key: &str) -> Option<String> {
        self.extra_data
            .as_ref()
            .and_then(|data| data.get(key))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    /// Display name: social profile name, then full name, then email
    pub fn display_name(&self) -> String {
        match self.extra_data {
            Some(_) => self.social_field("name").unwrap_or_else(|| self.full_name()),
            None => {
                let full_name = self.full_name();
                if full_name.is_empty() {
                    self.email.clone()
                } else {
                    full_name
                }
            }
        }
    }

    /// Avatar URL from the social profile, empty when none is linked
    pub fn picture(&self) -> String {
        self.social_field("picture").unwrap_or_default()
    }
}
