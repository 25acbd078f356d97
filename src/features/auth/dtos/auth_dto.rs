use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::auth::model::UserWithSocial;

/// Profile of the signed-in user returned by `/api/auth/user/`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserInfoDto {
    pub id: Uuid,
    pub email: String,
    /// Display name from the linked Google profile, falling back to the full name or email
    pub name: String,
    /// Avatar URL from the linked Google profile, empty when unavailable
    pub picture: String,
    #[serde(rename = "isAuthenticated")]
    pub is_authenticated: bool,
}

impl From<UserWithSocial> for UserInfoDto {
    fn from(user: UserWithSocial) -> Self {
        Self {
            name: user.display_name(),
            picture: user.picture(),
            id: user.id,
            email: user.email,
            is_authenticated: true,
        }
    }
}

/// Body returned to callers without a valid session
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnonymousUserDto {
    #[serde(rename = "isAuthenticated")]
    pub is_authenticated: bool,
}

impl Default for AnonymousUserDto {
    fn default() -> Self {
        Self {
            is_authenticated: false,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum UserInfoResponse {
    Authenticated(UserInfoDto),
    Anonymous(AnonymousUserDto),
}
