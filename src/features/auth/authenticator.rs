use std::sync::Arc;

use crate::core::error::Result;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::services::AccountService;
use crate::features::auth::JwtValidator;

/// Turns a bearer token into a local user: token validation followed by account resolution
pub struct Authenticator {
    validator: Arc<JwtValidator>,
    accounts: Arc<AccountService>,
}

impl Authenticator {
    pub fn new(validator: Arc<JwtValidator>, accounts: Arc<AccountService>) -> Self {
        Self {
            validator,
            accounts,
        }
    }

    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser> {
        let identity = self.validator.validate_token(token).await?;
        self.accounts.resolve(&identity).await
    }
}
