use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::UserInfoDto;
use crate::features::auth::model::{AuthenticatedUser, GoogleIdentity, UserWithSocial};
use crate::shared::constants::{ROLE_STAFF, SOCIAL_PROVIDER_GOOGLE};

/// Longest first/last name accepted by `core_users`
const MAX_NAME_CHARS: usize = 150;

/// Maps verified Google identities onto local users and linked social accounts
pub struct AccountService {
    pool: PgPool,
    admin_emails: Vec<String>,
}

impl AccountService {
    pub fn new(pool: PgPool, admin_emails: Vec<String>) -> Self {
        Self { pool, admin_emails }
    }

    fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails.iter().any(|e| e == email)
    }

    /// Resolve the local user for a verified identity, creating or refreshing it when needed
    pub async fn resolve(&self, identity: &GoogleIdentity) -> Result<AuthenticatedUser> {
        let extra_data = identity.extra_data();
        let promote = self.is_admin_email(&identity.email);

        let existing = sqlx::query_as::<_, UserWithSocial>(
            r#"
            SELECT u.id, u.email, u.first_name, u.last_name, u.is_staff, s.extra_data
            FROM core_social_accounts s
            JOIN core_users u ON u.id = s.user_id
            WHERE s.provider = $1 AND s.uid = $2
            "#,
        )
        .bind(SOCIAL_PROVIDER_GOOGLE)
        .bind(&identity.sub)
        .fetch_optional(&self.pool)
        .await?;

        // Fast path: nothing changed since the last sign-in
        if let Some(user) = existing {
            let unchanged = user.extra_data.as_ref() == Some(&extra_data)
                && (user.is_staff || !promote);
            if unchanged {
                return Ok(Self::authenticated(user.id, user.is_staff, identity));
            }
        }

        let mut tx = self.pool.begin().await?;

        let (user_id, is_staff): (Uuid, bool) = sqlx::query_as(
            r#"
            INSERT INTO core_users (email, first_name, last_name, is_staff, last_login)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (email) DO UPDATE
            SET is_staff = core_users.is_staff OR EXCLUDED.is_staff,
                last_login = NOW()
            RETURNING id, is_staff
            "#,
        )
        .bind(&identity.email)
        .bind(truncate_name(identity.given_name.as_deref()))
        .bind(truncate_name(identity.family_name.as_deref()))
        .bind(promote)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO core_social_accounts (user_id, provider, uid, extra_data)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (provider, uid) DO UPDATE
            SET user_id = EXCLUDED.user_id,
                extra_data = EXCLUDED.extra_data,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(SOCIAL_PROVIDER_GOOGLE)
        .bind(&identity.sub)
        .bind(&extra_data)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Linked Google account: user_id={}, email={}, staff={}",
            user_id,
            identity.email,
            is_staff
        );

        Ok(Self::authenticated(user_id, is_staff, identity))
    }

    fn authenticated(user_id: Uuid, is_staff: bool, identity: &GoogleIdentity) -> AuthenticatedUser {
        let mut roles = Vec::new();
        if is_staff {
            roles.push(ROLE_STAFF.to_string());
        }
        AuthenticatedUser {
            user_id,
            sub: identity.sub.clone(),
            email: identity.email.clone(),
            roles,
        }
    }

    /// Serialized profile for `/api/auth/user/`
    pub async fn user_info(&self, user_id: Uuid) -> Result<UserInfoDto> {
        let user = sqlx::query_as::<_, UserWithSocial>(
            r#"
            SELECT u.id, u.email, u.first_name, u.last_name, u.is_staff, s.extra_data
            FROM core_users u
            LEFT JOIN core_social_accounts s ON s.user_id = u.id AND s.provider = $2
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .bind(SOCIAL_PROVIDER_GOOGLE)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        Ok(UserInfoDto::from(user))
    }
}

fn truncate_name(name: Option<&str>) -> String {
    name.unwrap_or_default().chars().take(MAX_NAME_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::lazy_pool;

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name(None), "");
        assert_eq!(truncate_name(Some("Ada")), "Ada");
        assert_eq!(truncate_name(Some(&"x".repeat(200))).len(), MAX_NAME_CHARS);
    }

    #[tokio::test]
    async fn test_authenticated_roles_follow_staff_flag() {
        let identity = GoogleIdentity {
            sub: "42".to_string(),
            email: "ops@example.com".to_string(),
            name: None,
            given_name: None,
            family_name: None,
            picture: None,
        };
        let service = AccountService::new(lazy_pool(), vec!["ops@example.com".to_string()]);
        assert!(service.is_admin_email("ops@example.com"));
        assert!(!service.is_admin_email("someone@example.com"));

        let staff = AccountService::authenticated(Uuid::nil(), true, &identity);
        assert!(staff.is_staff());
        let regular = AccountService::authenticated(Uuid::nil(), false, &identity);
        assert!(regular.roles.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_resolve_creates_user_once_and_promotes_admins(pool: PgPool) {
        let service = AccountService::new(pool.clone(), vec!["ada@example.com".to_string()]);
        let identity = GoogleIdentity {
            sub: "g-1".to_string(),
            email: "ada@example.com".to_string(),
            name: Some("Ada Lovelace".to_string()),
            given_name: Some("Ada".to_string()),
            family_name: Some("Lovelace".to_string()),
            picture: Some("https://p/ada".to_string()),
        };

        let first = service.resolve(&identity).await.unwrap();
        let second = service.resolve(&identity).await.unwrap();
        assert_eq!(first.user_id, second.user_id);
        assert!(first.is_staff());

        let info = service.user_info(first.user_id).await.unwrap();
        assert_eq!(info.name, "Ada Lovelace");
        assert_eq!(info.picture, "https://p/ada");
        assert!(info.is_authenticated);
    }
}
