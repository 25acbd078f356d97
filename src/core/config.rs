use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Typed settings read once at startup from the environment (and `.env` when present)
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    /// Upper bound for multipart upload bodies, in bytes
    pub max_request_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Google sign-in token validation settings
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// OAuth client id; ID tokens must carry it as audience
    pub google_client_id: String,
    /// Accepted `iss` values
    pub issuers: Vec<String>,
    pub jwks_url: String,
    pub jwks_cache_ttl: Duration,
    pub jwt_leeway: Duration,
    /// Emails promoted to staff on sign-in (lowercased)
    pub admin_emails: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// S3-compatible bucket holding the uploaded files
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    /// Leading key segment for uploaded objects; empty stores them at the bucket root
    pub upload_prefix: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            storage: StorageConfig::from_env()?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn required(key: &str) -> Result<String, String> {
    env::var(key).map_err(|_| format!("{} must be set", key))
}

/// Parse `key` when set, `default` otherwise
fn parsed<T: FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("{} must be a valid number", key)),
        Err(_) => Ok(default),
    }
}

/// Split a comma-separated env value into trimmed, non-empty items
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 50 * 1024 * 1024;

    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            host: env_or("HOST", "127.0.0.1"),
            port: parsed("PORT", 8000)?,
            cors_allowed_origins: parse_list(&env_or("CORS_ALLOWED_ORIGINS", "*")),
            max_request_body_size: parsed(
                "MAX_REQUEST_BODY_SIZE",
                Self::DEFAULT_MAX_REQUEST_BODY_SIZE,
            )?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            url: required("DATABASE_URL")?,
            max_connections: parsed("DB_MAX_CONNECTIONS", 10)?,
            min_connections: parsed("DB_MIN_CONNECTIONS", 1)?,
            acquire_timeout_secs: parsed("DB_ACQUIRE_TIMEOUT_SECS", 5)?,
            idle_timeout_secs: parsed("DB_IDLE_TIMEOUT_SECS", 600)?,
            max_lifetime_secs: parsed("DB_MAX_LIFETIME_SECS", 1800)?,
        })
    }
}

impl AuthConfig {
    const DEFAULT_ISSUERS: &'static str = "https://accounts.google.com,accounts.google.com";
    const DEFAULT_JWKS_URL: &'static str = "https://www.googleapis.com/oauth2/v3/certs";

    pub fn from_env() -> Result<Self, String> {
        let issuers = parse_list(&env_or("GOOGLE_ISSUERS", Self::DEFAULT_ISSUERS));
        if issuers.is_empty() {
            return Err("GOOGLE_ISSUERS must contain at least one issuer".to_string());
        }

        let admin_emails = parse_list(&env_or("ADMIN_EMAILS", ""))
            .into_iter()
            .map(|e| e.to_lowercase())
            .collect();

        Ok(Self {
            google_client_id: required("GOOGLE_CLIENT_ID")?,
            issuers,
            jwks_url: env_or("GOOGLE_JWKS_URL", Self::DEFAULT_JWKS_URL),
            jwks_cache_ttl: Duration::from_secs(parsed("JWKS_CACHE_TTL", 3600)?),
            jwt_leeway: Duration::from_secs(parsed("JWT_LEEWAY", 60)?),
            admin_emails,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Basic auth is enabled only when both parts are non-empty
        Ok(Self {
            username: env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty()),
            password: env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty()),
            title: env_or("SWAGGER_TITLE", "Geolayers API"),
            version: env_or("SWAGGER_VERSION", "0.1.0"),
            description: env_or(
                "SWAGGER_DESCRIPTION",
                "API documentation for the geodata layers backend",
            ),
        })
    }

    /// `user:password` when basic auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            endpoint: env_or("MINIO_ENDPOINT", "http://localhost:9000"),
            access_key: env_or("MINIO_ACCESS_KEY", "minioadmin"),
            secret_key: env_or("MINIO_SECRET_KEY", "minioadmin"),
            bucket: env_or("MINIO_BUCKET", "geolayers-uploads"),
            region: env_or("MINIO_REGION", "us-east-1"),
            upload_prefix: env_or("MINIO_UPLOAD_PREFIX", "uploads")
                .trim_matches('/')
                .to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_trims_and_skips_empty() {
        assert_eq!(
            parse_list(" a@x.com, ,b@y.org,"),
            vec!["a@x.com".to_string(), "b@y.org".to_string()]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_parsed_falls_back_and_rejects_garbage() {
        assert_eq!(parsed::<u32>("GEOLAYERS_TEST_UNSET_NUMBER", 7), Ok(7));

        env::set_var("GEOLAYERS_TEST_BAD_NUMBER", "ten");
        assert_eq!(
            parsed::<u64>("GEOLAYERS_TEST_BAD_NUMBER", 1),
            Err("GEOLAYERS_TEST_BAD_NUMBER must be a valid number".to_string())
        );
        env::remove_var("GEOLAYERS_TEST_BAD_NUMBER");
    }

    #[test]
    fn test_swagger_credentials_require_both_parts() {
        let mut swagger = SwaggerConfig {
            username: Some("admin".to_string()),
            password: None,
            title: String::new(),
            version: String::new(),
            description: String::new(),
        };
        assert_eq!(swagger.credentials(), None);

        swagger.password = Some("secret".to_string());
        assert_eq!(swagger.credentials(), Some("admin:secret".to_string()));
    }
}
