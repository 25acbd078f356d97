/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Staff role - can list every upload, inspect and drop backing tables
pub const ROLE_STAFF: &str = "staff";

/// Provider key stored on linked social accounts
pub const SOCIAL_PROVIDER_GOOGLE: &str = "google";

// =============================================================================
// UPLOADS
// =============================================================================

/// Extensions accepted by the upload endpoint (compared case-insensitively)
pub const ALLOWED_EXTENSIONS: &[&str] = &["geojson", "kml", "shp", "csv", "gml"];

/// Only these are parsed into a backing table
pub const TABULAR_EXTENSION: &str = "csv";

/// Tables with these prefixes belong to the application schema or shadow a
/// system catalog, and are never listed, previewed or dropped through the
/// table endpoints
pub const INTERNAL_TABLE_PREFIXES: &[&str] = &["core_", "_sqlx", "pg_"];

/// Rows returned by a table preview
pub const PREVIEW_ROW_LIMIT: i64 = 1000;

/// Cookie carrying the CSRF token for browser clients
pub const CSRF_COOKIE_NAME: &str = "csrftoken";
