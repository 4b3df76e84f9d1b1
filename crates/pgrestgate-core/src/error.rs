//! Error types for PgRestGate.
//!
//! Provides comprehensive error handling with HTTP status code mapping.

use http::StatusCode;
use thiserror::Error;

/// Result type for PgRestGate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for PgRestGate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Request Parsing Errors (400)
    // ========================================================================
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid query parameter: {0}")]
    InvalidQueryParam(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(&'static str),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Unacceptable schema: {0}")]
    UnacceptableSchema(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid media type: {0}")]
    InvalidMediaType(String),

    /// A required column, filter, or body is missing. Also used for the
    /// "UPDATE/DELETE without a WHERE clause" guard.
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    /// An embed could be resolved to more than one relationship and no
    /// `!hint` was given to disambiguate it.
    #[error("Could not embed because more than one relationship was found: {0}")]
    AmbiguousEmbed(String),

    /// Client asked for a single object (`Accept: vnd.pgrst.object`,
    /// singular PK lookup) but the query produced zero or more than one row.
    #[error("JSON object requested, multiple (or no) rows returned: {0}")]
    SingleObjectMismatch(String),

    // ========================================================================
    // Authentication/Authorization Errors (401/403)
    // ========================================================================
    #[error("Invalid JWT: {0}")]
    InvalidJwt(String),

    #[error("JWT expired")]
    JwtExpired,

    #[error("Missing or invalid API key")]
    MissingAuth,

    #[error("Insufficient permissions: {0}")]
    InsufficientPermissions(String),

    // ========================================================================
    // Resource Errors (404/405)
    // ========================================================================
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Relationship not found: {0}")]
    RelationshipNotFound(String),

    // ========================================================================
    // Schema Cache Errors
    // ========================================================================
    #[error("Schema cache not loaded")]
    SchemaCacheNotLoaded,

    #[error("Schema cache load failed: {0}")]
    SchemaCacheLoadFailed(String),

    // ========================================================================
    // Database Errors (500/4xx depending on native SQLSTATE)
    // ========================================================================
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Connection pool error: {0}")]
    ConnectionPool(String),

    // ========================================================================
    // Internal Errors (500)
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Plan Errors
    // ========================================================================
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),
}

impl Error {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request - malformed request, unknown operator, bad JSON
            Self::InvalidPath(_)
            | Self::InvalidQueryParam(_)
            | Self::InvalidHeader(_)
            | Self::InvalidBody(_)
            | Self::InvalidRange(_)
            | Self::InvalidMediaType(_)
            | Self::UnacceptableSchema(_)
            | Self::UnknownColumn(_)
            | Self::InvalidPlan(_)
            | Self::EmbeddingError(_) => StatusCode::BAD_REQUEST,

            // 422 Unprocessable Entity - well-formed request that cannot be
            // carried out (missing body/WHERE clause)
            Self::MissingParameter(_) => StatusCode::UNPROCESSABLE_ENTITY,

            // 300 Multiple Choices - ambiguous embed, needs a !hint
            Self::AmbiguousEmbed(_) => StatusCode::MULTIPLE_CHOICES,

            // 406 Not Acceptable - single-object mode requested but the
            // result set doesn't contain exactly one row
            Self::SingleObjectMismatch(_) => StatusCode::NOT_ACCEPTABLE,

            // 401 Unauthorized - missing or invalid API key / JWT
            Self::InvalidJwt(_) | Self::JwtExpired | Self::MissingAuth => {
                StatusCode::UNAUTHORIZED
            }

            // 403 Forbidden
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,

            // 404 Not Found
            Self::NotFound(_)
            | Self::TableNotFound(_)
            | Self::FunctionNotFound(_)
            | Self::ColumnNotFound(_)
            | Self::RelationshipNotFound(_) => StatusCode::NOT_FOUND,

            // 405 Method Not Allowed
            Self::UnsupportedMethod(_) => StatusCode::METHOD_NOT_ALLOWED,

            // 500 Internal Server Error
            Self::SchemaCacheNotLoaded
            | Self::SchemaCacheLoadFailed(_)
            | Self::Internal(_)
            | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,

            Self::ConnectionPool(_) => StatusCode::SERVICE_UNAVAILABLE,

            // Database errors map from the native SQLSTATE.
            Self::Database(db_err) => db_err.status_code(),
        }
    }

    /// Get the error code for API responses.
    ///
    /// Database errors surface their native SQLSTATE verbatim; everything
    /// else uses a `PGRSTxxx` code in the same style PostgREST itself uses.
    pub fn code(&self) -> std::borrow::Cow<'static, str> {
        match self {
            Self::InvalidPath(_)
            | Self::InvalidQueryParam(_)
            | Self::InvalidHeader(_)
            | Self::InvalidBody(_)
            | Self::InvalidRange(_)
            | Self::InvalidMediaType(_)
            | Self::UnacceptableSchema(_)
            | Self::UnknownColumn(_) => "PGRST100".into(),

            Self::UnsupportedMethod(_) => "PGRST105".into(),
            Self::MissingParameter(_) => "PGRST102".into(),
            Self::AmbiguousEmbed(_) => "PGRST201".into(),
            Self::SingleObjectMismatch(_) => "PGRST116".into(),

            Self::InvalidJwt(_) | Self::JwtExpired | Self::MissingAuth => "PGRST301".into(),
            Self::InsufficientPermissions(_) => "42501".into(),

            Self::NotFound(_) => "PGRST205".into(),
            Self::TableNotFound(_) => "42P01".into(),
            Self::FunctionNotFound(_) => "42883".into(),
            Self::ColumnNotFound(_) => "42703".into(),
            Self::RelationshipNotFound(_) => "PGRST200".into(),

            Self::SchemaCacheNotLoaded | Self::SchemaCacheLoadFailed(_) => "PGRST000".into(),

            Self::Database(e) => e.code(),
            Self::ConnectionPool(_) => "PGRST000".into(),

            Self::Internal(_) | Self::Config(_) => "PGRST000".into(),

            Self::InvalidPlan(_) | Self::EmbeddingError(_) => "PGRST100".into(),
        }
    }

    /// Convert to JSON error response.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.code(),
            "message": self.to_string(),
            "details": self.details(),
            "hint": self.hint(),
        })
    }

    /// Get additional details for the error.
    fn details(&self) -> Option<String> {
        match self {
            Self::Database(db_err) => db_err.details.clone(),
            _ => None,
        }
    }

    /// Get a hint for resolving the error.
    fn hint(&self) -> Option<String> {
        match self {
            Self::InvalidJwt(_) => Some("Check that the JWT is properly signed and not expired".into()),
            Self::MissingAuth => Some("Provide a valid apikey or Authorization header".into()),
            Self::TableNotFound(_) => Some("Check the table name and schema".into()),
            Self::UnknownColumn(_) => Some("Check column names against the table schema".into()),
            Self::AmbiguousEmbed(_) => {
                Some("Disambiguate the embed with a !hint, e.g. select=*,table!constraint(*)".into())
            }
            Self::Database(db_err) => db_err.hint.clone(),
            _ => None,
        }
    }
}

/// Database-specific error type. Carries the native PostgreSQL error fields
/// (SQLSTATE code, message, detail, hint, constraint/table/column) through
/// to the response formatter unmodified.
#[derive(Error, Debug)]
#[error("Database error [{code}]: {message}")]
pub struct DatabaseError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub hint: Option<String>,
    pub constraint: Option<String>,
    pub table: Option<String>,
    pub column: Option<String>,
}

impl DatabaseError {
    /// Get HTTP status code based on PostgreSQL error code.
    pub fn status_code(&self) -> StatusCode {
        // https://www.postgresql.org/docs/current/errcodes-appendix.html
        match self.code.as_str() {
            "23505" => StatusCode::CONFLICT,    // unique_violation
            "23503" => StatusCode::CONFLICT,    // foreign_key_violation
            "23514" => StatusCode::UNPROCESSABLE_ENTITY, // check_violation
            "42501" => StatusCode::FORBIDDEN,   // insufficient_privilege
            "42P01" => StatusCode::NOT_FOUND,   // undefined_table
            "42703" => StatusCode::NOT_FOUND,   // undefined_column
            "P0001" => StatusCode::BAD_REQUEST, // RAISE EXCEPTION

            // Class 23 - Integrity Constraint Violation
            c if c.starts_with("23") => StatusCode::CONFLICT,
            // Class 42 - Syntax Error or Access Rule Violation
            c if c.starts_with("42") => StatusCode::BAD_REQUEST,
            // Class 28 - Invalid Authorization Specification
            c if c.starts_with("28") => StatusCode::FORBIDDEN,
            // Class 40 - Transaction Rollback
            c if c.starts_with("40") => StatusCode::CONFLICT,
            // Class 53 - Insufficient Resources
            c if c.starts_with("53") => StatusCode::SERVICE_UNAVAILABLE,
            // Class 54 - Program Limit Exceeded
            c if c.starts_with("54") => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for the API response envelope. PostgREST passes
    /// the engine's own SQLSTATE straight through rather than inventing a
    /// synthetic code.
    pub fn code(&self) -> std::borrow::Cow<'static, str> {
        if self.code.is_empty() {
            "PGRST000".into()
        } else {
            self.code.clone().into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            Error::InvalidQueryParam("test".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::MissingAuth.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::TableNotFound("users".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::UnsupportedMethod("TRACE".into()).status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            Error::MissingParameter("id".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            Error::AmbiguousEmbed("orders".into()).status_code(),
            StatusCode::MULTIPLE_CHOICES
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::InvalidQueryParam("test".into()).code(), "PGRST100");
        assert_eq!(Error::MissingAuth.code(), "PGRST301");
        assert_eq!(Error::TableNotFound("users".into()).code(), "42P01");
        assert_eq!(Error::AmbiguousEmbed("orders".into()).code(), "PGRST201");
        assert_eq!(Error::MissingParameter("id".into()).code(), "PGRST102");
    }

    #[test]
    fn test_database_error_status_and_code_preserve_native_sqlstate() {
        let constraint_error = DatabaseError {
            code: "23505".into(), // unique_violation
            message: "Duplicate key".into(),
            details: None,
            hint: None,
            constraint: Some("users_pkey".into()),
            table: Some("users".into()),
            column: None,
        };
        assert_eq!(constraint_error.status_code(), StatusCode::CONFLICT);
        assert_eq!(constraint_error.code(), "23505");

        let permission_error = DatabaseError {
            code: "42501".into(),
            message: "permission denied for table users".into(),
            details: None,
            hint: None,
            constraint: None,
            table: Some("users".into()),
            column: None,
        };
        assert_eq!(permission_error.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(permission_error.code(), "42501");
    }

    #[test]
    fn test_error_to_json() {
        let error = Error::InvalidQueryParam("bad filter".into());
        let json = error.to_json();
        assert_eq!(json["code"], "PGRST100");
        assert!(json["message"].as_str().unwrap().contains("bad filter"));
    }
}
