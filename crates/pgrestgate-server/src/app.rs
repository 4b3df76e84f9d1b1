//! Request handling.

use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use pgrestgate_auth::authenticate;
use pgrestgate_core::{create_action_plan, parse_request, ActionPlan, ApiRequest, DbActionPlan};
use pgrestgate_response::headers::ContentRange;
use pgrestgate_response::{format_response, QueryResult, Response as PgrstResponse};
use sqlx::Row;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Main request handler.
pub async fn handle_request(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    debug!("{} {}", method, path);

    match process_request(state, request).await {
        Ok(response) => response.into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// Process a request and return a response.
async fn process_request(
    state: Arc<AppState>,
    request: Request,
) -> Result<Response, pgrestgate_core::Error> {
    // Extract auth header and apikey
    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());
    let apikey = request
        .headers()
        .get(state.config.apikey_header.as_str())
        .or_else(|| request.headers().get("x-api-key"))
        .and_then(|v| v.to_str().ok());

    // Authenticate
    let auth_result = authenticate(apikey, auth_header, &state.jwt_config)
        .map_err(|e| pgrestgate_core::Error::InvalidJwt(e.to_string()))?;

    debug!("Authenticated as role: {}", auth_result.role);

    // Parse request
    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, 10 * 1024 * 1024)
        .await
        .map_err(|e| pgrestgate_core::Error::InvalidBody(e.to_string()))?;

    // Build HTTP request for parsing
    let mut builder = http::Request::builder()
        .method(parts.method.clone())
        .uri(parts.uri.clone());

    for (key, value) in &parts.headers {
        builder = builder.header(key, value);
    }

    let http_request = builder
        .body(body_bytes.clone())
        .map_err(|e| pgrestgate_core::Error::Internal(e.to_string()))?;

    // Parse API request
    let mut api_request = parse_request(
        &http_request,
        state.default_schema(),
        state.schemas(),
    )?;

    // Parse payload
    if !body_bytes.is_empty() {
        let payload = pgrestgate_core::api_request::payload::parse_payload(
            body_bytes,
            &api_request.content_media_type,
        )?;
        api_request.payload = payload;
    }

    // Get schema cache
    let schema_cache = state.schema_cache().await;

    // Create execution plan
    let plan = create_action_plan(&api_request, &schema_cache)?;

    // Execute plan
    let result = execute_plan(&state, &api_request, &plan, &auth_result).await?;

    // Format response
    let response = format_response(&api_request, &result)
        .map_err(|e| pgrestgate_core::Error::Internal(e.to_string()))?;

    Ok(build_response(response))
}

/// Execute an action plan.
async fn execute_plan(
    state: &AppState,
    request: &ApiRequest,
    plan: &ActionPlan,
    auth: &pgrestgate_auth::AuthResult,
) -> Result<QueryResult, pgrestgate_core::Error> {
    match plan {
        ActionPlan::Db(db_plan) => {
            // Build SQL
            let query = pgrestgate_core::query::build_query(
                &ActionPlan::Db(db_plan.clone()),
                Some(&auth.role),
            )?;

            if !query.has_main() {
                return Ok(QueryResult::default());
            }

            let timeout = Duration::from_millis(state.config.server_timeout_ms);
            match tokio::time::timeout(timeout, run_db_plan(state, request, db_plan, auth, &query)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("request exceeded {}ms timeout", state.config.server_timeout_ms);
                    Err(pgrestgate_core::Error::ConnectionPool(
                        "statement timeout".to_string(),
                    ))
                }
            }
        }
        ActionPlan::Info(_info_plan) => {
            // Return metadata
            Ok(QueryResult {
                status: StatusCode::OK,
                rows: vec![],
                ..Default::default()
            })
        }
    }
}

/// Run a database-backed plan against an acquired connection: switch into
/// the authenticated role, publish JWT claims as GUCs, then execute the
/// main statement (plus an optional count and read-back statement).
async fn run_db_plan(
    state: &AppState,
    request: &ApiRequest,
    db_plan: &DbActionPlan,
    auth: &pgrestgate_auth::AuthResult,
    query: &pgrestgate_core::query::MainQuery,
) -> Result<QueryResult, pgrestgate_core::Error> {
    let mut conn = state.pool.acquire().await
        .map_err(|e| pgrestgate_core::Error::ConnectionPool(e.to_string()))?;

    // Switching into the authenticated role can fail (e.g. a role granted
    // by an old JWT that's since been revoked). Rather than hard-abort the
    // request, keep going on the connection's default role but mark the
    // session degraded — a degraded session without a service-role key or
    // an identifiable subject is denied data below instead of silently
    // running under the wrong privileges.
    let mut degraded = false;
    if let Err(e) = sqlx::query(&format!(
        "SET LOCAL ROLE {}",
        pgrestgate_sql::escape_ident(&auth.role)
    ))
    .execute(&mut *conn)
    .await
    {
        warn!("failed to switch to role '{}': {}", auth.role, e);
        degraded = true;
    }

    let is_service_role = auth.role == state.jwt_config.service_role;
    let has_subject = auth.get_claim("sub").is_some();

    if degraded && !is_service_role && !has_subject && !matches!(db_plan, DbActionPlan::Read(_)) {
        return Err(pgrestgate_core::Error::InsufficientPermissions(
            "unable to establish a session role for this request".to_string(),
        ));
    }

    // Set claims as GUC
    for (key, value) in &auth.claims {
        let guc_key = format!("request.jwt.claims.{}", key);
        let guc_value = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        sqlx::query("SELECT set_config($1, $2, true)")
            .bind(&guc_key)
            .bind(&guc_value)
            .execute(&mut *conn)
            .await
            .ok(); // Ignore errors for individual claims
    }

    let deny_all =
        degraded && !is_service_role && !has_subject && matches!(db_plan, DbActionPlan::Read(_));

    let (mut sql, params) = query.clone().build_main();
    if deny_all {
        sql = format!("SELECT * FROM ({}) pgrst_degraded WHERE FALSE", sql);
    }
    debug!("Executing SQL: {}", sql);

    let rows = bind_params(sqlx::query(&sql), &params)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            error!("Query error: {}", e);
            map_sqlx_error(e)
        })?;

    let mut json_rows: Vec<serde_json::Value> = rows.iter().map(row_to_json).collect();

    // Mutation/RPC read-back: if the plan carries a separate read query
    // (e.g. `return=representation` re-selecting embedded resources), use
    // its rows as the representation instead of the bare RETURNING rows.
    if !deny_all {
        if let Some((read_sql, read_params)) = query.build_read() {
            let read_rows = bind_params(sqlx::query(&read_sql), &read_params)
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| {
                    error!("Read-back query error: {}", e);
                    map_sqlx_error(e)
                })?;
            json_rows = read_rows.iter().map(row_to_json).collect();
        }
    }

    let total_count = if !deny_all && request.preferences.count.is_some() {
        if let Some((count_sql, count_params)) = query.build_count() {
            let count_row = bind_params(sqlx::query(&count_sql), &count_params)
                .fetch_one(&mut *conn)
                .await
                .map_err(|e| {
                    error!("Count query error: {}", e);
                    map_sqlx_error(e)
                })?;
            count_row.try_get::<i64, _>(0).ok()
        } else {
            None
        }
    } else if deny_all {
        Some(0)
    } else {
        None
    };

    let offset = request.top_level_range.offset;
    let returned = json_rows.len() as i64;
    let content_range = Some(if returned == 0 {
        ContentRange::new(offset, offset.saturating_sub(1), total_count)
    } else {
        ContentRange::new(offset, offset + returned - 1, total_count)
    });

    Ok(QueryResult {
        status: StatusCode::OK,
        rows: json_rows,
        total_count,
        content_range,
        location: None,
        guc_headers: None,
        guc_status: None,
    })
}

/// Bind a sequence of parameters onto a query in order, matching each
/// [`SqlParam`] variant to the corresponding sqlx bind call.
fn bind_params<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    params: &'q [pgrestgate_sql::SqlParam],
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    use pgrestgate_sql::SqlParam;

    for param in params {
        query = match param {
            SqlParam::Null => query.bind(None::<String>),
            SqlParam::Bool(b) => query.bind(*b),
            SqlParam::Int(i) => query.bind(*i),
            SqlParam::Float(f) => query.bind(*f),
            SqlParam::Text(s) => query.bind(s),
            SqlParam::Bytes(b) => query.bind(b),
            SqlParam::Json(v) => query.bind(v),
            SqlParam::Uuid(u) => query.bind(*u),
            SqlParam::Timestamp(t) => query.bind(*t),
            SqlParam::Array(arr) => {
                let values: Vec<String> = arr.iter().filter_map(param_as_text).collect();
                query.bind(values)
            }
        };
    }
    query
}

/// Render a scalar [`SqlParam`] as text, for binding array elements.
fn param_as_text(param: &pgrestgate_sql::SqlParam) -> Option<String> {
    use pgrestgate_sql::SqlParam;

    match param {
        SqlParam::Null => None,
        SqlParam::Bool(b) => Some(b.to_string()),
        SqlParam::Int(i) => Some(i.to_string()),
        SqlParam::Float(f) => Some(f.to_string()),
        SqlParam::Text(s) => Some(s.clone()),
        SqlParam::Bytes(b) => Some(String::from_utf8_lossy(b).to_string()),
        SqlParam::Json(v) => Some(v.to_string()),
        SqlParam::Uuid(u) => Some(u.to_string()),
        SqlParam::Timestamp(t) => Some(t.to_rfc3339()),
        SqlParam::Array(_) => None,
    }
}

/// Convert a sqlx row to JSON.
fn row_to_json(row: &sqlx::postgres::PgRow) -> serde_json::Value {
    use sqlx::{Column, Row, TypeInfo};

    let mut map = serde_json::Map::new();

    for column in row.columns() {
        let name = column.name();
        let type_name = column.type_info().name();

        let value = match type_name {
            "INT2" | "SMALLINT" => row
                .try_get::<i16, _>(name)
                .ok()
                .map(|v| serde_json::Value::Number(v.into())),
            "INT4" | "INT" | "INTEGER" => row
                .try_get::<i32, _>(name)
                .ok()
                .map(|v| serde_json::Value::Number(v.into())),
            "INT8" | "BIGINT" => row
                .try_get::<i64, _>(name)
                .ok()
                .map(|v| serde_json::Value::Number(v.into())),
            "FLOAT4" | "REAL" => row
                .try_get::<f32, _>(name)
                .ok()
                .and_then(|v| serde_json::Number::from_f64(v as f64))
                .map(serde_json::Value::Number),
            "FLOAT8" | "DOUBLE PRECISION" => row
                .try_get::<f64, _>(name)
                .ok()
                .and_then(|v| serde_json::Number::from_f64(v))
                .map(serde_json::Value::Number),
            "NUMERIC" | "DECIMAL" => row
                .try_get::<sqlx::types::BigDecimal, _>(name)
                .ok()
                .map(|v| serde_json::Value::String(v.to_string())),
            "BOOL" | "BOOLEAN" => row
                .try_get::<bool, _>(name)
                .ok()
                .map(serde_json::Value::Bool),
            "JSON" | "JSONB" => row.try_get::<serde_json::Value, _>(name).ok(),
            "UUID" => row
                .try_get::<sqlx::types::Uuid, _>(name)
                .ok()
                .map(|v| serde_json::Value::String(v.to_string())),
            "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => row
                .try_get::<chrono::DateTime<chrono::Utc>, _>(name)
                .ok()
                .map(|v| serde_json::Value::String(v.to_rfc3339())),
            "TIMESTAMP" | "TIMESTAMP WITHOUT TIME ZONE" => row
                .try_get::<chrono::NaiveDateTime, _>(name)
                .ok()
                .map(|v| serde_json::Value::String(v.to_string())),
            "DATE" => row
                .try_get::<chrono::NaiveDate, _>(name)
                .ok()
                .map(|v| serde_json::Value::String(v.to_string())),
            "TIME" | "TIME WITHOUT TIME ZONE" => row
                .try_get::<chrono::NaiveTime, _>(name)
                .ok()
                .map(|v| serde_json::Value::String(v.to_string())),
            _ => row
                .try_get::<String, _>(name)
                .ok()
                .map(serde_json::Value::String),
        };

        map.insert(name.to_string(), value.unwrap_or(serde_json::Value::Null));
    }

    serde_json::Value::Object(map)
}

/// Map sqlx error to our error type.
fn map_sqlx_error(e: sqlx::Error) -> pgrestgate_core::Error {
    match e {
        sqlx::Error::Database(db_err) => {
            // Try to downcast to Postgres-specific error for additional details
            let (details, hint) = db_err
                .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
                .map(|pg_err| (pg_err.detail().map(String::from), pg_err.hint().map(String::from)))
                .unwrap_or((None, None));

            pgrestgate_core::Error::Database(pgrestgate_core::error::DatabaseError {
                code: db_err.code().map(|c| c.to_string()).unwrap_or_default(),
                message: db_err.message().to_string(),
                details,
                hint,
                constraint: db_err.constraint().map(|s| s.to_string()),
                table: db_err.table().map(|s| s.to_string()),
                column: None,
            })
        }
        other => pgrestgate_core::Error::Internal(other.to_string()),
    }
}

/// Build an HTTP response from our response type.
fn build_response(response: PgrstResponse) -> Response {
    let mut builder = Response::builder().status(response.status);

    for (key, value) in &response.headers {
        builder = builder.header(key, value);
    }

    builder
        .body(Body::from(response.body))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

/// Build an error response.
fn error_response(error: pgrestgate_core::Error) -> Response {
    let status = error.status_code();
    let body = serde_json::to_vec(&error.to_json()).unwrap_or_default();

    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}
