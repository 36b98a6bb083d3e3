//! Route handlers.
//!
//! Handlers log through `state.logger` and return `AppError` for every
//! failure; the lifecycle middleware does the rest.

use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, RawQuery, State},
    http::{header, StatusCode, Uri},
    response::IntoResponse,
    Extension, Json,
};
use serde_json::{json, Map, Value};

use crate::http::request::{query_args, CorrelationContext};
use crate::http::response::AppError;
use crate::http::server::AppState;
use crate::observability::logging::utc_timestamp;
use crate::resources::NewOrder;

type JsonResult = Result<Json<Value>, AppError>;

const REQUIRED_ORDER_FIELDS: [&str; 3] = ["user_id", "product", "amount"];

pub async fn home(
    State(state): State<AppState>,
    Extension(ctx): Extension<CorrelationContext>,
) -> Json<Value> {
    state.logger.info("Home endpoint accessed", Value::Null);
    let identity = state.logger.identity();
    Json(json!({
        "message": "Hello from Enhanced DevOps Workshop App!",
        "service": identity.name,
        "version": identity.version,
        "correlation_id": ctx.id(),
        "features": ["structured_logging", "metrics", "tracing"],
    }))
}

pub async fn health(
    State(state): State<AppState>,
    Extension(ctx): Extension<CorrelationContext>,
) -> JsonResult {
    if state.faults.health_degraded() {
        return Err(AppError::degraded("Health check showing degraded status"));
    }
    Ok(Json(json!({
        "status": "healthy",
        "correlation_id": ctx.id(),
        "timestamp": utc_timestamp(),
    })))
}

pub async fn ready(
    State(state): State<AppState>,
    Extension(ctx): Extension<CorrelationContext>,
) -> Json<Value> {
    state.logger.info("Readiness check performed", Value::Null);
    Json(json!({
        "status": "ready",
        "correlation_id": ctx.id(),
    }))
}

pub async fn get_users(
    State(state): State<AppState>,
    Extension(ctx): Extension<CorrelationContext>,
) -> Json<Value> {
    let users = state.store.users();
    state.logger.info(
        "Users endpoint accessed",
        json!({"extra": {"user_count": users.len()}}),
    );

    if let Some(delay) = state.faults.slow_query_delay() {
        state.logger.warn(
            "Slow database query detected",
            json!({"extra": {"delay_seconds": delay.as_secs_f64()}}),
        );
        tokio::time::sleep(delay).await;
    }

    Json(json!({
        "users": users,
        "count": users.len(),
        "correlation_id": ctx.id(),
    }))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<CorrelationContext>,
    path: Result<Path<String>, PathRejection>,
) -> JsonResult {
    let user_id: i64 = path
        .ok()
        .and_then(|Path(raw_id)| raw_id.parse().ok())
        .ok_or_else(|| AppError::invalid_fields(vec!["user_id".to_string()]))?;
    state.logger.info(
        "Individual user requested",
        json!({"extra": {"user_id": user_id}}),
    );

    let user = state
        .store
        .user(user_id)
        .ok_or_else(|| AppError::not_found("User", user_id))?;

    Ok(Json(json!({
        "user": user,
        "correlation_id": ctx.id(),
    })))
}

pub async fn get_orders(
    State(state): State<AppState>,
    Extension(ctx): Extension<CorrelationContext>,
    RawQuery(query): RawQuery,
) -> Json<Value> {
    // First value wins; a filter that is not an integer is ignored.
    let user_id = query_args(query.as_deref())
        .get("user_id")
        .and_then(Value::as_str)
        .and_then(|v| v.parse::<i64>().ok());
    let orders = state.store.orders(user_id);

    match user_id {
        Some(user_id) => state.logger.info(
            "Orders filtered by user",
            json!({"extra": {"user_id": user_id, "order_count": orders.len()}}),
        ),
        None => state.logger.info(
            "All orders requested",
            json!({"extra": {"order_count": orders.len()}}),
        ),
    }

    Json(json!({
        "count": orders.len(),
        "orders": orders,
        "correlation_id": ctx.id(),
    }))
}

pub async fn create_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<CorrelationContext>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let fields = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(fields)) if !fields.is_empty() => fields,
        _ => return Err(AppError::invalid("Invalid JSON data")),
    };

    let new_order = parse_new_order(&fields)?;
    let order = state.store.create_order(new_order);

    state.logger.info(
        "Order created successfully",
        json!({
            "extra": {
                "order_id": order.id,
                "user_id": order.user_id,
                "product": order.product,
                "amount": order.amount,
            }
        }),
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "order": order,
            "correlation_id": ctx.id(),
        })),
    ))
}

/// Check presence first, then types, so the caller sees every missing field
/// at once.
fn parse_new_order(fields: &Map<String, Value>) -> Result<NewOrder, AppError> {
    let missing: Vec<String> = REQUIRED_ORDER_FIELDS
        .iter()
        .filter(|name| !fields.contains_key(**name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AppError::missing_fields(missing));
    }

    let user_id = fields["user_id"].as_i64();
    let product = fields["product"].as_str().filter(|p| !p.is_empty());
    let amount = fields["amount"].as_f64();

    match (user_id, product, amount) {
        (Some(user_id), Some(product), Some(amount)) => Ok(NewOrder {
            user_id,
            product: product.to_string(),
            amount,
        }),
        _ => {
            let invalid = [
                ("user_id", user_id.is_none()),
                ("product", product.is_none()),
                ("amount", amount.is_none()),
            ]
            .into_iter()
            .filter(|(_, bad)| *bad)
            .map(|(name, _)| name.to_string())
            .collect();
            Err(AppError::invalid_fields(invalid))
        }
    }
}

pub async fn trigger_error(State(state): State<AppState>) -> JsonResult {
    state
        .logger
        .warn("Error endpoint called - triggering test error", Value::Null);
    Err(AppError::unhandled(
        "TestError",
        "This is a test error for demonstration purposes",
    ))
}

pub async fn trigger_timeout(
    State(state): State<AppState>,
    Extension(ctx): Extension<CorrelationContext>,
) -> Json<Value> {
    let delay = state.faults.timeout_delay();
    state.logger.warn(
        "Timeout endpoint called",
        json!({"extra": {"delay_seconds": delay.as_secs_f64()}}),
    );
    tokio::time::sleep(delay).await;

    Json(json!({
        "message": "This response was intentionally slow",
        "delay_seconds": delay.as_secs_f64(),
        "correlation_id": ctx.id(),
    }))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics.scrape(),
    )
}

pub async fn info(
    State(state): State<AppState>,
    Extension(ctx): Extension<CorrelationContext>,
) -> Json<Value> {
    state.logger.info("Info endpoint accessed", Value::Null);
    let identity = state.logger.identity();
    Json(json!({
        "app": identity.name,
        "version": identity.version,
        "environment": identity.environment,
        "features": [
            "structured_logging",
            "prometheus_metrics",
            "correlation_ids",
            "error_handling",
            "health_checks",
        ],
        "endpoints": {
            "health": "/health",
            "ready": "/ready",
            "metrics": "/metrics",
            "users": "/users",
            "orders": "/orders",
            "info": "/info",
            "test_error": "/error",
            "test_timeout": "/timeout",
        },
        "correlation_id": ctx.id(),
        "timestamp": utc_timestamp(),
    }))
}

/// Fallback for paths no route matches.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::not_found("Route", uri.path())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn all_missing_fields_reported() {
        let err = parse_new_order(&object(json!({"product": "Desk"}))).unwrap_err();
        match err {
            AppError::Validation { missing_fields, .. } => {
                assert_eq!(missing_fields, vec!["user_id", "amount"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn wrong_types_reported() {
        let err = parse_new_order(&object(json!({
            "user_id": "one",
            "product": "Desk",
            "amount": "cheap",
        })))
        .unwrap_err();
        match err {
            AppError::Validation { invalid_fields, .. } => {
                assert_eq!(invalid_fields, vec!["user_id", "amount"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn integer_amount_accepted() {
        let order = parse_new_order(&object(json!({
            "user_id": 3,
            "product": "Desk",
            "amount": 150,
        })))
        .unwrap();
        assert_eq!(order.amount, 150.0);
        assert_eq!(order.user_id, 3);
    }
}
