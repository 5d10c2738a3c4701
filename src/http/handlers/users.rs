//! Users endpoints.
//!
//! Handlers only decode parameters, call [`UserService`](crate::users::UserService)
//! and let [`ApiError`] translate failures.

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;

use crate::http::error::ApiError;
use crate::http::routes::AppState;
use crate::observability::context::CorrelationContext;
use crate::users::{ServiceError, User, UserPage, UserService};

/// Query string pairs in arrival order. Repeated keys are allowed; the
/// first occurrence wins.
type QueryPairs = Vec<(String, String)>;

pub async fn get_user(
    State(state): State<AppState>,
    ctx: CorrelationContext,
    raw_id: Result<Path<String>, PathRejection>,
) -> Result<Json<User>, ApiError> {
    let Path(raw_id) = raw_id.map_err(|_| ApiError::bad_request("invalid user ID format"))?;
    let id = UserService::parse_id(&raw_id)?;
    let user = state.users.get_by_id(&ctx, id).await?;
    Ok(Json(user))
}

pub async fn list_users(
    State(state): State<AppState>,
    ctx: CorrelationContext,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<Json<UserPage>, ApiError> {
    let Query(pairs) = query.map_err(|_| ApiError::bad_request("invalid query string"))?;

    let limit = parse_integer(first_value(&pairs, "limit"), "invalid limit parameter")?;
    let offset = parse_integer(first_value(&pairs, "offset"), "invalid offset parameter")?;

    let page = state.users.list(&ctx, limit, offset).await?;
    Ok(Json(page))
}

fn first_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Empty or missing values are "not given"; anything else must be an integer.
/// Range checks are left to the service's clamping.
fn parse_integer(raw: Option<&str>, message: &'static str) -> Result<Option<i64>, ServiceError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ServiceError::invalid(message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_integer_accepts_signed_values() {
        assert_eq!(parse_integer(None, "x").unwrap(), None);
        assert_eq!(parse_integer(Some(""), "x").unwrap(), None);
        assert_eq!(parse_integer(Some("500"), "x").unwrap(), Some(500));
        assert_eq!(parse_integer(Some("-5"), "x").unwrap(), Some(-5));
    }

    #[test]
    fn first_occurrence_wins() {
        let pairs: QueryPairs = vec![
            ("limit".into(), "1".into()),
            ("offset".into(), "3".into()),
            ("limit".into(), "2".into()),
        ];
        assert_eq!(first_value(&pairs, "limit"), Some("1"));
        assert_eq!(first_value(&pairs, "offset"), Some("3"));
        assert_eq!(first_value(&pairs, "other"), None);
    }

    #[test]
    fn parse_integer_rejects_garbage() {
        for raw in ["ten", "1.5", "0x10", "99999999999999999999"] {
            assert!(matches!(
                parse_integer(Some(raw), "invalid limit parameter"),
                Err(ServiceError::Invalid(msg)) if msg == "invalid limit parameter"
            ));
        }
    }
}
