//! Account CRUD handlers.
//!
//! All of these sit behind the auth stage; `input.auth` carries the
//! verified subject. Expected misses (no such account) return typed
//! errors rather than faulting, so they log at warn and never alert.

use palisade_core::{envelope, Envelope, HttpError};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::{account_id, section_str_opt, HandlerInput};
use crate::accounts::AccountUpdate;
use crate::state::AppState;

/// `GET /api/me` — the authenticated caller's own account.
pub async fn me(state: &AppState, input: HandlerInput) -> Result<Envelope, anyhow::Error> {
    let auth = input
        .auth
        .as_ref()
        .ok_or_else(|| HttpError::unauthorized("User not authenticated"))?;

    let id = Uuid::parse_str(&auth.subject_id)
        .map_err(|_| HttpError::unauthorized("User not authenticated"))?;

    let account = state
        .store()
        .get(id)
        .await
        .map_err(|e| e.to_http_error())?;

    info!(account_id = %auth.subject_id, "retrieved current account");
    Ok(envelope::success_default(200, serde_json::to_value(account)?))
}

/// `GET /api/users` — paginated listing.
pub async fn list_users(state: &AppState, input: HandlerInput) -> Result<Envelope, anyhow::Error> {
    let query = input.validated.query.as_ref();
    let page = query_usize(query, "page").unwrap_or(1).max(1);
    let limit = query_usize(query, "limit").unwrap_or(50).clamp(1, 100);

    let accounts = state.store().list().await;
    let total = accounts.len();
    let users: Vec<_> = accounts
        .into_iter()
        .skip((page - 1) * limit)
        .take(limit)
        .collect();

    Ok(envelope::success_default(
        200,
        json!({
            "users": users,
            "page": page,
            "limit": limit,
            "total": total,
        }),
    ))
}

/// `GET /api/users/{id}`.
pub async fn get_user(state: &AppState, input: HandlerInput) -> Result<Envelope, anyhow::Error> {
    let id = account_id(&input)?;
    let account = state
        .store()
        .get(id)
        .await
        .map_err(|e| e.to_http_error())?;
    Ok(envelope::success_default(200, json!({ "user": account })))
}

/// `PATCH /api/users/{id}`.
pub async fn update_user(state: &AppState, input: HandlerInput) -> Result<Envelope, anyhow::Error> {
    let id = account_id(&input)?;
    let body = input.validated.body.as_ref();

    let update = AccountUpdate {
        email: section_str_opt(body, "email"),
        full_name: section_str_opt(body, "fullName"),
    };

    let account = state
        .store()
        .update(id, update)
        .await
        .map_err(|e| e.to_http_error())?;

    Ok(envelope::success(
        200,
        json!({ "user": account }),
        "Account updated",
    ))
}

/// `DELETE /api/users/{id}`.
pub async fn delete_user(state: &AppState, input: HandlerInput) -> Result<Envelope, anyhow::Error> {
    let id = account_id(&input)?;
    let deleted = state
        .store()
        .delete(id)
        .await
        .map_err(|e| e.to_http_error())?;

    Ok(envelope::success(
        200,
        json!({ "id": deleted }),
        "Account deleted",
    ))
}

fn query_usize(query: Option<&Value>, field: &str) -> Option<usize> {
    query
        .and_then(|v| v.get(field))
        .and_then(Value::as_i64)
        .and_then(|n| usize::try_from(n).ok())
}
