//! Route handlers.
//!
//! Handlers run only after every stage in their route's chain continued:
//! a protected handler can rely on `input.auth`, a schemed handler on the
//! normalized sections in `input.validated`. Each returns an [`Envelope`]
//! or a fault for the pipeline's terminal boundary to normalize.

pub mod accounts;
pub mod auth;
pub mod meta;

use palisade_core::{AuthContext, Envelope, HttpError};
use palisade_middleware::{RequestContext, ValidatedSections};
use serde_json::Value;
use uuid::Uuid;

use crate::router::Operation;
use crate::state::AppState;

/// Snapshot of the request context a handler consumes.
///
/// Taken synchronously before the handler future runs, so handlers own
/// their inputs.
#[derive(Debug, Clone)]
pub struct HandlerInput {
    /// Request id for log correlation.
    pub request_id: Uuid,
    /// Authenticated caller, present on protected routes.
    pub auth: Option<AuthContext>,
    /// Normalized sections from the validation stage.
    pub validated: ValidatedSections,
}

impl HandlerInput {
    /// Snapshots the pipeline context.
    #[must_use]
    pub fn from_context(ctx: &RequestContext) -> Self {
        Self {
            request_id: ctx.request_id(),
            auth: ctx.auth().cloned(),
            validated: ctx.validated().clone(),
        }
    }
}

/// Invokes the handler for `operation`.
pub async fn dispatch(
    state: &AppState,
    operation: Operation,
    input: HandlerInput,
) -> Result<Envelope, anyhow::Error> {
    match operation {
        Operation::Welcome => meta::welcome(state).await,
        Operation::Health => meta::health(state).await,
        Operation::Signup => auth::signup(state, input).await,
        Operation::Login => auth::login(state, input).await,
        Operation::Me => accounts::me(state, input).await,
        Operation::ListUsers => accounts::list_users(state, input).await,
        Operation::GetUser => accounts::get_user(state, input).await,
        Operation::UpdateUser => accounts::update_user(state, input).await,
        Operation::DeleteUser => accounts::delete_user(state, input).await,
    }
}

/// Extracts a required string field from a validated section.
fn section_str(section: Option<&Value>, field: &str) -> Result<String, HttpError> {
    section
        .and_then(|v| v.get(field))
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| HttpError::missing_parameter(field))
}

/// Extracts an optional string field from a validated section.
fn section_str_opt(section: Option<&Value>, field: &str) -> Option<String> {
    section
        .and_then(|v| v.get(field))
        .and_then(Value::as_str)
        .map(String::from)
}

/// Parses the validated `{id}` path parameter.
fn account_id(input: &HandlerInput) -> Result<Uuid, HttpError> {
    let raw = section_str(input.validated.params.as_ref(), "id")?;
    Uuid::parse_str(&raw).map_err(|_| HttpError::bad_request("Invalid user ID format"))
}
