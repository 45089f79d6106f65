//! Signup and login handlers.
//!
//! Bodies arrive validated; credential handling is delegated to the
//! identity service. Provider failures surface as vague 401s so the error
//! surface does not reveal which part of the credentials was wrong.

use palisade_core::{envelope, Envelope, HttpError};
use serde_json::json;
use uuid::Uuid;

use super::{section_str, HandlerInput};
use crate::accounts::NewAccount;
use crate::state::AppState;

/// `POST /api/auth/signup`.
pub async fn signup(state: &AppState, input: HandlerInput) -> Result<Envelope, anyhow::Error> {
    let body = input.validated.body.as_ref();
    let email = section_str(body, "email")?;
    let password = section_str(body, "password")?;
    let full_name = section_str(body, "fullName")?;

    let subject_id = state.identity().register(&email, &password).await?;
    let id = Uuid::parse_str(&subject_id).map_err(|_| HttpError::internal())?;

    let account = state
        .store()
        .create(NewAccount {
            id,
            email,
            full_name,
        })
        .await
        .map_err(|e| e.to_http_error())?;

    Ok(envelope::success(
        200,
        json!({ "accountId": account.id }),
        "Signup successful",
    ))
}

/// `POST /api/auth/login`.
pub async fn login(state: &AppState, input: HandlerInput) -> Result<Envelope, anyhow::Error> {
    let body = input.validated.body.as_ref();
    let email = section_str(body, "email")?;
    let password = section_str(body, "password")?;

    let session = state.identity().sign_in(&email, &password).await?;

    // The account record is optional context; a missing row does not block
    // sign-in for a subject the identity service accepts.
    let user = match Uuid::parse_str(&session.subject_id) {
        Ok(id) => state.store().get(id).await.ok(),
        Err(_) => None,
    };

    Ok(envelope::success(
        200,
        json!({
            "user": user,
            "accessToken": session.access_token,
        }),
        "Sign in successful",
    ))
}
