use axum::Json;
use axum::extract::{Query, State};
use axum::response::Redirect;
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::{cookie, oauth};
use crate::error::AppError;
use crate::state::SharedState;

/// Redirect the operator to the Google consent screen.
pub async fn start(State(state): State<SharedState>) -> Result<Redirect, AppError> {
    let cfg = state
        .config
        .oauth
        .as_ref()
        .map_err(|msg| AppError::Configuration(msg.clone()))?;

    let url = oauth::consent_url(cfg, &state.config.endpoints.oauth_auth_url);
    Ok(Redirect::to(&url))
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
}

/// Exchange the authorization code and persist the credential as the
/// deployment-wide cookie, then return to the form.
pub async fn callback(
    State(state): State<SharedState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<(CookieJar, Redirect), AppError> {
    if let Some(error) = query.error {
        return Err(AppError::InvalidInput(format!(
            "Authorization was not granted: {error}"
        )));
    }

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::InvalidInput("No authorization code provided".to_string()))?;

    let cfg = state
        .config
        .oauth
        .as_ref()
        .map_err(|msg| AppError::Configuration(msg.clone()))?;

    let credential = oauth::exchange_code(
        &state.http,
        cfg,
        &state.config.endpoints.token_url,
        &code,
    )
    .await?;

    let secure = state.config.base_url.starts_with("https://");
    let jar = cookie::store_credential(jar, &credential, &state.config.credential_key, secure)
        .map_err(AppError::Internal)?;

    tracing::info!("Google credential stored");
    Ok((jar, Redirect::to("/")))
}

/// Whether a usable credential is currently stored. Never errors.
pub async fn status(State(state): State<SharedState>, jar: CookieJar) -> Json<Value> {
    let authenticated = cookie::read_credential(&jar, &state.config.credential_key)
        .map(|c| c.is_usable())
        .unwrap_or(false);

    Json(json!({ "authenticated": authenticated }))
}
