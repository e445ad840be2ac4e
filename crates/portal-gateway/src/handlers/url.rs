use ::url::Url;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use portal_core::ShortCode;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::model::{CreateUrlRequest, CreateUrlResponse};
use crate::state::AppState;

pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateUrlRequest>,
) -> Result<Json<CreateUrlResponse>> {
    let long_url = validate_long_url(&request.long_url)?;

    let code = state.shortener().shorten(long_url).await?;
    let short_url = code.to_url(state.base_url());
    info!(code = %code, long_url, "created short url");

    Ok(Json(CreateUrlResponse { short_url }))
}

pub async fn redirect_handler(
    Path(short_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let code = ShortCode::new(short_id.as_str())
        .map_err(|_| AppError::NotFound(format!("short url not found: {short_id}")))?;

    match state.shortener().resolve(&code).await? {
        Some(long_url) => {
            debug!(code = %code, long_url = %long_url, "redirecting");
            Ok((StatusCode::FOUND, [(header::LOCATION, long_url)]).into_response())
        }
        None => Err(AppError::NotFound(format!("short url not found: {code}"))),
    }
}

/// Accepts absolute `http`/`https` URLs with a host.
fn validate_long_url(raw: &str) -> Result<&str> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed)
        .map_err(|e| AppError::InvalidUrl(format!("invalid url '{trimmed}': {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::InvalidUrl(format!(
            "url scheme must be http or https: {}",
            parsed.scheme()
        )));
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(AppError::InvalidUrl(format!("url has no host: {trimmed}")));
    }

    Ok(trimmed)
}
