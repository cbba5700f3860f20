use actix_web::{HttpResponse, Result, web, web::Path};

use crate::AppState;
use crate::database::repositories::EventRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::Claims;

pub async fn list_events(events: web::Data<EventRepository>) -> Result<HttpResponse> {
    let events = events.list_active().await.map_err(AppError::from)?;

    Ok(ApiResponse::success(events))
}

pub async fn register_for_event(
    state: web::Data<AppState>,
    claims: Claims,
    path: Path<String>,
) -> Result<HttpResponse> {
    let user = state.identity.require_user(&claims).await?;

    let outcome = state
        .registrations
        .register_for_event(user.id, &path.into_inner())
        .await?;

    let message = if outcome.already_registered {
        "Your team is already registered for this event."
    } else {
        "Successfully registered!"
    };

    Ok(ApiResponse::success_with_message(outcome, message))
}

/// Slugs of events the caller's team is registered for.
pub async fn my_registrations(state: web::Data<AppState>, claims: Claims) -> Result<HttpResponse> {
    let user = state.identity.require_user(&claims).await?;

    let slugs = state.registrations.user_event_registrations(user.id).await?;

    Ok(ApiResponse::success(slugs))
}
