use actix_web::{HttpResponse, Result, web};

use crate::AppState;
use crate::database::models::HackawayRegisterInput;
use crate::handlers::shared::ApiResponse;
use crate::services::Claims;

pub async fn problem_statements(state: web::Data<AppState>) -> Result<HttpResponse> {
    let settings = state.registrations.problem_statement_settings().await?;

    Ok(ApiResponse::success(settings))
}

/// Occupancy per problem statement, for the selection grid.
pub async fn stats(state: web::Data<AppState>) -> Result<HttpResponse> {
    let stats = state.registrations.hackaway_stats().await?;

    Ok(ApiResponse::success(stats))
}

pub async fn registration_status(
    state: web::Data<AppState>,
    claims: Claims,
) -> Result<HttpResponse> {
    let user = state.identity.require_user(&claims).await?;

    let status = state.registrations.check_registration(user.id).await?;

    Ok(ApiResponse::success(status))
}

pub async fn register(
    state: web::Data<AppState>,
    claims: Claims,
    input: web::Json<HackawayRegisterInput>,
) -> Result<HttpResponse> {
    let user = state.identity.require_user(&claims).await?;

    let outcome = state
        .registrations
        .register_for_hackaway(user.id, input.problem_statement_no)
        .await?;

    let message = if outcome.already_registered {
        "Your team is already registered for HackAway."
    } else {
        "Successfully registered for HackAway!"
    };

    Ok(ApiResponse::success_with_message(outcome, message))
}
