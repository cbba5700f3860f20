use actix_web::{HttpResponse, Result, web, web::Path};
use uuid::Uuid;

use crate::AppState;
use crate::database::models::{
    EventInput, UpdateProblemStatementInput, UpdateRoleInput, UpdateScoreInput,
};
use crate::database::repositories::{ContactRepository, EventRepository, TeamRepository, UserRepository};
use crate::error::{AppError, is_unique_violation};
use crate::handlers::shared::ApiResponse;
use crate::services::Claims;

pub async fn dashboard_stats(state: web::Data<AppState>, claims: Claims) -> Result<HttpResponse> {
    state.identity.require_staff(&claims).await?;

    let stats = state.stats.dashboard_stats().await?;

    Ok(ApiResponse::success(stats))
}

pub async fn analytics(state: web::Data<AppState>, claims: Claims) -> Result<HttpResponse> {
    state.identity.require_staff(&claims).await?;

    let data = state.stats.analytics().await?;

    Ok(ApiResponse::success(data))
}

pub async fn get_users(
    state: web::Data<AppState>,
    users: web::Data<UserRepository>,
    claims: Claims,
) -> Result<HttpResponse> {
    state.identity.require_staff(&claims).await?;

    let all_users = users.list_all().await.map_err(AppError::from)?;

    Ok(ApiResponse::success(all_users))
}

pub async fn update_user_role(
    state: web::Data<AppState>,
    users: web::Data<UserRepository>,
    claims: Claims,
    path: Path<Uuid>,
    input: web::Json<UpdateRoleInput>,
) -> Result<HttpResponse> {
    let admin = state.identity.require_admin(&claims).await?;

    let user_id = path.into_inner();
    let updated = users
        .update_role(user_id, input.role)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    log::info!(
        "Admin {} set role of user {} to {}",
        admin.id,
        user_id,
        updated.role
    );

    Ok(ApiResponse::success(updated))
}

pub async fn get_teams(
    state: web::Data<AppState>,
    teams: web::Data<TeamRepository>,
    claims: Claims,
) -> Result<HttpResponse> {
    state.identity.require_staff(&claims).await?;

    let all_teams = teams.list_all_with_members().await.map_err(AppError::from)?;

    Ok(ApiResponse::success(all_teams))
}

pub async fn update_team_score(
    state: web::Data<AppState>,
    teams: web::Data<TeamRepository>,
    claims: Claims,
    path: Path<Uuid>,
    input: web::Json<UpdateScoreInput>,
) -> Result<HttpResponse> {
    state.identity.require_admin(&claims).await?;

    let team = teams
        .update_score(path.into_inner(), input.score)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

    Ok(ApiResponse::success(team))
}

pub async fn create_event(
    state: web::Data<AppState>,
    events: web::Data<EventRepository>,
    claims: Claims,
    input: web::Json<EventInput>,
) -> Result<HttpResponse> {
    state.identity.require_admin(&claims).await?;

    let input = input.into_inner();
    validate_event_input(&input)?;

    let event = events.create(&input).await.map_err(|e| {
        if is_unique_violation(&e) {
            AppError::InvalidInput("An event with this slug already exists".to_string())
        } else {
            AppError::from(e)
        }
    })?;

    Ok(ApiResponse::success_with_message(
        event,
        "Event created successfully",
    ))
}

pub async fn update_event(
    state: web::Data<AppState>,
    events: web::Data<EventRepository>,
    claims: Claims,
    path: Path<Uuid>,
    input: web::Json<EventInput>,
) -> Result<HttpResponse> {
    state.identity.require_admin(&claims).await?;

    let input = input.into_inner();
    validate_event_input(&input)?;

    let event = events
        .update(path.into_inner(), &input)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::InvalidInput("An event with this slug already exists".to_string())
            } else {
                AppError::from(e)
            }
        })?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    Ok(ApiResponse::success(event))
}

pub async fn delete_event(
    state: web::Data<AppState>,
    events: web::Data<EventRepository>,
    claims: Claims,
    path: Path<Uuid>,
) -> Result<HttpResponse> {
    state.identity.require_admin(&claims).await?;

    if !events.delete(path.into_inner()).await.map_err(AppError::from)? {
        return Err(AppError::NotFound("Event not found".to_string()).into());
    }

    Ok(ApiResponse::success_message("Event deleted successfully"))
}

pub async fn get_events(
    state: web::Data<AppState>,
    events: web::Data<EventRepository>,
    claims: Claims,
) -> Result<HttpResponse> {
    state.identity.require_staff(&claims).await?;

    let all_events = events.list_all().await.map_err(AppError::from)?;

    Ok(ApiResponse::success(all_events))
}

pub async fn get_registrations(
    state: web::Data<AppState>,
    events: web::Data<EventRepository>,
    claims: Claims,
) -> Result<HttpResponse> {
    state.identity.require_staff(&claims).await?;

    let registrations = events.list_registrations().await.map_err(AppError::from)?;

    Ok(ApiResponse::success(registrations))
}

pub async fn get_hackaway_registrations(
    state: web::Data<AppState>,
    claims: Claims,
) -> Result<HttpResponse> {
    state.identity.require_staff(&claims).await?;

    let registrations = state.registrations.list_hackaway_registrations().await?;

    Ok(ApiResponse::success(registrations))
}

/// Adjust a problem statement's capacity or availability. Never evicts
/// teams already registered, even when the new max is below the count.
pub async fn update_problem_statement(
    state: web::Data<AppState>,
    claims: Claims,
    path: Path<i32>,
    input: web::Json<UpdateProblemStatementInput>,
) -> Result<HttpResponse> {
    state.identity.require_admin(&claims).await?;

    let setting = state
        .registrations
        .update_problem_statement(path.into_inner(), &input.into_inner())
        .await?;

    Ok(ApiResponse::success(setting))
}

pub async fn get_messages(
    state: web::Data<AppState>,
    contact: web::Data<ContactRepository>,
    claims: Claims,
) -> Result<HttpResponse> {
    state.identity.require_staff(&claims).await?;

    let messages = contact.list_all().await.map_err(AppError::from)?;

    Ok(ApiResponse::success(messages))
}

fn validate_event_input(input: &EventInput) -> Result<(), AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::InvalidInput("Event name is required".to_string()));
    }
    if input.slug.trim().is_empty() {
        return Err(AppError::InvalidInput("Event slug is required".to_string()));
    }
    if input.end_time <= input.start_time {
        return Err(AppError::InvalidInput(
            "Event end time must be after its start time".to_string(),
        ));
    }
    Ok(())
}
