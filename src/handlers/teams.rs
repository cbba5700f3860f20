use actix_web::{HttpResponse, Result, web, web::Path};
use uuid::Uuid;

use crate::AppState;
use crate::database::models::{CreateTeamInput, JoinTeamInput};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::Claims;

pub async fn create_team(
    state: web::Data<AppState>,
    claims: Claims,
    input: web::Json<CreateTeamInput>,
) -> Result<HttpResponse> {
    let user = state.identity.require_user(&claims).await?;

    let team = state.teams.create_team(user.id, &input.team_name).await?;

    Ok(ApiResponse::success_with_message(
        team,
        "Team created successfully",
    ))
}

pub async fn my_team(state: web::Data<AppState>, claims: Claims) -> Result<HttpResponse> {
    let user = state.identity.require_user(&claims).await?;

    let team = state.teams.get_user_team(user.id).await?;

    Ok(ApiResponse::success(team))
}

pub async fn request_join(
    state: web::Data<AppState>,
    claims: Claims,
    input: web::Json<JoinTeamInput>,
) -> Result<HttpResponse> {
    let user = state.identity.require_user(&claims).await?;

    let (request, team) = state.teams.request_join(user.id, &input.slug).await?;

    Ok(ApiResponse::success_with_message(
        request,
        &format!("Request sent to join team: {}", team.name),
    ))
}

pub async fn my_join_requests(state: web::Data<AppState>, claims: Claims) -> Result<HttpResponse> {
    let user = state.identity.require_user(&claims).await?;

    let requests = state.teams.list_user_join_requests(user.id).await?;

    Ok(ApiResponse::success(requests))
}

pub async fn accept_join_request(
    state: web::Data<AppState>,
    claims: Claims,
    path: Path<Uuid>,
) -> Result<HttpResponse> {
    let user = state.identity.require_user(&claims).await?;

    state
        .teams
        .accept_join_request(user.id, path.into_inner())
        .await?;

    Ok(ApiResponse::success_message("Member added to team"))
}

pub async fn reject_join_request(
    state: web::Data<AppState>,
    claims: Claims,
    path: Path<Uuid>,
) -> Result<HttpResponse> {
    let user = state.identity.require_user(&claims).await?;

    state
        .teams
        .reject_join_request(user.id, path.into_inner())
        .await?;

    Ok(ApiResponse::success_message("Request rejected"))
}

pub async fn remove_member(
    state: web::Data<AppState>,
    claims: Claims,
    path: Path<Uuid>,
) -> Result<HttpResponse> {
    let user = state.identity.require_user(&claims).await?;

    state.teams.remove_member(user.id, path.into_inner()).await?;

    Ok(ApiResponse::success_message("Member removed from team"))
}

pub async fn leave_team(state: web::Data<AppState>, claims: Claims) -> Result<HttpResponse> {
    let user = state.identity.require_user(&claims).await?;

    state.teams.leave_team(user.id).await?;

    Ok(ApiResponse::success_message("You have left the team"))
}

pub async fn delete_team(
    state: web::Data<AppState>,
    claims: Claims,
    path: Path<Uuid>,
) -> Result<HttpResponse> {
    let user = state.identity.require_user(&claims).await?;

    state.teams.delete_team(user.id, path.into_inner()).await?;

    Ok(ApiResponse::success_message("Team deleted successfully"))
}

/// Public team preview by join code.
pub async fn get_team_by_slug(
    state: web::Data<AppState>,
    path: Path<String>,
) -> Result<HttpResponse> {
    let preview = state
        .teams
        .get_team_by_slug(&path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

    Ok(ApiResponse::success(preview))
}
