use actix_web::{HttpResponse, Result, web};

use crate::AppState;
use crate::database::models::UpdateProfileInput;
use crate::database::repositories::UserRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::Claims;

/// Exchange a verified identity assertion for a user row. First call
/// creates the user; later calls refresh name and avatar.
pub async fn session(state: web::Data<AppState>, claims: Claims) -> Result<HttpResponse> {
    let user = state.identity.ensure_user(&claims).await?;

    Ok(ApiResponse::success(user))
}

pub async fn me(state: web::Data<AppState>, claims: Claims) -> Result<HttpResponse> {
    let user = state.identity.require_user(&claims).await?;

    Ok(ApiResponse::success(user))
}

pub async fn update_profile(
    state: web::Data<AppState>,
    users: web::Data<UserRepository>,
    claims: Claims,
    input: web::Json<UpdateProfileInput>,
) -> Result<HttpResponse> {
    let user = state.identity.require_user(&claims).await?;

    let updated = users
        .update_profile(user.id, &input.into_inner())
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::Unauthenticated)?;

    Ok(ApiResponse::success_with_message(
        updated,
        "Profile updated successfully",
    ))
}
