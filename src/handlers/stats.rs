use actix_web::{HttpResponse, Result, web};

use crate::AppState;
use crate::handlers::shared::ApiResponse;

/// Public leaderboard: teams ranked by score.
pub async fn leaderboard(state: web::Data<AppState>) -> Result<HttpResponse> {
    let entries = state.stats.leaderboard().await?;

    Ok(ApiResponse::success(entries))
}
