use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use crate::handlers::shared::ApiResponse;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("You must be logged in")]
    Unauthenticated,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("You are already in a team")]
    AlreadyInTeam,

    #[error("You must join or create a team first")]
    NotInTeam,

    #[error("You already have a pending request to join this team")]
    DuplicateRequest,

    #[error("This team already has the maximum of 4 members")]
    TeamFull,

    #[error("Your team must have at least 2 members to register")]
    TeamTooSmall,

    #[error("Your team has more than 4 members; teams can have at most 4")]
    TeamTooLarge,

    #[error("Maximum participants reached for this problem statement")]
    ProblemStatementFull,

    #[error("This problem statement is not available for registration")]
    ProblemStatementInactive,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("The operation conflicted with a concurrent update, please try again")]
    TransientStoreConflict,

    #[error("Internal server error{}", .0.as_ref().map_or("".to_string(), |s| format!(": {}", s)))]
    InternalServerError(Option<String>),
}

impl AppError {
    /// Stable discriminant surfaced to the UI alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::DatabaseError(_) => "DatabaseError",
            AppError::Unauthenticated => "Unauthenticated",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::NotFound(_) => "NotFound",
            AppError::AlreadyInTeam => "AlreadyInTeam",
            AppError::NotInTeam => "NotInTeam",
            AppError::DuplicateRequest => "DuplicateRequest",
            AppError::TeamFull => "TeamFull",
            AppError::TeamTooSmall => "TeamTooSmall",
            AppError::TeamTooLarge => "TeamTooLarge",
            AppError::ProblemStatementFull => "ProblemStatementFull",
            AppError::ProblemStatementInactive => "ProblemStatementInactive",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::TransientStoreConflict => "TransientStoreConflict",
            AppError::InternalServerError(_) => "InternalServerError",
        }
    }

    pub fn internal_server_error_message(message: impl Into<String>) -> Self {
        AppError::InternalServerError(Some(message.into()))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyInTeam
            | AppError::DuplicateRequest
            | AppError::TeamFull
            | AppError::ProblemStatementFull
            | AppError::TransientStoreConflict => StatusCode::CONFLICT,
            AppError::NotInTeam
            | AppError::TeamTooSmall
            | AppError::TeamTooLarge
            | AppError::ProblemStatementInactive
            | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        if status_code.is_server_error() {
            log::error!(
                "Request failed with status {}: {}",
                status_code,
                error_message
            );
        } else {
            log::debug!(
                "Request rejected with status {}: {}",
                status_code,
                error_message
            );
        }

        let response_body = ApiResponse::<()>::error(self.kind(), &error_message);

        HttpResponse::build(status_code).json(response_body)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        log::error!("Database error: {}", error);
        AppError::DatabaseError(error)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        log::error!("Internal error: {}", error);

        match error.downcast::<sqlx::Error>() {
            Ok(sqlx_err) => AppError::DatabaseError(sqlx_err),
            Err(other) => AppError::InternalServerError(Some(other.to_string())),
        }
    }
}

/// True when the error is a unique-constraint violation on the named
/// constraint or index. The insert-and-catch flows key on this to turn
/// lost races into their domain errors.
pub fn violates_constraint(error: &sqlx::Error, constraint: &str) -> bool {
    match error {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() && db.constraint() == Some(constraint)
        }
        _ => false,
    }
}

pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}
