use actix_web::{HttpResponse, Result, web};

use crate::database::models::ContactInput;
use crate::database::repositories::ContactRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;

pub async fn submit(
    contact: web::Data<ContactRepository>,
    input: web::Json<ContactInput>,
) -> Result<HttpResponse> {
    let input = input.into_inner();

    if input.name.trim().is_empty()
        || input.email.trim().is_empty()
        || input.message.trim().is_empty()
    {
        return Err(AppError::InvalidInput(
            "Name, email and message are required".to_string(),
        )
        .into());
    }

    contact.insert(&input).await.map_err(AppError::from)?;

    Ok(ApiResponse::success_message("Message sent successfully"))
}
