use axum::Json;
use validator::Validate;

use crate::{
    error::ApiResult,
    models::{ContactRequest, MessageResponse},
};

/// submit_contact
///
/// [Public Route] Validates and logs the message. Nothing is sent or stored.
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Accepted", body = MessageResponse),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn submit_contact(Json(payload): Json<ContactRequest>) -> ApiResult<Json<MessageResponse>> {
    payload.validate()?;

    tracing::info!(
        name = %payload.name,
        email = %payload.email,
        subject = payload.subject.as_deref().unwrap_or(""),
        length = payload.message.len(),
        "contact message received"
    );

    Ok(Json(MessageResponse::new("Cảm ơn bạn đã liên hệ, chúng tôi sẽ phản hồi sớm")))
}
