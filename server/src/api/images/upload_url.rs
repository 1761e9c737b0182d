use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::get_conn;
use crate::images;
use crate::models::NewUploadTicket;
use crate::schema::upload_tickets;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadUrlResponse {
    /// Single-use destination; POST the image bytes here with their
    /// Content-Type.
    pub upload_url: String,
}

#[utoipa::path(
    post,
    path = "/api/images/upload-url",
    tag = "images",
    responses(
        (status = 201, description = "Single-use upload destination issued", body = UploadUrlResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn generate_upload_url(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let mut conn = get_conn!(state.pool);

    let ticket = NewUploadTicket {
        user_id: user.id,
        expires_at: Utc::now() + Duration::minutes(images::UPLOAD_TICKET_TTL_MINUTES),
    };

    let ticket_id: Uuid = match diesel::insert_into(upload_tickets::table)
        .values(&ticket)
        .returning(upload_tickets::id)
        .get_result(&mut conn)
    {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Failed to issue upload ticket: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to issue upload URL".to_string(),
                }),
            )
                .into_response();
        }
    };

    (
        StatusCode::CREATED,
        Json(UploadUrlResponse {
            upload_url: images::upload_url(&state.config.public_base_url, ticket_id),
        }),
    )
        .into_response()
}
