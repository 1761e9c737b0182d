use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::get_conn;
use crate::images;
use crate::schema::images as images_table;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImageUrlResponse {
    pub url: String,
}

#[utoipa::path(
    get,
    path = "/api/images/{id}/url",
    tag = "images",
    params(
        ("id" = Uuid, Path, description = "Image storage ID")
    ),
    responses(
        (status = 200, description = "Fetchable URL for the stored image", body = ImageUrlResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Image not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_image_url(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(state.pool);

    let exists: Option<Uuid> = match images_table::table
        .filter(images_table::id.eq(id))
        .select(images_table::id)
        .first(&mut conn)
        .optional()
    {
        Ok(row) => row,
        Err(e) => {
            tracing::error!("Failed to resolve image URL: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to resolve image URL".to_string(),
                }),
            )
                .into_response();
        }
    };

    match exists {
        Some(id) => (
            StatusCode::OK,
            Json(ImageUrlResponse {
                url: images::url(&state.config.public_base_url, id),
            }),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Image not found".to_string(),
            }),
        )
            .into_response(),
    }
}
