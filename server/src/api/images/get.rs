use crate::api::ErrorResponse;
use crate::get_conn;
use crate::schema::images;
use crate::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use diesel::prelude::*;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/images/{id}",
    tag = "images",
    params(
        ("id" = Uuid, Path, description = "Image storage ID")
    ),
    responses(
        (status = 200, description = "Image data"),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
pub async fn get_image(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let mut conn = get_conn!(state.pool);

    let row: Option<(String, Vec<u8>)> = match images::table
        .filter(images::id.eq(id))
        .select((images::content_type, images::data))
        .first(&mut conn)
        .optional()
    {
        Ok(row) => row,
        Err(e) => {
            tracing::error!("Failed to fetch image: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch image".to_string(),
                }),
            )
                .into_response();
        }
    };

    let Some((content_type, data)) = row else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Image not found".to_string(),
            }),
        )
            .into_response();
    };

    // Blobs are immutable once stored, so clients may cache forever.
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from(data))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
