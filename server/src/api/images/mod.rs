pub mod get;
pub mod get_url;
pub mod upload;
pub mod upload_url;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for authenticated /api/images endpoints (mounted at
/// /api/images). Upload and serving are public and live in the public
/// router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload-url", post(upload_url::generate_upload_url))
        .route("/{id}/url", get(get_url::get_image_url))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        upload_url::generate_upload_url,
        upload::upload_image,
        get::get_image,
        get_url::get_image_url,
    ),
    components(schemas(
        upload_url::UploadUrlResponse,
        upload::UploadImageResponse,
        get_url::ImageUrlResponse,
    ))
)]
pub struct ApiDoc;
