pub mod auth;

use crate::api::images;
use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for public endpoints (no auth required).
///
/// Image upload and serving are public by design: the unguessable upload
/// ticket is the credential for uploads, and resolved image URLs must be
/// fetchable without an Authorization header.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(auth::signup::signup))
        .route("/api/auth/login", post(auth::login::login))
        .route(
            "/api/images/upload/{ticket}",
            post(images::upload::upload_image),
        )
        .route("/api/images/{id}", get(images::get::get_image))
}

#[derive(OpenApi)]
#[openapi(
    paths(auth::login::login, auth::signup::signup,),
    components(schemas(
        auth::login::LoginRequest,
        auth::login::LoginResponse,
        auth::signup::SignupRequest,
        auth::signup::SignupResponse,
    ))
)]
pub struct ApiDoc;
