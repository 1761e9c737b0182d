use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::get_conn;
use crate::store::UserRecipeStore;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use recipebox_core::{validate_update, RecipeUpdate};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::get::RecipeResponse;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub date_published: Option<String>,
    pub image: Option<String>,
    /// Replacement storage reference. The previously stored image, if
    /// any, is deleted before the new reference is resolved.
    pub image_storage_id: Option<Uuid>,
    pub ingredients: Option<Vec<String>>,
    pub steps: Option<Vec<String>>,
    pub prep_time_minutes: Option<u32>,
}

#[utoipa::path(
    put,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = String, Path, description = "Recipe ID")
    ),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated successfully", body = RecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found or access denied", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateRecipeRequest>,
) -> impl IntoResponse {
    let patch = RecipeUpdate {
        title: request.title,
        description: request.description,
        author: request.author,
        date_published: request.date_published,
        image: request.image,
        ingredients: request.ingredients,
        steps: request.steps,
        prep_time_minutes: request.prep_time_minutes,
    };

    if let Err(e) = validate_update(&patch) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response();
    }

    let mut conn = get_conn!(state.pool);
    let mut store = UserRecipeStore::new(&mut conn, user.id, &state.config.public_base_url);

    match store.update_with_image(&id, patch, request.image_storage_id) {
        Ok(Some(recipe)) => (StatusCode::OK, Json(RecipeResponse::from(recipe))).into_response(),
        // Missing and not-owned are deliberately indistinguishable.
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Recipe not found or access denied".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to update recipe: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update recipe".to_string(),
                }),
            )
                .into_response()
        }
    }
}
