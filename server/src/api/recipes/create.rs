use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::get_conn;
use crate::store::UserRecipeStore;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use recipebox_core::{validate_new_recipe, NewRecipe};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::get::RecipeResponse;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRecipeRequest {
    pub title: String,
    pub description: Option<String>,
    pub author: String,
    pub date_published: String,
    /// Externally hosted image URI. Ignored when a storage reference is
    /// supplied.
    pub image: Option<String>,
    /// Reference to a previously uploaded blob; resolved to a URL at
    /// write time.
    pub image_storage_id: Option<Uuid>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    #[serde(default)]
    pub prep_time_minutes: u32,
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created successfully", body = RecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateRecipeRequest>,
) -> impl IntoResponse {
    let input = NewRecipe {
        title: request.title,
        description: request.description,
        author: request.author,
        date_published: request.date_published,
        image: request.image,
        ingredients: request.ingredients,
        steps: request.steps,
        prep_time_minutes: request.prep_time_minutes,
    };

    if let Err(e) = validate_new_recipe(&input) {
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

    match store.create_with_image(input, request.image_storage_id) {
        Ok(recipe) => (StatusCode::CREATED, Json(RecipeResponse::from(recipe))).into_response(),
        Err(e) => {
            tracing::error!("Failed to create recipe: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create recipe".to_string(),
                }),
            )
                .into_response()
        }
    }
}
