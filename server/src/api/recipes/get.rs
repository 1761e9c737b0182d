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
use chrono::{DateTime, Utc};
use recipebox_core::{Recipe, RecipeStore};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: String,
    pub owner: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub author: String,
    pub date_published: String,
    /// Fetchable image URL, resolved from the storage reference when one
    /// is set.
    pub image: Option<String>,
    pub image_storage_id: Option<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub prep_time_minutes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Recipe> for RecipeResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            owner: recipe.owner,
            title: recipe.title,
            description: recipe.description,
            author: recipe.author,
            date_published: recipe.date_published,
            image: recipe.image,
            image_storage_id: recipe.image_storage_id,
            ingredients: recipe.ingredients,
            steps: recipe.steps,
            prep_time_minutes: recipe.prep_time_minutes,
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = String, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let mut conn = get_conn!(state.pool);
    let mut store = UserRecipeStore::new(&mut conn, user.id, &state.config.public_base_url);

    match store.get_by_id(&id) {
        Ok(Some(recipe)) => {
            (StatusCode::OK, Json(RecipeResponse::from(recipe))).into_response()
        }
        // An existing recipe owned by someone else is reported exactly
        // like a missing one.
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Recipe not found".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to fetch recipe: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipe".to_string(),
                }),
            )
                .into_response()
        }
    }
}
