use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::get_conn;
use crate::store::UserRecipeStore;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use recipebox_core::RecipeStore;
use serde::Serialize;
use utoipa::ToSchema;

use super::get::RecipeResponse;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeResponse>,
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    responses(
        (status = 200, description = "Caller's recipes, newest first", body = ListRecipesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_recipes(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let mut conn = get_conn!(state.pool);
    let mut store = UserRecipeStore::new(&mut conn, user.id, &state.config.public_base_url);

    match store.list_all() {
        Ok(recipes) => (
            StatusCode::OK,
            Json(ListRecipesResponse {
                recipes: recipes.into_iter().map(RecipeResponse::from).collect(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to list recipes: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipes".to_string(),
                }),
            )
                .into_response()
        }
    }
}
