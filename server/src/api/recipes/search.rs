use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::get_conn;
use crate::store::UserRecipeStore;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::get::RecipeResponse;
use super::list::ListRecipesResponse;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchParams {
    /// Title search term, matched case-insensitively as a substring.
    pub term: String,
}

#[utoipa::path(
    get,
    path = "/api/recipes/search",
    tag = "recipes",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching recipes, newest first, capped at 100", body = ListRecipesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn search_recipes(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let mut conn = get_conn!(state.pool);
    let mut store = UserRecipeStore::new(&mut conn, user.id, &state.config.public_base_url);

    match store.search(&params.term) {
        Ok(recipes) => (
            StatusCode::OK,
            Json(ListRecipesResponse {
                recipes: recipes.into_iter().map(RecipeResponse::from).collect(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to search recipes: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to search recipes".to_string(),
                }),
            )
                .into_response()
        }
    }
}
