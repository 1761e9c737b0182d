use chrono::{DateTime, Utc};
use diesel::prelude::*;
use recipebox_core::Recipe;
use uuid::Uuid;

use crate::images;

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::sessions)]
pub struct NewSession<'a> {
    pub user_id: Uuid,
    pub token_hash: &'a str,
    pub expires_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::images)]
pub struct NewImage<'a> {
    pub user_id: Uuid,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::upload_tickets)]
pub struct NewUploadTicket {
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Full row shape of the `recipes` table.
#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RecipeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub author: String,
    pub date_published: String,
    pub image: Option<String>,
    pub image_storage_id: Option<Uuid>,
    pub ingredients: serde_json::Value,
    pub steps: serde_json::Value,
    pub prep_time_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecipeRow {
    /// Convert to the shared record shape, re-resolving the storage
    /// reference to a fetchable URL at read time when one is present.
    pub fn into_recipe(self, base_url: &str) -> Recipe {
        let image = match self.image_storage_id {
            Some(storage_id) => Some(images::url(base_url, storage_id)),
            None => self.image,
        };

        // A corrupt steps column loses its data either way; surface it in
        // the logs instead of failing every read of the row.
        let steps = serde_json::from_value(self.steps).unwrap_or_else(|e| {
            tracing::error!(recipe_id = %self.id, "corrupt steps column: {}", e);
            Vec::new()
        });

        Recipe {
            id: self.id.to_string(),
            owner: Some(self.user_id.to_string()),
            title: self.title,
            description: self.description,
            author: self.author,
            date_published: self.date_published,
            image,
            image_storage_id: self.image_storage_id.map(|id| id.to_string()),
            ingredients: serde_json::from_value(self.ingredients).unwrap_or_default(),
            steps,
            prep_time_minutes: self.prep_time_minutes.max(0) as u32,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipes)]
pub struct NewRecipeRow<'a> {
    pub user_id: Uuid,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub author: &'a str,
    pub date_published: &'a str,
    pub image: Option<String>,
    pub image_storage_id: Option<Uuid>,
    pub ingredients: serde_json::Value,
    pub steps: serde_json::Value,
    pub prep_time_minutes: i32,
}

/// Partial-update changeset: `None` fields are skipped, so only supplied
/// fields overwrite the row. `updated_at` is always refreshed.
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::recipes)]
pub struct RecipeChangeset {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub date_published: Option<String>,
    pub image: Option<String>,
    pub image_storage_id: Option<Uuid>,
    pub ingredients: Option<serde_json::Value>,
    pub steps: Option<serde_json::Value>,
    pub prep_time_minutes: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(image: Option<&str>, storage_id: Option<Uuid>) -> RecipeRow {
        RecipeRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Tea".to_string(),
            description: None,
            author: "A".to_string(),
            date_published: "2024-01-01".to_string(),
            image: image.map(String::from),
            image_storage_id: storage_id,
            ingredients: json!(["Water", "Tea leaves"]),
            steps: json!(["Boil water", "Add leaves"]),
            prep_time_minutes: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn storage_reference_wins_over_stored_image_url() {
        let storage_id = Uuid::new_v4();
        let recipe = row(Some("https://stale.example/img"), Some(storage_id))
            .into_recipe("http://localhost:3000");
        assert_eq!(
            recipe.image.unwrap(),
            format!("http://localhost:3000/api/images/{storage_id}")
        );
        assert_eq!(recipe.image_storage_id.unwrap(), storage_id.to_string());
    }

    #[test]
    fn plain_image_uri_passes_through() {
        let recipe = row(Some("https://example.com/tea.jpg"), None)
            .into_recipe("http://localhost:3000");
        assert_eq!(recipe.image.as_deref(), Some("https://example.com/tea.jpg"));
        assert!(recipe.image_storage_id.is_none());
    }

    #[test]
    fn corrupt_steps_column_reads_as_empty_without_panicking() {
        let mut bad = row(None, None);
        bad.steps = json!({"not": "a list"});
        let recipe = bad.into_recipe("http://localhost:3000");
        assert!(recipe.steps.is_empty());
        assert_eq!(recipe.ingredients, vec!["Water", "Tea leaves"]);
    }

    #[test]
    fn row_conversion_keeps_step_order() {
        let recipe = row(None, None).into_recipe("http://localhost:3000");
        assert_eq!(recipe.steps, vec!["Boil water", "Add leaves"]);
        assert_eq!(recipe.prep_time_minutes, 3);
        assert!(recipe.owner.is_some());
    }
}
