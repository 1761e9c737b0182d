use chrono::Utc;
use diesel::prelude::*;
use recipebox_core::{NewRecipe, Recipe, RecipeStore, RecipeUpdate};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewRecipeRow, RecipeChangeset, RecipeRow};
use crate::schema::{images, recipes};
use crate::{images as image_store, search};

/// Upper bound on title-search results; the query has no pagination.
pub const SEARCH_RESULT_CAP: i64 = 100;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("invalid recipe payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Recipe store scoped to one authenticated caller. Every query filters by
/// the owner, so a foreign recipe id behaves exactly like a missing one.
pub struct UserRecipeStore<'a> {
    conn: &'a mut PgConnection,
    user_id: Uuid,
    base_url: &'a str,
}

impl<'a> UserRecipeStore<'a> {
    pub fn new(conn: &'a mut PgConnection, user_id: Uuid, base_url: &'a str) -> Self {
        Self {
            conn,
            user_id,
            base_url,
        }
    }

    /// Title substring search over the caller's recipes, newest first,
    /// capped at [`SEARCH_RESULT_CAP`] rows.
    pub fn search(&mut self, term: &str) -> Result<Vec<Recipe>, StoreError> {
        let pattern = format!("%{}%", search::escape_like(term));
        let rows: Vec<RecipeRow> = recipes::table
            .filter(recipes::user_id.eq(self.user_id))
            .filter(recipes::title.ilike(pattern))
            .order(recipes::created_at.desc())
            .limit(SEARCH_RESULT_CAP)
            .select(RecipeRow::as_select())
            .load(&mut *self.conn)?;

        Ok(rows
            .into_iter()
            .map(|row| row.into_recipe(self.base_url))
            .collect())
    }

    /// Create with an optional storage reference; the reference is
    /// resolved to a URL at write time.
    pub fn create_with_image(
        &mut self,
        input: NewRecipe,
        storage_id: Option<Uuid>,
    ) -> Result<Recipe, StoreError> {
        let image = match storage_id {
            Some(sid) => self.resolve_storage_ref(sid)?,
            None => input.image.clone(),
        };

        let row = NewRecipeRow {
            user_id: self.user_id,
            title: &input.title,
            description: input.description.as_deref(),
            author: &input.author,
            date_published: &input.date_published,
            image,
            image_storage_id: storage_id,
            ingredients: serde_json::to_value(&input.ingredients)?,
            steps: serde_json::to_value(&input.steps)?,
            prep_time_minutes: input.prep_time_minutes as i32,
        };

        let stored: RecipeRow = diesel::insert_into(recipes::table)
            .values(&row)
            .returning(RecipeRow::as_returning())
            .get_result(&mut *self.conn)?;

        Ok(stored.into_recipe(self.base_url))
    }

    /// Partial update with an optional replacement storage reference.
    /// A new reference first deletes the previously stored image, then
    /// resolves the new one; only supplied fields overwrite the row.
    pub fn update_with_image(
        &mut self,
        id: &str,
        patch: RecipeUpdate,
        storage_id: Option<Uuid>,
    ) -> Result<Option<Recipe>, StoreError> {
        let Ok(rid) = Uuid::parse_str(id) else {
            return Ok(None);
        };

        let existing: Option<(Uuid, Option<Uuid>)> = recipes::table
            .filter(recipes::id.eq(rid))
            .filter(recipes::user_id.eq(self.user_id))
            .select((recipes::id, recipes::image_storage_id))
            .first(&mut *self.conn)
            .optional()?;
        let Some((_, old_storage_id)) = existing else {
            return Ok(None);
        };

        let (image, image_storage_id) = match storage_id {
            Some(sid) => {
                if let Some(old) = old_storage_id {
                    self.delete_stored_image(old)?;
                }
                (self.resolve_storage_ref(sid)?, Some(sid))
            }
            None => (patch.image.clone(), None),
        };

        let changes = RecipeChangeset {
            title: patch.title,
            description: patch.description,
            author: patch.author,
            date_published: patch.date_published,
            image,
            image_storage_id,
            ingredients: patch
                .ingredients
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
            steps: patch.steps.as_ref().map(serde_json::to_value).transpose()?,
            prep_time_minutes: patch.prep_time_minutes.map(|m| m as i32),
            updated_at: Utc::now(),
        };

        let stored: RecipeRow = diesel::update(recipes::table.find(rid))
            .set(&changes)
            .returning(RecipeRow::as_returning())
            .get_result(&mut *self.conn)?;

        Ok(Some(stored.into_recipe(self.base_url)))
    }

    /// Existence-checked resolution of a storage reference. A dangling
    /// reference resolves to no image rather than a dead URL.
    fn resolve_storage_ref(&mut self, storage_id: Uuid) -> Result<Option<String>, StoreError> {
        let exists: Option<Uuid> = images::table
            .filter(images::id.eq(storage_id))
            .select(images::id)
            .first(&mut *self.conn)
            .optional()?;

        Ok(exists.map(|id| image_store::url(self.base_url, id)))
    }

    fn delete_stored_image(&mut self, storage_id: Uuid) -> Result<(), StoreError> {
        let removed =
            diesel::delete(images::table.filter(images::id.eq(storage_id).and(images::user_id.eq(self.user_id))))
                .execute(&mut *self.conn)?;
        if removed == 0 {
            tracing::warn!(%storage_id, "stored image already gone");
        }
        Ok(())
    }
}

impl RecipeStore for UserRecipeStore<'_> {
    type Error = StoreError;

    fn list_all(&mut self) -> Result<Vec<Recipe>, StoreError> {
        let rows: Vec<RecipeRow> = recipes::table
            .filter(recipes::user_id.eq(self.user_id))
            .order(recipes::created_at.desc())
            .select(RecipeRow::as_select())
            .load(&mut *self.conn)?;

        Ok(rows
            .into_iter()
            .map(|row| row.into_recipe(self.base_url))
            .collect())
    }

    fn get_by_id(&mut self, id: &str) -> Result<Option<Recipe>, StoreError> {
        // A malformed id cannot match any row; treat it as absent rather
        // than erroring, the same as an ownership mismatch.
        let Ok(rid) = Uuid::parse_str(id) else {
            return Ok(None);
        };

        let row: Option<RecipeRow> = recipes::table
            .filter(recipes::id.eq(rid))
            .filter(recipes::user_id.eq(self.user_id))
            .select(RecipeRow::as_select())
            .first(&mut *self.conn)
            .optional()?;

        Ok(row.map(|row| row.into_recipe(self.base_url)))
    }

    fn create(&mut self, input: NewRecipe) -> Result<Recipe, StoreError> {
        self.create_with_image(input, None)
    }

    fn update(&mut self, id: &str, patch: RecipeUpdate) -> Result<Option<Recipe>, StoreError> {
        self.update_with_image(id, patch, None)
    }

    fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let Ok(rid) = Uuid::parse_str(id) else {
            return Ok(false);
        };

        let existing: Option<Option<Uuid>> = recipes::table
            .filter(recipes::id.eq(rid))
            .filter(recipes::user_id.eq(self.user_id))
            .select(recipes::image_storage_id)
            .first(&mut *self.conn)
            .optional()?;
        let Some(storage_id) = existing else {
            return Ok(false);
        };

        if let Some(sid) = storage_id {
            self.delete_stored_image(sid)?;
        }

        let removed = diesel::delete(recipes::table.find(rid)).execute(&mut *self.conn)?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MIGRATIONS;
    use crate::models::{NewImage, NewUser};
    use crate::schema::users;
    use diesel::Connection;
    use diesel_migrations::MigrationHarness;

    const BASE_URL: &str = "http://localhost:3000";

    // These tests run inside a rolled-back test transaction against the
    // database named by DATABASE_URL.
    fn conn() -> PgConnection {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for these tests");
        let mut conn = PgConnection::establish(&url).expect("Failed to connect to Postgres");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("Failed to run migrations");
        conn.begin_test_transaction()
            .expect("Failed to start test transaction");
        conn
    }

    fn create_user(conn: &mut PgConnection) -> Uuid {
        let username = format!("user-{}", Uuid::new_v4());
        diesel::insert_into(users::table)
            .values(&NewUser {
                username: &username,
                password_hash: "unused",
            })
            .returning(users::id)
            .get_result(conn)
            .expect("Failed to insert user")
    }

    fn store_blob(conn: &mut PgConnection, user_id: Uuid) -> Uuid {
        diesel::insert_into(images::table)
            .values(&NewImage {
                user_id,
                content_type: "image/png",
                data: &[1, 2, 3],
            })
            .returning(images::id)
            .get_result(conn)
            .expect("Failed to insert image")
    }

    fn tea() -> NewRecipe {
        NewRecipe {
            title: "Tea".to_string(),
            description: None,
            author: "A".to_string(),
            date_published: "2024-01-01".to_string(),
            image: None,
            ingredients: vec!["Water".to_string(), "Tea leaves".to_string()],
            steps: vec!["Boil water".to_string(), "Add leaves".to_string()],
            prep_time_minutes: 3,
        }
    }

    fn blob_count(conn: &mut PgConnection, id: Uuid) -> i64 {
        images::table
            .filter(images::id.eq(id))
            .count()
            .get_result(conn)
            .expect("Failed to count images")
    }

    #[test]
    #[ignore = "requires a migrated Postgres at DATABASE_URL"]
    fn foreign_recipe_ids_behave_like_missing() {
        let mut conn = conn();
        let owner = create_user(&mut conn);
        let stranger = create_user(&mut conn);

        let id = UserRecipeStore::new(&mut conn, owner, BASE_URL)
            .create(tea())
            .unwrap()
            .id;

        let mut other = UserRecipeStore::new(&mut conn, stranger, BASE_URL);
        assert!(other.get_by_id(&id).unwrap().is_none());
        let patch = RecipeUpdate {
            title: Some("Hijacked".to_string()),
            ..Default::default()
        };
        assert!(other.update(&id, patch).unwrap().is_none());
        assert!(!other.delete(&id).unwrap());
        assert!(other.list_all().unwrap().is_empty());

        // Untouched for the owner.
        let kept = UserRecipeStore::new(&mut conn, owner, BASE_URL)
            .get_by_id(&id)
            .unwrap()
            .unwrap();
        assert_eq!(kept.title, "Tea");
    }

    #[test]
    #[ignore = "requires a migrated Postgres at DATABASE_URL"]
    fn delete_removes_the_stored_image_blob() {
        let mut conn = conn();
        let user = create_user(&mut conn);
        let blob = store_blob(&mut conn, user);

        let created = UserRecipeStore::new(&mut conn, user, BASE_URL)
            .create_with_image(tea(), Some(blob))
            .unwrap();
        assert_eq!(created.image, Some(image_store::url(BASE_URL, blob)));

        assert!(UserRecipeStore::new(&mut conn, user, BASE_URL)
            .delete(&created.id)
            .unwrap());
        assert_eq!(blob_count(&mut conn, blob), 0);
    }

    #[test]
    #[ignore = "requires a migrated Postgres at DATABASE_URL"]
    fn replacing_the_image_deletes_the_old_blob() {
        let mut conn = conn();
        let user = create_user(&mut conn);
        let old = store_blob(&mut conn, user);
        let replacement = store_blob(&mut conn, user);

        let created = UserRecipeStore::new(&mut conn, user, BASE_URL)
            .create_with_image(tea(), Some(old))
            .unwrap();
        let updated = UserRecipeStore::new(&mut conn, user, BASE_URL)
            .update_with_image(&created.id, RecipeUpdate::default(), Some(replacement))
            .unwrap()
            .unwrap();

        assert_eq!(updated.image, Some(image_store::url(BASE_URL, replacement)));
        assert_eq!(blob_count(&mut conn, old), 0);
        assert_eq!(blob_count(&mut conn, replacement), 1);
    }
}
