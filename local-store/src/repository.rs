use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use recipebox_core::{NewRecipe, Recipe, RecipeStore, RecipeUpdate};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// CRUD operations on the embedded `recipes` table.
///
/// Ingredients and steps are serialized as JSON text blobs in storage and
/// decoded on read. No transactional wrapping beyond per-statement; the
/// connection mutex serializes concurrent callers.
pub struct RecipeRepository {
    conn: Arc<Mutex<Connection>>,
}

/// Raw row shape of the `recipes` table.
struct RecipeRow {
    id: String,
    title: String,
    description: Option<String>,
    author: String,
    date_published: String,
    image: Option<String>,
    ingredients: String,
    steps: String,
    prep_time_minutes: i64,
    created_at: String,
    updated_at: String,
}

const SELECT_COLUMNS: &str = "id, title, description, author, date_published, image, \
     ingredients, steps, prep_time_minutes, created_at, updated_at";

impl RecipeRow {
    fn from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            author: row.get(3)?,
            date_published: row.get(4)?,
            image: row.get(5)?,
            ingredients: row.get(6)?,
            steps: row.get(7)?,
            prep_time_minutes: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn into_recipe(self) -> Result<Recipe> {
        Ok(Recipe {
            id: self.id,
            owner: None,
            title: self.title,
            description: self.description,
            author: self.author,
            date_published: self.date_published,
            image: self.image,
            image_storage_id: None,
            // Rows created before the ingredients column existed decode as
            // an empty list.
            ingredients: serde_json::from_str(&self.ingredients).unwrap_or_default(),
            steps: serde_json::from_str(&self.steps).context("invalid steps blob")?,
            prep_time_minutes: self.prep_time_minutes.max(0) as u32,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid timestamp: {raw}"))?
        .with_timezone(&Utc))
}

fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time at the precision the text column keeps, so returned
/// records compare equal to what a later read decodes.
fn now_stored() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

impl RecipeRepository {
    pub fn new(db: &crate::Database) -> Self {
        Self {
            conn: db.connection(),
        }
    }
}

impl RecipeStore for RecipeRepository {
    type Error = anyhow::Error;

    fn list_all(&mut self) -> Result<Vec<Recipe>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM recipes ORDER BY created_at DESC"
        ))?;
        let rows = stmt.query_map([], RecipeRow::from_sql)?;

        let mut recipes = Vec::new();
        for row in rows {
            recipes.push(row?.into_recipe()?);
        }
        Ok(recipes)
    }

    fn get_by_id(&mut self, id: &str) -> Result<Option<Recipe>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM recipes WHERE id = ?1"
        ))?;
        let mut rows = stmt.query_map([id], RecipeRow::from_sql)?;

        match rows.next() {
            Some(row) => Ok(Some(row?.into_recipe()?)),
            None => Ok(None),
        }
    }

    fn create(&mut self, input: NewRecipe) -> Result<Recipe> {
        let id = Uuid::new_v4().to_string();
        let now = now_stored();

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO recipes (id, title, description, author, date_published, image, \
             ingredients, steps, prep_time_minutes, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                id,
                input.title,
                input.description,
                input.author,
                input.date_published,
                input.image,
                serde_json::to_string(&input.ingredients)?,
                serde_json::to_string(&input.steps)?,
                input.prep_time_minutes,
                encode_timestamp(now),
                encode_timestamp(now),
            ],
        )?;
        tracing::debug!(%id, "created recipe");

        Ok(Recipe {
            id,
            owner: None,
            title: input.title,
            description: input.description,
            author: input.author,
            date_published: input.date_published,
            image: input.image,
            image_storage_id: None,
            ingredients: input.ingredients,
            steps: input.steps,
            prep_time_minutes: input.prep_time_minutes,
            created_at: now,
            updated_at: now,
        })
    }

    fn update(&mut self, id: &str, patch: RecipeUpdate) -> Result<Option<Recipe>> {
        let Some(mut recipe) = self.get_by_id(id)? else {
            return Ok(None);
        };

        patch.apply_to(&mut recipe);
        recipe.updated_at = now_stored();

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE recipes SET title = ?1, description = ?2, author = ?3, \
             date_published = ?4, image = ?5, ingredients = ?6, steps = ?7, \
             prep_time_minutes = ?8, updated_at = ?9 WHERE id = ?10",
            rusqlite::params![
                recipe.title,
                recipe.description,
                recipe.author,
                recipe.date_published,
                recipe.image,
                serde_json::to_string(&recipe.ingredients)?,
                serde_json::to_string(&recipe.steps)?,
                recipe.prep_time_minutes,
                encode_timestamp(recipe.updated_at),
                id,
            ],
        )?;

        Ok(Some(recipe))
    }

    fn delete(&mut self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use std::thread::sleep;
    use std::time::Duration;

    fn repo() -> RecipeRepository {
        let db = Database::in_memory().unwrap();
        RecipeRepository::new(&db)
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

    #[test]
    fn create_then_get_round_trips() {
        let mut repo = repo();
        let created = repo.create(tea()).unwrap();

        assert!(!created.id.is_empty());
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(created.steps.len(), 2);

        let fetched = repo.get_by_id(&created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn returned_timestamps_match_what_a_later_read_decodes() {
        let mut repo = repo();
        let created = repo.create(tea()).unwrap();
        let fetched = repo.get_by_id(&created.id).unwrap().unwrap();
        assert_eq!(fetched.created_at, created.created_at);
        assert_eq!(fetched.updated_at, created.updated_at);

        let patch = RecipeUpdate {
            title: Some("Green tea".to_string()),
            ..Default::default()
        };
        let updated = repo.update(&created.id, patch).unwrap().unwrap();
        let refetched = repo.get_by_id(&created.id).unwrap().unwrap();
        assert_eq!(refetched, updated);
    }

    #[test]
    fn get_unknown_id_is_absent() {
        let mut repo = repo();
        assert!(repo.get_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn list_all_is_newest_first() {
        let mut repo = repo();
        let mut ids = Vec::new();
        for title in ["first", "second", "third"] {
            let mut input = tea();
            input.title = title.to_string();
            ids.push(repo.create(input).unwrap().id);
            // Distinct created_at values so the ordering is strict.
            sleep(Duration::from_millis(2));
        }

        let listed = repo.list_all().unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].id, ids[2]);
        assert_eq!(listed[1].id, ids[1]);
        assert_eq!(listed[2].id, ids[0]);
        assert!(listed[0].created_at > listed[1].created_at);
        assert!(listed[1].created_at > listed[2].created_at);
    }

    #[test]
    fn partial_update_changes_only_supplied_fields() {
        let mut repo = repo();
        let created = repo.create(tea()).unwrap();
        sleep(Duration::from_millis(2));

        let patch = RecipeUpdate {
            prep_time_minutes: Some(5),
            ..Default::default()
        };
        let updated = repo.update(&created.id, patch).unwrap().unwrap();

        assert_eq!(updated.prep_time_minutes, 5);
        assert_eq!(updated.title, "Tea");
        assert_eq!(updated.ingredients, created.ingredients);
        assert!(updated.updated_at > updated.created_at);

        let fetched = repo.get_by_id(&created.id).unwrap().unwrap();
        assert_eq!(fetched.prep_time_minutes, 5);
        assert_eq!(fetched.title, "Tea");
    }

    #[test]
    fn update_missing_recipe_is_absent() {
        let mut repo = repo();
        let patch = RecipeUpdate {
            title: Some("Coffee".to_string()),
            ..Default::default()
        };
        assert!(repo.update("missing", patch).unwrap().is_none());
    }

    #[test]
    fn delete_removes_the_row() {
        let mut repo = repo();
        let created = repo.create(tea()).unwrap();

        assert!(repo.delete(&created.id).unwrap());
        assert!(repo.get_by_id(&created.id).unwrap().is_none());
        assert!(!repo.delete(&created.id).unwrap());
    }

    #[test]
    fn legacy_empty_ingredients_blob_decodes_as_empty_list() {
        let db = Database::in_memory().unwrap();
        let mut repo = RecipeRepository::new(&db);
        let created = repo.create(tea()).unwrap();

        db.connection()
            .lock()
            .unwrap()
            .execute(
                "UPDATE recipes SET ingredients = '' WHERE id = ?1",
                [&created.id],
            )
            .unwrap();

        let fetched = repo.get_by_id(&created.id).unwrap().unwrap();
        assert!(fetched.ingredients.is_empty());
    }

    #[test]
    fn seeded_database_lists_samples_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(dir.path().join("recipes.db")).unwrap();
        let mut repo = RecipeRepository::new(&db);

        let listed = repo.list_all().unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].created_at > listed[1].created_at);
        assert!(!listed[0].steps.is_empty());
    }
}
