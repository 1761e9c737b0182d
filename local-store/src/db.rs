use anyhow::Result;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Handle for the embedded recipe database. Constructed explicitly and
/// passed to [`crate::RecipeRepository`]; there is no process-global
/// connection.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Create or open the database at the default location and seed sample
    /// data if the store is empty.
    pub fn open() -> Result<Self> {
        Self::open_at(Self::default_path())
    }

    /// Create or open the database at a specific path.
    pub fn open_at(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init(true)?;
        tracing::debug!(path = %path.display(), "opened recipe database");
        Ok(db)
    }

    /// Open an ephemeral in-memory database. Skips sample seeding; useful
    /// for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init(false)?;
        Ok(db)
    }

    fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("RECIPEBOX_DB_PATH") {
            return PathBuf::from(path);
        }
        let cwd = std::env::current_dir().unwrap_or_default();
        cwd.join(".recipebox").join("recipes.db")
    }

    /// Initialize the schema and apply best-effort additive migrations.
    fn init(&self, seed: bool) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS recipes (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                author TEXT NOT NULL,
                date_published TEXT NOT NULL,
                image TEXT,
                ingredients TEXT NOT NULL DEFAULT '[]',
                steps TEXT NOT NULL,
                prep_time_minutes INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;

        // Columns added after the first release. "duplicate column" errors
        // mean the table is already current and are ignored.
        let _ = conn.execute("ALTER TABLE recipes ADD COLUMN image TEXT", []);
        let _ = conn.execute(
            "ALTER TABLE recipes ADD COLUMN ingredients TEXT NOT NULL DEFAULT '[]'",
            [],
        );
        let _ = conn.execute(
            "ALTER TABLE recipes ADD COLUMN prep_time_minutes INTEGER NOT NULL DEFAULT 0",
            [],
        );

        if seed {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?;
            if count == 0 {
                insert_sample_data(&conn)?;
                tracing::info!("seeded sample recipes into empty database");
            }
        }

        Ok(())
    }

    /// Shared connection for repositories built on this database.
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }
}

struct SampleRecipe {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    author: &'static str,
    date_published: &'static str,
    ingredients: &'static [&'static str],
    steps: &'static [&'static str],
    prep_time_minutes: u32,
}

const SAMPLE_RECIPES: &[SampleRecipe] = &[
    SampleRecipe {
        id: "1",
        title: "Buttermilk Pancakes",
        description: "Fluffy weekend pancakes from scratch.",
        author: "Sam Miller",
        date_published: "2024-01-15T10:00:00.000Z",
        ingredients: &[
            "2 cups all-purpose flour",
            "2 tbsp sugar",
            "2 tsp baking powder",
            "1/2 tsp salt",
            "2 cups buttermilk",
            "2 large eggs",
            "3 tbsp melted butter",
        ],
        steps: &[
            "Whisk the dry ingredients together in a large bowl",
            "Beat the buttermilk, eggs, and butter in a second bowl",
            "Fold the wet mixture into the dry until just combined",
            "Ladle onto a hot greased griddle",
            "Flip when bubbles form and cook until golden",
        ],
        prep_time_minutes: 20,
    },
    SampleRecipe {
        id: "2",
        title: "Miso Soup",
        description: "Simple dashi-based miso soup with tofu and scallions.",
        author: "Yuki Tanaka",
        date_published: "2024-01-20T14:30:00.000Z",
        ingredients: &[
            "4 cups dashi stock",
            "3 tbsp miso paste",
            "150g silken tofu, cubed",
            "2 scallions, thinly sliced",
            "1 sheet dried wakame",
        ],
        steps: &[
            "Bring the dashi to a gentle simmer",
            "Rehydrate the wakame in the stock",
            "Dissolve the miso paste through a strainer",
            "Add the tofu and warm through without boiling",
            "Serve topped with scallions",
        ],
        prep_time_minutes: 15,
    },
];

fn insert_sample_data(conn: &Connection) -> Result<()> {
    for recipe in SAMPLE_RECIPES {
        conn.execute(
            "INSERT INTO recipes (id, title, description, author, date_published, image, \
             ingredients, steps, prep_time_minutes, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                recipe.id,
                recipe.title,
                recipe.description,
                recipe.author,
                recipe.date_published,
                Option::<String>::None,
                serde_json::to_string(recipe.ingredients)?,
                serde_json::to_string(recipe.steps)?,
                recipe.prep_time_minutes,
                recipe.date_published,
                recipe.date_published,
            ],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_at_seeds_empty_database_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipes.db");

        {
            let db = Database::open_at(path.clone()).unwrap();
            let conn = db.connection();
            let count: i64 = conn
                .lock()
                .unwrap()
                .query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))
                .unwrap();
            assert_eq!(count, SAMPLE_RECIPES.len() as i64);
        }

        // Reopening must not duplicate the samples or trip over the
        // additive migrations.
        let db = Database::open_at(path).unwrap();
        let conn = db.connection();
        let count: i64 = conn
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, SAMPLE_RECIPES.len() as i64);
    }

    #[test]
    fn in_memory_starts_empty() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();
        let count: i64 = conn
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
