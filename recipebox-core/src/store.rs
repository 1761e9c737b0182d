use crate::types::{NewRecipe, Recipe, RecipeUpdate};

/// Persistence contract shared by the embedded SQLite store and the hosted
/// Postgres backend. The two deployments are never combined at runtime;
/// the trait exists so they cannot silently diverge on semantics.
///
/// Backends scope visibility themselves: the embedded store assumes a
/// single user, the hosted store is constructed per authenticated caller
/// and only ever sees that caller's rows.
pub trait RecipeStore {
    type Error;

    /// All visible recipes, newest-created first.
    fn list_all(&mut self) -> Result<Vec<Recipe>, Self::Error>;

    /// The matching recipe, or `None` when no visible row has this id.
    fn get_by_id(&mut self, id: &str) -> Result<Option<Recipe>, Self::Error>;

    /// Persist a new recipe: assigns a fresh identifier and timestamps
    /// (`created_at == updated_at`) and returns the stored record.
    fn create(&mut self, input: NewRecipe) -> Result<Recipe, Self::Error>;

    /// Merge the supplied fields onto the existing record and refresh
    /// `updated_at`. `None` when no visible row matches.
    fn update(&mut self, id: &str, patch: RecipeUpdate) -> Result<Option<Recipe>, Self::Error>;

    /// Remove the record, releasing any associated stored image. Reports
    /// whether a row was actually removed.
    fn delete(&mut self, id: &str) -> Result<bool, Self::Error>;
}
