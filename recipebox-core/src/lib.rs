pub mod store;
pub mod types;
pub mod validate;

pub use store::RecipeStore;
pub use types::{NewRecipe, Recipe, RecipeUpdate};
pub use validate::{validate_new_recipe, validate_update, ValidationError};
