//! Advisory form-level validation. The persistence layer does not
//! re-validate; these checks exist so clients can reject bad input before
//! it ever reaches a store.

use crate::types::{NewRecipe, RecipeUpdate};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title is required")]
    MissingTitle,

    #[error("Author is required")]
    MissingAuthor,

    #[error("Publication date is required")]
    MissingDate,

    #[error("At least one step is required")]
    NoSteps,

    #[error("At least one ingredient is required")]
    NoIngredients,

    #[error("Preparation time must be positive")]
    ZeroPrepTime,
}

fn has_non_blank(entries: &[String]) -> bool {
    entries.iter().any(|e| !e.trim().is_empty())
}

pub fn validate_new_recipe(input: &NewRecipe) -> Result<(), ValidationError> {
    if input.title.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    if input.author.trim().is_empty() {
        return Err(ValidationError::MissingAuthor);
    }
    if input.date_published.trim().is_empty() {
        return Err(ValidationError::MissingDate);
    }
    if !has_non_blank(&input.steps) {
        return Err(ValidationError::NoSteps);
    }
    if !has_non_blank(&input.ingredients) {
        return Err(ValidationError::NoIngredients);
    }
    if input.prep_time_minutes == 0 {
        return Err(ValidationError::ZeroPrepTime);
    }
    Ok(())
}

/// Validate only the fields a partial update actually supplies.
pub fn validate_update(patch: &RecipeUpdate) -> Result<(), ValidationError> {
    if let Some(ref title) = patch.title {
        if title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
    }
    if let Some(ref author) = patch.author {
        if author.trim().is_empty() {
            return Err(ValidationError::MissingAuthor);
        }
    }
    if let Some(ref date) = patch.date_published {
        if date.trim().is_empty() {
            return Err(ValidationError::MissingDate);
        }
    }
    if let Some(ref steps) = patch.steps {
        if !has_non_blank(steps) {
            return Err(ValidationError::NoSteps);
        }
    }
    if let Some(ref ingredients) = patch.ingredients {
        if !has_non_blank(ingredients) {
            return Err(ValidationError::NoIngredients);
        }
    }
    if patch.prep_time_minutes == Some(0) {
        return Err(ValidationError::ZeroPrepTime);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> NewRecipe {
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
    fn accepts_valid_input() {
        assert_eq!(validate_new_recipe(&valid_input()), Ok(()));
    }

    #[test]
    fn rejects_blank_title() {
        let mut input = valid_input();
        input.title = "   ".to_string();
        assert_eq!(
            validate_new_recipe(&input),
            Err(ValidationError::MissingTitle)
        );
    }

    #[test]
    fn rejects_all_blank_steps() {
        let mut input = valid_input();
        input.steps = vec!["".to_string(), "  ".to_string()];
        assert_eq!(validate_new_recipe(&input), Err(ValidationError::NoSteps));
    }

    #[test]
    fn rejects_missing_ingredients() {
        let mut input = valid_input();
        input.ingredients.clear();
        assert_eq!(
            validate_new_recipe(&input),
            Err(ValidationError::NoIngredients)
        );
    }

    #[test]
    fn rejects_zero_prep_time() {
        let mut input = valid_input();
        input.prep_time_minutes = 0;
        assert_eq!(
            validate_new_recipe(&input),
            Err(ValidationError::ZeroPrepTime)
        );
    }

    #[test]
    fn update_rejects_zero_prep_time() {
        let patch = RecipeUpdate {
            prep_time_minutes: Some(0),
            ..Default::default()
        };
        assert_eq!(validate_update(&patch), Err(ValidationError::ZeroPrepTime));
    }

    #[test]
    fn update_ignores_absent_fields() {
        assert_eq!(validate_update(&RecipeUpdate::default()), Ok(()));
    }

    #[test]
    fn update_rejects_blank_supplied_title() {
        let patch = RecipeUpdate {
            title: Some("".to_string()),
            ..Default::default()
        };
        assert_eq!(validate_update(&patch), Err(ValidationError::MissingTitle));
    }
}
