use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored recipe as returned by any [`crate::RecipeStore`] backend.
///
/// Timestamps and the identifier are assigned by the persistence layer,
/// never by the caller. `owner` and `image_storage_id` are populated only
/// by the hosted backend; the embedded single-user store leaves them unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    /// Owning user id. Hosted deployments only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub author: String,
    /// ISO-8601 date string, supplied by the caller.
    pub date_published: String,
    /// Fetchable image URI, resolved from the storage reference at read time
    /// when one is present.
    pub image: Option<String>,
    /// Opaque blob-store handle. Hosted deployments only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_storage_id: Option<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub prep_time_minutes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a recipe. Identifier and timestamps are assigned by
/// the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRecipe {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub author: String,
    pub date_published: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub prep_time_minutes: u32,
}

/// Partial update: only fields that are `Some` overwrite the stored value.
/// Absent fields are left untouched, so a field cannot be unset through an
/// update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub date_published: Option<String>,
    pub image: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub steps: Option<Vec<String>>,
    pub prep_time_minutes: Option<u32>,
}

impl RecipeUpdate {
    /// Merge the supplied fields onto `recipe`, leaving everything else as
    /// it was. The caller refreshes `updated_at`.
    pub fn apply_to(self, recipe: &mut Recipe) {
        if let Some(title) = self.title {
            recipe.title = title;
        }
        if let Some(description) = self.description {
            recipe.description = Some(description);
        }
        if let Some(author) = self.author {
            recipe.author = author;
        }
        if let Some(date_published) = self.date_published {
            recipe.date_published = date_published;
        }
        if let Some(image) = self.image {
            recipe.image = Some(image);
        }
        if let Some(ingredients) = self.ingredients {
            recipe.ingredients = ingredients;
        }
        if let Some(steps) = self.steps {
            recipe.steps = steps;
        }
        if let Some(prep_time_minutes) = self.prep_time_minutes {
            recipe.prep_time_minutes = prep_time_minutes;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample() -> Recipe {
        Recipe {
            id: "r1".to_string(),
            owner: None,
            title: "Tea".to_string(),
            description: Some("Hot leaf juice".to_string()),
            author: "A".to_string(),
            date_published: "2024-01-01".to_string(),
            image: None,
            image_storage_id: None,
            ingredients: vec!["Water".to_string(), "Tea leaves".to_string()],
            steps: vec!["Boil water".to_string(), "Add leaves".to_string()],
            prep_time_minutes: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn apply_to_changes_only_supplied_fields() {
        let mut recipe = sample();
        let patch = RecipeUpdate {
            prep_time_minutes: Some(5),
            ..Default::default()
        };
        patch.apply_to(&mut recipe);

        assert_eq!(recipe.prep_time_minutes, 5);
        assert_eq!(recipe.title, "Tea");
        assert_eq!(recipe.steps.len(), 2);
        assert_eq!(recipe.description.as_deref(), Some("Hot leaf juice"));
    }

    #[test]
    fn apply_to_preserves_step_order() {
        let mut recipe = sample();
        let patch = RecipeUpdate {
            steps: Some(vec![
                "Warm the pot".to_string(),
                "Boil water".to_string(),
                "Add leaves".to_string(),
            ]),
            ..Default::default()
        };
        patch.apply_to(&mut recipe);

        assert_eq!(recipe.steps[0], "Warm the pot");
        assert_eq!(recipe.steps[2], "Add leaves");
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let mut recipe = sample();
        let before = recipe.clone();
        RecipeUpdate::default().apply_to(&mut recipe);
        assert_eq!(recipe, before);
    }
}
