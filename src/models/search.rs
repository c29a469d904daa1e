use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::recipe::{Provenance, Recipe};

/// Dish type value that disables dish-type filtering.
pub const ANY_DISH_TYPE: &str = "any";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DietaryPreference {
    /// Meat is rejected only when the request names no protein.
    #[default]
    PreferVegetarian,
    /// Meat is always rejected.
    Vegetarian,
}

/// Inbound resolution request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchRequest {
    #[garde(length(min = 1, max = 64))]
    pub cuisine: String,

    #[garde(length(min = 1, max = 64))]
    #[serde(default = "default_dish_type")]
    pub dish_type: String,

    #[garde(length(max = 20), inner(length(min = 1, max = 64)))]
    #[serde(default)]
    pub ingredients: Vec<String>,

    #[garde(skip)]
    #[serde(default)]
    pub dietary_preference: DietaryPreference,
}

fn default_dish_type() -> String {
    ANY_DISH_TYPE.to_string()
}

impl SearchRequest {
    pub fn new(cuisine: &str, dish_type: &str, ingredients: &[&str]) -> Self {
        Self {
            cuisine: cuisine.to_string(),
            dish_type: dish_type.to_string(),
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
            dietary_preference: DietaryPreference::default(),
        }
    }

    pub fn with_preference(mut self, preference: DietaryPreference) -> Self {
        self.dietary_preference = preference;
        self
    }

    pub fn is_any_dish_type(&self) -> bool {
        is_any(&self.dish_type)
    }
}

pub fn is_any(dish_type: &str) -> bool {
    dish_type.trim().eq_ignore_ascii_case(ANY_DISH_TYPE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifiedBy {
    LocalCache,
    Provider,
}

/// A verified (or, as a last resort, synthetic) near-match offered when
/// resolution fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub cuisine: String,
    pub dish_type: String,
    pub reason: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<VerifiedBy>,
    #[serde(default)]
    pub synthetic: bool,
}

/// The only two caller-visible outcomes of a resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchResult {
    Resolved {
        recipe: Recipe,
        provenance: Provenance,
    },
    Unresolved {
        reason: String,
        alternatives: Vec<Alternative>,
    },
}

impl SearchResult {
    pub fn recipe(&self) -> Option<&Recipe> {
        match self {
            Self::Resolved { recipe, .. } => Some(recipe),
            Self::Unresolved { .. } => None,
        }
    }

    pub fn provenance(&self) -> Option<&Provenance> {
        match self {
            Self::Resolved { provenance, .. } => Some(provenance),
            Self::Unresolved { .. } => None,
        }
    }
}
