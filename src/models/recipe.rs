use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// One ingredient line of a recipe, joined to the catalog by `slug`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub amount: String,
}

/// Canonical recipe shape shared by the cache, the provider converters and
/// the generative chef.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Globally unique, provider-prefixed (e.g. `themealdb_52772`)
    pub id: String,
    pub title: String,
    pub cuisine: String,
    pub dish_type: String,
    pub ingredients: Vec<RecipeIngredient>,
    pub instructions: Vec<String>,
    /// Minutes
    pub prep_time: u32,
    /// Minutes
    pub cook_time: u32,
    pub servings: u32,
    pub source: String,
    /// 0-100
    pub quality_score: u8,
    #[serde(default)]
    pub times_served: i64,
}

impl Recipe {
    pub fn total_time(&self) -> u32 {
        self.prep_time.saturating_add(self.cook_time)
    }

    pub fn ingredient_slugs(&self) -> impl Iterator<Item = &str> {
        self.ingredients.iter().map(|i| i.slug.as_str())
    }
}

/// The four resolution levels, in the order they are tried.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CascadeLevel {
    Local = 1,
    DirectProvider = 2,
    SisterCuisine = 3,
    Generative = 4,
}

impl CascadeLevel {
    pub fn number(self) -> u8 {
        self as u8
    }
}

/// Which level produced a result, plus an optional substitution note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub level: u8,
    pub stage: CascadeLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Provenance {
    pub fn new(stage: CascadeLevel, note: Option<String>) -> Self {
        Self {
            level: stage.number(),
            stage,
            note,
        }
    }
}
