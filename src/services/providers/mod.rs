//! External recipe providers.
//!
//! Each provider is one variant of a closed set: its search summaries and
//! detail payloads are typed per provider, and conversion into the
//! canonical [`Recipe`] goes through [`IntoRecipe`].

pub mod spoonacular;
pub mod themealdb;

use std::time::Duration;

use crate::models::recipe::Recipe;
use crate::services::catalog::IngredientCatalog;

pub use spoonacular::{SpoonacularClient, SpoonacularRecipe};
pub use themealdb::{MealDbClient, MealDbMeal};

/// Error type for provider request failures (network, timeout, bad payload).
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request to {provider} failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} did not answer within {after:?}")]
    Timeout {
        provider: &'static str,
        after: Duration,
    },

    #[error("{provider} returned HTTP {status}")]
    Status { provider: &'static str, status: u16 },

    #[error("{provider} has no recipe with id {id}")]
    NotFound { provider: &'static str, id: String },
}

/// A provider payload that could not be mapped to the canonical recipe shape.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Payload is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Recipe '{0}' lists no usable ingredients")]
    NoIngredients(String),
}

/// One search hit, before details are fetched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSummary {
    pub id: String,
    pub title: String,
    /// Provider rating, 0-100
    pub score: Option<f64>,
    pub likes: Option<i64>,
    pub ready_in_minutes: Option<u32>,
    pub ingredient_count: Option<usize>,
}

/// Full detail payload, tagged by provider.
#[derive(Debug, Clone)]
pub enum RawPayload {
    Spoonacular(Box<SpoonacularRecipe>),
    MealDb(Box<MealDbMeal>),
}

/// Output of a provider converter.
#[derive(Debug, Clone)]
pub struct ConvertedRecipe {
    pub recipe: Recipe,
    /// The converter inferred `dish_type` with high confidence
    pub authoritative_dish_type: bool,
    /// Lower-cased cuisines the provider attributes to the recipe
    pub cuisines: Vec<String>,
}

/// Provider-specific mapping into the canonical recipe shape.
pub trait IntoRecipe {
    fn into_recipe(self, catalog: &IngredientCatalog) -> Result<ConvertedRecipe, ConversionError>;
}

impl IntoRecipe for RawPayload {
    fn into_recipe(self, catalog: &IngredientCatalog) -> Result<ConvertedRecipe, ConversionError> {
        match self {
            RawPayload::Spoonacular(recipe) => recipe.into_recipe(catalog),
            RawPayload::MealDb(meal) => meal.into_recipe(catalog),
        }
    }
}

/// Configured providers, queried by the aggregator in list order.
pub enum Provider {
    Spoonacular(SpoonacularClient),
    MealDb(MealDbClient),
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Spoonacular(_) => spoonacular::PROVIDER_NAME,
            Provider::MealDb(_) => themealdb::PROVIDER_NAME,
        }
    }

    pub async fn search(
        &self,
        category: &str,
        ingredients: &[String],
        limit: usize,
    ) -> Result<Vec<CandidateSummary>, ProviderError> {
        match self {
            Provider::Spoonacular(client) => client.search(category, ingredients, limit).await,
            Provider::MealDb(client) => client.search(category, ingredients, limit).await,
        }
    }

    pub fn is_acceptable_quality(&self, summary: &CandidateSummary) -> bool {
        match self {
            Provider::Spoonacular(_) => spoonacular::is_acceptable_quality(summary),
            Provider::MealDb(_) => themealdb::is_acceptable_quality(summary),
        }
    }

    pub async fn get_details(&self, id: &str) -> Result<RawPayload, ProviderError> {
        match self {
            Provider::Spoonacular(client) => client
                .get_details(id)
                .await
                .map(|r| RawPayload::Spoonacular(Box::new(r))),
            Provider::MealDb(client) => client
                .get_details(id)
                .await
                .map(|m| RawPayload::MealDb(Box::new(m))),
        }
    }

    pub fn convert(
        &self,
        raw: RawPayload,
        catalog: &IngredientCatalog,
    ) -> Result<ConvertedRecipe, ConversionError> {
        raw.into_recipe(catalog)
    }
}

/// Shared HTTP client construction: every provider call carries a timeout.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(concat!("recipe-cascade/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
}

/// Split `minutes` of total time into (prep, cook), prep capped at 30.
pub(crate) fn split_total_time(total: u32) -> (u32, u32) {
    let prep = (total / 3).min(30);
    (prep, total - prep)
}

/// Build canonical ingredients from (name, amount) pairs, skipping blank names.
pub(crate) fn canonical_ingredients<'a>(
    catalog: &IngredientCatalog,
    lines: impl IntoIterator<Item = (&'a str, String)>,
) -> Vec<crate::models::recipe::RecipeIngredient> {
    lines
        .into_iter()
        .filter(|(name, _)| !name.trim().is_empty())
        .map(|(name, amount)| crate::models::recipe::RecipeIngredient {
            slug: catalog.canonical_slug(name),
            name: name.trim().to_string(),
            amount,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_total_time() {
        assert_eq!(split_total_time(45), (15, 30));
        assert_eq!(split_total_time(150), (30, 120));
        assert_eq!(split_total_time(0), (0, 0));
    }
}
