//! External Provider Aggregator: satisficing search over the configured
//! providers in priority order.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::models::search::{is_any, DietaryPreference};
use crate::services::catalog::IngredientCatalog;
use crate::services::dish_type::DishTypeVerifier;
use crate::services::protein::{self, ProteinVerdict};
use crate::services::providers::{
    ConvertedRecipe, MealDbClient, Provider, ProviderError, SpoonacularClient,
};

/// A provider recipe that passed every validation gate.
#[derive(Debug, Clone)]
pub struct ProviderMatch {
    pub converted: ConvertedRecipe,
    pub provider: &'static str,
    pub verdict: ProteinVerdict,
}

pub struct ProviderAggregator {
    providers: Vec<Provider>,
    catalog: Arc<IngredientCatalog>,
    dish_types: Arc<DishTypeVerifier>,
    timeout: Duration,
    limit: usize,
}

impl ProviderAggregator {
    pub fn new(
        providers: Vec<Provider>,
        catalog: Arc<IngredientCatalog>,
        dish_types: Arc<DishTypeVerifier>,
        timeout: Duration,
        limit: usize,
    ) -> Self {
        Self {
            providers,
            catalog,
            dish_types,
            timeout,
            limit: limit.max(1),
        }
    }

    /// Providers in static priority order: Spoonacular (when a key is set),
    /// then TheMealDB (unless disabled).
    pub fn from_config(
        config: &AppConfig,
        catalog: Arc<IngredientCatalog>,
        dish_types: Arc<DishTypeVerifier>,
    ) -> Result<Self, ProviderError> {
        let timeout = Duration::from_secs(config.provider_timeout_secs);
        let mut providers = Vec::new();

        if let Some(key) = config.spoonacular_api_key.as_deref().filter(|k| !k.is_empty()) {
            providers.push(Provider::Spoonacular(SpoonacularClient::new(
                &config.spoonacular_base_url,
                key,
                timeout,
            )?));
        }
        if config.mealdb_enabled {
            providers.push(Provider::MealDb(MealDbClient::new(
                &config.mealdb_base_url,
                &config.mealdb_api_key,
                timeout,
            )?));
        }

        tracing::info!(
            providers = ?providers.iter().map(Provider::name).collect::<Vec<_>>(),
            timeout_secs = config.provider_timeout_secs,
            "Configured recipe providers"
        );

        Ok(Self::new(
            providers,
            catalog,
            dish_types,
            timeout,
            config.provider_result_limit,
        ))
    }

    /// Return the first candidate that passes the protein, dish-type and
    /// cuisine gates.
    ///
    /// Within one provider's batch a full protein match returns at once; a
    /// partial match is held and returned only if the batch has nothing
    /// better. Failures of one provider move on to the next.
    pub async fn search(
        &self,
        category: &str,
        ingredients: &[String],
        dish_type: &str,
        preference: DietaryPreference,
    ) -> Option<ProviderMatch> {
        for provider in &self.providers {
            let name = provider.name();

            let summaries = match self
                .bounded(name, provider.search(category, ingredients, self.limit))
                .await
            {
                Ok(summaries) => summaries,
                Err(e) => {
                    record_failure(name, &e);
                    continue;
                }
            };

            let survivors: Vec<_> = summaries
                .into_iter()
                .filter(|s| provider.is_acceptable_quality(s))
                .collect();
            tracing::debug!(
                provider = name,
                category = %category,
                candidates = survivors.len(),
                "Provider candidates after quality filter"
            );

            let mut partial: Option<ProviderMatch> = None;

            for summary in survivors {
                // A failed or slow lookup abandons this provider; a missing id
                // or a conversion failure skips a single candidate.
                let raw = match self.bounded(name, provider.get_details(&summary.id)).await {
                    Ok(raw) => raw,
                    Err(ProviderError::NotFound { .. }) => {
                        tracing::debug!(provider = name, id = %summary.id, "Provider candidate vanished before lookup");
                        continue;
                    }
                    Err(e) => {
                        record_failure(name, &e);
                        break;
                    }
                };

                let converted = match provider.convert(raw, &self.catalog) {
                    Ok(converted) => converted,
                    Err(e) => {
                        tracing::warn!(provider = name, id = %summary.id, error = %e, "Provider recipe conversion failed");
                        continue;
                    }
                };

                let Some(verdict) = self.validate(&converted, category, ingredients, dish_type, preference)
                else {
                    continue;
                };

                let found = ProviderMatch {
                    converted,
                    provider: name,
                    verdict,
                };
                if found.verdict.is_full() {
                    tracing::info!(provider = name, recipe_id = %found.converted.recipe.id, "Provider match");
                    return Some(found);
                }
                if partial.is_none() {
                    partial = Some(found);
                }
            }

            if let Some(found) = partial {
                tracing::info!(
                    provider = name,
                    recipe_id = %found.converted.recipe.id,
                    matched = found.verdict.match_size(),
                    "Provider partial protein match"
                );
                return Some(found);
            }
        }

        None
    }

    fn validate(
        &self,
        converted: &ConvertedRecipe,
        category: &str,
        ingredients: &[String],
        dish_type: &str,
        preference: DietaryPreference,
    ) -> Option<ProteinVerdict> {
        let recipe = &converted.recipe;

        let verdict = protein::evaluate(&self.catalog, ingredients, recipe.ingredient_slugs(), preference);
        if let ProteinVerdict::Rejected(reason) = &verdict {
            tracing::debug!(recipe_id = %recipe.id, reason = %reason, "Provider candidate rejected");
            return None;
        }

        if !is_any(dish_type) {
            let dish = self
                .dish_types
                .verify(recipe, dish_type, converted.authoritative_dish_type);
            if !dish.accepted {
                tracing::debug!(
                    recipe_id = %recipe.id,
                    score = dish.score,
                    requested = %dish_type,
                    "Provider candidate failed dish-type check"
                );
                return None;
            }
        }

        let term = category.to_lowercase();
        let cuisine_ok =
            converted.cuisines.is_empty() || converted.cuisines.iter().any(|c| c.contains(&term));
        if !cuisine_ok {
            tracing::debug!(recipe_id = %recipe.id, cuisines = ?converted.cuisines, "Provider candidate cuisine mismatch");
            return None;
        }

        Some(verdict)
    }

    /// Apply the per-call timeout. Dropping the inner future abandons the request.
    async fn bounded<T>(
        &self,
        provider: &'static str,
        call: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ProviderError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                provider,
                after: self.timeout,
            }),
        }
    }
}

fn record_failure(provider: &'static str, error: &ProviderError) {
    tracing::warn!(provider, error = %error, "Provider unavailable, trying next");
    metrics::counter!("provider_failures_total", "provider" => provider).increment(1);
}
