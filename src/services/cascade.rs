//! Cascade Orchestrator.
//!
//! Tries four levels in strict order and stops at the first validated
//! recipe: the local cache, the providers under the cuisine's own category,
//! sister cuisines from the atlas, and finally the generative chef. Recipes
//! found at levels 2-4 are written back to the cache.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::recipe::{CascadeLevel, Provenance, Recipe};
use crate::models::search::{is_any, SearchRequest, SearchResult};
use crate::services::aggregator::ProviderAggregator;
use crate::services::alternatives::{AlternativeQuery, AlternativeSuggester};
use crate::services::atlas::{display_cuisine, normalize_cuisine, CuisineAtlas};
use crate::services::catalog::{slugify, IngredientCatalog};
use crate::services::generator::{GenerationError, RecipeGenerator};
use crate::services::local_cache::LocalCache;
use crate::services::quality::score_recipe;

/// Dish type stored for generated recipes when the request said "any".
const FALLBACK_DISH_TYPE: &str = "main-course";

/// Aromatics that mark a request as Southeast Asian in flavour.
const SOUTHEAST_ASIAN_AROMATICS: &[&str] =
    &["lemongrass", "galangal", "fish_sauce", "coconut_milk", "thai_basil", "kaffir_lime"];

#[derive(Debug, Clone, Copy)]
pub struct ResolverSettings {
    /// Share of cuisine-specific ingredients allowed to misfit a cuisine
    /// before it is skipped as a category or sister
    pub compat_threshold: f64,
    pub max_sister_cuisines: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            compat_threshold: 0.5,
            max_sister_cuisines: 5,
        }
    }
}

impl ResolverSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            compat_threshold: config.sister_compat_threshold,
            max_sister_cuisines: config.max_sister_cuisines,
        }
    }
}

pub struct Resolver<G: RecipeGenerator> {
    cache: LocalCache,
    aggregator: ProviderAggregator,
    atlas: Arc<CuisineAtlas>,
    catalog: Arc<IngredientCatalog>,
    generator: G,
    settings: ResolverSettings,
}

impl<G: RecipeGenerator> Resolver<G> {
    pub fn new(
        cache: LocalCache,
        aggregator: ProviderAggregator,
        atlas: Arc<CuisineAtlas>,
        catalog: Arc<IngredientCatalog>,
        generator: G,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            cache,
            aggregator,
            atlas,
            catalog,
            generator,
            settings,
        }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Resolve a request to a recipe with provenance, or an unresolved
    /// explanation with alternatives. Never fails.
    pub async fn resolve(&self, request: &SearchRequest) -> SearchResult {
        let span = tracing::info_span!(
            "resolve",
            request_id = %Uuid::new_v4(),
            cuisine = %request.cuisine,
            dish_type = %request.dish_type,
        );
        let started = Instant::now();

        let result = self.run(request).instrument(span).await;

        metrics::histogram!("cascade_resolve_seconds").record(started.elapsed().as_secs_f64());
        match &result {
            SearchResult::Resolved { provenance, .. } => {
                metrics::counter!("cascade_resolutions_total", "level" => provenance.level.to_string())
                    .increment(1);
            }
            SearchResult::Unresolved { .. } => {
                metrics::counter!("cascade_unresolved_total").increment(1);
            }
        }
        result
    }

    async fn run(&self, request: &SearchRequest) -> SearchResult {
        let cuisine = request.cuisine.trim();
        let dish_type = request.dish_type.trim();
        let preference = request.dietary_preference;
        let slugs = self.canonical_slugs(&request.ingredients);
        tracing::info!(ingredients = ?slugs, preference = %preference, "Resolving recipe");

        // ── Level 1: local cache ─────────────────────────────────────────
        match self.cache.serve(cuisine, dish_type, &slugs, preference).await {
            Ok(Some(hit)) => {
                tracing::info!(recipe_id = %hit.recipe.id, partial = hit.partial, "Resolved from local cache");
                return resolved(hit.recipe, CascadeLevel::Local, None);
            }
            Ok(None) => tracing::debug!("Local cache miss"),
            Err(e) => tracing::warn!(error = %e, "Local cache lookup failed, continuing"),
        }

        // A category is queried at most once per request across levels 2 and 3.
        let mut tried_categories: HashSet<String> = HashSet::new();

        // ── Level 2: providers under the cuisine's own category ─────────
        for category in self.direct_categories(cuisine, &slugs) {
            if !tried_categories.insert(normalize_cuisine(&category)) {
                continue;
            }
            tracing::debug!(category = %category, "Querying providers");
            if let Some(found) = self
                .aggregator
                .search(&category, &slugs, dish_type, preference)
                .await
            {
                let recipe = self
                    .write_back(found.converted.recipe, cuisine, dish_type)
                    .await;
                tracing::info!(recipe_id = %recipe.id, provider = found.provider, "Resolved from provider");
                return resolved(recipe, CascadeLevel::DirectProvider, None);
            }
        }

        // ── Level 3: sister cuisines ─────────────────────────────────────
        if self.atlas.contains(cuisine) {
            for sister in self.eligible_sisters(cuisine, &slugs) {
                let note = format!("Similar {} recipe", display_cuisine(&sister));

                match self.cache.serve(&sister, dish_type, &slugs, preference).await {
                    Ok(Some(hit)) => {
                        tracing::info!(sister = %sister, recipe_id = %hit.recipe.id, "Resolved from sister cuisine cache");
                        return resolved(hit.recipe, CascadeLevel::SisterCuisine, Some(note));
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!(sister = %sister, error = %e, "Sister cache lookup failed"),
                }

                let Some(category) = self.category_for(&sister) else {
                    continue;
                };
                if !tried_categories.insert(normalize_cuisine(&category)) {
                    continue;
                }
                if let Some(found) = self
                    .aggregator
                    .search(&category, &slugs, dish_type, preference)
                    .await
                {
                    let recipe = self
                        .write_back(found.converted.recipe, &sister, dish_type)
                        .await;
                    tracing::info!(sister = %sister, recipe_id = %recipe.id, "Resolved from sister cuisine provider");
                    return resolved(recipe, CascadeLevel::SisterCuisine, Some(note));
                }
            }
        } else {
            tracing::debug!("Cuisine not in atlas, skipping sister cuisines");
        }

        // ── Level 4: generative chef ─────────────────────────────────────
        let names: Vec<String> = slugs.iter().map(|s| self.catalog.display_name(s)).collect();
        match self.generator.generate(cuisine, dish_type, &names).await {
            Ok(mut recipe) => {
                let stored = self.write_back(recipe.clone(), cuisine, dish_type).await;
                recipe.id = stored.id;
                recipe.quality_score = stored.quality_score;
                tracing::info!(recipe_id = %recipe.id, "Resolved by generation");
                resolved(recipe, CascadeLevel::Generative, None)
            }
            Err(e) => {
                tracing::error!(error = %e, "Recipe generation failed, returning unresolved");
                let suggester = AlternativeSuggester {
                    cache: &self.cache,
                    aggregator: &self.aggregator,
                    atlas: &self.atlas,
                    catalog: &self.catalog,
                    compat_threshold: self.settings.compat_threshold,
                    max_sisters: self.settings.max_sister_cuisines,
                };
                let alternatives = suggester
                    .suggest(AlternativeQuery {
                        cuisine,
                        dish_type,
                        ingredients: &slugs,
                        preference,
                    })
                    .await;
                SearchResult::Unresolved {
                    reason: self.failure_reason(cuisine, dish_type, &slugs, &e),
                    alternatives,
                }
            }
        }
    }

    /// Canonical, de-duplicated request slugs in request order.
    fn canonical_slugs(&self, ingredients: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        ingredients
            .iter()
            .map(|name| self.catalog.canonical_slug(name))
            .filter(|slug| !slug.is_empty())
            .filter(|slug| seen.insert(slug.clone()))
            .collect()
    }

    /// The cuisine itself when it is a provider category, then its atlas
    /// mapping when that differs and the ingredients suit the cuisine.
    fn direct_categories(&self, cuisine: &str, slugs: &[String]) -> Vec<String> {
        let mut categories = Vec::new();
        if self.atlas.is_provider_category(cuisine) {
            categories.push(display_cuisine(&normalize_cuisine(cuisine)));
        }
        if let Some(mapped) = self.atlas.provider_category_of(cuisine) {
            let differs = normalize_cuisine(mapped) != normalize_cuisine(cuisine);
            if differs
                && self
                    .catalog
                    .compatible_with(slugs, cuisine, self.settings.compat_threshold)
            {
                categories.push(mapped.to_string());
            } else if differs {
                tracing::debug!(category = %mapped, "Ingredients do not suit the cuisine, skipping mapped category");
            }
        }
        categories
    }

    fn eligible_sisters(&self, cuisine: &str, slugs: &[String]) -> Vec<String> {
        self.atlas
            .sisters_of(cuisine)
            .into_iter()
            .filter(|sister| {
                self.catalog
                    .compatible_with(slugs, sister, self.settings.compat_threshold)
            })
            .take(self.settings.max_sister_cuisines)
            .collect()
    }

    fn category_for(&self, cuisine: &str) -> Option<String> {
        if self.atlas.is_provider_category(cuisine) {
            return Some(display_cuisine(&normalize_cuisine(cuisine)));
        }
        self.atlas.provider_category_of(cuisine).map(str::to_string)
    }

    /// Persist a recipe under the cuisine and dish type it was found for.
    /// Failures are logged; the caller still gets the recipe.
    async fn write_back(&self, recipe: Recipe, cuisine: &str, dish_type: &str) -> Recipe {
        let mut stored = recipe;
        stored.id = write_back_id(&stored);
        stored.cuisine = normalize_cuisine(cuisine);
        if !is_any(dish_type) {
            stored.dish_type = dish_type.to_lowercase();
        } else if stored.dish_type.trim().is_empty() || is_any(&stored.dish_type) {
            stored.dish_type = FALLBACK_DISH_TYPE.to_string();
        }
        if stored.quality_score == 0 {
            stored.quality_score = score_recipe(&stored);
        }

        match self.cache.write(&stored).await {
            Ok(true) => metrics::counter!("cache_write_backs_total").increment(1),
            Ok(false) => {}
            Err(e) => tracing::warn!(recipe_id = %stored.id, error = %e, "Cache write-back failed"),
        }
        stored
    }

    fn failure_reason(
        &self,
        cuisine: &str,
        dish_type: &str,
        slugs: &[String],
        error: &GenerationError,
    ) -> String {
        let dish = dish_type.to_lowercase();
        let aromatics: Vec<String> = slugs
            .iter()
            .filter(|s| SOUTHEAST_ASIAN_AROMATICS.contains(&s.as_str()))
            .map(|s| self.catalog.display_name(s).to_lowercase())
            .collect();
        let savory: Vec<String> = slugs
            .iter()
            .filter(|s| self.catalog.is_protein(s) || self.catalog.is_meat(s))
            .map(|s| self.catalog.display_name(s).to_lowercase())
            .collect();

        let base = if dish == "baked-dish" && !aromatics.is_empty() {
            format!(
                "Baked dishes rarely use {}; these aromatics suit curries and stir-fries",
                aromatics.join(", ")
            )
        } else if dish == "dessert" && !savory.is_empty() {
            format!("Desserts don't usually include {}", savory.join(", "))
        } else if is_any(dish_type) {
            format!(
                "No {} recipes found with these specific ingredients",
                display_cuisine(&normalize_cuisine(cuisine))
            )
        } else {
            format!(
                "No {} {} recipes found with these specific ingredients",
                display_cuisine(&normalize_cuisine(cuisine)),
                dish.replace('-', " ")
            )
        };

        format!("{base} (recipe generation failed: {error})")
    }
}

fn resolved(recipe: Recipe, level: CascadeLevel, note: Option<String>) -> SearchResult {
    SearchResult::Resolved {
        recipe,
        provenance: Provenance::new(level, note),
    }
}

/// Provider-prefixed id, synthesized from the title when the source gave none.
fn write_back_id(recipe: &Recipe) -> String {
    let source = slugify(&recipe.source);
    let source = if source.is_empty() { "unknown".to_string() } else { source };
    let id = recipe.id.trim();
    if id.is_empty() {
        format!(
            "{source}_{}_{}",
            slugify(&recipe.title),
            chrono::Utc::now().timestamp()
        )
    } else if id.starts_with(&format!("{source}_")) {
        id.to_string()
    } else {
        format!("{source}_{id}")
    }
}
