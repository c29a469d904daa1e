//! Alternative Suggestion Generator: verified near-matches offered when a
//! request cannot be resolved.

use std::collections::HashSet;

use crate::models::search::{is_any, Alternative, DietaryPreference, VerifiedBy};
use crate::services::aggregator::ProviderAggregator;
use crate::services::atlas::{display_cuisine, normalize_cuisine, CuisineAtlas};
use crate::services::catalog::IngredientCatalog;
use crate::services::local_cache::LocalCache;

pub const MAX_ALTERNATIVES: usize = 3;

/// Dish type named by the synthetic last-resort suggestion.
pub const SYNTHETIC_DISH_TYPE: &str = "simple";

// Confidence per source, local verification ranking above provider verification.
const SAME_CUISINE_LOCAL: f64 = 0.98;
const SAME_CUISINE_PROVIDER: f64 = 0.95;
const SISTER_LOCAL: f64 = 0.90;
const SISTER_PROVIDER: f64 = 0.85;
const AFFINITY_BASE: f64 = 0.5;
const AFFINITY_STEP: f64 = 0.15;
const AFFINITY_CAP: f64 = 0.95;

/// Affinity cuisines considered before giving up on source (c).
const MAX_AFFINITY_CUISINES: usize = 3;

/// The request being explained, with ingredients already canonicalized.
#[derive(Debug, Clone, Copy)]
pub struct AlternativeQuery<'a> {
    pub cuisine: &'a str,
    pub dish_type: &'a str,
    pub ingredients: &'a [String],
    pub preference: DietaryPreference,
}

pub struct AlternativeSuggester<'a> {
    pub cache: &'a LocalCache,
    pub aggregator: &'a ProviderAggregator,
    pub atlas: &'a CuisineAtlas,
    pub catalog: &'a IngredientCatalog,
    pub compat_threshold: f64,
    pub max_sisters: usize,
}

struct Verified {
    by: VerifiedBy,
    title: String,
}

impl AlternativeSuggester<'_> {
    /// Up to three verified alternatives; never empty.
    pub async fn suggest(&self, query: AlternativeQuery<'_>) -> Vec<Alternative> {
        let cuisine = normalize_cuisine(query.cuisine);
        let requested_dish = query.dish_type.trim().to_lowercase();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        seen.insert((cuisine.clone(), requested_dish.clone()));
        let mut found: Vec<Alternative> = Vec::new();

        // (a) other dish types already cached for this cuisine
        let exclude = (!is_any(&requested_dish)).then_some(requested_dish.as_str());
        let cached_types = match self.cache.dish_types_for(&cuisine, exclude).await {
            Ok(types) => types,
            Err(e) => {
                tracing::warn!(error = %e, "Could not list cached dish types");
                Vec::new()
            }
        };
        for (dish_type, _) in cached_types {
            if found.len() >= MAX_ALTERNATIVES {
                return found;
            }
            if !seen.insert((cuisine.clone(), dish_type.clone())) {
                continue;
            }
            if let Some(v) = self.verify(&cuisine, &dish_type, query).await {
                let confidence = match v.by {
                    VerifiedBy::LocalCache => SAME_CUISINE_LOCAL,
                    VerifiedBy::Provider => SAME_CUISINE_PROVIDER,
                };
                found.push(alternative(
                    &cuisine,
                    &dish_type,
                    format!("{} {} with your ingredients", display_cuisine(&cuisine), dish_label(&dish_type)),
                    confidence,
                    v,
                ));
            }
        }

        // (b) the requested dish under sister cuisines
        for sister in self.atlas.sisters_of(&cuisine).into_iter().take(self.max_sisters) {
            if found.len() >= MAX_ALTERNATIVES {
                return found;
            }
            if !seen.insert((sister.clone(), requested_dish.clone())) {
                continue;
            }
            if let Some(v) = self.verify(&sister, &requested_dish, query).await {
                let confidence = match v.by {
                    VerifiedBy::LocalCache => SISTER_LOCAL,
                    VerifiedBy::Provider => SISTER_PROVIDER,
                };
                found.push(alternative(
                    &sister,
                    &requested_dish,
                    format!(
                        "{} {} is a close regional match",
                        display_cuisine(&sister),
                        dish_label(&requested_dish)
                    ),
                    confidence,
                    v,
                ));
            }
        }

        // (c) cuisines the ingredients point to, when they fit the request poorly
        if !self
            .catalog
            .compatible_with(query.ingredients, &cuisine, self.compat_threshold)
        {
            let affinities = self.catalog.affinity_scores(query.ingredients);
            for (other, score) in affinities
                .into_iter()
                .filter(|(c, _)| *c != cuisine)
                .take(MAX_AFFINITY_CUISINES)
            {
                if found.len() >= MAX_ALTERNATIVES {
                    return found;
                }
                if !seen.insert((other.clone(), requested_dish.clone())) {
                    continue;
                }
                if let Some(v) = self.verify(&other, &requested_dish, query).await {
                    let confidence = (AFFINITY_BASE + AFFINITY_STEP * score as f64).min(AFFINITY_CAP);
                    found.push(alternative(
                        &other,
                        &requested_dish,
                        format!("Your ingredients are common in {} cooking", display_cuisine(&other)),
                        confidence,
                        v,
                    ));
                }
            }
        }

        if found.is_empty() {
            found.push(Alternative {
                cuisine,
                dish_type: SYNTHETIC_DISH_TYPE.to_string(),
                reason: "We'll create a custom recipe just for you".to_string(),
                confidence: 1.0,
                preview_title: None,
                verified_by: None,
                synthetic: true,
            });
        }
        found.truncate(MAX_ALTERNATIVES);
        found
    }

    /// Check the cache first, then the providers under the cuisine's category.
    async fn verify(
        &self,
        cuisine: &str,
        dish_type: &str,
        query: AlternativeQuery<'_>,
    ) -> Option<Verified> {
        match self
            .cache
            .find(cuisine, dish_type, query.ingredients, query.preference)
            .await
        {
            Ok(Some(hit)) => {
                return Some(Verified {
                    by: VerifiedBy::LocalCache,
                    title: hit.recipe.title,
                })
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(cuisine = %cuisine, error = %e, "Cache check for alternative failed"),
        }

        let category = self.category_for(cuisine)?;
        self.aggregator
            .search(&category, query.ingredients, dish_type, query.preference)
            .await
            .map(|m| Verified {
                by: VerifiedBy::Provider,
                title: m.converted.recipe.title,
            })
    }

    fn category_for(&self, cuisine: &str) -> Option<String> {
        if self.atlas.is_provider_category(cuisine) {
            return Some(display_cuisine(&normalize_cuisine(cuisine)));
        }
        self.atlas.provider_category_of(cuisine).map(str::to_string)
    }
}

fn dish_label(dish_type: &str) -> String {
    if is_any(dish_type) {
        "dishes".to_string()
    } else {
        dish_type.replace('-', " ")
    }
}

fn alternative(cuisine: &str, dish_type: &str, reason: String, confidence: f64, v: Verified) -> Alternative {
    Alternative {
        cuisine: cuisine.to_string(),
        dish_type: dish_type.to_string(),
        reason,
        confidence,
        preview_title: Some(v.title),
        verified_by: Some(v.by),
        synthetic: false,
    }
}
