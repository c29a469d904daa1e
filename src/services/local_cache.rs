//! Local Cache Store: protein- and dish-type-aware queries over previously
//! resolved recipes, plus idempotent write-back.

use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;

use crate::db::recipe_queries;
use crate::models::recipe::Recipe;
use crate::models::search::{is_any, DietaryPreference};
use crate::services::atlas::normalize_cuisine;
use crate::services::catalog::IngredientCatalog;
use crate::services::protein::{self, ProteinVerdict};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Includes rows whose embedded ingredient/instruction JSON fails to decode.
    #[error("Recipe cache query failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// A protein-validated cache result.
#[derive(Debug, Clone)]
pub struct CacheHit {
    pub recipe: Recipe,
    pub verdict: ProteinVerdict,
    /// Found by ingredient overlap rather than the exact query
    pub partial: bool,
    pub ingredient_matches: Option<i64>,
}

#[derive(Clone)]
pub struct LocalCache {
    pool: SqlitePool,
    catalog: Arc<IngredientCatalog>,
    candidate_limit: u32,
}

impl LocalCache {
    pub fn new(pool: SqlitePool, catalog: Arc<IngredientCatalog>, candidate_limit: u32) -> Self {
        Self {
            pool,
            catalog,
            candidate_limit: candidate_limit.max(1),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Look up the best cached recipe without touching its popularity counter.
    ///
    /// Tries the exact query first (cuisine, dish type, every requested
    /// ingredient present after family expansion), then an overlap-ranked
    /// partial query. Both are protein-validated; among accepted candidates
    /// the one matching the most requested proteins wins, SQL order breaking ties.
    pub async fn find(
        &self,
        cuisine: &str,
        dish_type: &str,
        ingredients: &[String],
        preference: DietaryPreference,
    ) -> Result<Option<CacheHit>, CacheError> {
        let cuisine = normalize_cuisine(cuisine);
        let dish_type = (!is_any(dish_type)).then(|| dish_type.trim().to_lowercase());
        let groups: Vec<Vec<String>> = ingredients.iter().map(|s| self.catalog.expand(s)).collect();

        let mut conn = self.pool.acquire().await?;

        let exact = recipe_queries::find_exact(
            &mut conn,
            &cuisine,
            dish_type.as_deref(),
            &groups,
            self.candidate_limit,
        )
        .await?;
        tracing::debug!(cuisine = %cuisine, candidates = exact.len(), "Exact cache candidates");

        let candidates = exact.into_iter().map(|r| (r, None)).collect();
        if let Some((recipe, _, verdict)) = self.best_candidate(candidates, ingredients, preference) {
            return Ok(Some(CacheHit {
                recipe,
                verdict,
                partial: false,
                ingredient_matches: None,
            }));
        }

        if ingredients.is_empty() {
            return Ok(None);
        }

        let mut seen = HashSet::new();
        let expanded: Vec<String> = groups
            .into_iter()
            .flatten()
            .filter(|slug| seen.insert(slug.clone()))
            .collect();

        let partial = recipe_queries::find_partial(
            &mut conn,
            &cuisine,
            dish_type.as_deref(),
            &expanded,
            self.candidate_limit,
        )
        .await?;
        tracing::debug!(cuisine = %cuisine, candidates = partial.len(), "Partial cache candidates");

        let candidates = partial
            .into_iter()
            .map(|m| (m.recipe, Some(m.ingredient_matches)))
            .collect();

        Ok(self
            .best_candidate(candidates, ingredients, preference)
            .map(|(recipe, ingredient_matches, verdict)| CacheHit {
                recipe,
                verdict,
                partial: true,
                ingredient_matches,
            }))
    }

    /// Find the best recipe and count it as served. The returned recipe
    /// carries the incremented `times_served`.
    pub async fn serve(
        &self,
        cuisine: &str,
        dish_type: &str,
        ingredients: &[String],
        preference: DietaryPreference,
    ) -> Result<Option<CacheHit>, CacheError> {
        let Some(mut hit) = self.find(cuisine, dish_type, ingredients, preference).await? else {
            return Ok(None);
        };

        let mut conn = self.pool.acquire().await?;
        match recipe_queries::serve_recipe(&mut conn, &hit.recipe.id).await? {
            Some(updated) => {
                hit.recipe = updated;
                Ok(Some(hit))
            }
            None => Ok(None),
        }
    }

    /// Upsert keyed by recipe id. Returns `false` when the id was already
    /// cached; duplicates are never an error.
    pub async fn write(&self, recipe: &Recipe) -> Result<bool, CacheError> {
        let mut tx = self.pool.begin().await?;
        let inserted = recipe_queries::insert_recipe(&mut tx, recipe).await?;
        tx.commit().await?;

        if inserted {
            tracing::info!(recipe_id = %recipe.id, cuisine = %recipe.cuisine, "Recipe written to cache");
        } else {
            tracing::debug!(recipe_id = %recipe.id, "Recipe already cached, write skipped");
        }
        Ok(inserted)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Recipe>, CacheError> {
        let mut conn = self.pool.acquire().await?;
        Ok(recipe_queries::get_recipe(&mut conn, id).await?)
    }

    /// Dish types cached for a cuisine, most common first.
    pub async fn dish_types_for(
        &self,
        cuisine: &str,
        exclude: Option<&str>,
    ) -> Result<Vec<(String, i64)>, CacheError> {
        let mut conn = self.pool.acquire().await?;
        Ok(recipe_queries::dish_type_counts(&mut conn, &normalize_cuisine(cuisine), exclude).await?)
    }

    pub async fn count(&self) -> Result<i64, CacheError> {
        let mut conn = self.pool.acquire().await?;
        Ok(recipe_queries::count_recipes(&mut conn).await?)
    }

    fn best_candidate(
        &self,
        candidates: Vec<(Recipe, Option<i64>)>,
        requested: &[String],
        preference: DietaryPreference,
    ) -> Option<(Recipe, Option<i64>, ProteinVerdict)> {
        let mut best: Option<(Recipe, Option<i64>, ProteinVerdict)> = None;

        for (recipe, matches) in candidates {
            let verdict = protein::evaluate(
                &self.catalog,
                requested,
                recipe.ingredient_slugs(),
                preference,
            );
            if let ProteinVerdict::Rejected(reason) = &verdict {
                tracing::debug!(recipe_id = %recipe.id, reason = %reason, "Cache candidate rejected");
                continue;
            }
            let better = best
                .as_ref()
                .is_none_or(|(_, _, current)| verdict.match_size() > current.match_size());
            if better {
                best = Some((recipe, matches, verdict));
            }
        }

        best
    }
}
