//! Recipe quality scoring (0-100) from completeness and technique signals.

use sqlx::SqlitePool;

use crate::db::recipe_queries;
use crate::models::recipe::Recipe;

/// Sources whose recipes are editorially verified.
const TRUSTED_SOURCES: &[&str] = &["spoonacular", "tasty"];

const PRECISION_WORDS: &[&str] = &["temperature", "degrees", "minutes", "until golden", "until tender"];

const TECHNIQUE_WORDS: &[&str] = &["dice", "julienne", "sauté", "saute", "simmer", "fold", "whisk"];

/// Realistic total time bracket in minutes.
const REALISTIC_TIME: std::ops::RangeInclusive<u32> = 10..=180;

pub fn score_recipe(recipe: &Recipe) -> u8 {
    let mut score: u32 = 0;

    // ── Completeness ─────────────────────────────────────────────────
    match recipe.instructions.len() {
        n if n >= 5 => score += 15,
        n if n >= 3 => score += 8,
        _ => {}
    }
    if recipe.ingredients.len() >= 5 {
        score += 10;
    }
    let total = recipe.total_time();
    if total > 0 {
        score += 5;
    }
    if !recipe.cuisine.trim().is_empty() && !recipe.dish_type.trim().is_empty() {
        score += 10;
    }

    // ── Quality indicators ───────────────────────────────────────────
    let text = recipe.instructions.join(" ").to_lowercase();
    if PRECISION_WORDS.iter().any(|w| text.contains(w)) {
        score += 10;
    }
    if TECHNIQUE_WORDS.iter().any(|w| text.contains(w)) {
        score += 10;
    }
    if REALISTIC_TIME.contains(&total) {
        score += 10;
    }

    // ── Popularity and verification ──────────────────────────────────
    if recipe.times_served > 0 {
        score += (recipe.times_served.min(5) as u32) * 2;
    }
    if TRUSTED_SOURCES.contains(&recipe.source.to_lowercase().as_str()) {
        score += 10;
    }

    score.min(100) as u8
}

/// Totals from one pass over the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RescoreSummary {
    pub scanned: usize,
    pub updated: usize,
}

/// Recompute the quality score of every cached recipe, one page at a time.
/// Rows whose score is unchanged are not rewritten.
pub async fn rescore_cache(pool: &SqlitePool, page_size: u32) -> Result<RescoreSummary, sqlx::Error> {
    let mut summary = RescoreSummary::default();
    let mut after: Option<String> = None;

    loop {
        let mut conn = pool.acquire().await?;
        let page = recipe_queries::list_recipes(&mut conn, after.as_deref(), page_size.max(1)).await?;
        let Some(last) = page.last() else {
            break;
        };
        after = Some(last.id.clone());

        for recipe in &page {
            let score = score_recipe(recipe);
            if recipe_queries::update_quality_score(&mut conn, &recipe.id, score).await? {
                tracing::debug!(recipe_id = %recipe.id, from = recipe.quality_score, to = score, "Quality score updated");
                summary.updated += 1;
            }
        }
        summary.scanned += page.len();
    }

    Ok(summary)
}
