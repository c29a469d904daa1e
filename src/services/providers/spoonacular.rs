//! Spoonacular recipe API client and converter.
//!
//! Endpoints: `/recipes/complexSearch` for candidates and
//! `/recipes/{id}/information` for details.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;

use super::{
    canonical_ingredients, http_client, split_total_time, CandidateSummary, ConversionError,
    ConvertedRecipe, IntoRecipe, ProviderError,
};
use crate::models::recipe::Recipe;
use crate::services::catalog::IngredientCatalog;

pub const PROVIDER_NAME: &str = "spoonacular";

/// Minimum spoonacularScore (0-100) for a candidate to be fetched.
const MIN_SCORE: f64 = 70.0;
const MIN_LIKES: i64 = 1;
/// Skip recipes taking three hours or more.
const MAX_READY_MINUTES: u32 = 180;
const MIN_INGREDIENTS: usize = 3;

const DEFAULT_PREP_MINUTES: u32 = 15;
const DEFAULT_COOK_MINUTES: u32 = 30;
const DEFAULT_SERVINGS: u32 = 4;

// ── Payloads ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    id: i64,
    title: String,
    spoonacular_score: Option<f64>,
    aggregate_likes: Option<i64>,
    ready_in_minutes: Option<u32>,
    extended_ingredients: Option<Vec<serde_json::Value>>,
    used_ingredient_count: Option<usize>,
    missed_ingredient_count: Option<usize>,
}

impl From<SearchResult> for CandidateSummary {
    fn from(r: SearchResult) -> Self {
        let ingredient_count = match (&r.extended_ingredients, r.used_ingredient_count, r.missed_ingredient_count) {
            (Some(list), _, _) => Some(list.len()),
            (None, None, None) => None,
            (None, used, missed) => Some(used.unwrap_or(0) + missed.unwrap_or(0)),
        };
        CandidateSummary {
            id: r.id.to_string(),
            title: r.title,
            score: r.spoonacular_score,
            likes: r.aggregate_likes,
            ready_in_minutes: r.ready_in_minutes,
            ingredient_count,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpoonacularRecipe {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub cuisines: Vec<String>,
    #[serde(default)]
    pub dish_types: Vec<String>,
    #[serde(default)]
    pub extended_ingredients: Vec<ExtendedIngredient>,
    #[serde(default)]
    pub analyzed_instructions: Vec<InstructionGroup>,
    pub instructions: Option<String>,
    pub preparation_minutes: Option<i64>,
    pub cooking_minutes: Option<i64>,
    pub ready_in_minutes: Option<i64>,
    pub servings: Option<u32>,
    pub spoonacular_score: Option<f64>,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtendedIngredient {
    #[serde(default)]
    pub name: String,
    pub amount: Option<f64>,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstructionGroup {
    #[serde(default)]
    pub steps: Vec<InstructionStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstructionStep {
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub step: String,
}

// ── Client ──────────────────────────────────────────────────────────────

pub struct SpoonacularClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SpoonacularClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let http = http_client(timeout).map_err(|source| ProviderError::Http {
            provider: PROVIDER_NAME,
            source,
        })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Search recipes by cuisine category and ingredients.
    pub async fn search(
        &self,
        category: &str,
        ingredients: &[String],
        limit: usize,
    ) -> Result<Vec<CandidateSummary>, ProviderError> {
        let include = ingredients
            .iter()
            .map(|slug| slug.replace('_', " "))
            .collect::<Vec<_>>()
            .join(",");
        let number = limit.to_string();
        let url = format!("{}/recipes/complexSearch", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("cuisine", category),
                ("includeIngredients", include.as_str()),
                ("number", number.as_str()),
                ("addRecipeInformation", "true"),
                ("fillIngredients", "true"),
            ])
            .send()
            .await
            .map_err(http_error)?;

        let body: SearchResponse = check_status(response)?.json().await.map_err(http_error)?;
        Ok(body.results.into_iter().map(CandidateSummary::from).collect())
    }

    /// Get full recipe details including instructions.
    pub async fn get_details(&self, id: &str) -> Result<SpoonacularRecipe, ProviderError> {
        let url = format!("{}/recipes/{}/information", self.base_url, id);
        let response = self
            .http
            .get(&url)
            .query(&[("apiKey", self.api_key.as_str()), ("includeNutrition", "false")])
            .send()
            .await
            .map_err(http_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound {
                provider: PROVIDER_NAME,
                id: id.to_string(),
            });
        }
        check_status(response)?.json().await.map_err(http_error)
    }
}

fn http_error(source: reqwest::Error) -> ProviderError {
    ProviderError::Http {
        provider: PROVIDER_NAME,
        source,
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(ProviderError::Status {
            provider: PROVIDER_NAME,
            status: response.status().as_u16(),
        })
    }
}

/// Well-rated, liked, under three hours and with a real ingredient list.
pub fn is_acceptable_quality(summary: &CandidateSummary) -> bool {
    summary.score.unwrap_or(0.0) >= MIN_SCORE
        && summary.likes.unwrap_or(0) >= MIN_LIKES
        && summary.ready_in_minutes.unwrap_or(u32::MAX) <= MAX_READY_MINUTES
        && summary.ingredient_count.unwrap_or(0) >= MIN_INGREDIENTS
}

// ── Conversion ──────────────────────────────────────────────────────────

/// Dish type from the `dishTypes` tags (authoritative) or, failing that,
/// from the title.
pub fn guess_dish_type(title: &str, tags: &[String]) -> Option<(&'static str, bool)> {
    const TAG_RULES: &[(&str, &str)] = &[
        ("soup", "soup"),
        ("salad", "salad"),
        ("pasta", "pasta"),
        ("curry", "curry"),
        ("stir fry", "stir-fry"),
        ("stir-fry", "stir-fry"),
        ("sandwich", "sandwich"),
        ("wrap", "wrap"),
        ("bowl", "bowl"),
    ];
    const TITLE_RULES: &[(&[&str], &str)] = &[
        (&["pie", "casserole", "bake"], "baked-dish"),
        (&["soup", "stew"], "soup"),
        (&["salad"], "salad"),
        (&["pasta"], "pasta"),
        (&["curry"], "curry"),
        (&["stir fry", "stir-fry"], "stir-fry"),
    ];

    for tag in tags.iter().map(|t| t.to_lowercase()) {
        if let Some((_, dish_type)) = TAG_RULES.iter().find(|(needle, _)| tag.contains(needle)) {
            return Some((*dish_type, true));
        }
    }

    let title = title.to_lowercase();
    TITLE_RULES
        .iter()
        .find(|(words, _)| words.iter().any(|w| title.contains(w)))
        .map(|(_, dish_type)| (*dish_type, false))
}

fn html_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid regex"))
}

fn repeated_dots_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\.(\s*\.)+").expect("valid regex"))
}

fn whitespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn numbered_step_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+[.)]\s*[^.]+\.").expect("valid regex"))
}

fn leading_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+[.)]\s*").expect("valid regex"))
}

/// Turn Spoonacular's free-form HTML instructions into steps.
pub fn steps_from_html(html: &str) -> Vec<String> {
    let text = html_tag_pattern().replace_all(html, ". ");
    let text = repeated_dots_pattern().replace_all(&text, ".");
    let text = whitespace_pattern().replace_all(&text, " ");
    let cleaned = text.trim().trim_start_matches(['.', ' ']);

    let numbered: Vec<&str> = numbered_step_pattern()
        .find_iter(cleaned)
        .map(|m| m.as_str())
        .collect();
    let raw: Vec<&str> = if numbered.is_empty() {
        cleaned
            .split(". ")
            .map(str::trim)
            .filter(|s| s.len() > 10)
            .collect()
    } else {
        numbered
    };

    raw.into_iter()
        .map(|step| leading_number_pattern().replace(step.trim(), "").trim().to_string())
        .filter(|step| step.split_whitespace().count() >= 3)
        .collect()
}

fn positive_minutes(value: Option<i64>) -> Option<u32> {
    value.filter(|m| *m > 0).and_then(|m| u32::try_from(m).ok())
}

fn format_amount(amount: Option<f64>, unit: &str) -> String {
    let amount = amount.map(|a| a.to_string()).unwrap_or_default();
    format!("{amount} {unit}").trim().to_string()
}

impl IntoRecipe for SpoonacularRecipe {
    fn into_recipe(self, catalog: &IngredientCatalog) -> Result<ConvertedRecipe, ConversionError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ConversionError::MissingField("title"));
        }

        let ingredients = canonical_ingredients(
            catalog,
            self.extended_ingredients
                .iter()
                .map(|i| (i.name.as_str(), format_amount(i.amount, &i.unit))),
        );
        if ingredients.is_empty() {
            return Err(ConversionError::NoIngredients(title));
        }

        let mut instructions: Vec<String> = self
            .analyzed_instructions
            .iter()
            .flat_map(|group| group.steps.iter())
            .map(|s| s.step.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if instructions.is_empty() {
            if let Some(html) = self.instructions.as_deref() {
                instructions = steps_from_html(html);
            }
        }

        let (prep_time, cook_time) = match (
            positive_minutes(self.preparation_minutes),
            positive_minutes(self.cooking_minutes),
            positive_minutes(self.ready_in_minutes),
        ) {
            (Some(prep), Some(cook), _) => (prep, cook),
            (Some(prep), None, Some(ready)) => (prep, ready.saturating_sub(prep)),
            (None, Some(cook), Some(ready)) => (ready.saturating_sub(cook), cook),
            (None, None, Some(ready)) => split_total_time(ready),
            (prep, cook, None) => (
                prep.unwrap_or(DEFAULT_PREP_MINUTES),
                cook.unwrap_or(DEFAULT_COOK_MINUTES),
            ),
        };

        let (dish_type, authoritative) = match guess_dish_type(&title, &self.dish_types) {
            Some((dish_type, authoritative)) => (dish_type.to_string(), authoritative),
            None => ("main-course".to_string(), false),
        };

        let cuisines: Vec<String> = self.cuisines.iter().map(|c| c.to_lowercase()).collect();

        let recipe = Recipe {
            id: format!("{PROVIDER_NAME}_{}", self.id),
            title,
            cuisine: cuisines
                .first()
                .cloned()
                .unwrap_or_else(|| "international".to_string()),
            dish_type,
            ingredients,
            instructions,
            prep_time,
            cook_time,
            servings: self.servings.filter(|s| *s > 0).unwrap_or(DEFAULT_SERVINGS),
            source: PROVIDER_NAME.to_string(),
            quality_score: self
                .spoonacular_score
                .map(|s| s.round().clamp(0.0, 100.0) as u8)
                .unwrap_or(0),
            times_served: 0,
        };

        Ok(ConvertedRecipe {
            recipe,
            authoritative_dish_type: authoritative,
            cuisines,
        })
    }
}
