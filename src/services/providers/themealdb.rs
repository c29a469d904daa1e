//! TheMealDB client and converter.
//!
//! TheMealDB has no rating or timing data, so every meal with an id and a
//! title passes the quality gate and dish type is inferred from the title,
//! the instructions, then the category, in that order.

use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

use super::{
    canonical_ingredients, http_client, split_total_time, CandidateSummary, ConversionError,
    ConvertedRecipe, IntoRecipe, ProviderError,
};
use crate::models::recipe::Recipe;
use crate::services::catalog::IngredientCatalog;

pub const PROVIDER_NAME: &str = "themealdb";

/// TheMealDB exposes up to twenty ingredient/measure slots per meal.
const INGREDIENT_SLOTS: usize = 20;
const DEFAULT_SERVINGS: u32 = 4;
const DEFAULT_QUALITY: u8 = 70;
const MIN_STEP_LEN: usize = 10;

/// Title patterns are specific enough to be authoritative.
const TITLE_PATTERNS: &[(&str, &[&str])] = &[
    (
        "stir-fry",
        &["stir fry", "stir-fry", "kung pao", "chow mein", "pad thai", "fried rice", "lo mein", "teriyaki"],
    ),
    ("curry", &["curry", "masala", "korma", "vindaloo", "tikka", "rendang"]),
    ("soup", &["soup", "stew", "broth", "chowder", "bisque", "pho", "ramen", "gumbo"]),
    ("baked-dish", &["pie", "bake", "casserole", "lasagne", "lasagna", "moussaka", "gratin", "roast"]),
    ("pasta", &["pasta", "spaghetti", "penne", "linguine", "fettuccine", "carbonara", "ravioli"]),
    ("salad", &["salad", "slaw"]),
    ("grilled", &["grilled", "kebab", "bbq", "barbecue", "skewer", "satay"]),
    ("fried", &["tempura", "katsu", "fritter", "fried chicken", "schnitzel"]),
    ("steamed", &["steamed", "dumpling", "bao"]),
];

/// Instruction phrases used when the title says nothing.
const INSTRUCTION_INDICATORS: &[(&str, &[&str])] = &[
    ("stir-fry", &["stir fry", "stir-fry", "wok", "toss quickly"]),
    ("baked-dish", &["preheat oven", "bake for", "baking dish", "oven"]),
    ("soup", &["simmer", "broth", "stock", "ladle"]),
    ("grilled", &["grill", "barbecue", "char"]),
    ("fried", &["deep fry", "deep-fry", "hot oil"]),
    ("steamed", &["steam", "steamer"]),
];

fn default_times(dish_type: &str) -> (u32, u32) {
    match dish_type {
        "stir-fry" => (15, 15),
        "soup" => (20, 40),
        "curry" => (20, 30),
        "baked-dish" => (20, 45),
        "pasta" => (15, 20),
        "salad" => (15, 0),
        "grilled" => (15, 20),
        "fried" => (20, 15),
        "steamed" => (15, 20),
        "main-course" => (20, 30),
        "dessert" => (30, 30),
        "breakfast" => (10, 15),
        "side-dish" => (10, 20),
        _ => (15, 30),
    }
}

// ── Payloads ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MealList<T> {
    meals: Option<Vec<T>>,
}

#[derive(Debug, Deserialize)]
struct MealStub {
    #[serde(rename = "idMeal")]
    id: String,
    #[serde(rename = "strMeal")]
    title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MealDbMeal {
    #[serde(rename = "idMeal", default)]
    pub id: String,
    #[serde(rename = "strMeal", default)]
    pub title: String,
    #[serde(rename = "strCategory")]
    pub category: Option<String>,
    #[serde(rename = "strArea")]
    pub area: Option<String>,
    #[serde(rename = "strInstructions")]
    pub instructions: Option<String>,
    #[serde(rename = "strSource")]
    pub source_url: Option<String>,
    /// `strIngredient1..20` and `strMeasure1..20`, plus anything else the API adds
    #[serde(flatten)]
    pub slots: HashMap<String, serde_json::Value>,
}

impl MealDbMeal {
    fn slot(&self, key: &str) -> Option<&str> {
        self.slots
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Non-blank (ingredient, measure) pairs in slot order.
    pub fn ingredient_lines(&self) -> Vec<(&str, String)> {
        (1..=INGREDIENT_SLOTS)
            .filter_map(|n| {
                let name = self.slot(&format!("strIngredient{n}"))?;
                let measure = self
                    .slot(&format!("strMeasure{n}"))
                    .unwrap_or("to taste")
                    .to_string();
                Some((name, measure))
            })
            .collect()
    }
}

// ── Client ──────────────────────────────────────────────────────────────

pub struct MealDbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MealDbClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let http = http_client(timeout).map_err(http_error)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        param: (&str, &str),
    ) -> Result<Vec<T>, ProviderError> {
        let url = format!("{}/{}/{}", self.base_url, self.api_key, endpoint);
        let response = self
            .http
            .get(&url)
            .query(&[param])
            .send()
            .await
            .map_err(http_error)?;

        if !response.status().is_success() {
            return Err(ProviderError::Status {
                provider: PROVIDER_NAME,
                status: response.status().as_u16(),
            });
        }

        let list: MealList<T> = response.json().await.map_err(http_error)?;
        Ok(list.meals.unwrap_or_default())
    }

    /// Meals of an area whose name mentions a requested ingredient.
    /// Falls back to filtering by the first ingredient when the area has none.
    pub async fn search(
        &self,
        category: &str,
        ingredients: &[String],
        limit: usize,
    ) -> Result<Vec<CandidateSummary>, ProviderError> {
        let terms: Vec<String> = ingredients.iter().map(|s| s.replace('_', " ")).collect();

        let by_area: Vec<MealStub> = self.fetch("filter.php", ("a", category)).await?;
        let mut hits: Vec<CandidateSummary> = by_area
            .into_iter()
            .filter(|meal| {
                let title = meal.title.to_lowercase();
                terms.is_empty() || terms.iter().any(|t| title.contains(t.as_str()))
            })
            .take(limit)
            .map(summary_from_stub)
            .collect();

        if hits.is_empty() {
            if let Some(first) = ingredients.first() {
                let by_ingredient: Vec<MealStub> = self.fetch("filter.php", ("i", first.as_str())).await?;
                hits = by_ingredient
                    .into_iter()
                    .take(limit)
                    .map(summary_from_stub)
                    .collect();
            }
        }

        tracing::debug!(category = %category, hits = hits.len(), "TheMealDB search");
        Ok(hits)
    }

    pub async fn get_details(&self, id: &str) -> Result<MealDbMeal, ProviderError> {
        let meals: Vec<MealDbMeal> = self.fetch("lookup.php", ("i", id)).await?;
        meals.into_iter().next().ok_or_else(|| ProviderError::NotFound {
            provider: PROVIDER_NAME,
            id: id.to_string(),
        })
    }
}

fn summary_from_stub(stub: MealStub) -> CandidateSummary {
    CandidateSummary {
        id: stub.id,
        title: stub.title,
        ..CandidateSummary::default()
    }
}

fn http_error(source: reqwest::Error) -> ProviderError {
    ProviderError::Http {
        provider: PROVIDER_NAME,
        source,
    }
}

pub fn is_acceptable_quality(summary: &CandidateSummary) -> bool {
    !summary.id.trim().is_empty() && !summary.title.trim().is_empty()
}

// ── Conversion ──────────────────────────────────────────────────────────

/// Returns the dish type and whether it came from the title.
pub fn infer_dish_type(title: &str, instructions: &str, category: Option<&str>) -> (String, bool) {
    let title = title.to_lowercase();
    if let Some((dish_type, _)) = TITLE_PATTERNS
        .iter()
        .find(|(_, words)| words.iter().any(|w| title.contains(w)))
    {
        return (dish_type.to_string(), true);
    }

    let instructions = instructions.to_lowercase();
    let mut best: Option<(&str, usize)> = None;
    for (dish_type, indicators) in INSTRUCTION_INDICATORS {
        let hits = indicators
            .iter()
            .filter(|i| instructions.contains(*i))
            .count();
        if hits > 0 && best.is_none_or(|(_, top)| hits > top) {
            best = Some((*dish_type, hits));
        }
    }
    if let Some((dish_type, _)) = best {
        return (dish_type.to_string(), false);
    }

    let dish_type = match category.map(str::to_lowercase).as_deref() {
        Some("dessert") => "dessert",
        Some("breakfast") => "breakfast",
        Some("side") | Some("starter") => "side-dish",
        _ => "main-course",
    };
    (dish_type.to_string(), false)
}

/// Split instructions on line breaks, then on sentence boundaries where the
/// next sentence starts with a capital letter.
pub fn split_steps(instructions: &str) -> Vec<String> {
    let mut steps = Vec::new();
    for line in instructions.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let mut start = 0;
        let bytes = line.as_bytes();
        for (i, _) in line.match_indices(". ") {
            let next = bytes.get(i + 2).copied();
            if next.is_some_and(|b| b.is_ascii_uppercase()) {
                steps.push(line[start..=i].trim().to_string());
                start = i + 2;
            }
        }
        steps.push(line[start..].trim().to_string());
    }
    steps.retain(|s| s.len() > MIN_STEP_LEN);
    steps
}

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(\d+)\s*(minutes?|mins?|hours?|hrs?)\b").expect("valid regex")
    })
}

/// Sum every duration mentioned in the instructions, in minutes. Saturates
/// rather than overflowing on absurd values.
pub fn mentioned_minutes(instructions: &str) -> u32 {
    duration_pattern()
        .captures_iter(instructions)
        .map(|caps| {
            let value: u32 = caps[1].parse().unwrap_or(u32::MAX);
            if caps[2].to_lowercase().starts_with('h') {
                value.saturating_mul(60)
            } else {
                value
            }
        })
        .fold(0u32, u32::saturating_add)
}

impl IntoRecipe for MealDbMeal {
    fn into_recipe(self, catalog: &IngredientCatalog) -> Result<ConvertedRecipe, ConversionError> {
        let title = self.title.trim().to_string();
        if self.id.trim().is_empty() {
            return Err(ConversionError::MissingField("idMeal"));
        }
        if title.is_empty() {
            return Err(ConversionError::MissingField("strMeal"));
        }

        let ingredients = canonical_ingredients(catalog, self.ingredient_lines());
        if ingredients.is_empty() {
            return Err(ConversionError::NoIngredients(title));
        }

        let raw_instructions = self.instructions.as_deref().unwrap_or_default();
        let (dish_type, authoritative) =
            infer_dish_type(&title, raw_instructions, self.category.as_deref());

        let (prep_time, cook_time) = match mentioned_minutes(raw_instructions) {
            0 => default_times(&dish_type),
            total => split_total_time(total),
        };

        let area = self
            .area
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty() && !a.eq_ignore_ascii_case("unknown"))
            .map(str::to_lowercase);

        let recipe = Recipe {
            id: format!("{PROVIDER_NAME}_{}", self.id.trim()),
            title,
            cuisine: area.clone().unwrap_or_else(|| "international".to_string()),
            dish_type,
            ingredients,
            instructions: split_steps(raw_instructions),
            prep_time,
            cook_time,
            servings: DEFAULT_SERVINGS,
            source: PROVIDER_NAME.to_string(),
            quality_score: DEFAULT_QUALITY,
            times_served: 0,
        };

        Ok(ConvertedRecipe {
            recipe,
            authoritative_dish_type: authoritative,
            cuisines: area.into_iter().collect(),
        })
    }
}
