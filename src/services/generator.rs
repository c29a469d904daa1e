//! Generative fallback: the last cascade level.
//!
//! [`WorkersAiChef`] prompts a Cloudflare Workers AI text model for a recipe
//! using exactly the requested ingredients. [`TemplateChef`] builds a plain
//! deterministic recipe and is used when no credentials are configured or
//! the model keeps failing.

use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::models::recipe::{Recipe, RecipeIngredient};
use crate::models::search::is_any;
use crate::services::atlas::display_cuisine;
use crate::services::catalog::{slugify, IngredientCatalog};

const MAX_ATTEMPTS: u32 = 3;
const MAX_TOKENS: u32 = 1024;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const WORKERS_AI_SOURCE: &str = "workers_ai";
pub const TEMPLATE_SOURCE: &str = "generated";

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Workers AI returned HTTP {0}")]
    Status(u16),

    #[error("Failed to parse generated recipe: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Generated recipe is unusable: {0}")]
    InvalidRecipe(String),
}

/// Produces a recipe for a cuisine, dish type and ingredient list.
///
/// The returned recipe's `cuisine` and `dish_type` equal the request verbatim.
pub trait RecipeGenerator: Send + Sync {
    fn generate(
        &self,
        cuisine: &str,
        dish_type: &str,
        ingredient_names: &[String],
    ) -> impl Future<Output = Result<Recipe, GenerationError>> + Send;
}

/// Human wording for a dish type; "any" reads as a plain dish.
fn dish_words(dish_type: &str) -> String {
    if is_any(dish_type) {
        "dish".to_string()
    } else {
        dish_type.trim().replace('-', " ")
    }
}

fn generated_id(source: &str, cuisine: &str, dish_type: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{source}_{}_{}_{}",
        slugify(&format!("{cuisine} {dish_type}")),
        chrono::Utc::now().timestamp(),
        &suffix[..8]
    )
}

// ── Template chef ───────────────────────────────────────────────────────

/// Deterministic fallback that never calls out.
#[derive(Clone)]
pub struct TemplateChef {
    catalog: Arc<IngredientCatalog>,
}

impl TemplateChef {
    pub fn new(catalog: Arc<IngredientCatalog>) -> Self {
        Self { catalog }
    }

    pub fn build(
        &self,
        cuisine: &str,
        dish_type: &str,
        ingredient_names: &[String],
    ) -> Result<Recipe, GenerationError> {
        if cuisine.trim().is_empty() {
            return Err(GenerationError::InvalidRecipe("cuisine is empty".into()));
        }

        let cuisine_label = display_cuisine(cuisine);
        let dish_label = display_cuisine(&dish_words(dish_type));
        let listed = if ingredient_names.is_empty() {
            "your ingredients".to_string()
        } else {
            ingredient_names.join(", ").to_lowercase()
        };

        let ingredients: Vec<RecipeIngredient> = ingredient_names
            .iter()
            .map(|name| RecipeIngredient {
                slug: self.catalog.canonical_slug(name),
                name: name.clone(),
                amount: "as needed".to_string(),
            })
            .collect();

        Ok(Recipe {
            id: generated_id(TEMPLATE_SOURCE, cuisine, dish_type),
            title: format!("Simple {cuisine_label} {dish_label}"),
            cuisine: cuisine.to_string(),
            dish_type: dish_type.to_string(),
            ingredients,
            instructions: vec![
                format!("Prepare {listed}: wash, trim and cut into even pieces."),
                format!("Heat a pan and season in the {cuisine_label} style."),
                format!("Cook {listed} until tender and cooked through."),
                "Taste, adjust seasoning and serve warm.".to_string(),
            ],
            prep_time: 15,
            cook_time: 30,
            servings: 4,
            source: TEMPLATE_SOURCE.to_string(),
            quality_score: 0,
            times_served: 0,
        })
    }
}

impl RecipeGenerator for TemplateChef {
    async fn generate(
        &self,
        cuisine: &str,
        dish_type: &str,
        ingredient_names: &[String],
    ) -> Result<Recipe, GenerationError> {
        self.build(cuisine, dish_type, ingredient_names)
    }
}

// ── Workers AI chef ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct WorkersAiResponse {
    result: WorkersAiResult,
}

#[derive(Deserialize)]
struct WorkersAiResult {
    response: String,
}

#[derive(Debug, Deserialize)]
struct GeneratedRecipe {
    title: String,
    #[serde(default)]
    ingredients: Vec<GeneratedIngredient>,
    #[serde(default)]
    instructions: Vec<String>,
    #[serde(default)]
    prep_time: Option<u32>,
    #[serde(default)]
    cook_time: Option<u32>,
    #[serde(default)]
    servings: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeneratedIngredient {
    name: String,
    #[serde(default)]
    amount: String,
}

/// Client for a Cloudflare Workers AI text-generation model.
pub struct WorkersAiChef {
    http: Client,
    account_id: String,
    api_token: String,
    model: String,
    catalog: Arc<IngredientCatalog>,
}

impl WorkersAiChef {
    pub fn new(
        account_id: String,
        api_token: String,
        model: String,
        catalog: Arc<IngredientCatalog>,
    ) -> Result<Self, GenerationError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            account_id,
            api_token,
            model,
            catalog,
        })
    }

    fn prompt(&self, cuisine: &str, dish_type: &str, ingredient_names: &[String]) -> String {
        let seasonings: Vec<String> = self
            .catalog
            .typical_for(cuisine)
            .iter()
            .map(|i| i.display_name.to_lowercase())
            .collect();
        let seasonings = if seasonings.is_empty() {
            "salt, pepper, oil, water".to_string()
        } else {
            format!("salt, pepper, oil, water, {}", seasonings.join(", "))
        };

        let dish = dish_words(dish_type);
        format!(
            "Create an authentic {cuisine} {dish} recipe.\n\
             Use EXACTLY these main ingredients and no other main ingredients: {}.\n\
             You may add only these seasonings and basics: {seasonings}.\n\
             Return ONLY valid JSON with these exact field names: \
             title (string), ingredients (array of objects with name and amount), \
             instructions (array of step strings), prep_time (minutes), \
             cook_time (minutes), servings (number).",
            ingredient_names.join(", ")
        )
    }

    async fn request(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!(
            "https://api.cloudflare.com/client/v4/accounts/{}/ai/run/{}",
            self.account_id, self.model
        );

        let request_body = serde_json::json!({
            "messages": [
                {"role": "system", "content": "You are a professional chef. You answer with JSON only."},
                {"role": "user", "content": prompt}
            ],
            "max_tokens": MAX_TOKENS
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerationError::Status(response.status().as_u16()));
        }

        let body: WorkersAiResponse = response.json().await?;
        Ok(body.result.response)
    }

    fn to_recipe(
        &self,
        generated: GeneratedRecipe,
        cuisine: &str,
        dish_type: &str,
        ingredient_names: &[String],
    ) -> Result<Recipe, GenerationError> {
        let title = generated.title.trim().to_string();
        if title.is_empty() {
            return Err(GenerationError::InvalidRecipe("missing title".into()));
        }
        let instructions: Vec<String> = generated
            .instructions
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if instructions.is_empty() {
            return Err(GenerationError::InvalidRecipe("no instructions".into()));
        }
        let ingredients: Vec<RecipeIngredient> = generated
            .ingredients
            .into_iter()
            .filter(|i| !i.name.trim().is_empty())
            .map(|i| RecipeIngredient {
                slug: self.catalog.canonical_slug(&i.name),
                name: i.name.trim().to_string(),
                amount: i.amount,
            })
            .collect();
        if ingredients.is_empty() {
            return Err(GenerationError::InvalidRecipe("no ingredients".into()));
        }

        self.warn_unauthorized(&ingredients, cuisine, ingredient_names);

        Ok(Recipe {
            id: generated_id(WORKERS_AI_SOURCE, cuisine, dish_type),
            title,
            cuisine: cuisine.to_string(),
            dish_type: dish_type.to_string(),
            ingredients,
            instructions,
            prep_time: generated.prep_time.unwrap_or(15),
            cook_time: generated.cook_time.unwrap_or(30),
            servings: generated.servings.filter(|s| *s > 0).unwrap_or(4),
            source: WORKERS_AI_SOURCE.to_string(),
            quality_score: 0,
            times_served: 0,
        })
    }

    /// Models sometimes slip in extra main ingredients; those are logged, not rejected.
    fn warn_unauthorized(&self, ingredients: &[RecipeIngredient], cuisine: &str, requested: &[String]) {
        let mut allowed: HashSet<String> = requested
            .iter()
            .flat_map(|name| self.catalog.expand(&self.catalog.canonical_slug(name)))
            .collect();
        allowed.extend(self.catalog.typical_for(cuisine).iter().map(|i| i.slug.clone()));

        let extras: Vec<&str> = ingredients
            .iter()
            .filter(|i| !allowed.contains(&i.slug))
            .filter(|i| self.catalog.get(&i.slug).is_none_or(|c| !c.is_universal()))
            .map(|i| i.name.as_str())
            .collect();
        if !extras.is_empty() {
            tracing::warn!(extras = ?extras, "Generated recipe uses unrequested ingredients");
        }
    }
}

impl RecipeGenerator for WorkersAiChef {
    async fn generate(
        &self,
        cuisine: &str,
        dish_type: &str,
        ingredient_names: &[String],
    ) -> Result<Recipe, GenerationError> {
        let prompt = self.prompt(cuisine, dish_type, ingredient_names);
        let mut last_error = GenerationError::InvalidRecipe("no attempt made".into());

        for attempt in 1..=MAX_ATTEMPTS {
            let outcome: Result<Recipe, GenerationError> = async {
                let text = self.request(&prompt).await?;
                let generated: GeneratedRecipe = serde_json::from_str(extract_json(&text))?;
                self.to_recipe(generated, cuisine, dish_type, ingredient_names)
            }
            .await;

            match outcome {
                Ok(recipe) => {
                    tracing::info!(attempt, recipe_id = %recipe.id, "Generated recipe");
                    return Ok(recipe);
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Recipe generation attempt failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

fn json_object_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"))
}

/// Strip markdown code fences and surrounding chatter from model output.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    if unfenced.starts_with('{') {
        return unfenced;
    }
    json_object_pattern()
        .find(unfenced)
        .map(|m| m.as_str())
        .unwrap_or(unfenced)
}

// ── Configured chef ─────────────────────────────────────────────────────

/// The generator wired into the server: Workers AI when configured, with the
/// template as its safety net.
pub enum Chef {
    WorkersAi {
        model: WorkersAiChef,
        fallback: TemplateChef,
    },
    Template(TemplateChef),
}

impl Chef {
    pub fn from_config(
        config: &crate::config::AppConfig,
        catalog: Arc<IngredientCatalog>,
    ) -> Result<Self, GenerationError> {
        let fallback = TemplateChef::new(catalog.clone());
        match config.workers_ai_credentials() {
            Some((account, token)) => {
                tracing::info!(model = %config.cf_model, "Using Workers AI chef");
                Ok(Chef::WorkersAi {
                    model: WorkersAiChef::new(
                        account.to_string(),
                        token.to_string(),
                        config.cf_model.clone(),
                        catalog,
                    )?,
                    fallback,
                })
            }
            None => {
                tracing::info!("Workers AI not configured, using template chef");
                Ok(Chef::Template(fallback))
            }
        }
    }
}

impl RecipeGenerator for Chef {
    async fn generate(
        &self,
        cuisine: &str,
        dish_type: &str,
        ingredient_names: &[String],
    ) -> Result<Recipe, GenerationError> {
        match self {
            Chef::WorkersAi { model, fallback } => {
                match model.generate(cuisine, dish_type, ingredient_names).await {
                    Ok(recipe) => Ok(recipe),
                    Err(e) => {
                        tracing::warn!(error = %e, "Workers AI chef failed, using template");
                        fallback.build(cuisine, dish_type, ingredient_names)
                    }
                }
            }
            Chef::Template(chef) => chef.build(cuisine, dish_type, ingredient_names),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::knowledge::Knowledge;

    #[test]
    fn test_extract_json_strips_fences() {
        assert_eq!(extract_json("```json\n{\"title\": \"x\"}\n```"), "{\"title\": \"x\"}");
        assert_eq!(extract_json("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(
            extract_json("Here is your recipe: {\"a\": {\"b\": 2}} Enjoy!"),
            "{\"a\": {\"b\": 2}}"
        );
    }

    #[tokio::test]
    async fn test_template_chef_keeps_request_verbatim() {
        let knowledge = Knowledge::embedded().unwrap();
        let chef = TemplateChef::new(knowledge.catalog.clone());
        let names = vec!["Plantain".to_string(), "Onions".to_string()];

        let recipe = chef.generate("ethiopian", "stir-fry", &names).await.unwrap();
        assert_eq!(recipe.cuisine, "ethiopian");
        assert_eq!(recipe.dish_type, "stir-fry");
        assert_eq!(recipe.title, "Simple Ethiopian Stir Fry");
        assert_eq!(recipe.ingredient_slugs().collect::<Vec<_>>(), vec!["plantain", "onion"]);
        assert_eq!(recipe.instructions.len(), 4);
        assert!(recipe.id.starts_with("generated_ethiopian_stir_fry_"));
    }

    #[tokio::test]
    async fn test_template_title_for_any_dish_type() {
        let knowledge = Knowledge::embedded().unwrap();
        let chef = TemplateChef::new(knowledge.catalog.clone());

        let recipe = chef.generate("mexican", "any", &["Chicken".to_string()]).await.unwrap();
        assert_eq!(recipe.title, "Simple Mexican Dish");
        assert_eq!(recipe.dish_type, "any");
    }

    #[test]
    fn test_generated_payload_conversion() {
        let knowledge = Knowledge::embedded().unwrap();
        let chef = WorkersAiChef::new(
            "acct".into(),
            "token".into(),
            "@cf/meta/llama-3.1-8b-instruct".into(),
            knowledge.catalog.clone(),
        )
        .unwrap();
        let generated: GeneratedRecipe = serde_json::from_str(
            r#"{"title": "Plantain Tibs", "ingredients": [{"name": "plantains", "amount": "2"}],
                "instructions": ["Slice the plantains.", ""], "prep_time": 10}"#,
        )
        .unwrap();

        let recipe = chef
            .to_recipe(generated, "Ethiopian", "stir-fry", &["plantain".to_string()])
            .unwrap();
        assert_eq!(recipe.cuisine, "Ethiopian");
        assert_eq!(recipe.ingredients[0].slug, "plantain");
        assert_eq!(recipe.instructions, vec!["Slice the plantains."]);
        assert_eq!((recipe.prep_time, recipe.cook_time, recipe.servings), (10, 30, 4));
    }

    #[test]
    fn test_generated_payload_without_steps_is_invalid() {
        let knowledge = Knowledge::embedded().unwrap();
        let chef = WorkersAiChef::new("a".into(), "t".into(), "m".into(), knowledge.catalog.clone())
            .unwrap();
        let generated: GeneratedRecipe =
            serde_json::from_str(r#"{"title": "Air", "ingredients": [{"name": "onion"}]}"#).unwrap();
        assert!(matches!(
            chef.to_recipe(generated, "thai", "curry", &[]),
            Err(GenerationError::InvalidRecipe(_))
        ));
    }
}
