use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000"). Unused by the maintenance binary.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// SQLite connection string; the file is created when missing
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// Spoonacular API key. The provider is disabled when unset.
    pub spoonacular_api_key: Option<String>,

    #[serde(default = "default_spoonacular_base_url")]
    pub spoonacular_base_url: String,

    /// TheMealDB API key ("1" is the public test key)
    #[serde(default = "default_mealdb_api_key")]
    pub mealdb_api_key: String,

    #[serde(default = "default_mealdb_base_url")]
    pub mealdb_base_url: String,

    #[serde(default = "default_true")]
    pub mealdb_enabled: bool,

    /// Timeout applied to every outbound provider call
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// `limit` passed to provider search endpoints
    #[serde(default = "default_provider_result_limit")]
    pub provider_result_limit: usize,

    /// Cloudflare account ID (generative chef)
    pub cf_account_id: Option<String>,

    /// Cloudflare Workers AI API token (generative chef)
    pub cf_api_token: Option<String>,

    #[serde(default = "default_cf_model")]
    pub cf_model: String,

    /// Optional overrides for the embedded knowledge files
    pub atlas_path: Option<String>,
    pub catalog_path: Option<String>,
    pub families_path: Option<String>,
    pub dish_types_path: Option<String>,

    /// Share of cuisine-specific ingredients that must fit a cuisine before
    /// it is queried as a provider category or sister cuisine
    #[serde(default = "default_sister_compat_threshold")]
    pub sister_compat_threshold: f64,

    #[serde(default = "default_max_sister_cuisines")]
    pub max_sister_cuisines: usize,

    /// Rows fetched per cache query before protein validation
    #[serde(default = "default_local_candidate_limit")]
    pub local_candidate_limit: u32,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_database_url() -> String {
    "sqlite://recipes.db".to_string()
}

fn default_db_max_connections() -> u32 {
    8
}

fn default_spoonacular_base_url() -> String {
    "https://api.spoonacular.com".to_string()
}

fn default_mealdb_api_key() -> String {
    "1".to_string()
}

fn default_mealdb_base_url() -> String {
    "https://www.themealdb.com/api/json/v1".to_string()
}

fn default_true() -> bool {
    true
}

fn default_provider_timeout_secs() -> u64 {
    8
}

fn default_provider_result_limit() -> usize {
    10
}

fn default_cf_model() -> String {
    "@cf/meta/llama-3.1-8b-instruct".to_string()
}

fn default_sister_compat_threshold() -> f64 {
    0.5
}

fn default_max_sister_cuisines() -> usize {
    5
}

fn default_local_candidate_limit() -> u32 {
    25
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Workers AI credentials, when both halves are configured.
    pub fn workers_ai_credentials(&self) -> Option<(&str, &str)> {
        match (self.cf_account_id.as_deref(), self.cf_api_token.as_deref()) {
            (Some(account), Some(token)) if !account.is_empty() && !token.is_empty() => {
                Some((account, token))
            }
            _ => None,
        }
    }
}
