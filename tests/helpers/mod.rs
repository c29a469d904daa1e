//! Test helpers: in-memory cache pool, stub provider servers and stub chefs.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use recipe_cascade::db;
use recipe_cascade::models::recipe::Recipe;
use recipe_cascade::services::aggregator::ProviderAggregator;
use recipe_cascade::services::cascade::{Resolver, ResolverSettings};
use recipe_cascade::services::generator::{GenerationError, RecipeGenerator, TemplateChef};
use recipe_cascade::services::knowledge::Knowledge;
use recipe_cascade::services::local_cache::LocalCache;
use recipe_cascade::services::providers::{MealDbClient, Provider, SpoonacularClient};

pub const PROVIDER_TIMEOUT: Duration = Duration::from_millis(300);

// ── Database ────────────────────────────────────────────────────────────

/// A single-connection in-memory SQLite pool with migrations applied.
/// One connection keeps every query on the same in-memory database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(db::connect_options("sqlite::memory:").unwrap())
        .await
        .expect("Failed to open in-memory database");
    db::run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}

pub async fn seed(cache: &LocalCache, recipes: &[Recipe]) {
    for recipe in recipes {
        cache.write(recipe).await.expect("Failed to seed recipe");
    }
}

// ── Resolver ────────────────────────────────────────────────────────────

pub struct Harness<G: RecipeGenerator> {
    pub resolver: Resolver<G>,
    pub knowledge: Knowledge,
    pub pool: SqlitePool,
}

pub async fn harness<G: RecipeGenerator>(providers: Vec<Provider>, generator: G) -> Harness<G> {
    let knowledge = Knowledge::embedded().unwrap();
    let pool = test_pool().await;
    let cache = LocalCache::new(pool.clone(), knowledge.catalog.clone(), 25);
    let aggregator = ProviderAggregator::new(
        providers,
        knowledge.catalog.clone(),
        knowledge.dish_types.clone(),
        PROVIDER_TIMEOUT,
        10,
    );
    let resolver = Resolver::new(
        cache,
        aggregator,
        knowledge.atlas.clone(),
        knowledge.catalog.clone(),
        generator,
        ResolverSettings::default(),
    );
    Harness {
        resolver,
        knowledge,
        pool,
    }
}

pub fn template_chef() -> TemplateChef {
    TemplateChef::new(Knowledge::embedded().unwrap().catalog)
}

/// Always fails, to exercise the unresolved path.
pub struct FailingChef;

impl RecipeGenerator for FailingChef {
    async fn generate(
        &self,
        _cuisine: &str,
        _dish_type: &str,
        _ingredient_names: &[String],
    ) -> Result<Recipe, GenerationError> {
        Err(GenerationError::InvalidRecipe("model unavailable".into()))
    }
}

/// Template chef that counts its invocations.
pub struct CountingChef {
    inner: TemplateChef,
    pub calls: AtomicUsize,
}

impl CountingChef {
    pub fn new() -> Self {
        Self {
            inner: template_chef(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RecipeGenerator for CountingChef {
    async fn generate(
        &self,
        cuisine: &str,
        dish_type: &str,
        ingredient_names: &[String],
    ) -> Result<Recipe, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.generate(cuisine, dish_type, ingredient_names).await
    }
}

// ── Stub provider servers ───────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct StubBehaviour {
    /// Applied to every endpoint
    pub delay: Option<Duration>,
    pub fail: bool,
    /// Applied to the detail lookup endpoint only
    pub lookup_delay: Option<Duration>,
}

#[derive(Clone)]
struct StubState {
    records: Arc<Vec<Value>>,
    hits: Arc<AtomicUsize>,
    lookups: Arc<AtomicUsize>,
    behaviour: StubBehaviour,
}

impl StubState {
    fn new(records: Vec<Value>, behaviour: StubBehaviour) -> Self {
        Self {
            records: Arc::new(records),
            hits: Arc::new(AtomicUsize::new(0)),
            lookups: Arc::new(AtomicUsize::new(0)),
            behaviour,
        }
    }
}

impl StubState {
    /// Count the request and apply the configured delay or failure.
    async fn enter(&self) -> Option<Response> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.behaviour.delay {
            tokio::time::sleep(delay).await;
        }
        self.behaviour
            .fail
            .then(|| StatusCode::INTERNAL_SERVER_ERROR.into_response())
    }

    /// As `enter`, for the detail lookup endpoint.
    async fn enter_lookup(&self) -> Option<Response> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.behaviour.lookup_delay {
            tokio::time::sleep(delay).await;
        }
        self.enter().await
    }
}

/// A running stub server and its request counters.
pub struct StubServer {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    lookups: Arc<AtomicUsize>,
}

impl StubServer {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Detail lookups received, including ones still sleeping.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

async fn serve(router: Router, state: &StubState) -> StubServer {
    let (hits, lookups) = (state.hits.clone(), state.lookups.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    StubServer {
        base_url: format!("http://{addr}"),
        hits,
        lookups,
    }
}

async fn mealdb_filter(State(state): State<StubState>, Query(q): Query<HashMap<String, String>>) -> Response {
    if let Some(early) = state.enter().await {
        return early;
    }
    let stubs: Vec<Value> = state
        .records
        .iter()
        .filter(|meal| match (q.get("a"), q.get("i")) {
            (Some(area), _) => meal["strArea"].as_str().is_some_and(|a| a.eq_ignore_ascii_case(area)),
            (None, Some(ingredient)) => {
                let wanted = ingredient.replace('_', " ");
                (1..=20).any(|n| {
                    meal[format!("strIngredient{n}")]
                        .as_str()
                        .is_some_and(|i| i.eq_ignore_ascii_case(&wanted))
                })
            }
            _ => false,
        })
        .map(|meal| json!({"idMeal": meal["idMeal"], "strMeal": meal["strMeal"]}))
        .collect();
    let meals = if stubs.is_empty() { Value::Null } else { Value::Array(stubs) };
    Json(json!({ "meals": meals })).into_response()
}

async fn mealdb_lookup(State(state): State<StubState>, Query(q): Query<HashMap<String, String>>) -> Response {
    if let Some(early) = state.enter_lookup().await {
        return early;
    }
    let id = q.get("i").cloned().unwrap_or_default();
    let found: Vec<Value> = state
        .records
        .iter()
        .filter(|meal| meal["idMeal"].as_str() == Some(id.as_str()))
        .cloned()
        .collect();
    let meals = if found.is_empty() { Value::Null } else { Value::Array(found) };
    Json(json!({ "meals": meals })).into_response()
}

/// Stub TheMealDB API serving `meals` (full lookup payloads).
pub async fn mealdb_stub(meals: Vec<Value>, behaviour: StubBehaviour) -> StubServer {
    let state = StubState::new(meals, behaviour);
    let router = Router::new()
        .route("/{key}/filter.php", get(mealdb_filter))
        .route("/{key}/lookup.php", get(mealdb_lookup))
        .with_state(state.clone());
    serve(router, &state).await
}

async fn spoonacular_search(
    State(state): State<StubState>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    if let Some(early) = state.enter().await {
        return early;
    }
    let cuisine = q.get("cuisine").cloned().unwrap_or_default();
    let results: Vec<Value> = state
        .records
        .iter()
        .filter(|r| {
            r["cuisines"]
                .as_array()
                .is_some_and(|cs| cs.iter().any(|c| c.as_str().is_some_and(|c| c.eq_ignore_ascii_case(&cuisine))))
        })
        .cloned()
        .collect();
    let total = results.len();
    Json(json!({ "results": results, "totalResults": total })).into_response()
}

async fn spoonacular_information(State(state): State<StubState>, Path(id): Path<String>) -> Response {
    if let Some(early) = state.enter_lookup().await {
        return early;
    }
    match state
        .records
        .iter()
        .find(|r| r["id"].as_i64().map(|n| n.to_string()) == Some(id.clone()))
    {
        Some(recipe) => Json(recipe.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Stub Spoonacular API serving `recipes` (information payloads that also
/// carry the summary fields used by the search endpoint).
pub async fn spoonacular_stub(recipes: Vec<Value>, behaviour: StubBehaviour) -> StubServer {
    let state = StubState::new(recipes, behaviour);
    let router = Router::new()
        .route("/recipes/complexSearch", get(spoonacular_search))
        .route("/recipes/{id}/information", get(spoonacular_information))
        .with_state(state.clone());
    serve(router, &state).await
}

pub fn mealdb_provider(server: &StubServer) -> Provider {
    Provider::MealDb(MealDbClient::new(&server.base_url, "1", PROVIDER_TIMEOUT).unwrap())
}

pub fn spoonacular_provider(server: &StubServer) -> Provider {
    Provider::Spoonacular(
        SpoonacularClient::new(&server.base_url, "test-key", PROVIDER_TIMEOUT).unwrap(),
    )
}
