//! Static culinary knowledge loaded once at start-up.
//!
//! Defaults are embedded at compile time; each file can be overridden from
//! disk via configuration. The loaded values are immutable and shared via `Arc`.

use std::borrow::Cow;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::atlas::CuisineAtlas;
use crate::services::catalog::IngredientCatalog;
use crate::services::dish_type::DishTypeVerifier;

pub const DEFAULT_ATLAS: &str = include_str!("../../data/atlas.json");
pub const DEFAULT_CATALOG: &str = include_str!("../../data/ingredients.json");
pub const DEFAULT_FAMILIES: &str = include_str!("../../data/families.json");
pub const DEFAULT_DISH_TYPES: &str = include_str!("../../data/dish_types.json");

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("Failed to read knowledge file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid knowledge JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cuisine '{0}' belongs to more than one subregion")]
    DuplicateCuisine(String),

    #[error("Ingredient family head '{0}' is not in the catalog")]
    UnknownFamilyHead(String),

    #[error("Ingredient catalog has no entries")]
    EmptyCatalog,
}

/// Atlas, catalog and dish-type indicators, ready to hand to the resolver.
#[derive(Debug, Clone)]
pub struct Knowledge {
    pub atlas: Arc<CuisineAtlas>,
    pub catalog: Arc<IngredientCatalog>,
    pub dish_types: Arc<DishTypeVerifier>,
}

impl Knowledge {
    /// The compiled-in defaults.
    pub fn embedded() -> Result<Self, KnowledgeError> {
        Self::from_sources(DEFAULT_ATLAS, DEFAULT_CATALOG, DEFAULT_FAMILIES, DEFAULT_DISH_TYPES)
    }

    /// Defaults, with any file paths set in the configuration read from disk instead.
    pub fn load(config: &AppConfig) -> Result<Self, KnowledgeError> {
        let atlas = read_or_default(config.atlas_path.as_deref(), DEFAULT_ATLAS)?;
        let catalog = read_or_default(config.catalog_path.as_deref(), DEFAULT_CATALOG)?;
        let families = read_or_default(config.families_path.as_deref(), DEFAULT_FAMILIES)?;
        let dish_types = read_or_default(config.dish_types_path.as_deref(), DEFAULT_DISH_TYPES)?;
        Self::from_sources(&atlas, &catalog, &families, &dish_types)
    }

    pub fn from_sources(
        atlas: &str,
        catalog: &str,
        families: &str,
        dish_types: &str,
    ) -> Result<Self, KnowledgeError> {
        let catalog = IngredientCatalog::from_json(catalog, families)?;
        if catalog.is_empty() {
            return Err(KnowledgeError::EmptyCatalog);
        }
        let knowledge = Self {
            atlas: Arc::new(CuisineAtlas::from_json(atlas)?),
            catalog: Arc::new(catalog),
            dish_types: Arc::new(DishTypeVerifier::from_json(dish_types)?),
        };
        tracing::info!(
            cuisines = knowledge.atlas.cuisine_count(),
            ingredients = knowledge.catalog.len(),
            dish_types = knowledge.dish_types.known_types().count(),
            "Culinary knowledge loaded"
        );
        Ok(knowledge)
    }
}

fn read_or_default(
    path: Option<&str>,
    default: &'static str,
) -> Result<Cow<'static, str>, KnowledgeError> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map(Cow::Owned)
            .map_err(|source| KnowledgeError::Io {
                path: path.to_string(),
                source,
            }),
        None => Ok(Cow::Borrowed(default)),
    }
}
