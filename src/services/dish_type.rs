//! Dish-Type Verifier: confidence-scored fit of a recipe to a requested
//! dish category.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::models::recipe::Recipe;
use crate::services::knowledge::KnowledgeError;

/// Minimum share of available points for a recipe to count as the dish type.
pub const ACCEPTANCE_THRESHOLD: f64 = 0.60;

const TITLE_POINTS: u32 = 4;
const TIME_POINTS: u32 = 2;
const INSTRUCTION_POINTS_CAP: u32 = 3;
const EQUIPMENT_POINTS_CAP: u32 = 2;
const INGREDIENT_POINTS: u32 = 2;

/// Indicators characteristic of one dish type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DishTypeIndicators {
    #[serde(default)]
    pub title_words: Vec<String>,
    #[serde(default)]
    pub instruction_patterns: Vec<String>,
    /// Upper bound on total minutes for fast categories
    pub time_limit: Option<u32>,
    /// Lower bound on total minutes for slow categories
    pub time_min: Option<u32>,
    #[serde(default)]
    pub equipment: Vec<String>,
    /// Slug fragments (e.g. "curry", "turmeric")
    #[serde(default)]
    pub ingredients: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DishTypeVerdict {
    pub accepted: bool,
    pub score: f64,
    pub points: u32,
    pub max_points: u32,
    /// Accepted on the converter's say-so without scoring
    pub short_circuit: bool,
}

impl DishTypeVerdict {
    fn trusted() -> Self {
        Self {
            accepted: true,
            score: 1.0,
            points: 0,
            max_points: 0,
            short_circuit: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct DishTypeVerifier {
    indicators: HashMap<String, DishTypeIndicators>,
    evaluations: AtomicUsize,
}

impl DishTypeVerifier {
    pub fn new(indicators: HashMap<String, DishTypeIndicators>) -> Self {
        Self {
            indicators: indicators
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect(),
            evaluations: AtomicUsize::new(0),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, KnowledgeError> {
        let indicators: HashMap<String, DishTypeIndicators> = serde_json::from_str(json)?;
        Ok(Self::new(indicators))
    }

    pub fn known_types(&self) -> impl Iterator<Item = &str> {
        self.indicators.keys().map(String::as_str)
    }

    /// Number of times the scoring function has run.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    /// Verify a candidate. When the converter stamped an authoritative dish
    /// type equal to the request, accept without scoring.
    pub fn verify(&self, recipe: &Recipe, requested: &str, authoritative: bool) -> DishTypeVerdict {
        if authoritative && recipe.dish_type.eq_ignore_ascii_case(requested) {
            return DishTypeVerdict::trusted();
        }
        self.score(recipe, requested)
    }

    /// Score a recipe against a dish type. Unknown dish types are accepted.
    pub fn score(&self, recipe: &Recipe, requested: &str) -> DishTypeVerdict {
        self.evaluations.fetch_add(1, Ordering::Relaxed);

        let Some(indicators) = self.indicators.get(&requested.to_lowercase()) else {
            return DishTypeVerdict {
                accepted: true,
                score: 1.0,
                points: 0,
                max_points: 0,
                short_circuit: false,
            };
        };

        let mut points = 0;
        let mut max_points = 0;

        // Title is the most reliable indicator
        let title = recipe.title.to_lowercase();
        if indicators.title_words.iter().any(|w| title.contains(w.as_str())) {
            points += TITLE_POINTS;
        }
        max_points += TITLE_POINTS;

        if indicators.time_limit.is_some() || indicators.time_min.is_some() {
            let total = recipe.total_time();
            let under_limit = indicators.time_limit.is_none_or(|limit| total > 0 && total <= limit);
            let over_min = indicators.time_min.is_none_or(|min| total >= min);
            if under_limit && over_min {
                points += TIME_POINTS;
            }
            max_points += TIME_POINTS;
        }

        let instructions = recipe.instructions.join(" ").to_lowercase();
        if !instructions.trim().is_empty() {
            let patterns = indicators
                .instruction_patterns
                .iter()
                .filter(|p| instructions.contains(p.as_str()))
                .count() as u32;
            points += patterns.min(INSTRUCTION_POINTS_CAP);
            max_points += INSTRUCTION_POINTS_CAP;

            let equipment = indicators
                .equipment
                .iter()
                .filter(|e| instructions.contains(e.as_str()))
                .count() as u32;
            points += equipment.min(EQUIPMENT_POINTS_CAP);
            max_points += EQUIPMENT_POINTS_CAP;
        }

        if !indicators.ingredients.is_empty() {
            let hit = indicators
                .ingredients
                .iter()
                .any(|fragment| recipe.ingredient_slugs().any(|s| s.contains(fragment.as_str())));
            if hit {
                points += INGREDIENT_POINTS;
            }
            max_points += INGREDIENT_POINTS;
        }

        let score = if max_points > 0 {
            f64::from(points) / f64::from(max_points)
        } else {
            0.0
        };

        DishTypeVerdict {
            accepted: max_points > 0 && score >= ACCEPTANCE_THRESHOLD,
            score,
            points,
            max_points,
            short_circuit: false,
        }
    }
}
