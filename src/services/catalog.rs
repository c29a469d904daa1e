//! Ingredient Catalog: canonical slugs, cuisine affinity, protein and meat
//! flags, and the one-directional ingredient family expansion table.
//!
//! The slug is the only join key between requests, recipes and families.
//! Free-form ingredient names are canonicalized here before anything else
//! compares them.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use strsim::jaro_winkler;

use crate::services::atlas::normalize_cuisine;
use crate::services::knowledge::KnowledgeError;

/// Minimum Jaro-Winkler similarity for a misspelled name to snap to a slug.
const FUZZY_MATCH_THRESHOLD: f64 = 0.94;

/// Names shorter than this are never fuzzy-matched ("ham" vs "yam").
const FUZZY_MIN_LEN: usize = 5;

#[derive(Debug, Deserialize)]
struct IngredientEntry {
    slug: String,
    name: String,
    #[serde(default)]
    cuisines: Vec<String>,
    #[serde(default)]
    is_protein: bool,
    #[serde(default)]
    is_meat: bool,
    #[serde(default)]
    aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ingredient {
    pub slug: String,
    pub display_name: String,
    /// Empty means universal
    pub allowed_cuisines: Vec<String>,
    pub is_protein: bool,
    /// Meat or fish; always also a protein
    pub is_meat: bool,
}

impl Ingredient {
    pub fn is_universal(&self) -> bool {
        self.allowed_cuisines.is_empty()
    }

    pub fn fits_cuisine(&self, cuisine_key: &str) -> bool {
        self.is_universal() || self.allowed_cuisines.iter().any(|c| c == cuisine_key)
    }
}

/// Turn a free-form ingredient name into slug form: lower-case words joined by `_`.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Singular candidates for a plural slug, most specific rule first.
fn singular_forms(slug: &str) -> Vec<String> {
    let mut forms = Vec::new();
    if let Some(stem) = slug.strip_suffix("ies") {
        forms.push(format!("{stem}y"));
    }
    if let Some(stem) = slug.strip_suffix("es") {
        forms.push(stem.to_string());
    }
    if let Some(stem) = slug.strip_suffix('s') {
        if !stem.ends_with('s') {
            forms.push(stem.to_string());
        }
    }
    forms
}

/// Immutable after load.
#[derive(Debug, Clone)]
pub struct IngredientCatalog {
    ingredients: HashMap<String, Ingredient>,
    /// Alias slug → canonical slug
    aliases: HashMap<String, String>,
    /// Head slug → member slugs
    families: HashMap<String, Vec<String>>,
}

impl IngredientCatalog {
    /// Build the catalog from the ingredient list and the family table.
    /// Family members inherit the protein and meat flags of their head.
    pub fn from_json(ingredients_json: &str, families_json: &str) -> Result<Self, KnowledgeError> {
        let entries: Vec<IngredientEntry> = serde_json::from_str(ingredients_json)?;
        let families: BTreeMap<String, Vec<String>> = serde_json::from_str(families_json)?;

        let mut ingredients = HashMap::with_capacity(entries.len());
        let mut aliases = HashMap::new();

        for entry in entries {
            let slug = slugify(&entry.slug);
            for alias in &entry.aliases {
                aliases.insert(slugify(alias), slug.clone());
            }
            ingredients.insert(
                slug.clone(),
                Ingredient {
                    slug,
                    display_name: entry.name,
                    allowed_cuisines: entry.cuisines.iter().map(|c| normalize_cuisine(c)).collect(),
                    is_protein: entry.is_protein || entry.is_meat,
                    is_meat: entry.is_meat,
                },
            );
        }

        let mut family_table = HashMap::with_capacity(families.len());
        for (head, members) in families {
            let head = slugify(&head);
            let (head_protein, head_meat) = match ingredients.get(&head) {
                Some(i) => (i.is_protein, i.is_meat),
                None => return Err(KnowledgeError::UnknownFamilyHead(head)),
            };
            let members: Vec<String> = members.iter().map(|m| slugify(m)).collect();
            for member in &members {
                let entry = ingredients.entry(member.clone()).or_insert_with(|| Ingredient {
                    slug: member.clone(),
                    display_name: title_from_slug(member),
                    allowed_cuisines: Vec::new(),
                    is_protein: false,
                    is_meat: false,
                });
                entry.is_protein |= head_protein;
                entry.is_meat |= head_meat;
            }
            family_table.insert(head, members);
        }

        Ok(Self {
            ingredients,
            aliases,
            families: family_table,
        })
    }

    pub fn get(&self, slug: &str) -> Option<&Ingredient> {
        self.ingredients.get(slug)
    }

    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }

    fn lookup_exact(&self, slug: &str) -> Option<&str> {
        if let Some(i) = self.ingredients.get(slug) {
            return Some(i.slug.as_str());
        }
        self.aliases.get(slug).map(String::as_str)
    }

    fn lookup_with_plurals(&self, slug: &str) -> Option<&str> {
        self.lookup_exact(slug).or_else(|| {
            singular_forms(slug)
                .iter()
                .find_map(|form| self.lookup_exact(form))
        })
    }

    /// Canonicalize a free-form ingredient name. Unknown names come back in
    /// plain slug form so they can still be compared verbatim.
    ///
    /// Resolution order: exact slug or alias, singular forms, progressively
    /// shorter trailing word runs ("extra virgin olive oil" → `olive_oil`),
    /// then a Jaro-Winkler near-match for misspellings.
    pub fn canonical_slug(&self, name: &str) -> String {
        let slug = slugify(name);
        if slug.is_empty() {
            return slug;
        }
        if let Some(found) = self.lookup_with_plurals(&slug) {
            return found.to_string();
        }

        let words: Vec<&str> = slug.split('_').collect();
        for start in 1..words.len() {
            let tail = words[start..].join("_");
            if let Some(found) = self.lookup_with_plurals(&tail) {
                return found.to_string();
            }
        }

        if slug.chars().count() >= FUZZY_MIN_LEN {
            let best = self
                .ingredients
                .keys()
                .chain(self.aliases.keys())
                .map(|candidate| (candidate, jaro_winkler(&slug, candidate)))
                .filter(|(_, score)| *score >= FUZZY_MATCH_THRESHOLD)
                .max_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.0.cmp(a.0)));
            if let Some((candidate, _)) = best {
                if let Some(found) = self.lookup_exact(candidate) {
                    return found.to_string();
                }
            }
        }

        slug
    }

    /// The slug itself followed by its family members, if it is a family head.
    /// A specific member never expands back to its head.
    pub fn expand(&self, slug: &str) -> Vec<String> {
        let mut expanded = vec![slug.to_string()];
        if let Some(members) = self.families.get(slug) {
            expanded.extend(members.iter().cloned());
        }
        expanded
    }

    pub fn is_protein(&self, slug: &str) -> bool {
        self.ingredients.get(slug).is_some_and(|i| i.is_protein)
    }

    /// Meat or fish. Compound slugs not flagged as meat are still checked
    /// word by word, so `chicken_stock` and `fish_sauce` count as meat.
    pub fn is_meat(&self, slug: &str) -> bool {
        if self.ingredients.get(slug).is_some_and(|i| i.is_meat) {
            return true;
        }
        slug.split('_').any(|word| {
            self.lookup_with_plurals(word)
                .and_then(|s| self.ingredients.get(s))
                .is_some_and(|i| i.is_meat)
        })
    }

    pub fn display_name(&self, slug: &str) -> String {
        self.ingredients
            .get(slug)
            .map(|i| i.display_name.clone())
            .unwrap_or_else(|| title_from_slug(slug))
    }

    /// Whether the requested ingredients are plausible for a cuisine.
    ///
    /// Ingredients that are universal or uncatalogued never count against a
    /// cuisine. The set is compatible while the incompatible share stays
    /// below `threshold`. An empty request is always compatible.
    pub fn compatible_with(&self, slugs: &[String], cuisine: &str, threshold: f64) -> bool {
        if slugs.is_empty() {
            return true;
        }
        let cuisine = normalize_cuisine(cuisine);
        let incompatible = slugs
            .iter()
            .filter(|slug| {
                self.ingredients
                    .get(slug.as_str())
                    .is_some_and(|i| !i.fits_cuisine(&cuisine))
            })
            .count();
        (incompatible as f64) < threshold * slugs.len() as f64
    }

    /// Cuisines ranked by how many of the given ingredients list them as an
    /// affinity. Universal ingredients contribute nothing.
    pub fn affinity_scores(&self, slugs: &[String]) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for slug in slugs {
            if let Some(ingredient) = self.ingredients.get(slug.as_str()) {
                for cuisine in &ingredient.allowed_cuisines {
                    *counts.entry(cuisine.as_str()).or_default() += 1;
                }
            }
        }
        let mut ranked: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(cuisine, count)| (cuisine.to_string(), count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    /// Non-protein ingredients specific to a cuisine (its characteristic seasonings).
    pub fn typical_for(&self, cuisine: &str) -> Vec<&Ingredient> {
        let cuisine = normalize_cuisine(cuisine);
        let mut typical: Vec<&Ingredient> = self
            .ingredients
            .values()
            .filter(|i| !i.is_protein && !i.is_universal() && i.fits_cuisine(&cuisine))
            .collect();
        typical.sort_by(|a, b| a.slug.cmp(&b.slug));
        typical
    }
}

fn title_from_slug(slug: &str) -> String {
    crate::services::atlas::display_cuisine(&slug.replace('_', " "))
}
