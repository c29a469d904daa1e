//! Cuisine Atlas: Region → Subregion → country cuisine, plus the lossy
//! mapping from each cuisine to the category vocabulary used by external
//! recipe providers.
//!
//! Coverage is intentionally partial. Unknown cuisines resolve to `None` or
//! an empty sister list rather than an error.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::services::knowledge::KnowledgeError;

/// Normalize a cuisine key: lower-case, `_`/`-` become spaces, whitespace collapsed.
pub fn normalize_cuisine(raw: &str) -> String {
    raw.to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title-case a normalized cuisine key for display ("puerto rican" → "Puerto Rican").
pub fn display_cuisine(key: &str) -> String {
    key.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[derive(Debug, Deserialize)]
struct AtlasFile {
    regions: BTreeMap<String, RegionEntry>,
    #[serde(default)]
    provider_categories: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RegionEntry {
    name: String,
    subregions: BTreeMap<String, SubregionEntry>,
}

#[derive(Debug, Deserialize)]
struct SubregionEntry {
    name: String,
    cuisines: Vec<String>,
}

/// Where a cuisine sits in the atlas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub region_key: String,
    pub region_name: String,
    pub subregion_key: String,
    pub subregion_name: String,
}

#[derive(Debug, Clone)]
pub struct CuisineNode {
    pub key: String,
    pub display_name: String,
    pub region: Region,
}

/// Immutable after load.
#[derive(Debug, Clone)]
pub struct CuisineAtlas {
    cuisines: HashMap<String, CuisineNode>,
    /// (region key, subregion key) → member cuisines in file order
    members: HashMap<(String, String), Vec<String>>,
    provider_categories: HashMap<String, String>,
    /// Lower-cased provider category vocabulary
    category_vocabulary: HashSet<String>,
}

impl CuisineAtlas {
    /// Build the atlas from its JSON document. A cuisine listed under two
    /// subregions is rejected.
    pub fn from_json(json: &str) -> Result<Self, KnowledgeError> {
        let file: AtlasFile = serde_json::from_str(json)?;

        let mut cuisines = HashMap::new();
        let mut members = HashMap::new();

        for (region_key, region) in &file.regions {
            for (subregion_key, subregion) in &region.subregions {
                let mut keys = Vec::with_capacity(subregion.cuisines.len());
                for raw in &subregion.cuisines {
                    let key = normalize_cuisine(raw);
                    let node = CuisineNode {
                        key: key.clone(),
                        display_name: display_cuisine(&key),
                        region: Region {
                            region_key: region_key.clone(),
                            region_name: region.name.clone(),
                            subregion_key: subregion_key.clone(),
                            subregion_name: subregion.name.clone(),
                        },
                    };
                    if cuisines.insert(key.clone(), node).is_some() {
                        return Err(KnowledgeError::DuplicateCuisine(key));
                    }
                    keys.push(key);
                }
                members.insert((region_key.clone(), subregion_key.clone()), keys);
            }
        }

        let provider_categories: HashMap<String, String> = file
            .provider_categories
            .into_iter()
            .map(|(cuisine, category)| (normalize_cuisine(&cuisine), category))
            .collect();
        let category_vocabulary = provider_categories
            .values()
            .map(|c| normalize_cuisine(c))
            .collect();

        Ok(Self {
            cuisines,
            members,
            provider_categories,
            category_vocabulary,
        })
    }

    pub fn node(&self, cuisine: &str) -> Option<&CuisineNode> {
        self.cuisines.get(&normalize_cuisine(cuisine))
    }

    pub fn region_of(&self, cuisine: &str) -> Option<&Region> {
        self.node(cuisine).map(|n| &n.region)
    }

    /// Other members of the cuisine's subregion, in atlas order.
    pub fn sisters_of(&self, cuisine: &str) -> Vec<String> {
        let Some(node) = self.node(cuisine) else {
            return Vec::new();
        };
        let subregion = (node.region.region_key.clone(), node.region.subregion_key.clone());
        self.members
            .get(&subregion)
            .map(|keys| keys.iter().filter(|k| **k != node.key).cloned().collect())
            .unwrap_or_default()
    }

    /// Coarse provider category for a cuisine (many-to-one).
    pub fn provider_category_of(&self, cuisine: &str) -> Option<&str> {
        self.provider_categories
            .get(&normalize_cuisine(cuisine))
            .map(String::as_str)
    }

    /// Whether the term is itself part of the provider category vocabulary
    /// (e.g. "Mexican", "Indian").
    pub fn is_provider_category(&self, term: &str) -> bool {
        self.category_vocabulary.contains(&normalize_cuisine(term))
    }

    pub fn contains(&self, cuisine: &str) -> bool {
        self.node(cuisine).is_some()
    }

    pub fn cuisine_count(&self) -> usize {
        self.cuisines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "regions": {
            "african": { "name": "African", "subregions": {
                "east_african": { "name": "East African", "cuisines": ["ethiopian", "kenyan", "somali"] }
            }},
            "american": { "name": "American", "subregions": {
                "north_american": { "name": "North American", "cuisines": ["mexican", "american", "Tex-Mex"] }
            }}
        },
        "provider_categories": { "ethiopian": "African", "mexican": "Mexican", "tex-mex": "Mexican" }
    }"#;

    fn atlas() -> CuisineAtlas {
        CuisineAtlas::from_json(FIXTURE).unwrap()
    }

    #[test]
    fn test_region_lookup() {
        let atlas = atlas();
        let region = atlas.region_of("Ethiopian").unwrap();
        assert_eq!(region.region_name, "African");
        assert_eq!(region.subregion_key, "east_african");
        assert!(atlas.region_of("atlantean").is_none());
    }

    #[test]
    fn test_sisters_exclude_self_and_keep_order() {
        let atlas = atlas();
        assert_eq!(atlas.sisters_of("ethiopian"), vec!["kenyan", "somali"]);
        assert_eq!(atlas.sisters_of("tex_mex"), vec!["mexican", "american"]);
        assert!(atlas.sisters_of("atlantean").is_empty());
    }

    #[test]
    fn test_provider_category_mapping() {
        let atlas = atlas();
        assert_eq!(atlas.provider_category_of("ethiopian"), Some("African"));
        assert_eq!(atlas.provider_category_of("TEX-MEX"), Some("Mexican"));
        assert_eq!(atlas.provider_category_of("kenyan"), None);
        assert!(atlas.is_provider_category("mexican"));
        assert!(atlas.is_provider_category("African"));
        assert!(!atlas.is_provider_category("ethiopian"));
    }

    #[test]
    fn test_duplicate_cuisine_rejected() {
        let json = r#"{"regions": {"a": {"name": "A", "subregions": {
            "x": {"name": "X", "cuisines": ["thai"]},
            "y": {"name": "Y", "cuisines": ["thai"]}
        }}}}"#;
        assert!(matches!(
            CuisineAtlas::from_json(json),
            Err(KnowledgeError::DuplicateCuisine(c)) if c == "thai"
        ));
    }

    #[test]
    fn test_subregion_key_reused_across_regions_stays_separate() {
        let json = r#"{"regions": {
            "asian": {"name": "Asian", "subregions": {
                "coastal": {"name": "Coastal", "cuisines": ["thai", "vietnamese"]}
            }},
            "european": {"name": "European", "subregions": {
                "coastal": {"name": "Coastal", "cuisines": ["portuguese", "galician"]}
            }}
        }}"#;
        let atlas = CuisineAtlas::from_json(json).unwrap();
        assert_eq!(atlas.sisters_of("thai"), vec!["vietnamese"]);
        assert_eq!(atlas.sisters_of("portuguese"), vec!["galician"]);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(display_cuisine("puerto rican"), "Puerto Rican");
        assert_eq!(atlas().node("tex-mex").unwrap().display_name, "Tex Mex");
    }
}
