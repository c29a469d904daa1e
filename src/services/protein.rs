//! Protein Combination Matcher.
//!
//! Decides whether a candidate recipe satisfies a (possibly multi-protein)
//! request and how well. Matching is set membership over canonical slugs
//! with family expansion applied to the requested side.

use std::collections::HashSet;

use crate::models::search::DietaryPreference;
use crate::services::catalog::IngredientCatalog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Proteins were requested and no subset of them is present.
    NoProteinCombination,
    /// Meat/fish found where the dietary rule forbids it.
    ContainsMeat(String),
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoProteinCombination => write!(f, "no requested protein combination present"),
            Self::ContainsMeat(slug) => write!(f, "contains meat ingredient '{slug}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProteinVerdict {
    /// Every requested protein is present.
    Full { matched: Vec<String> },
    /// The largest present subset of the requested proteins.
    Partial { matched: Vec<String>, requested: usize },
    /// No protein requested and the candidate is free of meat.
    VegetarianSafe,
    Rejected(RejectReason),
}

impl ProteinVerdict {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full { .. } | Self::VegetarianSafe)
    }

    /// Number of requested proteins matched; used to rank candidates so a
    /// recipe with all proteins always beats one with a subset.
    pub fn match_size(&self) -> usize {
        match self {
            Self::Full { matched } | Self::Partial { matched, .. } => matched.len(),
            Self::VegetarianSafe | Self::Rejected(_) => 0,
        }
    }
}

/// Requested ingredients flagged as protein, in request order, deduplicated.
pub fn requested_proteins(catalog: &IngredientCatalog, requested: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    requested
        .iter()
        .filter(|slug| catalog.is_protein(slug))
        .filter(|slug| seen.insert(slug.as_str()))
        .cloned()
        .collect()
}

/// All non-empty subsets, largest first; equal sizes keep request order.
pub fn protein_combinations(proteins: &[String]) -> Vec<Vec<String>> {
    let mut combos = Vec::new();
    for size in (1..=proteins.len()).rev() {
        let mut current = Vec::with_capacity(size);
        collect_combinations(proteins, size, 0, &mut current, &mut combos);
    }
    combos
}

fn collect_combinations(
    items: &[String],
    size: usize,
    start: usize,
    current: &mut Vec<String>,
    out: &mut Vec<Vec<String>>,
) {
    if current.len() == size {
        out.push(current.clone());
        return;
    }
    for i in start..items.len() {
        if items.len() - i < size - current.len() {
            break;
        }
        current.push(items[i].clone());
        collect_combinations(items, size, i + 1, current, out);
        current.pop();
    }
}

/// Evaluate a candidate's ingredient slugs against a request.
pub fn evaluate<'a>(
    catalog: &IngredientCatalog,
    requested: &[String],
    candidate: impl IntoIterator<Item = &'a str>,
    preference: DietaryPreference,
) -> ProteinVerdict {
    let present: HashSet<&str> = candidate.into_iter().collect();
    let proteins = requested_proteins(catalog, requested);

    let forbid_meat = proteins.is_empty() || preference == DietaryPreference::Vegetarian;
    if forbid_meat {
        let mut meats: Vec<&str> = present
            .iter()
            .copied()
            .filter(|slug| catalog.is_meat(slug))
            .collect();
        meats.sort_unstable();
        if let Some(meat) = meats.first() {
            return ProteinVerdict::Rejected(RejectReason::ContainsMeat(meat.to_string()));
        }
    }

    if proteins.is_empty() {
        return ProteinVerdict::VegetarianSafe;
    }

    let satisfied = |protein: &String| {
        catalog
            .expand(protein)
            .iter()
            .any(|slug| present.contains(slug.as_str()))
    };

    for combo in protein_combinations(&proteins) {
        if combo.iter().all(|protein| satisfied(protein)) {
            return if combo.len() == proteins.len() {
                ProteinVerdict::Full { matched: combo }
            } else {
                ProteinVerdict::Partial {
                    matched: combo,
                    requested: proteins.len(),
                }
            };
        }
    }

    ProteinVerdict::Rejected(RejectReason::NoProteinCombination)
}
