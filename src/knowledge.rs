//! Gene-nutrient knowledge base.
//!
//! Tables are read once from a directory of YAML files, cross-checked, and
//! then served read-only through [`KnowledgeProvider`].

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{NutrigeneError, Result};
use crate::models::{EffectSize, EvidenceLevel, GeneNutrientPair, Priority, RiskCategory};

/// Frequency column copied onto each pair and used for scoring.
pub const REFERENCE_POPULATION: &str = "east_asian";

/// Read-only access to curated gene-nutrient knowledge.
pub trait KnowledgeProvider: Send + Sync {
    fn pair_by_rsid(&self, rsid: &str) -> Option<&GeneNutrientPair>;

    fn pairs_by_gene(&self, gene: &str) -> Vec<&GeneNutrientPair>;

    fn recommendation_rules(&self, gene_key: &str) -> Option<&RecommendationRules>;

    /// Allele frequency for an internal variant key (e.g. `MTHFR_C677T`).
    fn allele_frequency(&self, variant_key: &str, population: &str) -> Option<f64>;

    fn tracked_rsids(&self) -> Vec<&str>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneInfo {
    pub name: String,
    pub chromosome: String,
    #[serde(default)]
    pub function: String,
}

/// One row of `variants.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantEntry {
    pub gene: String,
    pub rsid: String,
    pub nutrient: String,
    pub risk_allele: String,
    pub protective_allele: String,
    pub evidence_level: EvidenceLevel,
    #[serde(default)]
    pub pubmed_ids: Vec<String>,
}

fn default_multiplier() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTier {
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_multiplier")]
    pub dri_multiplier: f64,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub food_sources: Vec<String>,
    #[serde(default)]
    pub supplementation: Option<String>,
}

/// Tiered recommendation rules for one gene key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRules {
    pub nutrient: String,
    #[serde(default)]
    pub high_risk: Option<RuleTier>,
    #[serde(default)]
    pub moderate_risk: Option<RuleTier>,
    #[serde(default)]
    pub low_risk: Option<RuleTier>,
}

impl RecommendationRules {
    pub fn tier(&self, category: RiskCategory) -> Option<&RuleTier> {
        match category {
            RiskCategory::High => self.high_risk.as_ref(),
            RiskCategory::Moderate => self.moderate_risk.as_ref(),
            RiskCategory::Low => self.low_risk.as_ref(),
        }
    }

    fn tiers(&self) -> impl Iterator<Item = (&'static str, &RuleTier)> {
        [
            ("high_risk", self.high_risk.as_ref()),
            ("moderate_risk", self.moderate_risk.as_ref()),
            ("low_risk", self.low_risk.as_ref()),
        ]
        .into_iter()
        .filter_map(|(key, tier)| tier.map(|t| (key, t)))
    }
}

/// Raw knowledge tables as they appear on disk, keyed by internal variant key.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeTables {
    pub genes: BTreeMap<String, GeneInfo>,
    pub variants: BTreeMap<String, VariantEntry>,
    pub allele_frequencies: BTreeMap<String, BTreeMap<String, f64>>,
    pub effect_sizes: BTreeMap<String, EffectSize>,
    pub recommendations: BTreeMap<String, RecommendationRules>,
}

impl KnowledgeTables {
    pub fn read_dir(dir: &Path) -> Result<Self> {
        Ok(Self {
            genes: read_yaml(&dir.join("genes.yaml"))?,
            variants: read_yaml(&dir.join("variants.yaml"))?,
            allele_frequencies: read_yaml(&dir.join("allele_frequencies.yaml"))?,
            effect_sizes: read_yaml(&dir.join("effect_sizes.yaml"))?,
            recommendations: read_yaml(&dir.join("recommendations.yaml"))?,
        })
    }
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        NutrigeneError::KnowledgeBase(format!("Failed to read {}: {e}", path.display()))
    })?;
    let parsed = serde_yaml::from_str(&content).map_err(|e| {
        NutrigeneError::KnowledgeBase(format!("Invalid YAML in {}: {e}", path.display()))
    })?;
    debug!("Loaded config from {}", path.display());
    Ok(parsed)
}

#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    genes: BTreeMap<String, GeneInfo>,
    pairs: BTreeMap<String, GeneNutrientPair>,
    by_rsid: HashMap<String, String>,
    allele_frequencies: BTreeMap<String, BTreeMap<String, f64>>,
    recommendations: BTreeMap<String, RecommendationRules>,
}

impl KnowledgeBase {
    pub fn load(dir: &Path) -> Result<Self> {
        let tables = KnowledgeTables::read_dir(dir)?;
        let kb = Self::from_tables(tables)?;
        info!(
            "Loaded {} gene-nutrient pairs from {}",
            kb.pair_count(),
            dir.display()
        );
        Ok(kb)
    }

    /// Cross-checks every table before anything becomes queryable.
    pub fn from_tables(tables: KnowledgeTables) -> Result<Self> {
        let KnowledgeTables {
            genes,
            variants,
            allele_frequencies,
            effect_sizes,
            recommendations,
        } = tables;

        for (population_key, frequencies) in &allele_frequencies {
            for (population, freq) in frequencies {
                if !(0.0..=1.0).contains(freq) {
                    return Err(NutrigeneError::ConfigValidation(format!(
                        "Allele frequency {freq} for {population_key}/{population} out of range [0, 1]"
                    )));
                }
            }
        }

        let mut pairs = BTreeMap::new();
        let mut by_rsid = HashMap::new();

        for (variant_key, entry) in variants {
            let effect_size = effect_sizes.get(&variant_key).ok_or_else(|| {
                NutrigeneError::ConfigValidation(format!(
                    "Missing effect size for variant {variant_key}"
                ))
            })?;
            let frequencies = allele_frequencies.get(&variant_key).ok_or_else(|| {
                NutrigeneError::ConfigValidation(format!(
                    "Missing allele frequency for variant {variant_key}"
                ))
            })?;
            let reference_freq = frequencies.get(REFERENCE_POPULATION).copied().ok_or_else(|| {
                NutrigeneError::ConfigValidation(format!(
                    "Missing {REFERENCE_POPULATION} allele frequency for variant {variant_key}"
                ))
            })?;
            if !genes.contains_key(&entry.gene) {
                return Err(NutrigeneError::ConfigValidation(format!(
                    "Variant {variant_key} references unknown gene {}",
                    entry.gene
                )));
            }

            let pair = GeneNutrientPair {
                gene: entry.gene,
                variant_rsid: entry.rsid,
                nutrient: entry.nutrient,
                risk_allele: entry.risk_allele,
                protective_allele: entry.protective_allele,
                effect_size: effect_size.clone(),
                allele_freq_east_asian: reference_freq,
                evidence_level: entry.evidence_level,
                pubmed_ids: entry.pubmed_ids,
            };
            pair.check_bounds().map_err(|e| {
                NutrigeneError::ConfigValidation(format!(
                    "Variant {variant_key} validation failed: {e}"
                ))
            })?;

            if let Some(previous) = by_rsid.insert(pair.variant_rsid.clone(), variant_key.clone()) {
                return Err(NutrigeneError::ConfigValidation(format!(
                    "rsID {} is declared by both {previous} and {variant_key}",
                    pair.variant_rsid
                )));
            }
            pairs.insert(variant_key, pair);
        }

        for (gene_key, rules) in &recommendations {
            for (tier_key, tier) in rules.tiers() {
                if !tier.dri_multiplier.is_finite() || tier.dri_multiplier < 0.0 {
                    return Err(NutrigeneError::ConfigValidation(format!(
                        "Invalid dri_multiplier {} in {gene_key}.{tier_key}",
                        tier.dri_multiplier
                    )));
                }
            }
        }

        Ok(Self {
            genes,
            pairs,
            by_rsid,
            allele_frequencies,
            recommendations,
        })
    }

    pub fn gene_info(&self, gene: &str) -> Option<&GeneInfo> {
        self.genes.get(gene)
    }

    pub fn variant_keys(&self) -> Vec<&str> {
        self.pairs.keys().map(String::as_str).collect()
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    pub fn gene_count(&self) -> usize {
        self.genes.len()
    }
}

impl KnowledgeProvider for KnowledgeBase {
    fn pair_by_rsid(&self, rsid: &str) -> Option<&GeneNutrientPair> {
        self.by_rsid.get(rsid).and_then(|key| self.pairs.get(key))
    }

    fn pairs_by_gene(&self, gene: &str) -> Vec<&GeneNutrientPair> {
        self.pairs.values().filter(|p| p.gene == gene).collect()
    }

    fn recommendation_rules(&self, gene_key: &str) -> Option<&RecommendationRules> {
        self.recommendations.get(gene_key)
    }

    fn allele_frequency(&self, variant_key: &str, population: &str) -> Option<f64> {
        self.allele_frequencies
            .get(variant_key)
            .and_then(|freqs| freqs.get(population))
            .copied()
    }

    fn tracked_rsids(&self) -> Vec<&str> {
        self.pairs.values().map(|p| p.variant_rsid.as_str()).collect()
    }
}
