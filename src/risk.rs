use statrs::function::erf::erf;
use tracing::{debug, warn};

use crate::catalog::{TraitCatalog, TraitModel};
use crate::epsilon::{self, EpsilonLoci};
use crate::error::{NutrigeneError, Result};
use crate::knowledge::KnowledgeProvider;
use crate::models::{Confidence, EvidenceLevel, GeneticProfile, RiskCategory, RiskScore};

pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Standard normal CDF expressed as a percentile, two decimals.
pub fn z_to_percentile(z: f64) -> f64 {
    round_to(50.0 * (1.0 + erf(z / std::f64::consts::SQRT_2)), 2)
}

pub fn categorize_risk(z: f64) -> RiskCategory {
    RiskCategory::from_z(z)
}

/// Additive-model z-score under Hardy-Weinberg allele counts.
///
/// expected = 2pβ, variance = 2p(1-p)β². A zero variance falls back to a
/// unit standard deviation.
pub fn additive_z(risk_allele_count: u32, beta: f64, freq: f64) -> f64 {
    let raw = beta * risk_allele_count as f64;
    let expected = 2.0 * freq * beta;
    let variance = 2.0 * freq * (1.0 - freq) * beta.powi(2);
    let std_dev = if variance > 0.0 { variance.sqrt() } else { 1.0 };
    round_to((raw - expected) / std_dev, 4)
}

fn build_score(
    trait_name: &str,
    z: f64,
    contributing_variants: Vec<String>,
    confidence: Confidence,
) -> RiskScore {
    RiskScore {
        trait_name: trait_name.to_string(),
        score: z,
        percentile: z_to_percentile(z),
        risk_category: categorize_risk(z),
        contributing_variants,
        confidence,
    }
}

pub struct RiskScoringEngine<'a> {
    knowledge: &'a dyn KnowledgeProvider,
    catalog: &'a TraitCatalog,
}

impl<'a> RiskScoringEngine<'a> {
    pub fn new(knowledge: &'a dyn KnowledgeProvider, catalog: &'a TraitCatalog) -> Self {
        Self { knowledge, catalog }
    }

    /// Scores one variant. `Ok(None)` when the profile lacks it; an error
    /// when the profile has it but the knowledge base does not.
    pub fn single_variant(&self, profile: &GeneticProfile, rsid: &str) -> Result<Option<RiskScore>> {
        let Some(genotype) = profile.genotype(rsid) else {
            warn!("rsID {} not found in profile {}", rsid, profile.individual_id);
            return Ok(None);
        };

        let pair = self.knowledge.pair_by_rsid(rsid).ok_or_else(|| {
            NutrigeneError::RiskScoring(format!("rsID {rsid} not in knowledge base"))
        })?;

        let risk_allele_count = genotype.genotype.matches(pair.risk_allele.as_str()).count() as u32;
        let z = additive_z(
            risk_allele_count,
            pair.effect_size.value,
            pair.allele_freq_east_asian,
        );
        let confidence = match pair.evidence_level {
            EvidenceLevel::A | EvidenceLevel::B => Confidence::High,
            EvidenceLevel::C | EvidenceLevel::D => Confidence::Medium,
        };

        Ok(Some(build_score(
            &format!("{}_{}", pair.gene, pair.nutrient),
            z,
            vec![rsid.to_string()],
            confidence,
        )))
    }

    /// Mean of the available per-variant z-scores. Absent variants are
    /// skipped rather than counted as zero.
    pub fn polygenic(
        &self,
        profile: &GeneticProfile,
        trait_name: &str,
        rsids: &[String],
    ) -> Result<Option<RiskScore>> {
        let mut scores = Vec::new();
        let mut contributing = Vec::new();

        for rsid in rsids {
            if let Some(result) = self.single_variant(profile, rsid)? {
                scores.push(result.score);
                contributing.push(rsid.clone());
            }
        }

        if scores.is_empty() {
            return Ok(None);
        }

        let combined = round_to(scores.iter().sum::<f64>() / scores.len() as f64, 4);
        let confidence = if contributing.len() >= 2 {
            Confidence::High
        } else {
            Confidence::Medium
        };

        Ok(Some(build_score(trait_name, combined, contributing, confidence)))
    }

    pub fn epsilon(
        &self,
        profile: &GeneticProfile,
        trait_name: &str,
        loci: &EpsilonLoci,
    ) -> Option<RiskScore> {
        let (Some(first), Some(second)) = (profile.genotype(&loci.first), profile.genotype(&loci.second))
        else {
            warn!("APOE SNPs missing for profile {}", profile.individual_id);
            return None;
        };

        let Some(class) = epsilon::classify(&first.genotype, &second.genotype) else {
            warn!(
                "Unrecognized APOE genotype combination: ({}, {})",
                first.genotype, second.genotype
            );
            return None;
        };

        let z = class.representative_z();
        debug!(
            "{} APOE {} for profile {}",
            trait_name,
            class.label(),
            profile.individual_id
        );
        Some(RiskScore {
            trait_name: trait_name.to_string(),
            score: z,
            percentile: z_to_percentile(z),
            risk_category: class.risk_category(),
            contributing_variants: loci.rsids(),
            confidence: Confidence::High,
        })
    }

    pub fn score_trait(&self, profile: &GeneticProfile, trait_name: &str) -> Result<Option<RiskScore>> {
        let Some(definition) = self.catalog.get(trait_name) else {
            warn!("Unknown trait {}", trait_name);
            return Ok(None);
        };

        let score = match &definition.model {
            TraitModel::Additive(rsids) => self.polygenic(profile, trait_name, rsids)?,
            TraitModel::Epsilon(loci) => self.epsilon(profile, trait_name, loci),
        };
        if let Some(score) = &score {
            debug!(
                "{} scored {:.4} ({:?}) from {} variants",
                trait_name,
                score.score,
                score.risk_category,
                score.contributing_variants.len()
            );
        }
        Ok(score)
    }

    /// Every catalog trait that yields a score, in catalog order.
    pub fn score_all(&self, profile: &GeneticProfile) -> Result<Vec<RiskScore>> {
        let mut results = Vec::new();
        for definition in self.catalog.iter() {
            if let Some(score) = self.score_trait(profile, &definition.name)? {
                results.push(score);
            }
        }
        Ok(results)
    }
}
