//! Genetic data checks run before a profile reaches the scoring engines.

use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use crate::error::{NutrigeneError, Result};
use crate::models::{GeneticProfile, SnpGenotype};

pub const DEFAULT_MIN_QUALITY: f64 = 20.0;

/// The observed genotype must be built from the declared reference and
/// alternate alleles only.
pub fn validate_genotype_consistency(genotype: &SnpGenotype) -> Result<()> {
    let reference = &genotype.reference_allele;
    let alternate = &genotype.alternate_allele;
    let valid = [
        format!("{reference}{reference}"),
        format!("{reference}{alternate}"),
        format!("{alternate}{reference}"),
        format!("{alternate}{alternate}"),
    ];

    if !valid.contains(&genotype.genotype) {
        return Err(NutrigeneError::DataValidation(format!(
            "Genotype '{}' inconsistent with ref={}, alt={} for {}",
            genotype.genotype, reference, alternate, genotype.rsid
        )));
    }
    Ok(())
}

/// Presence of each required rsID, in the order given.
pub fn profile_completeness(profile: &GeneticProfile, required: &[&str]) -> Vec<(String, bool)> {
    let available: HashSet<&str> = profile.available_rsids().into_iter().collect();
    required
        .iter()
        .map(|rsid| (rsid.to_string(), available.contains(rsid)))
        .collect()
}

pub fn missing_rsids(profile: &GeneticProfile, required: &[&str]) -> Vec<String> {
    profile_completeness(profile, required)
        .into_iter()
        .filter(|(_, present)| !present)
        .map(|(rsid, _)| rsid)
        .collect()
}

pub fn flag_low_quality(profile: &GeneticProfile, min_quality: f64) -> Vec<String> {
    let mut low_quality = Vec::new();
    for genotype in &profile.genotypes {
        if let Some(quality) = genotype.quality_score {
            if quality < min_quality {
                warn!("Low quality genotype: {} (Q={:.1})", genotype.rsid, quality);
                low_quality.push(genotype.rsid.clone());
            }
        }
    }
    low_quality
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub valid: bool,
    pub missing: Vec<String>,
    pub low_quality: Vec<String>,
    pub inconsistent: Vec<String>,
    pub total_variants: usize,
    pub coverage: f64,
}

/// Runs every check and collects the findings instead of stopping at the
/// first one.
pub fn validate_profile(
    profile: &GeneticProfile,
    required: &[&str],
    min_quality: f64,
) -> ValidationSummary {
    let missing = missing_rsids(profile, required);
    let low_quality = flag_low_quality(profile, min_quality);
    let inconsistent: Vec<String> = profile
        .genotypes
        .iter()
        .filter(|g| validate_genotype_consistency(g).is_err())
        .map(|g| g.rsid.clone())
        .collect();

    let coverage = if required.is_empty() {
        0.0
    } else {
        (required.len() - missing.len()) as f64 / required.len() as f64
    };

    ValidationSummary {
        valid: inconsistent.is_empty() && !profile.genotypes.is_empty(),
        missing,
        low_quality,
        inconsistent,
        total_variants: profile.genotypes.len(),
        coverage,
    }
}
