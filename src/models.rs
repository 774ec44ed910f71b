use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NutrigeneError, Result};

const CHROMOSOMES: [&str; 25] = [
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16", "17",
    "18", "19", "20", "21", "22", "X", "Y", "MT",
];

/// `rs` followed by at least one digit.
pub fn is_rsid(value: &str) -> bool {
    value
        .strip_prefix("rs")
        .map(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// Non-empty string over `A`, `C`, `G`, `T`.
pub fn is_nucleotides(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T'))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zygosity {
    #[serde(rename = "homozygous_reference")]
    HomozygousReference,
    #[serde(rename = "heterozygous")]
    Heterozygous,
    #[serde(rename = "homozygous_alternate")]
    HomozygousAlternate,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Zygosity {
    /// Classify an observed two-letter genotype against single-base alleles.
    pub fn classify(reference: &str, alternate: &str, genotype: &str) -> Self {
        let homozygous_ref = format!("{reference}{reference}");
        let homozygous_alt = format!("{alternate}{alternate}");
        let het = format!("{reference}{alternate}");
        let het_reversed = format!("{alternate}{reference}");

        if genotype == homozygous_ref {
            Zygosity::HomozygousReference
        } else if genotype == homozygous_alt {
            Zygosity::HomozygousAlternate
        } else if genotype == het || genotype == het_reversed {
            Zygosity::Heterozygous
        } else {
            Zygosity::Unknown
        }
    }
}

/// Single SNP genotype observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnpGenotype {
    pub rsid: String,
    pub chromosome: String,
    pub position: u64,
    pub reference_allele: String,
    pub alternate_allele: String,
    pub genotype: String,
    pub zygosity: Zygosity,
    pub quality_score: Option<f64>,
}

impl SnpGenotype {
    /// Builds an observation after checking field formats and bounds.
    ///
    /// Whether `genotype` is made of the declared alleles is left to
    /// [`crate::validate::validate_genotype_consistency`], so inconsistent
    /// calls can still be loaded and reported on.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rsid: impl Into<String>,
        chromosome: impl Into<String>,
        position: u64,
        reference_allele: impl Into<String>,
        alternate_allele: impl Into<String>,
        genotype: impl Into<String>,
        zygosity: Zygosity,
        quality_score: Option<f64>,
    ) -> Result<Self> {
        let observation = Self {
            rsid: rsid.into(),
            chromosome: chromosome.into(),
            position,
            reference_allele: reference_allele.into(),
            alternate_allele: alternate_allele.into(),
            genotype: genotype.into(),
            zygosity,
            quality_score,
        };
        observation.check_bounds()?;
        Ok(observation)
    }

    pub fn check_bounds(&self) -> Result<()> {
        if !is_rsid(&self.rsid) {
            return Err(NutrigeneError::DataValidation(format!(
                "Invalid rsID '{}'",
                self.rsid
            )));
        }
        if !CHROMOSOMES.contains(&self.chromosome.as_str()) {
            return Err(NutrigeneError::DataValidation(format!(
                "Invalid chromosome '{}' for {}",
                self.chromosome, self.rsid
            )));
        }
        if self.position == 0 {
            return Err(NutrigeneError::DataValidation(format!(
                "Position must be positive for {}",
                self.rsid
            )));
        }
        for allele in [&self.reference_allele, &self.alternate_allele] {
            if !is_nucleotides(allele) {
                return Err(NutrigeneError::DataValidation(format!(
                    "Invalid allele '{}' for {}",
                    allele, self.rsid
                )));
            }
        }
        if self.genotype.len() != 2 || !is_nucleotides(&self.genotype) {
            return Err(NutrigeneError::DataValidation(format!(
                "Invalid genotype '{}' for {}",
                self.genotype, self.rsid
            )));
        }
        if let Some(quality) = self.quality_score {
            if !(0.0..=100.0).contains(&quality) {
                return Err(NutrigeneError::DataValidation(format!(
                    "Quality score {} out of range [0, 100] for {}",
                    quality, self.rsid
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Population {
    #[default]
    HanChinese,
    EastAsian,
    Other,
}

impl Population {
    pub fn as_str(&self) -> &'static str {
        match self {
            Population::HanChinese => "han_chinese",
            Population::EastAsian => "east_asian",
            Population::Other => "other",
        }
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Population {
    type Err = NutrigeneError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "han_chinese" => Ok(Population::HanChinese),
            "east_asian" => Ok(Population::EastAsian),
            "other" => Ok(Population::Other),
            other => Err(NutrigeneError::DataValidation(format!(
                "Unknown population '{other}'"
            ))),
        }
    }
}

/// Complete genetic profile for one individual.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneticProfile {
    pub individual_id: String,
    pub genotypes: Vec<SnpGenotype>,
    #[serde(default)]
    pub population: Population,
    pub data_source: String,
    #[serde(default)]
    pub collection_date: Option<NaiveDate>,
}

impl GeneticProfile {
    pub fn new(
        individual_id: impl Into<String>,
        genotypes: Vec<SnpGenotype>,
        population: Population,
        data_source: impl Into<String>,
    ) -> Result<Self> {
        let individual_id = individual_id.into();
        if individual_id.trim().is_empty() {
            return Err(NutrigeneError::DataValidation(
                "Individual id must not be empty".to_string(),
            ));
        }
        if genotypes.is_empty() {
            return Err(NutrigeneError::DataValidation(format!(
                "Profile {individual_id} has no genotypes"
            )));
        }

        Ok(Self {
            individual_id,
            genotypes,
            population,
            data_source: data_source.into(),
            collection_date: None,
        })
    }

    pub fn genotype(&self, rsid: &str) -> Option<&SnpGenotype> {
        self.genotypes.iter().find(|g| g.rsid == rsid)
    }

    pub fn available_rsids(&self) -> Vec<&str> {
        self.genotypes.iter().map(|g| g.rsid.as_str()).collect()
    }

    /// Diagnostic append; the usual path is to build a complete profile up front.
    pub fn push(&mut self, genotype: SnpGenotype) {
        self.genotypes.push(genotype);
    }
}

fn default_effect_population() -> String {
    "east_asian".to_string()
}

/// Effect size with its 95% confidence interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSize {
    pub value: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub unit: String,
    #[serde(default = "default_effect_population")]
    pub population: String,
}

impl EffectSize {
    pub fn new(value: f64, ci_lower: f64, ci_upper: f64, unit: impl Into<String>) -> Result<Self> {
        let effect = Self {
            value,
            ci_lower,
            ci_upper,
            unit: unit.into(),
            population: default_effect_population(),
        };
        effect.check_bounds()?;
        Ok(effect)
    }

    pub fn check_bounds(&self) -> Result<()> {
        if !(self.value.is_finite() && self.ci_lower.is_finite() && self.ci_upper.is_finite()) {
            return Err(NutrigeneError::ConfigValidation(
                "Effect size values must be finite".to_string(),
            ));
        }
        if self.ci_upper < self.ci_lower {
            return Err(NutrigeneError::ConfigValidation(format!(
                "ci_upper ({}) must be >= ci_lower ({})",
                self.ci_upper, self.ci_lower
            )));
        }
        Ok(())
    }
}

/// A = strong RCT, B = cohort, C = cross-sectional, D = expert opinion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvidenceLevel {
    A,
    B,
    C,
    D,
}

/// Gene-nutrient interaction knowledge entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneNutrientPair {
    pub gene: String,
    pub variant_rsid: String,
    pub nutrient: String,
    pub risk_allele: String,
    pub protective_allele: String,
    pub effect_size: EffectSize,
    pub allele_freq_east_asian: f64,
    pub evidence_level: EvidenceLevel,
    #[serde(default)]
    pub pubmed_ids: Vec<String>,
}

impl GeneNutrientPair {
    pub fn check_bounds(&self) -> Result<()> {
        if !is_rsid(&self.variant_rsid) {
            return Err(NutrigeneError::ConfigValidation(format!(
                "Invalid rsID '{}' for gene {}",
                self.variant_rsid, self.gene
            )));
        }
        if !is_nucleotides(&self.risk_allele) || !is_nucleotides(&self.protective_allele) {
            return Err(NutrigeneError::ConfigValidation(format!(
                "Invalid risk/protective alleles for {}",
                self.variant_rsid
            )));
        }
        if !(0.0..=1.0).contains(&self.allele_freq_east_asian) {
            return Err(NutrigeneError::ConfigValidation(format!(
                "Allele frequency {} out of range [0, 1] for {}",
                self.allele_freq_east_asian, self.variant_rsid
            )));
        }
        self.effect_size.check_bounds().map_err(|e| {
            NutrigeneError::ConfigValidation(format!("{}: {e}", self.variant_rsid))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
}

impl RiskCategory {
    pub fn from_z(z: f64) -> Self {
        if z < -0.5 {
            RiskCategory::Low
        } else if z < 0.5 {
            RiskCategory::Moderate
        } else {
            RiskCategory::High
        }
    }

    /// Key of the recommendation rule tier for this category.
    pub fn tier_key(&self) -> &'static str {
        match self {
            RiskCategory::Low => "low_risk",
            RiskCategory::Moderate => "moderate_risk",
            RiskCategory::High => "high_risk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Recommendation grade reflects data coverage, not the study grade.
    pub fn evidence_level(&self) -> EvidenceLevel {
        match self {
            Confidence::High => EvidenceLevel::A,
            Confidence::Medium => EvidenceLevel::B,
            Confidence::Low => EvidenceLevel::C,
        }
    }
}

/// Genetic risk score for one trait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    #[serde(rename = "trait")]
    pub trait_name: String,
    pub score: f64,
    pub percentile: f64,
    pub risk_category: RiskCategory,
    pub contributing_variants: Vec<String>,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 4,
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn is_urgent(&self) -> bool {
        matches!(self, Priority::Critical | Priority::High)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl FromStr for Sex {
    type Err = NutrigeneError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            other => Err(NutrigeneError::Recommendation(format!(
                "Invalid sex: {other}. Must be 'male' or 'female'."
            ))),
        }
    }
}

/// Personalized dietary recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietaryRecommendation {
    pub nutrient: String,
    pub current_dri: f64,
    pub recommended_intake: f64,
    pub unit: String,
    pub adjustment_reason: String,
    #[serde(default)]
    pub food_sources: Vec<String>,
    pub priority: Priority,
    pub evidence_level: EvidenceLevel,
}

/// Complete genetic risk assessment for one individual.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneticRiskReport {
    pub individual_id: String,
    pub generated_date: DateTime<Utc>,
    pub population: Population,
    pub risk_scores: Vec<RiskScore>,
    pub recommendations: Vec<DietaryRecommendation>,
    pub missing_variants: Vec<String>,
    pub limitations: Vec<String>,
    pub disclaimer: String,
}

impl GeneticRiskReport {
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            individual_id: self.individual_id.clone(),
            date: self.generated_date,
            n_risk_scores: self.risk_scores.len(),
            n_recommendations: self.recommendations.len(),
            high_priority: self
                .recommendations
                .iter()
                .filter(|r| r.priority.is_urgent())
                .map(|r| r.nutrient.clone())
                .collect(),
            missing_variants: self.missing_variants.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub individual_id: String,
    pub date: DateTime<Utc>,
    pub n_risk_scores: usize,
    pub n_recommendations: usize,
    pub high_priority: Vec<String>,
    pub missing_variants: Vec<String>,
}
