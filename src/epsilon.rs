//! APOE epsilon genotype classification.
//!
//! rs429358 and rs7412 jointly define the e2/e3/e4 alleles:
//!   e2: rs429358=T, rs7412=T
//!   e3: rs429358=T, rs7412=C
//!   e4: rs429358=C, rs7412=C

use crate::models::RiskCategory;

/// The two loci read together, in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpsilonLoci {
    pub first: String,
    pub second: String,
}

impl Default for EpsilonLoci {
    fn default() -> Self {
        Self {
            first: "rs429358".to_string(),
            second: "rs7412".to_string(),
        }
    }
}

impl EpsilonLoci {
    pub fn rsids(&self) -> Vec<String> {
        vec![self.first.clone(), self.second.clone()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpsilonGenotype {
    E2E2,
    E2E3,
    E3E3,
    E3E4,
    E4E4,
    E2E4,
}

impl EpsilonGenotype {
    pub fn label(&self) -> &'static str {
        match self {
            EpsilonGenotype::E2E2 => "e2/e2",
            EpsilonGenotype::E2E3 => "e2/e3",
            EpsilonGenotype::E3E3 => "e3/e3",
            EpsilonGenotype::E3E4 => "e3/e4",
            EpsilonGenotype::E4E4 => "e4/e4",
            EpsilonGenotype::E2E4 => "e2/e4",
        }
    }

    /// 0 = low, 1 = moderate, 2 = high.
    pub fn risk_level(&self) -> u8 {
        match self {
            EpsilonGenotype::E2E2 | EpsilonGenotype::E2E3 | EpsilonGenotype::E3E3 => 0,
            EpsilonGenotype::E3E4 | EpsilonGenotype::E2E4 => 1,
            EpsilonGenotype::E4E4 => 2,
        }
    }

    pub fn risk_category(&self) -> RiskCategory {
        match self.risk_level() {
            0 => RiskCategory::Low,
            1 => RiskCategory::Moderate,
            _ => RiskCategory::High,
        }
    }

    /// Fixed stand-in z-score, not a fitted estimate.
    pub fn representative_z(&self) -> f64 {
        match self.risk_level() {
            0 => -0.8,
            1 => 0.0,
            _ => 1.2,
        }
    }
}

/// Sorts the two allele characters so `TC` and `CT` share one table entry.
pub fn canonical_genotype(genotype: &str) -> String {
    let mut alleles: Vec<char> = genotype.chars().collect();
    alleles.sort_unstable();
    alleles.into_iter().collect()
}

/// Looks up the genotype pair observed at (rs429358, rs7412).
pub fn classify(first: &str, second: &str) -> Option<EpsilonGenotype> {
    let first = canonical_genotype(first);
    let second = canonical_genotype(second);

    match (first.as_str(), second.as_str()) {
        ("TT", "TT") => Some(EpsilonGenotype::E2E2),
        ("TT", "CT") => Some(EpsilonGenotype::E2E3),
        ("TT", "CC") => Some(EpsilonGenotype::E3E3),
        ("CT", "CC") => Some(EpsilonGenotype::E3E4),
        ("CC", "CC") => Some(EpsilonGenotype::E4E4),
        ("CT", "CT") => Some(EpsilonGenotype::E2E4),
        _ => None,
    }
}
