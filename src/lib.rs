//! Personalized dietary guidance from genotype data.
//!
//! A [`GeneticProfile`] is scored trait by trait against a curated
//! [`KnowledgeBase`] ([`RiskScoringEngine`]), the resulting risk categories
//! select tiered rules that scale a dietary reference baseline
//! ([`RecommendationEngine`]), and [`ReportAssembler`] bundles everything
//! into a [`GeneticRiskReport`].

pub mod catalog;
pub mod dri;
pub mod epsilon;
pub mod error;
pub mod import;
pub mod knowledge;
pub mod models;
pub mod recommend;
pub mod report;
pub mod risk;
pub mod validate;

pub use catalog::{TraitCatalog, TraitDefinition, TraitModel};
pub use dri::DriTable;
pub use error::{NutrigeneError, Result};
pub use knowledge::{KnowledgeBase, KnowledgeProvider};
pub use models::{
    DietaryRecommendation, GeneticProfile, GeneticRiskReport, Population, RiskScore, SnpGenotype,
};
pub use recommend::RecommendationEngine;
pub use report::ReportAssembler;
pub use risk::RiskScoringEngine;
