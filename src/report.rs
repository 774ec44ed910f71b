use std::fmt::Write;

use chrono::Utc;
use tracing::info;

use crate::catalog::TraitCatalog;
use crate::dri::DriTable;
use crate::error::Result;
use crate::knowledge::KnowledgeProvider;
use crate::models::{GeneticProfile, GeneticRiskReport, RiskScore};
use crate::recommend::{validate_inputs, RecommendationEngine};
use crate::risk::RiskScoringEngine;
use crate::validate;

pub const DEFAULT_LIMITATIONS: [&str; 4] = [
    "Genetic factors typically explain <5% of trait variance",
    "Recommendations based on population-level associations",
    "Not a substitute for clinical advice from a registered dietitian or physician",
    "Effect sizes may vary by age, sex, and environmental factors",
];

pub const DEFAULT_DISCLAIMER: &str = "This report is for research and educational purposes only. \
Consult a registered dietitian (注册营养师) or physician before \
making dietary changes based on genetic information.";

pub struct ReportAssembler<'a> {
    knowledge: &'a dyn KnowledgeProvider,
    catalog: &'a TraitCatalog,
    dri: &'a DriTable,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(
        knowledge: &'a dyn KnowledgeProvider,
        catalog: &'a TraitCatalog,
        dri: &'a DriTable,
    ) -> Self {
        Self {
            knowledge,
            catalog,
            dri,
        }
    }

    /// Scores the requested traits (all catalog traits when `traits` is
    /// `None` or empty), derives recommendations and records which tracked
    /// variants the profile lacks.
    pub fn generate(
        &self,
        profile: &GeneticProfile,
        age: i32,
        sex: &str,
        traits: Option<&[String]>,
    ) -> Result<GeneticRiskReport> {
        validate_inputs(age, sex)?;

        let scorer = RiskScoringEngine::new(self.knowledge, self.catalog);
        let risk_scores: Vec<RiskScore> = match traits {
            Some(selected) if !selected.is_empty() => {
                let mut scores = Vec::new();
                for trait_name in selected {
                    if let Some(score) = scorer.score_trait(profile, trait_name)? {
                        scores.push(score);
                    }
                }
                scores
            }
            _ => scorer.score_all(profile)?,
        };

        let tracked = self.knowledge.tracked_rsids();
        let missing_variants = validate::missing_rsids(profile, &tracked);

        let recommender = RecommendationEngine::new(self.knowledge, self.catalog, self.dri);
        let recommendations = recommender.recommend(&risk_scores, age, sex)?;

        info!(
            "Generated report for {}: {} risk scores, {} recommendations, {} missing variants",
            profile.individual_id,
            risk_scores.len(),
            recommendations.len(),
            missing_variants.len()
        );

        Ok(GeneticRiskReport {
            individual_id: profile.individual_id.clone(),
            generated_date: Utc::now(),
            population: profile.population,
            risk_scores,
            recommendations,
            missing_variants,
            limitations: DEFAULT_LIMITATIONS.iter().map(|s| s.to_string()).collect(),
            disclaimer: DEFAULT_DISCLAIMER.to_string(),
        })
    }
}

pub fn render_markdown(report: &GeneticRiskReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Genetic Nutrition Report");
    let _ = writeln!(
        output,
        "Generated for {} ({}) on {}",
        report.individual_id,
        report.population,
        report.generated_date.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Scores");

    if report.risk_scores.is_empty() {
        let _ = writeln!(output, "No traits could be scored from this profile.");
    } else {
        for score in &report.risk_scores {
            let _ = writeln!(
                output,
                "- {}: z {:.2} (percentile {:.1}, {:?} risk, {:?} confidence) from {}",
                score.trait_name,
                score.score,
                score.percentile,
                score.risk_category,
                score.confidence,
                score.contributing_variants.join(", ")
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommendations");

    if report.recommendations.is_empty() {
        let _ = writeln!(output, "No recommendations for this profile.");
    } else {
        for rec in &report.recommendations {
            let _ = writeln!(
                output,
                "- [{:?}] {}: {} -> {} {} (evidence {:?})",
                rec.priority,
                rec.nutrient,
                rec.current_dri,
                rec.recommended_intake,
                rec.unit,
                rec.evidence_level
            );
            let _ = writeln!(output, "  {}", rec.adjustment_reason);
            if !rec.food_sources.is_empty() {
                let _ = writeln!(output, "  Foods: {}", rec.food_sources.join(", "));
            }
        }
    }

    if !report.missing_variants.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Missing Variants");
        let _ = writeln!(output, "{}", report.missing_variants.join(", "));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Limitations");
    for limitation in &report.limitations {
        let _ = writeln!(output, "- {limitation}");
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "_{}_", report.disclaimer);

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NutrigeneError;
    use crate::knowledge::fixtures::knowledge_base;
    use crate::models::{Population, Priority, SnpGenotype, Zygosity};

    const TABLE: &str = r#"
folate:
  unit: "μg DFE/day"
  adult_male_18_49: 400.0
  adult_female_18_49: 400.0
energy:
  unit: "kcal/day"
  adult_male_18_49: 2250.0
  adult_female_18_49: 1800.0
dietary_fat:
  unit: "g/day"
  adult_male_18_49: 70.0
  adult_female_18_49: 55.0
"#;

    fn genotype(rsid: &str, reference: &str, alternate: &str, observed: &str) -> SnpGenotype {
        SnpGenotype::new(
            rsid,
            "1",
            500,
            reference,
            alternate,
            observed,
            Zygosity::classify(reference, alternate, observed),
            None,
        )
        .unwrap()
    }

    fn high_risk() -> GeneticProfile {
        GeneticProfile::new(
            "TEST_HIGH_001",
            vec![
                genotype("rs1801133", "C", "T", "TT"),
                genotype("rs9939609", "T", "A", "AA"),
                genotype("rs429358", "T", "C", "CC"),
                genotype("rs7412", "C", "T", "CC"),
            ],
            Population::HanChinese,
            "WGS",
        )
        .unwrap()
    }

    #[test]
    fn assembles_scores_recommendations_and_gaps() {
        let kb = knowledge_base();
        let catalog = TraitCatalog::default();
        let dri = DriTable::from_yaml_str(TABLE).unwrap();
        let assembler = ReportAssembler::new(&kb, &catalog, &dri);

        let report = assembler.generate(&high_risk(), 35, "female", None).unwrap();
        assert_eq!(report.individual_id, "TEST_HIGH_001");
        assert_eq!(report.risk_scores.len(), 3);
        assert_eq!(report.recommendations.len(), 3);
        assert_eq!(report.recommendations[0].priority, Priority::Critical);
        assert_eq!(report.recommendations[0].nutrient, "dietary_fat");
        assert_eq!(report.missing_variants, vec!["rs1801131"]);
        assert_eq!(report.limitations.len(), 4);
        assert!(report.disclaimer.contains("注册营养师"));

        let summary = report.summary();
        assert_eq!(summary.n_risk_scores, 3);
        assert_eq!(summary.high_priority.len(), 3);
        assert_eq!(summary.missing_variants, vec!["rs1801131"]);
    }

    #[test]
    fn trait_subset_limits_scoring() {
        let kb = knowledge_base();
        let catalog = TraitCatalog::default();
        let dri = DriTable::from_yaml_str(TABLE).unwrap();
        let assembler = ReportAssembler::new(&kb, &catalog, &dri);

        let traits = vec!["folate_metabolism".to_string(), "not_a_trait".to_string()];
        let report = assembler
            .generate(&high_risk(), 30, "male", Some(&traits))
            .unwrap();
        assert_eq!(report.risk_scores.len(), 1);
        assert_eq!(report.recommendations.len(), 1);
        assert_eq!(report.recommendations[0].recommended_intake, 700.0);
    }

    #[test]
    fn invalid_demographics_abort_generation() {
        let kb = knowledge_base();
        let catalog = TraitCatalog::default();
        let dri = DriTable::from_yaml_str(TABLE).unwrap();
        let assembler = ReportAssembler::new(&kb, &catalog, &dri);

        let err = assembler.generate(&high_risk(), 30, "other", None).unwrap_err();
        assert!(matches!(err, NutrigeneError::Recommendation(_)));
        assert!(assembler.generate(&high_risk(), 200, "male", None).is_err());
    }

    #[test]
    fn markdown_lists_sections() {
        let kb = knowledge_base();
        let catalog = TraitCatalog::default();
        let dri = DriTable::from_yaml_str(TABLE).unwrap();
        let report = ReportAssembler::new(&kb, &catalog, &dri)
            .generate(&high_risk(), 35, "female", None)
            .unwrap();

        let markdown = render_markdown(&report);
        assert!(markdown.starts_with("# Genetic Nutrition Report"));
        assert!(markdown.contains("## Risk Scores"));
        assert!(markdown.contains("- folate_metabolism: z 1.85"));
        assert!(markdown.contains("## Missing Variants\nrs1801131"));
        assert!(markdown.contains("注册营养师"));
    }
}
