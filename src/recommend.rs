use std::cmp::Reverse;

use tracing::warn;

use crate::catalog::TraitCatalog;
use crate::dri::DriTable;
use crate::error::{NutrigeneError, Result};
use crate::knowledge::{KnowledgeProvider, RecommendationRules};
use crate::models::{DietaryRecommendation, RiskScore, Sex};
use crate::risk::round_to;

const NOT_APPLICABLE: &str = "Not applicable";

/// Checks caller-supplied demographics before any derivation runs.
pub fn validate_inputs(age: i32, sex: &str) -> Result<(u32, Sex)> {
    let sex: Sex = sex.parse()?;
    if !(0..=150).contains(&age) {
        return Err(NutrigeneError::Recommendation(format!("Invalid age: {age}")));
    }
    Ok((age as u32, sex))
}

/// Critical first; ties keep their input order.
pub fn sort_by_priority(recommendations: &mut [DietaryRecommendation]) {
    recommendations.sort_by_key(|r| Reverse(r.priority.rank()));
}

pub struct RecommendationEngine<'a> {
    knowledge: &'a dyn KnowledgeProvider,
    catalog: &'a TraitCatalog,
    dri: &'a DriTable,
}

impl<'a> RecommendationEngine<'a> {
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

    /// One recommendation per score that has a rule tier and a baseline,
    /// sorted by priority.
    pub fn recommend(
        &self,
        risk_scores: &[RiskScore],
        age: i32,
        sex: &str,
    ) -> Result<Vec<DietaryRecommendation>> {
        let (age, sex) = validate_inputs(age, sex)?;
        let mut recommendations = Vec::new();

        for score in risk_scores {
            let Some(gene_key) = self.catalog.gene_key(&score.trait_name) else {
                warn!("No gene key mapping for trait {}", score.trait_name);
                continue;
            };
            let Some(rules) = self.knowledge.recommendation_rules(gene_key) else {
                warn!("No recommendation rules for gene {}", gene_key);
                continue;
            };
            if let Some(rec) = self.apply_rules(rules, score, age, sex) {
                recommendations.push(rec);
            }
        }

        sort_by_priority(&mut recommendations);
        Ok(recommendations)
    }

    pub fn apply_rules(
        &self,
        rules: &RecommendationRules,
        score: &RiskScore,
        age: u32,
        sex: Sex,
    ) -> Option<DietaryRecommendation> {
        let Some(tier) = rules.tier(score.risk_category) else {
            warn!(
                "No {} tier in rules for trait {}",
                score.risk_category.tier_key(),
                score.trait_name
            );
            return None;
        };

        let nutrient = rules.nutrient.as_str();
        let Some(base_dri) = self.dri.baseline(nutrient, age, sex) else {
            warn!(
                "No DRI found for nutrient {} (age={}, sex={})",
                nutrient,
                age,
                sex.as_str()
            );
            return None;
        };

        let adjustment_reason = match tier.supplementation.as_deref() {
            Some(extra) if !extra.is_empty() && extra != NOT_APPLICABLE => {
                format!("{} {}", tier.description, extra)
            }
            _ => tier.description.clone(),
        };

        Some(DietaryRecommendation {
            nutrient: nutrient.to_string(),
            current_dri: base_dri,
            recommended_intake: round_to(base_dri * tier.dri_multiplier, 1),
            unit: self.dri.unit(nutrient).unwrap_or("units").to_string(),
            adjustment_reason,
            food_sources: tier.food_sources.clone(),
            priority: tier.priority,
            evidence_level: score.confidence.evidence_level(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::fixtures::knowledge_base;
    use crate::models::{Confidence, EvidenceLevel, Priority, RiskCategory};
    use crate::risk::z_to_percentile;
    use proptest::prelude::*;

    const TABLE: &str = r#"
folate:
  unit: "μg DFE/day"
  adult_male_18_49: 400.0
  adult_female_18_49: 400.0
energy:
  unit: "kcal/day"
  adult_male_18_49: 2250.0
  adult_female_18_49: 1800.0
  adult_female_50_64: 1750.0
"#;

    fn score(trait_name: &str, z: f64, confidence: Confidence) -> RiskScore {
        RiskScore {
            trait_name: trait_name.to_string(),
            score: z,
            percentile: z_to_percentile(z),
            risk_category: RiskCategory::from_z(z),
            contributing_variants: vec![],
            confidence,
        }
    }

    fn recommendation(nutrient: &str, priority: Priority) -> DietaryRecommendation {
        DietaryRecommendation {
            nutrient: nutrient.to_string(),
            current_dri: 1.0,
            recommended_intake: 1.0,
            unit: "g".to_string(),
            adjustment_reason: String::new(),
            food_sources: vec![],
            priority,
            evidence_level: EvidenceLevel::B,
        }
    }

    #[test]
    fn rejects_invalid_demographics() {
        let err = validate_inputs(30, "other").unwrap_err();
        assert!(matches!(err, NutrigeneError::Recommendation(_)));
        assert!(err.to_string().contains("Invalid sex"));

        let err = validate_inputs(-1, "male").unwrap_err();
        assert!(err.to_string().contains("Invalid age: -1"));
        assert!(validate_inputs(151, "female").is_err());
        assert_eq!(validate_inputs(0, "female").unwrap(), (0, Sex::Female));
        assert_eq!(validate_inputs(150, "male").unwrap(), (150, Sex::Male));
    }

    #[test]
    fn high_risk_folate_scales_baseline() {
        let kb = knowledge_base();
        let catalog = TraitCatalog::default();
        let dri = DriTable::from_yaml_str(TABLE).unwrap();
        let engine = RecommendationEngine::new(&kb, &catalog, &dri);

        let recs = engine
            .recommend(&[score("folate_metabolism", 1.85, Confidence::Medium)], 30, "female")
            .unwrap();
        assert_eq!(recs.len(), 1);
        let rec = &recs[0];
        assert_eq!(rec.nutrient, "folate");
        assert_eq!(rec.current_dri, 400.0);
        assert_eq!(rec.recommended_intake, 700.0);
        assert_eq!(rec.unit, "μg DFE/day");
        assert_eq!(rec.priority, Priority::High);
        assert_eq!(rec.evidence_level, EvidenceLevel::B);
        assert_eq!(rec.adjustment_reason, "Adjust intake by 1.75x. Consider 5-MTHF.");
        assert!(!rec.food_sources.is_empty());
    }

    #[test]
    fn placeholder_supplementation_is_dropped_from_reason() {
        let kb = knowledge_base();
        let catalog = TraitCatalog::default();
        let dri = DriTable::from_yaml_str(TABLE).unwrap();
        let engine = RecommendationEngine::new(&kb, &catalog, &dri);

        let recs = engine
            .recommend(&[score("folate_metabolism", -1.08, Confidence::High)], 30, "male")
            .unwrap();
        assert_eq!(recs[0].adjustment_reason, "Adjust intake by 1x.");
        assert_eq!(recs[0].recommended_intake, 400.0);
        assert_eq!(recs[0].evidence_level, EvidenceLevel::A);
    }

    #[test]
    fn gaps_in_rules_or_baselines_skip_the_score() {
        let kb = knowledge_base();
        let catalog = TraitCatalog::default();
        let dri = DriTable::from_yaml_str(TABLE).unwrap();
        let engine = RecommendationEngine::new(&kb, &catalog, &dri);

        let scores = [
            // FTO has no moderate tier.
            score("obesity", 0.1, Confidence::High),
            // APOE rules exist but dietary_fat has no baseline.
            score("lipid_metabolism", 1.2, Confidence::High),
            // No rule set for VDR in the fixture.
            score("bone_health", 1.0, Confidence::High),
            // Not in the catalog at all.
            score("MTHFR_folate", 1.0, Confidence::High),
        ];
        assert!(engine.recommend(&scores, 40, "male").unwrap().is_empty());
    }

    #[test]
    fn baseline_falls_back_and_rounds() {
        let kb = knowledge_base();
        let catalog = TraitCatalog::default();
        let dri = DriTable::from_yaml_str(TABLE).unwrap();
        let engine = RecommendationEngine::new(&kb, &catalog, &dri);

        let female_55 = engine
            .recommend(&[score("obesity", 2.0, Confidence::High)], 55, "female")
            .unwrap();
        assert_eq!(female_55[0].current_dri, 1750.0);
        assert_eq!(female_55[0].recommended_intake, 1575.0);

        let male_70 = engine
            .recommend(&[score("obesity", 2.0, Confidence::High)], 70, "male")
            .unwrap();
        assert_eq!(male_70[0].current_dri, 2250.0);
        assert_eq!(male_70[0].recommended_intake, 2025.0);
        assert_eq!(male_70[0].unit, "kcal/day");
    }

    #[test]
    fn output_is_sorted_by_priority() {
        let kb = knowledge_base();
        let catalog = TraitCatalog::default();
        let dri = DriTable::from_yaml_str(TABLE).unwrap();
        let engine = RecommendationEngine::new(&kb, &catalog, &dri);

        let recs = engine
            .recommend(
                &[
                    score("folate_metabolism", -1.0, Confidence::High),
                    score("obesity", 2.0, Confidence::High),
                ],
                30,
                "male",
            )
            .unwrap();
        let priorities: Vec<_> = recs.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![Priority::High, Priority::Low]);
    }

    #[test]
    fn priority_sort_is_stable() {
        let mut recs = vec![
            recommendation("a", Priority::Low),
            recommendation("b", Priority::High),
            recommendation("c", Priority::Critical),
            recommendation("d", Priority::High),
            recommendation("e", Priority::Medium),
        ];
        sort_by_priority(&mut recs);
        let order: Vec<_> = recs.iter().map(|r| r.nutrient.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "d", "e", "a"]);
    }

    fn priority_strategy() -> impl Strategy<Value = Priority> {
        prop::sample::select(vec![
            Priority::Critical,
            Priority::High,
            Priority::Medium,
            Priority::Low,
        ])
    }

    proptest! {
        #[test]
        fn any_input_sorts_descending(priorities in prop::collection::vec(priority_strategy(), 0..20)) {
            let mut recs: Vec<_> = priorities
                .iter()
                .enumerate()
                .map(|(i, p)| recommendation(&i.to_string(), *p))
                .collect();
            sort_by_priority(&mut recs);
            for pair in recs.windows(2) {
                prop_assert!(pair[0].priority.rank() >= pair[1].priority.rank());
            }
        }
    }
}
