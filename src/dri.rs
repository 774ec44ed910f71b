//! Dietary reference intake baselines, stratified by sex and age group.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NutrigeneError, Result};
use crate::models::Sex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeGroup {
    Adult18To49,
    Adult50To64,
    Adult65Plus,
}

impl AgeGroup {
    /// Anything under 50 uses the 18-49 adult baseline.
    pub fn from_age(age: u32) -> Self {
        if age < 50 {
            AgeGroup::Adult18To49
        } else if age < 65 {
            AgeGroup::Adult50To64
        } else {
            AgeGroup::Adult65Plus
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            AgeGroup::Adult18To49 => "18_49",
            AgeGroup::Adult50To64 => "50_64",
            AgeGroup::Adult65Plus => "65_plus",
        }
    }
}

pub fn age_to_group(age: u32) -> &'static str {
    AgeGroup::from_age(age).key()
}

fn lookup_key(sex: Sex, group: AgeGroup) -> String {
    format!("adult_{}_{}", sex.as_str(), group.key())
}

/// Baseline values for one nutrient, keyed `adult_{sex}_{age_group}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientBaseline {
    pub unit: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

/// Recommendation nutrient names that are looked up under a different
/// baseline key.
pub fn default_nutrient_aliases() -> BTreeMap<String, String> {
    [
        ("energy_balance", "energy"),
        ("omega3_omega6", "omega3_epa_dha"),
        ("insulin_sensitivity", "protein"),
        ("macronutrient_preference", "carbohydrate"),
        ("vitamin_d_calcium", "vitamin_d"),
    ]
    .into_iter()
    .map(|(from, to)| (from.to_string(), to.to_string()))
    .collect()
}

#[derive(Debug, Clone)]
pub struct DriTable {
    nutrients: BTreeMap<String, NutrientBaseline>,
    aliases: BTreeMap<String, String>,
}

impl DriTable {
    pub fn new(nutrients: BTreeMap<String, NutrientBaseline>) -> Result<Self> {
        for (nutrient, baseline) in &nutrients {
            for (key, value) in &baseline.values {
                if !value.is_finite() || *value < 0.0 {
                    return Err(NutrigeneError::ConfigValidation(format!(
                        "Invalid baseline {value} for {nutrient}.{key}"
                    )));
                }
            }
        }
        Ok(Self {
            nutrients,
            aliases: default_nutrient_aliases(),
        })
    }

    pub fn with_aliases(mut self, aliases: BTreeMap<String, String>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let nutrients = serde_yaml::from_str(content)
            .map_err(|e| NutrigeneError::KnowledgeBase(format!("Invalid DRI table: {e}")))?;
        Self::new(nutrients)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NutrigeneError::KnowledgeBase(format!("Failed to read {}: {e}", path.display()))
        })?;
        let table = Self::from_yaml_str(&content)?;
        debug!("Loaded {} DRI nutrients from {}", table.nutrients.len(), path.display());
        Ok(table)
    }

    fn resolve(&self, nutrient: &str) -> Option<&NutrientBaseline> {
        let key = self.aliases.get(nutrient).map(String::as_str).unwrap_or(nutrient);
        self.nutrients.get(key)
    }

    /// Baseline for the resolved age group, falling back to the 18-49 entry
    /// for the same sex.
    pub fn baseline(&self, nutrient: &str, age: u32, sex: Sex) -> Option<f64> {
        let entry = self.resolve(nutrient)?;
        entry
            .values
            .get(&lookup_key(sex, AgeGroup::from_age(age)))
            .or_else(|| entry.values.get(&lookup_key(sex, AgeGroup::Adult18To49)))
            .copied()
    }

    pub fn unit(&self, nutrient: &str) -> Option<&str> {
        self.resolve(nutrient).map(|entry| entry.unit.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"
folate:
  unit: "μg DFE/day"
  adult_male_18_49: 400.0
  adult_female_18_49: 400.0
  adult_female_50_64: 400.0
energy:
  unit: "kcal/day"
  adult_male_18_49: 2250
  adult_male_50_64: 2100
  adult_male_65_plus: 2050
  adult_female_18_49: 1800
"#;

    #[test]
    fn age_groups() {
        assert_eq!(age_to_group(25), "18_49");
        assert_eq!(age_to_group(55), "50_64");
        assert_eq!(age_to_group(70), "65_plus");
        assert_eq!(age_to_group(49), "18_49");
        assert_eq!(age_to_group(50), "50_64");
        assert_eq!(age_to_group(64), "50_64");
        assert_eq!(age_to_group(65), "65_plus");
        assert_eq!(age_to_group(10), "18_49");
    }

    #[test]
    fn looks_up_by_sex_and_group() {
        let table = DriTable::from_yaml_str(TABLE).unwrap();
        assert_eq!(table.baseline("energy", 30, Sex::Male), Some(2250.0));
        assert_eq!(table.baseline("energy", 55, Sex::Male), Some(2100.0));
        assert_eq!(table.baseline("energy", 80, Sex::Male), Some(2050.0));
        assert_eq!(table.unit("folate"), Some("μg DFE/day"));
    }

    #[test]
    fn falls_back_to_young_adult_entry() {
        let table = DriTable::from_yaml_str(TABLE).unwrap();
        assert_eq!(table.baseline("energy", 70, Sex::Female), Some(1800.0));
        assert_eq!(table.baseline("folate", 70, Sex::Male), Some(400.0));
    }

    #[test]
    fn aliases_resolve_to_baseline_keys() {
        let table = DriTable::from_yaml_str(TABLE).unwrap();
        assert_eq!(table.baseline("energy_balance", 30, Sex::Female), Some(1800.0));
        assert_eq!(table.unit("energy_balance"), Some("kcal/day"));
        assert_eq!(table.baseline("vitamin_d_calcium", 30, Sex::Female), None);

        let no_alias = DriTable::from_yaml_str(TABLE).unwrap().with_aliases(BTreeMap::new());
        assert_eq!(no_alias.baseline("energy_balance", 30, Sex::Female), None);
    }

    #[test]
    fn unit_outlives_the_lookup_name() {
        let table = DriTable::from_yaml_str(TABLE).unwrap();
        let unit = {
            let nutrient = String::from("energy_balance");
            table.unit(&nutrient)
        };
        assert_eq!(unit, Some("kcal/day"));
        assert_eq!(table.unit("protein"), None);
    }

    #[test]
    fn rejects_negative_values() {
        let err = DriTable::from_yaml_str("folate:\n  unit: ug\n  adult_male_18_49: -1.0\n");
        assert!(matches!(err, Err(NutrigeneError::ConfigValidation(_))));
    }
}
