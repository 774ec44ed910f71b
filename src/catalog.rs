//! Fixed trait tables: which variants back each trait, how they combine,
//! and which recommendation rule set a trait feeds.

use crate::epsilon::EpsilonLoci;

#[derive(Debug, Clone, PartialEq)]
pub enum TraitModel {
    /// Mean of per-variant additive z-scores.
    Additive(Vec<String>),
    /// Two loci read jointly through the epsilon table.
    Epsilon(EpsilonLoci),
}

impl TraitModel {
    pub fn rsids(&self) -> Vec<String> {
        match self {
            TraitModel::Additive(rsids) => rsids.clone(),
            TraitModel::Epsilon(loci) => loci.rsids(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraitDefinition {
    pub name: String,
    pub gene_key: String,
    pub model: TraitModel,
}

/// Ordered, immutable trait table handed to the engines at construction.
#[derive(Debug, Clone)]
pub struct TraitCatalog {
    traits: Vec<TraitDefinition>,
}

impl TraitCatalog {
    pub fn new(traits: Vec<TraitDefinition>) -> Self {
        Self { traits }
    }

    pub fn get(&self, name: &str) -> Option<&TraitDefinition> {
        self.traits.iter().find(|t| t.name == name)
    }

    pub fn gene_key(&self, name: &str) -> Option<&str> {
        self.get(name).map(|t| t.gene_key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TraitDefinition> {
        self.traits.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.traits.iter().map(|t| t.name.as_str()).collect()
    }
}

fn additive(name: &str, gene_key: &str, rsids: &[&str]) -> TraitDefinition {
    TraitDefinition {
        name: name.to_string(),
        gene_key: gene_key.to_string(),
        model: TraitModel::Additive(rsids.iter().map(|r| r.to_string()).collect()),
    }
}

impl Default for TraitCatalog {
    fn default() -> Self {
        Self::new(vec![
            additive("obesity", "FTO", &["rs9939609", "rs17782313", "rs12970134"]),
            additive("folate_metabolism", "MTHFR", &["rs1801133", "rs1801131"]),
            additive("fatty_acid_metabolism", "FADS", &["rs174547", "rs498793"]),
            TraitDefinition {
                name: "lipid_metabolism".to_string(),
                gene_key: "APOE".to_string(),
                model: TraitModel::Epsilon(EpsilonLoci::default()),
            },
            additive("type2_diabetes", "TCF7L2", &["rs7903146"]),
            additive("vitamin_a_conversion", "BCMO1", &["rs12934922"]),
            additive("metabolic_health", "ADIPOQ", &["rs1501299"]),
            additive("sweet_preference", "FGF21", &["rs838133"]),
            additive("bone_health", "VDR", &["rs2228570"]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_covers_all_traits() {
        let catalog = TraitCatalog::default();
        assert_eq!(catalog.names().len(), 9);
        assert_eq!(catalog.gene_key("folate_metabolism"), Some("MTHFR"));
        assert_eq!(catalog.gene_key("lipid_metabolism"), Some("APOE"));
        assert_eq!(catalog.gene_key("unknown"), None);

        let lipid = catalog.get("lipid_metabolism").unwrap();
        assert_eq!(lipid.model.rsids(), vec!["rs429358", "rs7412"]);
        assert!(matches!(lipid.model, TraitModel::Epsilon(_)));
    }
}
