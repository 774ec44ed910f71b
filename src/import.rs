use std::io::Read;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{GeneticProfile, Population, SnpGenotype, Zygosity};

#[derive(Debug, Deserialize)]
struct GenotypeRow {
    rsid: String,
    chromosome: String,
    position: u64,
    reference_allele: String,
    alternate_allele: String,
    genotype: String,
    quality_score: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub individual_id: Option<String>,
    pub population: Population,
    pub data_source: Option<String>,
    pub collection_date: Option<NaiveDate>,
}

/// Reads genotype rows from CSV. Zygosity is derived from the alleles.
pub fn read_genotypes<R: Read>(input: R) -> anyhow::Result<Vec<SnpGenotype>> {
    let mut reader = csv::Reader::from_reader(input);
    let mut genotypes = Vec::new();

    for (line, result) in reader.deserialize::<GenotypeRow>().enumerate() {
        let row = result.with_context(|| format!("malformed genotype row {}", line + 1))?;
        let zygosity = Zygosity::classify(&row.reference_allele, &row.alternate_allele, &row.genotype);
        let genotype = SnpGenotype::new(
            row.rsid,
            row.chromosome,
            row.position,
            row.reference_allele,
            row.alternate_allele,
            row.genotype,
            zygosity,
            row.quality_score,
        )
        .with_context(|| format!("invalid genotype row {}", line + 1))?;
        genotypes.push(genotype);
    }

    Ok(genotypes)
}

pub fn import_profile(path: &Path, options: ImportOptions) -> anyhow::Result<GeneticProfile> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open genotype file {}", path.display()))?;
    let genotypes = read_genotypes(file)?;

    let individual_id = options
        .individual_id
        .unwrap_or_else(|| format!("anon-{}", Uuid::new_v4()));
    let data_source = options.data_source.unwrap_or_else(|| "SNP_Array".to_string());

    let mut profile = GeneticProfile::new(individual_id, genotypes, options.population, data_source)
        .with_context(|| format!("no usable genotypes in {}", path.display()))?;
    profile.collection_date = options.collection_date;
    Ok(profile)
}
