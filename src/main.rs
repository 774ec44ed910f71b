use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use nutrigene::import::{import_profile, ImportOptions};
use nutrigene::knowledge::KnowledgeProvider;
use nutrigene::models::Population;
use nutrigene::report::render_markdown;
use nutrigene::validate::{validate_profile, DEFAULT_MIN_QUALITY};
use nutrigene::{DriTable, KnowledgeBase, ReportAssembler, TraitCatalog};

#[derive(Parser)]
#[command(name = "nutrigene")]
#[command(about = "Genotype-driven dietary recommendations", long_about = None)]
struct Cli {
    /// Directory holding knowledge/ and dri.yaml (defaults to $NUTRIGENE_DATA_DIR, then ./data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Summary,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a genotype file and derive recommendations
    Assess {
        #[arg(long)]
        profile: PathBuf,
        #[arg(long)]
        age: i32,
        #[arg(long)]
        sex: String,
        #[arg(long)]
        individual_id: Option<String>,
        #[arg(long, default_value = "han_chinese")]
        population: String,
        #[arg(long)]
        data_source: Option<String>,
        /// Sample collection date (YYYY-MM-DD)
        #[arg(long)]
        collection_date: Option<NaiveDate>,
        /// Restrict scoring to these traits (repeatable)
        #[arg(long = "trait")]
        traits: Vec<String>,
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check a genotype file for missing, low-quality and inconsistent calls
    Validate {
        #[arg(long)]
        profile: PathBuf,
        #[arg(long, default_value_t = DEFAULT_MIN_QUALITY)]
        min_quality: f64,
    },
    /// Show what the knowledge base covers
    Knowledge,
}

fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os("NUTRIGENE_DATA_DIR").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn load_knowledge(data_dir: &Path) -> anyhow::Result<KnowledgeBase> {
    KnowledgeBase::load(&data_dir.join("knowledge"))
        .with_context(|| format!("failed to load knowledge base from {}", data_dir.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let data_dir = resolve_data_dir(cli.data_dir);

    match cli.command {
        Commands::Assess {
            profile,
            age,
            sex,
            individual_id,
            population,
            data_source,
            collection_date,
            traits,
            format,
            out,
        } => {
            let knowledge = load_knowledge(&data_dir)?;
            let dri = DriTable::load(&data_dir.join("dri.yaml"))
                .context("failed to load dietary reference table")?;
            let catalog = TraitCatalog::default();

            let population: Population = population.parse()?;
            let profile = import_profile(
                &profile,
                ImportOptions {
                    individual_id,
                    population,
                    data_source,
                    collection_date,
                },
            )?;

            let assembler = ReportAssembler::new(&knowledge, &catalog, &dri);
            let report = assembler.generate(&profile, age, &sex, Some(&traits))?;

            let rendered = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&report)?,
                OutputFormat::Summary => serde_json::to_string_pretty(&report.summary())?,
                OutputFormat::Markdown => render_markdown(&report),
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    println!("Report written to {}.", path.display());
                }
                None => println!("{rendered}"),
            }
        }
        Commands::Validate {
            profile,
            min_quality,
        } => {
            let knowledge = load_knowledge(&data_dir)?;
            let profile = import_profile(&profile, ImportOptions::default())?;
            let summary = validate_profile(&profile, &knowledge.tracked_rsids(), min_quality);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Knowledge => {
            let knowledge = load_knowledge(&data_dir)?;
            println!(
                "{} genes, {} gene-nutrient pairs",
                knowledge.gene_count(),
                knowledge.pair_count()
            );
            for (key, rsid) in knowledge.variant_keys().into_iter().zip(knowledge.tracked_rsids()) {
                if let Some(pair) = knowledge.pair_by_rsid(rsid) {
                    println!(
                        "- {key}: {} {} -> {} (risk {}, evidence {:?})",
                        pair.gene, rsid, pair.nutrient, pair.risk_allele, pair.evidence_level
                    );
                }
            }
        }
    }

    Ok(())
}
