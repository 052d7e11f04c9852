//! Command-line front end for the poultry disease predictor.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use poultry_dx_core::db::Database;
use poultry_dx_core::predictor::parse_bird_type;
use poultry_dx_core::{KnowledgeBase, PredictionRequest, Predictor, ScoringConfig};

/// Poultry DX - rule-based poultry disease prediction
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Knowledge document (JSON) to use instead of the bundled one
    #[arg(long, global = true, conflicts_with = "database")]
    knowledge_base: Option<PathBuf>,

    /// SQLite database holding an imported knowledge base
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Scoring config file (JSON)
    #[arg(long, global = true, env = "POULTRY_DX_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank candidate diseases for observed symptoms
    Predict {
        /// broiler, layer or breeder
        #[arg(short, long, required_unless_present = "request")]
        bird_type: Option<String>,

        /// Observed symptom (repeatable)
        #[arg(short, long = "symptom")]
        symptoms: Vec<String>,

        /// Age in days
        #[arg(long)]
        age_days: Option<i64>,

        #[arg(long)]
        flock_size: Option<i64>,

        /// Fraction of the flock lost, 0.0 - 1.0
        #[arg(long)]
        mortality_rate: Option<f64>,

        #[arg(long)]
        breed: Option<String>,

        /// Read a JSON request from a file ("-" for stdin) instead
        #[arg(long, conflicts_with_all = ["bird_type", "symptoms"])]
        request: Option<PathBuf>,
    },

    /// Show which canonical symptoms raw inputs resolve to
    Normalize {
        #[arg(short, long)]
        bird_type: String,

        symptoms: Vec<String>,
    },

    /// List diseases applicable to a bird type
    Diseases {
        #[arg(short, long)]
        bird_type: String,
    },

    /// List symptoms grouped by category
    Symptoms,

    /// List common breeds for a bird type
    Breeds {
        #[arg(short, long)]
        bird_type: String,
    },

    /// Import a knowledge document into the --database file
    ImportDb {
        /// Knowledge document to import (default: bundled)
        #[arg(long)]
        from: Option<PathBuf>,
    },

    /// Print the knowledge base fingerprint
    Fingerprint,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            debug!("Using scoring config {}", path.display());
            ScoringConfig::from_path(path)
                .with_context(|| format!("loading scoring config {}", path.display()))?
        }
        None => ScoringConfig::default(),
    };

    match cli.command {
        Command::ImportDb { from } => import_db(cli.database.as_deref(), from.as_deref()),
        command => {
            let kb = load_knowledge_base(cli.knowledge_base.as_deref(), cli.database.as_deref())?;
            run(command, &kb, &config)
        }
    }
}

fn run(command: Command, kb: &KnowledgeBase, config: &ScoringConfig) -> Result<()> {
    let predictor = Predictor::new(kb, config);

    match command {
        Command::Predict {
            bird_type,
            symptoms,
            age_days,
            flock_size,
            mortality_rate,
            breed,
            request,
        } => {
            let request = match request {
                Some(path) => read_request(&path)?,
                None => PredictionRequest {
                    bird_type: bird_type.unwrap_or_default(),
                    breed,
                    age_days,
                    flock_size,
                    mortality_rate,
                    symptoms,
                    additional_info: None,
                },
            };
            let response = predictor.predict(&request)?;
            println!("{}", response.to_json()?);
        }
        Command::Normalize { bird_type, symptoms } => {
            let bird_type = parse_bird_type(&bird_type)?;
            let rows: Vec<_> = symptoms
                .iter()
                .map(|raw| NormalizeRow {
                    input: raw,
                    resolutions: predictor.normalizer().resolve_all(raw, bird_type),
                })
                .collect();
            print_json(&rows)?;
        }
        Command::Diseases { bird_type } => {
            print_json(&kb.disease_summaries(parse_bird_type(&bird_type)?))?;
        }
        Command::Symptoms => {
            print_json(&kb.list_symptom_categories())?;
        }
        Command::Breeds { bird_type } => {
            print_json(kb.breeds(parse_bird_type(&bird_type)?))?;
        }
        Command::Fingerprint => {
            println!("{}", kb.fingerprint());
        }
        Command::ImportDb { .. } => bail!("import-db does not read an existing knowledge base"),
    }

    Ok(())
}

#[derive(Serialize)]
struct NormalizeRow<'a> {
    input: &'a str,
    resolutions: Vec<poultry_dx_core::models::SymptomResolution>,
}

fn load_knowledge_base(
    knowledge_base: Option<&Path>,
    database: Option<&Path>,
) -> Result<KnowledgeBase> {
    let kb = match (knowledge_base, database) {
        (Some(path), _) => KnowledgeBase::from_path(path)
            .with_context(|| format!("loading knowledge base {}", path.display()))?,
        (None, Some(path)) => {
            let db = Database::open(path)
                .with_context(|| format!("opening database {}", path.display()))?;
            KnowledgeBase::from_database(&db)
                .with_context(|| format!("loading knowledge base from {}", path.display()))?
        }
        (None, None) => KnowledgeBase::bundled()?,
    };
    Ok(kb)
}

fn import_db(database: Option<&Path>, from: Option<&Path>) -> Result<()> {
    let Some(database) = database else {
        bail!("import-db needs --database <PATH>");
    };

    // Validate before touching the database
    let kb = match from {
        Some(path) => KnowledgeBase::from_path(path)
            .with_context(|| format!("loading knowledge base {}", path.display()))?,
        None => KnowledgeBase::bundled()?,
    };

    let mut db = Database::open(database)
        .with_context(|| format!("opening database {}", database.display()))?;
    db.import_knowledge_base(kb.document())?;

    info!(database = %database.display(), version = kb.version(), "Import complete");
    println!("{}", kb.fingerprint());
    Ok(())
}

fn read_request(path: &Path) -> Result<PredictionRequest> {
    let json = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading request {}", path.display()))?
    };
    serde_json::from_str(&json).context("invalid prediction request")
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
