//! sanaee - Worker directory command-line tool
//!
//! Lists, adds and deletes tradespeople in the local directory. The
//! collection lives in `sanaee.db` under the resolved root folder, or in
//! memory with `--ephemeral`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sanaee_common::config::{
    default_config_path, resolve_toml_config, write_toml_config, RootFolderInitializer,
    RootFolderResolver, TomlConfig,
};
use sanaee_common::Specialty;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sanaee_ingest::db::{self, ByteStore, MemoryByteStore, SqliteByteStore};
use sanaee_ingest::services::{MediaFile, MediaPipeline};
use sanaee_ingest::validators::{ValidationReport, WorkerForm};
use sanaee_ingest::workflow::{
    avatar_for, directory_stats, distinct_areas, filter_workers, sanitize_phone, star_line, Avatar,
    WorkerFilter,
};
use sanaee_ingest::IngestError;

#[derive(Parser)]
#[command(name = "sanaee", version, about = "Local directory of tradespeople")]
struct Cli {
    /// Root folder holding sanaee.db
    #[arg(long, global = true)]
    root_folder: Option<PathBuf>,

    /// Config file (default: platform config dir)
    #[arg(long, global = true, env = "SANAEE_CONFIG")]
    config: Option<PathBuf>,

    /// Keep the collection in memory only
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(flatten)]
    Directory(DirectoryCommand),
    /// Run the image pipeline on a file without storing anything
    Compress {
        path: PathBuf,
        /// Write the resulting data URL here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Write a config file with default values
    InitConfig { path: Option<PathBuf> },
}

/// Commands that open the worker store
#[derive(Subcommand)]
enum DirectoryCommand {
    /// List workers, newest first
    List {
        /// Only this specialty (label or English key)
        #[arg(long)]
        specialty: Option<String>,
        /// Only this area
        #[arg(long)]
        area: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add a worker
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        specialty: String,
        #[arg(long)]
        area: String,
        #[arg(long)]
        phone: String,
        #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
        rating: i64,
        /// Photo to compress and attach
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Delete a worker by id
    Delete { id: String },
    /// Show directory counters
    Stats,
    /// List distinct areas
    Areas,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let (config, config_source) = resolve_toml_config(cli.config.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("sanaee v{}", env!("CARGO_PKG_VERSION"));
    config_source.log();

    match cli.command {
        Command::InitConfig { path } => init_config(path).map(|()| ExitCode::SUCCESS),
        Command::Compress { path, out } => {
            compress(&config, path, out).await.map(|()| ExitCode::SUCCESS)
        }
        Command::Directory(command) => {
            let backend = open_backend(&cli.root_folder, cli.ephemeral, &config).await?;
            let directory = sanaee_ingest::open_directory(backend, &config).await;
            run(command, directory).await
        }
    }
}

async fn open_backend(
    root_folder: &Option<PathBuf>,
    ephemeral: bool,
    config: &TomlConfig,
) -> Result<Arc<dyn ByteStore>> {
    if ephemeral {
        info!("Using in-memory store");
        return Ok(Arc::new(MemoryByteStore::new(config.storage.quota_bytes)));
    }

    let root_folder = RootFolderResolver::new()
        .with_cli_arg(root_folder.clone())
        .with_toml(config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let pool = db::init_database_pool(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    Ok(Arc::new(SqliteByteStore::new(pool, config.storage.quota_bytes)))
}

async fn run(
    command: DirectoryCommand,
    mut directory: sanaee_ingest::workflow::Directory,
) -> Result<ExitCode> {
    match command {
        DirectoryCommand::List {
            specialty,
            area,
            json,
        } => {
            let specialty = match specialty {
                Some(raw) => Some(
                    Specialty::parse(&raw)
                        .with_context(|| format!("Unknown specialty: {}", raw))?,
                ),
                None => None,
            };
            let filter = WorkerFilter { specialty, area };
            let workers = filter_workers(directory.workers(), &filter);

            if json {
                println!("{}", serde_json::to_string_pretty(&workers)?);
            } else if workers.is_empty() {
                println!("No workers match.");
            } else {
                for w in workers {
                    let avatar = match avatar_for(w) {
                        Avatar::Image(_) => "🖼",
                        Avatar::Icon(icon) => icon,
                    };
                    println!(
                        "{} {}  {} | {} | {} | tel:{} | {}",
                        avatar,
                        w.id,
                        w.name,
                        w.specialty,
                        w.area,
                        sanitize_phone(&w.phone),
                        star_line(w.rating)
                    );
                }
            }
        }
        DirectoryCommand::Add {
            name,
            specialty,
            area,
            phone,
            rating,
            image,
        } => {
            let form = WorkerForm {
                name,
                specialty,
                area,
                phone,
                rating,
            };

            // The image file is not touched until the form passes
            let report = directory.validate_form(&form);
            if !report.is_valid() {
                return Ok(reject_form(&report));
            }

            let image = match image {
                Some(path) => Some(MediaFile::from_path(&path)?),
                None => None,
            };

            match directory.add(&form, image.as_ref()).await {
                Ok(record) => println!("Added \"{}\" ({})", record.name, record.id),
                Err(IngestError::Validation(report)) => return Ok(reject_form(&report)),
                Err(e @ IngestError::CapacityExceeded { .. }) => return Ok(storage_full(&e)),
                Err(e) => return Err(e.into()),
            }
        }
        DirectoryCommand::Delete { id } => match directory.delete(&id).await {
            Ok(true) => println!("Deleted {}", id),
            Ok(false) => println!("No worker with id {}", id),
            Err(e @ IngestError::CapacityExceeded { .. }) => return Ok(storage_full(&e)),
            Err(e) => return Err(e.into()),
        },
        DirectoryCommand::Stats => {
            let stats = directory_stats(directory.workers());
            println!("Workers:     {}", stats.total_workers);
            println!("Areas:       {}", stats.total_areas);
            println!("Specialties: {}", stats.total_specialties);
        }
        DirectoryCommand::Areas => {
            for area in distinct_areas(directory.workers()) {
                println!("{}", area);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// One line per failed field, then a summary
fn reject_form(report: &ValidationReport) -> ExitCode {
    for failure in report.failures() {
        eprintln!("  {}: {}", failure.field, failure.message);
    }
    eprintln!("Worker not added: {} invalid field(s)", report.failures().len());
    ExitCode::FAILURE
}

/// Storage full: a warning line and a non-zero exit, nothing changed
fn storage_full(err: &IngestError) -> ExitCode {
    eprintln!("Warning: {}", err);
    ExitCode::FAILURE
}

async fn compress(config: &TomlConfig, path: PathBuf, out: Option<PathBuf>) -> Result<()> {
    let file = MediaFile::from_path(&path)?;
    let pipeline = MediaPipeline::new(&config.media);
    let encoded = pipeline.compress(&file).await?;

    eprintln!(
        "{}: {} ({} bytes) -> {}x{} JPEG, {} chars",
        file.name,
        file.declared_type,
        file.size,
        encoded.width,
        encoded.height,
        encoded.data_url.len()
    );

    match out {
        Some(out) => std::fs::write(&out, encoded.as_str())
            .with_context(|| format!("Failed to write {}", out.display()))?,
        None => println!("{}", encoded.as_str()),
    }
    Ok(())
}

fn init_config(path: Option<PathBuf>) -> Result<()> {
    let path = path
        .or_else(default_config_path)
        .context("Could not determine config directory")?;
    if path.exists() {
        anyhow::bail!("Config already exists: {}", path.display());
    }
    write_toml_config(&TomlConfig::default(), &path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
