use anyhow::Context;
use clap::{Parser, Subcommand};
use layerwatch::{init_logging, CommentAnnotator, ObjectRegistry, ObjectTrackingConfig, Settings, UploadLedger};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Settings file (.json or .toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite slicer object comments into annotations
    Annotate { input: PathBuf, output: PathBuf },
    /// List the objects of an annotated file as JSON
    Objects { file: PathBuf },
    /// Show the upload ledger
    History {
        /// Data folder holding the ledger; defaults to the configured one
        data_folder: Option<PathBuf>,
    },
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    match path {
        Some(path) => Settings::load_from_file(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(Settings::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Annotate { input, output } => {
            let config = ObjectTrackingConfig::from_settings(&settings)?;
            let stats = CommentAnnotator::new(&config).annotate_file(&input, &output)?;
            tracing::info!(
                "Annotated {} -> {}: {} lines in, {} out, {} object markers, {} info markers, {} stop markers",
                input.display(),
                output.display(),
                stats.lines_read,
                stats.lines_written,
                stats.object_markers,
                stats.info_markers,
                stats.stop_markers
            );
        }
        Commands::Objects { file } => {
            let config = ObjectTrackingConfig::from_settings(&settings)?;
            let registry = ObjectRegistry::scan_file(&file, &config)?;
            println!("{}", serde_json::to_string_pretty(registry.entries())?);
        }
        Commands::History { data_folder } => {
            let data_folder = match data_folder {
                Some(folder) => folder,
                None => settings.resolved_data_folder()?,
            };
            for record in UploadLedger::new(&data_folder).rows()? {
                println!("{}\t{}", record.job_name, record.completion_date);
            }
        }
    }

    Ok(())
}
