use clap::{Parser, Subcommand};
use breadboard::{AnalyzerConfig, Pipeline, io::load_image};
use cli::{AnalysisSummary, CliError, OutputTargets, SchemaTarget, schema_json};
use color_eyre::eyre::Result;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a breadboard photograph
    Analyze {
        /// Path to the input image
        #[arg(short, long)]
        image: PathBuf,
        /// Path to the TOML or JSON configuration file
        #[arg(short, long)]
        config: PathBuf,
        /// Write the JSON record here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also export the record as GeoJSON
        #[arg(long)]
        geojson: Option<PathBuf>,
        /// Directory for intermediate mask snapshots
        #[arg(long)]
        debug_dir: Option<PathBuf>,
    },
    /// Print the JSON schema of the output record
    Schema {
        /// Print the configuration schema instead
        #[arg(long)]
        config: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { image, config, output, geojson, debug_dir } => {
            let targets = OutputTargets { json: output, geojson };
            analyze(&image, &config, debug_dir, &targets)?;
        }
        Commands::Schema { config } => {
            let target = if config { SchemaTarget::Config } else { SchemaTarget::Record };
            println!("{}", schema_json(target)?);
        }
    }

    Ok(())
}

fn analyze(image_path: &Path, config_path: &Path, debug_dir: Option<PathBuf>, targets: &OutputTargets) -> Result<()> {
    if !image_path.exists() {
        return Err(CliError::MissingImage(image_path.to_path_buf()).into());
    }

    let config = AnalyzerConfig::from_file(config_path)?;
    info!("Loaded configuration from {}", config_path.display());

    let mut builder = Pipeline::builder(config);
    if let Some(dir) = debug_dir {
        builder = builder.with_debug_dir(dir);
    }
    let pipeline = builder.build();
    info!("{}", pipeline.info());

    let image = load_image(image_path)?;
    let record = pipeline.process(&image)?;

    if let Some(json) = targets.write(&record)? {
        println!("{json}");
    }

    let summary = AnalysisSummary::new(image_path, &record);
    info!("Analysis complete: {}", serde_json::to_string(&summary)?);

    Ok(())
}
