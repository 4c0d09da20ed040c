//! codriver-mapper - Main entry point
//!
//! Maps the target sound identifiers of a codriver onto the pacenote
//! catalogs of its plugins and writes the result as CSV. Notes of the base
//! codriver that the mapping does not cover are appended to the report.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use codriver_common::config::{resolve_config_path, LoggingConfig};
use codriver_mapper::config::ProjectConfig;
use codriver_mapper::inventory::scan_target_sounds;
use codriver_mapper::report::{write_catalog_listing, write_mapping_header, write_mapping_rows};
use codriver_mapper::{apply_base_fallback, map_all, BaseReconciler, DiagnosticLog};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for codriver-mapper
#[derive(Parser, Debug)]
#[command(name = "codriver-mapper")]
#[command(about = "Map codriver pacenote catalogs onto target note types")]
#[command(version)]
struct Args {
    /// Project config file (TOML, or JSON with a .json extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Codriver to map, as named in the config
    #[arg(long)]
    codriver: String,

    /// Only build the catalog of this package
    #[arg(short, long)]
    package: Option<String>,

    /// Replace unresolved notes by the base codriver's notes
    #[arg(long)]
    fallback_to_base: bool,

    /// List the source catalogs instead of mapping
    #[arg(long)]
    list_catalog: bool,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the recorded problems to this file
    #[arg(long)]
    diagnostics: Option<PathBuf>,
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("codriver_mapper=info"));

    let registry = tracing_subscriber::registry().with(filter);
    match &logging.file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init(),
    }
    Ok(())
}

fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let mut config = ProjectConfig::load(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    if args.fallback_to_base {
        config.fallback_to_base = true;
    }

    init_tracing(&config.logging)?;
    info!(
        "Starting codriver-mapper v{} with config {}",
        env!("CARGO_PKG_VERSION"),
        config_path.display()
    );

    let mut log = DiagnosticLog::new();
    let popularity = config
        .popularity()
        .context("Failed to read pacenote statistics")?;

    let mut child = config
        .build_codriver(&args.codriver, args.package.as_deref())
        .with_context(|| format!("Failed to set up codriver '{}'", args.codriver))?;
    log.extend(std::mem::take(&mut child.diagnostics));

    let mut out = open_output(args.output.as_ref())?;

    if args.list_catalog {
        let rows = write_catalog_listing(&mut out, &child.catalogs, popularity.as_ref())?;
        out.flush()?;
        info!(rows, "Catalog listing written");
        return finish(&log, args.diagnostics.as_ref());
    }

    let registry = config
        .registry(&mut log)
        .context("Failed to load target registry")?;
    let inventory = scan_target_sounds(&config.target_sounds, &mut log);
    let identifiers: Vec<String> = inventory.names().map(String::from).collect();

    let mut base = if args.codriver == config.base_codriver {
        None
    } else {
        Some(
            config
                .build_codriver(&config.base_codriver, None)
                .with_context(|| format!("Failed to set up base codriver '{}'", config.base_codriver))?,
        )
    };
    if let Some(base) = base.as_mut() {
        log.extend(std::mem::take(&mut base.diagnostics));
    }
    let base_ref = base.as_ref().unwrap_or(&child);
    let base_catalog = base_ref.catalog(&config.base_package)?;

    let mut associations = map_all(
        &registry,
        &child.catalogs,
        &child.rules,
        &identifiers,
        popularity.as_ref(),
        &mut log,
    )
    .context("Mapping failed")?;

    if child.rules.fallback_to_base() && base.is_some() {
        let base_associations = map_all(
            &registry,
            &base_ref.catalogs,
            &base_ref.rules,
            &identifiers,
            popularity.as_ref(),
            &mut log,
        )
        .context("Mapping the base codriver failed")?;
        associations = apply_base_fallback(associations, &base_associations);
    }

    let uncovered = BaseReconciler::new(&registry, &child.rules)
        .with_popularity(popularity.as_ref())
        .reconcile(&associations, base_catalog, &child.catalogs);

    write_mapping_header(&mut out)?;
    let mut rows = write_mapping_rows(&mut out, &associations)?;
    rows += write_mapping_rows(&mut out, &uncovered)?;
    out.flush()?;

    info!(
        targets = associations.len(),
        uncovered_base_notes = uncovered.len(),
        rows,
        "Mapping report written"
    );

    finish(&log, args.diagnostics.as_ref())
}

/// Report the recorded problems at the end of a run
fn finish(log: &DiagnosticLog, diagnostics: Option<&PathBuf>) -> Result<()> {
    if log.is_empty() {
        info!("{}", log.summary_message());
    } else {
        warn!("{}", log.summary_message());
    }

    if let Some(path) = diagnostics {
        let mut file = BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        );
        for entry in log.entries() {
            writeln!(file, "{}", entry)?;
        }
        file.flush()?;
    }
    Ok(())
}
