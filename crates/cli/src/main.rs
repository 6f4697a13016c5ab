use clap::{Parser, Subcommand};
use femr_core::{
    config::{fetch_timeout_from_env_value, resolve_data_dir},
    CoreConfig, EncounterId, PageLayout, RenderedReport, ReportFormat, ReportService,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "femr")]
#[command(about = "fEMR encounter report CLI")]
struct Cli {
    /// Encounter data directory (defaults to FEMR_DATA_DIR, then ./encounter_data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the report of an encounter
    Report {
        /// Encounter id
        encounter_id: EncounterId,
        /// Output format: pdf or text
        #[arg(long, default_value = "pdf")]
        format: ReportFormat,
        /// Output file (defaults to encounter-<id>.pdf for PDF, stdout for text)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the custom tab-field categories and chief complaints of an encounter
    Fields {
        /// Encounter id
        encounter_id: EncounterId,
    },
}

fn service(data_dir: Option<PathBuf>) -> Result<ReportService, Box<dyn std::error::Error>> {
    let data_dir = data_dir.or_else(|| std::env::var("FEMR_DATA_DIR").ok().map(PathBuf::from));
    let cfg = CoreConfig::new(
        resolve_data_dir(data_dir)?,
        fetch_timeout_from_env_value(std::env::var("FEMR_FETCH_TIMEOUT_SECS").ok())?,
        PageLayout::a4(),
    )?;
    Ok(ReportService::with_yaml_store(Arc::new(cfg)))
}

/// Where a report goes when `--out` is not given.
fn default_output(encounter_id: EncounterId, format: ReportFormat) -> Option<PathBuf> {
    match format {
        ReportFormat::Pdf => Some(PathBuf::from(format!("encounter-{encounter_id}.pdf"))),
        ReportFormat::Text => None,
    }
}

fn write_report(report: &RenderedReport, out: Option<&Path>) -> std::io::Result<()> {
    match out {
        Some(path) => std::fs::write(path, &report.bytes),
        None => {
            use std::io::Write;
            std::io::stdout().write_all(&report.bytes)
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("femr_core=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Some(Commands::Report {
            encounter_id,
            format,
            out,
        }) => {
            let service = service(cli.data_dir)?;
            let report = service.generate(encounter_id, format)?;
            let out = out.or_else(|| default_output(encounter_id, format));
            write_report(&report, out.as_deref())?;
            if let Some(path) = &out {
                println!(
                    "Wrote report for encounter {} to {}",
                    encounter_id,
                    path.display()
                );
            }
            if !report.complete {
                eprintln!("Warning: the report is incomplete, see the log for details");
            }
        }
        Some(Commands::Fields { encounter_id }) => {
            let fields = service(cli.data_dir)?.fields(encounter_id)?;
            println!("Custom categories:");
            if fields.custom_categories.is_empty() {
                println!("  (none)");
            }
            for category in &fields.custom_categories {
                println!("  {}", category);
            }
            println!("Chief complaints:");
            if fields.complaint_scopes.is_empty() {
                println!("  (none)");
            }
            for scope in &fields.complaint_scopes {
                println!("  {}", scope);
            }
        }
        None => {
            println!("Use 'femr --help' for commands");
        }
    }

    Ok(())
}
