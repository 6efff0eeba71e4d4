mod pipeline;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use engage_core::PipelineConfiguration;
use engage_store::load_traced_data;
use engage_sync::init_uuid_table_client;

#[derive(Parser)]
#[command(name = "engage")]
#[command(about = "Contact exports and automated analysis for survey traced data", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the contacts of participants who withdrew consent
    #[command(name = "export-opt-out-contacts")]
    ExportOptOutContacts {
        /// JSON credentials for the uuid table
        credentials: PathBuf,
        /// Pipeline configuration (TOML)
        config: PathBuf,
        /// Traced data files (JSONL), read in order
        #[arg(required = true, num_args = 1..)]
        traced_data: Vec<PathBuf>,
        /// Directory to write the contacts CSV into
        output_dir: PathBuf,
    },

    /// Export the contacts of consenting participants who sent only
    /// non-relevant messages to a dataset
    #[command(name = "export-non-relevant-contacts")]
    ExportNonRelevantContacts {
        /// JSON credentials for the uuid table
        credentials: PathBuf,
        /// Pipeline configuration (TOML)
        config: PathBuf,
        /// Traced data files (JSONL), then the target raw dataset and the output directory
        #[arg(required = true, num_args = 3..)]
        rest: Vec<String>,
    },

    /// Write engagement, theme, sample and map reports for traced data
    #[command(name = "automated-analysis")]
    AutomatedAnalysis {
        /// Pipeline configuration (TOML)
        config: PathBuf,
        /// Traced data files (JSONL), read in order
        #[arg(required = true, num_args = 1..)]
        traced_data: Vec<PathBuf>,
        /// Directory to write the reports into
        export_dir: PathBuf,
    },
}

fn load_inputs(
    config: &Path,
    traced_data: &[PathBuf],
) -> anyhow::Result<(PipelineConfiguration, Vec<engage_core::TracedRecord>)> {
    let config = PipelineConfiguration::load(config)
        .with_context(|| format!("loading pipeline configuration {}", config.display()))?;
    let records = load_traced_data(traced_data).context("loading traced data")?;
    Ok((config, records))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    tracing::info!("engage v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::ExportOptOutContacts {
            credentials,
            config,
            traced_data,
            output_dir,
        } => {
            let (config, records) = load_inputs(&config, &traced_data)?;
            let lookup = init_uuid_table_client(&config.uuid_table, &credentials)
                .context("initialising uuid table client")?;
            let stats =
                pipeline::run_opt_out_export(&records, &config, lookup.as_ref(), &output_dir)
                    .await?;
            eprintln!(
                "Exported {} urns for {} opted-out participants from {} records to {} ({:.1}s)",
                stats.urns,
                stats.participants,
                stats.records,
                stats.path.display(),
                stats.elapsed_secs
            );
        }

        Commands::ExportNonRelevantContacts {
            credentials,
            config,
            mut rest,
        } => {
            let (Some(output_dir), Some(target_raw_dataset)) = (rest.pop(), rest.pop()) else {
                bail!("expected traced data, a target raw dataset and an output directory");
            };
            if rest.is_empty() {
                bail!("expected at least one traced data file");
            }
            let traced_data: Vec<PathBuf> = rest.into_iter().map(PathBuf::from).collect();

            let (config, records) = load_inputs(&config, &traced_data)?;
            let lookup = init_uuid_table_client(&config.uuid_table, &credentials)
                .context("initialising uuid table client")?;
            let stats = pipeline::run_non_relevant_export(
                &records,
                &config,
                &target_raw_dataset,
                lookup.as_ref(),
                Path::new(&output_dir),
            )
            .await?;
            eprintln!(
                "Exported {} urns for {} non-relevant participants from {} records in {} to {} ({:.1}s)",
                stats.urns,
                stats.participants,
                stats.records,
                target_raw_dataset,
                stats.path.display(),
                stats.elapsed_secs
            );
        }

        Commands::AutomatedAnalysis {
            config,
            traced_data,
            export_dir,
        } => {
            let (config, records) = load_inputs(&config, &traced_data)?;
            pipeline::run_analysis(&records, &config.analysis, &export_dir)?;
            eprintln!(
                "Wrote analysis of {} records to {}",
                records.len(),
                export_dir.display()
            );
        }
    }

    Ok(())
}
