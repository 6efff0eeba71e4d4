//! Automated analysis: runs every report over the column views and writes
//! them into one export directory.

use std::fs::{self, File};
use std::path::Path;

use engage_core::codes::CONSENT_WITHDRAWN_KEY;
use engage_core::{AnalysisConfiguration, ColumnConfiguration, TracedRecord};
use tracing::info;

use crate::column_view::ColumnView;
use crate::engagement_counts::export_engagement_counts_csv;
use crate::mapping::{export_participation_maps, mapper_for};
use crate::repeat_participations::export_repeat_participations_csv;
use crate::sample_messages::export_sample_messages_csv;
use crate::theme_distributions::export_theme_distributions_csv;
use crate::AnalysisError;

pub const SAMPLE_MESSAGES_PER_CODE: usize = 100;

/// Build the messages and participants views covering every configured dataset.
pub fn build_column_views(
    records: &[TracedRecord],
    analysis_config: &AnalysisConfiguration,
) -> Result<(ColumnView, ColumnView), AnalysisError> {
    let mut columns = analysis_config.rqa_column_configs();
    columns.extend(analysis_config.demog_column_configs());

    let messages = ColumnView::messages(records, &columns)?;
    let participants = ColumnView::participants(records, &columns)?;
    info!(
        messages = messages.num_rows(),
        participants = participants.num_rows(),
        "converted traced data to column views"
    );
    Ok((messages, participants))
}

fn create(export_dir: &Path, name: &str) -> Result<File, AnalysisError> {
    let path = export_dir.join(name);
    File::create(&path).map_err(|source| AnalysisError::Io { path, source })
}

/// Run every report and write them under `export_dir`, creating it if needed.
pub fn run_automated_analysis(
    messages_by_column: &ColumnView,
    participants_by_column: &ColumnView,
    analysis_config: &AnalysisConfiguration,
    export_dir: &Path,
) -> Result<(), AnalysisError> {
    info!("running automated analysis");
    let rqa_column_configs = analysis_config.rqa_column_configs();
    let demog_column_configs = analysis_config.demog_column_configs();
    fs::create_dir_all(export_dir).map_err(|source| AnalysisError::Io {
        path: export_dir.to_path_buf(),
        source,
    })?;

    info!("exporting engagement counts");
    export_engagement_counts_csv(
        messages_by_column,
        participants_by_column,
        CONSENT_WITHDRAWN_KEY,
        &rqa_column_configs,
        create(export_dir, "engagement_counts.csv")?,
    )?;

    info!("exporting repeat participations");
    export_repeat_participations_csv(
        participants_by_column,
        CONSENT_WITHDRAWN_KEY,
        &rqa_column_configs,
        create(export_dir, "repeat_participations.csv")?,
    )?;

    info!("exporting theme distributions");
    export_theme_distributions_csv(
        participants_by_column,
        CONSENT_WITHDRAWN_KEY,
        &rqa_column_configs,
        &demog_column_configs,
        create(export_dir, "theme_distributions.csv")?,
    )?;

    info!("exporting demographic distributions");
    export_theme_distributions_csv(
        participants_by_column,
        CONSENT_WITHDRAWN_KEY,
        &demog_column_configs,
        &[],
        create(export_dir, "demographic_distributions.csv")?,
    )?;

    info!(limit = SAMPLE_MESSAGES_PER_CODE, "exporting sample messages for each RQA code");
    export_sample_messages_csv(
        messages_by_column,
        CONSENT_WITHDRAWN_KEY,
        &rqa_column_configs,
        create(export_dir, "sample_messages.csv")?,
        SAMPLE_MESSAGES_PER_CODE,
    )?;

    info!("exporting participation maps for each location dataset");
    for dataset in &analysis_config.dataset_configurations {
        for coding in &dataset.coding_configs {
            let Some(location) = coding.kenya_analysis_location else {
                continue;
            };
            let location_column = ColumnConfiguration::new(dataset, coding);
            let name = &location_column.dataset_name;
            let prefix = export_dir.join("maps").join(name).join(format!("{name}_"));
            export_participation_maps(
                participants_by_column,
                CONSENT_WITHDRAWN_KEY,
                &rqa_column_configs,
                &location_column,
                mapper_for(location),
                &prefix.to_string_lossy(),
            )?;
        }
    }

    info!(export_dir = %export_dir.display(), "automated analysis complete");
    Ok(())
}
