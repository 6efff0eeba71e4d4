//! Participation maps: per-region participant counts for a location dataset.
//!
//! Each map is written as a region table (`<Region>,Participants,% of Participants`)
//! covering every region in the location code scheme, zero-filled.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use engage_core::{AnalysisLocation, CodeType, ColumnConfiguration};
use tracing::info;

use crate::column_view::ColumnView;
use crate::{AnalysisError, csv_writer, percentage};

/// Writes one map from region code to participant count.
pub type MapExporter = fn(&BTreeMap<String, usize>, &Path) -> Result<(), AnalysisError>;

pub fn export_kenya_counties_map(
    counts: &BTreeMap<String, usize>,
    path: &Path,
) -> Result<(), AnalysisError> {
    write_region_table("County", counts, path)
}

pub fn export_kenya_constituencies_map(
    counts: &BTreeMap<String, usize>,
    path: &Path,
) -> Result<(), AnalysisError> {
    write_region_table("Constituency", counts, path)
}

pub fn mapper_for(location: AnalysisLocation) -> MapExporter {
    match location {
        AnalysisLocation::KenyaCounty => export_kenya_counties_map,
        AnalysisLocation::KenyaConstituency => export_kenya_constituencies_map,
    }
}

fn write_region_table(
    level: &str,
    counts: &BTreeMap<String, usize>,
    path: &Path,
) -> Result<(), AnalysisError> {
    let file = File::create(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let total: usize = counts.values().sum();

    let mut writer = csv_writer(file);
    writer.write_record([level, "Participants", "% of Participants"])?;
    for (region, &count) in counts {
        writer.write_record([region.clone(), count.to_string(), percentage(count, total)])?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Export a total-participants map and one relevant-participants map per RQA
/// dataset, to `<file_prefix>total_participants.csv` and
/// `<file_prefix><dataset>_total_relevant.csv`.
pub fn export_participation_maps(
    participants: &ColumnView,
    consent_field: &str,
    rqa_columns: &[ColumnConfiguration],
    location_column: &ColumnConfiguration,
    mapper: MapExporter,
    file_prefix: &str,
) -> Result<Vec<PathBuf>, AnalysisError> {
    let prefix_path = PathBuf::from(file_prefix);
    if let Some(dir) = prefix_path.parent() {
        fs::create_dir_all(dir).map_err(|source| AnalysisError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let regions = participants.opt_in_code_values(consent_field, location_column)?;
    let region_counts = |include: &dyn Fn(usize) -> Result<bool, AnalysisError>|
     -> Result<BTreeMap<String, usize>, AnalysisError> {
        let mut counts: BTreeMap<String, usize> = location_column
            .code_scheme
            .codes
            .iter()
            .filter(|c| c.code_type == CodeType::Normal)
            .map(|c| (c.string_value.clone(), 0))
            .collect();
        for (row, values) in regions.iter().enumerate() {
            let Some(values) = values else { continue };
            if !include(row)? {
                continue;
            }
            for value in values {
                if let Some(count) = counts.get_mut(*value) {
                    *count += 1;
                }
            }
        }
        Ok(counts)
    };

    let mut written = Vec::with_capacity(rqa_columns.len() + 1);

    let path = PathBuf::from(format!("{file_prefix}total_participants.csv"));
    mapper(&region_counts(&|_| Ok(true))?, &path)?;
    written.push(path);

    for rqa in rqa_columns {
        let relevant = |row: usize| -> Result<bool, AnalysisError> {
            Ok(participants
                .codes(row, rqa)?
                .iter()
                .any(|c| c.code_type == CodeType::Normal))
        };
        let path = PathBuf::from(format!("{file_prefix}{}_total_relevant.csv", rqa.dataset_name));
        mapper(&region_counts(&relevant)?, &path)?;
        written.push(path);
    }

    info!(
        location = %location_column.dataset_name,
        maps = written.len(),
        "exported participation maps"
    );
    Ok(written)
}
