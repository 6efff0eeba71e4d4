//! Participant counts per code, optionally broken down by other datasets' codes.

use std::collections::BTreeSet;
use std::io::Write;

use engage_core::ColumnConfiguration;

use crate::column_view::ColumnView;
use crate::{AnalysisError, csv_writer, percentage, reportable_codes};

type CodeSets<'s> = Vec<Option<BTreeSet<&'s str>>>;

/// Write, per dataset in `columns`, a `Total` row and one row per reportable
/// code, with a count column for every reportable code of every breakdown.
pub fn export_theme_distributions_csv<W: Write>(
    participants: &ColumnView,
    consent_field: &str,
    columns: &[ColumnConfiguration],
    breakdowns: &[ColumnConfiguration],
    out: W,
) -> Result<(), AnalysisError> {
    let breakdown_sets: Vec<CodeSets> = breakdowns
        .iter()
        .map(|b| participants.opt_in_code_values(consent_field, b))
        .collect::<Result<_, _>>()?;

    let mut headers = vec![
        "Dataset".to_string(),
        "Theme".to_string(),
        "Total Participants".to_string(),
        "Total Participants %".to_string(),
    ];
    for breakdown in breakdowns {
        for code in reportable_codes(&breakdown.code_scheme) {
            headers.push(format!("{}:{}", breakdown.dataset_name, code.string_value));
        }
    }

    let mut writer = csv_writer(out);
    writer.write_record(&headers)?;

    for column in columns {
        let sets = participants.opt_in_code_values(consent_field, column)?;
        let labelled: Vec<usize> = sets
            .iter()
            .enumerate()
            .filter(|(_, s)| s.as_ref().is_some_and(|s| !s.is_empty()))
            .map(|(row, _)| row)
            .collect();

        let mut themes: Vec<(&str, Vec<usize>)> = vec![("Total", labelled.clone())];
        for code in reportable_codes(&column.code_scheme) {
            let rows = labelled
                .iter()
                .copied()
                .filter(|&row| has_code(&sets, row, &code.string_value))
                .collect();
            themes.push((code.string_value.as_str(), rows));
        }

        for (theme, rows) in &themes {
            let mut record = vec![
                column.dataset_name.clone(),
                theme.to_string(),
                rows.len().to_string(),
                percentage(rows.len(), labelled.len()),
            ];
            for (breakdown, b_sets) in breakdowns.iter().zip(&breakdown_sets) {
                for code in reportable_codes(&breakdown.code_scheme) {
                    let n = rows
                        .iter()
                        .filter(|&&row| has_code(b_sets, row, &code.string_value))
                        .count();
                    record.push(n.to_string());
                }
            }
            writer.write_record(&record)?;
        }
    }

    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn has_code(sets: &CodeSets<'_>, row: usize, value: &str) -> bool {
    sets[row].as_ref().is_some_and(|s| s.contains(value))
}
