//! Message and participant engagement counts per dataset.

use std::io::Write;

use engage_core::{CodeType, ColumnConfiguration};

use crate::column_view::ColumnView;
use crate::{AnalysisError, csv_writer};

const HEADERS: &[&str] = &[
    "Dataset",
    "Total Messages",
    "Total Messages with Opt-Ins",
    "Total Labelled Messages",
    "Total Relevant Messages",
    "Total Participants",
    "Total Participants with Opt-Ins",
    "Total Relevant Participants",
];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct EngagementCounts {
    pub total: usize,
    pub opt_ins: usize,
    pub labelled: usize,
    pub relevant: usize,
}

/// Count rows that carry raw text for any of `columns`.
///
/// Labelled and relevant counts only consider rows with consent.
pub fn count_engagement(
    view: &ColumnView,
    consent_field: &str,
    columns: &[&ColumnConfiguration],
) -> Result<EngagementCounts, AnalysisError> {
    let mut counts = EngagementCounts::default();
    for row in 0..view.num_rows() {
        let mut participated = false;
        let mut labelled = false;
        let mut relevant = false;
        for column in columns {
            if view.raw(row, &column.raw_field)?.is_none() {
                continue;
            }
            participated = true;
            let codes = view.codes(row, column)?;
            labelled |= !codes.is_empty();
            relevant |= codes.iter().any(|c| c.code_type == CodeType::Normal);
        }
        if !participated {
            continue;
        }
        counts.total += 1;
        if view.is_consent_withdrawn(row, consent_field)? {
            continue;
        }
        counts.opt_ins += 1;
        counts.labelled += usize::from(labelled);
        counts.relevant += usize::from(relevant);
    }
    Ok(counts)
}

/// Write one row per dataset plus a `Total` row across all of them.
pub fn export_engagement_counts_csv<W: Write>(
    messages: &ColumnView,
    participants: &ColumnView,
    consent_field: &str,
    columns: &[ColumnConfiguration],
    out: W,
) -> Result<(), AnalysisError> {
    let mut writer = csv_writer(out);
    writer.write_record(HEADERS)?;

    let mut write_row = |name: &str, cols: &[&ColumnConfiguration]| -> Result<(), AnalysisError> {
        let m = count_engagement(messages, consent_field, cols)?;
        let p = count_engagement(participants, consent_field, cols)?;
        writer.write_record([
            name.to_string(),
            m.total.to_string(),
            m.opt_ins.to_string(),
            m.labelled.to_string(),
            m.relevant.to_string(),
            p.total.to_string(),
            p.opt_ins.to_string(),
            p.relevant.to_string(),
        ])?;
        Ok(())
    };

    for column in columns {
        write_row(&column.dataset_name, &[column])?;
    }
    let all: Vec<&ColumnConfiguration> = columns.iter().collect();
    write_row("Total", &all)?;

    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}
