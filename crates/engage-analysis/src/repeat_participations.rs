//! How many datasets each consenting participant took part in.

use std::io::Write;

use engage_core::ColumnConfiguration;

use crate::column_view::ColumnView;
use crate::{AnalysisError, csv_writer, percentage};

const HEADERS: &[&str] = &[
    "Number of Datasets Participated In",
    "Number of Participants with Opt-Ins",
    "% of Participants with Opt-Ins",
];

pub fn export_repeat_participations_csv<W: Write>(
    participants: &ColumnView,
    consent_field: &str,
    columns: &[ColumnConfiguration],
    out: W,
) -> Result<(), AnalysisError> {
    // participations[n] = consenting participants active in exactly n datasets
    let mut participations = vec![0usize; columns.len() + 1];
    for row in 0..participants.num_rows() {
        if participants.is_consent_withdrawn(row, consent_field)? {
            continue;
        }
        let mut n = 0;
        for column in columns {
            if participants.raw(row, &column.raw_field)?.is_some() {
                n += 1;
            }
        }
        participations[n] += 1;
    }
    let participated: usize = participations.iter().skip(1).sum();

    let mut writer = csv_writer(out);
    writer.write_record(HEADERS)?;
    for (n, &count) in participations.iter().enumerate().skip(1) {
        writer.write_record([
            n.to_string(),
            count.to_string(),
            percentage(count, participated),
        ])?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}
