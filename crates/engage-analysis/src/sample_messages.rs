//! Example messages for each code, for reviewers to read alongside the counts.

use std::io::Write;

use engage_core::ColumnConfiguration;

use crate::column_view::ColumnView;
use crate::{AnalysisError, csv_writer, reportable_codes};

const HEADERS: &[&str] = &["Dataset", "Theme", "Sample Message"];

/// Write up to `limit_per_code` consenting messages per code, in view order.
pub fn export_sample_messages_csv<W: Write>(
    messages: &ColumnView,
    consent_field: &str,
    columns: &[ColumnConfiguration],
    out: W,
    limit_per_code: usize,
) -> Result<(), AnalysisError> {
    let mut writer = csv_writer(out);
    writer.write_record(HEADERS)?;

    for column in columns {
        let sets = messages.opt_in_code_values(consent_field, column)?;
        for code in reportable_codes(&column.code_scheme) {
            let mut written = 0;
            for (row, set) in sets.iter().enumerate() {
                if written == limit_per_code {
                    break;
                }
                let Some(set) = set else { continue };
                if !set.contains(code.string_value.as_str()) {
                    continue;
                }
                let Some(text) = messages.raw(row, &column.raw_field)? else {
                    continue;
                };
                writer.write_record([
                    column.dataset_name.as_str(),
                    code.string_value.as_str(),
                    text,
                ])?;
                written += 1;
            }
        }
    }

    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}
