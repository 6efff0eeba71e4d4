//! Automated analysis: column views over traced data and the CSV reports and
//! participation maps built from them.

pub mod column_view;
pub mod driver;
pub mod engagement_counts;
mod error;
pub mod mapping;
pub mod repeat_participations;
pub mod sample_messages;
pub mod theme_distributions;

use std::io::Write;

use engage_core::codes::{NOT_CODED, STOP};
use engage_core::{Code, CodeScheme, CodeType};

pub use column_view::ColumnView;
pub use driver::{build_column_views, run_automated_analysis};
pub use error::AnalysisError;
pub use mapping::{MapExporter, export_participation_maps, mapper_for};

pub(crate) fn csv_writer<W: Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out)
}

/// `count` as a percentage of `total` to one decimal place; `0.0` when `total` is zero.
pub(crate) fn percentage(count: usize, total: usize) -> String {
    if total == 0 {
        return "0.0".to_string();
    }
    format!("{:.1}", count as f64 * 100.0 / total as f64)
}

/// Codes that appear as report rows: every normal and meta code, plus the
/// not-coded and stop controls.
pub(crate) fn reportable_codes(scheme: &CodeScheme) -> impl Iterator<Item = &Code> {
    scheme.codes.iter().filter(|c| match c.code_type {
        CodeType::Normal | CodeType::Meta => true,
        CodeType::Control => c.string_value == NOT_CODED || c.string_value == STOP,
    })
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use engage_core::{
        AnalysisConfiguration, AnalysisLocation, Code, CodeScheme, CodeType, CodingConfiguration,
        DatasetConfiguration, DatasetType, Label, TracedRecord,
    };
    use serde_json::Value;

    fn scheme(name: &str, codes: &[(&str, CodeType, &str)]) -> CodeScheme {
        CodeScheme::new(
            &format!("Scheme-{name}"),
            name,
            codes
                .iter()
                .map(|(id, code_type, value)| Code::new(id, *code_type, value))
                .collect(),
        )
    }

    fn dataset(
        name: &str,
        dataset_type: DatasetType,
        scheme: CodeScheme,
        location: Option<AnalysisLocation>,
    ) -> DatasetConfiguration {
        DatasetConfiguration {
            raw_dataset: format!("{name}_raw"),
            dataset_type,
            coding_configs: vec![CodingConfiguration {
                analysis_dataset: name.to_string(),
                code_scheme: scheme,
                kenya_analysis_location: location,
            }],
        }
    }

    fn rqa(name: &str) -> DatasetConfiguration {
        let codes = scheme(
            name,
            &[
                ("code-water", CodeType::Normal, "water"),
                ("code-food", CodeType::Normal, "food"),
                ("code-greeting", CodeType::Meta, "greeting"),
                ("code-NC", CodeType::Control, "NC"),
                ("code-STOP", CodeType::Control, "STOP"),
                ("code-NR", CodeType::Control, "NR"),
            ],
        );
        dataset(name, DatasetType::ResearchQuestionAnswer, codes, None)
    }

    /// One RQA episode (`s01e01`) plus `gender` and a county-level `location`.
    pub fn analysis() -> AnalysisConfiguration {
        let gender = scheme(
            "gender",
            &[
                ("code-female", CodeType::Normal, "female"),
                ("code-male", CodeType::Normal, "male"),
            ],
        );
        let location = scheme(
            "location",
            &[
                ("code-nairobi", CodeType::Normal, "nairobi"),
                ("code-mombasa", CodeType::Normal, "mombasa"),
                ("code-NC", CodeType::Control, "NC"),
            ],
        );
        AnalysisConfiguration {
            dataset_configurations: vec![
                rqa("s01e01"),
                dataset("gender", DatasetType::Demographic, gender, None),
                dataset(
                    "location",
                    DatasetType::Demographic,
                    location,
                    Some(AnalysisLocation::KenyaCounty),
                ),
            ],
        }
    }

    pub fn analysis_with_two_episodes() -> AnalysisConfiguration {
        AnalysisConfiguration {
            dataset_configurations: vec![rqa("s01e01"), rqa("s01e02")],
        }
    }

    /// A record carrying `text` under `<dataset>_raw` and labels for `code_ids`.
    pub fn message(
        uuid: &str,
        consent_withdrawn: bool,
        analysis_dataset: &str,
        text: &str,
        code_ids: &[&str],
    ) -> TracedRecord {
        let scheme_id = format!("Scheme-{analysis_dataset}");
        let labels: Vec<Label> = code_ids.iter().map(|id| Label::new(&scheme_id, id)).collect();
        TracedRecord::new(uuid, consent_withdrawn)
            .with_field(&format!("{analysis_dataset}_raw"), Value::String(text.to_string()))
            .with_labels(analysis_dataset, &labels)
    }
}
