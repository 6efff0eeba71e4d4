//! Contact export and analysis pipelines: traced data in, CSV files out.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use engage_analysis::{build_column_views, run_automated_analysis};
use engage_core::{
    AnalysisConfiguration, NonRelevantPolicy, OptOutPolicy, PipelineConfiguration, RecordPolicy,
    TracedRecord, collect_identifiers,
};
use engage_store::{export_urns_csv, nc_contacts_file_name, opt_out_contacts_file_name};
use engage_sync::{RetryPolicy, UuidLookup, resolve_urns};
use tracing::info;

pub struct ExportStats {
    pub records: usize,
    pub participants: usize,
    pub urns: usize,
    pub path: PathBuf,
    pub elapsed_secs: f64,
}

/// Export the contacts of every participant who withdrew consent.
pub async fn run_opt_out_export(
    records: &[TracedRecord],
    config: &PipelineConfiguration,
    lookup: &dyn UuidLookup,
    output_dir: &Path,
) -> anyhow::Result<ExportStats> {
    let path = output_dir.join(opt_out_contacts_file_name(&config.pipeline_name));
    export_contacts(records, &OptOutPolicy, config, lookup, path).await
}

/// Export the contacts of consenting participants whose messages to
/// `target_raw_dataset` were all non-relevant.
pub async fn run_non_relevant_export(
    records: &[TracedRecord],
    config: &PipelineConfiguration,
    target_raw_dataset: &str,
    lookup: &dyn UuidLookup,
    output_dir: &Path,
) -> anyhow::Result<ExportStats> {
    let policy = NonRelevantPolicy::new(&config.analysis, target_raw_dataset);
    let path = output_dir.join(nc_contacts_file_name(target_raw_dataset));
    export_contacts(records, &policy, config, lookup, path).await
}

async fn export_contacts(
    records: &[TracedRecord],
    policy: &dyn RecordPolicy,
    config: &PipelineConfiguration,
    lookup: &dyn UuidLookup,
    path: PathBuf,
) -> anyhow::Result<ExportStats> {
    let start = Instant::now();

    let uuids = collect_identifiers(records, policy).context("filtering traced data")?;
    info!(
        records = records.len(),
        participants = uuids.len(),
        "collected participant uuids"
    );

    let retry = RetryPolicy::new(config.uuid_table.max_attempts());
    let urns = resolve_urns(lookup, &uuids, retry)
        .await
        .context("resolving participant uuids to urns")?;

    let written = export_urns_csv(&urns, &path)
        .with_context(|| format!("exporting contacts to {}", path.display()))?;

    Ok(ExportStats {
        records: records.len(),
        participants: uuids.len(),
        urns: written,
        path,
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}

/// Convert traced data to column views and write every analysis report.
pub fn run_analysis(
    records: &[TracedRecord],
    analysis: &AnalysisConfiguration,
    export_dir: &Path,
) -> anyhow::Result<()> {
    let (messages, participants) =
        build_column_views(records, analysis).context("converting traced data to column views")?;
    run_automated_analysis(&messages, &participants, analysis, export_dir)
        .with_context(|| format!("running automated analysis into {}", export_dir.display()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use engage_core::{
        Code, CodeScheme, CodeType, CodingConfiguration, DatasetConfiguration, DatasetType, Label,
        UuidTableConfiguration,
    };
    use engage_sync::FileUuidTable;
    use serde_json::Value;

    use super::*;

    fn config() -> PipelineConfiguration {
        let scheme = CodeScheme::new(
            "Scheme-s01e01",
            "s01e01",
            vec![
                Code::new("code-water", CodeType::Normal, "water"),
                Code::new("code-greeting", CodeType::Meta, "greeting"),
                Code::new("code-NC", CodeType::Control, "NC"),
            ],
        );
        PipelineConfiguration {
            pipeline_name: "weekly-survey".to_string(),
            uuid_table: UuidTableConfiguration::File {
                path: PathBuf::from("unused.json"),
            },
            analysis: AnalysisConfiguration {
                dataset_configurations: vec![DatasetConfiguration {
                    raw_dataset: "s01e01_raw".to_string(),
                    dataset_type: DatasetType::ResearchQuestionAnswer,
                    coding_configs: vec![CodingConfiguration {
                        analysis_dataset: "s01e01".to_string(),
                        code_scheme: scheme,
                        kenya_analysis_location: None,
                    }],
                }],
            },
        }
    }

    fn record(uuid: &str, withdrawn: bool, code_id: &str) -> TracedRecord {
        TracedRecord::new(uuid, withdrawn)
            .with_field("s01e01_raw", Value::String(format!("message from {uuid}")))
            .with_labels("s01e01", &[Label::new("Scheme-s01e01", code_id)])
    }

    fn records() -> Vec<TracedRecord> {
        vec![
            record("u1", false, "code-greeting"),
            record("u2", true, "code-water"),
            record("u3", false, "code-water"),
            record("u4", false, "code-NC"),
        ]
    }

    fn lookup() -> FileUuidTable {
        FileUuidTable::from_mappings(HashMap::from([
            ("u1".to_string(), "tel:+254700000001".to_string()),
            ("u2".to_string(), "tel:+254700000002".to_string()),
            ("u3".to_string(), "telegram:3".to_string()),
            ("u4".to_string(), "telegram:4".to_string()),
        ]))
    }

    #[tokio::test]
    async fn opt_out_export_writes_withdrawn_contacts() {
        let dir = tempfile::tempdir().unwrap();
        let stats = run_opt_out_export(&records(), &config(), &lookup(), dir.path())
            .await
            .unwrap();

        assert_eq!(stats.records, 4);
        assert_eq!(stats.participants, 1);
        assert_eq!(stats.urns, 1);
        assert!(stats.path.ends_with("weekly-survey_opt_out_contacts.csv"));
        assert_eq!(
            fs::read_to_string(&stats.path).unwrap(),
            "URN:tel\n+254700000002\n"
        );
    }

    #[tokio::test]
    async fn non_relevant_export_writes_consenting_non_relevant_contacts() {
        let dir = tempfile::tempdir().unwrap();
        let stats = run_non_relevant_export(
            &records(),
            &config(),
            "s01e01_raw",
            &lookup(),
            dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(stats.participants, 2);
        assert!(stats.path.ends_with("s01e01_raw_nc_contacts.csv"));
        assert_eq!(
            fs::read_to_string(&stats.path).unwrap(),
            "URN:tel,URN:telegram\n+254700000001,\n,4\n"
        );
    }

    #[tokio::test]
    async fn unknown_target_dataset_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let stats = run_non_relevant_export(&records(), &config(), "nope", &lookup(), dir.path())
            .await
            .unwrap();

        assert_eq!(stats.urns, 0);
        assert_eq!(fs::read_to_string(&stats.path).unwrap(), "\n");
    }

    #[tokio::test]
    async fn missing_output_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(
            run_opt_out_export(&records(), &config(), &lookup(), &missing)
                .await
                .is_err()
        );
    }

    #[test]
    fn analysis_writes_reports() {
        let dir = tempfile::tempdir().unwrap();
        run_analysis(&records(), &config().analysis, dir.path()).unwrap();

        let counts = fs::read_to_string(dir.path().join("engagement_counts.csv")).unwrap();
        assert!(counts.contains("s01e01,4,3,3,1,4,3,1"));
        assert!(dir.path().join("sample_messages.csv").is_file());
    }
}
