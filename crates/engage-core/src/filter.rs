//! Consent and relevance policies, and the identifier collector built on them.

use std::collections::BTreeSet;

use tracing::warn;

use crate::codes::NON_RELEVANT_CODES;
use crate::config::{AnalysisConfiguration, ColumnConfiguration};
use crate::error::LabelError;
use crate::record::TracedRecord;
use crate::scheme::CodeType;

/// Decides whether a record's participant belongs in an export.
pub trait RecordPolicy {
    fn includes(&self, record: &TracedRecord) -> Result<bool, LabelError>;
}

/// Participants who withdrew consent.
#[derive(Debug, Default, Clone, Copy)]
pub struct OptOutPolicy;

impl RecordPolicy for OptOutPolicy {
    fn includes(&self, record: &TracedRecord) -> Result<bool, LabelError> {
        Ok(record.is_consent_withdrawn())
    }
}

/// Consenting participants whose messages in one raw dataset carried only
/// non-substantive codes (greetings, questions back, not coded, ...).
#[derive(Debug, Clone)]
pub struct NonRelevantPolicy {
    target_raw_dataset: String,
    columns: Vec<ColumnConfiguration>,
}

impl NonRelevantPolicy {
    /// An unknown `target_raw_dataset` is not an error: the policy simply
    /// matches nothing.
    pub fn new(analysis: &AnalysisConfiguration, target_raw_dataset: &str) -> Self {
        let columns = analysis.column_configs_for_raw_dataset(target_raw_dataset);
        if columns.is_empty() {
            warn!(
                target_raw_dataset,
                "no analysis dataset configured for target raw dataset; nothing will match"
            );
        }
        Self {
            target_raw_dataset: target_raw_dataset.to_string(),
            columns,
        }
    }

    pub fn target_raw_dataset(&self) -> &str {
        &self.target_raw_dataset
    }
}

impl RecordPolicy for NonRelevantPolicy {
    fn includes(&self, record: &TracedRecord) -> Result<bool, LabelError> {
        if record.is_consent_withdrawn() {
            return Ok(false);
        }
        for column in &self.columns {
            if is_relevant(record, column)? {
                continue;
            }
            let codes = record.codes(&column.coded_field, &column.code_scheme)?;
            if codes
                .iter()
                .any(|c| NON_RELEVANT_CODES.contains(&c.string_value.as_str()))
            {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// A record is relevant to a column when consent stands and at least one of
/// its codes there is a `Normal` (substantive) code.
pub fn is_relevant(record: &TracedRecord, column: &ColumnConfiguration) -> Result<bool, LabelError> {
    if record.is_consent_withdrawn() {
        return Ok(false);
    }
    Ok(record
        .codes(&column.coded_field, &column.code_scheme)?
        .iter()
        .any(|c| c.code_type == CodeType::Normal))
}

/// Distinct participant uuids of the records `policy` includes.
pub fn collect_identifiers<'r, P>(
    records: impl IntoIterator<Item = &'r TracedRecord>,
    policy: &P,
) -> Result<BTreeSet<String>, LabelError>
where
    P: RecordPolicy + ?Sized,
{
    let mut uuids = BTreeSet::new();
    for record in records {
        if policy.includes(record)? {
            uuids.insert(record.require_participant_uuid()?.to_string());
        }
    }
    Ok(uuids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CodingConfiguration, DatasetConfiguration, DatasetType};
    use crate::record::Label;
    use crate::scheme::{Code, CodeScheme};

    fn analysis() -> AnalysisConfiguration {
        let scheme = CodeScheme::new(
            "Scheme-d1",
            "d1",
            vec![
                Code::new("code-water", CodeType::Normal, "water"),
                Code::new("code-greeting", CodeType::Meta, "greeting"),
                Code::new("code-question", CodeType::Meta, "question"),
                Code::new("code-NC", CodeType::Control, "NC"),
                Code::new("code-STOP", CodeType::Control, "STOP"),
            ],
        );
        AnalysisConfiguration {
            dataset_configurations: vec![DatasetConfiguration {
                raw_dataset: "d1".into(),
                dataset_type: DatasetType::ResearchQuestionAnswer,
                coding_configs: vec![CodingConfiguration {
                    analysis_dataset: "d1".into(),
                    code_scheme: scheme,
                    kenya_analysis_location: None,
                }],
            }],
        }
    }

    fn record(uuid: &str, withdrawn: bool, code_ids: &[&str]) -> TracedRecord {
        let labels: Vec<Label> = code_ids.iter().map(|id| Label::new("Scheme-d1", id)).collect();
        TracedRecord::new(uuid, withdrawn).with_labels("d1", &labels)
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn opt_out_and_non_relevant_scenario() {
        let records = vec![
            record("u1", false, &["code-greeting"]),
            record("u2", true, &[]),
        ];
        let non_relevant = NonRelevantPolicy::new(&analysis(), "d1");
        assert_eq!(collect_identifiers(&records, &non_relevant).unwrap(), set(&["u1"]));
        assert_eq!(collect_identifiers(&records, &OptOutPolicy).unwrap(), set(&["u2"]));
    }

    #[test]
    fn opt_out_collects_exactly_withdrawn_participants() {
        let records = vec![
            record("u1", true, &[]),
            record("u1", true, &["code-water"]),
            record("u2", false, &[]),
            record("u3", true, &["code-greeting"]),
        ];
        assert_eq!(
            collect_identifiers(&records, &OptOutPolicy).unwrap(),
            set(&["u1", "u3"])
        );
    }

    #[test]
    fn withdrawn_consent_takes_precedence_over_labels() {
        let policy = NonRelevantPolicy::new(&analysis(), "d1");
        for codes in [
            &["code-greeting"][..],
            &["code-NC"][..],
            &["code-question", "code-NC"][..],
        ] {
            assert!(!policy.includes(&record("u1", true, codes)).unwrap());
        }
    }

    #[test]
    fn every_non_relevant_code_qualifies() {
        let policy = NonRelevantPolicy::new(&analysis(), "d1");
        assert!(policy.includes(&record("u1", false, &["code-greeting"])).unwrap());
        assert!(policy.includes(&record("u1", false, &["code-question"])).unwrap());
        assert!(policy.includes(&record("u1", false, &["code-NC"])).unwrap());
    }

    #[test]
    fn relevant_or_unlisted_codes_do_not_qualify() {
        let policy = NonRelevantPolicy::new(&analysis(), "d1");
        assert!(!policy.includes(&record("u1", false, &["code-water"])).unwrap());
        assert!(!policy.includes(&record("u1", false, &["code-STOP"])).unwrap());
        assert!(!policy.includes(&record("u1", false, &[])).unwrap());
        // A substantive answer makes the message relevant even alongside a greeting.
        assert!(
            !policy
                .includes(&record("u1", false, &["code-greeting", "code-water"]))
                .unwrap()
        );
    }

    #[test]
    fn unknown_target_dataset_matches_nothing() {
        let policy = NonRelevantPolicy::new(&analysis(), "not-configured");
        let records = vec![record("u1", false, &["code-greeting"])];
        assert!(collect_identifiers(&records, &policy).unwrap().is_empty());
    }

    #[test]
    fn collector_deduplicates_and_ignores_order() {
        let mut records = vec![
            record("u1", false, &["code-greeting"]),
            record("u2", false, &["code-NC"]),
            record("u1", false, &["code-question"]),
            record("u3", false, &["code-water"]),
        ];
        let policy = NonRelevantPolicy::new(&analysis(), "d1");
        let forward = collect_identifiers(&records, &policy).unwrap();
        records.reverse();
        let backward = collect_identifiers(&records, &policy).unwrap();
        assert_eq!(forward, set(&["u1", "u2"]));
        assert_eq!(forward, backward);
    }

    #[test]
    fn included_record_without_uuid_is_an_error() {
        let records = vec![TracedRecord {
            consent_withdrawn: "true".into(),
            ..Default::default()
        }];
        assert!(matches!(
            collect_identifiers(&records, &OptOutPolicy),
            Err(LabelError::MissingField(_))
        ));
    }

    #[test]
    fn unknown_code_id_fails_the_filter() {
        let policy = NonRelevantPolicy::new(&analysis(), "d1");
        assert!(matches!(
            policy.includes(&record("u1", false, &["code-unknown"])),
            Err(LabelError::UnknownCode { .. })
        ));
    }
}
