//! Traced records: one participant's data for one conversation turn.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codes;
use crate::error::LabelError;
use crate::scheme::{Code, CodeScheme};

/// A coded label applied to a message under a code scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Label {
    #[serde(rename = "SchemeID", default, skip_serializing_if = "Option::is_none")]
    pub scheme_id: Option<String>,
    #[serde(rename = "CodeID")]
    pub code_id: String,
    #[serde(rename = "DateTimeUTC", default, skip_serializing_if = "Option::is_none")]
    pub date_time_utc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

impl Label {
    pub fn new(scheme_id: &str, code_id: &str) -> Self {
        Self {
            scheme_id: Some(scheme_id.to_string()),
            code_id: code_id.to_string(),
            date_time_utc: None,
            checked: Some(true),
        }
    }
}

/// Key under which labels for `analysis_dataset` are stored.
pub fn labels_key(analysis_dataset: &str) -> String {
    format!("{analysis_dataset}_labels")
}

/// One line of traced data.
///
/// The consent flag and participant id are typed; raw message text and label
/// fields vary per pipeline and stay in `fields`. Every record must carry the
/// consent flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TracedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_uuid: Option<String>,
    pub consent_withdrawn: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TracedRecord {
    pub fn new(participant_uuid: &str, consent_withdrawn: bool) -> Self {
        let flag = if consent_withdrawn {
            codes::TRUE
        } else {
            codes::FALSE
        };
        Self {
            participant_uuid: Some(participant_uuid.to_string()),
            consent_withdrawn: flag.to_string(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Attach labels for an analysis dataset.
    pub fn with_labels(self, analysis_dataset: &str, labels: &[Label]) -> Self {
        let value = serde_json::to_value(labels).unwrap_or(Value::Null);
        self.with_field(&labels_key(analysis_dataset), value)
    }

    pub fn is_consent_withdrawn(&self) -> bool {
        self.consent_withdrawn == codes::TRUE
    }

    pub fn require_participant_uuid(&self) -> Result<&str, LabelError> {
        self.participant_uuid
            .as_deref()
            .ok_or_else(|| LabelError::MissingField(codes::PARTICIPANT_UUID_KEY.to_string()))
    }

    /// Raw text stored under `raw_field`, if it is a non-empty string.
    pub fn raw_text(&self, raw_field: &str) -> Option<&str> {
        self.fields
            .get(raw_field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Labels stored under `coded_field`.
    ///
    /// Single-coded fields hold one label object, multi-coded fields a list.
    pub fn labels(&self, coded_field: &str) -> Result<Vec<Label>, LabelError> {
        let malformed = |source| LabelError::Malformed {
            field: coded_field.to_string(),
            source,
        };
        match self.fields.get(coded_field) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value @ Value::Array(_)) => serde_json::from_value(value.clone()).map_err(malformed),
            Some(value) => serde_json::from_value(value.clone())
                .map(|label| vec![label])
                .map_err(malformed),
        }
    }

    pub fn labels_for(&self, analysis_dataset: &str) -> Result<Vec<Label>, LabelError> {
        self.labels(&labels_key(analysis_dataset))
    }

    /// Resolve the labels under `coded_field` to codes of `scheme`.
    pub fn codes<'s>(
        &self,
        coded_field: &str,
        scheme: &'s CodeScheme,
    ) -> Result<Vec<&'s Code>, LabelError> {
        self.labels(coded_field)?
            .iter()
            .map(|label| scheme.get_code_with_code_id(&label.code_id))
            .collect()
    }
}
