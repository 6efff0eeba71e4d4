//! Code schemes: the closed vocabularies that coded labels refer to.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, LabelError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeType {
    /// A substantive answer to the question asked.
    Normal,
    /// Coder bookkeeping: not coded, stop, not reviewed, ...
    Control,
    /// Describes the message rather than answering (greetings, questions back).
    Meta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Code {
    #[serde(rename = "CodeID")]
    pub code_id: String,
    pub code_type: CodeType,
    pub string_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_code: Option<String>,
}

impl Code {
    pub fn new(code_id: &str, code_type: CodeType, string_value: &str) -> Self {
        Self {
            code_id: code_id.to_string(),
            code_type,
            string_value: string_value.to_string(),
            display_text: None,
            numeric_value: None,
            control_code: None,
        }
    }
}

/// A versioned list of codes, addressed by code id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeScheme {
    #[serde(rename = "SchemeID")]
    pub scheme_id: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub codes: Vec<Code>,
}

impl CodeScheme {
    pub fn new(scheme_id: &str, name: &str, codes: Vec<Code>) -> Self {
        Self {
            scheme_id: scheme_id.to_string(),
            name: name.to_string(),
            version: String::new(),
            codes,
        }
    }

    /// Read a code scheme from its JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Scheme {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn get_code_with_code_id(&self, code_id: &str) -> Result<&Code, LabelError> {
        self.codes
            .iter()
            .find(|c| c.code_id == code_id)
            .ok_or_else(|| LabelError::UnknownCode {
                scheme_id: self.scheme_id.clone(),
                code_id: code_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEME_JSON: &str = r#"{
        "SchemeID": "Scheme-s01e01",
        "Name": "s01e01",
        "Version": "0.0.1",
        "Codes": [
            {"CodeID": "code-water", "CodeType": "Normal", "StringValue": "water", "DisplayText": "Water", "NumericValue": 1},
            {"CodeID": "code-greeting", "CodeType": "Meta", "StringValue": "greeting"},
            {"CodeID": "code-NC", "CodeType": "Control", "ControlCode": "NC", "StringValue": "NC"}
        ]
    }"#;

    #[test]
    fn parses_scheme_json() {
        let scheme: CodeScheme = serde_json::from_str(SCHEME_JSON).unwrap();
        assert_eq!(scheme.scheme_id, "Scheme-s01e01");
        assert_eq!(scheme.codes.len(), 3);
        assert_eq!(scheme.codes[0].numeric_value, Some(1));
        assert_eq!(scheme.codes[2].control_code.as_deref(), Some("NC"));
    }

    #[test]
    fn looks_up_code_by_id() {
        let scheme: CodeScheme = serde_json::from_str(SCHEME_JSON).unwrap();
        let code = scheme.get_code_with_code_id("code-greeting").unwrap();
        assert_eq!(code.string_value, "greeting");
        assert_eq!(code.code_type, CodeType::Meta);
    }

    #[test]
    fn unknown_code_id_is_an_error() {
        let scheme: CodeScheme = serde_json::from_str(SCHEME_JSON).unwrap();
        let err = scheme.get_code_with_code_id("code-missing").unwrap_err();
        assert!(matches!(err, LabelError::UnknownCode { ref code_id, .. } if code_id == "code-missing"));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = CodeScheme::load(Path::new("/nonexistent/scheme.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
