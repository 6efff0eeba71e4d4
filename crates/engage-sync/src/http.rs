//! HTTP client for the uuid table service.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ResolutionError, UuidLookup};

/// Contents of the credentials file passed on the command line.
#[derive(Debug, Deserialize)]
pub struct UuidTableCredentials {
    pub token: String,
}

impl UuidTableCredentials {
    pub fn load(path: &Path) -> Result<Self, ResolutionError> {
        let text = std::fs::read_to_string(path).map_err(|source| ResolutionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Uuid table served over HTTP.
pub struct HttpUuidTable {
    client: reqwest::Client,
    base_url: String,
    table_name: String,
    token: String,
}

#[derive(Serialize)]
struct LookupRequest<'a> {
    uuids: Vec<&'a str>,
}

#[derive(Deserialize)]
struct LookupResponse {
    mappings: HashMap<String, String>,
}

impl HttpUuidTable {
    /// `base_url` should be like `https://uuid-table.example.org` (no trailing slash).
    pub fn new(base_url: &str, table_name: &str, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            table_name: table_name.to_string(),
            token,
        }
    }

    pub fn from_credentials_file(
        base_url: &str,
        table_name: &str,
        credentials_path: &Path,
    ) -> Result<Self, ResolutionError> {
        let credentials = UuidTableCredentials::load(credentials_path)?;
        Ok(Self::new(base_url, table_name, credentials.token))
    }

    fn lookup_url(&self) -> String {
        format!("{}/tables/{}/uuids:lookup", self.base_url, self.table_name)
    }
}

#[async_trait]
impl UuidLookup for HttpUuidTable {
    async fn uuid_to_data_batch(
        &self,
        uuids: &BTreeSet<String>,
    ) -> Result<HashMap<String, String>, ResolutionError> {
        let url = self.lookup_url();
        let body = LookupRequest {
            uuids: uuids.iter().map(String::as_str).collect(),
        };

        info!(url = %url, count = uuids.len(), "looking up uuids");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ResolutionError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let result: LookupResponse = resp.json().await?;
        info!(count = result.mappings.len(), "received uuid mappings");
        Ok(result.mappings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash() {
        let table = HttpUuidTable::new("http://localhost:8080/", "survey-uuids", "t".into());
        assert_eq!(table.base_url, "http://localhost:8080");
        assert_eq!(
            table.lookup_url(),
            "http://localhost:8080/tables/survey-uuids/uuids:lookup"
        );
    }

    #[test]
    fn request_body_lists_uuids() {
        let uuids: BTreeSet<String> = ["u2", "u1"].iter().map(|s| s.to_string()).collect();
        let body = LookupRequest {
            uuids: uuids.iter().map(String::as_str).collect(),
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"uuids":["u1","u2"]}"#);
    }

    #[test]
    fn parses_lookup_response() {
        let json = r#"{"mappings": {"u1": "tel:+1555", "u2": "twitter:abc"}}"#;
        let parsed: LookupResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.mappings.len(), 2);
        assert_eq!(parsed.mappings["u2"], "twitter:abc");
    }

    #[test]
    fn loads_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, r#"{"token": "secret"}"#).unwrap();
        let table = HttpUuidTable::from_credentials_file("http://h", "t", &path).unwrap();
        assert_eq!(table.token, "secret");
    }

    #[test]
    fn missing_credentials_file_is_io_error() {
        let err = UuidTableCredentials::load(Path::new("/nonexistent/creds.json")).unwrap_err();
        assert!(matches!(err, ResolutionError::Io { .. }));
    }

    #[test]
    fn server_errors_are_transient_client_errors_are_not() {
        let unavailable = ResolutionError::Server {
            status: 503,
            body: String::new(),
        };
        let forbidden = ResolutionError::Server {
            status: 403,
            body: String::new(),
        };
        assert!(unavailable.is_transient());
        assert!(!forbidden.is_transient());
        assert!(!ResolutionError::Missing("u1".into()).is_transient());
    }
}
