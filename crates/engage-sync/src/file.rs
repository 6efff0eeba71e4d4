//! Uuid table kept as a JSON object on local disk.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::{ResolutionError, UuidLookup};

/// `{"<uuid>": "<urn>", ...}` read once at construction.
pub struct FileUuidTable {
    mappings: HashMap<String, String>,
}

impl FileUuidTable {
    pub fn open(path: &Path) -> Result<Self, ResolutionError> {
        let text = std::fs::read_to_string(path).map_err(|source| ResolutionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mappings: HashMap<String, String> = serde_json::from_str(&text)?;
        info!(path = %path.display(), count = mappings.len(), "opened uuid table file");
        Ok(Self { mappings })
    }

    pub fn from_mappings(mappings: HashMap<String, String>) -> Self {
        Self { mappings }
    }
}

#[async_trait]
impl UuidLookup for FileUuidTable {
    async fn uuid_to_data_batch(
        &self,
        uuids: &BTreeSet<String>,
    ) -> Result<HashMap<String, String>, ResolutionError> {
        Ok(uuids
            .iter()
            .filter_map(|uuid| {
                self.mappings
                    .get(uuid)
                    .map(|urn| (uuid.clone(), urn.clone()))
            })
            .collect())
    }
}
