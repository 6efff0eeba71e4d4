//! Sync layer: resolving participant uuids to contact URNs through the uuid table.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use engage_core::UuidTableConfiguration;
use tracing::{info, warn};

mod error;
pub mod file;
#[cfg(feature = "http")]
pub mod http;

pub use error::ResolutionError;
pub use file::FileUuidTable;
#[cfg(feature = "http")]
pub use http::{HttpUuidTable, UuidTableCredentials};

/// Batch lookup from participant uuid to contact URN.
///
/// Implementations return whatever entries they have; completeness is
/// checked by [`resolve_urns`].
#[async_trait]
pub trait UuidLookup: Send + Sync {
    async fn uuid_to_data_batch(
        &self,
        uuids: &BTreeSet<String>,
    ) -> Result<HashMap<String, String>, ResolutionError>;
}

/// How often, and how patiently, to repeat a failed lookup.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before retry `n` is `backoff * n`.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Duration::from_millis(500),
        }
    }
}

/// Build the uuid table client described by the pipeline configuration.
pub fn init_uuid_table_client(
    config: &UuidTableConfiguration,
    credentials_path: &Path,
) -> Result<Box<dyn UuidLookup>, ResolutionError> {
    match config {
        #[cfg(feature = "http")]
        UuidTableConfiguration::Http {
            base_url,
            table_name,
            ..
        } => Ok(Box::new(HttpUuidTable::from_credentials_file(
            base_url,
            table_name,
            credentials_path,
        )?)),
        #[cfg(not(feature = "http"))]
        UuidTableConfiguration::Http { .. } => {
            let _ = credentials_path;
            Err(ResolutionError::Unsupported("http"))
        }
        UuidTableConfiguration::File { path } => Ok(Box::new(FileUuidTable::open(path)?)),
    }
}

/// Resolve every uuid to its URN in one batch lookup.
///
/// Fails with [`ResolutionError::Missing`] if the table has no entry for any
/// requested uuid. Participants sharing a URN collapse to one entry.
pub async fn resolve_urns<L>(
    lookup: &L,
    uuids: &BTreeSet<String>,
    retry: RetryPolicy,
) -> Result<BTreeSet<String>, ResolutionError>
where
    L: UuidLookup + ?Sized,
{
    info!(count = uuids.len(), "converting uuids to urns");
    if uuids.is_empty() {
        return Ok(BTreeSet::new());
    }

    let table = lookup_with_retry(lookup, uuids, retry).await?;
    let urns = uuids
        .iter()
        .map(|uuid| {
            table
                .get(uuid)
                .cloned()
                .ok_or_else(|| ResolutionError::Missing(uuid.clone()))
        })
        .collect::<Result<BTreeSet<_>, _>>()?;

    info!(uuids = uuids.len(), urns = urns.len(), "converted uuids to urns");
    Ok(urns)
}

async fn lookup_with_retry<L>(
    lookup: &L,
    uuids: &BTreeSet<String>,
    retry: RetryPolicy,
) -> Result<HashMap<String, String>, ResolutionError>
where
    L: UuidLookup + ?Sized,
{
    let mut attempt = 1;
    loop {
        match lookup.uuid_to_data_batch(uuids).await {
            Ok(table) => return Ok(table),
            Err(e) if e.is_transient() && attempt < retry.max_attempts => {
                warn!(attempt, max_attempts = retry.max_attempts, error = %e, "uuid lookup failed, retrying");
                tokio::time::sleep(retry.backoff * attempt).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
