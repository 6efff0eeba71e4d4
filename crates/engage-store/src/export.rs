//! Contact CSV export in the messaging platform's upload format.
//!
//! One `URN:<namespace>` column per namespace present, one row per URN with
//! only its own namespace column filled.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;

use csv::{Terminator, WriterBuilder};
use engage_core::{split_urn, urn_column};
use tracing::{info, warn};

use crate::StoreError;

pub fn nc_contacts_file_name(target_raw_dataset: &str) -> String {
    format!("{target_raw_dataset}_nc_contacts.csv")
}

pub fn opt_out_contacts_file_name(pipeline_name: &str) -> String {
    format!("{pipeline_name}_opt_out_contacts.csv")
}

/// Write `urns` to `path`, returning the number of data rows written.
///
/// Columns and rows are in lexicographic order. An empty set still produces a
/// file: a header line with no columns.
pub fn export_urns_csv(urns: &BTreeSet<String>, path: &Path) -> Result<usize, StoreError> {
    let parsed = urns
        .iter()
        .map(|urn| split_urn(urn).ok_or_else(|| StoreError::InvalidUrn(urn.clone())))
        .collect::<Result<Vec<_>, _>>()?;

    let namespaces: BTreeSet<&str> = parsed.iter().map(|(namespace, _)| *namespace).collect();
    let headers: Vec<String> = namespaces.iter().map(|ns| urn_column(ns)).collect();
    let columns: BTreeMap<&str, usize> = namespaces
        .iter()
        .enumerate()
        .map(|(i, ns)| (*ns, i))
        .collect();

    warn!(count = urns.len(), path = %path.display(), "exporting urns");
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if headers.is_empty() {
        warn!(path = %path.display(), "no urns to export; writing header-only file with no columns");
        std::fs::write(path, "\n").map_err(io_err)?;
        return Ok(0);
    }

    let file = File::create(path).map_err(io_err)?;
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(file);
    writer.write_record(&headers)?;

    let mut row = vec![""; headers.len()];
    for (namespace, value) in &parsed {
        row.fill("");
        row[columns[*namespace]] = *value;
        writer.write_record(&row)?;
    }
    writer.flush().map_err(io_err)?;

    info!(count = parsed.len(), path = %path.display(), "wrote urns");
    Ok(parsed.len())
}
