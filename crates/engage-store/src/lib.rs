//! Storage layer: traced-data JSONL input and contact CSV output.

mod error;
pub use error::StoreError;

pub mod export;
pub mod traced;

pub use export::{export_urns_csv, nc_contacts_file_name, opt_out_contacts_file_name};
pub use traced::{load_traced_data, load_traced_data_file};
