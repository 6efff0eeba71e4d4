pub mod codes;
pub mod config;
pub mod error;
pub mod filter;
pub mod record;
pub mod scheme;
pub mod urn;

pub use config::{
    AnalysisConfiguration, AnalysisLocation, CodingConfiguration, ColumnConfiguration,
    DatasetConfiguration, DatasetType, PipelineConfiguration, UuidTableConfiguration,
};
pub use error::{ConfigError, LabelError};
pub use filter::{NonRelevantPolicy, OptOutPolicy, RecordPolicy, collect_identifiers, is_relevant};
pub use record::{Label, TracedRecord, labels_key};
pub use scheme::{Code, CodeScheme, CodeType};
pub use urn::{split_urn, urn_column};
