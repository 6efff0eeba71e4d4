//! Pipeline configuration, read from a TOML file.
//!
//! Code scheme paths in the file are resolved relative to the file's own
//! directory and loaded eagerly, so a `PipelineConfiguration` is complete
//! once constructed.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;
use crate::record::labels_key;
use crate::scheme::CodeScheme;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Where participant uuids are resolved to contact URNs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UuidTableConfiguration {
    Http {
        base_url: String,
        table_name: String,
        #[serde(default = "default_max_attempts")]
        max_attempts: u32,
    },
    /// A JSON object of uuid to URN on local disk.
    File { path: PathBuf },
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl UuidTableConfiguration {
    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::Http { max_attempts, .. } => (*max_attempts).max(1),
            Self::File { .. } => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetType {
    ResearchQuestionAnswer,
    Demographic,
}

/// Sub-national region kinds that participation maps can be drawn for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisLocation {
    KenyaCounty,
    KenyaConstituency,
}

#[derive(Debug, Clone)]
pub struct CodingConfiguration {
    pub analysis_dataset: String,
    pub code_scheme: CodeScheme,
    pub kenya_analysis_location: Option<AnalysisLocation>,
}

#[derive(Debug, Clone)]
pub struct DatasetConfiguration {
    pub raw_dataset: String,
    pub dataset_type: DatasetType,
    pub coding_configs: Vec<CodingConfiguration>,
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisConfiguration {
    pub dataset_configurations: Vec<DatasetConfiguration>,
}

#[derive(Debug, Clone)]
pub struct PipelineConfiguration {
    pub pipeline_name: String,
    pub uuid_table: UuidTableConfiguration,
    pub analysis: AnalysisConfiguration,
}

/// Column-view description of one coded dataset: where its raw text and
/// labels live on a record and which scheme decodes them.
#[derive(Debug, Clone)]
pub struct ColumnConfiguration {
    pub dataset_name: String,
    pub raw_field: String,
    pub coded_field: String,
    pub code_scheme: CodeScheme,
}

impl ColumnConfiguration {
    pub fn new(dataset: &DatasetConfiguration, coding: &CodingConfiguration) -> Self {
        Self {
            dataset_name: coding.analysis_dataset.clone(),
            raw_field: dataset.raw_dataset.clone(),
            coded_field: labels_key(&coding.analysis_dataset),
            code_scheme: coding.code_scheme.clone(),
        }
    }
}

impl AnalysisConfiguration {
    fn column_configs(&self, dataset_type: DatasetType) -> Vec<ColumnConfiguration> {
        self.dataset_configurations
            .iter()
            .filter(|d| d.dataset_type == dataset_type)
            .flat_map(|d| d.coding_configs.iter().map(move |c| ColumnConfiguration::new(d, c)))
            .collect()
    }

    pub fn rqa_column_configs(&self) -> Vec<ColumnConfiguration> {
        self.column_configs(DatasetType::ResearchQuestionAnswer)
    }

    pub fn demog_column_configs(&self) -> Vec<ColumnConfiguration> {
        self.column_configs(DatasetType::Demographic)
    }

    /// Column configs for every coding config under datasets named `raw_dataset`.
    pub fn column_configs_for_raw_dataset(&self, raw_dataset: &str) -> Vec<ColumnConfiguration> {
        self.dataset_configurations
            .iter()
            .filter(|d| d.raw_dataset == raw_dataset)
            .flat_map(|d| d.coding_configs.iter().map(move |c| ColumnConfiguration::new(d, c)))
            .collect()
    }
}

// ── On-disk shape ──

#[derive(Deserialize)]
struct RawPipelineConfiguration {
    pipeline_name: String,
    uuid_table: UuidTableConfiguration,
    #[serde(default)]
    analysis: RawAnalysisConfiguration,
}

#[derive(Deserialize, Default)]
struct RawAnalysisConfiguration {
    #[serde(default)]
    dataset_configurations: Vec<RawDatasetConfiguration>,
}

#[derive(Deserialize)]
struct RawDatasetConfiguration {
    raw_dataset: String,
    dataset_type: DatasetType,
    #[serde(default)]
    coding_configs: Vec<RawCodingConfiguration>,
}

#[derive(Deserialize)]
struct RawCodingConfiguration {
    analysis_dataset: String,
    code_scheme: PathBuf,
    #[serde(default)]
    kenya_analysis_location: Option<AnalysisLocation>,
}

impl PipelineConfiguration {
    /// Load a configuration file and every code scheme it references.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let config = Self::from_toml_str(&text, base_dir).map_err(|e| match e {
            ConfigError::Toml { source, .. } => ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        info!(
            path = %path.display(),
            pipeline = %config.pipeline_name,
            datasets = config.analysis.dataset_configurations.len(),
            "loaded pipeline configuration"
        );
        Ok(config)
    }

    /// Parse configuration text, resolving relative paths against `base_dir`.
    pub fn from_toml_str(text: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let raw: RawPipelineConfiguration =
            toml::from_str(text).map_err(|source| ConfigError::Toml {
                path: PathBuf::new(),
                source,
            })?;

        let uuid_table = match raw.uuid_table {
            UuidTableConfiguration::File { path } => UuidTableConfiguration::File {
                path: base_dir.join(path),
            },
            http => http,
        };

        let mut dataset_configurations = Vec::with_capacity(raw.analysis.dataset_configurations.len());
        for dataset in raw.analysis.dataset_configurations {
            let mut coding_configs = Vec::with_capacity(dataset.coding_configs.len());
            for coding in dataset.coding_configs {
                coding_configs.push(CodingConfiguration {
                    analysis_dataset: coding.analysis_dataset,
                    code_scheme: CodeScheme::load(&base_dir.join(&coding.code_scheme))?,
                    kenya_analysis_location: coding.kenya_analysis_location,
                });
            }
            dataset_configurations.push(DatasetConfiguration {
                raw_dataset: dataset.raw_dataset,
                dataset_type: dataset.dataset_type,
                coding_configs,
            });
        }

        Ok(Self {
            pipeline_name: raw.pipeline_name,
            uuid_table,
            analysis: AnalysisConfiguration {
                dataset_configurations,
            },
        })
    }
}
