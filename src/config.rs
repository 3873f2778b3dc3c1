//! Run configuration, read from a TOML file.
//!
//! ```toml
//! seed = 42
//! samples = 1000
//! log_parent = false
//! value = "site"
//!
//! [tree]
//! newick = "((A:1,B:1)C:2,((D:1,E:1)F:1,G:2)H:1):1;"
//!
//! [alignment]
//! file = "birds.fasta"
//! data_type = "nucleotide"
//! exclude_from = 0
//! exclude_to = 2
//!
//! [model]
//! frequencies = [0.25, 0.25, 0.25, 0.25]
//! rate = 1.0
//!
//! [[clade]]
//! name = "southern"
//! taxa = ["D", "E", "G"]
//! ```
//!
//! Relative file paths are resolved against the directory of the configuration file.

use crate::alignment::{AlignmentError, DataType};
use crate::likelihood::{Backend, EngineSettings, LikelihoodError, SiteModel, SubstitutionModel};
use crate::logger::LoggerSettings;
use crate::model::TaxonSet;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub(crate) const fn default_samples() -> u64 {
    1
}

pub(crate) const fn default_rate() -> f64 {
    1.0
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("Failed to parse config {path:?}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RunConfig {
    pub tree: TreeConfig,
    pub alignment: AlignmentConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default, rename = "clade")]
    pub clades: Vec<TaxonSet>,
    /// Seed of the random generator; drawn from the OS when absent.
    pub seed: Option<u64>,
    #[serde(default = "default_samples")]
    pub samples: u64,
    #[serde(default)]
    pub log_parent: bool,
    /// Whitespace-separated site labels.
    #[serde(default)]
    pub value: String,
    #[serde(skip)]
    base_dir: PathBuf,
}

/// Tree given inline or as file; exactly one of both.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TreeConfig {
    pub newick: Option<String>,
    pub file: Option<PathBuf>,
}

/// Alignment given as FASTA file or as inline `sequences` table; exactly one of both.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AlignmentConfig {
    pub file: Option<PathBuf>,
    pub sequences: Option<BTreeMap<String, String>>,
    pub data_type: String,
    /// State codes of a `user` data type.
    pub symbols: Option<Vec<String>>,
    pub exclude_from: Option<usize>,
    pub exclude_to: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// Equilibrium frequencies; equal when absent.
    pub frequencies: Option<Vec<f64>>,
    #[serde(default = "default_rate")]
    pub rate: f64,
    /// Rates of among-site rate categories; a single category when absent.
    pub category_rates: Option<Vec<f64>>,
    #[serde(default)]
    pub use_ambiguities: bool,
    #[serde(default)]
    pub backend: Backend,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            frequencies: None,
            rate: default_rate(),
            category_rates: None,
            use_ambiguities: false,
            backend: Backend::default(),
        }
    }
}

impl RunConfig {
    /// Reads and validates the configuration at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: RunConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a configuration; relative paths resolve against the working directory.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match (&self.tree.newick, &self.tree.file) {
            (Some(_), None) | (None, Some(_)) => {}
            _ => return Err(ConfigError::Invalid("[tree] needs exactly one of newick or file".to_string())),
        }
        match (&self.alignment.file, &self.alignment.sequences) {
            (Some(_), None) | (None, Some(_)) => {}
            _ => {
                return Err(ConfigError::Invalid(
                    "[alignment] needs exactly one of file or sequences".to_string(),
                ));
            }
        }
        if self.alignment.exclude_to.is_some() && self.alignment.exclude_from.is_none() {
            return Err(ConfigError::Invalid("exclude_to given without exclude_from".to_string()));
        }
        if self.samples == 0 {
            return Err(ConfigError::Invalid("samples must be positive".to_string()));
        }
        Ok(())
    }

    /// Resolves `path` against the directory of the configuration file.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn data_type(&self) -> Result<DataType, AlignmentError> {
        DataType::from_name(&self.alignment.data_type, self.alignment.symbols.as_deref())
    }

    /// The sites excluded from logging; `exclude_to` defaults to the end of the alignment.
    pub fn exclusion(&self, site_count: usize) -> Option<Range<usize>> {
        self.alignment
            .exclude_from
            .map(|from| from..self.alignment.exclude_to.unwrap_or(site_count))
    }

    pub fn substitution_model(&self, state_count: usize) -> Result<SubstitutionModel, LikelihoodError> {
        match &self.model.frequencies {
            Some(frequencies) => SubstitutionModel::new(frequencies.clone(), self.model.rate),
            None => SubstitutionModel::new(vec![1.0 / state_count as f64; state_count], self.model.rate),
        }
    }

    pub fn site_model(&self) -> Result<SiteModel, LikelihoodError> {
        match &self.model.category_rates {
            Some(rates) => SiteModel::with_rates(rates.clone()),
            None => Ok(SiteModel::single()),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings::new()
            .with_backend(self.model.backend)
            .with_ambiguities(self.model.use_ambiguities)
    }

    pub fn logger_settings(&self) -> LoggerSettings {
        self.clades.iter().cloned().fold(
            LoggerSettings::new()
                .with_value(self.value.clone())
                .with_log_parent(self.log_parent),
            LoggerSettings::with_clade,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        seed = 7
        samples = 25
        log_parent = true
        value = "pos"

        [tree]
        newick = "((A:1,B:1):1,C:2);"

        [alignment]
        data_type = "binary"
        exclude_from = 0
        exclude_to = 1

        [alignment.sequences]
        A = "0101"
        B = "0111"
        C = "1100"

        [model]
        category_rates = [1.0]
        backend = "plain"

        [[clade]]
        name = "ab"
        taxa = ["A", "B"]
    "#;

    #[test]
    fn test_parse_full_config() {
        let config = RunConfig::from_toml(CONFIG).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.samples, 25);
        assert!(config.log_parent);
        assert_eq!(config.clades, vec![TaxonSet::new("ab", ["A", "B"])]);
        assert_eq!(config.alignment.sequences.as_ref().map(|s| s.len()), Some(3));
        assert_eq!(config.exclusion(4), Some(0..1));
        assert_eq!(config.data_type().unwrap(), DataType::Binary);
        assert_eq!(config.engine_settings(), EngineSettings::new());
        assert_eq!(config.site_model().unwrap().category_count(), 1);

        let logger = config.logger_settings();
        assert_eq!(logger.value, "pos");
        assert_eq!(logger.clades.len(), 1);
    }

    #[test]
    fn test_defaults() {
        let config = RunConfig::from_toml(
            r#"
            [tree]
            file = "tree.nwk"
            [alignment]
            file = "data.fasta"
            data_type = "nucleotide"
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, None);
        assert_eq!(config.samples, 1);
        assert!(!config.log_parent);
        assert!(config.clades.is_empty());
        assert_eq!(config.model, ModelConfig::default());
        assert_eq!(config.exclusion(10), None);
        assert_eq!(config.substitution_model(4).unwrap().frequencies(), &[0.25; 4]);
    }

    #[test]
    fn test_accelerated_backend_parses() {
        let config = RunConfig::from_toml(
            r#"
            [tree]
            newick = "(A:1,B:1);"
            [alignment]
            file = "data.fasta"
            data_type = "binary"
            [model]
            backend = "accelerated"
            "#,
        )
        .unwrap();
        assert_eq!(config.engine_settings().backend, Backend::Accelerated);
    }

    #[test]
    fn test_invalid_configs() {
        let both_trees = r#"
            [tree]
            newick = "(A:1,B:1);"
            file = "tree.nwk"
            [alignment]
            file = "data.fasta"
            data_type = "binary"
        "#;
        assert!(matches!(RunConfig::from_toml(both_trees), Err(ConfigError::Invalid(_))));

        let no_alignment_source = r#"
            [tree]
            newick = "(A:1,B:1);"
            [alignment]
            data_type = "binary"
        "#;
        assert!(matches!(RunConfig::from_toml(no_alignment_source), Err(ConfigError::Invalid(_))));

        assert!(matches!(RunConfig::from_toml("seed = \"seven\""), Err(ConfigError::Parse { .. })));
    }
}
