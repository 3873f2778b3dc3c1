//! Tab-separated log of ancestral states sampled at clade MRCAs.
//!
//! The log has a `Sample` column followed by one column per (clade,
//! non-excluded site), labelled `clade:site`. Each call of
//! [AncestralStatesLogger::log] recomputes the likelihood, starts a fresh
//! sampling pass and writes one row.

mod format;
mod headers;

pub use format::{DELIMITER, write_states};
pub use headers::{DEFAULT_SITE_LABEL, site_headers};

use crate::alignment::{DataType, SitePatterns};
use crate::ancestry::{AncestralSampler, SamplingError, clade_leaves};
use crate::likelihood::{LikelihoodEngine, LikelihoodError};
use crate::model::{LeafLabelMap, TaxonSet, TaxonSetError, Tree};
use rand::Rng;
use std::io::{self, Write};
use thiserror::Error;
use tracing::{debug, info};

/// Configuration errors detected when the logger is set up.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error(transparent)]
    Clade(#[from] TaxonSetError),
    #[error("Could not match {labels} site labels to {sites} non-excluded sites")]
    HeaderMismatch { labels: usize, sites: usize },
}

/// Errors while writing a log row.
#[derive(Debug, Error)]
pub enum LogError {
    #[error(transparent)]
    Likelihood(#[from] LikelihoodError),
    #[error(transparent)]
    Sampling(#[from] SamplingError),
    #[error("Failed to write log: {0}")]
    Io(#[from] io::Error),
}

/// What to log.
///
/// # Configuration
/// * `with_clade(set)` - adds a clade whose MRCA states are logged
/// * `with_value(labels)` - site labels, see [site_headers]
/// * `with_log_parent(flag)` - log the parent of each MRCA instead
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoggerSettings {
    pub clades: Vec<TaxonSet>,
    pub value: String,
    pub log_parent: bool,
}

impl LoggerSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clade(mut self, clade: TaxonSet) -> Self {
        self.clades.push(clade);
        self
    }

    pub fn with_value<S: Into<String>>(mut self, value: S) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_log_parent(mut self, log_parent: bool) -> Self {
        self.log_parent = log_parent;
        self
    }
}

/// Logs states sampled at the MRCA (or its parent) of each configured clade.
pub struct AncestralStatesLogger<R> {
    settings: LoggerSettings,
    headers: Vec<String>,
    included_sites: Vec<usize>,
    data_type: DataType,
    sampler: AncestralSampler<R>,
}

impl<R: Rng> AncestralStatesLogger<R> {
    /// Validates the clades against `taxa` and derives the site labels.
    ///
    /// # Errors
    /// [SetupError] for an empty, unknown or repeated clade taxon, a clade
    /// spanning all taxa while logging parents, or site labels that do not
    /// match the non-excluded sites of `patterns`.
    pub fn new(
        settings: LoggerSettings,
        taxa: &LeafLabelMap,
        patterns: &SitePatterns,
        data_type: DataType,
        sampler: AncestralSampler<R>,
    ) -> Result<Self, SetupError> {
        for clade in &settings.clades {
            clade.validate(taxa, settings.log_parent)?;
        }
        let headers = site_headers(&settings.value, patterns)?;
        let included_sites: Vec<usize> = patterns.included_sites().collect();
        info!(
            clades = settings.clades.len(),
            sites = included_sites.len(),
            log_parent = settings.log_parent,
            "set up ancestral states logger"
        );
        Ok(Self {
            settings,
            headers,
            included_sites,
            data_type,
            sampler,
        })
    }

    /// Site labels, one per non-excluded site.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn sampler(&self) -> &AncestralSampler<R> {
        &self.sampler
    }

    /// Writes the header line.
    pub fn write_header<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut line = format!("Sample{DELIMITER}");
        for clade in &self.settings.clades {
            for header in &self.headers {
                line.push_str(&clade.name);
                line.push(':');
                line.push_str(header);
                line.push(DELIMITER);
            }
        }
        line.push('\n');
        out.write_all(line.as_bytes())
    }

    /// Samples every clade and writes the row of `sample_nr`.
    ///
    /// `labels` resolves the leaf labels of `tree`.
    pub fn log<E, W>(
        &mut self,
        sample_nr: u64,
        tree: &Tree,
        labels: &LeafLabelMap,
        engine: &mut E,
        out: &mut W,
    ) -> Result<(), LogError>
    where
        E: LikelihoodEngine + ?Sized,
        W: Write,
    {
        let log_likelihood = engine.recompute_all()?;
        self.sampler.begin_pass();

        let mut line = format!("{sample_nr}{DELIMITER}");
        for clade in &self.settings.clades {
            let leaves = clade_leaves(tree, labels, clade);
            let states = self
                .sampler
                .sample_clade_states(tree, &*engine, &leaves, self.settings.log_parent)?;
            let written = write_states(&states, &self.included_sites, &self.data_type, &mut line);
            assert_eq!(
                written,
                self.headers.len(),
                "row of clade {} does not match its header",
                clade.name
            );
        }
        line.push('\n');
        out.write_all(line.as_bytes())?;
        debug!(sample_nr, log_likelihood, "logged ancestral states");
        Ok(())
    }

    /// Flushes `out`.
    pub fn close<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        out.flush()
    }
}
