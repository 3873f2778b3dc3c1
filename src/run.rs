//! Draws a series of stochastic mappings as configured by a [RunConfig].

use crate::alignment::{Alignment, SitePatterns, fasta};
use crate::ancestry::AncestralSampler;
use crate::config::{ConfigError, RunConfig};
use crate::error::Result;
use crate::likelihood::PruningLikelihood;
use crate::logger::AncestralStatesLogger;
use crate::model::{LeafLabelMap, Tree};
use crate::newick;
use crate::parser::ParsingError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::io::Write;
use tracing::info;

/// Outcome of [run].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Seed the random generator was started with.
    pub seed: u64,
    /// Number of rows written.
    pub samples: u64,
}

/// Reads tree and alignment, then writes header and `config.samples` rows to `out`.
///
/// Without a configured seed, one is drawn and reported in the summary.
pub fn run<W: Write>(config: &RunConfig, out: &mut W) -> Result<RunSummary> {
    let data_type = config.data_type()?;
    let alignment = load_alignment(config)?;
    let (tree, labels) = load_tree(config, alignment.taxa())?;
    let patterns = SitePatterns::with_exclusion(&alignment, config.exclusion(alignment.site_count()))?;

    let mut engine = PruningLikelihood::new(
        &tree,
        &labels,
        &patterns,
        config.substitution_model(patterns.state_count())?,
        config.site_model()?,
        config.engine_settings(),
    )?;

    let seed = config.seed.unwrap_or_else(|| rand::rng().random());
    info!(seed, samples = config.samples, "starting stochastic mapping");
    let sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(seed));
    let mut logger =
        AncestralStatesLogger::new(config.logger_settings(), alignment.taxa(), &patterns, data_type, sampler)?;

    logger.write_header(out)?;
    for sample_nr in 0..config.samples {
        logger.log(sample_nr, &tree, &labels, &mut engine, out)?;
    }
    logger.close(out)?;

    Ok(RunSummary {
        seed,
        samples: config.samples,
    })
}

fn load_alignment(config: &RunConfig) -> Result<Alignment> {
    let data_type = config.data_type()?;
    match (&config.alignment.file, &config.alignment.sequences) {
        (Some(file), _) => Ok(fasta::parse_file(config.resolve(file), data_type)?),
        (None, Some(sequences)) => Ok(Alignment::from_sequences(data_type, sequences)?),
        (None, None) => Err(ConfigError::Invalid("no alignment given".to_string()).into()),
    }
}

/// Parses the tree, sharing label indices with the alignment taxa.
fn load_tree(config: &RunConfig, taxa: &LeafLabelMap) -> Result<(Tree, LeafLabelMap)> {
    let newick_string = match (&config.tree.newick, &config.tree.file) {
        (Some(newick), _) => newick.clone(),
        (None, Some(file)) => std::fs::read_to_string(config.resolve(file)).map_err(ParsingError::from)?,
        (None, None) => return Err(ConfigError::Invalid("no tree given".to_string()).into()),
    };
    let (tree, labels) = newick::parse_str_with_taxa(newick_string, taxa.clone())?;
    info!(leaves = tree.num_leaves(), vertices = tree.num_vertices(), "read tree");
    Ok((tree, labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_inline_config() {
        let config = RunConfig::from_toml(
            r#"
            seed = 3
            samples = 4

            [tree]
            newick = "((A:0.1,B:0.1)AB:0.2,C:0.3);"

            [alignment]
            data_type = "nucleotide"
            [alignment.sequences]
            A = "ACGTN"
            B = "ACGTA"
            C = "ACTTA"

            [[clade]]
            name = "ab"
            taxa = ["A", "B"]
            "#,
        )
        .unwrap();

        let mut out = Vec::new();
        let summary = run(&config, &mut out).unwrap();
        assert_eq!(summary, RunSummary { seed: 3, samples: 4 });

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "Sample\tab:site0\tab:site1\tab:site2\tab:site3\tab:site4\t");
        assert!(lines[1].starts_with("0\t"));
        assert_eq!(lines[1].split('\t').count(), 7);
    }
}
