//! Compression of alignment columns into site patterns.

use crate::alignment::{Alignment, AlignmentError, DataType};
use crate::model::{LabelIndex, LeafLabelMap};
use std::collections::{BTreeSet, HashMap};
use std::ops::Range;
use tracing::debug;

/// The unique columns (patterns) of an [Alignment].
///
/// Each site maps to a pattern index; each pattern has a weight, the number
/// of sites sharing it. Sites in the exclusion range (ascertainment sites)
/// never share a pattern with included sites, so that the set of excluded
/// pattern indices identifies exactly the excluded sites.
///
/// # Example
/// ```
/// use stochmap::alignment::{Alignment, DataType, SitePatterns};
///
/// let alignment = Alignment::from_sequences(
///     DataType::Binary,
///     [("kiwi", "0101"), ("moa", "0110")],
/// ).unwrap();
/// let patterns = SitePatterns::with_exclusion(&alignment, Some(0..1)).unwrap();
///
/// assert_eq!(patterns.pattern_count(), 4);
/// assert!(patterns.is_site_excluded(0));
/// assert_eq!(patterns.included_site_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct SitePatterns {
    data_type: DataType,
    taxa: LeafLabelMap,
    site_to_pattern: Vec<usize>,
    weights: Vec<usize>,
    /// Per taxon, the state code for each pattern
    taxon_states: Vec<Vec<usize>>,
    excluded_sites: Range<usize>,
    excluded_patterns: BTreeSet<usize>,
}

impl SitePatterns {
    /// Compresses all columns of `alignment`, excluding none.
    pub fn new(alignment: &Alignment) -> Self {
        let site_count = alignment.site_count();
        Self::compress(alignment, site_count..site_count)
    }

    /// Compresses the columns of `alignment`, marking the sites in `exclusion` as excluded.
    ///
    /// # Errors
    /// [AlignmentError::InvalidExclusion] if the range is reversed or exceeds the site count.
    pub fn with_exclusion(alignment: &Alignment, exclusion: Option<Range<usize>>) -> Result<Self, AlignmentError> {
        let site_count = alignment.site_count();
        let exclusion = exclusion.unwrap_or(site_count..site_count);
        if exclusion.start > exclusion.end || exclusion.end > site_count {
            return Err(AlignmentError::InvalidExclusion {
                from: exclusion.start,
                to: exclusion.end,
                site_count,
            });
        }
        Ok(Self::compress(alignment, exclusion))
    }

    fn compress(alignment: &Alignment, excluded_sites: Range<usize>) -> Self {
        let site_count = alignment.site_count();
        let mut lookup: HashMap<(bool, Vec<usize>), usize> = HashMap::new();
        let mut columns: Vec<Vec<usize>> = Vec::new();
        let mut weights = Vec::new();
        let mut site_to_pattern = Vec::with_capacity(site_count);
        let mut excluded_patterns = BTreeSet::new();

        for site in 0..site_count {
            let excluded = excluded_sites.contains(&site);
            let column = alignment.column(site);
            let pattern = *lookup.entry((excluded, column.clone())).or_insert_with(|| {
                columns.push(column);
                weights.push(0);
                columns.len() - 1
            });
            weights[pattern] += 1;
            if excluded {
                excluded_patterns.insert(pattern);
            }
            site_to_pattern.push(pattern);
        }

        let taxon_states = (0..alignment.taxon_count())
            .map(|taxon| columns.iter().map(|column| column[taxon]).collect())
            .collect();

        debug!(
            sites = site_count,
            patterns = columns.len(),
            excluded = excluded_patterns.len(),
            "compressed alignment into site patterns"
        );

        Self {
            data_type: alignment.data_type().clone(),
            taxa: alignment.taxa().clone(),
            site_to_pattern,
            weights,
            taxon_states,
            excluded_sites,
            excluded_patterns,
        }
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn taxa(&self) -> &LeafLabelMap {
        &self.taxa
    }

    pub fn state_count(&self) -> usize {
        self.data_type.state_count()
    }

    /// Number of (uncompressed) sites.
    pub fn site_count(&self) -> usize {
        self.site_to_pattern.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.weights.len()
    }

    /// Pattern index of `site`.
    pub fn pattern_index(&self, site: usize) -> usize {
        self.site_to_pattern[site]
    }

    /// Number of sites per pattern.
    pub fn weights(&self) -> &[usize] {
        &self.weights
    }

    /// State codes of `taxon`, one per pattern.
    pub fn taxon_states(&self, taxon: LabelIndex) -> &[usize] {
        &self.taxon_states[taxon]
    }

    /// Indices of patterns made up of excluded sites.
    pub fn excluded_patterns(&self) -> &BTreeSet<usize> {
        &self.excluded_patterns
    }

    pub fn is_pattern_excluded(&self, pattern: usize) -> bool {
        self.excluded_patterns.contains(&pattern)
    }

    pub fn is_site_excluded(&self, site: usize) -> bool {
        self.is_pattern_excluded(self.pattern_index(site))
    }

    /// Number of sites that are not excluded.
    pub fn included_site_count(&self) -> usize {
        self.site_count() - self.excluded_sites.len()
    }

    /// Indices of the sites that are not excluded, in site order.
    pub fn included_sites(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.site_count()).filter(|&site| !self.is_site_excluded(site))
    }
}
