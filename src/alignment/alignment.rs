use crate::alignment::{AlignmentError, DataType};
use crate::model::{LabelIndex, LeafLabelMap};

/// An alignment: per taxon a sequence of state codes, all of equal length.
///
/// Taxa are kept in a [LeafLabelMap]; the row of a taxon is its [LabelIndex].
///
/// # Example
/// ```
/// use stochmap::alignment::{Alignment, DataType};
///
/// let mut alignment = Alignment::new(DataType::Nucleotide);
/// alignment.add_sequence("kiwi", "ACGT").unwrap();
/// alignment.add_sequence("kea", "ACGA").unwrap();
///
/// assert_eq!(alignment.site_count(), 4);
/// assert_eq!(alignment.state_code(1, 3), 0);
/// ```
#[derive(Debug, Clone)]
pub struct Alignment {
    data_type: DataType,
    taxa: LeafLabelMap,
    sequences: Vec<Vec<usize>>,
}

impl Alignment {
    /// Creates an empty alignment of the given data type.
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            taxa: LeafLabelMap::default(),
            sequences: Vec::new(),
        }
    }

    /// Creates an alignment from `(taxon, sequence)` pairs.
    pub fn from_sequences<L, S>(
        data_type: DataType,
        sequences: impl IntoIterator<Item = (L, S)>,
    ) -> Result<Self, AlignmentError>
    where
        L: AsRef<str>,
        S: AsRef<str>,
    {
        let mut alignment = Self::new(data_type);
        for (taxon, sequence) in sequences {
            alignment.add_sequence(taxon.as_ref(), sequence.as_ref())?;
        }
        if alignment.taxon_count() == 0 {
            return Err(AlignmentError::Empty);
        }
        Ok(alignment)
    }

    /// Encodes and adds the sequence of `taxon`.
    ///
    /// # Errors
    /// [AlignmentError] if the taxon is already present, a symbol is unknown,
    /// or the sequence length differs from the earlier ones.
    pub fn add_sequence(&mut self, taxon: &str, sequence: &str) -> Result<LabelIndex, AlignmentError> {
        if self.taxa.contains_label(taxon) {
            return Err(AlignmentError::DuplicateTaxon(taxon.to_string()));
        }
        let codes = self.data_type.encode(sequence)?;
        if let Some(first) = self.sequences.first() {
            if first.len() != codes.len() {
                return Err(AlignmentError::RaggedSequence {
                    taxon: taxon.to_string(),
                    expected: first.len(),
                    found: codes.len(),
                });
            }
        }
        let index = self.taxa.get_or_insert(taxon);
        self.sequences.push(codes);
        Ok(index)
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// The taxon list, in order of insertion.
    pub fn taxa(&self) -> &LeafLabelMap {
        &self.taxa
    }

    pub fn taxon_count(&self) -> usize {
        self.sequences.len()
    }

    /// Number of sites (columns).
    pub fn site_count(&self) -> usize {
        self.sequences.first().map_or(0, Vec::len)
    }

    /// Encoded sequence of taxon `taxon`.
    pub fn sequence(&self, taxon: LabelIndex) -> &[usize] {
        &self.sequences[taxon]
    }

    /// State code of `taxon` at `site`.
    pub fn state_code(&self, taxon: LabelIndex, site: usize) -> usize {
        self.sequences[taxon][site]
    }

    /// The column at `site`, one code per taxon.
    pub fn column(&self, site: usize) -> Vec<usize> {
        self.sequences.iter().map(|sequence| sequence[site]).collect()
    }
}
