use crate::alignment::{SiteState, StateDecoder};

/// Column delimiter of the log.
pub const DELIMITER: char = '\t';

/// Appends the states of `sites` to `out`, each followed by the delimiter,
/// and returns the number of columns written.
///
/// `sites` are the indices of the sites to write, in order; excluded sites
/// are simply not listed.
///
/// # Example
/// ```
/// use stochmap::alignment::DataType;
/// use stochmap::logger::write_states;
///
/// let mut row = String::new();
/// let written = write_states(&[Some(0), None, Some(3)], &[1, 2], &DataType::Nucleotide, &mut row);
/// assert_eq!(written, 2);
/// assert_eq!(row, "?\tT\t");
/// ```
pub fn write_states<D: StateDecoder + ?Sized>(
    states: &[SiteState],
    sites: &[usize],
    decoder: &D,
    out: &mut String,
) -> usize {
    for &site in sites {
        decoder.write_state(states[site], out);
        out.push(DELIMITER);
    }
    sites.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::{DataType, UserDataType};

    #[test]
    fn test_user_codes() {
        let data_type = DataType::User(UserDataType::new(["tui", "kea"]).unwrap());
        let mut row = String::from("7\t");
        write_states(&[Some(1), Some(0), None], &[0, 1, 2], &data_type, &mut row);
        assert_eq!(row, "7\tkea\ttui\t?\t");
    }

    #[test]
    fn test_no_sites() {
        let mut row = String::new();
        assert_eq!(write_states(&[Some(1)], &[], &DataType::Binary, &mut row), 0);
        assert!(row.is_empty());
    }
}
