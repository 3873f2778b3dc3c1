//! Data types: how observed symbols map to state codes and back.
//!
//! Observed characters are encoded as codes: a code `< state_count` is an
//! unambiguous state, a code `>= state_count` refers to an ambiguity set
//! (e.g. nucleotide `R` = {A, G}, `N`/`-`/`?` = every state).
//! Sampled states are [SiteState]s, rendered back to text by a [StateDecoder].

use crate::alignment::AlignmentError;
use std::fmt;

/// Sampled state of one site; `None` is an unresolved (ambiguous or missing) observation.
pub type SiteState = Option<usize>;

/// Token written for an unresolved [SiteState].
pub const MISSING_TOKEN: &str = "?";

// =#========================================================================#=
// STATE DECODER
// =#========================================================================#=
/// Renders sampled states as text.
pub trait StateDecoder {
    /// Appends the textual form of `state` to `out`.
    fn write_state(&self, state: SiteState, out: &mut String);
}

// =#========================================================================#=
// FIXED ALPHABET
// =#========================================================================#=
/// A built-in alphabet where every state is a single canonical character.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedAlphabet {
    name: &'static str,
    states: &'static [u8],
    /// Ambiguity symbols and the states they stand for; code is `state_count + position`
    ambiguities: &'static [(u8, &'static [usize])],
    /// Extra symbols that are synonyms of an unambiguous state
    aliases: &'static [(u8, usize)],
}

const ALL: &[usize] = &[];

const NUCLEOTIDE: FixedAlphabet = FixedAlphabet {
    name: "nucleotide",
    states: b"ACGT",
    ambiguities: &[
        (b'R', &[0, 2]),
        (b'Y', &[1, 3]),
        (b'M', &[0, 1]),
        (b'W', &[0, 3]),
        (b'S', &[1, 2]),
        (b'K', &[2, 3]),
        (b'B', &[1, 2, 3]),
        (b'D', &[0, 2, 3]),
        (b'H', &[0, 1, 3]),
        (b'V', &[0, 1, 2]),
        (b'N', ALL),
        (b'-', ALL),
        (b'?', ALL),
    ],
    aliases: &[(b'U', 3)],
};

const AMINO_ACID: FixedAlphabet = FixedAlphabet {
    name: "aminoacid",
    states: b"ACDEFGHIKLMNPQRSTVWY",
    ambiguities: &[
        (b'B', &[2, 11]),
        (b'Z', &[3, 13]),
        (b'J', &[7, 9]),
        (b'X', ALL),
        (b'*', ALL),
        (b'-', ALL),
        (b'?', ALL),
    ],
    aliases: &[],
};

const BINARY: FixedAlphabet = FixedAlphabet {
    name: "binary",
    states: b"01",
    ambiguities: &[(b'-', ALL), (b'?', ALL)],
    aliases: &[],
};

impl FixedAlphabet {
    /// Number of unambiguous states.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Name of the alphabet as used in configuration files.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the code of a single symbol (case-insensitive), if it belongs to the alphabet.
    pub fn code_of(&self, symbol: u8) -> Option<usize> {
        let symbol = symbol.to_ascii_uppercase();
        if let Some(state) = self.states.iter().position(|&s| s == symbol) {
            return Some(state);
        }
        if let Some(&(_, state)) = self.aliases.iter().find(|(s, _)| *s == symbol) {
            return Some(state);
        }
        self.ambiguities
            .iter()
            .position(|(s, _)| *s == symbol)
            .map(|i| self.state_count() + i)
    }

    fn allows(&self, code: usize, state: usize) -> bool {
        if code < self.state_count() {
            return code == state;
        }
        match self.ambiguities.get(code - self.state_count()) {
            Some((_, states)) if states.is_empty() => state < self.state_count(),
            Some((_, states)) => states.contains(&state),
            None => false,
        }
    }

    fn encode(&self, sequence: &str) -> Result<Vec<usize>, AlignmentError> {
        sequence
            .bytes()
            .filter(|b| !b.is_ascii_whitespace())
            .map(|b| {
                self.code_of(b).ok_or_else(|| AlignmentError::UnknownSymbol {
                    symbol: (b as char).to_string(),
                    data_type: self.name.to_string(),
                })
            })
            .collect()
    }
}

impl StateDecoder for FixedAlphabet {
    fn write_state(&self, state: SiteState, out: &mut String) {
        match state.and_then(|s| self.states.get(s)) {
            Some(&symbol) => out.push(symbol as char),
            None => out.push_str(MISSING_TOKEN),
        }
    }
}

// =#========================================================================#=
// USER DATA TYPE
// =#========================================================================#=
/// A user-defined alphabet: state `i` is written as `codes[i]`.
///
/// All codes share one length; sequences are read in chunks of that length,
/// and a chunk made up only of `?` or `-` is missing data.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDataType {
    codes: Vec<String>,
    code_length: usize,
}

impl UserDataType {
    /// Creates a user data type from its state codes.
    ///
    /// # Errors
    /// [AlignmentError::InvalidDataType] if there are no codes, codes repeat,
    /// or codes differ in length.
    pub fn new<S: Into<String>>(codes: impl IntoIterator<Item = S>) -> Result<Self, AlignmentError> {
        let codes: Vec<String> = codes.into_iter().map(Into::into).collect();
        let Some(first) = codes.first() else {
            return Err(AlignmentError::InvalidDataType("user data type needs at least one code".to_string()));
        };
        let code_length = first.chars().count();
        if code_length == 0 {
            return Err(AlignmentError::InvalidDataType("empty state code".to_string()));
        }
        for (i, code) in codes.iter().enumerate() {
            if code.chars().count() != code_length {
                return Err(AlignmentError::InvalidDataType(format!(
                    "state code {code} differs in length from {first}"
                )));
            }
            if codes[..i].contains(code) {
                return Err(AlignmentError::InvalidDataType(format!("state code {code} given twice")));
            }
        }
        Ok(Self { codes, code_length })
    }

    /// Number of states.
    pub fn state_count(&self) -> usize {
        self.codes.len()
    }

    /// The code string of `state`.
    pub fn code(&self, state: usize) -> Option<&str> {
        self.codes.get(state).map(String::as_str)
    }

    fn allows(&self, code: usize, state: usize) -> bool {
        if code < self.state_count() {
            code == state
        } else {
            state < self.state_count()
        }
    }

    fn encode(&self, sequence: &str) -> Result<Vec<usize>, AlignmentError> {
        let symbols: Vec<char> = sequence.chars().filter(|c| !c.is_whitespace()).collect();
        if symbols.len() % self.code_length != 0 {
            return Err(AlignmentError::InvalidDataType(format!(
                "sequence length {} is not a multiple of code length {}",
                symbols.len(),
                self.code_length
            )));
        }
        symbols
            .chunks(self.code_length)
            .map(|chunk| {
                let token: String = chunk.iter().collect();
                if chunk.iter().all(|&c| c == '?' || c == '-') {
                    return Ok(self.state_count());
                }
                self.codes.iter().position(|c| *c == token).ok_or(AlignmentError::UnknownSymbol {
                    symbol: token,
                    data_type: "user".to_string(),
                })
            })
            .collect()
    }
}

impl StateDecoder for UserDataType {
    fn write_state(&self, state: SiteState, out: &mut String) {
        match state.and_then(|s| self.code(s)) {
            Some(code) => out.push_str(code),
            None => out.push_str(MISSING_TOKEN),
        }
    }
}

// =#========================================================================#=
// DATA TYPE
// =#========================================================================#=
/// The data type of an alignment.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    Nucleotide,
    AminoAcid,
    Binary,
    User(UserDataType),
}

impl DataType {
    /// Resolves a data type by its configuration name.
    ///
    /// `symbols` is required for (and only used by) `"user"`.
    pub fn from_name(name: &str, symbols: Option<&[String]>) -> Result<Self, AlignmentError> {
        match name.to_ascii_lowercase().as_str() {
            "nucleotide" | "dna" => Ok(DataType::Nucleotide),
            "aminoacid" | "protein" => Ok(DataType::AminoAcid),
            "binary" => Ok(DataType::Binary),
            "user" => match symbols {
                Some(symbols) => Ok(DataType::User(UserDataType::new(symbols.iter().cloned())?)),
                None => Err(AlignmentError::InvalidDataType("user data type requires symbols".to_string())),
            },
            other => Err(AlignmentError::InvalidDataType(format!("unknown data type {other}"))),
        }
    }

    fn alphabet(&self) -> Option<&FixedAlphabet> {
        match self {
            DataType::Nucleotide => Some(&NUCLEOTIDE),
            DataType::AminoAcid => Some(&AMINO_ACID),
            DataType::Binary => Some(&BINARY),
            DataType::User(_) => None,
        }
    }

    /// Number of unambiguous states.
    pub fn state_count(&self) -> usize {
        match (self, self.alphabet()) {
            (DataType::User(user), _) => user.state_count(),
            (_, alphabet) => alphabet.map_or(0, FixedAlphabet::state_count),
        }
    }

    /// Whether observed `code` is compatible with `state`.
    pub fn allows(&self, code: usize, state: usize) -> bool {
        match self {
            DataType::User(user) => user.allows(code, state),
            _ => self.alphabet().is_some_and(|a| a.allows(code, state)),
        }
    }

    /// Encodes a sequence into state codes, ignoring whitespace.
    pub fn encode(&self, sequence: &str) -> Result<Vec<usize>, AlignmentError> {
        match (self, self.alphabet()) {
            (DataType::User(user), _) => user.encode(sequence),
            (_, Some(alphabet)) => alphabet.encode(sequence),
            (_, None) => Err(AlignmentError::InvalidDataType(self.to_string())),
        }
    }
}

impl StateDecoder for DataType {
    fn write_state(&self, state: SiteState, out: &mut String) {
        match self {
            DataType::Nucleotide => NUCLEOTIDE.write_state(state, out),
            DataType::AminoAcid => AMINO_ACID.write_state(state, out),
            DataType::Binary => BINARY.write_state(state, out),
            DataType::User(user) => user.write_state(state, out),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.alphabet() {
            Some(alphabet) => write!(f, "{}", alphabet.name()),
            None => write!(f, "user"),
        }
    }
}
