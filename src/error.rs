use crate::alignment::AlignmentError;
use crate::ancestry::{AncestryError, SamplingError};
use crate::config::ConfigError;
use crate::likelihood::LikelihoodError;
use crate::logger::{LogError, SetupError};
use crate::parser::ParsingError;
use thiserror::Error;

/// Any error of this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parsing(#[from] ParsingError),
    #[error(transparent)]
    Alignment(#[from] AlignmentError),
    #[error(transparent)]
    Likelihood(#[from] LikelihoodError),
    #[error(transparent)]
    Ancestry(#[from] AncestryError),
    #[error(transparent)]
    Sampling(#[from] SamplingError),
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Log(#[from] LogError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
