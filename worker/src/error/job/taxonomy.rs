use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaxonomyError {
    #[error("the original taxonomy YAML likely did not pass yaml-linting, here is the unmarshalling error: {0}")]
    Lint(#[from] serde_yaml::Error),

    #[error("seed_examples not found or not a list")]
    MissingSeedExamples,

    #[error("invalid seed example {index}: {reason}")]
    InvalidExample { index: usize, reason: String },

    #[error("invalid question and answer pair {pair} in seed example {index}: {reason}")]
    InvalidPair { index: usize, pair: usize, reason: String },
}
