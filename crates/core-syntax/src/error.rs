use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid syntax rule pattern: {0}")]
    Pattern(#[source] regex::Error),
}
